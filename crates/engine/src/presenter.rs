//! Text statements for balances and history.
//!
//! Pure functions: callers load accounts/transactions and a directory of
//! display names, these only format. Debt direction always comes from
//! [`Account::position_for`], the same rule charges are applied with.

use std::collections::HashMap;

use uuid::Uuid;

use crate::{Account, Direction, Position, Transaction};

const UNKNOWN_USER: &str = "unknown user";

fn name_of<'a>(names: &'a HashMap<Uuid, String>, id: Uuid) -> &'a str {
    match names.get(&id) {
        Some(name) => name.as_str(),
        None => {
            tracing::warn!("no display name for user {id}");
            UNKNOWN_USER
        }
    }
}

/// Positions of `user` across `accounts`, skipping accounts it is not a
/// party to.
pub fn positions(user: Uuid, accounts: &[Account]) -> Vec<Position> {
    accounts
        .iter()
        .filter_map(|account| {
            let position = account.position_for(user);
            if position.is_none() {
                tracing::warn!("account {} does not involve user {user}", account.id);
            }
            position
        })
        .collect()
}

/// One line describing `position`, e.g. `You owe bob $5`.
pub fn describe(position: &Position, names: &HashMap<Uuid, String>) -> String {
    let other = name_of(names, position.counterparty);
    match position.direction {
        Direction::YouOwe => format!("You owe {other} {}", position.amount),
        Direction::TheyOwe => format!("{other} owes you {}", position.amount),
        Direction::Settled => format!("You and {other} are settled up"),
    }
}

/// Balance summary for `user`.
pub fn summarize(user: Uuid, accounts: &[Account], names: &HashMap<Uuid, String>) -> String {
    let positions = positions(user, accounts);
    if positions.is_empty() {
        return "You have no balances yet. Record one with /add USERNAME AMOUNT".to_string();
    }

    let mut out = format!("Your Accounts ({} Accounts):\n\n", positions.len());
    for position in &positions {
        out.push_str(" • ");
        out.push_str(&describe(position, names));
        out.push('\n');
    }
    out.push_str("\nTo get more details behind a balance, run /history USERNAME");
    out
}

/// History statement of `viewer`, optionally restricted to entries involving
/// `filter`.
pub fn render_history(
    viewer: Uuid,
    filter: Option<Uuid>,
    transactions: &[Transaction],
    names: &HashMap<Uuid, String>,
) -> String {
    let mut out = match filter {
        Some(other) => format!("Account History ({})\n\n", name_of(names, other)),
        None => "Account History\n\n".to_string(),
    };
    if transactions.is_empty() {
        out.push_str("No transactions yet.");
        return out;
    }

    for tx in transactions {
        let from = if tx.created_by == viewer {
            match filter {
                Some(other) if other != viewer => name_of(names, other).to_string(),
                _ => tx
                    .participants
                    .iter()
                    .map(|id| name_of(names, *id))
                    .collect::<Vec<_>>()
                    .join(" "),
            }
        } else {
            "you".to_string()
        };

        out.push_str(&format!(
            "{}: {} requested {} from {from}\n",
            tx.created_at.format("%m-%d %H:%M"),
            name_of(names, tx.created_by),
            tx.share,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::Money;

    fn names(pairs: &[(Uuid, &str)]) -> HashMap<Uuid, String> {
        pairs
            .iter()
            .map(|(id, name)| (*id, (*name).to_string()))
            .collect()
    }

    fn account(creator: Uuid, subject: Uuid, balance: i64) -> Account {
        Account::new(creator, subject, Money::new(balance)).unwrap()
    }

    #[test]
    fn summarize_reports_both_directions() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let carol = Uuid::new_v4();
        let accounts = vec![account(alice, bob, 5), account(carol, alice, 2)];
        let names = names(&[(alice, "alice"), (bob, "bob"), (carol, "carol")]);

        let text = summarize(alice, &accounts, &names);
        assert!(text.starts_with("Your Accounts (2 Accounts):"));
        assert!(text.contains("bob owes you $5"));
        assert!(text.contains("You owe carol $2"));

        let text = summarize(bob, &accounts[..1], &names);
        assert!(text.contains("You owe alice $5"));
    }

    #[test]
    fn summarize_without_accounts() {
        let text = summarize(Uuid::new_v4(), &[], &HashMap::new());
        assert!(text.starts_with("You have no balances yet"));
    }

    #[test]
    fn settled_accounts_are_reported() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let names = names(&[(alice, "alice"), (bob, "bob")]);
        let text = summarize(bob, &[account(alice, bob, 0)], &names);
        assert!(text.contains("You and alice are settled up"));
    }

    #[test]
    fn history_lines_depend_on_viewer() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let carol = Uuid::new_v4();
        let names = names(&[(alice, "alice"), (bob, "bob"), (carol, "carol")]);
        let tx = Transaction {
            id: Uuid::new_v4(),
            created_by: alice,
            participants: vec![bob, carol],
            amount: Money::new(10),
            share: Money::new(5),
            created_at: Utc.with_ymd_and_hms(2024, 3, 7, 18, 5, 0).unwrap(),
        };

        let for_alice = render_history(alice, None, std::slice::from_ref(&tx), &names);
        assert!(for_alice.starts_with("Account History\n"));
        assert!(for_alice.contains("03-07 18:05: alice requested $5 from bob carol"));

        let filtered = render_history(alice, Some(bob), std::slice::from_ref(&tx), &names);
        assert!(filtered.starts_with("Account History (bob)"));
        assert!(filtered.contains("alice requested $5 from bob\n"));

        let for_bob = render_history(bob, None, std::slice::from_ref(&tx), &names);
        assert!(for_bob.contains("alice requested $5 from you"));
    }

    #[test]
    fn history_without_entries() {
        let text = render_history(Uuid::new_v4(), None, &[], &HashMap::new());
        assert!(text.ends_with("No transactions yet."));
    }
}
