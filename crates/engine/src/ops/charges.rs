use chrono::Utc;
use sea_orm::{QueryFilter, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{Account, EngineError, Money, ResultEngine, Split, Transaction, accounts};

use super::{AccountCreation, Engine};

/// A participant whose account could not be updated.
#[derive(Debug, PartialEq)]
pub struct ChargeFailure {
    pub participant: Uuid,
    pub error: EngineError,
}

/// Result of [`Engine::record_expense`].
///
/// Each participant's account is updated on its own; a failure for one does
/// not roll back the others.
#[derive(Debug)]
pub struct ExpenseReceipt {
    pub split: Split,
    /// Accounts after the charge, one per charged participant.
    pub charged: Vec<Account>,
    pub failures: Vec<ChargeFailure>,
    /// The ledger entry, `None` if appending it failed.
    pub transaction: Option<Transaction>,
}

impl ExpenseReceipt {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Removes duplicates, keeping first occurrences in order.
fn distinct(ids: &[Uuid]) -> Vec<Uuid> {
    let mut out: Vec<Uuid> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(*id);
        }
    }
    out
}

impl Engine {
    /// Applies `signed_amount` from `initiator` to its account with
    /// `counterparty`.
    ///
    /// A positive amount is a new charge (the counterparty owes the initiator
    /// more), a negative amount is a payment or correction. The balance moves
    /// by `role.orient(signed_amount)` where `role` is the initiator's role in
    /// the account.
    ///
    /// Fails with `KeyNotFound` when the pair has no account yet; callers are
    /// expected to open it with the amount as opening balance, and with
    /// `InvalidAmount` when the new balance would not fit in a `Money`.
    ///
    /// The write is conditional on the balance just read
    /// (`WHERE id = ? AND balance = ?`) and retried on a concurrent change, so
    /// charges on the same account never lose an update.
    pub async fn apply_charge(
        &self,
        initiator: Uuid,
        counterparty: Uuid,
        signed_amount: Money,
    ) -> ResultEngine<Account> {
        loop {
            let account = self.find_between(initiator, counterparty).await?;
            let Some(role) = account.role_of(initiator) else {
                tracing::error!(
                    "account {} was found for {initiator} but does not involve it",
                    account.id
                );
                return Err(EngineError::KeyNotFound("account".to_string()));
            };
            let delta = role.orient(signed_amount);
            let balance = account.balance.checked_add(delta).ok_or_else(|| {
                EngineError::InvalidAmount(format!(
                    "applying {delta} to {} overflows the balance",
                    account.balance
                ))
            })?;

            let now = Utc::now();
            let result = accounts::Entity::update_many()
                .col_expr(accounts::Column::Balance, Expr::value(balance.units()))
                .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
                .filter(accounts::Column::Id.eq(account.id.to_string()))
                .filter(accounts::Column::Balance.eq(account.balance.units()))
                .exec(&self.database)
                .await?;
            if result.rows_affected == 0 {
                tracing::debug!("account {} changed concurrently, retrying", account.id);
                continue;
            }

            tracing::debug!(
                "applied {delta} to account {} ({initiator} -> {counterparty})",
                account.id
            );
            return Ok(Account {
                balance,
                updated_at: now,
                ..account
            });
        }
    }

    /// Charges `share` to the account between `initiator` and `participant`,
    /// opening it if needed.
    async fn charge_participant(
        &self,
        initiator: Uuid,
        participant: Uuid,
        share: Money,
    ) -> ResultEngine<Account> {
        match self.apply_charge(initiator, participant, share).await {
            Err(EngineError::KeyNotFound(_)) => {}
            other => return other,
        }

        tracing::info!("creating account between user {initiator} and {participant}");
        match self.ensure_account(initiator, participant, share).await? {
            AccountCreation::Created(account) => Ok(account),
            // Someone else opened it in the meantime: charge it instead.
            AccountCreation::AlreadyExisted(_) => {
                self.apply_charge(initiator, participant, share).await
            }
        }
    }

    /// Records an expense of `total` by `initiator`, split evenly across
    /// `participants`.
    ///
    /// The divisor counts every distinct participant as given, so an
    /// initiator who lists themselves bears their own share; they are never
    /// charged against themselves and are not recorded as a participant.
    ///
    /// Rejected before any mutation:
    /// - `SelfTransaction` if the participants reduce to the initiator alone
    /// - `InvalidAmount` if there are no participants
    /// - `ZeroAmount` if the share is 0
    ///
    /// Every participant is attempted. A ledger entry is appended once, after
    /// the charges, covering those that succeeded; failing to append it only
    /// logs a warning. If no participant could be charged, the first failure
    /// is returned.
    pub async fn record_expense(
        &self,
        initiator: Uuid,
        participants: &[Uuid],
        total: Money,
    ) -> ResultEngine<ExpenseReceipt> {
        let participants = distinct(participants);
        if participants.is_empty() {
            return Err(EngineError::InvalidAmount(
                "at least one participant is required".to_string(),
            ));
        }
        if participants == [initiator] {
            return Err(EngineError::SelfTransaction(
                "cannot create a balance with yourself".to_string(),
            ));
        }

        let split = Split::new(total, participants.len())?;
        if !split.remainder().is_zero() {
            tracing::debug!(
                "splitting {total} {} ways drops {}",
                split.parts(),
                split.remainder()
            );
        }
        tracing::info!(
            "creating a balance of {total} across {} users by {initiator}",
            split.parts()
        );

        let mut charged = Vec::new();
        let mut charged_ids = Vec::new();
        let mut failures = Vec::new();
        for participant in participants.into_iter().filter(|p| *p != initiator) {
            match self
                .charge_participant(initiator, participant, split.share())
                .await
            {
                Ok(account) => {
                    charged.push(account);
                    charged_ids.push(participant);
                }
                Err(error) => {
                    tracing::error!("failed to charge {participant} for {initiator}: {error}");
                    failures.push(ChargeFailure { participant, error });
                }
            }
        }

        if charged.is_empty() {
            return Err(failures
                .into_iter()
                .next()
                .map(|failure| failure.error)
                .unwrap_or_else(|| {
                    EngineError::InvalidAmount("no participant to charge".to_string())
                }));
        }

        let transaction = match self.append(initiator, charged_ids, &split).await {
            Ok(tx) => Some(tx),
            Err(err) => {
                tracing::warn!("failed to create transaction log: {err}");
                None
            }
        };

        Ok(ExpenseReceipt {
            split,
            charged,
            failures,
            transaction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_keeps_first_occurrence() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(distinct(&[a, b, a, b, a]), vec![a, b]);
    }
}
