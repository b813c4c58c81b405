use engine::Money;

/// Arguments of `/add`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct AddRequest {
    /// Usernames in the order given, duplicates kept.
    pub usernames: Vec<String>,
    pub amount: Money,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum ParseError {
    #[error("Balance cannot be 0")]
    ZeroAmount,
    #[error("Who is this balance with? Run /add USERNAME AMOUNT")]
    NoUsers,
}

/// Parses the arguments of `/add`.
///
/// Every token that reads as a whole amount (`5`, `-3`, `$12`) sets the
/// amount, the last one wins. Every other token is a username.
pub(crate) fn parse_add(input: &str) -> Result<AddRequest, ParseError> {
    let mut amount = Money::ZERO;
    let mut usernames = Vec::new();
    for token in input.split_whitespace() {
        match token.parse::<Money>() {
            Ok(value) => amount = value,
            Err(_) => usernames.push(token.to_string()),
        }
    }

    if amount.is_zero() {
        return Err(ParseError::ZeroAmount);
    }
    if usernames.is_empty() {
        return Err(ParseError::NoUsers);
    }
    Ok(AddRequest { usernames, amount })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_user() {
        let parsed = parse_add("bob 10").unwrap();
        assert_eq!(parsed.usernames, vec!["bob"]);
        assert_eq!(parsed.amount, Money::new(10));
    }

    #[test]
    fn amount_can_be_anywhere_and_last_wins() {
        let parsed = parse_add("5 bob carol 12").unwrap();
        assert_eq!(parsed.usernames, vec!["bob", "carol"]);
        assert_eq!(parsed.amount, Money::new(12));
    }

    #[test]
    fn negative_and_dollar_amounts() {
        assert_eq!(parse_add("bob -3").unwrap().amount, Money::new(-3));
        assert_eq!(parse_add("bob $7").unwrap().amount, Money::new(7));
    }

    #[test]
    fn fractions_are_usernames() {
        let err = parse_add("bob 5.50").unwrap_err();
        assert_eq!(err, ParseError::ZeroAmount);
    }

    #[test]
    fn missing_or_zero_amount() {
        assert_eq!(parse_add("bob").unwrap_err(), ParseError::ZeroAmount);
        assert_eq!(parse_add("bob 0").unwrap_err(), ParseError::ZeroAmount);
        assert_eq!(parse_add("").unwrap_err(), ParseError::ZeroAmount);
    }

    #[test]
    fn amount_without_users() {
        assert_eq!(parse_add("10").unwrap_err(), ParseError::NoUsers);
    }
}
