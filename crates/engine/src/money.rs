use std::{
    fmt,
    ops::{Add, AddAssign, Neg, Sub},
    str::FromStr,
};


use crate::EngineError;

/// Signed money amount in **whole currency units**.
///
/// Commands only accept integer amounts and the split is floor division, so
/// every balance the engine stores is integral.
///
/// The value is signed:
/// - positive = a charge (the counterparty owes more)
/// - negative = a credit (the initiator is paid back)
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(12);
/// assert_eq!(amount.units(), 12);
/// assert_eq!(amount.to_string(), "$12");
/// assert_eq!("-3".parse::<Money>().unwrap(), Money::new(-3));
/// assert!("3.50".parse::<Money>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    #[must_use]
    pub const fn new(units: i64) -> Self {
        Self(units)
    }

    /// Returns the raw value in whole units.
    #[must_use]
    pub const fn units(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Absolute value, saturating at `i64::MAX`.
    #[must_use]
    pub const fn magnitude(self) -> Money {
        Money(self.0.saturating_abs())
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}${}", self.0.unsigned_abs())
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a whole-unit amount.
    ///
    /// Accepts an optional leading `+`/`-` and an optional `$`. Fractions are
    /// rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidAmount(format!("invalid amount: {s}"));

        let trimmed = s.trim();
        let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped)
        } else {
            (false, trimmed)
        };
        let rest = rest.strip_prefix('$').unwrap_or(rest);

        if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let units: i64 = rest
            .parse()
            .map_err(|_| EngineError::InvalidAmount("amount too large".to_string()))?;
        Ok(Money(if negative { -units } else { units }))
    }
}
