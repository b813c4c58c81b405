//! Expense splitting.

use crate::{EngineError, Money, ResultEngine};

/// A total amount divided evenly across `parts` participants.
///
/// The share is integer division of the total, truncated toward zero, and the
/// remainder is dropped rather than distributed: splitting `$10` three ways
/// charges `$3` each and `$1` is never booked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Split {
    total: Money,
    parts: u32,
    share: Money,
}

impl Split {
    /// Fails with `ZeroAmount` when the total is zero or the share rounds
    /// down to zero, and with `InvalidAmount` when there are no parts.
    pub fn new(total: Money, parts: usize) -> ResultEngine<Self> {
        if total.is_zero() {
            return Err(EngineError::ZeroAmount(
                "balance cannot be 0".to_string(),
            ));
        }
        let parts = u32::try_from(parts)
            .map_err(|_| EngineError::InvalidAmount("too many participants".to_string()))?;
        if parts == 0 {
            return Err(EngineError::InvalidAmount(
                "at least one participant is required".to_string(),
            ));
        }

        let share = Money::new(total.units() / i64::from(parts));
        if share.is_zero() {
            return Err(EngineError::ZeroAmount(format!(
                "{total} split {parts} ways is 0"
            )));
        }

        Ok(Self {
            total,
            parts,
            share,
        })
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn parts(&self) -> u32 {
        self.parts
    }

    /// Amount charged to each participant.
    pub fn share(&self) -> Money {
        self.share
    }

    /// Part of the total that is not booked to anyone.
    pub fn remainder(&self) -> Money {
        Money::new(self.total.units() % i64::from(self.parts))
    }
}
