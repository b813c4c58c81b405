//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use sea_orm::{DbErr, SqlErr};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

/// Lookup key for a platform username: trimmed, without a leading `@`,
/// NFKC-normalized and lower-cased.
pub(crate) fn normalize_username(value: &str) -> String {
    let trimmed = value.trim();
    let trimmed = trimmed.strip_prefix('@').unwrap_or(trimmed);
    trimmed.nfkc().flat_map(char::to_lowercase).collect()
}

/// Display form of a username: trimmed, without a leading `@`.
pub(crate) fn clean_username(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    let trimmed = trimmed.strip_prefix('@').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Err(EngineError::InvalidId(
            "username must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// `true` if the storage rejected a write because of a UNIQUE constraint.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_username_lowercases_and_strips_at() {
        assert_eq!(normalize_username("  @Alice "), "alice");
        assert_eq!(normalize_username("BOB"), "bob");
    }

    #[test]
    fn normalize_username_folds_compatibility_forms() {
        // Fullwidth letters fold to ASCII under NFKC.
        assert_eq!(normalize_username("Ｃａｒｏｌ"), "carol");
    }

    #[test]
    fn clean_username_rejects_empty() {
        assert!(clean_username(" @ ").is_err());
        assert_eq!(clean_username("@Dave").unwrap(), "Dave");
    }
}
