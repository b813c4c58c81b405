//! The module contains the error the engine can throw.
//!
//! Errors fall into five families, see [`ErrorKind`]:
//!
//! - not found: [`KeyNotFound`], often a control-flow signal to create lazily.
//! - already exists: [`ExistingKey`] and [`IdentityConflict`].
//! - invalid input: rejected before any mutation.
//! - data integrity: [`DataIntegrity`], never auto-repaired.
//! - storage: [`Database`].
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`IdentityConflict`]: EngineError::IdentityConflict
//!  [`DataIntegrity`]: EngineError::DataIntegrity
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Identity conflict: {0}")]
    IdentityConflict(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Zero amount: {0}")]
    ZeroAmount(String),
    #[error("Invalid account: {0}")]
    InvalidAccount(String),
    #[error("Self transaction: {0}")]
    SelfTransaction(String),
    #[error("Invalid platform: {0}")]
    InvalidPlatform(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Data integrity violation: {0}")]
    DataIntegrity(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Coarse classification of an [`EngineError`].
///
/// Callers use it to decide whether an error becomes a local user-facing
/// message (`NotFound`, `AlreadyExists`, `InvalidInput`) or has to be logged
/// and escalated (`DataIntegrity`, `Storage`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidInput,
    DataIntegrity,
    Storage,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::KeyNotFound(_) => ErrorKind::NotFound,
            Self::ExistingKey(_) | Self::IdentityConflict(_) => ErrorKind::AlreadyExists,
            Self::InvalidAmount(_)
            | Self::ZeroAmount(_)
            | Self::InvalidAccount(_)
            | Self::SelfTransaction(_)
            | Self::InvalidPlatform(_)
            | Self::InvalidId(_) => ErrorKind::InvalidInput,
            Self::DataIntegrity(_) => ErrorKind::DataIntegrity,
            Self::Database(_) => ErrorKind::Storage,
        }
    }

    /// `true` for errors the orchestration layer must log and escalate.
    pub fn is_fault(&self) -> bool {
        matches!(self.kind(), ErrorKind::DataIntegrity | ErrorKind::Storage)
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::IdentityConflict(a), Self::IdentityConflict(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::ZeroAmount(a), Self::ZeroAmount(b)) => a == b,
            (Self::InvalidAccount(a), Self::InvalidAccount(b)) => a == b,
            (Self::SelfTransaction(a), Self::SelfTransaction(b)) => a == b,
            (Self::InvalidPlatform(a), Self::InvalidPlatform(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::DataIntegrity(a), Self::DataIntegrity(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_not_faults() {
        for err in [
            EngineError::InvalidAmount("x".to_string()),
            EngineError::ZeroAmount("x".to_string()),
            EngineError::SelfTransaction("x".to_string()),
            EngineError::InvalidAccount("x".to_string()),
            EngineError::KeyNotFound("x".to_string()),
            EngineError::ExistingKey("x".to_string()),
        ] {
            assert!(!err.is_fault(), "{err} should not be a fault");
        }
    }

    #[test]
    fn integrity_and_storage_are_faults() {
        assert_eq!(
            EngineError::DataIntegrity("two accounts".to_string()).kind(),
            ErrorKind::DataIntegrity
        );
        assert!(EngineError::Database(DbErr::Custom("boom".to_string())).is_fault());
    }

    #[test]
    fn identity_conflict_is_already_exists() {
        assert_eq!(
            EngineError::IdentityConflict("telegram:1".to_string()).kind(),
            ErrorKind::AlreadyExists
        );
    }
}
