//! Pairwise ledger engine.
//!
//! Tracks running balances between pairs of users and the audit trail of the
//! expenses that produced them:
//!
//! - identity store: platform identities mapped to durable users, with a
//!   short-lived cache in front.
//! - account registry: one canonical [`Account`] per unordered pair of users.
//! - balance updates: signed charges applied atomically, expenses split
//!   across participants with [`Split`].
//! - ledger: one immutable [`Transaction`] per recorded expense.
//! - [`presenter`]: owed/owing statements built on the same sign rule.

pub use accounts::{Account, Direction, Position, Role};
pub use error::{EngineError, ErrorKind};
pub use identity_cache::IdentityCache;
pub use money::Money;
pub use ops::{
    AccountCreation, ChargeFailure, DEFAULT_USER_CACHE_TTL, Engine, EngineBuilder, ExpenseReceipt,
};
pub use split::Split;
pub use transactions::Transaction;
pub use users::{Platform, User};

mod accounts;
mod error;
mod identity_cache;
mod money;
mod ops;
pub mod presenter;
mod split;
mod transaction_participants;
mod transactions;
mod user_identities;
mod users;
mod util;

pub(crate) type ResultEngine<T> = Result<T, EngineError>;
