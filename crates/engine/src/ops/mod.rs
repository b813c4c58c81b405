use std::time::Duration;

use sea_orm::DatabaseConnection;

use crate::{ResultEngine, identity_cache::IdentityCache};

mod accounts;
mod charges;
mod ledger;
mod statements;
mod users;

pub use accounts::AccountCreation;
pub use charges::{ChargeFailure, ExpenseReceipt};

/// Default lifetime of cached user lookups.
pub const DEFAULT_USER_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    identities: IdentityCache,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// The identity cache sitting in front of user lookups.
    pub fn identity_cache(&self) -> &IdentityCache {
        &self.identities
    }
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    user_cache_ttl: Duration,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            user_cache_ttl: DEFAULT_USER_CACHE_TTL,
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Lifetime of cached user lookups. `Duration::ZERO` disables the cache.
    pub fn user_cache_ttl(mut self, ttl: Duration) -> EngineBuilder {
        self.user_cache_ttl = ttl;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            identities: IdentityCache::new(self.user_cache_ttl),
        })
    }
}
