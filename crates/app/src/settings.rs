//! Settings for the application. Configuration is written in
//! `settings.toml` (or the file named by `BALANCE_SETTINGS`) and can be
//! overridden from the environment, e.g. `BALANCE__TELEGRAM__TOKEN`.
//!
//! ```toml
//! [app]
//! level = "info"
//!
//! [database]
//! sqlite = "balance.db"
//!
//! [telegram]
//! token = "123:abc"
//! allowed_users = [1234]
//!
//! [cache]
//! user_ttl_secs = 1800
//! ```

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_SETTINGS: &str = "settings";

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Telegram {
    pub token: String,
    #[serde(default)]
    pub allowed_users: Vec<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Cache {
    /// `0` disables the user cache.
    #[serde(default = "default_user_ttl_secs")]
    pub user_ttl_secs: u64,
}

fn default_user_ttl_secs() -> u64 {
    engine::DEFAULT_USER_CACHE_TTL.as_secs()
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            user_ttl_secs: default_user_ttl_secs(),
        }
    }
}

impl Cache {
    pub fn user_ttl(&self) -> Duration {
        Duration::from_secs(self.user_ttl_secs)
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub telegram: Option<Telegram>,
    #[serde(default)]
    pub cache: Cache,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let path =
            std::env::var("BALANCE_SETTINGS").unwrap_or_else(|_| DEFAULT_SETTINGS.to_string());
        let settings = Config::builder()
            .add_source(File::with_name(&path))
            .add_source(
                Environment::with_prefix("BALANCE")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }
}
