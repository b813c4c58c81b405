//! Users and their platform identities.
//!
//! A `User` is the durable internal identity. Each chat platform contributes
//! one row in `user_identities`, keyed by `(platform, platform_user_id)`, so
//! the storage itself enforces "at most one user per platform id".

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, user_identities, util::parse_uuid};

/// Chat platform a user is reachable on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Platform {
    Telegram,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Telegram => "telegram",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Platform {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "telegram" => Ok(Self::Telegram),
            other => Err(EngineError::InvalidPlatform(format!(
                "unsupported platform: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    /// Platform-specific user id, one per platform.
    pub platform_ids: BTreeMap<Platform, String>,
    /// Display username per platform. Used for presentation and lookup by
    /// name, never as identity.
    pub platform_usernames: BTreeMap<Platform, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub(crate) fn new(platform: Platform, platform_user_id: &str, username: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            platform_ids: BTreeMap::from([(platform, platform_user_id.to_string())]),
            platform_usernames: BTreeMap::from([(platform, username.to_string())]),
            created_at: now,
            updated_at: now,
        }
    }

    /// Display name on `platform`, if the user has an identity there.
    pub fn username(&self, platform: Platform) -> Option<&str> {
        self.platform_usernames.get(&platform).map(String::as_str)
    }

    /// Display name on `platform`, falling back to any known username.
    pub fn display_name(&self, platform: Platform) -> String {
        self.username(platform)
            .or_else(|| self.platform_usernames.values().next().map(String::as_str))
            .map(ToString::to_string)
            .unwrap_or_else(|| self.id.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_identities::Entity")]
    Identities,
}

impl Related<super::user_identities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Identities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&User> for ActiveModel {
    fn from(user: &User) -> Self {
        Self {
            id: ActiveValue::Set(user.id.to_string()),
            created_at: ActiveValue::Set(user.created_at),
            updated_at: ActiveValue::Set(user.updated_at),
        }
    }
}

impl TryFrom<(Model, Vec<user_identities::Model>)> for User {
    type Error = EngineError;

    fn try_from((model, identities): (Model, Vec<user_identities::Model>)) -> ResultEngine<Self> {
        let mut platform_ids = BTreeMap::new();
        let mut platform_usernames = BTreeMap::new();
        for identity in identities {
            let platform = Platform::try_from(identity.platform.as_str())?;
            platform_ids.insert(platform, identity.platform_user_id);
            platform_usernames.insert(platform, identity.username);
        }

        Ok(Self {
            id: parse_uuid(&model.id, "user")?,
            platform_ids,
            platform_usernames,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_round_trips_through_str() {
        assert_eq!(Platform::try_from("Telegram").unwrap(), Platform::Telegram);
        assert_eq!(Platform::Telegram.as_str(), "telegram");
        assert!(matches!(
            Platform::try_from("irc"),
            Err(EngineError::InvalidPlatform(_))
        ));
    }

    #[test]
    fn display_name_prefers_requested_platform() {
        let user = User::new(Platform::Telegram, "42", "Alice");
        assert_eq!(user.display_name(Platform::Telegram), "Alice");
        assert_eq!(user.platform_ids[&Platform::Telegram], "42");
    }
}
