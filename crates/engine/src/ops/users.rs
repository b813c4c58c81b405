use std::collections::HashMap;

use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Platform, ResultEngine, User, user_identities, users,
    util::{clean_username, is_unique_violation, normalize_username},
};

use super::{Engine, with_tx};

/// Attach platform identities to user rows, preserving the input order.
async fn hydrate_users<C: ConnectionTrait>(
    db: &C,
    models: Vec<users::Model>,
) -> ResultEngine<Vec<User>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<String> = models.iter().map(|m| m.id.clone()).collect();
    let mut identities: HashMap<String, Vec<user_identities::Model>> = HashMap::new();
    for identity in user_identities::Entity::find()
        .filter(user_identities::Column::UserId.is_in(ids))
        .all(db)
        .await?
    {
        identities
            .entry(identity.user_id.clone())
            .or_default()
            .push(identity);
    }

    models
        .into_iter()
        .map(|model| {
            let own = identities.remove(&model.id).unwrap_or_default();
            User::try_from((model, own))
        })
        .collect()
}

async fn load_user<C: ConnectionTrait>(db: &C, id: &str) -> ResultEngine<Option<User>> {
    let Some(model) = users::Entity::find_by_id(id.to_string()).one(db).await? else {
        return Ok(None);
    };
    Ok(hydrate_users(db, vec![model]).await?.pop())
}

impl Engine {
    /// Looks a user up by platform identity. Cached.
    pub async fn find_user(
        &self,
        platform: Platform,
        platform_user_id: &str,
    ) -> ResultEngine<Option<User>> {
        if let Some(user) = self.identities.by_platform(platform, platform_user_id) {
            return Ok(Some(user));
        }

        let Some(identity) = user_identities::Entity::find_by_id((
            platform.as_str().to_string(),
            platform_user_id.to_string(),
        ))
        .one(&self.database)
        .await?
        else {
            return Ok(None);
        };

        let user = load_user(&self.database, &identity.user_id)
            .await?
            .ok_or_else(|| {
                tracing::error!(
                    "identity {platform}:{platform_user_id} points to missing user {}",
                    identity.user_id
                );
                EngineError::DataIntegrity(format!(
                    "identity {platform}:{platform_user_id} has no user"
                ))
            })?;
        self.identities.insert(&user);
        Ok(Some(user))
    }

    /// Returns a user by internal id. Cached.
    pub async fn user(&self, id: Uuid) -> ResultEngine<User> {
        if let Some(user) = self.identities.by_id(id) {
            return Ok(user);
        }
        let user = load_user(&self.database, &id.to_string())
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user".to_string()))?;
        self.identities.insert(&user);
        Ok(user)
    }

    /// Finds a user by display name on `platform`.
    ///
    /// The match is exact on the normalized form (case-insensitive, leading
    /// `@` ignored). Two users sharing a normalized name is not prevented;
    /// the oldest identity wins and a warning is logged.
    pub async fn find_user_by_username(
        &self,
        platform: Platform,
        username: &str,
    ) -> ResultEngine<User> {
        let norm = normalize_username(username);
        if norm.is_empty() {
            return Err(EngineError::KeyNotFound("user".to_string()));
        }

        let mut matches = user_identities::Entity::find()
            .filter(user_identities::Column::Platform.eq(platform.as_str()))
            .filter(user_identities::Column::UsernameNorm.eq(norm.clone()))
            .find_also_related(users::Entity)
            .order_by_asc(users::Column::CreatedAt)
            .order_by_asc(user_identities::Column::UserId)
            .all(&self.database)
            .await?;
        if matches.len() > 1 {
            tracing::warn!(
                "{} users share the username '{norm}' on {platform}",
                matches.len()
            );
        }
        if matches.is_empty() {
            return Err(EngineError::KeyNotFound(format!("user {username}")));
        }

        let (identity, _) = matches.remove(0);
        self.user(crate::util::parse_uuid(&identity.user_id, "user")?)
            .await
    }

    /// All registered users, oldest first.
    pub async fn list_users(&self) -> ResultEngine<Vec<User>> {
        let models = users::Entity::find()
            .order_by_asc(users::Column::CreatedAt)
            .order_by_asc(users::Column::Id)
            .all(&self.database)
            .await?;
        hydrate_users(&self.database, models).await
    }

    /// Registers a new user with a single platform identity.
    ///
    /// Fails with `ExistingKey` if the identity is already registered and
    /// with `IdentityConflict` if a concurrent registration won the race.
    pub async fn register_user(
        &self,
        platform: Platform,
        platform_user_id: &str,
        username: &str,
    ) -> ResultEngine<User> {
        let platform_user_id = platform_user_id.trim();
        if platform_user_id.is_empty() {
            return Err(EngineError::InvalidId(
                "platform user id must not be empty".to_string(),
            ));
        }
        let username = clean_username(username)?;
        self.identities.invalidate(platform, platform_user_id, None);

        let user = with_tx!(self, |db_tx| {
            let exists = user_identities::Entity::find_by_id((
                platform.as_str().to_string(),
                platform_user_id.to_string(),
            ))
            .one(&db_tx)
            .await?
            .is_some();
            if exists {
                return Err(EngineError::ExistingKey(format!(
                    "{platform}:{platform_user_id}"
                )));
            }

            let user = User::new(platform, platform_user_id, &username);
            users::ActiveModel::from(&user).insert(&db_tx).await?;
            let identity = user_identities::ActiveModel {
                platform: ActiveValue::Set(platform.as_str().to_string()),
                platform_user_id: ActiveValue::Set(platform_user_id.to_string()),
                user_id: ActiveValue::Set(user.id.to_string()),
                username: ActiveValue::Set(username.clone()),
                username_norm: ActiveValue::Set(normalize_username(&username)),
            };
            match identity.insert(&db_tx).await {
                Ok(_) => Ok(user),
                Err(err) if is_unique_violation(&err) => Err(EngineError::IdentityConflict(
                    format!("{platform}:{platform_user_id} registered concurrently"),
                )),
                Err(err) => Err(err.into()),
            }
        })?;

        self.identities
            .invalidate(platform, platform_user_id, Some(user.id));
        tracing::info!("registered user {} as {platform}:{platform_user_id}", user.id);
        Ok(user)
    }

    /// Returns the user owning the platform identity, registering it first
    /// if needed.
    pub async fn resolve_or_register(
        &self,
        platform: Platform,
        platform_user_id: &str,
        username: &str,
    ) -> ResultEngine<User> {
        if let Some(user) = self.find_user(platform, platform_user_id).await? {
            return Ok(user);
        }
        match self.register_user(platform, platform_user_id, username).await {
            Ok(user) => Ok(user),
            Err(EngineError::ExistingKey(key)) => Err(EngineError::IdentityConflict(format!(
                "{key} registered concurrently"
            ))),
            Err(err) => Err(err),
        }
    }

    /// Display names on `platform` for `ids`, skipping unknown users.
    pub async fn display_names(
        &self,
        platform: Platform,
        ids: impl IntoIterator<Item = Uuid>,
    ) -> ResultEngine<HashMap<Uuid, String>> {
        let mut names = HashMap::new();
        for id in ids {
            if names.contains_key(&id) {
                continue;
            }
            match self.user(id).await {
                Ok(user) => {
                    names.insert(id, user.display_name(platform));
                }
                Err(EngineError::KeyNotFound(_)) => {
                    tracing::warn!("user {id} referenced but not found");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(names)
    }
}
