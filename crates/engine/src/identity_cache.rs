//! Short-lived cache in front of the identity store.
//!
//! Every inbound chat message resolves its sender, so lookups by
//! `(platform, platform_user_id)` and by internal id are cached for a TTL.
//! Registration invalidates the affected keys explicitly.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use uuid::Uuid;

use crate::{Platform, User};

type PlatformKey = (Platform, String);

#[derive(Debug)]
struct Cached {
    user: User,
    stored_at: Instant,
}

#[derive(Debug, Default)]
struct Maps {
    by_platform: HashMap<PlatformKey, Cached>,
    by_id: HashMap<Uuid, Cached>,
}

#[derive(Debug)]
pub struct IdentityCache {
    ttl: Duration,
    maps: Mutex<Maps>,
}

impl IdentityCache {
    /// A zero `ttl` disables caching.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            maps: Mutex::new(Maps::default()),
        }
    }

    pub fn enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    fn lock(&self) -> MutexGuard<'_, Maps> {
        self.maps.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            tracing::warn!("identity cache lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn fresh(&self, cached: &Cached) -> bool {
        cached.stored_at.elapsed() < self.ttl
    }

    pub fn by_platform(&self, platform: Platform, platform_user_id: &str) -> Option<User> {
        if !self.enabled() {
            return None;
        }
        let key = (platform, platform_user_id.to_string());
        let mut maps = self.lock();
        match maps.by_platform.get(&key) {
            Some(cached) if self.fresh(cached) => {
                tracing::debug!("identity cache hit for {platform}:{platform_user_id}");
                Some(cached.user.clone())
            }
            Some(_) => {
                maps.by_platform.remove(&key);
                None
            }
            None => {
                tracing::debug!("identity cache miss for {platform}:{platform_user_id}");
                None
            }
        }
    }

    pub fn by_id(&self, id: Uuid) -> Option<User> {
        if !self.enabled() {
            return None;
        }
        let mut maps = self.lock();
        match maps.by_id.get(&id) {
            Some(cached) if self.fresh(cached) => Some(cached.user.clone()),
            Some(_) => {
                maps.by_id.remove(&id);
                None
            }
            None => None,
        }
    }

    /// Stores `user` under its id and every platform identity it has.
    ///
    /// Expired entries are pruned on the way, so the cache only holds users
    /// seen within the TTL.
    pub fn insert(&self, user: &User) {
        if !self.enabled() {
            return;
        }
        let now = Instant::now();
        let mut maps = self.lock();
        maps.by_platform.retain(|_, cached| self.fresh(cached));
        maps.by_id.retain(|_, cached| self.fresh(cached));
        for (platform, platform_user_id) in &user.platform_ids {
            maps.by_platform.insert(
                (*platform, platform_user_id.clone()),
                Cached {
                    user: user.clone(),
                    stored_at: now,
                },
            );
        }
        maps.by_id.insert(
            user.id,
            Cached {
                user: user.clone(),
                stored_at: now,
            },
        );
    }

    /// Drops any entry for the platform identity and for `user_id`.
    pub fn invalidate(&self, platform: Platform, platform_user_id: &str, user_id: Option<Uuid>) {
        let mut maps = self.lock();
        maps.by_platform
            .remove(&(platform, platform_user_id.to_string()));
        if let Some(id) = user_id {
            maps.by_id.remove(&id);
            maps.by_platform.retain(|_, cached| cached.user.id != id);
        }
    }
}
