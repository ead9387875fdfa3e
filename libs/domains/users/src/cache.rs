//! Read-through cache for user lookups.
//!
//! All entries live under the [`USERS_CACHE`] name. Backends are
//! interchangeable behind [`UserCache`]; the service treats any cache error as
//! a miss.

use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_or_default, env_parse_or};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::UserResult;
use crate::models::User;

/// Name every users cache entry is grouped under
pub const USERS_CACHE: &str = "users";

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// One entry per operation and parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Result of `list`/`stream_users`
    AllUsers,
    /// Result of `get_by_id(id)`
    UserById(i64),
}

impl CacheKey {
    /// Key qualified with the cache name, e.g. `users::all` or `users::42`
    pub fn qualified(&self) -> String {
        format!("{}::{}", USERS_CACHE, self)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::AllUsers => write!(f, "all"),
            CacheKey::UserById(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CachedValue {
    Users(Vec<User>),
    User(User),
}

/// Cache backend for the users service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserCache: Send + Sync {
    async fn get(&self, key: CacheKey) -> UserResult<Option<CachedValue>>;

    async fn put(&self, key: CacheKey, value: CachedValue) -> UserResult<()>;

    async fn evict(&self, key: CacheKey) -> UserResult<()>;

    /// Drop every entry under [`USERS_CACHE`]
    async fn clear(&self) -> UserResult<()>;

    /// Backend reachability, for readiness checks
    async fn ping(&self) -> UserResult<()> {
        Ok(())
    }
}

/// Process-local cache with a fixed time-to-live per entry
#[derive(Debug, Clone)]
pub struct InMemoryUserCache {
    entries: Arc<RwLock<HashMap<CacheKey, (Instant, CachedValue)>>>,
    ttl: Duration,
}

impl InMemoryUserCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for InMemoryUserCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

#[async_trait]
impl UserCache for InMemoryUserCache {
    async fn get(&self, key: CacheKey) -> UserResult<Option<CachedValue>> {
        {
            let entries = self.entries.read().await;
            match entries.get(&key) {
                None => return Ok(None),
                Some((expires_at, value)) if Instant::now() < *expires_at => {
                    return Ok(Some(value.clone()));
                }
                Some(_) => {}
            }
        }

        // Expired: remove unless a writer refreshed it in between
        let mut entries = self.entries.write().await;
        if entries
            .get(&key)
            .is_some_and(|(expires_at, _)| Instant::now() >= *expires_at)
        {
            entries.remove(&key);
        }
        Ok(None)
    }

    async fn put(&self, key: CacheKey, value: CachedValue) -> UserResult<()> {
        let expires_at = Instant::now() + self.ttl;
        self.entries.write().await.insert(key, (expires_at, value));
        Ok(())
    }

    async fn evict(&self, key: CacheKey) -> UserResult<()> {
        self.entries.write().await.remove(&key);
        Ok(())
    }

    async fn clear(&self) -> UserResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

/// Cache that never stores anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopUserCache;

#[async_trait]
impl UserCache for NoopUserCache {
    async fn get(&self, _key: CacheKey) -> UserResult<Option<CachedValue>> {
        Ok(None)
    }

    async fn put(&self, _key: CacheKey, _value: CachedValue) -> UserResult<()> {
        Ok(())
    }

    async fn evict(&self, _key: CacheKey) -> UserResult<()> {
        Ok(())
    }

    async fn clear(&self) -> UserResult<()> {
        Ok(())
    }
}

/// Which [`UserCache`] implementation to run with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackend {
    #[default]
    Memory,
    Redis,
    None,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(CacheBackend::Memory),
            "redis" => Ok(CacheBackend::Redis),
            "none" | "off" | "disabled" => Ok(CacheBackend::None),
            other => Err(format!(
                "unknown cache backend '{}', expected memory, redis or none",
                other
            )),
        }
    }
}

/// Users cache settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCacheConfig {
    pub backend: CacheBackend,
    pub ttl: Duration,
}

impl Default for UserCacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl FromEnv for UserCacheConfig {
    /// - USERS_CACHE_BACKEND: memory (default), redis or none
    /// - USERS_CACHE_TTL_SECS: entry lifetime, defaults to 60
    fn from_env() -> Result<Self, ConfigError> {
        let backend = env_or_default("USERS_CACHE_BACKEND", "memory")
            .parse::<CacheBackend>()
            .map_err(|details| ConfigError::ParseError {
                key: "USERS_CACHE_BACKEND".to_string(),
                details,
            })?;
        let ttl_secs = env_parse_or("USERS_CACHE_TTL_SECS", DEFAULT_CACHE_TTL.as_secs())?;

        Ok(Self {
            backend,
            ttl: Duration::from_secs(ttl_secs),
        })
    }
}
