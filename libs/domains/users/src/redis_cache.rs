//! Redis implementation of [`UserCache`].

use async_trait::async_trait;
use database::redis::{AsyncCommands, ConnectionManager};
use std::time::Duration;

use crate::cache::{CacheKey, CachedValue, USERS_CACHE, UserCache};
use crate::error::{UserError, UserResult};

/// Redis-backed cache shared by every instance of the service.
///
/// Values are JSON under `users::<key>` with `SET EX`. Live keys are also
/// tracked in the `users::keys` set so `clear` never needs `KEYS`/`SCAN`.
/// The set expires with the newest entry it tracks.
#[derive(Clone)]
pub struct RedisUserCache {
    conn: ConnectionManager,
    ttl_secs: u64,
}

impl RedisUserCache {
    pub fn new(conn: ConnectionManager, ttl: Duration) -> Self {
        Self {
            conn,
            ttl_secs: ttl.as_secs().max(1),
        }
    }

    fn registry_key() -> String {
        format!("{}::keys", USERS_CACHE)
    }

    /// Delete `keys` and unregister exactly those keys.
    ///
    /// Keys registered after `keys` was read stay registered, so a later
    /// clear still finds them.
    async fn remove_registered(&self, keys: Vec<String>) -> UserResult<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.clone();
        redis::pipe()
            .atomic()
            .del(keys.clone())
            .ignore()
            .srem(Self::registry_key(), keys)
            .ignore()
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl UserCache for RedisUserCache {
    async fn get(&self, key: CacheKey) -> UserResult<Option<CachedValue>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key.qualified()).await?;

        raw.map(|json| {
            serde_json::from_str(&json)
                .map_err(|e| UserError::Cache(format!("corrupt entry {}: {}", key.qualified(), e)))
        })
        .transpose()
    }

    async fn put(&self, key: CacheKey, value: CachedValue) -> UserResult<()> {
        let json = serde_json::to_string(&value)?;
        let qualified = key.qualified();
        let mut conn = self.conn.clone();

        redis::pipe()
            .atomic()
            .set_ex(&qualified, json, self.ttl_secs)
            .ignore()
            .sadd(Self::registry_key(), &qualified)
            .ignore()
            .expire(Self::registry_key(), self.ttl_secs as i64)
            .ignore()
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn evict(&self, key: CacheKey) -> UserResult<()> {
        let qualified = key.qualified();
        let mut conn = self.conn.clone();

        redis::pipe()
            .atomic()
            .del(&qualified)
            .ignore()
            .srem(Self::registry_key(), &qualified)
            .ignore()
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn clear(&self) -> UserResult<()> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.smembers(Self::registry_key()).await?;
        self.remove_registered(keys).await
    }

    async fn ping(&self) -> UserResult<()> {
        let mut conn = self.conn.clone();
        database::redis::check_health(&mut conn)
            .await
            .map_err(|e| UserError::Cache(e.to_string()))
    }
}
