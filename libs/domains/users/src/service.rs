use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, error, info, instrument, warn};

use crate::cache::{CacheKey, CachedValue, InMemoryUserCache, UserCache};
use crate::error::{UserError, UserResult};
use crate::models::{CreateUserOutcome, User};
use crate::repository::UserRepository;

/// Service layer for User business logic
///
/// Reads go through the cache first; mutations evict after the store
/// confirms them.
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
    cache: Arc<dyn UserCache>,
}

impl<R: UserRepository + 'static> UserService<R> {
    /// Service with a process-local cache using the default TTL
    pub fn new(repository: R) -> Self {
        Self::with_cache(repository, Arc::new(InMemoryUserCache::default()))
    }

    pub fn with_cache(repository: R, cache: Arc<dyn UserCache>) -> Self {
        Self {
            repository: Arc::new(repository),
            cache,
        }
    }

    pub fn cache(&self) -> Arc<dyn UserCache> {
        Arc::clone(&self.cache)
    }

    /// All users in store order.
    ///
    /// Nothing happens until the stream is polled. A store error ends the
    /// stream with that error; the list is cached only after it completes.
    pub fn list(&self) -> BoxStream<'static, UserResult<User>> {
        let repository = Arc::clone(&self.repository);
        let cache = Arc::clone(&self.cache);

        let stream = async_stream::try_stream! {
            debug!("Subscribed to user list");
            let started = Instant::now();

            match cache_get(cache.as_ref(), CacheKey::AllUsers).await {
                Some(CachedValue::Users(users)) => {
                    debug!(count = users.len(), "User list served from cache");
                    for user in users {
                        yield user;
                    }
                }
                _ => {
                    let mut records = repository.find_all();
                    let mut fetched = Vec::new();

                    while let Some(user) = records.try_next().await? {
                        debug!(
                            user_id = ?user.id,
                            name = %user.name,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "Received user record"
                        );
                        fetched.push(user.clone());
                        yield user;
                    }

                    cache_put(cache.as_ref(), CacheKey::AllUsers, CachedValue::Users(fetched))
                        .await;
                }
            }

            info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "User list completed"
            );
        };

        stream.boxed()
    }

    /// Same records as [`list`](Self::list), produced by a background task.
    ///
    /// The task pulls from the store as fast as it can and buffers without
    /// bound, so a slow consumer never stalls the query. It stops when the
    /// consumer drops the stream or the source ends or fails.
    pub fn stream_users(&self) -> BoxStream<'static, UserResult<User>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut source = self.list();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => {
                        debug!("User stream consumer went away, stopping producer");
                        break;
                    }
                    next = source.next() => match next {
                        Some(Ok(user)) => {
                            if tx.send(Ok(user)).is_err() {
                                break;
                            }
                        }
                        Some(Err(e)) => {
                            error!(error = %e, "User stream failed");
                            let _ = tx.send(Err(e));
                            break;
                        }
                        None => break,
                    },
                }
            }
        });

        UnboundedReceiverStream::new(rx).boxed()
    }

    /// The user with `id`, or `None`. Only found users are cached.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: i64) -> UserResult<Option<User>> {
        let key = CacheKey::UserById(id);

        if let Some(CachedValue::User(user)) = cache_get(self.cache.as_ref(), key).await {
            debug!("User served from cache");
            return Ok(Some(user));
        }

        let user = self.repository.find_by_id(id).await?;
        if let Some(user) = &user {
            cache_put(self.cache.as_ref(), key, CachedValue::User(user.clone())).await;
        }
        Ok(user)
    }

    /// Create a user whose email is not yet taken.
    ///
    /// Never fails: every error is resolved to an outcome here. The whole
    /// cache is cleared only once the save has succeeded.
    #[instrument(skip(self, user), fields(email = %user.email))]
    pub async fn create(&self, user: User) -> CreateUserOutcome {
        match self.try_create(user).await {
            Ok(saved) => {
                info!(user_id = ?saved.id, name = %saved.name, "Created user");
                cache_clear(self.cache.as_ref()).await;
                CreateUserOutcome::Created(saved)
            }
            Err(UserError::EmailUniqueness(email)) => {
                warn!(%email, "Rejected user with duplicate email");
                CreateUserOutcome::Conflict
            }
            Err(e) => {
                error!(error = %e, "Failed to create user");
                CreateUserOutcome::Failed
            }
        }
    }

    async fn try_create(&self, user: User) -> UserResult<User> {
        if self.repository.find_by_email(&user.email).await?.is_some() {
            return Err(UserError::EmailUniqueness(user.email));
        }

        // Ids are always assigned by the store
        let user = User { id: None, ..user };
        self.repository.save(user).await
    }

    /// Delete by id; deleting a missing id succeeds.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> UserResult<()> {
        self.repository.delete_by_id(id).await?;

        cache_evict(self.cache.as_ref(), CacheKey::UserById(id)).await;
        cache_evict(self.cache.as_ref(), CacheKey::AllUsers).await;
        info!("Deleted user");
        Ok(())
    }
}

async fn cache_get(cache: &dyn UserCache, key: CacheKey) -> Option<CachedValue> {
    match cache.get(key).await {
        Ok(value) => value,
        Err(e) => {
            warn!(key = %key.qualified(), error = %e, "Cache read failed, treating as miss");
            None
        }
    }
}

async fn cache_put(cache: &dyn UserCache, key: CacheKey, value: CachedValue) {
    if let Err(e) = cache.put(key, value).await {
        warn!(key = %key.qualified(), error = %e, "Cache write failed");
    }
}

async fn cache_evict(cache: &dyn UserCache, key: CacheKey) {
    if let Err(e) = cache.evict(key).await {
        warn!(key = %key.qualified(), error = %e, "Cache eviction failed");
    }
}

async fn cache_clear(cache: &dyn UserCache) {
    if let Err(e) = cache.clear().await {
        warn!(error = %e, "Cache clear failed");
    }
}
