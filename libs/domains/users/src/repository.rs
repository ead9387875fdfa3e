use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::error::{UserError, UserResult};
use crate::models::User;

/// Repository trait for User persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Every user, in store order, as a lazy stream
    fn find_all(&self) -> BoxStream<'static, UserResult<User>>;

    async fn find_by_id(&self, id: i64) -> UserResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>>;

    /// Insert when `user.id` is `None` (assigning an id), update otherwise
    async fn save(&self, user: User) -> UserResult<User>;

    /// Deleting an id that does not exist is a no-op
    async fn delete_by_id(&self, id: i64) -> UserResult<()>;
}

/// In-memory implementation of UserRepository (for development/testing)
///
/// Iterates in ascending id order and enforces email uniqueness the way the
/// `users.email` unique index does.
#[derive(Debug, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<BTreeMap<i64, User>>>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    fn find_all(&self) -> BoxStream<'static, UserResult<User>> {
        let users = Arc::clone(&self.users);

        // Snapshot on first poll, not on call
        stream::once(async move {
            let users = users.read().await;
            stream::iter(users.values().cloned().map(Ok).collect::<Vec<_>>())
        })
        .flatten()
        .boxed()
    }

    async fn find_by_id(&self, id: i64) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn save(&self, mut user: User) -> UserResult<User> {
        let mut users = self.users.write().await;

        let taken = users
            .values()
            .any(|u| u.email == user.email && u.id != user.id);
        if taken {
            return Err(UserError::EmailUniqueness(user.email));
        }

        let id = match user.id {
            Some(id) => {
                self.next_id.fetch_max(id + 1, Ordering::SeqCst);
                id
            }
            None => self.next_id.fetch_add(1, Ordering::SeqCst),
        };
        user.id = Some(id);
        users.insert(id, user.clone());

        tracing::debug!(user_id = id, "Saved user");
        Ok(user)
    }

    async fn delete_by_id(&self, id: i64) -> UserResult<()> {
        let mut users = self.users.write().await;
        users.remove(&id);
        Ok(())
    }
}
