//! Users Domain
//!
//! CRUD over users with a read-through cache and streamed listings.
//!
//! # Features
//!
//! - List users as a JSON array or as newline-delimited JSON
//! - Lookup by id, create with email uniqueness, delete by id
//! - Read-through cache (in-memory, Redis or disabled)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐     ┌─────────────┐
//! │   Service   │ ──► │    Cache    │  ← users::<key> entries
//! └──────┬──────┘     └─────────────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + implementations)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← User, create outcome
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_users::{
//!     handlers,
//!     repository::InMemoryUserRepository,
//!     service::UserService,
//! };
//!
//! // Create repository and service
//! let repository = InMemoryUserRepository::new();
//! let service = UserService::new(repository);
//!
//! // Create Axum router
//! let router: axum::Router = handlers::router(service);
//! ```

pub mod cache;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod redis_cache;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use cache::{
    CacheBackend, CacheKey, CachedValue, InMemoryUserCache, NoopUserCache, USERS_CACHE, UserCache,
    UserCacheConfig,
};
pub use error::{UserError, UserResult};
pub use handlers::ApiDoc;
pub use models::{CreateUserOutcome, User};
pub use postgres::PgUserRepository;
pub use redis_cache::RedisUserCache;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::UserService;
