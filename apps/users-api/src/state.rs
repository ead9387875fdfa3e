//! Application state management.
//!
//! This module defines the shared application state passed to the API routers.
//! The state contains:
//! - Configuration
//! - PostgreSQL connection pool
//! - The users cache backend

use domain_users::UserCache;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Shared application state.
///
/// Cloning is cheap: the connection pool and cache are reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    pub db: DatabaseConnection,
    /// Shared by the users service and the readiness check
    pub cache: Arc<dyn UserCache>,
}
