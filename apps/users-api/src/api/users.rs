//! Users API routes
//!
//! This module wires up the users domain to HTTP routes.

use axum::Router;
use domain_users::{PgUserRepository, UserService, handlers};
use std::sync::Arc;

use crate::state::AppState;

/// Create users router
pub fn router(state: &AppState) -> Router {
    let repository = PgUserRepository::new(state.db.clone());
    let service = UserService::with_cache(repository, Arc::clone(&state.cache));

    handlers::router(service)
}
