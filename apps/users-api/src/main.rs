use axum_helpers::server::{create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_users::{CacheBackend, InMemoryUserCache, NoopUserCache, RedisUserCache, UserCache};
use migration::Migrator;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.environment);

    info!("Connecting to PostgreSQL");

    // Connect to PostgreSQL with retry
    let db = database::postgres::connect_from_config_with_retry(config.postgres.clone(), None)
        .await?;

    if config.run_migrations {
        database::postgres::run_migrations::<Migrator>(&db, config.app.name).await?;
    }

    let cache = build_cache(&config).await?;

    // Initialize the application state
    let state = AppState { config, db, cache };

    // Build router with API routes
    let api_routes = api::routes(&state);

    // Create a router with OpenAPI docs
    let router = axum_helpers::create_router::<openapi::ApiDoc>(api_routes, &state.config.server)?;

    // Merge health endpoints
    let app = router.merge(health_router(state.config.app));

    info!("Starting Users API with production-ready shutdown (30s timeout)");

    let db = state.db.clone();
    create_production_app(
        app,
        &state.config.server,
        Duration::from_secs(30),
        async move {
            info!("Shutting down: closing PostgreSQL connections");
            match db.close().await {
                Ok(()) => info!("PostgreSQL connection closed successfully"),
                Err(e) => tracing::warn!(error = %e, "Failed to close PostgreSQL connection"),
            }
        },
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Users API shutdown complete");
    Ok(())
}

async fn build_cache(config: &Config) -> eyre::Result<Arc<dyn UserCache>> {
    let ttl = config.cache.ttl;

    let cache: Arc<dyn UserCache> = match (config.cache.backend, &config.redis) {
        (CacheBackend::Redis, Some(redis)) => {
            info!("Connecting to Redis cache at {}", redis.url());
            let conn = database::redis::connect_with_retry(redis, None).await?;
            Arc::new(RedisUserCache::new(conn, ttl))
        }
        (CacheBackend::Redis, None) => {
            return Err(eyre::eyre!("Redis cache selected but no Redis configuration"));
        }
        (CacheBackend::Memory, _) => {
            info!(ttl_secs = ttl.as_secs(), "Using in-memory users cache");
            Arc::new(InMemoryUserCache::new(ttl))
        }
        (CacheBackend::None, _) => {
            info!("Users cache disabled");
            Arc::new(NoopUserCache)
        }
    };

    Ok(cache)
}
