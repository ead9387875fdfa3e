use redis::Client;
use redis::aio::ConnectionManager;
use tracing::info;

use super::RedisConfig;
use crate::common::{RetryConfig, retry_with_backoff};

/// Connect to Redis and return a ConnectionManager.
///
/// The manager reconnects on its own after transient failures. The
/// connection is verified with `PING` before returning.
pub async fn connect(url: &str) -> redis::RedisResult<ConnectionManager> {
    info!("Attempting to connect to Redis at {}", url);

    let client = Client::open(url)?;
    let manager = ConnectionManager::new(client).await?;

    let mut conn = manager.clone();
    let _: String = redis::cmd("PING").query_async(&mut conn).await?;

    info!("Successfully connected to Redis");
    Ok(manager)
}

/// Connect with exponential backoff; `None` uses the default retry policy.
pub async fn connect_with_retry(
    config: &RedisConfig,
    retry_config: Option<RetryConfig>,
) -> redis::RedisResult<ConnectionManager> {
    retry_with_backoff(|| connect(config.url()), retry_config.unwrap_or_default()).await
}
