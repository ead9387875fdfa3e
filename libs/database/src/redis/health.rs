use redis::aio::ConnectionManager;
use tracing::debug;

use crate::common::{DatabaseError, DatabaseResult};

/// Check Redis health with `PING`.
pub async fn check_health(conn: &mut ConnectionManager) -> DatabaseResult<()> {
    debug!("Running Redis health check");

    let response: String = redis::cmd("PING").query_async(conn).await?;

    if response != "PONG" {
        return Err(DatabaseError::HealthCheckFailed(format!(
            "Redis PING returned unexpected response: {}",
            response
        )));
    }

    debug!("Redis health check passed");
    Ok(())
}
