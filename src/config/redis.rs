use redis::aio::ConnectionManager;
use tokio::time::{timeout, Duration};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connect to the optional statistics cache. Callers treat a failure as
/// "run without cache", not as a startup error.
pub async fn get_redis() -> anyhow::Result<ConnectionManager> {
    let redis_url =
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
    let client = redis::Client::open(redis_url)?;

    let manager = timeout(CONNECT_TIMEOUT, ConnectionManager::new(client))
        .await
        .map_err(|_| {
            anyhow::anyhow!("Redis connection timed out after {:?}", CONNECT_TIMEOUT)
        })??;

    Ok(manager)
}
