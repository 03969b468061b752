//! PostgreSQL pool shared by the instruction store and the message queues

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, warn};

const MAX_CONNECTIONS: u32 = 20;
const CONNECT_ATTEMPTS: u32 = 5;
const FIRST_RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect, retrying with doubling delays while PostgreSQL comes up.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let mut delay = FIRST_RETRY_DELAY;
        let mut attempt = 1;
        loop {
            match Self::try_connect(database_url).await {
                Ok(pool) => {
                    info!(attempt, "PostgreSQL connection pool established");
                    return Ok(Self { pool });
                }
                Err(e) if attempt < CONNECT_ATTEMPTS && is_retryable(&e) => {
                    warn!(attempt, error = %e, retry_in = ?delay, "PostgreSQL not reachable");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Refused connections and pool timeouts are worth another try; bad
/// credentials or a malformed URL are not.
fn is_retryable(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut)
}

/// Extension trait for safe row access with logging
pub trait SafeRow {
    /// Read a column, logging and returning `None` when it cannot be decoded
    fn try_get_log<'r, T>(&'r self, column: &str) -> Option<T>
    where
        T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>;
}

impl SafeRow for sqlx::postgres::PgRow {
    fn try_get_log<'r, T>(&'r self, column: &str) -> Option<T>
    where
        T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
    {
        use sqlx::Row;
        match self.try_get(column) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::error!(column, error = %e, "Failed to read column");
                None
            }
        }
    }
}
