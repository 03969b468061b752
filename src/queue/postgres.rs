//! PostgreSQL-backed queue.
//!
//! All named queues share one table. Receive claims rows with
//! `FOR UPDATE SKIP LOCKED` and pushes `visible_at` forward by the visibility
//! timeout, so concurrent consumers never claim the same message.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::info;

use super::{MessageQueue, QueueError, QueueMessage, ReceiveOptions};
use crate::db::Database;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS queue_messages (
    id UUID PRIMARY KEY,
    queue TEXT NOT NULL,
    body TEXT NOT NULL,
    visible_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    receive_count INTEGER NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)"#;

const INDEX: &str = "CREATE INDEX IF NOT EXISTS idx_queue_messages_visible ON queue_messages (queue, visible_at)";

const CLAIM: &str = r#"
UPDATE queue_messages
SET visible_at = NOW() + make_interval(secs => $3),
    receive_count = receive_count + 1
WHERE id IN (
    SELECT id FROM queue_messages
    WHERE queue = $1 AND visible_at <= NOW()
    ORDER BY created_at
    LIMIT $2
    FOR UPDATE SKIP LOCKED
)
RETURNING id, body, created_at"#;

pub struct PgMessageQueue {
    pool: PgPool,
    name: String,
}

impl PgMessageQueue {
    pub fn new(db: &Database, name: impl Into<String>) -> Self {
        Self {
            pool: db.pool().clone(),
            name: name.into(),
        }
    }

    pub async fn init_schema(db: &Database) -> Result<(), QueueError> {
        sqlx::query(SCHEMA).execute(db.pool()).await?;
        sqlx::query(INDEX).execute(db.pool()).await?;
        info!("queue_messages schema ready");
        Ok(())
    }

    async fn claim(&self, options: &ReceiveOptions) -> Result<Vec<QueueMessage>, QueueError> {
        let rows = sqlx::query(CLAIM)
            .bind(&self.name)
            .bind(options.max_messages as i64)
            .bind(options.visibility_timeout.as_secs_f64())
            .fetch_all(&self.pool)
            .await?;

        let mut claimed = rows
            .iter()
            .map(|row| {
                let id: uuid::Uuid = row.try_get("id")?;
                let created_at: DateTime<Utc> = row.try_get("created_at")?;
                Ok((
                    created_at,
                    QueueMessage {
                        id: id.to_string(),
                        body: row.try_get("body")?,
                    },
                ))
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        // RETURNING order is unspecified
        claimed.sort_by_key(|(created_at, _)| *created_at);
        Ok(claimed.into_iter().map(|(_, m)| m).collect())
    }
}

fn parse_id(queue: &str, message_id: &str) -> Result<uuid::Uuid, QueueError> {
    uuid::Uuid::parse_str(message_id).map_err(|_| QueueError::UnknownMessage {
        queue: queue.to_string(),
        message_id: message_id.to_string(),
    })
}

#[async_trait]
impl MessageQueue for PgMessageQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn receive(&self, options: ReceiveOptions) -> Result<Vec<QueueMessage>, QueueError> {
        let deadline = tokio::time::Instant::now() + options.wait;
        loop {
            let batch = self.claim(&options).await?;
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if !batch.is_empty() || remaining.is_zero() {
                return Ok(batch);
            }
            tokio::time::sleep(POLL_INTERVAL.min(remaining)).await;
        }
    }

    async fn send(&self, body: &str) -> Result<String, QueueError> {
        let id = uuid::Uuid::new_v4();
        sqlx::query("INSERT INTO queue_messages (id, queue, body) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(&self.name)
            .bind(body)
            .execute(&self.pool)
            .await?;
        Ok(id.to_string())
    }

    async fn delete(&self, message_id: &str) -> Result<(), QueueError> {
        let id = parse_id(&self.name, message_id)?;
        let result = sqlx::query("DELETE FROM queue_messages WHERE id = $1 AND queue = $2")
            .bind(id)
            .bind(&self.name)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(QueueError::UnknownMessage {
                queue: self.name.clone(),
                message_id: message_id.to_string(),
            });
        }
        Ok(())
    }

    async fn peek(&self, max_messages: usize) -> Result<Vec<QueueMessage>, QueueError> {
        let rows = sqlx::query(
            "SELECT id, body FROM queue_messages WHERE queue = $1 ORDER BY created_at LIMIT $2",
        )
        .bind(&self.name)
        .bind(max_messages as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| {
                let id: uuid::Uuid = row.try_get("id")?;
                Ok(QueueMessage {
                    id: id.to_string(),
                    body: row.try_get("body")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(QueueError::from)
    }

    async fn count(&self) -> Result<u64, QueueError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM queue_messages WHERE queue = $1")
            .bind(&self.name)
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.try_get("n")?;
        Ok(n.max(0) as u64)
    }

    async fn ping(&self) -> Result<(), QueueError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
