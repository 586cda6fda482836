//! Postgres-backed interaction log

use super::{database_error, serialize_entities, InteractionLog};
use crate::models::{Entity, InteractionEntry};
use crate::Result;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::sync::Arc;
use tokio::sync::OnceCell;

pub struct PostgresInteractionLog {
    pool: PgPool,
    schema_ready: Arc<OnceCell<()>>,
}

impl PostgresInteractionLog {
    /// Build a pool without connecting; the first query opens the connection
    pub fn connect_lazy(url: &str) -> std::result::Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new().max_connections(5).connect_lazy(url)?;
        Ok(Self {
            pool,
            schema_ready: Arc::new(OnceCell::new()),
        })
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.schema_ready
            .get_or_try_init(|| async {
                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS logs (
                      id BIGSERIAL PRIMARY KEY,
                      user_message TEXT NOT NULL,
                      intent TEXT NOT NULL,
                      entities TEXT NOT NULL,
                      bot_response TEXT NOT NULL,
                      timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW()
                    );
                    "#,
                )
                .execute(&self.pool)
                .await?;

                sqlx::query("CREATE INDEX IF NOT EXISTS idx_logs_timestamp ON logs (timestamp);")
                    .execute(&self.pool)
                    .await?;

                Ok::<(), sqlx::Error>(())
            })
            .await
            .map_err(|e| database_error("Failed to initialize interaction log schema", e))?;

        Ok(())
    }

    fn entry_from_row(row: &PgRow) -> InteractionEntry {
        InteractionEntry {
            id: row.try_get("id").unwrap_or_default(),
            user_message: row.try_get("user_message").unwrap_or_default(),
            intent: row.try_get("intent").unwrap_or_default(),
            entities: row.try_get("entities").unwrap_or_else(|_| "[]".to_string()),
            bot_response: row.try_get("bot_response").unwrap_or_default(),
            timestamp: row
                .try_get("timestamp")
                .unwrap_or_else(|_| chrono::Utc::now()),
        }
    }
}

#[async_trait]
impl InteractionLog for PostgresInteractionLog {
    async fn append(
        &self,
        user_message: &str,
        intent: &str,
        entities: &[Entity],
        bot_response: &str,
    ) -> Result<()> {
        self.ensure_schema().await?;

        sqlx::query(
            "INSERT INTO logs (user_message, intent, entities, bot_response) VALUES ($1, $2, $3, $4)",
        )
        .bind(user_message)
        .bind(intent)
        .bind(serialize_entities(entities)?)
        .bind(bot_response)
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("Failed to insert interaction", e))?;

        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<InteractionEntry>> {
        self.ensure_schema().await?;

        let rows = sqlx::query(
            r#"
            SELECT id, user_message, intent, entities, bot_response, timestamp
            FROM logs
            ORDER BY timestamp DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("Failed to load interactions", e))?;

        Ok(rows.iter().map(Self::entry_from_row).collect())
    }

    async fn all(&self) -> Result<Vec<InteractionEntry>> {
        self.ensure_schema().await?;

        let rows = sqlx::query(
            r#"
            SELECT id, user_message, intent, entities, bot_response, timestamp
            FROM logs
            ORDER BY timestamp ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("Failed to load interactions", e))?;

        Ok(rows.iter().map(Self::entry_from_row).collect())
    }
}
