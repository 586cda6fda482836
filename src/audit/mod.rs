//! Interaction log
//!
//! Append-only record of every chat turn: user message, resolved intent,
//! recognized entities, bot reply and timestamp. The dialogue engine only
//! appends; the admin views and analytics read it back.

use crate::error::BankError;
use crate::models::{Entity, InteractionEntry};
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub mod postgres;

pub use postgres::PostgresInteractionLog;

/// Serialize entities for storage as a JSON array of `{value, label}`
pub fn serialize_entities(entities: &[Entity]) -> Result<String> {
    Ok(serde_json::to_string(entities)?)
}

#[async_trait]
pub trait InteractionLog: Send + Sync {
    async fn append(
        &self,
        user_message: &str,
        intent: &str,
        entities: &[Entity],
        bot_response: &str,
    ) -> Result<()>;

    /// Latest `limit` entries, newest first
    async fn recent(&self, limit: usize) -> Result<Vec<InteractionEntry>>;

    /// Every entry, oldest first
    async fn all(&self) -> Result<Vec<InteractionEntry>>;
}

/// In-memory log for development and tests
pub struct InMemoryInteractionLog {
    entries: Arc<RwLock<Vec<InteractionEntry>>>,
}

impl InMemoryInteractionLog {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for InMemoryInteractionLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InteractionLog for InMemoryInteractionLog {
    async fn append(
        &self,
        user_message: &str,
        intent: &str,
        entities: &[Entity],
        bot_response: &str,
    ) -> Result<()> {
        let entities = serialize_entities(entities)?;

        let mut entries = self.entries.write().await;
        let id = entries.len() as i64 + 1;
        entries.push(InteractionEntry {
            id,
            user_message: user_message.to_string(),
            intent: intent.to_string(),
            entities,
            bot_response: bot_response.to_string(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<InteractionEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.iter().rev().take(limit).cloned().collect())
    }

    async fn all(&self) -> Result<Vec<InteractionEntry>> {
        Ok(self.entries.read().await.clone())
    }
}

/// Postgres when a database URL is configured, in-memory otherwise
pub fn build_interaction_log(database_url: Option<&str>) -> Arc<dyn InteractionLog> {
    if let Some(url) = database_url {
        match PostgresInteractionLog::connect_lazy(url) {
            Ok(log) => {
                info!("Interaction log backend: postgres");
                return Arc::new(log);
            }
            Err(error) => {
                warn!(
                    "Failed to initialize postgres interaction log, falling back to in-memory: {}",
                    error
                );
            }
        }
    }

    info!("Interaction log backend: in-memory");
    Arc::new(InMemoryInteractionLog::new())
}

pub(crate) fn database_error(context: &str, e: impl std::fmt::Display) -> BankError {
    BankError::DatabaseError(format!("{}: {}", context, e))
}
