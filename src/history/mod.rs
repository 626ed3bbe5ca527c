mod memory;
mod redis;

use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use thiserror::Error;

use crate::cli::Args;
use crate::models::chat::Turn;

pub use self::memory::MemoryHistoryStore;
pub use self::redis::RedisHistoryStore;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("unsupported history store type: {0}")]
    UnsupportedType(String),
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error("history entry serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Session-scoped chat history. Turns are only ever appended or cleared as a
/// whole; `load` returns them in insertion order.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn load(&self, session_id: &str) -> Result<Vec<Turn>, HistoryError>;

    async fn append(&self, session_id: &str, turn: Turn) -> Result<(), HistoryError>;

    async fn clear(&self, session_id: &str) -> Result<(), HistoryError>;
}

pub fn create_history_store(args: &Args) -> Result<Arc<dyn HistoryStore>, HistoryError> {
    match args.history_type.to_lowercase().as_str() {
        "memory" => Ok(Arc::new(MemoryHistoryStore::new(args.history_ttl_secs))),
        "redis" => {
            let store = RedisHistoryStore::new(
                &args.history_host,
                args.history_redis_prefix.clone(),
                args.history_ttl_secs
            )?;
            Ok(Arc::new(store))
        }
        other => Err(HistoryError::UnsupportedType(other.to_string())),
    }
}

pub fn initialize_history_store(args: &Args) -> Result<Arc<dyn HistoryStore>, HistoryError> {
    if args.history_type.eq_ignore_ascii_case("redis") {
        info!("Chat history will be stored in: redis at {}", args.history_host);
    } else {
        info!("Chat history will be stored in: {}", args.history_type);
    }
    create_history_store(args)
}
