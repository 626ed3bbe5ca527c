use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::{ HistoryError, HistoryStore };
use crate::models::chat::Turn;

struct SessionEntry {
    turns: Vec<Turn>,
    touched: Instant,
}

/// Process-local history. Lost on restart.
///
/// Like the Redis store, a session expires `ttl` after its last append and
/// then loads as empty. Expired sessions are dropped on the next append.
#[derive(Default)]
pub struct MemoryHistoryStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    ttl: Option<Duration>,
}

impl MemoryHistoryStore {
    /// `ttl_secs` of 0 keeps sessions until they are cleared.
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs)),
        }
    }

    fn is_expired(&self, entry: &SessionEntry, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.duration_since(entry.touched) >= ttl,
            None => false,
        }
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn load(&self, session_id: &str) -> Result<Vec<Turn>, HistoryError> {
        let sessions = self.sessions.read().await;
        let now = Instant::now();
        Ok(
            sessions
                .get(session_id)
                .filter(|entry| !self.is_expired(entry, now))
                .map(|entry| entry.turns.clone())
                .unwrap_or_default()
        )
    }

    async fn append(&self, session_id: &str, turn: Turn) -> Result<(), HistoryError> {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        sessions.retain(|_, entry| !self.is_expired(entry, now));

        let entry = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionEntry { turns: Vec::new(), touched: now });
        entry.turns.push(turn);
        entry.touched = now;
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> Result<(), HistoryError> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}
