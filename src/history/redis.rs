use async_trait::async_trait;
use chrono::Utc;
use log::error;
use redis::{ AsyncCommands, Client };
use serde::{ Deserialize, Serialize };

use super::{ HistoryError, HistoryStore };
use crate::models::chat::Turn;

#[derive(Serialize, Deserialize)]
struct StoredTurn {
    query: String,
    response: String,
    asked_at: i64,
}

/// History kept in one Redis list per session, oldest turn first.
pub struct RedisHistoryStore {
    client: Client,
    key_prefix: String,
    ttl_secs: u64,
}

impl RedisHistoryStore {
    pub fn new(host: &str, key_prefix: String, ttl_secs: u64) -> Result<Self, HistoryError> {
        Ok(Self {
            client: Client::open(host)?,
            key_prefix,
            ttl_secs,
        })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    fn key(&self, session_id: &str) -> String {
        format!("{}{}", self.key_prefix, session_id)
    }
}

#[async_trait]
impl HistoryStore for RedisHistoryStore {
    async fn load(&self, session_id: &str) -> Result<Vec<Turn>, HistoryError> {
        let mut conn = self.get_connection().await?;
        let json_entries: Vec<String> = conn.lrange(self.key(session_id), 0, -1).await?;
        let mut turns = Vec::with_capacity(json_entries.len());

        for json_entry in &json_entries {
            match serde_json::from_str::<StoredTurn>(json_entry) {
                Ok(stored) => turns.push(Turn::new(stored.query, stored.response)),
                Err(e) => error!("Error parsing history entry: {}", e),
            }
        }

        Ok(turns)
    }

    async fn append(&self, session_id: &str, turn: Turn) -> Result<(), HistoryError> {
        let mut conn = self.get_connection().await?;
        let key = self.key(session_id);

        let stored = StoredTurn {
            query: turn.query,
            response: turn.response,
            asked_at: Utc::now().timestamp(),
        };
        let json_entry = serde_json::to_string(&stored)?;

        let mut pipe = redis::pipe();
        pipe.atomic().rpush(&key, json_entry).ignore();
        if self.ttl_secs > 0 {
            pipe.expire(&key, self.ttl_secs as i64).ignore();
        }
        pipe.query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> Result<(), HistoryError> {
        let mut conn = self.get_connection().await?;
        conn.del::<_, ()>(self.key(session_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_prefixed_per_session() {
        let store = RedisHistoryStore::new("redis://127.0.0.1:6379", "history:".into(), 0).unwrap();
        assert_eq!(store.key("abc"), "history:abc");
    }

    #[test]
    fn rejects_invalid_redis_url() {
        let result = RedisHistoryStore::new("not-a-redis-url", "history:".into(), 0);
        assert!(matches!(result, Err(HistoryError::Redis(_))));
    }

    fn redis_host() -> String {
        std::env::var("HISTORY_HOST").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
    }

    #[tokio::test]
    #[ignore] // Requires a running Redis at HISTORY_HOST
    async fn round_trip_against_live_redis() {
        let prefix = format!("history-test:{}:", uuid::Uuid::new_v4());
        let store = RedisHistoryStore::new(&redis_host(), prefix, 120).unwrap();
        let session = "session-1";

        assert!(store.load(session).await.unwrap().is_empty());

        store.append(session, Turn::new("q1", "a1")).await.unwrap();
        store.append(session, Turn::new("q2", "a2")).await.unwrap();
        assert_eq!(
            store.load(session).await.unwrap(),
            vec![Turn::new("q1", "a1"), Turn::new("q2", "a2")]
        );

        let mut conn = store.get_connection().await.unwrap();
        let ttl: i64 = conn.ttl(store.key(session)).await.unwrap();
        assert!(ttl > 0 && ttl <= 120, "unexpected ttl {}", ttl);

        store.clear(session).await.unwrap();
        assert!(store.load(session).await.unwrap().is_empty());
        let exists: bool = conn.exists(store.key(session)).await.unwrap();
        assert!(!exists);
    }

    #[tokio::test]
    #[ignore] // Requires a running Redis at HISTORY_HOST
    async fn zero_ttl_leaves_key_persistent() {
        let prefix = format!("history-test:{}:", uuid::Uuid::new_v4());
        let store = RedisHistoryStore::new(&redis_host(), prefix, 0).unwrap();

        store.append("s", Turn::new("q", "r")).await.unwrap();

        let mut conn = store.get_connection().await.unwrap();
        let ttl: i64 = conn.ttl(store.key("s")).await.unwrap();
        assert_eq!(ttl, -1);

        store.clear("s").await.unwrap();
    }
}
