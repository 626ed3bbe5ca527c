use crate::config::prompt::{ self, PromptConfig };
use crate::error::ChatError;
use crate::history::HistoryStore;
use crate::llm::chat::Generator;
use crate::models::chat::{ QueryRequest, QueryResponse, Turn };
use crate::search::Retriever;

use log::{ debug, error, info, warn };
use std::collections::HashMap;
use std::sync::{ Arc, Mutex as StdMutex };
use tokio::sync::{ Mutex, OwnedMutexGuard };

/// Runs the retrieve → assemble → generate → persist sequence for one session.
pub struct ChatAgent {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
    history_store: Arc<dyn HistoryStore>,
    prompt_config: Arc<PromptConfig>,
    session_locks: SessionLocks,
}

impl ChatAgent {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn Generator>,
        history_store: Arc<dyn HistoryStore>,
        prompt_config: Arc<PromptConfig>
    ) -> Self {
        Self {
            retriever,
            generator,
            history_store,
            prompt_config,
            session_locks: SessionLocks::default(),
        }
    }

    pub async fn handle_query(
        &self,
        session_id: &str,
        request: QueryRequest
    ) -> Result<QueryResponse, ChatError> {
        let query = match request.query {
            Some(q) if !q.trim().is_empty() => q,
            _ => {
                return Err(ChatError::MissingQuery);
            }
        };

        let _guard = self.session_locks.acquire(session_id).await;

        let history = self.history_store.load(session_id).await?;
        debug!("Session {} has {} prior turn(s)", session_id, history.len());

        let documents = self.retriever.retrieve(&query).await.map_err(|e| {
            error!("Search failed for session {}: {}", session_id, e);
            ChatError::Retrieval(e)
        })?;
        if documents.is_empty() {
            warn!("Search returned no documents for session {}", session_id);
            return Err(ChatError::NoResults);
        }
        info!("Retrieved {} document(s) for session {}", documents.len(), session_id);

        let grounded_prompt = prompt::assemble(&self.prompt_config, &query, &history, &documents);
        debug!("--- Grounded Prompt ---\n{}\n-----------------------", grounded_prompt);

        let completion = self.generator.generate(&grounded_prompt).await.map_err(|e| {
            error!("Completion failed for session {}: {}", session_id, e);
            ChatError::Generation(e)
        })?;

        self.history_store.append(session_id, Turn::new(query.clone(), completion.response.clone())).await?;

        Ok(QueryResponse {
            query,
            response: completion.response,
        })
    }

    pub async fn clear_history(&self, session_id: &str) -> Result<(), ChatError> {
        let _guard = self.session_locks.acquire(session_id).await;
        self.history_store.clear(session_id).await?;
        info!("Cleared chat history for session {}", session_id);
        Ok(())
    }

    pub async fn history(&self, session_id: &str) -> Result<Vec<Turn>, ChatError> {
        Ok(self.history_store.load(session_id).await?)
    }
}

/// One async mutex per session so requests from the same session run one at
/// a time while other sessions proceed.
#[derive(Default)]
struct SessionLocks {
    locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    async fn acquire(&self, session_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = match self.locks.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            // Entries nobody else references are idle.
            locks.retain(|id, lock| id == session_id || Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(session_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryHistoryStore;
    use crate::llm::chat::CompletionResponse;
    use crate::llm::LlmError;
    use crate::models::document::RetrievedDocument;
    use crate::search::SearchError;
    use async_trait::async_trait;
    use std::sync::atomic::{ AtomicUsize, Ordering };
    use std::time::Duration;

    struct FixedRetriever {
        documents: Vec<RetrievedDocument>,
        fail: bool,
    }

    #[async_trait]
    impl Retriever for FixedRetriever {
        async fn retrieve(&self, _query: &str) -> Result<Vec<RetrievedDocument>, SearchError> {
            if self.fail {
                return Err(SearchError::Status { status: 503, body: "unavailable".into() });
            }
            Ok(self.documents.clone())
        }
    }

    #[derive(Default)]
    struct RecordingGenerator {
        prompts: StdMutex<Vec<String>>,
        fail: bool,
        delay: Option<Duration>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl Generator for RecordingGenerator {
        async fn generate(&self, prompt: &str) -> Result<CompletionResponse, LlmError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail {
                return Err(LlmError::EmptyResponse("stub"));
            }
            Ok(CompletionResponse { response: "X occurred on day 1 [Report A]".to_string() })
        }

        fn get_model(&self) -> String {
            "stub".to_string()
        }

        fn get_base_url(&self) -> Option<String> {
            None
        }
    }

    fn report_a() -> Vec<RetrievedDocument> {
        vec![RetrievedDocument::new("Report A", "X occurred on day 1", "Site 1")]
    }

    fn agent_with(
        retriever: FixedRetriever,
        generator: Arc<RecordingGenerator>,
        store: Arc<MemoryHistoryStore>
    ) -> ChatAgent {
        ChatAgent::new(Arc::new(retriever), generator, store, Arc::new(PromptConfig::default()))
    }

    #[tokio::test]
    async fn successful_query_appends_one_turn() {
        let store = Arc::new(MemoryHistoryStore::new(0));
        let generator = Arc::new(RecordingGenerator::default());
        let agent = agent_with(
            FixedRetriever { documents: report_a(), fail: false },
            generator.clone(),
            store.clone()
        );

        let resp = agent.handle_query("s1", QueryRequest::new("What is incident X?")).await.unwrap();

        assert_eq!(resp.query, "What is incident X?");
        assert_eq!(resp.response, "X occurred on day 1 [Report A]");
        let turns = store.load("s1").await.unwrap();
        assert_eq!(turns, vec![Turn::new("What is incident X?", "X occurred on day 1 [Report A]")]);

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("TITLE: Report A, CONTENT: X occurred on day 1, LOCATIONS: Site 1"));
        assert!(prompts[0].contains("What is incident X?"));
    }

    #[tokio::test]
    async fn second_prompt_carries_exactly_one_prior_pair() {
        let store = Arc::new(MemoryHistoryStore::new(0));
        let generator = Arc::new(RecordingGenerator::default());
        let agent = agent_with(
            FixedRetriever { documents: report_a(), fail: false },
            generator.clone(),
            store
        );

        agent.handle_query("s1", QueryRequest::new("first question")).await.unwrap();
        agent.handle_query("s1", QueryRequest::new("second question")).await.unwrap();

        let prompts = generator.prompts.lock().unwrap();
        assert!(!prompts[0].contains("User: "));
        assert_eq!(prompts[1].matches("User: ").count(), 1);
        assert_eq!(prompts[1].matches("Assistant: ").count(), 1);
        assert!(prompts[1].contains("User: first question\nAssistant: X occurred on day 1 [Report A]"));
    }

    #[tokio::test]
    async fn missing_or_blank_query_is_rejected_before_search() {
        let store = Arc::new(MemoryHistoryStore::new(0));
        let generator = Arc::new(RecordingGenerator::default());
        let agent = agent_with(
            FixedRetriever { documents: report_a(), fail: true },
            generator.clone(),
            store.clone()
        );

        let missing = agent.handle_query("s1", QueryRequest::default()).await;
        let blank = agent.handle_query("s1", QueryRequest::new("   ")).await;

        assert!(matches!(missing, Err(ChatError::MissingQuery)));
        assert!(matches!(blank, Err(ChatError::MissingQuery)));
        assert!(generator.prompts.lock().unwrap().is_empty());
        assert!(store.load("s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_search_skips_generation_and_keeps_history() {
        let store = Arc::new(MemoryHistoryStore::new(0));
        store.append("s1", Turn::new("old", "answer")).await.unwrap();
        let generator = Arc::new(RecordingGenerator::default());
        let agent = agent_with(
            FixedRetriever { documents: vec![], fail: false },
            generator.clone(),
            store.clone()
        );

        let result = agent.handle_query("s1", QueryRequest::new("anything")).await;

        assert!(matches!(result, Err(ChatError::NoResults)));
        assert!(generator.prompts.lock().unwrap().is_empty());
        assert_eq!(store.load("s1").await.unwrap(), vec![Turn::new("old", "answer")]);
    }

    #[tokio::test]
    async fn search_failure_keeps_history() {
        let store = Arc::new(MemoryHistoryStore::new(0));
        let agent = agent_with(
            FixedRetriever { documents: vec![], fail: true },
            Arc::new(RecordingGenerator::default()),
            store.clone()
        );

        let result = agent.handle_query("s1", QueryRequest::new("anything")).await;

        assert!(matches!(result, Err(ChatError::Retrieval(_))));
        assert!(store.load("s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn generation_failure_keeps_history() {
        let store = Arc::new(MemoryHistoryStore::new(0));
        store.append("s1", Turn::new("old", "answer")).await.unwrap();
        let generator = Arc::new(RecordingGenerator { fail: true, ..Default::default() });
        let agent = agent_with(
            FixedRetriever { documents: report_a(), fail: false },
            generator,
            store.clone()
        );

        let result = agent.handle_query("s1", QueryRequest::new("anything")).await;

        assert!(matches!(result, Err(ChatError::Generation(_))));
        assert_eq!(store.load("s1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn clear_history_empties_the_session() {
        let store = Arc::new(MemoryHistoryStore::new(0));
        let agent = agent_with(
            FixedRetriever { documents: report_a(), fail: false },
            Arc::new(RecordingGenerator::default()),
            store
        );
        agent.handle_query("s1", QueryRequest::new("q")).await.unwrap();

        agent.clear_history("s1").await.unwrap();

        assert!(agent.history("s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn same_session_requests_are_serialized() {
        let store = Arc::new(MemoryHistoryStore::new(0));
        let generator = Arc::new(RecordingGenerator {
            delay: Some(Duration::from_millis(20)),
            ..Default::default()
        });
        let agent = Arc::new(
            agent_with(FixedRetriever { documents: report_a(), fail: false }, generator.clone(), store.clone())
        );

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let agent = Arc::clone(&agent);
                tokio::spawn(async move {
                    agent.handle_query("shared", QueryRequest::new(format!("q{}", i))).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(generator.max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(store.load("shared").await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn idle_session_locks_are_pruned() {
        let locks = SessionLocks::default();
        drop(locks.acquire("a").await);
        drop(locks.acquire("b").await);
        drop(locks.acquire("c").await);

        assert_eq!(locks.len(), 1);
    }
}
