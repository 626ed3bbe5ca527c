pub mod groq;
pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use log::info;
use super::{ LlmConfig, LlmError, LlmType };
use self::groq::GroqChatClient;
use self::ollama::OllamaClient;
use self::openai::OpenAIChatClient;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    pub response: String,
}

/// A hosted completion backend. One prompt in, one completion out.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<CompletionResponse, LlmError>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> Option<String>;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn Generator>, LlmError> {
    let client: Arc<dyn Generator> = match config.llm_type {
        LlmType::Groq => {
            let specific_client = GroqChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
        LlmType::OpenAI => {
            let specific_client = OpenAIChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
        LlmType::Ollama => {
            let specific_client = OllamaClient::from_config(config)?;
            Arc::new(specific_client)
        }
    };
    info!(
        "Chat client configured: Type={:?}, Model={}, BaseURL={}",
        config.llm_type,
        client.get_model(),
        client.get_base_url().unwrap_or_default()
    );
    Ok(client)
}

/// Turns a non-2xx response into `LlmError::Status`, keeping the body for logs.
pub(crate) async fn check_status(
    provider: &'static str,
    resp: reqwest::Response
) -> Result<reqwest::Response, LlmError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(LlmError::Status {
        provider,
        status: status.as_u16(),
        body,
    })
}
