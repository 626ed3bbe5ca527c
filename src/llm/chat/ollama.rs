use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };

use super::openai::ChatMessage;
use super::{ check_status, CompletionResponse, Generator };
use crate::llm::{ LlmConfig, LlmError, LlmType };

const PROVIDER: &str = "Ollama";

#[derive(Debug)]
pub struct OllamaClient {
    http: HttpClient,
    base_url: String,
    completion_model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ChatMessage>,
}

impl OllamaClient {
    pub fn new(base_url: Option<String>, completion_model: Option<String>, temperature: f32) -> Self {
        let model = completion_model.unwrap_or_else(|| "llama3".to_string());
        let url = base_url.unwrap_or_else(|| "http://localhost:11434".into());

        Self {
            http: HttpClient::new(),
            base_url: url,
            completion_model: model,
            temperature,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        if config.llm_type != LlmType::Ollama {
            return Err(LlmError::Config("Invalid config type for OllamaClient".into()));
        }

        Ok(Self::new(config.base_url.clone(), config.completion_model.clone(), config.temperature))
    }
}

#[async_trait]
impl Generator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<CompletionResponse, LlmError> {
        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        let req = ChatRequest {
            model: self.completion_model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
            options: ChatOptions { temperature: self.temperature },
        };

        let resp = self.http
            .post(&url)
            .json(&req)
            .send().await
            .map_err(|source| LlmError::Http { provider: PROVIDER, source })?;
        let resp = check_status(PROVIDER, resp).await?;
        let body = resp
            .json::<ChatResponse>().await
            .map_err(|source| LlmError::Http { provider: PROVIDER, source })?;

        let message = body.message.ok_or(LlmError::EmptyResponse(PROVIDER))?;
        Ok(CompletionResponse { response: message.content })
    }

    fn get_model(&self) -> String {
        self.completion_model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}
