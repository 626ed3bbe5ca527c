use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;

use super::openai::{ bearer_http_client, post_chat_completion, ChatCompletionRequest };
use super::{ CompletionResponse, Generator };
use crate::llm::{ LlmConfig, LlmError };

const PROVIDER: &str = "Groq";

pub struct GroqChatClient {
    http: HttpClient,
    model: String,
    base_url: String,
    temperature: f32,
}

impl GroqChatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        temperature: f32
    ) -> Result<Self, LlmError> {
        let chat_model = model.unwrap_or_else(|| "llama3-8b-8192".to_string());
        let api_url = base_url.unwrap_or_else(|| "https://api.groq.com".to_string());

        Ok(Self {
            http: bearer_http_client(&api_key)?,
            model: chat_model,
            base_url: api_url,
            temperature,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key
            .clone()
            .ok_or_else(|| LlmError::Config("Groq API key is required".to_string()))?;

        Self::new(
            api_key,
            config.completion_model.clone(),
            config.base_url.clone(),
            config.temperature
        )
    }

    fn completions_url(&self) -> String {
        format!("{}/openai/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Generator for GroqChatClient {
    async fn generate(&self, prompt: &str) -> Result<CompletionResponse, LlmError> {
        let url = self.completions_url();
        let req = ChatCompletionRequest::single_user_message(&self.model, prompt, self.temperature);

        debug!("Groq completion request to {} ({} prompt chars)", url, prompt.len());
        post_chat_completion(&self.http, PROVIDER, &url, &req).await
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}
