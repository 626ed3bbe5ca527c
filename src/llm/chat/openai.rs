use async_trait::async_trait;
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };

use super::{ check_status, CompletionResponse, Generator };
use crate::llm::{ LlmConfig, LlmError };

const PROVIDER: &str = "OpenAI";

pub struct OpenAIChatClient {
    http: HttpClient,
    model: String,
    base_url: String,
    temperature: f32,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Body shared by every OpenAI-compatible `/chat/completions` endpoint.
#[derive(Serialize, Debug)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

impl ChatCompletionRequest {
    pub fn single_user_message(model: &str, prompt: &str, temperature: f32) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature,
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub(crate) fn bearer_http_client(api_key: &str) -> Result<HttpClient, LlmError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e|
            LlmError::Config(format!("Invalid API key format: {}", e))
        )?
    );

    HttpClient::builder()
        .default_headers(headers)
        .build()
        .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Posts one chat completion and returns the first choice's content.
pub(crate) async fn post_chat_completion(
    http: &HttpClient,
    provider: &'static str,
    url: &str,
    req: &ChatCompletionRequest
) -> Result<CompletionResponse, LlmError> {
    let resp = http
        .post(url)
        .json(req)
        .send().await
        .map_err(|source| LlmError::Http { provider, source })?;

    let resp = check_status(provider, resp).await?;
    let body = resp
        .json::<ChatCompletionResponse>().await
        .map_err(|source| LlmError::Http { provider, source })?;

    let content = body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(LlmError::EmptyResponse(provider))?;

    Ok(CompletionResponse { response: content })
}

impl OpenAIChatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        temperature: f32
    ) -> Result<Self, LlmError> {
        Ok(Self {
            http: bearer_http_client(&api_key)?,
            model: model.unwrap_or_else(|| "gpt-4o-mini".to_string()),
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com".to_string()),
            temperature,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key
            .clone()
            .ok_or_else(|| LlmError::Config("OpenAI API key is required".to_string()))?;

        Self::new(
            api_key,
            config.completion_model.clone(),
            config.base_url.clone(),
            config.temperature
        )
    }
}

#[async_trait]
impl Generator for OpenAIChatClient {
    async fn generate(&self, prompt: &str) -> Result<CompletionResponse, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let req = ChatCompletionRequest::single_user_message(&self.model, prompt, self.temperature);
        post_chat_completion(&self.http, PROVIDER, &url, &req).await
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}
