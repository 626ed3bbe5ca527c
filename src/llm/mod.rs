pub mod chat;
use serde::{ Deserialize, Serialize };
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmType {
    Groq,
    OpenAI,
    Ollama,
}

#[derive(Debug, PartialEq, Eq, Error)]
#[error("Invalid LLM type: '{0}'")]
pub struct ParseLlmTypeError(String);

impl FromStr for LlmType {
    type Err = ParseLlmTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "groq" => Ok(LlmType::Groq),
            "openai" => Ok(LlmType::OpenAI),
            "ollama" => Ok(LlmType::Ollama),
            _ => Err(ParseLlmTypeError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub llm_type: LlmType,
    pub api_key: Option<String>,
    pub completion_model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            llm_type: LlmType::Groq,
            api_key: None,
            completion_model: None,
            base_url: None,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Failures talking to a completion backend.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{0}")]
    Config(String),
    #[error("request to {provider} failed: {source}")]
    Http {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} returned status {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("{0} returned no completion")]
    EmptyResponse(&'static str),
}
