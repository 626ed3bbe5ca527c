use axum::http::StatusCode;
use thiserror::Error;

use crate::history::HistoryError;
use crate::llm::LlmError;
use crate::search::SearchError;

/// Everything that can end a chat request early.
///
/// `Display` carries the full cause for server logs; [`ChatError::public_message`]
/// is the only text a client ever sees.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("no query provided")]
    MissingQuery,
    #[error("invalid request body: {0}")]
    InvalidRequest(String),
    #[error("retrieval failed: {0}")]
    Retrieval(#[source] SearchError),
    #[error("search returned no documents")]
    NoResults,
    #[error("generation failed: {0}")]
    Generation(#[source] LlmError),
    #[error("history store failed: {0}")]
    History(#[from] HistoryError),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Retrieval,
    EmptyResult,
    Generation,
    Internal,
}

impl ChatError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ChatError::MissingQuery | ChatError::InvalidRequest(_) => ErrorCategory::Validation,
            ChatError::Retrieval(_) => ErrorCategory::Retrieval,
            ChatError::NoResults => ErrorCategory::EmptyResult,
            ChatError::Generation(_) => ErrorCategory::Generation,
            ChatError::History(_) | ChatError::Internal(_) => ErrorCategory::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.category() {
            ErrorCategory::Validation => StatusCode::BAD_REQUEST,
            ErrorCategory::EmptyResult => StatusCode::NOT_FOUND,
            ErrorCategory::Retrieval | ErrorCategory::Generation => StatusCode::BAD_GATEWAY,
            ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn public_message(&self) -> &'static str {
        match self {
            ChatError::MissingQuery => "No query provided",
            ChatError::InvalidRequest(_) => "Invalid request body",
            ChatError::Retrieval(_) => "Search service is unavailable",
            ChatError::NoResults => "No relevant documents found",
            ChatError::Generation(_) => "Language model service is unavailable",
            ChatError::History(_) | ChatError::Internal(_) => "Internal server error",
        }
    }
}
