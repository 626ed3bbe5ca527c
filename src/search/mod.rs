pub mod azure;

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::cli::Args;
use crate::models::document::RetrievedDocument;
use self::azure::{ AzureSearchClient, HybridQueryOptions };

/// Ranked document lookup for one query. Order of the result is the backend's.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedDocument>, SearchError>;
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search configuration error: {0}")]
    Config(String),
    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("search service returned status {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },
}

/// Authentication material for the search service. Acquiring a bearer token
/// is left to the deployment; only its value is consumed here.
#[derive(Clone)]
pub enum SearchCredential {
    ApiKey(String),
    BearerToken(String),
}

impl SearchCredential {
    pub fn from_args(args: &Args) -> Result<Self, SearchError> {
        let non_empty = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);

        if let Some(key) = non_empty(&args.search_api_key) {
            return Ok(SearchCredential::ApiKey(key));
        }
        if let Some(token) = non_empty(&args.search_bearer_token) {
            return Ok(SearchCredential::BearerToken(token));
        }
        Err(SearchError::Config("either SEARCH_API_KEY or SEARCH_BEARER_TOKEN must be set".to_string()))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SearchCredential::ApiKey(_) => "api-key",
            SearchCredential::BearerToken(_) => "bearer-token",
        }
    }
}

impl fmt::Debug for SearchCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SearchCredential({}, <redacted>)", self.kind())
    }
}

pub fn initialize_retriever(args: &Args) -> Result<Arc<dyn Retriever>, SearchError> {
    let credential = SearchCredential::from_args(args)?;
    let options = HybridQueryOptions {
        semantic_configuration: args.search_semantic_config.clone(),
        scoring_profile: args.search_scoring_profile.clone(),
        scoring_parameter: args.search_scoring_parameter.clone(),
        vector_field: args.search_vector_field.clone(),
        k_nearest_neighbors: args.search_knn,
        top: args.search_top,
    };
    let client = AzureSearchClient::new(
        &args.search_endpoint,
        &args.search_index_name,
        &args.search_api_version,
        credential,
        options
    )?;
    Ok(Arc::new(client))
}
