use async_trait::async_trait;
use log::{ debug, error };
use reqwest::header::{ HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE };
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };
use serde_json::Value;
use url::Url;

use super::{ Retriever, SearchCredential, SearchError };
use crate::models::document::RetrievedDocument;

const SELECT_FIELDS: &str = "title, chunk, locations";

/// Tuning knobs forwarded verbatim with every hybrid query.
#[derive(Debug, Clone)]
pub struct HybridQueryOptions {
    pub semantic_configuration: String,
    pub scoring_profile: String,
    pub scoring_parameter: String,
    pub vector_field: String,
    pub k_nearest_neighbors: usize,
    pub top: usize,
}

impl Default for HybridQueryOptions {
    fn default() -> Self {
        Self {
            semantic_configuration: "my-semantic-config".to_string(),
            scoring_profile: "my-scoring-profile".to_string(),
            scoring_parameter: "tags-bimberi, incident".to_string(),
            vector_field: "text_vector".to_string(),
            k_nearest_neighbors: 50,
            top: 5,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    search: &'a str,
    query_type: &'static str,
    semantic_configuration: &'a str,
    scoring_profile: &'a str,
    scoring_parameters: Vec<&'a str>,
    vector_queries: Vec<VectorizableTextQuery<'a>>,
    select: &'static str,
    top: usize,
}

/// Vector query the service vectorizes itself from the raw query text.
#[derive(Serialize, Debug)]
struct VectorizableTextQuery<'a> {
    kind: &'static str,
    text: &'a str,
    k: usize,
    fields: &'a str,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<Value>,
}

pub struct AzureSearchClient {
    http: HttpClient,
    search_url: Url,
    options: HybridQueryOptions,
}

impl AzureSearchClient {
    pub fn new(
        endpoint: &str,
        index_name: &str,
        api_version: &str,
        credential: SearchCredential,
        options: HybridQueryOptions
    ) -> Result<Self, SearchError> {
        let search_url = Self::search_url(endpoint, index_name, api_version)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        match &credential {
            SearchCredential::ApiKey(key) => {
                let value = HeaderValue::from_str(key).map_err(|e|
                    SearchError::Config(format!("Invalid search API key format: {}", e))
                )?;
                headers.insert("api-key", value);
            }
            SearchCredential::BearerToken(token) => {
                let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e|
                    SearchError::Config(format!("Invalid search bearer token format: {}", e))
                )?;
                headers.insert(AUTHORIZATION, value);
            }
        }

        let http = HttpClient::builder().default_headers(headers).build()?;

        Ok(Self { http, search_url, options })
    }

    fn search_url(endpoint: &str, index_name: &str, api_version: &str) -> Result<Url, SearchError> {
        let mut url = Url::parse(endpoint).map_err(|e|
            SearchError::Config(format!("Invalid search endpoint '{}': {}", endpoint, e))
        )?;
        url.path_segments_mut()
            .map_err(|_| SearchError::Config(format!("Search endpoint '{}' cannot be a base URL", endpoint)))?
            .pop_if_empty()
            .extend(&["indexes", index_name, "docs", "search"]);
        url.query_pairs_mut().clear().append_pair("api-version", api_version);
        Ok(url)
    }

    fn build_request<'a>(&'a self, query: &'a str) -> SearchRequest<'a> {
        SearchRequest {
            search: query,
            query_type: "semantic",
            semantic_configuration: &self.options.semantic_configuration,
            scoring_profile: &self.options.scoring_profile,
            scoring_parameters: vec![self.options.scoring_parameter.as_str()],
            vector_queries: vec![VectorizableTextQuery {
                kind: "text",
                text: query,
                k: self.options.k_nearest_neighbors,
                fields: &self.options.vector_field,
            }],
            select: SELECT_FIELDS,
            top: self.options.top,
        }
    }
}

#[async_trait]
impl Retriever for AzureSearchClient {
    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedDocument>, SearchError> {
        let req = self.build_request(query);
        debug!("Hybrid search on {} (top={}, k={})", self.search_url.path(), req.top, self.options.k_nearest_neighbors);

        let resp = self.http.post(self.search_url.clone()).json(&req).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!("Search service returned {}: {}", status, body);
            return Err(SearchError::Status { status: status.as_u16(), body });
        }

        let body = resp.json::<SearchResponse>().await?;
        Ok(body.value.iter().map(RetrievedDocument::from_hit).collect())
    }
}
