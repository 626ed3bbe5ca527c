use serde::{ Serialize, Deserialize };

/// One query/response exchange. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub query: String,
    pub response: String,
}

impl Turn {
    pub fn new(query: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            response: response.into(),
        }
    }
}

/// Body of `POST /query`. `query` stays optional so a missing field is reported
/// as a validation error instead of a deserialization failure.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: Option<String>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: Some(query.into()) }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query: String,
    pub response: String,
}
