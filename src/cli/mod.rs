use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Search Service Args ---
    /// Search service endpoint (e.g., https://<service>.search.windows.net)
    #[arg(long, env = "SEARCH_ENDPOINT", default_value = "https://rag930.search.windows.net")]
    pub search_endpoint: String,

    /// Name of the search index queried for grounding documents.
    #[arg(long, env = "SEARCH_INDEX_NAME", default_value = "py-rag-tutorial-idx")]
    pub search_index_name: String,

    /// Admin or query API key for the search service. Takes precedence over the bearer token.
    #[arg(long, env = "SEARCH_API_KEY")]
    pub search_api_key: Option<String>,

    /// Pre-issued bearer token for identity-based search access. Used when no API key is set.
    #[arg(long, env = "SEARCH_BEARER_TOKEN")]
    pub search_bearer_token: Option<String>,

    /// REST API version sent with every search request.
    #[arg(long, env = "SEARCH_API_VERSION", default_value = "2024-07-01")]
    pub search_api_version: String,

    /// Semantic re-ranking configuration name.
    #[arg(long, env = "SEARCH_SEMANTIC_CONFIG", default_value = "my-semantic-config")]
    pub search_semantic_config: String,

    /// Scoring profile name.
    #[arg(long, env = "SEARCH_SCORING_PROFILE", default_value = "my-scoring-profile")]
    pub search_scoring_profile: String,

    /// Scoring parameter passed to the scoring profile (e.g., a tag filter value).
    #[arg(long, env = "SEARCH_SCORING_PARAMETER", default_value = "tags-bimberi, incident")]
    pub search_scoring_parameter: String,

    /// Vector field used for the nearest-neighbour part of the hybrid query.
    #[arg(long, env = "SEARCH_VECTOR_FIELD", default_value = "text_vector")]
    pub search_vector_field: String,

    /// Nearest neighbours requested from the vector index.
    #[arg(long, env = "SEARCH_KNN", default_value = "50")]
    pub search_knn: usize,

    /// Number of documents returned to the prompt.
    #[arg(long, env = "SEARCH_TOP", default_value = "5")]
    pub search_top: usize,

    // --- Chat LLM Provider Args ---
    /// Type of LLM provider for chat completion (groq, openai, ollama)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "groq")]
    pub chat_llm_type: String,

    /// Base URL for the Chat LLM provider API (e.g., https://api.groq.com)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let adapters handle defaults if None
    pub chat_base_url: Option<String>,

    /// API Key for the Chat LLM provider (e.g., Groq, OpenAI)
    #[arg(long, env = "CHAT_API_KEY", default_value = "")]
    pub chat_api_key: String,

    /// Model name for chat completion (e.g., llama3-8b-8192, gpt-4o-mini)
    #[arg(long, env = "CHAT_MODEL")] // No default, rely on adapter defaults if None
    pub chat_model: Option<String>,

    /// Sampling temperature for chat completion.
    #[arg(long, env = "CHAT_TEMPERATURE", default_value = "0.7")]
    pub chat_temperature: f32,

    // --- History Store Args ---
    /// History chat store type (memory, redis)
    #[arg(long, env = "HISTORY_TYPE", default_value = "memory")]
    pub history_type: String,

    /// History chat store host endpoint (e.g., redis://127.0.0.1:6379)
    #[arg(long, env = "HISTORY_HOST", default_value = "redis://127.0.0.1:6379")]
    pub history_host: String,

    /// Prefix for Redis history keys.
    #[arg(long, env = "HISTORY_REDIS_PREFIX", default_value = "history:")]
    pub history_redis_prefix: String,

    /// Idle lifetime of a session's history, in seconds. 0 means no expiry.
    #[arg(long, env = "HISTORY_TTL_SECS", default_value = "86400")]
    pub history_ttl_secs: u64,

    // --- Session Args ---
    /// Secret used to sign session cookies. A random secret is generated if empty.
    #[arg(long, env = "SESSION_SECRET", default_value = "")]
    pub session_secret: String,

    /// Name of the session cookie.
    #[arg(long, env = "COOKIE_NAME", default_value = "rag_session")]
    pub cookie_name: String,

    // --- General App Args ---
    /// Optional path to a JSON prompt file overriding the grounded answer template.
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<String>,

    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:5000")]
    pub server_addr: String,

    /// Optional path to the TLS certificate file (PEM format) for enabling HTTPS. Requires --tls-key.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format) for enabling HTTPS. Requires --tls-cert.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}
