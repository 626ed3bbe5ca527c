pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod llm;
pub mod models;
pub mod search;
pub mod server;
pub mod session;

use agent::ChatAgent;
use cli::Args;
use history::initialize_history_store;
use llm::chat::new_client as new_chat_client;
use llm::LlmConfig;
use log::info;
use search::initialize_retriever;
use server::api::AppState;
use server::Server;
use session::SessionManager;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Search Endpoint: {}", args.search_endpoint);
    info!("Search Index: {}", args.search_index_name);
    info!("Semantic Config: {}", args.search_semantic_config);
    info!("Scoring Profile: {}", args.search_scoring_profile);
    info!("Vector Field: {} (k={}, top={})", args.search_vector_field, args.search_knn, args.search_top);
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("Chat Temperature: {}", args.chat_temperature);
    info!("History Store Type: {}", args.history_type);
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("built-in"));
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let retriever = initialize_retriever(&args)?;

    let chat_config = LlmConfig {
        llm_type: args.chat_llm_type.parse()?,
        base_url: args.chat_base_url.clone(),
        api_key: Some(args.chat_api_key.clone()).filter(|k| !k.is_empty()),
        completion_model: args.chat_model.clone(),
        temperature: args.chat_temperature,
    };
    let generator = new_chat_client(&chat_config)?;

    let history_store = initialize_history_store(&args)?;
    let prompt_config = config::prompt::load_prompts(args.prompts_path.as_deref())?;

    let agent = Arc::new(ChatAgent::new(retriever, generator, history_store, prompt_config));
    let sessions = Arc::new(SessionManager::new(&args.session_secret, &args.cookie_name, args.enable_tls)?);

    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, AppState { agent, sessions }, args);
    server.run().await?;

    Ok(())
}
