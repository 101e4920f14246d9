//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by the REST API.
//! `ChatService` is generic over its store and gateway traits, but AppState
//! pins it to the concrete infra implementations.

use std::sync::Arc;

use anyhow::Context;
use secrecy::SecretString;

use parley_core::chat::service::{ChatService, TurnSettings};
use parley_infra::config::{load_global_config, resolve_data_dir};
use parley_infra::llm::openai_compat::{OpenAiCompatConfig, OpenAiCompatibleGateway};
use parley_infra::sqlite::chat::SqliteChatRepository;
use parley_infra::sqlite::pool::DatabasePool;
use parley_infra::sqlite::user::SqliteUserRepository;

/// Concrete type alias for the chat service pinned to infra implementations.
pub type ConcreteChatService = ChatService<SqliteChatRepository, OpenAiCompatibleGateway>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub user_repo: Arc<SqliteUserRepository>,
}

impl AppState {
    /// Initialize the application state: connect to DB, load config,
    /// wire the completion gateway and chat service.
    ///
    /// Requires `OPENAI_API_KEY` in the environment. `OPENAI_BASE_URL`
    /// optionally points the gateway at any OpenAI-compatible endpoint.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let db_url = format!("sqlite://{}?mode=rwc", data_dir.join("parley.db").display());
        let db_pool = DatabasePool::new(&db_url).await?;

        let config = load_global_config(&data_dir).await;

        let api_key: SecretString = std::env::var("OPENAI_API_KEY")
            .context("OPENAI_API_KEY must be set")?
            .into();
        let mut gateway_config = OpenAiCompatConfig::openai(api_key);
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            gateway_config.base_url = base_url;
        }
        let gateway = OpenAiCompatibleGateway::new(gateway_config);

        let chat_repo = SqliteChatRepository::new(db_pool.clone());
        let chat_service =
            ChatService::new(chat_repo, gateway, TurnSettings::from_config(&config));

        let user_repo = SqliteUserRepository::new(db_pool);

        Ok(Self {
            chat_service: Arc::new(chat_service),
            user_repo: Arc::new(user_repo),
        })
    }
}
