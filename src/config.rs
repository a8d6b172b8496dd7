use anyhow::Result;
use sea_orm::Database;
use std::sync::Arc;

use crate::schemas::{AppState, ServiceRegistry};
use services::currency::{DEFAULT_RATE_URL, FrankfurterClient};
use services::extractor::{CompletionClient, CompletionConfig};
use services::pricing::{MarketplaceClient, MarketplaceConfig};
use services::summary::SummaryGenerator;

/// Runtime configuration, read from the environment once at startup and
/// handed to each collaborator through its constructor.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: String,
    pub exchange_rate_url: String,
    pub completion: CompletionConfig,
    pub marketplace_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://cardfolio.db".to_string()),
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            exchange_rate_url: std::env::var("EXCHANGE_RATE_URL")
                .unwrap_or_else(|_| DEFAULT_RATE_URL.to_string()),
            completion: CompletionConfig {
                base_url: std::env::var("COMPLETION_API_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                api_key: std::env::var("COMPLETION_API_KEY").unwrap_or_default(),
                model: std::env::var("COMPLETION_MODEL")
                    .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            },
            marketplace_url: std::env::var("MARKETPLACE_URL")
                .unwrap_or_else(|_| "https://onepiece-cardgame.dev".to_string()),
        }
    }
}

/// Construct the production service clients from configuration.
pub fn build_services(config: &AppConfig) -> ServiceRegistry {
    ServiceRegistry {
        rates: Arc::new(FrankfurterClient::new(config.exchange_rate_url.clone())),
        extractor: Arc::new(CompletionClient::new(config.completion.clone())),
        prices: Arc::new(MarketplaceClient::new(MarketplaceConfig {
            base_url: config.marketplace_url.clone(),
        })),
        summarizer: Arc::new(SummaryGenerator::new(config.completion.clone())),
    }
}

/// Initialize application state: database connection plus service clients.
pub async fn initialize_app_state(config: &AppConfig) -> Result<AppState> {
    tracing::info!("Connecting to database: {}", config.database_url);
    let db = Database::connect(&config.database_url).await?;

    let services = Arc::new(build_services(config));

    Ok(AppState { db, services })
}
