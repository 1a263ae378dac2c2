//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, OpenAiIdeaAdapter},
    config::Config,
    error::ApiError,
    web::{router, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use couplequest_core::ports::EmailLogService;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations (optional) ---
    let email_log: Option<Arc<dyn EmailLogService>> = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let db_adapter = Arc::new(DbAdapter::new(db_pool));
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            Some(db_adapter)
        }
        None => {
            warn!("DATABASE_URL is not set. The e-mail log is disabled.");
            None
        }
    };

    // --- 3. Initialize the Upstream Model Adapter ---
    let llm = config.llm_settings()?;
    let mut openai_config = OpenAIConfig::new().with_api_key(llm.api_key);
    if let Some(api_base) = llm.api_base {
        info!("Using upstream model endpoint {}", api_base);
        openai_config = openai_config.with_api_base(api_base);
    }
    let openai_client = Client::with_config(openai_config);
    let idea_adapter = Arc::new(OpenAiIdeaAdapter::new(
        openai_client,
        config.idea_model.clone(),
    ));

    // --- 4. Build the Shared AppState and Router ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        idea_adapter,
        email_log,
    });
    let app = router(app_state)?;

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
