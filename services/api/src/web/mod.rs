pub mod rest;
pub mod state;

pub use rest::{generate_idea_handler, log_email_handler, ApiDoc};
pub use state::AppState;

use crate::config::ConfigError;
use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::post,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// How long browsers may cache a preflight answer.
const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(86_400);

/// Builds the CORS policy for the single allowed front-end origin.
pub fn cors_layer(allowed_origin: &str) -> Result<CorsLayer, ConfigError> {
    let origin = allowed_origin.parse::<HeaderValue>().map_err(|e| {
        ConfigError::InvalidValue("ALLOWED_ORIGIN".to_string(), e.to_string())
    })?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(PREFLIGHT_MAX_AGE))
}

/// Creates the complete application router, Swagger UI included.
pub fn router(app_state: Arc<AppState>) -> Result<Router, ConfigError> {
    let cors = cors_layer(&app_state.config.allowed_origin)?;

    let api_router = Router::new()
        .route("/api/generate-date-idea", post(generate_idea_handler))
        .route("/api/log-email", post(log_email_handler))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http()))
}
