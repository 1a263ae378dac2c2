//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use couplequest_core::{
    domain::{IdeaRequest, UserIdentity},
    ports::EmailLogOutcome,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::{OpenApi, ToSchema};

pub const INVALID_REQUEST: &str = "Invalid request";
pub const GENERATION_FAILED: &str = "Failed to generate date idea";

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        generate_idea_handler,
        log_email_handler,
    ),
    components(
        schemas(ErrorResponse, LogEmailRequest, LogEmailResponse)
    ),
    tags(
        (name = "CoupleQuest API", description = "Date idea generation proxy and sign-in e-mail log.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The body returned when idea generation cannot be served.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    fn new(error: &str, details: Option<String>) -> Self {
        Self {
            error: error.to_string(),
            details,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogEmailRequest {
    pub action: Option<String>,
    pub email: Option<String>,
}

/// The envelope every `log-email` answer uses, success or not.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogEmailResponse {
    pub success: bool,
    pub message: String,
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
}

impl LogEmailResponse {
    fn reply(status: StatusCode, success: bool, message: impl Into<String>) -> Response {
        let body = Self {
            success,
            message: message.into(),
            data: None,
        };
        (status, Json(body)).into_response()
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Generate one date idea.
///
/// Takes the couple's profile with optional location context and the titles
/// of recent ideas to avoid, and returns a new idea stamped with an id.
#[utoipa::path(
    post,
    path = "/api/generate-date-idea",
    request_body(content = Object, description = "Profile, location context, recent titles and distance preference."),
    responses(
        (status = 200, description = "A new date idea", body = Object),
        (status = 400, description = "Missing interests or malformed body", body = ErrorResponse),
        (status = 500, description = "Upstream model failed or timed out", body = ErrorResponse)
    )
)]
pub async fn generate_idea_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<IdeaRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) if !request.profile.interests.trim().is_empty() => request,
        Ok(_) => {
            warn!("Rejected an idea request without interests.");
            return invalid_request();
        }
        Err(rejection) => {
            warn!(error = %rejection, "Rejected a malformed idea request.");
            return invalid_request();
        }
    };

    let timeout = app_state.config.upstream_timeout;
    let outcome = tokio::time::timeout(timeout, app_state.idea_adapter.generate(&request)).await;

    match outcome {
        Ok(Ok(idea)) => {
            info!(idea_id = %idea.id, title = %idea.title, "Served a date idea.");
            (StatusCode::OK, Json(idea)).into_response()
        }
        Ok(Err(e)) => {
            error!("Failed to generate date idea: {:?}", e);
            generation_failed(e.to_string())
        }
        Err(_) => {
            error!(timeout_secs = timeout.as_secs(), "Upstream model timed out.");
            generation_failed(format!(
                "Upstream request timed out after {} seconds",
                timeout.as_secs()
            ))
        }
    }
}

fn invalid_request() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(INVALID_REQUEST, None)),
    )
        .into_response()
}

fn generation_failed(details: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(GENERATION_FAILED, Some(details))),
    )
        .into_response()
}

/// Record a signed-in e-mail address.
///
/// Only the `log_email` action is supported. Duplicates are reported as a
/// success.
#[utoipa::path(
    post,
    path = "/api/log-email",
    request_body = LogEmailRequest,
    responses(
        (status = 200, description = "Outcome of the request", body = LogEmailResponse),
        (status = 503, description = "No database configured", body = LogEmailResponse)
    )
)]
pub async fn log_email_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<LogEmailRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = payload else {
        return LogEmailResponse::reply(StatusCode::OK, false, "Missing action parameter.");
    };
    let Some(action) = body.action else {
        return LogEmailResponse::reply(StatusCode::OK, false, "Missing action parameter.");
    };
    if action != "log_email" {
        return LogEmailResponse::reply(
            StatusCode::OK,
            false,
            format!("Unknown action: {}", action),
        );
    }

    let Some(email) = body.email.and_then(|e| UserIdentity::parse(&e).ok()) else {
        return LogEmailResponse::reply(
            StatusCode::OK,
            false,
            "Invalid or missing email parameter.",
        );
    };

    let Some(email_log) = app_state.email_log.as_ref() else {
        warn!("E-mail log requested but no database is configured.");
        return LogEmailResponse::reply(
            StatusCode::SERVICE_UNAVAILABLE,
            false,
            "Database connection error.",
        );
    };

    match email_log.log_email(email.as_str()).await {
        Ok(EmailLogOutcome::Inserted) => {
            LogEmailResponse::reply(StatusCode::OK, true, "Email logged successfully.")
        }
        Ok(EmailLogOutcome::AlreadyPresent) => {
            LogEmailResponse::reply(StatusCode::OK, true, "Email already exists in log.")
        }
        Err(e) => {
            error!("Failed to log email: {:?}", e);
            LogEmailResponse::reply(StatusCode::OK, false, "Failed to log email.")
        }
    }
}
