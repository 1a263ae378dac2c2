//! crates/couplequest_client/src/adapters/http_idea.rs
//!
//! This module contains the HTTP adapter for the idea proxy.
//! It implements the `IdeaGenerationService` port by posting the request to
//! the `generate-date-idea` endpoint.

use async_trait::async_trait;
use couplequest_core::{
    domain::{DateIdea, IdeaRequest},
    ports::{IdeaGenerationService, PortError, PortResult},
};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ClientError;

#[derive(Clone)]
pub struct HttpIdeaClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpIdeaClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

fn request_error(e: reqwest::Error) -> PortError {
    if e.is_timeout() {
        PortError::Timeout(e.to_string())
    } else {
        PortError::Unavailable(e.to_string())
    }
}

#[async_trait]
impl IdeaGenerationService for HttpIdeaClient {
    async fn generate(&self, request: &IdeaRequest) -> PortResult<DateIdea> {
        debug!(endpoint = %self.endpoint, "Requesting a date idea.");

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        let body = response.text().await.map_err(request_error)?;

        if !status.is_success() {
            warn!(%status, "Idea endpoint answered with an error.");
            return Err(PortError::Unavailable(format!("HTTP {}: {}", status, body)));
        }

        DateIdea::from_json(&body).map_err(|e| PortError::InvalidResponse(e.to_string()))
    }
}
