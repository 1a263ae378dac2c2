//! crates/couplequest_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific storage media, HTTP clients or LLM providers.

use async_trait::async_trait;

use crate::domain::{DateIdea, IdeaRequest, LocationCoords};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., storage, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid response from service: {0}")]
    InvalidResponse(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// A synchronous, string-keyed storage medium (browser local storage, a file, memory).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> PortResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> PortResult<()>;

    fn remove(&self, key: &str) -> PortResult<()>;
}

#[async_trait]
pub trait IdeaGenerationService: Send + Sync {
    /// Produces one new date idea for the given profile and context.
    async fn generate(&self, request: &IdeaRequest) -> PortResult<DateIdea>;
}

#[async_trait]
pub trait GeolocationService: Send + Sync {
    /// One-shot "get current position".
    async fn current_position(&self) -> PortResult<LocationCoords>;
}

/// Result of recording an address in the mailing log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailLogOutcome {
    Inserted,
    AlreadyPresent,
}

#[async_trait]
pub trait EmailLogService: Send + Sync {
    /// Records an e-mail address; duplicates are not an error.
    async fn log_email(&self, email: &str) -> PortResult<EmailLogOutcome>;
}
