//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use couplequest_core::ports::{EmailLogService, IdeaGenerationService};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub idea_adapter: Arc<dyn IdeaGenerationService>,
    /// `None` when the service runs without a database.
    pub email_log: Option<Arc<dyn EmailLogService>>,
}
