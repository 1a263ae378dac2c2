//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `EmailLogService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use couplequest_core::ports::{EmailLogOutcome, EmailLogService, PortError, PortResult};
use sqlx::PgPool;
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `EmailLogService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// `EmailLogService` Trait Implementation
//=========================================================================================

#[async_trait]
impl EmailLogService for DbAdapter {
    async fn log_email(&self, email: &str) -> PortResult<EmailLogOutcome> {
        let result = sqlx::query(
            "INSERT INTO email_log (email) VALUES ($1) ON CONFLICT (email) DO NOTHING",
        )
        .bind(email)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // A conflicting row leaves the table untouched.
        if result.rows_affected() > 0 {
            debug!("New address added to the e-mail log.");
            Ok(EmailLogOutcome::Inserted)
        } else {
            Ok(EmailLogOutcome::AlreadyPresent)
        }
    }
}
