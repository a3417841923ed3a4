//! Database operations for the extension backend.
//!
//! One `PostgreSQL` database serves every company; each table carries a
//! `company_id` column. Document-shaped fields (benefit catalogs, ID maps,
//! per-user grants) live in JSONB columns and are decoded into typed models
//! at the repository boundary.
//!
//! ## Tables
//!
//! - `vip_configs` - per-company VIP configuration (one row per company)
//! - `campaigns` - promotional campaigns with per-application promotion IDs
//! - `vip_users` - enrolled members, additive benefit grants
//! - `analytics` - append-only promotion attribution rows
//! - `shipment_events` - per-webhook step ledger
//! - `platform_sessions` - platform auth sessions (written by the platform
//!   SDK, read-only here)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p velvet-rope-cli -- migrate
//! ```

pub mod analytics;
pub mod campaigns;
pub mod sessions;
pub mod shipment_events;
pub mod users;
pub mod vip_configs;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate campaign ID).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Wrap a JSON decode failure of a stored column.
    pub(crate) fn corrupt(context: &str, err: &serde_json::Error) -> Self {
        Self::DataCorruption(format!("{context}: {err}"))
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
