//! Platform session accessor.
//!
//! The surrounding platform SDK refreshes auth sessions opportunistically and
//! stores them in `platform_sessions` keyed by volatile identifiers, with no
//! explicit "current session" pointer. The row with the maximum time-to-live
//! is the freshest one, so "latest by ttl" is the disambiguation heuristic.
//! This module only ever reads that table.

use serde::Deserialize;
use sqlx::{PgPool, Row};

use super::RepositoryError;

/// A platform auth session as stored by the platform SDK.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformSession {
    /// Bearer token for platform API calls.
    pub access_token: String,
    /// Refresh token, when the platform issued one.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Token lifetime in seconds, when recorded.
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Fetch the most recently stored platform session.
///
/// Selects the `platform_sessions` row with the maximum `ttl` and decodes its
/// JSONB value. Any operation that talks to the platform API needs this token
/// first, so both failure modes are fatal to the caller.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the table is empty, and
/// `RepositoryError::DataCorruption` if the stored value does not decode into
/// a session object.
pub async fn latest_session(pool: &PgPool) -> Result<PlatformSession, RepositoryError> {
    let row = sqlx::query("SELECT value FROM platform_sessions ORDER BY ttl DESC LIMIT 1")
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Err(RepositoryError::NotFound);
    };

    let value: serde_json::Value = row.try_get("value")?;
    serde_json::from_value(value).map_err(|e| RepositoryError::corrupt("platform session", &e))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_session_decodes_with_minimal_fields() {
        let value = serde_json::json!({ "access_token": "tok-123" });
        let session: PlatformSession = serde_json::from_value(value).unwrap();
        assert_eq!(session.access_token, "tok-123");
        assert!(session.refresh_token.is_none());
    }

    #[test]
    fn test_session_rejects_missing_token() {
        let value = serde_json::json!({ "refresh_token": "r" });
        assert!(serde_json::from_value::<PlatformSession>(value).is_err());
    }
}
