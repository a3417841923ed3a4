//! Shipment event step ledger.
//!
//! Every processed webhook writes one row recording the outcome of each
//! pipeline step (classify, enroll, remote attribute, attribution). The
//! ledger is what makes local/remote divergence visible: a failed remote
//! step next to a succeeded local one is a reconciliation candidate.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use velvet_rope_core::{ApplicationId, CompanyId, OrderId, ShipmentId};

use super::RepositoryError;

/// Outcome status of a single pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Ok,
    Failed,
    Skipped,
}

/// One recorded pipeline step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step: String,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StepOutcome {
    #[must_use]
    pub fn ok(step: &str) -> Self {
        Self {
            step: step.to_owned(),
            status: StepStatus::Ok,
            detail: None,
        }
    }

    #[must_use]
    pub fn failed(step: &str, detail: impl Into<String>) -> Self {
        Self {
            step: step.to_owned(),
            status: StepStatus::Failed,
            detail: Some(detail.into()),
        }
    }

    #[must_use]
    pub fn skipped(step: &str, detail: impl Into<String>) -> Self {
        Self {
            step: step.to_owned(),
            status: StepStatus::Skipped,
            detail: Some(detail.into()),
        }
    }
}

/// Identifying context for a recorded event.
#[derive(Debug, Clone)]
pub struct EventRecord<'a> {
    pub company_id: &'a CompanyId,
    pub application_id: &'a ApplicationId,
    pub order_id: Option<&'a OrderId>,
    pub shipment_id: Option<&'a ShipmentId>,
    pub event_name: &'a str,
}

/// Append one event row with its step outcomes.
///
/// Returns the ledger row ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the write fails and
/// `RepositoryError::DataCorruption` if the steps do not serialize.
pub async fn record(
    pool: &PgPool,
    event: &EventRecord<'_>,
    steps: &[StepOutcome],
) -> Result<Uuid, RepositoryError> {
    let steps = serde_json::to_value(steps).map_err(|e| RepositoryError::corrupt("steps", &e))?;
    let id = Uuid::new_v4();

    sqlx::query(
        r"
        INSERT INTO shipment_events
            (id, company_id, application_id, order_id, shipment_id, event_name, steps)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ",
    )
    .bind(id)
    .bind(event.company_id.as_str())
    .bind(event.application_id.as_str())
    .bind(event.order_id.map(OrderId::as_str))
    .bind(event.shipment_id.map(ShipmentId::as_str))
    .bind(event.event_name)
    .bind(steps)
    .execute(pool)
    .await?;

    Ok(id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_step_outcome_serializes_snake_case() {
        let step = StepOutcome::failed("remote_attribute", "HTTP 502");
        let value = serde_json::to_value(&step).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["step"], "remote_attribute");
        assert_eq!(value["detail"], "HTTP 502");
    }

    #[test]
    fn test_ok_step_omits_detail() {
        let value = serde_json::to_value(StepOutcome::ok("classify")).unwrap();
        assert!(value.get("detail").is_none());
    }
}
