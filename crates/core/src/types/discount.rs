//! Discount kind for campaign promotions.

use serde::{Deserialize, Serialize};

/// How a campaign's discount is expressed.
///
/// Serialized in lowercase to match the platform promotion API
/// (`"percentage"` / `"amount"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// Percentage off the qualifying items, value carried as a string
    /// (e.g. `"20"`).
    Percentage,
    /// Fixed amount off, value carried as a string.
    Amount,
}

impl DiscountKind {
    /// Wire name used in promotion payloads.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Amount => "amount",
        }
    }
}

impl std::fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&DiscountKind::Percentage).unwrap(),
            "\"percentage\""
        );
        let kind: DiscountKind = serde_json::from_str("\"amount\"").unwrap();
        assert_eq!(kind, DiscountKind::Amount);
    }
}
