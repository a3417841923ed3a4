//! Benefit title value type.
//!
//! A benefit (or "plan") is a named VIP perk a company can enable, e.g.
//! `CUSTOM_PROMOTIONS` or `PRODUCT_EXCLUSIVITY`. The title doubles as the key
//! for everything derived from the benefit: the remote user-attribute slug,
//! the user-group name, and the per-user grant entry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The benefit type whose campaigns never carry a discount promotion.
pub const PRODUCT_EXCLUSIVITY: &str = "PRODUCT_EXCLUSIVITY";

/// Error parsing a benefit title.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BenefitTitleError {
    /// The title was empty or whitespace-only.
    #[error("benefit title must not be empty")]
    Empty,
}

/// A validated benefit title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BenefitTitle(String);

impl BenefitTitle {
    /// Parse a benefit title, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`BenefitTitleError::Empty`] if nothing remains after trimming.
    pub fn parse(title: &str) -> Result<Self, BenefitTitleError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(BenefitTitleError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Get the title as stored.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The remote attribute slug for this benefit: the lower-cased title.
    ///
    /// Provisioning uses the slug to detect already-created attribute
    /// definitions, so it must be stable across invocations.
    #[must_use]
    pub fn slug(&self) -> String {
        self.0.to_lowercase()
    }

    /// A humanized display name: underscores become spaces, words title-cased.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.0
            .split('_')
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => {
                        first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                    }
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whether this benefit is the exclusivity-only type (no discount
    /// promotion is created for its campaigns).
    #[must_use]
    pub fn is_product_exclusivity(&self) -> bool {
        self.0 == PRODUCT_EXCLUSIVITY
    }
}

impl std::fmt::Display for BenefitTitle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for BenefitTitle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(BenefitTitle::parse(""), Err(BenefitTitleError::Empty));
        assert_eq!(BenefitTitle::parse("   "), Err(BenefitTitleError::Empty));
    }

    #[test]
    fn test_parse_trims() {
        let title = BenefitTitle::parse("  CUSTOM_PROMOTIONS ").unwrap();
        assert_eq!(title.as_str(), "CUSTOM_PROMOTIONS");
    }

    #[test]
    fn test_slug_is_lowercased_title() {
        let title = BenefitTitle::parse("CUSTOM_PROMOTIONS").unwrap();
        assert_eq!(title.slug(), "custom_promotions");
    }

    #[test]
    fn test_display_name_humanizes() {
        let title = BenefitTitle::parse("CUSTOM_PROMOTIONS").unwrap();
        assert_eq!(title.display_name(), "Custom Promotions");

        let title = BenefitTitle::parse("EARLY_ACCESS").unwrap();
        assert_eq!(title.display_name(), "Early Access");
    }

    #[test]
    fn test_product_exclusivity_detection() {
        let exclusive = BenefitTitle::parse("PRODUCT_EXCLUSIVITY").unwrap();
        assert!(exclusive.is_product_exclusivity());

        let promo = BenefitTitle::parse("CUSTOM_PROMOTIONS").unwrap();
        assert!(!promo.is_product_exclusivity());
    }
}
