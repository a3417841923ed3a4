//! Newtype IDs for type-safe entity references.
//!
//! Use `define_str_id!` / `define_int_id!` to create type-safe ID wrappers
//! that prevent accidentally mixing identifiers from different entity types.
//! Platform-issued identifiers (companies, applications, users, promotions)
//! are opaque strings; catalog item UIDs and user-group UIDs are integers.

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe string-backed ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Display`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>` and `From<&str>` implementations
///
/// # Example
///
/// ```rust
/// # use velvet_rope_core::define_str_id;
/// define_str_id!(CompanyId);
/// define_str_id!(ApplicationId);
///
/// let company = CompanyId::new("8774");
/// let app = ApplicationId::new("64117c4a2a…");
///
/// // These are different types, so this won't compile:
/// // let _: CompanyId = app;
/// ```
#[macro_export]
macro_rules! define_str_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from anything string-like.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the underlying `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

/// Macro to define a type-safe integer-backed ID wrapper.
///
/// Same surface as [`define_str_id!`] but wrapping an `i64` with `Copy`.
#[macro_export]
macro_rules! define_int_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from an i64 value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying i64 value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Platform-issued string identifiers
define_str_id!(CompanyId);
define_str_id!(ApplicationId);
define_str_id!(OrderId);
define_str_id!(ShipmentId);
define_str_id!(MemberId);
define_str_id!(AttributeId);
define_str_id!(PromotionId);

// Integer identifiers
define_int_id!(ItemUid);
define_int_id!(GroupId);

/// A campaign identifier: a 6-digit integer generated at campaign creation.
///
/// The value is always in the `100_000..=999_999` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(i32);

impl CampaignId {
    /// Create a campaign ID from its integer value.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Get the underlying i32 value.
    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }

    /// Whether the value is a true 6-digit integer.
    #[must_use]
    pub const fn is_six_digits(&self) -> bool {
        self.0 >= 100_000 && self.0 <= 999_999
    }
}

impl std::fmt::Display for CampaignId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for CampaignId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl From<CampaignId> for i32 {
    fn from(id: CampaignId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_str_id_roundtrip() {
        let id = CompanyId::new("8774");
        assert_eq!(id.as_str(), "8774");
        assert_eq!(id.to_string(), "8774");
        assert_eq!(CompanyId::from("8774"), id);
    }

    #[test]
    fn test_str_id_serde_transparent() {
        let id = ApplicationId::new("app-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"app-1\"");
        let back: ApplicationId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_int_id_roundtrip() {
        let uid = ItemUid::new(7_502_119);
        assert_eq!(uid.as_i64(), 7_502_119);
        assert_eq!(i64::from(uid), 7_502_119);
    }

    #[test]
    fn test_campaign_id_six_digits() {
        assert!(CampaignId::new(100_000).is_six_digits());
        assert!(CampaignId::new(999_999).is_six_digits());
        assert!(!CampaignId::new(99_999).is_six_digits());
        assert!(!CampaignId::new(1_000_000).is_six_digits());
    }
}
