//! Strongly-typed identifiers for domain entities.
//!
//! These prevent mixing up IDs from different contexts, e.g. passing a
//! position id where an order id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier from a string.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Generate a new unique identifier using UUID v4.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Get the inner string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if the identifier is empty or whitespace.
            #[must_use]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }

            /// Consume and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

define_id!(OrderId, "Unique identifier for a simulated order.");
define_id!(TradeId, "Unique identifier for a single fill persisted as a trade.");
define_id!(PositionId, "Unique identifier for a position (open or closed).");
define_id!(SessionId, "Opaque identifier scoping a run of trading activity.");
define_id!(Symbol, "Tradeable instrument symbol (e.g. `BTCUSDT`).");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_id_new_and_display() {
        let id = OrderId::new("ord-123");
        assert_eq!(id.as_str(), "ord-123");
        assert_eq!(format!("{id}"), "ord-123");
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(OrderId::generate(), OrderId::generate());
        assert_ne!(PositionId::generate(), PositionId::generate());
    }

    #[test]
    fn symbol_from_str_and_string() {
        let a: Symbol = "BTCUSDT".into();
        let b: Symbol = String::from("BTCUSDT").into();
        assert_eq!(a, b);
    }

    #[test]
    fn blank_detection() {
        assert!(Symbol::new("").is_blank());
        assert!(Symbol::new("   ").is_blank());
        assert!(!Symbol::new("ETHUSDT").is_blank());
    }

    #[test]
    fn session_id_into_inner() {
        let id = SessionId::new("sess-1");
        assert_eq!(id.into_inner(), "sess-1");
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = OrderId::new("ord-9");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"ord-9\"");
    }
}
