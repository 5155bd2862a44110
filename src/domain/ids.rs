//! Strongly typed identifiers.
//!
//! Every entity is keyed by a UUID. Each kind gets its own newtype so a
//! `ProductId` can never be passed where a `MarketId` is expected. All of them
//! serialize as the bare hyphenated UUID string and are stored as TEXT.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            pub fn new() -> Self {
                $name(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                $name(id)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map($name)
            }
        }
    };
}

entity_id!(
    /// Identifier of a market.
    MarketId
);
entity_id!(
    /// Identifier of a surveyed product.
    ProductId
);
entity_id!(
    /// Identifier of a unit of measure.
    UnitId
);
entity_id!(
    /// Identifier of a user profile (administrator or manager).
    ProfileId
);
entity_id!(
    /// Identifier of a price round.
    RoundId
);
entity_id!(
    /// Identifier of a current-value price entry.
    PriceEntryId
);
entity_id!(
    /// Identifier of an immutable price history row.
    HistoryEntryId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrips_through_string() {
        let id = MarketId::new();
        let parsed = MarketId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_id_serializes_as_bare_string() {
        let uuid = Uuid::parse_str("6f1c2a4e-8d0b-4c3f-9a57-1b2c3d4e5f60").unwrap();
        let id = RoundId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"6f1c2a4e-8d0b-4c3f-9a57-1b2c3d4e5f60\"");
    }

    #[test]
    fn test_id_rejects_garbage() {
        assert!(ProductId::from_str("not-a-uuid").is_err());
    }
}
