//! Store-assigned cart identifier.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a cart, assigned by the backing store.
///
/// Opaque to the storefront: both the `PostgreSQL` schema and the hosted
/// platform key carts by UUID, and the resolver only compares and forwards it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type), sqlx(transparent))]
#[serde(transparent)]
pub struct CartId(Uuid);

impl CartId {
    /// Generate a fresh random ID, for stores that assign IDs client-side.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for CartId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for CartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for CartId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = "5b0c7d9e-3f1a-4c2b-9d8e-7a6b5c4d3e2f";

    #[test]
    fn test_cart_id_parse_and_display() {
        let id: CartId = SAMPLE.parse().unwrap();
        assert_eq!(id.to_string(), SAMPLE);
        assert_eq!(id.as_uuid().to_string(), SAMPLE);
        assert!("42".parse::<CartId>().is_err());
    }

    #[test]
    fn test_cart_id_serializes_as_string() {
        let id: CartId = SAMPLE.parse().unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), format!("\"{SAMPLE}\""));

        let parsed: CartId = serde_json::from_str(&format!("\"{SAMPLE}\"")).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(CartId::generate(), CartId::generate());
    }
}
