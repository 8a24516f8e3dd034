//! Status enums for various entities.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a shopping cart.
///
/// A profile has at most one `Active` cart at a time. Checkout moves the cart
/// to `Completed`; carts are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.cart_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum CartStatus {
    /// The user's current, not-yet-checked-out cart.
    #[default]
    Active,
    /// Checked out by order placement.
    Completed,
    /// Left behind without checkout.
    Abandoned,
}

impl CartStatus {
    /// Returns the wire/database representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }
}

impl std::fmt::Display for CartStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CartStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "abandoned" => Ok(Self::Abandoned),
            _ => Err(format!("invalid cart status: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_status_default_is_active() {
        assert_eq!(CartStatus::default(), CartStatus::Active);
    }

    #[test]
    fn test_cart_status_display_matches_from_str() {
        for status in [
            CartStatus::Active,
            CartStatus::Completed,
            CartStatus::Abandoned,
        ] {
            assert_eq!(status.to_string().parse::<CartStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_cart_status_from_str_rejects_unknown() {
        assert!("checked_out".parse::<CartStatus>().is_err());
        assert!("ACTIVE".parse::<CartStatus>().is_err());
    }

    #[test]
    fn test_cart_status_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&CartStatus::Active).unwrap(),
            "\"active\""
        );
        let status: CartStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(status, CartStatus::Completed);
    }
}
