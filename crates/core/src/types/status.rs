//! Status enums for orders and products.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a string is not a recognized status value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid status: {0}")]
pub struct InvalidStatus(pub String);

/// Order progression status.
///
/// Normal progression is `placed → pending → processing → shipped →
/// in_transit → delivered`, with `cancelled` as a terminal side exit.
/// The enum itself does not police transitions; see
/// [`OrderStatus::can_transition_to`] for the declared table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Placed,
    Pending,
    Processing,
    Shipped,
    InTransit,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Every status, in normal progression order with `Cancelled` last.
    pub const ALL: [Self; 7] = [
        Self::Placed,
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::InTransit,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Wire name of the status (`in_transit`, not `InTransit`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Placed => "placed",
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether no further progression is expected from this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Statuses that may legally follow this one in the declared table.
    ///
    /// Forward moves skip ahead freely (an order can go from `placed`
    /// straight to `shipped`), `cancelled` is reachable from every
    /// non-terminal status, and terminal statuses have no successors.
    #[must_use]
    pub fn successors(self) -> Vec<Self> {
        if self.is_terminal() {
            return Vec::new();
        }
        Self::ALL
            .into_iter()
            .filter(|next| *next == Self::Cancelled || *next > self)
            .collect()
    }

    /// Check a move against the declared transition table.
    ///
    /// Re-applying the current status is always allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self == next || self.successors().contains(&next)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidStatus(s.to_owned()))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for OrderStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for OrderStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(s.parse()?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for OrderStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

/// Catalog visibility requested by the admin bulk product update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    /// Visible and purchasable in the public catalog.
    Active,
    /// Hidden from the catalog; orders against it are rejected.
    Inactive,
}

impl ProductStatus {
    /// The `is_active` flag this status maps to.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl FromStr for ProductStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(InvalidStatus(s.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_wire_name() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!(
            "in_transit".parse::<OrderStatus>().unwrap(),
            OrderStatus::InTransit
        );
    }

    #[test]
    fn test_parse_rejects_unknown_and_case_variants() {
        assert!("refunded".parse::<OrderStatus>().is_err());
        assert!("Shipped".parse::<OrderStatus>().is_err());
        assert!("".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&OrderStatus::InTransit).unwrap();
        assert_eq!(json, "\"in_transit\"");
        assert!(serde_json::from_str::<OrderStatus>("\"lost\"").is_err());
    }

    #[test]
    fn test_default_is_placed() {
        assert_eq!(OrderStatus::default(), OrderStatus::Placed);
    }

    #[test]
    fn test_transition_table() {
        use OrderStatus::*;

        assert!(Placed.can_transition_to(Pending));
        assert!(Placed.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(InTransit.can_transition_to(Cancelled));
        assert!(Processing.can_transition_to(Processing));

        assert!(!Delivered.can_transition_to(Pending));
        assert!(!Shipped.can_transition_to(Processing));
        assert!(!Cancelled.can_transition_to(Placed));
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(Delivered.successors().is_empty());
    }

    #[test]
    fn test_product_status() {
        assert!("active".parse::<ProductStatus>().unwrap().is_active());
        assert!(!"inactive".parse::<ProductStatus>().unwrap().is_active());
        assert!("archived".parse::<ProductStatus>().is_err());
    }
}
