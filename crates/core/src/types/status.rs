//! Status enums for various entities.
//!
//! Wire values are the lower-case strings the backend uses. Unknown values
//! deserialize into an `Other` variant where the backend is known to grow new
//! states, so a new status never breaks a listing page.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// All statuses in workflow order, for filter dropdowns.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Wire value of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Tailwind badge classes used by both storefront and admin tables.
    #[must_use]
    pub const fn badge_class(&self) -> &'static str {
        match self {
            Self::Pending => "bg-yellow-100 text-yellow-800",
            Self::Processing => "bg-blue-100 text-blue-800",
            Self::Shipped => "bg-indigo-100 text-indigo-800",
            Self::Delivered => "bg-green-100 text-green-800",
            Self::Cancelled => "bg-gray-100 text-gray-700",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// Payment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Awaiting payment",
            Self::Paid => "Paid",
            Self::Failed => "Failed",
            Self::Refunded => "Refunded",
        }
    }
}

/// Publication status of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Active,
    Draft,
    Archived,
}

impl ProductStatus {
    /// All statuses, for form dropdowns.
    pub const ALL: [Self; 3] = [Self::Active, Self::Draft, Self::Archived];

    /// Wire value of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Draft => "draft",
            Self::Archived => "archived",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Draft => "Draft",
            Self::Archived => "Archived",
        }
    }

    /// Tailwind badge classes.
    #[must_use]
    pub const fn badge_class(&self) -> &'static str {
        match self {
            Self::Active => "bg-green-100 text-green-700",
            Self::Draft => "bg-yellow-100 text-yellow-700",
            Self::Archived => "bg-gray-100 text-gray-700",
        }
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid product status: {s}"))
    }
}

/// Workflow status of a bespoke (custom rug) request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BespokeStatus {
    #[default]
    New,
    InReview,
    Quoted,
    Closed,
}

impl BespokeStatus {
    /// All statuses in workflow order.
    pub const ALL: [Self; 4] = [Self::New, Self::InReview, Self::Quoted, Self::Closed];

    /// Wire value of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InReview => "in_review",
            Self::Quoted => "quoted",
            Self::Closed => "closed",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::InReview => "In review",
            Self::Quoted => "Quoted",
            Self::Closed => "Closed",
        }
    }
}

impl std::str::FromStr for BespokeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid bespoke status: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_roundtrip() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_bespoke_status_wire_format() {
        let json = serde_json::to_string(&BespokeStatus::InReview).unwrap_or_default();
        assert_eq!(json, "\"in_review\"");
    }
}
