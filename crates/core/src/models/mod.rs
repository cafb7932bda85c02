//! Records mirrored from backend API responses.
//!
//! The backend owns every one of these entities. Field names follow the
//! backend's camelCase JSON and `_id` is accepted wherever `id` is expected.
//! Most fields default when absent so older records still deserialize.

pub mod account;
pub mod catalog;
pub mod content;
pub mod dashboard;
pub mod inquiry;
pub mod order;

pub use account::{AuthSession, Customer, WishlistItem};
pub use catalog::{
    Collection, CollectionRef, Product, ProductImage, ProductSummary, Review, Size, Variant,
};
pub use content::{Blog, PortfolioItem, Video};
pub use dashboard::{DashboardStats, RevenuePoint};
pub use inquiry::{BespokeRequest, ContactMessage, Subscriber};
pub use order::{Address, CheckoutRequest, Order, OrderCustomer, OrderLine};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A page of results from a list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new", alias = "data", alias = "results")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "first_page", alias = "pages")]
    pub total_pages: u32,
}

const fn first_page() -> u32 {
    1
}

impl<T> Page<T> {
    /// A single page holding every item.
    #[must_use]
    pub fn single(items: Vec<T>) -> Self {
        Self {
            total: items.len() as u64,
            items,
            page: 1,
            total_pages: 1,
        }
    }

    /// True if a later page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// True if an earlier page exists.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::single(Vec::new())
    }
}

/// Body of a list endpoint: either a bare array or a [`Page`].
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Items(Vec<T>),
    Page(Page<T>),
}

impl<T> Listing<T> {
    #[must_use]
    pub fn into_page(self) -> Page<T> {
        match self {
            Self::Items(items) => Page::single(items),
            Self::Page(page) => page,
        }
    }
}

impl<T> From<Listing<T>> for Page<T> {
    fn from(listing: Listing<T>) -> Self {
        listing.into_page()
    }
}

/// Strip a `{"data": {...}}` envelope around a single record.
///
/// Arrays under `data` are left alone so paged bodies keep their totals.
#[must_use]
pub fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.get("data").is_some_and(Value::is_object) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_accepts_data_alias() {
        let page: Page<String> =
            serde_json::from_str(r#"{"data":["a","b"],"total":12,"page":2,"pages":3}"#)
                .unwrap_or_default();
        assert_eq!(page.items, vec!["a".to_string(), "b".to_string()]);
        assert!(page.has_next());
        assert!(page.has_previous());
    }

    #[test]
    fn test_listing_accepts_bare_array() {
        let listing: Option<Listing<u32>> = serde_json::from_str("[1, 2, 3]").ok();
        let page = listing.map(Listing::into_page).unwrap_or_default();
        assert_eq!(page.items, vec![1, 2, 3]);
        assert_eq!(page.total, 3);
        assert!(!page.has_next());
    }

    #[test]
    fn test_unwrap_envelope() {
        let wrapped = serde_json::json!({"success": true, "data": {"name": "Heriz"}});
        assert_eq!(unwrap_envelope(wrapped), serde_json::json!({"name": "Heriz"}));

        let paged = serde_json::json!({"data": [1, 2], "total": 2});
        assert_eq!(unwrap_envelope(paged.clone()), paged);
    }
}
