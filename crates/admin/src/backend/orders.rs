//! Orders and dashboard aggregates.

use knotwork_core::models::{DashboardStats, Listing, Order, Page};
use knotwork_core::types::{OrderId, OrderStatus};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{AdminClient, BackendError, PAGE_SIZE, segment};

/// Filters for the order table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl AdminClient {
    /// One page of orders, optionally limited to a status.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self, token))]
    pub async fn list_orders(
        &self,
        token: &str,
        query: &OrderQuery,
    ) -> Result<Page<Order>, BackendError> {
        let request = self
            .request(Method::GET, "/orders", token)
            .query(query)
            .query(&[("limit", PAGE_SIZE)]);
        let listing: Listing<Order> = self.send(request).await?;
        Ok(listing.into_page())
    }

    /// # Errors
    ///
    /// Returns an error if the order is not found or the request fails.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn get_order(&self, token: &str, id: &OrderId) -> Result<Order, BackendError> {
        self.get(&format!("/orders/{}", segment(id.as_str())?), token).await
    }

    /// Move an order to another status.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the transition.
    #[instrument(skip(self, token), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(
        &self,
        token: &str,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, BackendError> {
        let request = self
            .request(Method::PATCH, &format!("/orders/{}/status", segment(id.as_str())?), token)
            .json(&serde_json::json!({ "status": status }));
        self.send(request).await
    }

    /// Headline numbers, revenue series and recent orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self, token))]
    pub async fn dashboard_stats(&self, token: &str) -> Result<DashboardStats, BackendError> {
        self.get("/admin/dashboard", token).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_query_from_form() {
        let query: OrderQuery = serde_json::from_str(r#"{"status":"shipped","page":2}"#).unwrap();
        assert_eq!(query.status, Some(OrderStatus::Shipped));
        assert_eq!(query.page, Some(2));
    }
}
