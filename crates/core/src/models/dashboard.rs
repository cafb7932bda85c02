//! Back-office dashboard aggregates. All numbers are computed by the backend.

use serde::{Deserialize, Serialize};

use crate::models::order::Order;
use crate::types::Price;

/// Revenue for one period of the dashboard chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenuePoint {
    /// Period label as sent by the backend: `YYYY-MM-DD` or `YYYY-MM`.
    #[serde(alias = "_id", alias = "label")]
    pub date: String,
    #[serde(alias = "total")]
    pub revenue: Price,
    #[serde(default)]
    pub orders: u32,
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default)]
    pub total_revenue: Price,
    #[serde(default)]
    pub total_orders: u64,
    #[serde(default)]
    pub total_products: u64,
    #[serde(default)]
    pub total_customers: u64,
    #[serde(default)]
    pub total_subscribers: u64,
    #[serde(default)]
    pub pending_bespoke: u64,
    #[serde(default)]
    pub revenue_series: Vec<RevenuePoint>,
    #[serde(default)]
    pub recent_orders: Vec<Order>,
}
