//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use chrono::NaiveDate;
use knotwork_core::models::{DashboardStats, Order, RevenuePoint};
use knotwork_core::types::BespokeStatus;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::auth::RequireAdminAuth;
use crate::models::CurrentAdmin;
use crate::state::AppState;

use super::forms::take_flash;

/// Signed-in admin shown in the layout header.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub email: String,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            name: admin.name.clone(),
            email: admin.email.clone(),
        }
    }
}

/// Headline numbers.
#[derive(Debug, Clone)]
pub struct DashboardMetrics {
    pub total_revenue: String,
    pub total_orders: u64,
    pub total_products: u64,
    pub total_customers: u64,
    pub total_subscribers: u64,
    pub pending_bespoke: u64,
    pub unread_messages: usize,
}

/// One bar of the revenue chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevenueRowView {
    pub label: String,
    pub revenue: String,
    pub orders: u32,
    /// Bar length as a percentage of the period maximum.
    pub width: u32,
}

/// Recent order row.
#[derive(Debug, Clone)]
pub struct RecentOrderView {
    pub id: String,
    pub reference: String,
    pub customer_name: String,
    pub total: String,
    pub status: String,
    pub status_class: String,
}

impl From<&Order> for RecentOrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            reference: order.reference().to_string(),
            customer_name: order.customer.name.clone(),
            total: order.total.display(),
            status: order.status.label().to_string(),
            status_class: order.status.badge_class().to_string(),
        }
    }
}

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub alert: Option<String>,
    pub metrics: DashboardMetrics,
    pub revenue_rows: Vec<RevenueRowView>,
    pub recent_orders: Vec<RecentOrderView>,
}

/// Chart label for a revenue period.
///
/// `YYYY-MM-DD` becomes `Jan 5`, `YYYY-MM` becomes `Jan 2025`; anything else
/// is returned unchanged.
#[must_use]
pub fn format_revenue_label(label: &str) -> String {
    if let Ok(date) = NaiveDate::parse_from_str(label, "%Y-%m-%d") {
        return date.format("%b %-d").to_string();
    }
    if label.len() == 7
        && let Ok(date) = NaiveDate::parse_from_str(&format!("{label}-01"), "%Y-%m-%d")
    {
        return date.format("%b %Y").to_string();
    }
    label.to_string()
}

/// Chart rows with bar widths relative to the largest period.
#[must_use]
pub fn revenue_rows(series: &[RevenuePoint]) -> Vec<RevenueRowView> {
    let max = series
        .iter()
        .map(|point| point.revenue.as_f64())
        .fold(0.0_f64, f64::max);

    series
        .iter()
        .map(|point| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let width = if max > 0.0 {
                (point.revenue.as_f64() / max * 100.0).round().clamp(0.0, 100.0) as u32
            } else {
                0
            };
            RevenueRowView {
                label: format_revenue_label(&point.date),
                revenue: point.revenue.display(),
                orders: point.orders,
                width,
            }
        })
        .collect()
}

/// Dashboard page handler.
#[instrument(skip(admin, state, session))]
pub async fn dashboard(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<DashboardTemplate> {
    let backend = state.backend();
    let (stats_result, contacts_result, bespoke_result) = tokio::join!(
        backend.dashboard_stats(&admin.token),
        backend.list_contacts(&admin.token),
        backend.list_bespoke(&admin.token),
    );

    let mut alert = None;
    let stats = match stats_result {
        Ok(stats) => stats,
        Err(e) if e.is_unauthorized() => return Err(AppError::Backend(e)),
        Err(e) => {
            tracing::error!("Failed to fetch dashboard stats: {e}");
            alert = Some(e.user_message());
            DashboardStats::default()
        }
    };

    let unread_messages = contacts_result
        .map(|messages| messages.iter().filter(|m| !m.read).count())
        .unwrap_or_else(|e| {
            tracing::error!("Failed to fetch contact messages: {e}");
            0
        });

    // Prefer a live count; the stats figure may lag behind.
    let pending_bespoke = bespoke_result
        .map(|requests| {
            requests
                .iter()
                .filter(|r| r.status == BespokeStatus::New)
                .count() as u64
        })
        .unwrap_or(stats.pending_bespoke);

    Ok(DashboardTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/".to_string(),
        flash: take_flash(&session).await,
        alert,
        metrics: DashboardMetrics {
            total_revenue: stats.total_revenue.display(),
            total_orders: stats.total_orders,
            total_products: stats.total_products,
            total_customers: stats.total_customers,
            total_subscribers: stats.total_subscribers,
            pending_bespoke,
            unread_messages,
        },
        revenue_rows: revenue_rows(&stats.revenue_series),
        recent_orders: stats.recent_orders.iter().take(5).map(RecentOrderView::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use knotwork_core::types::Price;

    use super::*;

    #[test]
    fn test_format_revenue_label_day() {
        assert_eq!(format_revenue_label("2025-01-05"), "Jan 5");
        assert_eq!(format_revenue_label("2024-12-31"), "Dec 31");
    }

    #[test]
    fn test_format_revenue_label_month() {
        assert_eq!(format_revenue_label("2025-01"), "Jan 2025");
        assert_eq!(format_revenue_label("2024-11"), "Nov 2024");
    }

    #[test]
    fn test_format_revenue_label_passthrough() {
        assert_eq!(format_revenue_label("Week 3"), "Week 3");
        assert_eq!(format_revenue_label("2025-13"), "2025-13");
        assert_eq!(format_revenue_label(""), "");
    }

    #[test]
    fn test_revenue_rows_relative_widths() {
        let point = |date: &str, cents| RevenuePoint {
            date: date.to_string(),
            revenue: Price::from_cents(cents),
            orders: 1,
        };
        let rows = revenue_rows(&[
            point("2025-01", 50_000),
            point("2025-02", 200_000),
            point("2025-03", 0),
        ]);
        let widths: Vec<u32> = rows.iter().map(|r| r.width).collect();
        assert_eq!(widths, vec![25, 100, 0]);
        assert_eq!(rows.first().map(|r| r.label.as_str()), Some("Jan 2025"));
        assert_eq!(rows.get(1).map(|r| r.revenue.as_str()), Some("$2,000.00"));
    }

    #[test]
    fn test_revenue_rows_all_zero() {
        let rows = revenue_rows(&[RevenuePoint {
            date: "2025-01-01".to_string(),
            revenue: Price::ZERO,
            orders: 0,
        }]);
        assert_eq!(rows.first().map(|r| r.width), Some(0));
    }
}
