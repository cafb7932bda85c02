//! Order route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use knotwork_core::models::Order;
use knotwork_core::types::{OrderId, OrderStatus};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::OrderQuery;
use crate::error::Result;
use crate::filters;
use crate::middleware::auth::RequireAdminAuth;
use crate::state::AppState;

use super::dashboard::AdminUserView;
use super::forms::{NoticeTemplate, OptionView, action_failed, set_flash, take_flash};

/// Raw list filters; browsers submit `status=` for "all".
#[derive(Debug, Default, Deserialize)]
pub struct OrdersParams {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
}

impl OrdersParams {
    /// Unknown statuses fall back to no filter.
    #[must_use]
    pub fn to_query(&self) -> OrderQuery {
        OrderQuery {
            status: self.status.as_deref().and_then(|s| s.parse().ok()),
            page: self.page.filter(|p| *p > 1),
        }
    }
}

fn page_url(status: Option<OrderStatus>, page: u32) -> String {
    match status {
        Some(status) => format!("/orders?status={status}&page={page}"),
        None => format!("/orders?page={page}"),
    }
}

/// Order table row.
#[derive(Debug, Clone)]
pub struct OrderRowView {
    pub id: String,
    pub reference: String,
    pub customer_name: String,
    pub customer_email: String,
    pub created_at: String,
    pub item_count: u32,
    pub total: String,
    pub status: String,
    pub status_class: String,
    pub payment_status: String,
}

impl From<&Order> for OrderRowView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            reference: order.reference().to_string(),
            customer_name: order.customer.name.clone(),
            customer_email: order.customer.email.clone(),
            created_at: order
                .created_at
                .map(|d| d.format("%b %-d, %Y %H:%M").to_string())
                .unwrap_or_default(),
            item_count: order.item_count(),
            total: order.total.display(),
            status: order.status.label().to_string(),
            status_class: order.status.badge_class().to_string(),
            payment_status: order.payment_status.label().to_string(),
        }
    }
}

/// Order line on the detail page.
#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub name: String,
    pub variant: String,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
    pub image: Option<String>,
}

/// Orders list template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub orders: Vec<OrderRowView>,
    pub status_options: Vec<OptionView>,
    pub total: u64,
    pub current_page: u32,
    pub total_pages: u32,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub order: OrderRowView,
    pub phone: String,
    pub shipping_address: String,
    pub notes: String,
    pub lines: Vec<OrderLineView>,
    pub subtotal: String,
    pub shipping: String,
    pub status_options: Vec<OptionView>,
}

/// GET /orders
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<OrdersParams>,
) -> Result<OrdersIndexTemplate> {
    let query = params.to_query();
    let page = state.backend().list_orders(&admin.token, &query).await?;

    let current = query.status.map(|s| s.as_str()).unwrap_or_default();
    let status_options = std::iter::once(OptionView::new("", "All orders", current))
        .chain(
            OrderStatus::ALL
                .iter()
                .map(|s| OptionView::new(s.as_str(), s.label(), current)),
        )
        .collect();

    Ok(OrdersIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/orders".to_string(),
        flash: take_flash(&session).await,
        orders: page.items.iter().map(OrderRowView::from).collect(),
        status_options,
        total: page.total,
        current_page: page.page,
        total_pages: page.total_pages,
        prev_url: page.has_previous().then(|| page_url(query.status, page.page - 1)),
        next_url: page.has_next().then(|| page_url(query.status, page.page + 1)),
    })
}

/// GET /orders/{id}
#[instrument(skip(admin, state, session))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<OrderShowTemplate> {
    let order = state.backend().get_order(&admin.token, &OrderId::new(id)).await?;
    let current = order.status.as_str();

    Ok(OrderShowTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/orders".to_string(),
        flash: take_flash(&session).await,
        phone: order.customer.phone.clone().unwrap_or_default(),
        shipping_address: order
            .shipping_address
            .as_ref()
            .map(knotwork_core::models::Address::one_line)
            .unwrap_or_default(),
        notes: order.notes.clone().unwrap_or_default(),
        lines: order
            .lines
            .iter()
            .map(|line| OrderLineView {
                name: line.name.clone(),
                variant: [line.color.as_str(), line.size_label.as_str()]
                    .into_iter()
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(" / "),
                quantity: line.quantity,
                price: line.price.display(),
                line_total: line.line_total().display(),
                image: line.image.clone(),
            })
            .collect(),
        subtotal: order.subtotal.display(),
        shipping: order.shipping.display(),
        status_options: OrderStatus::ALL
            .iter()
            .map(|s| OptionView::new(s.as_str(), s.label(), current))
            .collect(),
        order: OrderRowView::from(&order),
    })
}

/// Status change form.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// POST /orders/{id}/status
#[instrument(skip(admin, state, session, form))]
pub async fn update_status(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Response {
    let back_url = format!("/orders/{id}");
    let Ok(status) = form.status.parse::<OrderStatus>() else {
        let page = NoticeTemplate {
            admin_user: AdminUserView::from(&admin),
            current_path: "/orders".to_string(),
            message: "Choose a valid order status.".to_string(),
            back_url,
            signed_out: false,
        };
        return (StatusCode::UNPROCESSABLE_ENTITY, page).into_response();
    };

    let id = OrderId::new(id);
    match state.backend().update_order_status(&admin.token, &id, status).await {
        Ok(order) => {
            tracing::info!(order_id = %id, status = %order.status, "Order status updated");
            set_flash(&session, &format!("Order marked {}.", order.status.label())).await;
            Redirect::to(&back_url).into_response()
        }
        Err(e) => action_failed(&admin, &session, &e, &back_url).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_status_means_all() {
        let params = OrdersParams {
            status: Some(String::new()),
            page: Some(1),
        };
        assert_eq!(params.to_query(), OrderQuery::default());
    }

    #[test]
    fn test_status_filter_parsed() {
        let params = OrdersParams {
            status: Some("shipped".to_string()),
            page: Some(3),
        };
        let query = params.to_query();
        assert_eq!(query.status, Some(OrderStatus::Shipped));
        assert_eq!(query.page, Some(3));
    }

    #[test]
    fn test_page_url() {
        assert_eq!(page_url(Some(OrderStatus::Pending), 2), "/orders?status=pending&page=2");
        assert_eq!(page_url(None, 4), "/orders?page=4");
    }
}
