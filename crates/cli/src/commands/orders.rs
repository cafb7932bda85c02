//! Order listing.

use knotwork_admin::backend::{AdminClient, OrderQuery};
use knotwork_core::types::OrderStatus;
use secrecy::{ExposeSecret, SecretString};

use super::CliError;

/// Log one page of orders.
///
/// # Errors
///
/// Returns an error if the backend request fails.
pub async fn list(
    client: &AdminClient,
    token: &SecretString,
    status: Option<OrderStatus>,
    page: u32,
) -> Result<(), CliError> {
    let query = OrderQuery {
        status,
        page: Some(page.max(1)),
    };
    let orders = client.list_orders(token.expose_secret(), &query).await?;

    if orders.items.is_empty() {
        tracing::info!("No orders found");
        return Ok(());
    }

    for order in &orders.items {
        tracing::info!(
            reference = order.reference(),
            status = order.status.label(),
            payment = order.payment_status.label(),
            items = order.item_count(),
            total = %order.total.display(),
            customer = %order.customer.email,
            "Order"
        );
    }
    tracing::info!(
        "Page {} of {} ({} orders)",
        orders.page,
        orders.total_pages.max(1),
        orders.total
    );
    Ok(())
}
