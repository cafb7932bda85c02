//! Checkout and order history.

use knotwork_core::models::{CheckoutRequest, Listing, Order};
use reqwest::Method;
use tracing::instrument;

use super::{BackendClient, BackendError};

impl BackendClient {
    /// Place an order. Guests check out without a token.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the order.
    #[instrument(
        skip(self, token, checkout),
        fields(items = checkout.items.len(), total = %checkout.total)
    )]
    pub async fn place_order(
        &self,
        token: Option<&str>,
        checkout: &CheckoutRequest,
    ) -> Result<Order, BackendError> {
        let request = self.request(Method::POST, "/orders", token).json(checkout);
        let order: Order = self.send(request).await?;
        tracing::info!(order = %order.reference(), "Order placed");
        Ok(order)
    }

    /// Orders placed by the signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is rejected or the request fails.
    #[instrument(skip(self, token))]
    pub async fn my_orders(&self, token: &str) -> Result<Vec<Order>, BackendError> {
        let listing: Listing<Order> = self.get("/orders/my-orders", Some(token)).await?;
        Ok(listing.into_page().items)
    }
}
