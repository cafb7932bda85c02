//! Customer sign-in, registration and wishlist.

use knotwork_core::models::{AuthSession, Customer, Listing, WishlistItem};
use knotwork_core::types::ProductId;
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use super::{BackendClient, BackendError, segment};

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct Registration<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WishlistAdd<'a> {
    product_id: &'a ProductId,
}

impl BackendClient {
    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let request = self
            .request(Method::POST, "/auth/login", None)
            .json(&Credentials { email, password });
        self.send(request).await
    }

    /// Create a customer account and sign in.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the registration.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, BackendError> {
        let request = self
            .request(Method::POST, "/auth/register", None)
            .json(&Registration { name, email, password });
        self.send(request).await
    }

    /// The customer a token belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn me(&self, token: &str) -> Result<Customer, BackendError> {
        self.get("/auth/me", Some(token)).await
    }

    /// The signed-in customer's wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is rejected or the request fails.
    #[instrument(skip(self, token))]
    pub async fn wishlist(&self, token: &str) -> Result<Vec<WishlistItem>, BackendError> {
        let listing: Listing<WishlistItem> = self.get("/wishlist", Some(token)).await?;
        Ok(listing.into_page().items)
    }

    /// Save a product to the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the request.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn add_to_wishlist(
        &self,
        token: &str,
        product_id: &ProductId,
    ) -> Result<(), BackendError> {
        let request = self
            .request(Method::POST, "/wishlist", Some(token))
            .json(&WishlistAdd { product_id });
        self.send_empty(request).await
    }

    /// Remove a product from the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the request.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn remove_from_wishlist(
        &self,
        token: &str,
        product_id: &ProductId,
    ) -> Result<(), BackendError> {
        let path = format!("/wishlist/{}", segment(product_id.as_str())?);
        let request = self.request(Method::DELETE, &path, Some(token));
        self.send_empty(request).await
    }
}
