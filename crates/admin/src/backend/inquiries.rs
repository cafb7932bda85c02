//! Newsletter subscribers, bespoke requests and contact messages.

use knotwork_core::models::{BespokeRequest, ContactMessage, Listing, Subscriber};
use knotwork_core::types::{BespokeId, BespokeStatus, ContactId, SubscriberId};
use reqwest::Method;
use tracing::instrument;

use super::{AdminClient, BackendError, segment};

impl AdminClient {
    // =========================================================================
    // Newsletter Methods
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self, token))]
    pub async fn list_subscribers(&self, token: &str) -> Result<Vec<Subscriber>, BackendError> {
        let listing: Listing<Subscriber> = self.get("/newsletter/subscribers", token).await?;
        Ok(listing.into_page().items)
    }

    /// # Errors
    ///
    /// Returns an error if the backend refuses the deletion.
    #[instrument(skip(self, token), fields(subscriber_id = %id))]
    pub async fn delete_subscriber(
        &self,
        token: &str,
        id: &SubscriberId,
    ) -> Result<(), BackendError> {
        self.delete(&format!("/newsletter/subscribers/{}", segment(id.as_str())?), token).await
    }

    // =========================================================================
    // Bespoke Methods
    // =========================================================================

    /// Bespoke requests, newest first as returned by the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self, token))]
    pub async fn list_bespoke(&self, token: &str) -> Result<Vec<BespokeRequest>, BackendError> {
        let listing: Listing<BespokeRequest> = self.get("/bespoke", token).await?;
        Ok(listing.into_page().items)
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the transition.
    #[instrument(skip(self, token), fields(bespoke_id = %id, status = status.as_str()))]
    pub async fn update_bespoke_status(
        &self,
        token: &str,
        id: &BespokeId,
        status: BespokeStatus,
    ) -> Result<BespokeRequest, BackendError> {
        let request = self
            .request(Method::PATCH, &format!("/bespoke/{}/status", segment(id.as_str())?), token)
            .json(&serde_json::json!({ "status": status }));
        self.send(request).await
    }

    // =========================================================================
    // Contact Methods
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self, token))]
    pub async fn list_contacts(&self, token: &str) -> Result<Vec<ContactMessage>, BackendError> {
        let listing: Listing<ContactMessage> = self.get("/contact", token).await?;
        Ok(listing.into_page().items)
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the change.
    #[instrument(skip(self, token), fields(contact_id = %id))]
    pub async fn mark_contact_read(&self, token: &str, id: &ContactId) -> Result<(), BackendError> {
        let path = format!("/contact/{}/read", segment(id.as_str())?);
        let request = self.request(Method::PATCH, &path, token);
        self.send_empty(request).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend refuses the deletion.
    #[instrument(skip(self, token), fields(contact_id = %id))]
    pub async fn delete_contact(&self, token: &str, id: &ContactId) -> Result<(), BackendError> {
        self.delete(&format!("/contact/{}", segment(id.as_str())?), token).await
    }
}
