//! Customer accounts, authentication responses and wishlists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::catalog::ProductSummary;
use crate::types::{CustomerId, WishlistItemId};

/// A registered customer (or an admin, for the back-office login).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(alias = "_id")]
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Response of the login and register endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    #[serde(alias = "accessToken")]
    pub token: String,
    #[serde(alias = "admin")]
    pub user: Customer,
}

/// A product saved to a customer's wishlist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    #[serde(alias = "_id")]
    pub id: WishlistItemId,
    pub product: ProductSummary,
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_session_aliases() {
        let json = r#"{"accessToken":"tok",
            "admin":{"_id":"a1","name":"Ops","email":"ops@rugs.example","role":"admin"}}"#;
        let session: Option<AuthSession> = serde_json::from_str(json).ok();
        let session = session.as_ref();
        assert_eq!(session.map(|s| s.token.as_str()), Some("tok"));
        assert_eq!(session.and_then(|s| s.user.role.as_deref()), Some("admin"));
    }
}
