//! Session-related types.
//!
//! Types stored in the session for the cart and authentication state.

use std::fmt;

use serde::{Deserialize, Serialize};

use knotwork_core::models::AuthSession;
use knotwork_core::types::CustomerId;

/// Session-stored customer identity and backend bearer token.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentCustomer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    /// Bearer token issued by the backend.
    pub token: String,
}

impl fmt::Debug for CurrentCustomer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentCustomer")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl From<AuthSession> for CurrentCustomer {
    fn from(auth: AuthSession) -> Self {
        Self {
            id: auth.user.id,
            name: auth.user.name,
            email: auth.user.email,
            token: auth.token,
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for the shopping cart (`knotwork_core::Cart`).
    pub const CART: &str = "cart";

    /// Key for the signed-in customer and their bearer token.
    pub const CUSTOMER_TOKEN: &str = "customer_token";
}

#[cfg(test)]
mod tests {
    use knotwork_core::models::Customer;

    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let customer = CurrentCustomer::from(AuthSession {
            token: "secret-bearer".to_string(),
            user: Customer {
                id: CustomerId::new("c1"),
                name: "Ada".to_string(),
                email: "ada@rugs.example".to_string(),
                role: None,
            },
        });
        let debug = format!("{customer:?}");
        assert!(debug.contains("ada@rugs.example"));
        assert!(!debug.contains("secret-bearer"));
    }
}
