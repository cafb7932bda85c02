//! Session-related types for admin authentication.

use std::fmt;

use serde::{Deserialize, Serialize};

use knotwork_core::models::AuthSession;
use knotwork_core::types::AdminUserId;

/// Session-stored admin identity and backend bearer token.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub id: AdminUserId,
    pub email: String,
    pub name: String,
    /// Role reported by the backend (`admin` for staff accounts).
    pub role: Option<String>,
    /// Bearer token issued by the backend (HIGH PRIVILEGE).
    pub token: String,
}

impl fmt::Debug for CurrentAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentAdmin")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl From<AuthSession> for CurrentAdmin {
    fn from(auth: AuthSession) -> Self {
        Self {
            id: AdminUserId::new(auth.user.id.into_inner()),
            email: auth.user.email,
            name: auth.user.name,
            role: auth.user.role,
            token: auth.token,
        }
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for the signed-in admin and their bearer token.
    pub const CURRENT_ADMIN: &str = "current_admin";
}

#[cfg(test)]
mod tests {
    use knotwork_core::models::Customer;
    use knotwork_core::types::CustomerId;

    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let admin = CurrentAdmin::from(AuthSession {
            token: "root-bearer".to_string(),
            user: Customer {
                id: CustomerId::new("a1"),
                name: "Ops".to_string(),
                email: "ops@knotwork.rugs".to_string(),
                role: Some("admin".to_string()),
            },
        });
        let debug = format!("{admin:?}");
        assert!(debug.contains("ops@knotwork.rugs"));
        assert!(!debug.contains("root-bearer"));
        assert_eq!(admin.id.as_str(), "a1");
    }
}
