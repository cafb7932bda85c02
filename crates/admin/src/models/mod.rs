//! Admin-local models.
//!
//! Entity records come from `knotwork_core::models`; this module only holds
//! what the back-office keeps in the staff member's session.

pub mod session;

pub use session::{CurrentAdmin, keys as session_keys};
