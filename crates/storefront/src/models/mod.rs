//! Storefront-local models.
//!
//! Entity records come from `knotwork_core::models`; this module only holds
//! what the storefront keeps in the visitor's session.

pub mod session;

pub use session::{CurrentCustomer, keys as session_keys};
