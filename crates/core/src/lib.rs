//! Knotwork Core - Shared types library.
//!
//! This crate provides common types used across all Knotwork components:
//! - `storefront` - Public rug shop (catalog, cart, checkout, blog, bespoke orders)
//! - `admin` - Back-office for catalog, content, orders and newsletter
//! - `cli` - Command-line tools for bulk imports and order lookups
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients. Every entity is owned by the external backend and mirrored here
//! as a plain record; the shopping cart is the one model this codebase owns.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses
//! - [`models`] - Records mirrored from backend API responses
//! - [`cart`] - Session-persisted shopping cart keyed by product, size and color
//! - [`validation`] - Form-level schema checks run before any backend call
//! - [`error_message`] - Maps backend failures to user-facing messages

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod error_message;
pub mod models;
pub mod types;
pub mod validation;

pub use cart::{Cart, CartItem, CartKey, NewCartItem};
pub use error_message::{RequestFailure, error_message};
pub use types::*;
pub use validation::{FieldErrors, UploadMeta};
