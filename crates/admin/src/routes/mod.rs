//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//! GET  /health/ready                - Backend reachability check
//!
//! # Auth
//! GET  /login                       - Login page (?expired=true after a 401)
//! POST /login                       - Sign in with backend staff credentials
//! POST /logout                      - Sign out
//!
//! # Dashboard
//! GET  /                            - Stat cards, revenue chart, recent orders
//!
//! # Catalog (multipart forms)
//! GET  /products                    - Product table (?search=&status=&page=)
//! GET  /products/new                - New product form
//! POST /products                    - Create product
//! GET  /products/:id/edit           - Edit product form
//! POST /products/:id                - Update product
//! POST /products/:id/delete         - Delete product
//! GET  /products/upload             - Spreadsheet import form
//! POST /products/upload             - Import an .xlsx file
//! GET  /collections                 - Collection table
//! GET  /collections/new, POST /collections, GET /collections/:id/edit,
//! POST /collections/:id, POST /collections/:id/delete
//!
//! # Content
//! /blogs, /portfolios (multipart) and /videos (urlencoded) follow the same
//! list/new/create/edit/update/delete layout as collections.
//!
//! # Orders
//! GET  /orders                      - Order table (?status=&page=)
//! GET  /orders/:id                  - Order detail
//! POST /orders/:id/status           - Change status
//!
//! # Inquiries
//! GET  /newsletter                  - Subscribers
//! POST /newsletter/:id/delete       - Remove subscriber
//! GET  /bespoke                     - Bespoke requests (?status=)
//! POST /bespoke/:id/status          - Change request status
//! GET  /messages                    - Contact inbox
//! POST /messages/:id/read           - Mark read
//! POST /messages/:id/delete         - Delete message
//! ```

pub mod auth;
pub mod bespoke;
pub mod blogs;
pub mod collections;
pub mod dashboard;
pub mod forms;
pub mod messages;
pub mod newsletter;
pub mod orders;
pub mod portfolios;
pub mod products;
pub mod videos;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::state::AppState;

/// Request body cap for multipart forms: ten 5 MB images plus fields.
pub const UPLOAD_BODY_LIMIT: usize = 55 * 1024 * 1024;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/new", get(products::new))
        .route("/upload", get(products::upload_page).post(products::upload))
        .route("/{id}", post(products::update))
        .route("/{id}/edit", get(products::edit))
        .route("/{id}/delete", post(products::delete))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

/// Create the collection routes router.
pub fn collection_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(collections::index).post(collections::create))
        .route("/new", get(collections::new))
        .route("/{id}", post(collections::update))
        .route("/{id}/edit", get(collections::edit))
        .route("/{id}/delete", post(collections::delete))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

/// Create the blog routes router.
pub fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(blogs::index).post(blogs::create))
        .route("/new", get(blogs::new))
        .route("/{id}", post(blogs::update))
        .route("/{id}/edit", get(blogs::edit))
        .route("/{id}/delete", post(blogs::delete))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

/// Create the portfolio routes router.
pub fn portfolio_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(portfolios::index).post(portfolios::create))
        .route("/new", get(portfolios::new))
        .route("/{id}", post(portfolios::update))
        .route("/{id}/edit", get(portfolios::edit))
        .route("/{id}/delete", post(portfolios::delete))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

/// Create the video routes router.
pub fn video_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(videos::index).post(videos::create))
        .route("/new", get(videos::new))
        .route("/{id}", post(videos::update))
        .route("/{id}/edit", get(videos::edit))
        .route("/{id}/delete", post(videos::delete))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", post(orders::update_status))
}

/// Create the inquiry routes router (newsletter, bespoke, messages).
pub fn inquiry_routes() -> Router<AppState> {
    Router::new()
        .route("/newsletter", get(newsletter::index))
        .route("/newsletter/{id}/delete", post(newsletter::delete))
        .route("/bespoke", get(bespoke::index))
        .route("/bespoke/{id}/status", post(bespoke::update_status))
        .route("/messages", get(messages::index))
        .route("/messages/{id}/read", post(messages::mark_read))
        .route("/messages/{id}/delete", post(messages::delete))
}

/// Create all routes for admin.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::dashboard))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .nest("/products", product_routes())
        .nest("/collections", collection_routes())
        .nest("/blogs", blog_routes())
        .nest("/portfolios", portfolio_routes())
        .nest("/videos", video_routes())
        .nest("/orders", order_routes())
        .merge(inquiry_routes())
}
