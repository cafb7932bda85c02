//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Backend reachability check
//!
//! # Catalog
//! GET  /products                  - Product listing
//!                                   (collection, search, sort, minPrice, maxPrice, page)
//! GET  /products/:slug            - Product detail (?variant= selects a color)
//! POST /products/:slug/reviews    - Post a review (requires customer)
//! GET  /collections               - Collection listing
//! GET  /collections/:slug         - Collection detail
//!
//! # Cart (HTMX fragments, triggers cart-updated)
//! GET  /cart                      - Cart page
//! POST /cart/add                  - Add a color/size to the cart
//! POST /cart/update               - Set a line quantity
//! POST /cart/increment            - Add one unit
//! POST /cart/decrement            - Remove one unit
//! POST /cart/remove               - Remove a line
//! GET  /cart/count                - Cart count badge
//!
//! # Checkout
//! GET  /checkout                  - Shipping details form
//! POST /checkout                  - Place the order
//!
//! # Content
//! GET  /blog                      - Blog index (?page=)
//! GET  /blog/:slug                - Blog post
//! GET  /portfolio                 - Portfolio gallery
//! GET  /videos                    - Video gallery
//!
//! # Inquiries (rate limited on POST)
//! GET  /bespoke                   - Bespoke rug form
//! POST /bespoke                   - Submit request (multipart, up to 5 images)
//! GET  /contact                   - Contact form
//! POST /contact                   - Send message
//! POST /newsletter                - Subscribe (HTMX fragment)
//!
//! # Account
//! GET  /account/login             - Login page
//! POST /account/login             - Login action (rate limited)
//! GET  /account/register          - Register page
//! POST /account/register          - Register action (rate limited)
//! POST /account/logout            - Logout action
//! GET  /account                   - Overview and order history (requires customer)
//! GET  /account/wishlist          - Wishlist (requires customer)
//! POST /account/wishlist          - Add to wishlist
//! POST /account/wishlist/:id/remove - Remove from wishlist
//! ```

pub mod account;
pub mod bespoke;
pub mod blog;
pub mod cart;
pub mod checkout;
pub mod collections;
pub mod contact;
pub mod gallery;
pub mod home;
pub mod newsletter;
pub mod products;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::middleware::form_rate_limiter;
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
        .route("/{slug}/reviews", post(products::create_review))
}

/// Create the collection routes router.
pub fn collection_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(collections::index))
        .route("/{slug}", get(collections::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/increment", post(cart::increment))
        .route("/decrement", post(cart::decrement))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route(
            "/login",
            get(account::login_page).merge(post(account::login).layer(form_rate_limiter())),
        )
        .route(
            "/register",
            get(account::register_page).merge(post(account::register).layer(form_rate_limiter())),
        )
        .route("/logout", post(account::logout))
        .route("/wishlist", get(account::wishlist).post(account::wishlist_add))
        .route("/wishlist/{product_id}/remove", post(account::wishlist_remove))
}

/// Create the inquiry routes router (bespoke, contact, newsletter).
pub fn inquiry_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/bespoke",
            get(bespoke::show).merge(
                post(bespoke::submit)
                    .layer::<_, std::convert::Infallible>(DefaultBodyLimit::max(bespoke::BODY_LIMIT))
                    .layer(form_rate_limiter()),
            ),
        )
        .route(
            "/contact",
            get(contact::show).merge(post(contact::submit).layer(form_rate_limiter())),
        )
        .route(
            "/newsletter",
            post(newsletter::subscribe).layer(form_rate_limiter()),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/collections", collection_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", get(checkout::show).post(checkout::place))
        .route("/blog", get(blog::index))
        .route("/blog/{slug}", get(blog::show))
        .route("/portfolio", get(gallery::portfolio))
        .route("/videos", get(gallery::videos))
        .merge(inquiry_routes())
        .nest("/account", account_routes())
}
