//! Cart route handlers.
//!
//! The cart lives in the visitor's session. Every handler loads it, applies
//! its mutation and stores it back once; the session layer persists the
//! record when the response is sent. Prices, names and images are looked up
//! from the catalog on add, never taken from the form.
//!
//! Mutations answer HTMX requests with fragments and an `HX-Trigger:
//! cart-updated` header; plain form posts are redirected to `/cart`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
};
use knotwork_core::cart::{Cart, CartItem, CartKey, MAX_LINE_QUANTITY, NewCartItem};
use knotwork_core::models::Product;
use knotwork_core::types::{Price, SizeId, VariantId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::config::ShippingConfig;
use crate::error::Result;
use crate::filters;
use crate::models::session_keys;
use crate::state::AppState;

/// HTMX event fired after any cart mutation.
const CART_UPDATED: (&str, &str) = ("HX-Trigger", "cart-updated");

// =============================================================================
// Views
// =============================================================================

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub key: String,
    pub slug: String,
    pub name: String,
    pub color: String,
    pub size_label: String,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
    pub image: Option<String>,
    pub at_max: bool,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
    pub free_shipping_hint: Option<String>,
}

impl CartView {
    /// Build the view, recomputing totals from the lines.
    #[must_use]
    pub fn new(cart: &Cart, shipping: &ShippingConfig) -> Self {
        let subtotal = cart.subtotal();
        let shipping_charge = shipping.charge_for(subtotal);

        let free_shipping_hint = shipping
            .free_threshold
            .filter(|threshold| !subtotal.is_zero() && subtotal < *threshold)
            .map(|threshold| {
                let remaining = Price::new(threshold.amount() - subtotal.amount());
                format!("Add {} more for free shipping.", remaining.display())
            });

        Self {
            items: cart
                .items()
                .iter()
                .map(|item| CartItemView {
                    key: item.id.to_string(),
                    slug: item.slug.clone(),
                    name: item.name.clone(),
                    color: item.color.clone(),
                    size_label: item.size_label.clone(),
                    quantity: item.quantity,
                    price: item.price.display(),
                    line_total: item.line_total().display(),
                    image: item.image.clone(),
                    at_max: item.quantity >= MAX_LINE_QUANTITY,
                })
                .collect(),
            item_count: cart.item_count(),
            subtotal: subtotal.display(),
            shipping: shipping_charge.display(),
            total: (subtotal + shipping_charge).display(),
            free_shipping_hint,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Load the cart from the session; a missing or unreadable cart is empty.
pub async fn load_cart(session: &Session) -> Cart {
    session
        .get::<Cart>(session_keys::CART)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Store the cart in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save_cart(
    session: &Session,
    cart: &Cart,
) -> std::result::Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}

/// Remove the cart from the session (after checkout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_cart(
    session: &Session,
) -> std::result::Result<(), tower_sessions::session::Error> {
    session.remove::<Cart>(session_keys::CART).await?;
    Ok(())
}

fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// Stock the catalog holds for a line's size. A size that is gone has none.
fn line_stock(product: &Product, item: &CartItem) -> u32 {
    product
        .variant(&item.variant_id)
        .and_then(|variant| variant.size(&item.size_id))
        .map_or(0, |size| size.stock)
}

/// Current stock behind the line at `key`, or `None` if the cart has no such line.
async fn stock_for(state: &AppState, cart: &Cart, key: &CartKey) -> Result<Option<u32>> {
    let Some(item) = cart.get(key) else {
        return Ok(None);
    };
    let lookup = if item.slug.is_empty() {
        item.product_id.as_str()
    } else {
        item.slug.as_str()
    };
    match state.backend().get_product(lookup).await {
        Ok(product) => Ok(Some(line_stock(&product, item))),
        Err(err) if err.is_not_found() => Ok(Some(0)),
        Err(err) => Err(err.into()),
    }
}

/// Requested line quantity, limited to what is in stock.
fn clamp_to_stock(requested: u32, stock: Option<u32>) -> u32 {
    stock.map_or(requested, |stock| requested.min(stock))
}

/// Message shown after an add; says so when the line limit held the quantity back.
fn added_message(name: &str, requested: u32, added: u32) -> String {
    if added < requested {
        format!("Added {added} {name} to your cart. A line holds at most {MAX_LINE_QUANTITY}.")
    } else {
        format!("Added {name} to your cart.")
    }
}

// =============================================================================
// Forms & Templates
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub slug: String,
    pub variant_id: String,
    pub size_id: String,
    pub quantity: Option<u32>,
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub key: String,
    pub quantity: u32,
}

/// Form data naming a single line.
#[derive(Debug, Deserialize)]
pub struct LineForm {
    pub key: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Inline message next to the add-to-cart button.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_message.html")]
pub struct CartMessageTemplate {
    pub message: String,
    pub is_error: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let cart = load_cart(&session).await;
    CartShowTemplate {
        cart: CartView::new(&cart, &state.config().shipping),
    }
}

/// Add item to cart.
///
/// The product is re-read from the catalog so price and stock come from the
/// backend. Adding a product+size+color already in the cart raises its
/// quantity.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let htmx = is_htmx(&headers);
    let reject = |message: &str| {
        if htmx {
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                CartMessageTemplate {
                    message: message.to_string(),
                    is_error: true,
                },
            )
                .into_response()
        } else {
            (StatusCode::UNPROCESSABLE_ENTITY, Html(message.to_string())).into_response()
        }
    };

    let product = state.backend().get_product(&form.slug).await?;
    let variant_id = VariantId::new(form.variant_id);
    let size_id = SizeId::new(form.size_id);

    let Some(variant) = product.variant(&variant_id) else {
        return Ok(reject("Please choose a color."));
    };
    let Some(size) = variant.size(&size_id) else {
        return Ok(reject("Please choose a size."));
    };
    if !size.in_stock() {
        return Ok(reject("This size is out of stock."));
    }

    let mut cart = load_cart(&session).await;
    let key = CartKey::new(&product.id, &size.id, &variant.color);
    let in_cart = cart.get(&key).map_or(0, |line| line.quantity);
    let requested = form.quantity.unwrap_or(1).max(1);
    if in_cart >= MAX_LINE_QUANTITY {
        return Ok(reject(&format!(
            "You already have the maximum of {MAX_LINE_QUANTITY} in your cart."
        )));
    }
    let quantity = requested.min(size.stock.saturating_sub(in_cart));
    if quantity == 0 {
        return Ok(reject(&format!("Only {} of this size available.", size.stock)));
    }

    let image = variant
        .images
        .first()
        .or_else(|| product.featured_image())
        .map(|img| img.url.clone());

    let total = cart.add(NewCartItem {
        product_id: product.id.clone(),
        variant_id: variant.id.clone(),
        size_id: size.id.clone(),
        color: variant.color.clone(),
        price: size.price,
        quantity,
        image,
        name: product.name.clone(),
        size_label: size.label.clone(),
        slug: product.handle().to_string(),
    });
    save_cart(&session, &cart).await?;
    let added = total.map_or(0, |total| total.saturating_sub(in_cart));

    tracing::info!(product = %product.id, size = %size.id, added, "Added to cart");

    if !htmx {
        return Ok(Redirect::to("/cart").into_response());
    }
    Ok((
        AppendHeaders([CART_UPDATED]),
        CartMessageTemplate {
            message: added_message(&product.name, quantity, added),
            is_error: false,
        },
    )
        .into_response())
}

/// Apply a mutation to the stored cart and answer with the refreshed lines.
async fn mutate(
    state: &AppState,
    session: &Session,
    headers: &HeaderMap,
    mut cart: Cart,
    change: impl FnOnce(&mut Cart),
) -> Result<Response> {
    change(&mut cart);
    save_cart(session, &cart).await?;

    if !is_htmx(headers) {
        return Ok(Redirect::to("/cart").into_response());
    }
    Ok((
        AppendHeaders([CART_UPDATED]),
        CartItemsTemplate {
            cart: CartView::new(&cart, &state.config().shipping),
        },
    )
        .into_response())
}

/// Set a line's quantity; zero removes the line.
///
/// The quantity is held to the size's current stock, so a sold-out size
/// drops out of the cart.
#[instrument(skip(state, session, headers))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let key = CartKey::from_raw(form.key);
    let cart = load_cart(&session).await;
    let stock = stock_for(&state, &cart, &key).await?;
    let quantity = clamp_to_stock(form.quantity, stock);
    mutate(&state, &session, &headers, cart, |cart| {
        cart.set_quantity(&key, quantity);
    })
    .await
}

/// Add one unit to a line, unless the size has no more stock.
#[instrument(skip(state, session, headers))]
pub async fn increment(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<LineForm>,
) -> Result<Response> {
    let key = CartKey::from_raw(form.key);
    let cart = load_cart(&session).await;
    let stock = stock_for(&state, &cart, &key).await?;
    let current = cart.get(&key).map_or(0, |line| line.quantity);
    let quantity = clamp_to_stock(current.saturating_add(1), stock);
    mutate(&state, &session, &headers, cart, |cart| {
        if quantity > current {
            cart.increment(&key);
        }
    })
    .await
}

/// Remove one unit from a line; the last unit removes the line.
#[instrument(skip(state, session, headers))]
pub async fn decrement(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<LineForm>,
) -> Result<Response> {
    let key = CartKey::from_raw(form.key);
    let cart = load_cart(&session).await;
    mutate(&state, &session, &headers, cart, |cart| {
        cart.decrement(&key);
    })
    .await
}

/// Remove a line.
#[instrument(skip(state, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<LineForm>,
) -> Result<Response> {
    let key = CartKey::from_raw(form.key);
    let cart = load_cart(&session).await;
    mutate(&state, &session, &headers, cart, |cart| {
        cart.remove(&key);
    })
    .await
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> impl IntoResponse {
    CartCountTemplate {
        count: load_cart(&session).await.item_count(),
    }
}

#[cfg(test)]
mod tests {
    use knotwork_core::models::{Size, Variant};
    use knotwork_core::types::ProductId;

    use super::*;

    fn cart_with(price_cents: i64, quantity: u32) -> Cart {
        let mut cart = Cart::new();
        cart.add(NewCartItem {
            product_id: ProductId::new("p1"),
            variant_id: VariantId::new("v1"),
            size_id: SizeId::new("s1"),
            color: "Rust".to_string(),
            price: Price::from_cents(price_cents),
            quantity,
            image: None,
            name: "Kilim".to_string(),
            size_label: "4x6".to_string(),
            slug: "kilim".to_string(),
        });
        cart
    }

    #[test]
    fn test_view_totals_include_shipping() {
        let shipping = ShippingConfig {
            flat_rate: Price::from_cents(2_000),
            free_threshold: Some(Price::from_cents(100_000)),
        };
        let view = CartView::new(&cart_with(30_000, 2), &shipping);

        assert_eq!(view.item_count, 2);
        assert_eq!(view.subtotal, "$600.00");
        assert_eq!(view.shipping, "$20.00");
        assert_eq!(view.total, "$620.00");
        assert_eq!(
            view.free_shipping_hint.as_deref(),
            Some("Add $400.00 more for free shipping.")
        );
    }

    #[test]
    fn test_view_free_shipping_over_threshold() {
        let shipping = ShippingConfig {
            flat_rate: Price::from_cents(2_000),
            free_threshold: Some(Price::from_cents(50_000)),
        };
        let view = CartView::new(&cart_with(60_000, 1), &shipping);
        assert_eq!(view.shipping, "$0.00");
        assert_eq!(view.total, "$600.00");
        assert!(view.free_shipping_hint.is_none());
    }

    #[test]
    fn test_line_stock_follows_catalog() {
        let cart = cart_with(30_000, 1);
        let item = &cart.items()[0];
        let mut product = Product {
            id: ProductId::new("p1"),
            variants: vec![Variant {
                id: VariantId::new("v1"),
                color: "Rust".to_string(),
                images: Vec::new(),
                sizes: vec![Size {
                    id: SizeId::new("s1"),
                    label: "4x6".to_string(),
                    price: Price::from_cents(30_000),
                    stock: 2,
                }],
            }],
            ..Product::default()
        };
        assert_eq!(line_stock(&product, item), 2);

        product.variants[0].sizes.clear();
        assert_eq!(line_stock(&product, item), 0);
    }

    #[test]
    fn test_update_and_increment_stop_at_stock() {
        assert_eq!(clamp_to_stock(5, Some(2)), 2);
        assert_eq!(clamp_to_stock(1, Some(2)), 1);
        assert_eq!(clamp_to_stock(3, Some(0)), 0);
        assert_eq!(clamp_to_stock(3, None), 3);

        let mut cart = cart_with(30_000, 2);
        let key = cart.items()[0].id.clone();
        let quantity = clamp_to_stock(9, Some(2));
        cart.set_quantity(&key, quantity);
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(clamp_to_stock(3, Some(2)), 2, "a line at stock cannot grow");
    }

    #[test]
    fn test_added_message_reports_line_limit() {
        assert_eq!(added_message("Kilim", 2, 2), "Added Kilim to your cart.");
        assert_eq!(
            added_message("Kilim", 5, 1),
            "Added 1 Kilim to your cart. A line holds at most 99."
        );

        let mut cart = cart_with(100, 98);
        let before = cart.items()[0].quantity;
        let total = cart.add(NewCartItem {
            product_id: ProductId::new("p1"),
            variant_id: VariantId::new("v1"),
            size_id: SizeId::new("s1"),
            color: "Rust".to_string(),
            price: Price::from_cents(100),
            quantity: 5,
            image: None,
            name: "Kilim".to_string(),
            size_label: "4x6".to_string(),
            slug: "kilim".to_string(),
        });
        let added = total.map_or(0, |total| total.saturating_sub(before));
        assert_eq!(added, 1);
        assert!(added_message("Kilim", 5, added).contains("at most 99"));
    }

    #[test]
    fn test_empty_view() {
        let view = CartView::new(&Cart::new(), &ShippingConfig::default());
        assert!(view.is_empty());
        assert_eq!(view.total, "$0.00");
    }
}
