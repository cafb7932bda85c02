//! Checkout route handlers.
//!
//! Orders are placed directly with the backend; payment collection happens
//! there. The cart is cleared only after the backend accepts the order.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use knotwork_core::models::{Address, CheckoutRequest, Order, OrderCustomer};
use knotwork_core::validation::FieldErrors;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::{OptionalCustomer, clear_current_customer};
use crate::state::AppState;

use super::cart::{CartView, clear_cart, load_cart};

/// Checkout form data.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub line1: String,
    pub line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub notes: String,
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl CheckoutForm {
    fn validate(&self) -> std::result::Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors
            .require("name", "Full name", &self.name)
            .length("name", "Full name", &self.name, 2, 100)
            .email("email", &self.email)
            .length("phone", "Phone", &self.phone, 7, 20)
            .require("line1", "Address", &self.line1)
            .length("line1", "Address", &self.line1, 3, 200)
            .require("city", "City", &self.city)
            .require("postal_code", "Postal code", &self.postal_code)
            .length("postal_code", "Postal code", &self.postal_code, 3, 12)
            .require("country", "Country", &self.country)
            .length("notes", "Order notes", &self.notes, 0, 1000);
        errors.into_result()
    }

    fn customer(&self) -> OrderCustomer {
        OrderCustomer {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            phone: optional(&self.phone),
        }
    }

    fn address(&self) -> Address {
        Address {
            line1: self.line1.trim().to_string(),
            line2: optional(&self.line2),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            country: self.country.trim().to_string(),
        }
    }
}

/// Confirmed order display data.
#[derive(Clone)]
pub struct OrderConfirmationView {
    pub reference: String,
    pub email: String,
    pub lines: Vec<(String, u32, String)>,
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
    pub address: Option<String>,
}

impl From<&Order> for OrderConfirmationView {
    fn from(order: &Order) -> Self {
        Self {
            reference: order.reference().to_string(),
            email: order.customer.email.clone(),
            lines: order
                .lines
                .iter()
                .map(|line| {
                    (
                        format!("{} ({}, {})", line.name, line.color, line.size_label),
                        line.quantity,
                        line.line_total().display(),
                    )
                })
                .collect(),
            subtotal: order.subtotal.display(),
            shipping: order.shipping.display(),
            total: order.total.display(),
            address: order.shipping_address.as_ref().map(Address::one_line),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "checkout/form.html")]
pub struct CheckoutTemplate {
    pub cart: CartView,
    pub form: CheckoutForm,
    pub errors: FieldErrors,
    pub alert: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirmation.html")]
pub struct ConfirmationTemplate {
    pub order: OrderConfirmationView,
}

/// Display the checkout form, prefilled for signed-in customers.
#[instrument(skip(state, session, customer))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalCustomer(customer): OptionalCustomer,
) -> Response {
    let cart = load_cart(&session).await;
    if cart.is_empty() {
        return Redirect::to("/cart").into_response();
    }

    let form = customer
        .map(|c| CheckoutForm {
            name: c.name,
            email: c.email,
            ..CheckoutForm::default()
        })
        .unwrap_or_default();

    CheckoutTemplate {
        cart: CartView::new(&cart, &state.config().shipping),
        form,
        errors: FieldErrors::new(),
        alert: None,
    }
    .into_response()
}

/// Place the order.
///
/// Invalid input re-renders the form (422) without calling the backend.
#[instrument(skip(state, session, customer, form))]
pub async fn place(
    State(state): State<AppState>,
    session: Session,
    OptionalCustomer(customer): OptionalCustomer,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let cart = load_cart(&session).await;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }
    let shipping = &state.config().shipping;

    if let Err(errors) = form.validate() {
        let page = CheckoutTemplate {
            cart: CartView::new(&cart, shipping),
            form,
            errors,
            alert: None,
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
    }

    let checkout = CheckoutRequest::from_cart(
        &cart,
        form.customer(),
        form.address(),
        shipping.charge_for(cart.subtotal()),
        optional(&form.notes),
    );
    let token = customer.as_ref().map(|c| c.token.as_str());

    match state.backend().place_order(token, &checkout).await {
        Ok(order) => Ok(confirm(&session, &order).await),
        Err(err) => {
            if err.is_unauthorized() && customer.is_some() {
                clear_current_customer(&session).await?;
            }
            let status = if err.status().is_some_and(|s| (400..500).contains(&s)) {
                StatusCode::UNPROCESSABLE_ENTITY
            } else {
                StatusCode::BAD_GATEWAY
            };
            let page = CheckoutTemplate {
                cart: CartView::new(&cart, shipping),
                form,
                errors: FieldErrors::new(),
                alert: Some(err.user_message()),
            };
            Ok((status, page).into_response())
        }
    }
}

/// Empty the cart and render the confirmation for a placed order.
///
/// The order exists once the backend accepts it, so a session failure here is
/// logged and the confirmation still shown.
async fn confirm(session: &Session, order: &Order) -> Response {
    if let Err(err) = clear_cart(session).await {
        tracing::error!(error = %err, order = %order.id, "Failed to clear cart after order");
    }
    ConfirmationTemplate {
        order: OrderConfirmationView::from(order),
    }
    .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use knotwork_core::cart::{Cart, NewCartItem};
    use knotwork_core::models::OrderCustomer;
    use knotwork_core::types::{OrderId, Price, ProductId, SizeId, VariantId};
    use tower_sessions::MemoryStore;

    use crate::routes::cart::save_cart;
    use super::*;

    fn valid_form() -> CheckoutForm {
        CheckoutForm {
            name: "Ada Weaver".to_string(),
            email: " Ada@Example.com ".to_string(),
            line1: "12 Loom Street".to_string(),
            city: "Portland".to_string(),
            postal_code: "97201".to_string(),
            country: "US".to_string(),
            ..CheckoutForm::default()
        }
    }

    #[test]
    fn test_valid_form_passes() {
        let form = valid_form();
        assert!(form.validate().is_ok());
        assert_eq!(form.customer().email, "ada@example.com");
        assert_eq!(form.customer().phone, None);
        assert_eq!(form.address().line2, None);
    }

    #[test]
    fn test_missing_fields_reported() {
        let form = CheckoutForm {
            email: "not-an-email".to_string(),
            ..CheckoutForm::default()
        };
        let errors = form.validate().err().unwrap_or_default();
        assert!(errors.has("name"));
        assert!(errors.has("line1"));
        assert!(errors.has("city"));
        assert!(errors.has("postal_code"));
        assert!(errors.has("country"));
        assert_eq!(errors.get("email"), Some("Please enter a valid email address."));
    }

    #[tokio::test]
    async fn test_confirmation_empties_cart() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let mut cart = Cart::new();
        cart.add(NewCartItem {
            product_id: ProductId::new("p1"),
            variant_id: VariantId::new("v1"),
            size_id: SizeId::new("s1"),
            color: "Rust".to_string(),
            price: Price::from_cents(30_000),
            quantity: 1,
            image: None,
            name: "Kilim".to_string(),
            size_label: "4x6".to_string(),
            slug: "kilim".to_string(),
        });
        save_cart(&session, &cart).await.unwrap();

        let order = Order {
            id: OrderId::new("o1"),
            order_number: "KW-1001".to_string(),
            customer: OrderCustomer {
                name: "Ada Weaver".to_string(),
                email: "ada@example.com".to_string(),
                phone: None,
            },
            total: Price::from_cents(30_000),
            ..Order::default()
        };
        let response = confirm(&session, &order).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(load_cart(&session).await.is_empty());
    }
}
