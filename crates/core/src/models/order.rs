//! Order records and the checkout payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::types::{OrderId, OrderStatus, PaymentStatus, Price, ProductId, SizeId, VariantId};

/// Shipping address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl Address {
    /// Single-line rendering for tables.
    #[must_use]
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.line1.as_str()];
        if let Some(line2) = self.line2.as_deref().filter(|l| !l.is_empty()) {
            parts.push(line2);
        }
        parts.push(&self.city);
        if !self.state.is_empty() {
            parts.push(&self.state);
        }
        parts.push(&self.postal_code);
        parts.push(&self.country);
        parts.join(", ")
    }
}

/// Who placed the order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCustomer {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// A line of an order, snapshotted from the cart at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: VariantId,
    #[serde(default)]
    pub size_id: SizeId,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub size_label: String,
    pub price: Price,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
}

impl OrderLine {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price * self.quantity
    }
}

/// An order as returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(alias = "_id")]
    pub id: OrderId,
    #[serde(default)]
    pub order_number: String,
    pub customer: OrderCustomer,
    #[serde(default)]
    pub shipping_address: Option<Address>,
    #[serde(default, alias = "items")]
    pub lines: Vec<OrderLine>,
    #[serde(default)]
    pub subtotal: Price,
    #[serde(default)]
    pub shipping: Price,
    pub total: Price,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Order number if assigned, otherwise the id.
    #[must_use]
    pub fn reference(&self) -> &str {
        if self.order_number.is_empty() {
            self.id.as_str()
        } else {
            &self.order_number
        }
    }

    /// Units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }
}

/// Payload posted to the backend to place an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub customer: OrderCustomer,
    pub shipping_address: Address,
    pub items: Vec<OrderLine>,
    pub subtotal: Price,
    pub shipping: Price,
    pub total: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CheckoutRequest {
    /// Snapshot a cart into an order payload.
    #[must_use]
    pub fn from_cart(
        cart: &Cart,
        customer: OrderCustomer,
        shipping_address: Address,
        shipping: Price,
        notes: Option<String>,
    ) -> Self {
        let items = cart
            .items()
            .iter()
            .map(|item| OrderLine {
                product_id: item.product_id.clone(),
                variant_id: item.variant_id.clone(),
                size_id: item.size_id.clone(),
                name: item.name.clone(),
                color: item.color.clone(),
                size_label: item.size_label.clone(),
                price: item.price,
                quantity: item.quantity,
                image: item.image.clone(),
            })
            .collect();
        let subtotal = cart.subtotal();

        Self {
            customer,
            shipping_address,
            items,
            subtotal,
            shipping,
            total: subtotal + shipping,
            notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::NewCartItem;

    #[test]
    fn test_checkout_snapshot_totals() {
        let mut cart = Cart::new();
        cart.add(NewCartItem {
            product_id: ProductId::new("p1"),
            variant_id: VariantId::new("v1"),
            size_id: SizeId::new("s1"),
            color: "Ivory".to_string(),
            price: Price::from_cents(40_000),
            quantity: 2,
            image: None,
            name: "Beni Ourain".to_string(),
            size_label: "6x9".to_string(),
            slug: "beni-ourain".to_string(),
        });

        let request = CheckoutRequest::from_cart(
            &cart,
            OrderCustomer::default(),
            Address::default(),
            Price::from_cents(2_500),
            None,
        );

        assert_eq!(request.items.len(), 1);
        assert_eq!(request.subtotal, Price::from_cents(80_000));
        assert_eq!(request.total, Price::from_cents(82_500));
    }

    #[test]
    fn test_address_one_line_skips_blanks() {
        let address = Address {
            line1: "12 Loom St".to_string(),
            line2: Some(String::new()),
            city: "Portland".to_string(),
            state: "OR".to_string(),
            postal_code: "97201".to_string(),
            country: "US".to_string(),
        };
        assert_eq!(address.one_line(), "12 Loom St, Portland, OR, 97201, US");
    }
}
