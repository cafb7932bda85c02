//! Shopping cart model.
//!
//! The cart is the one entity this codebase owns. It lives in the visitor's
//! session and is recomputed on every read; the backend only sees it when an
//! order is placed.
//!
//! Line items are keyed by product + size + color. Adding a combination that
//! is already in the cart increases its quantity instead of adding a second
//! line, and a line whose quantity reaches zero is removed.

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId, SizeId, VariantId};

/// Highest quantity a single line may hold.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Composite identity of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartKey(String);

impl CartKey {
    /// Build the key for a product, size and color.
    ///
    /// Color is trimmed and lower-cased so `"Ivory"` and `"ivory "` share a line.
    #[must_use]
    pub fn new(product_id: &ProductId, size_id: &SizeId, color: &str) -> Self {
        Self(format!(
            "{}:{}:{}",
            product_id.as_str(),
            size_id.as_str(),
            color.trim().to_lowercase()
        ))
    }

    /// Wrap a key string received from a form post.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The key as a string (used as the line id in forms).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CartKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A line item in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Line id; always equal to the composite [`CartKey`].
    pub id: CartKey,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub size_id: SizeId,
    pub color: String,
    /// Unit price captured when the item was added.
    pub price: Price,
    pub quantity: u32,
    pub image: Option<String>,
    /// Product name, for display.
    pub name: String,
    /// Size label such as `5x8`, for display.
    pub size_label: String,
    /// Product slug, for linking back to the product page.
    #[serde(default)]
    pub slug: String,
}

impl CartItem {
    /// Line total (`price × quantity`).
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price * self.quantity
    }
}

/// Input for adding an item to the cart.
#[derive(Debug, Clone)]
pub struct NewCartItem {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub size_id: SizeId,
    pub color: String,
    pub price: Price,
    pub quantity: u32,
    pub image: Option<String>,
    pub name: String,
    pub size_label: String,
    pub slug: String,
}

impl NewCartItem {
    /// The key this item will be stored under.
    #[must_use]
    pub fn key(&self) -> CartKey {
        CartKey::new(&self.product_id, &self.size_id, &self.color)
    }
}

/// The shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// True if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find a line by key.
    #[must_use]
    pub fn get(&self, key: &CartKey) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.id == key)
    }

    /// Add an item, merging with an existing line for the same key.
    ///
    /// Returns the line's resulting quantity, or `None` if the add was a
    /// no-op (zero quantity). Quantities are capped at [`MAX_LINE_QUANTITY`].
    pub fn add(&mut self, item: NewCartItem) -> Option<u32> {
        if item.quantity == 0 {
            return None;
        }

        let key = item.key();
        if let Some(existing) = self.items.iter_mut().find(|line| line.id == key) {
            existing.quantity = existing
                .quantity
                .saturating_add(item.quantity)
                .min(MAX_LINE_QUANTITY);
            return Some(existing.quantity);
        }

        let quantity = item.quantity.min(MAX_LINE_QUANTITY);
        self.items.push(CartItem {
            id: key,
            product_id: item.product_id,
            variant_id: item.variant_id,
            size_id: item.size_id,
            color: item.color.trim().to_string(),
            price: item.price,
            quantity,
            image: item.image,
            name: item.name,
            size_label: item.size_label,
            slug: item.slug,
        });
        Some(quantity)
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// Returns the new quantity (`Some(0)` when removed), or `None` if no line
    /// has this key.
    pub fn set_quantity(&mut self, key: &CartKey, quantity: u32) -> Option<u32> {
        let index = self.items.iter().position(|item| &item.id == key)?;
        if quantity == 0 {
            self.items.remove(index);
            return Some(0);
        }
        let line = self.items.get_mut(index)?;
        line.quantity = quantity.min(MAX_LINE_QUANTITY);
        Some(line.quantity)
    }

    /// Add one unit to a line.
    pub fn increment(&mut self, key: &CartKey) -> Option<u32> {
        let current = self.get(key)?.quantity;
        self.set_quantity(key, current.saturating_add(1))
    }

    /// Remove one unit from a line; removing the last unit removes the line.
    pub fn decrement(&mut self, key: &CartKey) -> Option<u32> {
        let current = self.get(key)?.quantity;
        self.set_quantity(key, current.saturating_sub(1))
    }

    /// Remove a line entirely. Returns the removed item.
    pub fn remove(&mut self, key: &CartKey) -> Option<CartItem> {
        let index = self.items.iter().position(|item| &item.id == key)?;
        Some(self.items.remove(index))
    }

    /// Empty the cart (after a completed checkout).
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of `price × quantity` over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Total number of units in the cart.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn runner(size: &str, color: &str, cents: i64, quantity: u32) -> NewCartItem {
        NewCartItem {
            product_id: ProductId::new("kilim-01"),
            variant_id: VariantId::new(format!("kilim-01-{color}")),
            size_id: SizeId::new(size),
            color: color.to_string(),
            price: Price::from_cents(cents),
            quantity,
            image: Some("https://cdn.example/kilim.jpg".to_string()),
            name: "Anatolian Kilim".to_string(),
            size_label: size.to_string(),
            slug: "anatolian-kilim".to_string(),
        }
    }

    #[test]
    fn test_same_combination_increments_quantity() {
        let mut cart = Cart::new();
        cart.add(runner("2x3", "Rust", 12_000, 1));
        let quantity = cart.add(runner("2x3", "rust ", 12_000, 2));

        assert_eq!(quantity, Some(3));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_different_size_or_color_adds_line() {
        let mut cart = Cart::new();
        cart.add(runner("2x3", "rust", 12_000, 1));
        cart.add(runner("5x8", "rust", 48_000, 1));
        cart.add(runner("2x3", "indigo", 12_000, 1));

        assert_eq!(cart.items().len(), 3);
    }

    #[test]
    fn test_zero_quantity_add_is_ignored() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(runner("2x3", "rust", 12_000, 0)), None);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_removing_last_unit_removes_line() {
        let mut cart = Cart::new();
        let key = runner("2x3", "rust", 12_000, 1).key();
        cart.add(runner("2x3", "rust", 12_000, 1));

        assert_eq!(cart.decrement(&key), Some(0));
        assert!(cart.is_empty());
        assert_eq!(cart.decrement(&key), None);
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let mut cart = Cart::new();
        let key = runner("2x3", "rust", 12_000, 2).key();
        cart.add(runner("2x3", "rust", 12_000, 2));

        assert_eq!(cart.set_quantity(&key, 0), Some(0));
        assert!(cart.get(&key).is_none());
    }

    #[test]
    fn test_unknown_key_is_none() {
        let mut cart = Cart::new();
        let key = CartKey::from_raw("missing:size:color");
        assert_eq!(cart.set_quantity(&key, 3), None);
        assert!(cart.remove(&key).is_none());
    }

    #[test]
    fn test_quantity_is_capped() {
        let mut cart = Cart::new();
        cart.add(runner("2x3", "rust", 100, 80));
        assert_eq!(cart.add(runner("2x3", "rust", 100, 80)), Some(MAX_LINE_QUANTITY));
    }

    #[test]
    fn test_subtotal_tracks_operation_sequence() {
        let mut cart = Cart::new();
        let small = runner("2x3", "rust", 12_050, 1);
        let large = runner("8x10", "ivory", 189_900, 1);
        let small_key = small.key();
        let large_key = large.key();

        cart.add(small.clone());
        cart.add(large);
        cart.add(small);
        cart.increment(&large_key);
        cart.set_quantity(&small_key, 5);
        cart.decrement(&small_key);

        let expected: Price = cart
            .items()
            .iter()
            .map(|item| item.price * item.quantity)
            .sum();
        assert_eq!(cart.subtotal(), expected);
        assert_eq!(
            cart.subtotal(),
            Price::from_cents(12_050 * 4 + 189_900 * 2)
        );

        cart.remove(&large_key);
        assert_eq!(cart.subtotal(), Price::from_cents(12_050 * 4));

        cart.clear();
        assert_eq!(cart.subtotal(), Price::ZERO);
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_cart_survives_session_serialization() {
        let mut cart = Cart::new();
        cart.add(runner("2x3", "rust", 12_000, 2));

        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json["items"][0]["productId"], "kilim-01");
        assert_eq!(json["items"][0]["id"], "kilim-01:2x3:rust");

        let restored: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(restored, cart);
    }
}
