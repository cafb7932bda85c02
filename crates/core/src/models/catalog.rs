//! Catalog records: products, variants, collections and reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CollectionId, Price, ProductId, ProductStatus, ReviewId, SizeId, VariantId};

/// A product image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
}

/// A purchasable size of a variant, with its own price and stock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Size {
    #[serde(alias = "_id", default)]
    pub id: SizeId,
    /// Dimensions label, e.g. `5x8`.
    #[serde(alias = "size")]
    pub label: String,
    pub price: Price,
    #[serde(default)]
    pub stock: u32,
}

impl Size {
    /// True if this size can be added to the cart.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// A colour of a product with its own images and sizes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    #[serde(alias = "_id", default)]
    pub id: VariantId,
    pub color: String,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub sizes: Vec<Size>,
}

impl Variant {
    /// Find a size by id.
    #[must_use]
    pub fn size(&self, size_id: &SizeId) -> Option<&Size> {
        self.sizes.iter().find(|size| &size.id == size_id)
    }

    /// Cheapest size price.
    #[must_use]
    pub fn min_price(&self) -> Option<Price> {
        self.sizes.iter().map(|size| size.price).min()
    }
}

/// A rug in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    /// Base price; sizes carry their own prices.
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub compare_at_price: Option<Price>,
    #[serde(default)]
    pub collection: Option<CollectionRef>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Collection reference embedded in a product (id only, or populated).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CollectionRef {
    Id(CollectionId),
    Populated {
        #[serde(alias = "_id")]
        id: CollectionId,
        name: String,
        #[serde(default)]
        slug: String,
    },
}

impl CollectionRef {
    /// Referenced collection id.
    #[must_use]
    pub const fn id(&self) -> &CollectionId {
        match self {
            Self::Id(id) | Self::Populated { id, .. } => id,
        }
    }

    /// Collection name when the backend populated it.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Id(_) => None,
            Self::Populated { name, .. } => Some(name),
        }
    }
}

impl Product {
    /// Slug if present, otherwise the id; used in storefront URLs.
    #[must_use]
    pub fn handle(&self) -> &str {
        if self.slug.is_empty() {
            self.id.as_str()
        } else {
            &self.slug
        }
    }

    /// First image of the product, falling back to the first variant image.
    #[must_use]
    pub fn featured_image(&self) -> Option<&ProductImage> {
        self.images
            .first()
            .or_else(|| self.variants.iter().find_map(|v| v.images.first()))
    }

    /// Lowest price across all sizes, or the base price.
    #[must_use]
    pub fn from_price(&self) -> Price {
        self.variants
            .iter()
            .filter_map(Variant::min_price)
            .min()
            .unwrap_or(self.price)
    }

    /// Find a variant by id.
    #[must_use]
    pub fn variant(&self, variant_id: &VariantId) -> Option<&Variant> {
        self.variants.iter().find(|v| &v.id == variant_id)
    }

    /// Total units in stock across every size.
    #[must_use]
    pub fn total_stock(&self) -> u32 {
        self.variants
            .iter()
            .flat_map(|v| v.sizes.iter())
            .map(|s| s.stock)
            .sum()
    }
}

/// Slim product embedded in wishlists and related lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    #[serde(alias = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub images: Vec<ProductImage>,
}

/// A named grouping of products.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    #[serde(alias = "_id")]
    pub id: CollectionId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub product_count: u32,
}

impl Collection {
    /// Slug if present, otherwise the id.
    #[must_use]
    pub fn handle(&self) -> &str {
        if self.slug.is_empty() {
            self.id.as_str()
        } else {
            &self.slug
        }
    }
}

/// A customer review of a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(alias = "_id")]
    pub id: ReviewId,
    #[serde(default)]
    pub product_id: ProductId,
    #[serde(alias = "name")]
    pub author_name: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Review {
    /// Rating rendered as filled and empty stars.
    #[must_use]
    pub fn stars(&self) -> String {
        let filled = usize::from(self.rating.min(5));
        format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT_JSON: &str = r#"{
        "_id": "p1",
        "name": "Heriz Wool",
        "slug": "heriz-wool",
        "price": 900,
        "collection": {"_id": "c1", "name": "Persian"},
        "variants": [
            {"_id": "v1", "color": "Crimson", "images": [{"url": "https://cdn.example/v1.jpg"}],
             "sizes": [{"_id": "s1", "label": "5x8", "price": 1200, "stock": 2},
                       {"_id": "s2", "label": "3x5", "price": 750, "stock": 0}]}
        ]
    }"#;

    #[test]
    fn test_product_from_backend_json() {
        let product: Product = serde_json::from_str(PRODUCT_JSON).unwrap_or_default();
        assert_eq!(product.id.as_str(), "p1");
        assert_eq!(product.handle(), "heriz-wool");
        assert_eq!(product.from_price(), Price::from_cents(75_000));
        assert_eq!(product.total_stock(), 2);
        assert_eq!(
            product.featured_image().map(|i| i.url.as_str()),
            Some("https://cdn.example/v1.jpg")
        );
        assert_eq!(
            product.collection.as_ref().and_then(CollectionRef::name),
            Some("Persian")
        );
    }

    #[test]
    fn test_collection_ref_plain_id() {
        let r: Option<CollectionRef> = serde_json::from_str("\"c9\"").ok();
        assert_eq!(r.as_ref().map(|c| c.id().as_str()), Some("c9"));
    }

    #[test]
    fn test_review_stars() {
        let review = Review {
            rating: 4,
            ..Review::default()
        };
        assert_eq!(review.stars(), "★★★★☆");
    }
}
