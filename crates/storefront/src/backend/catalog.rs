//! Products, collections and reviews.

use knotwork_core::models::{Collection, Listing, Page, Product, Review};
use knotwork_core::types::ProductId;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::cache::{CacheValue, keys};
use super::{BackendClient, BackendError, segment, unexpected_cache_value};

/// Products per listing page.
pub const PAGE_SIZE: u32 = 12;

/// Query filters for the product listing.
///
/// Doubles as the `/products` query-string extractor and the backend query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl ProductFilter {
    /// Drop blank values that browsers submit for untouched inputs.
    #[must_use]
    pub fn normalized(self) -> Self {
        let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Self {
            collection: clean(self.collection),
            search: clean(self.search),
            sort: clean(self.sort),
            min_price: clean(self.min_price),
            max_price: clean(self.max_price),
            featured: self.featured,
            page: self.page.filter(|p| *p > 1),
        }
    }

    /// True if the shopper typed a search term.
    #[must_use]
    pub const fn is_search(&self) -> bool {
        self.search.is_some()
    }
}

/// A review submitted from the product page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    pub name: String,
    pub rating: u8,
    pub comment: String,
}

impl BackendClient {
    // =========================================================================
    // Product Methods
    // =========================================================================

    /// List products matching a filter.
    ///
    /// Search results are never cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Page<Product>, BackendError> {
        let fetch = async {
            let request = self
                .request(Method::GET, "/products", None)
                .query(filter)
                .query(&[("limit", PAGE_SIZE)]);
            let listing: Listing<Product> = self.send(request).await?;
            Ok::<_, BackendError>(CacheValue::Products(listing.into_page()))
        };

        if filter.is_search() {
            return match fetch.await? {
                CacheValue::Products(page) => Ok(page),
                _ => Err(unexpected_cache_value("products")),
            };
        }

        let key = keys::products(filter);
        match self.cached(key.clone(), fetch).await? {
            CacheValue::Products(page) => Ok(page),
            _ => Err(unexpected_cache_value(&key)),
        }
    }

    /// Get a product by slug or id.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the request fails.
    #[instrument(skip(self))]
    pub async fn get_product(&self, slug_or_id: &str) -> Result<Product, BackendError> {
        let key = keys::product(slug_or_id);
        let fetch = async {
            let path = format!("/products/{}", segment(slug_or_id)?);
            let product: Product = self.get(&path, None).await?;
            Ok::<_, BackendError>(CacheValue::Product(Box::new(product)))
        };
        match self.cached(key.clone(), fetch).await? {
            CacheValue::Product(product) => Ok(*product),
            _ => Err(unexpected_cache_value(&key)),
        }
    }

    /// Products related to the given one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn related_products(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<Product>, BackendError> {
        let key = keys::related(product_id.as_str());
        let fetch = async {
            let path = format!("/products/{}/related", segment(product_id.as_str())?);
            let listing: Listing<Product> = self.get(&path, None).await?;
            Ok::<_, BackendError>(CacheValue::Related(listing.into_page().items))
        };
        match self.cached(key.clone(), fetch).await? {
            CacheValue::Related(products) => Ok(products),
            _ => Err(unexpected_cache_value(&key)),
        }
    }

    // =========================================================================
    // Collection Methods
    // =========================================================================

    /// All collections.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn list_collections(&self) -> Result<Vec<Collection>, BackendError> {
        let fetch = async {
            let listing: Listing<Collection> = self.get("/collections", None).await?;
            Ok::<_, BackendError>(CacheValue::Collections(listing.into_page().items))
        };
        match self.cached(keys::COLLECTIONS.to_string(), fetch).await? {
            CacheValue::Collections(collections) => Ok(collections),
            _ => Err(unexpected_cache_value(keys::COLLECTIONS)),
        }
    }

    /// Get a collection by slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is not found or the request fails.
    #[instrument(skip(self))]
    pub async fn get_collection(&self, slug: &str) -> Result<Collection, BackendError> {
        let key = keys::collection(slug);
        let fetch = async {
            let path = format!("/collections/{}", segment(slug)?);
            let collection: Collection = self.get(&path, None).await?;
            Ok::<_, BackendError>(CacheValue::Collection(Box::new(collection)))
        };
        match self.cached(key.clone(), fetch).await? {
            CacheValue::Collection(collection) => Ok(*collection),
            _ => Err(unexpected_cache_value(&key)),
        }
    }

    // =========================================================================
    // Review Methods
    // =========================================================================

    /// Reviews for a product, newest first as returned by the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn list_reviews(&self, product_id: &ProductId) -> Result<Vec<Review>, BackendError> {
        let key = keys::reviews(product_id.as_str());
        let fetch = async {
            let path = format!("/products/{}/reviews", segment(product_id.as_str())?);
            let listing: Listing<Review> = self.get(&path, None).await?;
            Ok::<_, BackendError>(CacheValue::Reviews(listing.into_page().items))
        };
        match self.cached(key.clone(), fetch).await? {
            CacheValue::Reviews(reviews) => Ok(reviews),
            _ => Err(unexpected_cache_value(&key)),
        }
    }

    /// Post a review. Requires a signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the review.
    #[instrument(skip(self, token, input), fields(product_id = %product_id))]
    pub async fn create_review(
        &self,
        token: &str,
        product_id: &ProductId,
        slug: &str,
        input: &ReviewInput,
    ) -> Result<Review, BackendError> {
        let path = format!("/products/{}/reviews", segment(product_id.as_str())?);
        let request = self.request(Method::POST, &path, Some(token)).json(input);
        let review = self.send(request).await?;

        self.invalidate(&keys::reviews(product_id.as_str())).await;
        self.invalidate(&keys::product(slug)).await;

        Ok(review)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_normalized_drops_blanks() {
        let filter = ProductFilter {
            collection: Some("  ".to_string()),
            search: Some(" kilim ".to_string()),
            sort: Some(String::new()),
            page: Some(1),
            ..ProductFilter::default()
        }
        .normalized();

        assert_eq!(filter.collection, None);
        assert_eq!(filter.search.as_deref(), Some("kilim"));
        assert_eq!(filter.sort, None);
        assert_eq!(filter.page, None);
        assert!(filter.is_search());
    }

    #[test]
    fn test_filter_cache_keys_differ() {
        let a = ProductFilter::default();
        let b = ProductFilter {
            page: Some(2),
            ..ProductFilter::default()
        };
        assert_ne!(keys::products(&a), keys::products(&b));
    }
}
