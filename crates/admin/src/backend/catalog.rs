//! Products, collections and the spreadsheet import.

use knotwork_core::models::{Collection, Listing, Page, Product, ProductImage};
use knotwork_core::types::{CollectionId, Price, ProductId, ProductStatus, SizeId, VariantId};
use reqwest::Method;
use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{AdminClient, BackendError, FileUpload, PAGE_SIZE, segment};

/// Filters for the product table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl ProductQuery {
    /// Drop blank values that browsers submit for untouched inputs.
    #[must_use]
    pub fn normalized(self) -> Self {
        let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Self {
            search: clean(self.search),
            status: clean(self.status),
            page: self.page.filter(|p| *p > 1),
        }
    }
}

/// A size row of the product form.
///
/// `id` is set for sizes that already exist so the backend keeps them, and
/// the cart lines pointing at them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<SizeId>,
    pub label: String,
    pub price: Price,
    pub stock: u32,
}

/// A colour row of the product form with its sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<VariantId>,
    pub color: String,
    /// Existing images to keep; uploads travel as `variantImages[n]` parts.
    pub images: Vec<ProductImage>,
    pub sizes: Vec<SizeInput>,
}

/// Validated product form, sent as multipart with its images.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub compare_at_price: Option<Price>,
    pub collection: Option<CollectionId>,
    pub status: ProductStatus,
    pub featured: bool,
    pub material: String,
    pub origin: String,
    pub variants: Vec<VariantInput>,
    pub images: Vec<FileUpload>,
    /// New images per variant, by position in `variants`.
    pub variant_images: Vec<(usize, FileUpload)>,
}

impl ProductInput {
    /// Multipart body. Variants travel as one JSON field.
    fn into_form(self) -> Result<Form, BackendError> {
        let variants =
            serde_json::to_string(&self.variants).map_err(|e| BackendError::Parse(e.to_string()))?;

        let mut form = Form::new()
            .text("name", self.name)
            .text("description", self.description)
            .text("price", self.price.amount().to_string())
            .text("status", self.status.as_str())
            .text("featured", self.featured.to_string())
            .text("variants", variants);
        if let Some(compare_at) = self.compare_at_price {
            form = form.text("compareAtPrice", compare_at.amount().to_string());
        }
        if let Some(collection) = self.collection {
            form = form.text("collection", collection.into_inner());
        }
        for (field, value) in [("material", self.material), ("origin", self.origin)] {
            if !value.trim().is_empty() {
                form = form.text(field, value);
            }
        }
        for image in self.images {
            form = form.part("images", image.into_part()?);
        }
        for (position, image) in self.variant_images {
            form = form.part(format!("variantImages[{position}]"), image.into_part()?);
        }
        Ok(form)
    }
}

/// Validated collection form.
#[derive(Debug, Clone)]
pub struct CollectionInput {
    pub name: String,
    pub description: String,
    pub image: Option<FileUpload>,
}

impl CollectionInput {
    fn into_form(self) -> Result<Form, BackendError> {
        let mut form = Form::new()
            .text("name", self.name)
            .text("description", self.description);
        if let Some(image) = self.image {
            form = form.part("image", image.into_part()?);
        }
        Ok(form)
    }
}

/// Outcome of a spreadsheet import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUploadResult {
    #[serde(default)]
    pub created: u32,
    #[serde(default)]
    pub updated: u32,
    #[serde(default)]
    pub failed: u32,
    #[serde(default)]
    pub errors: Vec<BulkRowError>,
}

/// A rejected spreadsheet row, as a plain message or with its row number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum BulkRowError {
    Message(String),
    Row {
        #[serde(default)]
        row: Option<u32>,
        #[serde(alias = "error")]
        message: String,
    },
}

impl BulkRowError {
    /// One line for the result summary.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Message(message) | Self::Row { row: None, message } => message.clone(),
            Self::Row {
                row: Some(row),
                message,
            } => format!("Row {row}: {message}"),
        }
    }
}

impl AdminClient {
    // =========================================================================
    // Product Methods
    // =========================================================================

    /// One page of products, every status included.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self, token))]
    pub async fn list_products(
        &self,
        token: &str,
        query: &ProductQuery,
    ) -> Result<Page<Product>, BackendError> {
        let request = self
            .request(Method::GET, "/products", token)
            .query(query)
            .query(&[("limit", PAGE_SIZE)]);
        let listing: Listing<Product> = self.send(request).await?;
        Ok(listing.into_page())
    }

    /// # Errors
    ///
    /// Returns an error if the product is not found or the request fails.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn get_product(&self, token: &str, id: &ProductId) -> Result<Product, BackendError> {
        self.get(&format!("/products/{}", segment(id.as_str())?), token).await
    }

    /// # Errors
    ///
    /// Returns an error if an image cannot be attached or the backend
    /// rejects the product.
    #[instrument(skip(self, token, input), fields(name = %input.name, images = input.images.len()))]
    pub async fn create_product(
        &self,
        token: &str,
        input: ProductInput,
    ) -> Result<Product, BackendError> {
        let request = self
            .request(Method::POST, "/products", token)
            .multipart(input.into_form()?);
        self.send(request).await
    }

    /// Update a product. Existing images are kept; uploaded ones are added.
    ///
    /// # Errors
    ///
    /// Returns an error if an image cannot be attached or the backend
    /// rejects the change.
    #[instrument(skip(self, token, input), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        token: &str,
        id: &ProductId,
        input: ProductInput,
    ) -> Result<Product, BackendError> {
        let request = self
            .request(Method::PUT, &format!("/products/{}", segment(id.as_str())?), token)
            .multipart(input.into_form()?);
        self.send(request).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend refuses the deletion.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(&self, token: &str, id: &ProductId) -> Result<(), BackendError> {
        self.delete(&format!("/products/{}", segment(id.as_str())?), token).await
    }

    /// Import products from an `.xlsx` spreadsheet.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the file as a whole. Row-level
    /// failures are reported in the result instead.
    #[instrument(
        skip(self, token, file),
        fields(file_name = %file.file_name, bytes = file.bytes.len())
    )]
    pub async fn bulk_upload_products(
        &self,
        token: &str,
        file: FileUpload,
    ) -> Result<BulkUploadResult, BackendError> {
        let form = Form::new().part("file", file.into_part()?);
        let request = self
            .request(Method::POST, "/products/bulk-upload", token)
            .multipart(form);
        self.send(request).await
    }

    // =========================================================================
    // Collection Methods
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self, token))]
    pub async fn list_collections(&self, token: &str) -> Result<Vec<Collection>, BackendError> {
        let listing: Listing<Collection> = self.get("/collections", token).await?;
        Ok(listing.into_page().items)
    }

    /// # Errors
    ///
    /// Returns an error if the collection is not found or the request fails.
    #[instrument(skip(self, token), fields(collection_id = %id))]
    pub async fn get_collection(
        &self,
        token: &str,
        id: &CollectionId,
    ) -> Result<Collection, BackendError> {
        self.get(&format!("/collections/{}", segment(id.as_str())?), token).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the collection.
    #[instrument(skip(self, token, input), fields(name = %input.name))]
    pub async fn create_collection(
        &self,
        token: &str,
        input: CollectionInput,
    ) -> Result<Collection, BackendError> {
        let request = self
            .request(Method::POST, "/collections", token)
            .multipart(input.into_form()?);
        self.send(request).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the change.
    #[instrument(skip(self, token, input), fields(collection_id = %id))]
    pub async fn update_collection(
        &self,
        token: &str,
        id: &CollectionId,
        input: CollectionInput,
    ) -> Result<Collection, BackendError> {
        let request = self
            .request(Method::PUT, &format!("/collections/{}", segment(id.as_str())?), token)
            .multipart(input.into_form()?);
        self.send(request).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend refuses the deletion.
    #[instrument(skip(self, token), fields(collection_id = %id))]
    pub async fn delete_collection(
        &self,
        token: &str,
        id: &CollectionId,
    ) -> Result<(), BackendError> {
        self.delete(&format!("/collections/{}", segment(id.as_str())?), token).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_result_decodes_mixed_errors() {
        let json = r#"{"created":3,"updated":1,"failed":2,
            "errors":["Missing name",{"row":7,"error":"Bad price"}]}"#;
        let result: BulkUploadResult = serde_json::from_str(json).unwrap();
        assert_eq!((result.created, result.updated, result.failed), (3, 1, 2));
        let lines: Vec<String> = result.errors.iter().map(BulkRowError::describe).collect();
        assert_eq!(lines, vec!["Missing name", "Row 7: Bad price"]);
    }

    #[test]
    fn test_variants_serialize_camel_case() {
        let variants = vec![VariantInput {
            id: None,
            color: "Indigo".to_string(),
            images: Vec::new(),
            sizes: vec![SizeInput {
                id: None,
                label: "5x8".to_string(),
                price: Price::from_cents(89_000),
                stock: 2,
            }],
        }];
        let json = serde_json::to_value(&variants).unwrap();
        assert_eq!(json[0]["color"], "Indigo");
        assert_eq!(json[0]["sizes"][0]["label"], "5x8");
        assert_eq!(json[0]["sizes"][0]["stock"], 2);
        assert!(json[0].get("id").is_none());
        assert!(json[0]["sizes"][0].get("id").is_none());
    }

    #[test]
    fn test_existing_variants_keep_ids_and_images() {
        let variants = vec![VariantInput {
            id: Some(VariantId::new("v1")),
            color: "Indigo".to_string(),
            images: vec![ProductImage {
                url: "https://cdn.example/indigo.jpg".to_string(),
                alt: None,
            }],
            sizes: vec![SizeInput {
                id: Some(SizeId::new("s1")),
                label: "5x8".to_string(),
                price: Price::from_cents(89_000),
                stock: 2,
            }],
        }];
        let json = serde_json::to_value(&variants).unwrap();
        assert_eq!(json[0]["id"], "v1");
        assert_eq!(json[0]["sizes"][0]["id"], "s1");
        assert_eq!(json[0]["images"][0]["url"], "https://cdn.example/indigo.jpg");
    }

    #[test]
    fn test_query_normalized() {
        let query = ProductQuery {
            search: Some("  ".to_string()),
            status: Some("draft".to_string()),
            page: Some(1),
        }
        .normalized();
        assert_eq!(query.search, None);
        assert_eq!(query.status.as_deref(), Some("draft"));
        assert_eq!(query.page, None);
    }
}
