//! Collection route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use knotwork_core::models::Collection;
use serde::Deserialize;
use tracing::instrument;

use crate::backend::ProductFilter;
use crate::error::Result;
use crate::filters;
use crate::state::AppState;

pub use super::products::{ImageView, ProductCardView};

/// Collection display data for templates.
#[derive(Clone)]
pub struct CollectionView {
    pub handle: String,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<ImageView>,
    pub product_count: u32,
}

impl From<&Collection> for CollectionView {
    fn from(collection: &Collection) -> Self {
        Self {
            handle: collection.handle().to_string(),
            name: collection.name.clone(),
            description: if collection.description.is_empty() {
                None
            } else {
                Some(collection.description.clone())
            },
            image: collection.image.as_ref().map(|url| ImageView {
                url: url.clone(),
                alt: collection.name.clone(),
            }),
            product_count: collection.product_count,
        }
    }
}

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<u32>,
    pub sort: Option<String>,
}

/// Collection listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "collections/index.html")]
pub struct CollectionsIndexTemplate {
    pub collections: Vec<CollectionView>,
}

/// Collection detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "collections/show.html")]
pub struct CollectionShowTemplate {
    pub collection: CollectionView,
    pub products: Vec<ProductCardView>,
    pub sort: String,
    pub current_page: u32,
    pub total_pages: u32,
    pub has_more_pages: bool,
}

/// Display collection listing page.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let collections = state.backend().list_collections().await?;
    Ok(CollectionsIndexTemplate {
        collections: collections.iter().map(CollectionView::from).collect(),
    })
}

/// Display collection detail page with products.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PaginationQuery>,
) -> Result<impl IntoResponse> {
    let collection = state.backend().get_collection(&slug).await?;

    let filter = ProductFilter {
        collection: Some(collection.handle().to_string()),
        sort: query.sort,
        page: query.page,
        ..ProductFilter::default()
    }
    .normalized();
    let page = state.backend().list_products(&filter).await?;

    Ok(CollectionShowTemplate {
        collection: CollectionView::from(&collection),
        products: page.items.iter().map(ProductCardView::from).collect(),
        sort: filter.sort.unwrap_or_default(),
        current_page: page.page,
        total_pages: page.total_pages,
        has_more_pages: page.has_next(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_view_hides_blank_description() {
        let collection = Collection {
            name: "Kilims".to_string(),
            slug: "kilims".to_string(),
            image: Some("https://cdn.example.com/kilims.jpg".to_string()),
            ..Collection::default()
        };
        let view = CollectionView::from(&collection);
        assert_eq!(view.handle, "kilims");
        assert!(view.description.is_none());
        assert_eq!(view.image.map(|i| i.alt), Some("Kilims".to_string()));
    }
}
