//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::backend::ProductFilter;
use crate::filters;
use crate::state::AppState;

use super::blog::BlogCardView;
use super::collections::CollectionView;
use super::products::ProductCardView;

/// Featured products shown on the home page.
const FEATURED_LIMIT: usize = 8;

/// Collections shown on the home page.
const COLLECTION_LIMIT: usize = 6;

/// Blog posts shown on the home page.
const BLOG_LIMIT: usize = 3;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub featured_products: Vec<ProductCardView>,
    pub collections: Vec<CollectionView>,
    pub latest_posts: Vec<BlogCardView>,
}

/// Display the home page.
///
/// Each section is fetched concurrently and degrades to empty on failure.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let featured = ProductFilter {
        featured: Some(true),
        ..ProductFilter::default()
    };
    let backend = state.backend();
    let (products, collections, blogs) = tokio::join!(
        backend.list_products(&featured),
        backend.list_collections(),
        backend.list_blogs(1),
    );

    let featured_products = products.map_or_else(
        |e| {
            tracing::error!("Failed to fetch featured products: {e}");
            Vec::new()
        },
        |page| {
            page.items
                .iter()
                .take(FEATURED_LIMIT)
                .map(ProductCardView::from)
                .collect()
        },
    );

    let collections = collections.map_or_else(
        |e| {
            tracing::error!("Failed to fetch collections: {e}");
            Vec::new()
        },
        |collections| {
            collections
                .iter()
                .take(COLLECTION_LIMIT)
                .map(CollectionView::from)
                .collect()
        },
    );

    let latest_posts = blogs.map_or_else(
        |e| {
            tracing::error!("Failed to fetch blog posts: {e}");
            Vec::new()
        },
        |page| page.items.iter().take(BLOG_LIMIT).map(BlogCardView::from).collect(),
    );

    HomeTemplate {
        featured_products,
        collections,
        latest_posts,
    }
}
