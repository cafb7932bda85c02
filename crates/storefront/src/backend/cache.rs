//! Cache entries for backend reads.

use knotwork_core::models::{Blog, Collection, Page, PortfolioItem, Product, Review, Video};

/// Cache key builders, kept together so invalidation matches insertion.
pub mod keys {
    use super::super::ProductFilter;

    pub fn product(slug_or_id: &str) -> String {
        format!("product:{slug_or_id}")
    }

    pub fn products(filter: &ProductFilter) -> String {
        format!("products:{filter:?}")
    }

    pub fn related(product_id: &str) -> String {
        format!("related:{product_id}")
    }

    pub fn reviews(product_id: &str) -> String {
        format!("reviews:{product_id}")
    }

    pub const COLLECTIONS: &str = "collections";

    pub fn collection(slug: &str) -> String {
        format!("collection:{slug}")
    }

    pub fn blogs(page: u32) -> String {
        format!("blogs:{page}")
    }

    pub fn blog(slug: &str) -> String {
        format!("blog:{slug}")
    }

    pub const PORTFOLIO: &str = "portfolio";
    pub const VIDEOS: &str = "videos";
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Page<Product>),
    Related(Vec<Product>),
    Reviews(Vec<Review>),
    Collection(Box<Collection>),
    Collections(Vec<Collection>),
    Blog(Box<Blog>),
    Blogs(Page<Blog>),
    Portfolio(Vec<PortfolioItem>),
    Videos(Vec<Video>),
}
