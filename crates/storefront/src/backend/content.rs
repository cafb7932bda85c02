//! Blog posts, portfolio pieces and videos.

use knotwork_core::models::{Blog, Listing, Page, PortfolioItem, Video};
use reqwest::Method;
use tracing::instrument;

use super::cache::{CacheValue, keys};
use super::{BackendClient, BackendError, segment, unexpected_cache_value};

/// Blog posts per listing page.
pub const BLOG_PAGE_SIZE: u32 = 9;

impl BackendClient {
    /// A page of published blog posts.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn list_blogs(&self, page: u32) -> Result<Page<Blog>, BackendError> {
        let page = page.max(1);
        let key = keys::blogs(page);
        let fetch = async {
            let request = self
                .request(Method::GET, "/blogs", None)
                .query(&[("page", page), ("limit", BLOG_PAGE_SIZE)])
                .query(&[("published", "true")]);
            let listing: Listing<Blog> = self.send(request).await?;
            Ok::<_, BackendError>(CacheValue::Blogs(listing.into_page()))
        };
        match self.cached(key.clone(), fetch).await? {
            CacheValue::Blogs(blogs) => Ok(blogs),
            _ => Err(unexpected_cache_value(&key)),
        }
    }

    /// Get a blog post by slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the post is not found or the request fails.
    #[instrument(skip(self))]
    pub async fn get_blog(&self, slug: &str) -> Result<Blog, BackendError> {
        let key = keys::blog(slug);
        let fetch = async {
            let blog: Blog = self.get(&format!("/blogs/{}", segment(slug)?), None).await?;
            Ok::<_, BackendError>(CacheValue::Blog(Box::new(blog)))
        };
        match self.cached(key.clone(), fetch).await? {
            CacheValue::Blog(blog) => Ok(*blog),
            _ => Err(unexpected_cache_value(&key)),
        }
    }

    /// Every portfolio piece.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn list_portfolio(&self) -> Result<Vec<PortfolioItem>, BackendError> {
        let fetch = async {
            let listing: Listing<PortfolioItem> = self.get("/portfolios", None).await?;
            Ok::<_, BackendError>(CacheValue::Portfolio(listing.into_page().items))
        };
        match self.cached(keys::PORTFOLIO.to_string(), fetch).await? {
            CacheValue::Portfolio(items) => Ok(items),
            _ => Err(unexpected_cache_value(keys::PORTFOLIO)),
        }
    }

    /// Every video, ordered by position.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn list_videos(&self) -> Result<Vec<Video>, BackendError> {
        let fetch = async {
            let listing: Listing<Video> = self.get("/videos", None).await?;
            let mut videos = listing.into_page().items;
            videos.sort_by_key(|v| v.position);
            Ok::<_, BackendError>(CacheValue::Videos(videos))
        };
        match self.cached(keys::VIDEOS.to_string(), fetch).await? {
            CacheValue::Videos(videos) => Ok(videos),
            _ => Err(unexpected_cache_value(keys::VIDEOS)),
        }
    }
}
