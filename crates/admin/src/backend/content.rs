//! Blog posts, portfolio pieces and videos.

use knotwork_core::models::{Blog, Listing, PortfolioItem, Video};
use knotwork_core::types::{BlogId, PortfolioId, VideoId};
use reqwest::Method;
use reqwest::multipart::Form;
use serde::Serialize;
use tracing::instrument;

use super::{AdminClient, BackendError, FileUpload, segment};

/// Validated blog form.
#[derive(Debug, Clone)]
pub struct BlogInput {
    pub title: String,
    pub excerpt: String,
    /// HTML body.
    pub content: String,
    pub author: String,
    pub tags: Vec<String>,
    pub published: bool,
    pub cover_image: Option<FileUpload>,
}

impl BlogInput {
    fn into_form(self) -> Result<Form, BackendError> {
        let tags =
            serde_json::to_string(&self.tags).map_err(|e| BackendError::Parse(e.to_string()))?;
        let mut form = Form::new()
            .text("title", self.title)
            .text("excerpt", self.excerpt)
            .text("content", self.content)
            .text("tags", tags)
            .text("published", self.published.to_string());
        if !self.author.trim().is_empty() {
            form = form.text("author", self.author);
        }
        if let Some(image) = self.cover_image {
            form = form.part("image", image.into_part()?);
        }
        Ok(form)
    }
}

/// Validated portfolio form.
#[derive(Debug, Clone)]
pub struct PortfolioInput {
    pub title: String,
    pub description: String,
    pub location: String,
    pub year: Option<i32>,
    pub images: Vec<FileUpload>,
}

impl PortfolioInput {
    fn into_form(self) -> Result<Form, BackendError> {
        let mut form = Form::new()
            .text("title", self.title)
            .text("description", self.description);
        if !self.location.trim().is_empty() {
            form = form.text("location", self.location);
        }
        if let Some(year) = self.year {
            form = form.text("year", year.to_string());
        }
        for image in self.images {
            form = form.part("images", image.into_part()?);
        }
        Ok(form)
    }
}

/// Validated video form, sent as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInput {
    pub title: String,
    pub description: String,
    pub video_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub position: i32,
}

impl AdminClient {
    // =========================================================================
    // Blog Methods
    // =========================================================================

    /// Every post, drafts included.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self, token))]
    pub async fn list_blogs(&self, token: &str) -> Result<Vec<Blog>, BackendError> {
        let request = self
            .request(Method::GET, "/blogs", token)
            .query(&[("includeDrafts", "true")]);
        let listing: Listing<Blog> = self.send(request).await?;
        Ok(listing.into_page().items)
    }

    /// # Errors
    ///
    /// Returns an error if the post is not found or the request fails.
    #[instrument(skip(self, token), fields(blog_id = %id))]
    pub async fn get_blog(&self, token: &str, id: &BlogId) -> Result<Blog, BackendError> {
        self.get(&format!("/blogs/{}", segment(id.as_str())?), token).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the post.
    #[instrument(skip(self, token, input), fields(title = %input.title))]
    pub async fn create_blog(&self, token: &str, input: BlogInput) -> Result<Blog, BackendError> {
        let request = self
            .request(Method::POST, "/blogs", token)
            .multipart(input.into_form()?);
        self.send(request).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the change.
    #[instrument(skip(self, token, input), fields(blog_id = %id))]
    pub async fn update_blog(
        &self,
        token: &str,
        id: &BlogId,
        input: BlogInput,
    ) -> Result<Blog, BackendError> {
        let request = self
            .request(Method::PUT, &format!("/blogs/{}", segment(id.as_str())?), token)
            .multipart(input.into_form()?);
        self.send(request).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend refuses the deletion.
    #[instrument(skip(self, token), fields(blog_id = %id))]
    pub async fn delete_blog(&self, token: &str, id: &BlogId) -> Result<(), BackendError> {
        self.delete(&format!("/blogs/{}", segment(id.as_str())?), token).await
    }

    // =========================================================================
    // Portfolio Methods
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self, token))]
    pub async fn list_portfolios(&self, token: &str) -> Result<Vec<PortfolioItem>, BackendError> {
        let listing: Listing<PortfolioItem> = self.get("/portfolios", token).await?;
        Ok(listing.into_page().items)
    }

    /// # Errors
    ///
    /// Returns an error if the piece is not found or the request fails.
    #[instrument(skip(self, token), fields(portfolio_id = %id))]
    pub async fn get_portfolio(
        &self,
        token: &str,
        id: &PortfolioId,
    ) -> Result<PortfolioItem, BackendError> {
        self.get(&format!("/portfolios/{}", segment(id.as_str())?), token).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the piece.
    #[instrument(
        skip(self, token, input),
        fields(title = %input.title, images = input.images.len())
    )]
    pub async fn create_portfolio(
        &self,
        token: &str,
        input: PortfolioInput,
    ) -> Result<PortfolioItem, BackendError> {
        let request = self
            .request(Method::POST, "/portfolios", token)
            .multipart(input.into_form()?);
        self.send(request).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the change.
    #[instrument(skip(self, token, input), fields(portfolio_id = %id))]
    pub async fn update_portfolio(
        &self,
        token: &str,
        id: &PortfolioId,
        input: PortfolioInput,
    ) -> Result<PortfolioItem, BackendError> {
        let request = self
            .request(Method::PUT, &format!("/portfolios/{}", segment(id.as_str())?), token)
            .multipart(input.into_form()?);
        self.send(request).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend refuses the deletion.
    #[instrument(skip(self, token), fields(portfolio_id = %id))]
    pub async fn delete_portfolio(
        &self,
        token: &str,
        id: &PortfolioId,
    ) -> Result<(), BackendError> {
        self.delete(&format!("/portfolios/{}", segment(id.as_str())?), token).await
    }

    // =========================================================================
    // Video Methods
    // =========================================================================

    /// Videos in display order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self, token))]
    pub async fn list_videos(&self, token: &str) -> Result<Vec<Video>, BackendError> {
        let listing: Listing<Video> = self.get("/videos", token).await?;
        let mut videos = listing.into_page().items;
        videos.sort_by_key(|v| v.position);
        Ok(videos)
    }

    /// # Errors
    ///
    /// Returns an error if the video is not found or the request fails.
    #[instrument(skip(self, token), fields(video_id = %id))]
    pub async fn get_video(&self, token: &str, id: &VideoId) -> Result<Video, BackendError> {
        self.get(&format!("/videos/{}", segment(id.as_str())?), token).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the video.
    #[instrument(skip(self, token, input), fields(title = %input.title))]
    pub async fn create_video(
        &self,
        token: &str,
        input: &VideoInput,
    ) -> Result<Video, BackendError> {
        let request = self.request(Method::POST, "/videos", token).json(input);
        self.send(request).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the change.
    #[instrument(skip(self, token, input), fields(video_id = %id))]
    pub async fn update_video(
        &self,
        token: &str,
        id: &VideoId,
        input: &VideoInput,
    ) -> Result<Video, BackendError> {
        let request = self
            .request(Method::PUT, &format!("/videos/{}", segment(id.as_str())?), token)
            .json(input);
        self.send(request).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend refuses the deletion.
    #[instrument(skip(self, token), fields(video_id = %id))]
    pub async fn delete_video(&self, token: &str, id: &VideoId) -> Result<(), BackendError> {
        self.delete(&format!("/videos/{}", segment(id.as_str())?), token).await
    }
}
