//! Blog route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use knotwork_core::models::Blog;
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::state::AppState;

/// Blog card for the index and home page.
#[derive(Clone)]
pub struct BlogCardView {
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub cover_image: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<String>,
}

impl From<&Blog> for BlogCardView {
    fn from(blog: &Blog) -> Self {
        Self {
            slug: blog.handle().to_string(),
            title: blog.title.clone(),
            summary: blog.summary(),
            cover_image: blog.cover_image.clone(),
            author: blog.author.clone(),
            published_at: blog.published_at.map(|d| d.format("%B %-d, %Y").to_string()),
        }
    }
}

/// Full post view. `content_html` is backend-authored HTML.
#[derive(Clone)]
pub struct PostView {
    pub card: BlogCardView,
    pub tags: Vec<String>,
    pub content_html: String,
}

impl From<&Blog> for PostView {
    fn from(blog: &Blog) -> Self {
        Self {
            card: BlogCardView::from(blog),
            tags: blog.tags.clone(),
            content_html: blog.content.clone(),
        }
    }
}

/// Blog index query parameters.
#[derive(Debug, Deserialize)]
pub struct BlogQuery {
    pub page: Option<u32>,
}

/// Blog index page template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/index.html")]
pub struct BlogIndexTemplate {
    pub posts: Vec<BlogCardView>,
    pub current_page: u32,
    pub total_pages: u32,
    pub has_previous: bool,
    pub has_next: bool,
}

/// Blog post detail template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/show.html")]
pub struct BlogShowTemplate {
    pub post: PostView,
    pub recent_posts: Vec<BlogCardView>,
}

/// Number of recent posts to show below a post.
const RECENT_POSTS_COUNT: usize = 3;

/// Display a page of published posts.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<BlogQuery>,
) -> Result<impl IntoResponse> {
    let page = state.backend().list_blogs(query.page.unwrap_or(1)).await?;
    Ok(BlogIndexTemplate {
        posts: page.items.iter().map(BlogCardView::from).collect(),
        current_page: page.page,
        total_pages: page.total_pages,
        has_previous: page.has_previous(),
        has_next: page.has_next(),
    })
}

/// Display a single post by slug.
///
/// # Errors
///
/// Returns 404 if the post doesn't exist or is unpublished.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let blog = state.backend().get_blog(&slug).await?;
    if !blog.published {
        return Err(crate::error::AppError::NotFound(format!("blog {slug}")));
    }

    let recent_posts = state
        .backend()
        .list_blogs(1)
        .await
        .map(|page| {
            page.items
                .iter()
                .filter(|b| b.handle() != blog.handle())
                .take(RECENT_POSTS_COUNT)
                .map(BlogCardView::from)
                .collect()
        })
        .unwrap_or_default();

    Ok(BlogShowTemplate {
        post: PostView::from(&blog),
        recent_posts,
    })
}
