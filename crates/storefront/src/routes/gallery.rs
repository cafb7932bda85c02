//! Portfolio and video gallery handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use knotwork_core::models::{PortfolioItem, Video};
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::state::AppState;

#[derive(Clone)]
pub struct PortfolioView {
    pub title: String,
    pub description: String,
    pub images: Vec<String>,
    pub caption: Option<String>,
}

impl From<&PortfolioItem> for PortfolioView {
    fn from(item: &PortfolioItem) -> Self {
        let caption = match (&item.location, item.year) {
            (Some(location), Some(year)) => Some(format!("{location}, {year}")),
            (Some(location), None) => Some(location.clone()),
            (None, Some(year)) => Some(year.to_string()),
            (None, None) => None,
        };
        Self {
            title: item.title.clone(),
            description: item.description.clone(),
            images: item.images.clone(),
            caption,
        }
    }
}

#[derive(Clone)]
pub struct VideoView {
    pub title: String,
    pub description: String,
    pub src: String,
    /// Player page (iframe) rather than a direct media file.
    pub is_embed: bool,
    pub thumbnail: Option<String>,
}

impl From<&Video> for VideoView {
    fn from(video: &Video) -> Self {
        let src = video.embed_url();
        Self {
            title: video.title.clone(),
            description: video.description.clone(),
            is_embed: src.contains("youtube.com/embed") || src.contains("player.vimeo.com"),
            src,
            thumbnail: video.thumbnail.clone(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "portfolio.html")]
pub struct PortfolioTemplate {
    pub items: Vec<PortfolioView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "videos.html")]
pub struct VideosTemplate {
    pub videos: Vec<VideoView>,
}

/// Display the portfolio gallery.
#[instrument(skip(state))]
pub async fn portfolio(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let items = state.backend().list_portfolio().await?;
    Ok(PortfolioTemplate {
        items: items.iter().map(PortfolioView::from).collect(),
    })
}

/// Display the video gallery.
#[instrument(skip(state))]
pub async fn videos(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let videos = state.backend().list_videos().await?;
    Ok(VideosTemplate {
        videos: videos.iter().map(VideoView::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portfolio_caption() {
        let item = PortfolioItem {
            location: Some("Brooklyn loft".to_string()),
            year: Some(2024),
            ..PortfolioItem::default()
        };
        assert_eq!(
            PortfolioView::from(&item).caption.as_deref(),
            Some("Brooklyn loft, 2024")
        );
        assert_eq!(PortfolioView::from(&PortfolioItem::default()).caption, None);
    }

    #[test]
    fn test_video_embed_detection() {
        let youtube = Video {
            video_url: "https://youtu.be/abc".to_string(),
            ..Video::default()
        };
        let file = Video {
            video_url: "https://cdn.example.com/weaving.mp4".to_string(),
            ..Video::default()
        };
        assert!(VideoView::from(&youtube).is_embed);
        assert!(!VideoView::from(&file).is_embed);
    }
}
