//! Editorial content: blog posts, portfolio pieces and videos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{BlogId, PortfolioId, VideoId};

/// A blog post. `content` is HTML authored in the back-office.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    #[serde(alias = "_id")]
    pub id: BlogId,
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, alias = "image")]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_true")]
    pub published: bool,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

const fn default_true() -> bool {
    true
}

impl Blog {
    /// Slug if present, otherwise the id.
    #[must_use]
    pub fn handle(&self) -> &str {
        if self.slug.is_empty() {
            self.id.as_str()
        } else {
            &self.slug
        }
    }

    /// Excerpt, or the first 160 characters of the text content.
    #[must_use]
    pub fn summary(&self) -> String {
        if !self.excerpt.trim().is_empty() {
            return self.excerpt.clone();
        }
        let text = strip_tags(&self.content);
        let mut summary: String = text.chars().take(160).collect();
        if text.chars().count() > 160 {
            summary.push('…');
        }
        summary
    }
}

/// Remove HTML tags and collapse whitespace.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A finished commission shown in the portfolio.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItem {
    #[serde(alias = "_id")]
    pub id: PortfolioId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
}

/// A video in the gallery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(alias = "_id")]
    pub id: VideoId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "url")]
    pub video_url: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub position: i32,
}

impl Video {
    /// Embed URL for YouTube links; other URLs pass through.
    #[must_use]
    pub fn embed_url(&self) -> String {
        let url = self.video_url.trim();
        if let Some(id) = url.split("youtu.be/").nth(1) {
            let id = id.split(['?', '&']).next().unwrap_or(id);
            return format!("https://www.youtube.com/embed/{id}");
        }
        if url.contains("youtube.com/watch")
            && let Some(id) = url.split("v=").nth(1)
        {
            return format!("https://www.youtube.com/embed/{}", id.split('&').next().unwrap_or(id));
        }
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_prefers_excerpt() {
        let blog = Blog {
            excerpt: "Caring for wool".to_string(),
            content: "<p>ignored</p>".to_string(),
            ..Blog::default()
        };
        assert_eq!(blog.summary(), "Caring for wool");
    }

    #[test]
    fn test_summary_strips_html() {
        let blog = Blog {
            content: "<h2>Knots</h2><p>Persian   and Turkish</p>".to_string(),
            ..Blog::default()
        };
        assert_eq!(blog.summary(), "Knots Persian and Turkish");
    }

    #[test]
    fn test_embed_url() {
        let video = |url: &str| Video {
            video_url: url.to_string(),
            ..Video::default()
        };
        assert_eq!(
            video("https://youtu.be/abc123?t=5").embed_url(),
            "https://www.youtube.com/embed/abc123"
        );
        assert_eq!(
            video("https://www.youtube.com/watch?v=xyz&list=1").embed_url(),
            "https://www.youtube.com/embed/xyz"
        );
        assert_eq!(
            video("https://cdn.example/loom.mp4").embed_url(),
            "https://cdn.example/loom.mp4"
        );
    }
}
