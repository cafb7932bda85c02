//! Blog post route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use knotwork_core::models::Blog;
use knotwork_core::types::BlogId;
use knotwork_core::validation::FieldErrors;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::{BlogInput, FileUpload};
use crate::error::Result;
use crate::filters;
use crate::middleware::auth::RequireAdminAuth;
use crate::models::CurrentAdmin;
use crate::state::AppState;

use super::dashboard::AdminUserView;
use super::forms::{
    MultipartForm, action_failed, failure_alert, failure_status, set_flash, take_flash,
};

/// Split a comma-separated tag field, dropping blanks and duplicates.
#[must_use]
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Blog table row.
#[derive(Debug, Clone)]
pub struct BlogRowView {
    pub id: String,
    pub title: String,
    pub author: String,
    pub tags: String,
    pub published: bool,
    pub published_at: String,
}

impl From<&Blog> for BlogRowView {
    fn from(blog: &Blog) -> Self {
        Self {
            id: blog.id.to_string(),
            title: blog.title.clone(),
            author: blog.author.clone().unwrap_or_default(),
            tags: blog.tags.join(", "),
            published: blog.published,
            published_at: blog
                .published_at
                .map(|d| d.format("%b %-d, %Y").to_string())
                .unwrap_or_default(),
        }
    }
}

/// Blog form fields.
#[derive(Debug, Clone, Default)]
pub struct BlogForm {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub author: String,
    pub tags: String,
    pub published: bool,
    pub current_image: Option<String>,
}

impl BlogForm {
    fn from_multipart(form: &MultipartForm) -> Self {
        Self {
            title: form.text("title"),
            excerpt: form.text("excerpt"),
            content: form.text("content"),
            author: form.text("author"),
            tags: form.text("tags"),
            published: form.checked("published"),
            current_image: Some(form.text("current_image")).filter(|s| !s.is_empty()),
        }
    }

    fn from_blog(blog: Blog) -> Self {
        Self {
            title: blog.title,
            excerpt: blog.excerpt,
            content: blog.content,
            author: blog.author.unwrap_or_default(),
            tags: blog.tags.join(", "),
            published: blog.published,
            current_image: blog.cover_image,
        }
    }

    /// # Errors
    ///
    /// Returns every field that failed validation.
    pub fn validate(
        &self,
        cover_image: Option<FileUpload>,
    ) -> std::result::Result<BlogInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        errors
            .require("title", "Title", &self.title)
            .length("title", "Title", &self.title, 3, 200)
            .length("excerpt", "Excerpt", &self.excerpt, 0, 500)
            .require("content", "Content", &self.content)
            .length("author", "Author", &self.author, 0, 100);
        if let Some(image) = &cover_image {
            errors.images("cover_image", [&image.meta()]);
        }
        errors.into_result()?;

        Ok(BlogInput {
            title: self.title.trim().to_string(),
            excerpt: self.excerpt.trim().to_string(),
            content: self.content.clone(),
            author: self.author.trim().to_string(),
            tags: parse_tags(&self.tags),
            published: self.published,
            cover_image,
        })
    }
}

/// Blog list template.
#[derive(Template, WebTemplate)]
#[template(path = "blogs/index.html")]
pub struct BlogsIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub blogs: Vec<BlogRowView>,
}

/// Blog create/edit template.
#[derive(Template, WebTemplate)]
#[template(path = "blogs/form.html")]
pub struct BlogFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub heading: String,
    pub action: String,
    pub form: BlogForm,
    pub errors: FieldErrors,
    pub alert: Option<String>,
}

impl BlogFormTemplate {
    fn new(
        admin: &CurrentAdmin,
        id: Option<&BlogId>,
        form: BlogForm,
        errors: FieldErrors,
        alert: Option<String>,
    ) -> Self {
        let (heading, action) = match id {
            Some(id) => ("Edit post".to_string(), format!("/blogs/{id}")),
            None => ("New post".to_string(), "/blogs".to_string()),
        };
        Self {
            admin_user: AdminUserView::from(admin),
            current_path: "/blogs".to_string(),
            heading,
            action,
            form,
            errors,
            alert,
        }
    }
}

/// GET /blogs
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<BlogsIndexTemplate> {
    let blogs = state.backend().list_blogs(&admin.token).await?;
    Ok(BlogsIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/blogs".to_string(),
        flash: take_flash(&session).await,
        blogs: blogs.iter().map(BlogRowView::from).collect(),
    })
}

/// GET /blogs/new
pub async fn new(RequireAdminAuth(admin): RequireAdminAuth) -> BlogFormTemplate {
    BlogFormTemplate::new(&admin, None, BlogForm::default(), FieldErrors::new(), None)
}

/// GET /blogs/{id}/edit
#[instrument(skip(admin, state))]
pub async fn edit(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<BlogFormTemplate> {
    let id = BlogId::new(id);
    let blog = state.backend().get_blog(&admin.token, &id).await?;
    Ok(BlogFormTemplate::new(
        &admin,
        Some(&id),
        BlogForm::from_blog(blog),
        FieldErrors::new(),
        None,
    ))
}

/// POST /blogs
#[instrument(skip(admin, state, session, multipart))]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Response> {
    save(&admin, &state, &session, None, multipart).await
}

/// POST /blogs/{id}
#[instrument(skip(admin, state, session, multipart))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response> {
    save(&admin, &state, &session, Some(BlogId::new(id)), multipart).await
}

async fn save(
    admin: &CurrentAdmin,
    state: &AppState,
    session: &Session,
    id: Option<BlogId>,
    multipart: Multipart,
) -> Result<Response> {
    let body = MultipartForm::read(multipart).await?;
    let form = BlogForm::from_multipart(&body);

    let input = match form.validate(body.file("cover_image")) {
        Ok(input) => input,
        Err(errors) => {
            let page = BlogFormTemplate::new(admin, id.as_ref(), form, errors, None);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let backend = state.backend();
    let result = match &id {
        Some(id) => backend.update_blog(&admin.token, id, input).await,
        None => backend.create_blog(&admin.token, input).await,
    };

    match result {
        Ok(blog) => {
            tracing::info!(blog_id = %blog.id, published = blog.published, "Blog post saved");
            set_flash(session, &format!("\"{}\" saved.", blog.title)).await;
            Ok(Redirect::to("/blogs").into_response())
        }
        Err(e) => {
            let alert = failure_alert(session, &e).await;
            let page = BlogFormTemplate::new(
                admin,
                id.as_ref(),
                form,
                FieldErrors::new(),
                Some(alert),
            );
            Ok((failure_status(&e), page).into_response())
        }
    }
}

/// POST /blogs/{id}/delete
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Response {
    let id = BlogId::new(id);
    match state.backend().delete_blog(&admin.token, &id).await {
        Ok(()) => {
            tracing::info!(blog_id = %id, "Blog post deleted");
            set_flash(&session, "Post deleted.").await;
            Redirect::to("/blogs").into_response()
        }
        Err(e) => action_failed(&admin, &session, &e, "/blogs").await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tags(" wool, dye ,, Wool,weaving "), vec!["wool", "dye", "weaving"]);
        assert!(parse_tags("  ").is_empty());
    }

    #[test]
    fn test_validate_empty_title() {
        let form = BlogForm {
            content: "<p>Body</p>".to_string(),
            ..BlogForm::default()
        };
        let errors = form.validate(None).unwrap_err();
        assert_eq!(errors.get("title"), Some("Title is required."));
        assert!(!errors.has("content"));
    }

    #[test]
    fn test_validate_builds_input() {
        let form = BlogForm {
            title: "Natural dyes".to_string(),
            content: "<p>Madder root</p>".to_string(),
            tags: "dye, madder".to_string(),
            published: true,
            ..BlogForm::default()
        };
        let input = form.validate(None).unwrap();
        assert_eq!(input.tags, vec!["dye", "madder"]);
        assert!(input.published);
        assert!(input.cover_image.is_none());
    }
}
