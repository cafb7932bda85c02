//! Back-office form submissions against a fake backend.
//!
//! Run with: cargo test -p knotwork-integration-tests

#![allow(clippy::unwrap_used)]

use knotwork_core::error_message::status_message;
use knotwork_integration_tests::{MutationReply, TestContext, location};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};

fn blog_form(title: &str) -> Form {
    Form::new()
        .text("title", title.to_string())
        .text("excerpt", "")
        .text("content", "Beat rugs outside twice a year and rotate them often.")
        .text("author", "Mira")
        .text("tags", "care, wool")
        .text("published", "on")
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_blank_blog_title_never_reaches_backend() {
    let ctx = TestContext::start(MutationReply::Created).await;
    ctx.sign_in().await;

    let response = ctx
        .client
        .post(ctx.url("/blogs"))
        .multipart(blog_form("   "))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.text().await.unwrap();
    assert!(body.contains("Title is required."));
    assert!(body.contains("Beat rugs outside twice a year"), "typed content is kept");
    assert_eq!(ctx.mutation_hits(), 0);
}

#[tokio::test]
async fn test_blank_product_name_never_reaches_backend() {
    let ctx = TestContext::start(MutationReply::Created).await;
    ctx.sign_in().await;

    let form = Form::new()
        .text("name", "")
        .text("description", "Hand-knotted wool runner.")
        .text("price", "420")
        .text("status", "active")
        .text("collection_option", "c1|Runners")
        .text("variants[0].id", "v1")
        .text("variants[0].color", "Indigo")
        .text("variants[0].sizes[0].id", "s1")
        .text("variants[0].sizes[0].label", "2x8 ft")
        .text("variants[0].sizes[0].stock", "3");

    let response = ctx
        .client
        .post(ctx.url("/products"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.text().await.unwrap();
    assert!(body.contains("Name is required."));
    assert!(body.contains("Runners"), "collection options survive the re-render");
    assert!(body.contains(r#"name="variants[0].id" value="v1""#));
    assert!(body.contains(r#"name="variants[0].sizes[0].id" value="s1""#));
    assert_eq!(ctx.mutation_hits(), 0);
}

#[tokio::test]
async fn test_blank_portfolio_title_never_reaches_backend() {
    let ctx = TestContext::start(MutationReply::Created).await;
    ctx.sign_in().await;

    let form = Form::new()
        .text("title", "")
        .text("description", "A lodge floor in undyed wool.")
        .text("year", "2024");

    let response = ctx
        .client
        .post(ctx.url("/portfolios"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.text().await.unwrap().contains("Title is required."));
    assert_eq!(ctx.mutation_hits(), 0);
}

// ============================================================================
// Saving
// ============================================================================

#[tokio::test]
async fn test_valid_blog_is_saved_once() {
    let ctx = TestContext::start(MutationReply::Created).await;
    ctx.sign_in().await;

    let response = ctx
        .client
        .post(ctx.url("/blogs"))
        .multipart(blog_form("Caring for wool"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/blogs"));
    assert_eq!(ctx.mutation_hits(), 1);
}

#[tokio::test]
async fn test_expired_token_signs_out_without_retry() {
    let ctx = TestContext::start(MutationReply::Unauthorized).await;
    ctx.sign_in().await;

    let response = ctx
        .client
        .post(ctx.url("/blogs"))
        .multipart(blog_form("Caring for wool"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.text().await.unwrap().contains(status_message(401)));
    assert_eq!(ctx.mutation_hits(), 1);

    // The session was cleared, so the next page load goes to login.
    let response = ctx.client.get(ctx.url("/blogs")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));
}

#[tokio::test]
async fn test_signed_out_post_is_redirected() {
    let ctx = TestContext::start(MutationReply::Created).await;

    let response = ctx
        .client
        .post(ctx.url("/blogs"))
        .multipart(blog_form("Caring for wool"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));
    assert_eq!(ctx.mutation_hits(), 0);
}

// ============================================================================
// Spreadsheet import
// ============================================================================

#[tokio::test]
async fn test_bulk_upload_shows_summary() {
    let ctx = TestContext::start(MutationReply::Created).await;
    ctx.sign_in().await;

    let part = Part::bytes(b"PK\x03\x04workbook".to_vec()).file_name("catalog.xlsx");
    let response = ctx
        .client
        .post(ctx.url("/products/upload"))
        .multipart(Form::new().part("file", part))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("<strong>2</strong> created"));
    assert!(body.contains("<strong>1</strong> updated"));
    assert!(body.contains("<strong>1</strong> failed"));
    assert!(body.contains("Row 4: Price is required"));
    assert_eq!(ctx.upload_hits(), 1);
}

#[tokio::test]
async fn test_bulk_upload_rejects_csv() {
    let ctx = TestContext::start(MutationReply::Created).await;
    ctx.sign_in().await;

    let part = Part::bytes(b"name,price\nKilim,420\n".to_vec()).file_name("catalog.csv");
    let response = ctx
        .client
        .post(ctx.url("/products/upload"))
        .multipart(Form::new().part("file", part))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        response
            .text()
            .await
            .unwrap()
            .contains("Only .xlsx spreadsheets are supported.")
    );
    assert_eq!(ctx.upload_hits(), 0);
}
