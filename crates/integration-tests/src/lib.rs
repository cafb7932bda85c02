//! Integration tests for Knotwork.
//!
//! Each test starts two servers on ephemeral ports: a fake REST backend that
//! counts the calls it receives, and the real admin app pointed at it. The
//! tests then drive the admin app over HTTP the way a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p knotwork-integration-tests
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use knotwork_admin::config::AdminConfig;
use knotwork_admin::state::AppState;
use serde_json::json;
use tokio::net::TcpListener;
use url::Url;

/// Email the fake backend accepts for staff login.
pub const STAFF_EMAIL: &str = "ops@knotwork.example";

/// How the fake backend answers create calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationReply {
    /// 201 with the saved record.
    Created,
    /// 401 with an empty body, as for an expired token.
    Unauthorized,
}

#[derive(Debug)]
struct FakeBackend {
    reply: MutationReply,
    mutations: AtomicUsize,
    uploads: AtomicUsize,
}

/// A running admin app wired to a fake backend.
pub struct TestContext {
    pub client: reqwest::Client,
    pub admin_url: String,
    backend: Arc<FakeBackend>,
}

impl TestContext {
    /// Start both servers.
    ///
    /// # Panics
    ///
    /// Panics if a listener cannot be bound.
    pub async fn start(reply: MutationReply) -> Self {
        let backend = Arc::new(FakeBackend {
            reply,
            mutations: AtomicUsize::new(0),
            uploads: AtomicUsize::new(0),
        });
        let backend_addr = serve(fake_backend(Arc::clone(&backend))).await;
        let backend_url = Url::parse(&format!("http://{backend_addr}"))
            .unwrap_or_else(|e| panic!("fake backend url: {e}"));

        let state = AppState::new(AdminConfig::for_backend(backend_url))
            .unwrap_or_else(|e| panic!("admin state: {e}"));
        let admin_addr = serve(knotwork_admin::app(state)).await;

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_else(|e| panic!("http client: {e}"));

        Self {
            client,
            admin_url: format!("http://{admin_addr}"),
            backend,
        }
    }

    /// Absolute admin URL for a path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.admin_url)
    }

    /// Sign in through the login form; the session cookie stays in the client.
    ///
    /// # Panics
    ///
    /// Panics if the login does not redirect to the dashboard.
    pub async fn sign_in(&self) {
        let response = self
            .client
            .post(self.url("/login"))
            .form(&[("email", STAFF_EMAIL), ("password", "correct horse")])
            .send()
            .await
            .unwrap_or_else(|e| panic!("login request: {e}"));
        assert_eq!(response.status(), reqwest::StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/"));
    }

    /// Create/update calls the backend has received.
    #[must_use]
    pub fn mutation_hits(&self) -> usize {
        self.backend.mutations.load(Ordering::SeqCst)
    }

    /// Spreadsheet imports the backend has received.
    #[must_use]
    pub fn upload_hits(&self) -> usize {
        self.backend.uploads.load(Ordering::SeqCst)
    }
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &reqwest::Response) -> Option<&str> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|e| panic!("bind: {e}"));
    let addr = listener
        .local_addr()
        .unwrap_or_else(|e| panic!("local addr: {e}"));
    tokio::spawn(async move { axum::serve(listener, app).await });
    addr
}

fn fake_backend(state: Arc<FakeBackend>) -> Router {
    Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .route("/auth/admin/login", post(login))
        .route("/collections", get(|| async { Json(json!([])) }))
        .route("/products", post(create_product))
        .route("/blogs", post(create_blog))
        .route("/portfolios", post(create_portfolio))
        .route("/products/bulk-upload", post(bulk_upload))
        .with_state(state)
}

async fn login() -> Json<serde_json::Value> {
    Json(json!({
        "accessToken": "staff-token",
        "admin": { "_id": "a1", "name": "Ops", "email": STAFF_EMAIL, "role": "admin" }
    }))
}

fn mutation(state: &FakeBackend, record: serde_json::Value) -> Response {
    state.mutations.fetch_add(1, Ordering::SeqCst);
    match state.reply {
        MutationReply::Created => (StatusCode::CREATED, Json(record)).into_response(),
        MutationReply::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn create_product(State(state): State<Arc<FakeBackend>>) -> Response {
    mutation(&state, json!({ "_id": "p1", "name": "Kilim Runner", "price": 420 }))
}

async fn create_blog(State(state): State<Arc<FakeBackend>>) -> Response {
    mutation(&state, json!({ "_id": "b1", "title": "Caring for wool" }))
}

async fn create_portfolio(State(state): State<Arc<FakeBackend>>) -> Response {
    mutation(&state, json!({ "_id": "f1", "title": "Hillside lodge" }))
}

async fn bulk_upload(State(state): State<Arc<FakeBackend>>) -> Json<serde_json::Value> {
    state.uploads.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "created": 2,
        "updated": 1,
        "failed": 1,
        "errors": [{ "row": 4, "message": "Price is required" }]
    }))
}
