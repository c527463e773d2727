//! Shared helpers for API integration tests.
//!
//! Requests go straight to the router through `tower::ServiceExt::oneshot`,
//! no TCP listener involved.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use starthub_db::models::catalogue::{CreateCategory, CreateQuestion, CreateSubcategory};
use starthub_db::repositories::CatalogueRepo;
use tower::ServiceExt;

use starthub_api::auth::jwt::{generate_access_token, JwtConfig};
use starthub_api::config::ServerConfig;
use starthub_api::router::build_app_router;
use starthub_api::state::AppState;

const TEST_JWT_SECRET: &str = "test-secret-for-integration-tests";

/// Build a test `ServerConfig` with safe defaults and a short auto-save debounce.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        autosave_debounce_ms: 20,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the application state for a test database.
pub fn test_state(pool: PgPool) -> AppState {
    AppState::new(pool, test_config())
}

/// Build the full application router with the production middleware stack.
pub fn build_test_app(pool: PgPool) -> Router {
    build_app_router(test_state(pool))
}

/// Mint an access token for `user_id`.
pub fn token_for(user_id: i64) -> String {
    generate_access_token(user_id, "founder", &test_config().jwt).unwrap()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

/// GET without credentials.
pub async fn get_anonymous(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, token: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, token: &str, body: serde_json::Value) -> Response {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Read the response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Seed `categories` categories, each with one subcategory of
/// `per_category` active questions. Returns the question ids in order.
pub async fn seed_catalogue(pool: &PgPool, categories: usize, per_category: usize) -> Vec<i64> {
    let mut ids = Vec::with_capacity(categories * per_category);
    for c in 0..categories {
        let category = CatalogueRepo::create_category(
            pool,
            &CreateCategory {
                name: format!("Category {c}"),
                description: None,
                sort_order: Some(c as i32),
            },
        )
        .await
        .unwrap();
        let subcategory = CatalogueRepo::create_subcategory(
            pool,
            &CreateSubcategory {
                category_id: category.id,
                name: format!("Subcategory {c}"),
                sort_order: None,
            },
        )
        .await
        .unwrap();
        for q in 0..per_category {
            let question = CatalogueRepo::create_question(
                pool,
                &CreateQuestion {
                    subcategory_id: subcategory.id,
                    text: format!("Question {c}.{q}"),
                    weight: None,
                    sort_order: Some(q as i32),
                    is_active: None,
                },
            )
            .await
            .unwrap();
            ids.push(question.id);
        }
    }
    ids
}
