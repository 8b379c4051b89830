#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    Router,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use minimarket_pos::{
    config::AppConfig,
    db,
    entities::{category, client, product},
    services::{
        categories::CategoryInput, clients::ClientInput, products::ProductInput,
    },
    AppState,
};

/// Helper harness for spinning up an application backed by a throwaway SQLite file.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _db_dir: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Same as [`TestApp::new`], letting the caller tweak the configuration first.
    pub async fn with_config(customize: impl FnOnce(&mut AppConfig)) -> Self {
        let db_dir = tempfile::tempdir().expect("failed to create temp dir");
        let db_path = db_dir.path().join("pos_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        customize(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = minimarket_pos::build_router(state.clone());

        Self {
            router,
            state,
            _db_dir: db_dir,
        }
    }

    /// Send a request against the full router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn seed_category(&self, name: &str) -> category::Model {
        self.state
            .services
            .categories
            .create(CategoryInput {
                name: name.to_string(),
                description: None,
            })
            .await
            .expect("seed category for tests")
    }

    pub async fn seed_product(
        &self,
        category_id: i32,
        name: &str,
        price: Decimal,
        stock: i32,
    ) -> product::Model {
        self.state
            .services
            .products
            .create(ProductInput {
                name: name.to_string(),
                description: None,
                brand: None,
                price,
                stock,
                category_id,
                status: None,
            })
            .await
            .expect("seed product for tests")
    }

    pub async fn seed_client(&self, business_name: &str, tax_document: &str) -> client::Model {
        self.state
            .services
            .clients
            .create(ClientInput {
                business_name: business_name.to_string(),
                email: None,
                address: None,
                tax_document: tax_document.to_string(),
                status: None,
            })
            .await
            .expect("seed client for tests")
    }

    pub async fn stock_of(&self, product_id: i32) -> i32 {
        self.state
            .services
            .products
            .get(product_id)
            .await
            .expect("product should exist")
            .stock
    }
}

/// Read a response body as JSON.
pub async fn response_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&body).expect("response body should be JSON")
}
