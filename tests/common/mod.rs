#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use rust_decimal::Decimal;
use serde_json::Value;
use stockroom_api::{
    config::AppConfig,
    db::{self, DbConfig},
    events,
    services::{
        master_data::{CreateDepartmentInput, CreateEmployeeInput, EmployeeDetail},
        products::{CreateProductInput, ProductWithSerials, DEFAULT_UNIT},
    },
    AppState,
};
use tokio::sync::mpsc;
use tower::ServiceExt;

pub const IT: &str = "ไอที/อิเล็กทรอนิกส์ (IT)";
pub const FR: &str = "เฟอร์นิเจอร์ (FR)";

/// Application state and router over a fresh in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.cors_allow_any_origin = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        // One connection keeps every query on the same in-memory database
        let pool = db::establish_connection_with_config(&DbConfig {
            url: cfg.database_url.clone(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        })
        .await
        .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = events::EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(Arc::new(pool), cfg, event_sender);
        let router = stockroom_api::build_router(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.request_with_headers(method, uri, body, &[]).await
    }

    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn post_csv(&self, uri: &str, csv: &str) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "text/csv")
            .body(Body::from(csv.to_string()))
            .expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn seed_product(&self, name: &str, category: &str, quantity: i32) -> ProductWithSerials {
        self.state
            .services
            .products
            .create_product(product_input(name, category, quantity), Some("seed@example.com"))
            .await
            .expect("seed product for tests")
    }

    pub async fn seed_employee(&self, emp_code: &str) -> EmployeeDetail {
        self.state
            .services
            .master_data
            .create_employee(
                CreateEmployeeInput {
                    emp_code: emp_code.to_string(),
                    name: format!("Employee {}", emp_code),
                    nickname: None,
                    gender: None,
                    image_url: None,
                    email: Some(format!("{}@example.com", emp_code.to_lowercase())),
                    location: None,
                    tel: None,
                    department_id: None,
                },
                None,
            )
            .await
            .expect("seed employee for tests")
    }

    pub async fn seed_department(&self, name: &str) -> stockroom_api::entities::department::Model {
        self.state
            .services
            .master_data
            .create_department(CreateDepartmentInput {
                name: name.to_string(),
            })
            .await
            .expect("seed department for tests")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub fn product_input(name: &str, category: &str, quantity: i32) -> CreateProductInput {
    CreateProductInput {
        p_id: None,
        name: name.to_string(),
        category: category.to_string(),
        brand: None,
        model: None,
        price: Decimal::new(1_000, 0),
        unit: DEFAULT_UNIT.to_string(),
        quantity,
        description: None,
        notes: None,
        image_url: None,
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
