//! Test fixtures and helpers for integration testing

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use green_room::metrics::MetricsCollector;
use green_room::results::ResultAggregator;
use green_room::room::RoomEngine;
use green_room::service::{router, ApiContext};
use green_room::store::InMemoryRoomStore;
use green_room::types::UserId;
use green_room::user::UserDirectory;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// A complete in-process system: engine components plus the HTTP router
pub struct TestSystem {
    pub directory: Arc<UserDirectory>,
    pub engine: RoomEngine,
    pub aggregator: Arc<ResultAggregator>,
    pub router: Router,
}

impl TestSystem {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryRoomStore::new());
        let metrics = Arc::new(MetricsCollector::new().unwrap());

        let directory = Arc::new(UserDirectory::new(store.clone()));
        let engine = RoomEngine::with_metrics(store.clone(), metrics.clone());
        let aggregator = Arc::new(ResultAggregator::new(store.clone()));

        let context = ApiContext {
            directory: directory.clone(),
            engine: engine.clone(),
            results: aggregator.clone(),
            metrics,
        };

        Self {
            directory,
            engine,
            aggregator,
            router: router(context),
        }
    }

    /// Register a user directly through the directory
    pub fn user(&self, name: &str) -> (String, UserId) {
        let token = self.directory.create(name, 1000).unwrap();
        let id = self.directory.resolve(&token).unwrap().unwrap().id;
        (token, id)
    }

    /// POST a JSON body, optionally authenticated
    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = builder.body(Body::from(body.to_string())).unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        read_json(response).await
    }

    /// GET a path, optionally authenticated
    pub async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("GET").uri(path);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = builder.body(Body::empty()).unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        read_json(response).await
    }
}

impl Default for TestSystem {
    fn default() -> Self {
        Self::new()
    }
}

async fn read_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    (status, value)
}
