//! Shared harness: full router over an in-memory store and a recording report service.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use report_backend::settings::{RunMode, DEFAULT_BODY_LIMIT};
use report_backend::{build_router, AppError, AppState, ConfigStore, MemoryStore, RecordId, ReportService};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

#[derive(Default)]
pub struct RecordingReports {
    pub removed: Mutex<Vec<RecordId>>,
}

#[async_trait]
impl ReportService for RecordingReports {
    async fn remove(&self, id: RecordId) -> Result<(), AppError> {
        self.removed.lock().unwrap().push(id);
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub reports: Arc<RecordingReports>,
}

impl TestApp {
    pub fn new(mode: &str) -> Self {
        Self::with_body_limit(mode, DEFAULT_BODY_LIMIT)
    }

    pub fn with_body_limit(mode: &str, body_limit: usize) -> Self {
        let store = MemoryStore::new();
        let reports = Arc::new(RecordingReports::default());
        let state = AppState {
            store: Arc::new(store.clone()),
            reports: reports.clone(),
            config: Arc::new(ConfigStore::default()),
            run_mode: RunMode::new(mode),
        };
        TestApp {
            router: build_router(state, body_limit),
            store,
            reports,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }

    pub async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
        self.send(request(method, uri, body)).await
    }
}

pub fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(v) => {
            let text = v.to_string();
            builder
                .header("content-type", "application/json")
                .header("content-length", text.len())
                .body(Body::from(text))
                .unwrap()
        }
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_bytes(res: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap().to_vec()
}

pub async fn body_json(res: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(res).await).unwrap()
}

pub async fn body_text(res: Response<Body>) -> String {
    String::from_utf8(body_bytes(res).await).unwrap()
}
