//! Response helpers shared by the handlers.

use axum::{
    http::{header::HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

/// Total number of matching records for a list request; the body stays a bare array.
pub const TOTAL_HEADER: HeaderName = HeaderName::from_static("x-total");

pub fn with_total(items: Vec<Value>, total: u64) -> Response {
    let mut res = Json(items).into_response();
    res.headers_mut().insert(TOTAL_HEADER, HeaderValue::from(total));
    res
}

/// `{}` body returned by writes that have nothing to report.
pub fn empty_object() -> Json<Value> {
    Json(Value::Object(serde_json::Map::new()))
}
