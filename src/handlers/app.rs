//! `/v1/app` handlers: greeting and application config.

use crate::app_config::AppConfig;
use crate::error::AppError;
use crate::response::empty_object;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    Json,
};

#[utoipa::path(get, path = "/v1/app", responses((status = 200, description = "Greeting", body = String)))]
pub async fn hello() -> &'static str {
    "Hello World!"
}

fn etag(version: u64) -> HeaderValue {
    HeaderValue::from_str(&format!("\"{}\"", version)).unwrap_or(HeaderValue::from_static("\"0\""))
}

/// Version named by an `If-Match` header (`"3"` or `W/"3"`). `None` when absent or `*`.
fn if_match_version(headers: &HeaderMap) -> Result<Option<u64>, AppError> {
    let Some(raw) = headers.get(header::IF_MATCH) else {
        return Ok(None);
    };
    let raw = raw
        .to_str()
        .map_err(|_| AppError::BadRequest("If-Match is not valid text".into()))?
        .trim();
    if raw == "*" {
        return Ok(None);
    }
    let tag = raw.strip_prefix("W/").unwrap_or(raw).trim_matches('"');
    tag.parse()
        .map(Some)
        .map_err(|_| AppError::PreconditionFailed(format!("unknown config version {}", raw)))
}

#[utoipa::path(
    get,
    path = "/v1/app/config",
    operation_id = "getConfig",
    responses((status = 200, description = "Current config; ETag carries its version", body = AppConfig))
)]
pub async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    let current = state.config.get().await;
    ([(header::ETAG, etag(current.version))], Json(current.config))
}

#[utoipa::path(
    put,
    path = "/v1/app/config",
    operation_id = "setConfig",
    request_body = AppConfig,
    responses(
        (status = 200, description = "Config replaced"),
        (status = 412, description = "If-Match does not name the current version")
    )
)]
pub async fn set_config(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(config): Json<AppConfig>,
) -> Result<impl IntoResponse, AppError> {
    let version = match if_match_version(&headers)? {
        Some(expected) => state.config.replace_if(expected, config).await?,
        None => state.config.replace(config).await?,
    };
    tracing::info!(version, "app config replaced");
    Ok(([(header::ETAG, etag(version))], empty_object()))
}
