//! Generic entity handlers under `/v1/generic`: list, read, create, update, delete,
//! plus sample loading and store reset.

use crate::error::AppError;
use crate::query::ListParams;
use crate::response::{empty_object, with_total};
use crate::samples::load_samples;
use crate::service::CrudService;
use crate::state::AppState;
use crate::store::UpdateResult;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;

#[utoipa::path(
    post,
    path = "/v1/generic/load-samples",
    operation_id = "loadSamples",
    responses((status = 201, description = "Samples saved", body = String))
)]
pub async fn load_samples_handler(State(state): State<AppState>) -> Result<(StatusCode, &'static str), AppError> {
    load_samples(state.store.as_ref()).await?;
    Ok((StatusCode::CREATED, "OK"))
}

#[utoipa::path(
    post,
    path = "/v1/generic/clear",
    operation_id = "clearSamples",
    responses((status = 201, description = "`OK`, or `IGNORED in <mode>` outside development", body = String))
)]
pub async fn clear(State(state): State<AppState>) -> Result<(StatusCode, String), AppError> {
    if !state.run_mode.is_development() {
        tracing::warn!(mode = state.run_mode.as_str(), "clear ignored");
        return Ok((StatusCode::CREATED, format!("IGNORED in {}", state.run_mode.as_str())));
    }
    tracing::info!("dropping and recreating all entity tables");
    state.store.reset().await?;
    Ok((StatusCode::CREATED, "OK".to_string()))
}

#[utoipa::path(
    get,
    path = "/v1/generic/{entity}",
    operation_id = "getEntities",
    params(("entity" = String, Path, description = "Entity name"), ListParams),
    responses(
        (status = 200, description = "Matching records",
            headers(("X-Total" = String, description = "Total number of matching records"))),
        (status = 404, description = "Unknown entity")
    )
)]
pub async fn list(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let (items, total) = CrudService::list(state.store.as_ref(), &entity, &params).await?;
    Ok(with_total(items, total))
}

#[utoipa::path(
    get,
    path = "/v1/generic/{entity}/{id}",
    operation_id = "getEntity",
    params(("entity" = String, Path, description = "Entity name"), ("id" = String, Path, description = "Record id")),
    responses((status = 200, description = "The record, or null when it does not exist"))
)]
pub async fn read(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
) -> Result<Json<Option<Value>>, AppError> {
    let row = CrudService::read(state.store.as_ref(), &entity, &id).await?;
    Ok(Json(row))
}

#[utoipa::path(
    post,
    path = "/v1/generic/{entity}",
    operation_id = "createEntity",
    params(("entity" = String, Path, description = "Entity name")),
    responses((status = 201, description = "The saved record including server-assigned fields"))
)]
pub async fn create(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let row = CrudService::create(state.store.as_ref(), &entity, body).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[utoipa::path(
    patch,
    path = "/v1/generic/{entity}/{id}",
    operation_id = "updateEntity",
    params(("entity" = String, Path, description = "Entity name"), ("id" = String, Path, description = "Record id")),
    responses((status = 200, description = "Update result with the affected row count"))
)]
pub async fn update(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<UpdateResult>, AppError> {
    let result = CrudService::update(state.store.as_ref(), &entity, &id, body).await?;
    Ok(Json(result))
}

/// Reports are removed through the report service; every other kind is deleted by id.
#[utoipa::path(
    delete,
    path = "/v1/generic/{entity}/{id}",
    operation_id = "deleteEntity",
    params(("entity" = String, Path, description = "Entity name"), ("id" = String, Path, description = "Record id")),
    responses((status = 200, description = "Deleted"))
)]
pub async fn delete(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    CrudService::delete(state.store.as_ref(), state.reports.as_ref(), &entity, &id).await?;
    Ok(empty_object())
}
