//! Route tables and the assembled application router.

pub mod app;
pub mod common;
pub mod generic;

pub use app::app_routes;
pub use common::common_routes;
pub use generic::generic_routes;

use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, extract::Request, Router};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Every route with body limit and per-request tracing span.
pub fn build_router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .nest("/v1/app", app_routes(state.clone()))
        .nest("/v1/generic", generic_routes(state))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
            tracing::info_span!(
                "request",
                id = %uuid::Uuid::new_v4(),
                method = %req.method(),
                uri = %req.uri(),
            )
        }))
}
