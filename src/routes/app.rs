//! App routes: greeting and config.

use crate::handlers::app::{get_config, hello, set_config};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn app_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/config", get(get_config).put(set_config))
        .with_state(state)
}
