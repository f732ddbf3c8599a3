//! Generic entity routes. `:entity` is resolved against the registry inside the handlers;
//! report deletion is dispatched there too, so no route depends on declaration order.

use crate::handlers::generic::{clear, create, delete, list, load_samples_handler, read, update};
use crate::state::AppState;
use axum::{routing::get, routing::post, Router};

pub fn generic_routes(state: AppState) -> Router {
    Router::new()
        .route("/load-samples", post(load_samples_handler))
        .route("/clear", post(clear))
        .route("/:entity", get(list).post(create))
        .route("/:entity/:id", get(read).patch(update).delete(delete))
        .with_state(state)
}
