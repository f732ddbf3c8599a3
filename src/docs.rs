//! OpenAPI document served at `/docs/openapi.json`.

use crate::app_config::AppConfig;
use crate::handlers::{app, generic};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "Api", description = "Generic CRUD API for reports", version = "0.0.1"),
    paths(
        app::hello,
        app::get_config,
        app::set_config,
        generic::load_samples_handler,
        generic::clear,
        generic::list,
        generic::read,
        generic::create,
        generic::update,
        generic::delete,
    ),
    components(schemas(AppConfig))
)]
pub struct ApiDoc;
