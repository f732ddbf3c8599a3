//! Shared application state for all routes.

use crate::app_config::ConfigStore;
use crate::report::ReportService;
use crate::settings::RunMode;
use crate::store::EntityStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub reports: Arc<dyn ReportService>,
    pub config: Arc<ConfigStore>,
    /// Gates `POST /v1/generic/clear`.
    pub run_mode: RunMode,
}
