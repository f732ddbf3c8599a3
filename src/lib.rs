//! Report backend: generic REST CRUD over a closed set of report entities.

pub mod app_config;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod query;
pub mod registry;
pub mod report;
pub mod response;
pub mod routes;
pub mod samples;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;

pub use app_config::{AppConfig, ConfigStore};
pub use error::{AppError, SettingsError};
pub use query::{translate, ListParams, QueryRequest};
pub use registry::EntityKind;
pub use report::{PgReportService, ReportService};
pub use routes::build_router;
pub use service::CrudService;
pub use settings::Settings;
pub use state::AppState;
pub use store::{EntityStore, MemoryStore, PgStore, RecordId};
