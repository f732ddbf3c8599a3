//! Server: reads settings, connects to PostgreSQL, creates missing tables, serves the API.

use report_backend::{build_router, AppState, ConfigStore, EntityStore, PgReportService, PgStore, Settings};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("report_backend=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.database_url)
        .await?;

    let store = PgStore::new(pool.clone());
    store.synchronize().await?;

    let config = match &settings.config_path {
        Some(path) => ConfigStore::load(path.clone()).await?,
        None => ConfigStore::default(),
    };

    let state = AppState {
        store: Arc::new(store),
        reports: Arc::new(PgReportService::new(pool)),
        config: Arc::new(config),
        run_mode: settings.run_mode.clone(),
    };
    let app = build_router(state, settings.body_limit);

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!(mode = settings.run_mode.as_str(), "listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
