//! Application configuration value and its store.
//!
//! The store is owned by [`AppState`](crate::state::AppState) and injected into handlers.
//! Writers race last-writer-wins unless they use [`ConfigStore::replace_if`], which only
//! succeeds against the version the caller read.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::RwLock;
use utoipa::ToSchema;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Use the dummy research backend instead of the real one.
    pub dummy_api: bool,
    pub llm_key: String,
    pub tavily_api_key: String,
    pub llm_preset: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Versioned {
    pub version: u64,
    pub config: AppConfig,
}

pub struct ConfigStore {
    current: RwLock<Versioned>,
    path: Option<PathBuf>,
}

impl ConfigStore {
    pub fn in_memory(config: AppConfig) -> Self {
        ConfigStore {
            current: RwLock::new(Versioned { version: 1, config }),
            path: None,
        }
    }

    /// Load from a JSON file if it exists (default value otherwise); later writes go to the file.
    pub async fn load(path: PathBuf) -> Result<Self, AppError> {
        let config = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
            Err(e) => return Err(e.into()),
        };
        tracing::info!(path = %path.display(), "app config loaded");
        Ok(ConfigStore {
            current: RwLock::new(Versioned { version: 1, config }),
            path: Some(path),
        })
    }

    pub async fn get(&self) -> Versioned {
        self.current.read().await.clone()
    }

    /// Replace the stored value. Returns the new version.
    pub async fn replace(&self, config: AppConfig) -> Result<u64, AppError> {
        let mut guard = self.current.write().await;
        self.persist(&config).await?;
        guard.version += 1;
        guard.config = config;
        Ok(guard.version)
    }

    /// Replace only if the stored version is still `expected`.
    pub async fn replace_if(&self, expected: u64, config: AppConfig) -> Result<u64, AppError> {
        let mut guard = self.current.write().await;
        if guard.version != expected {
            return Err(AppError::PreconditionFailed(format!(
                "config version is {}, not {}",
                guard.version, expected
            )));
        }
        self.persist(&config).await?;
        guard.version += 1;
        guard.config = config;
        Ok(guard.version)
    }

    async fn persist(&self, config: &AppConfig) -> Result<(), AppError> {
        if let Some(path) = &self.path {
            let bytes = serde_json::to_vec_pretty(config)?;
            tokio::fs::write(path, bytes).await?;
        }
        Ok(())
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::in_memory(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AppConfig {
        AppConfig {
            dummy_api: true,
            llm_key: "k".into(),
            tavily_api_key: "t".into(),
            llm_preset: "gpt".into(),
        }
    }

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: AppConfig = serde_json::from_str(r#"{"dummyApi":true}"#).unwrap();
        assert!(cfg.dummy_api);
        assert_eq!(cfg.llm_key, "");
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["tavilyApiKey"], "t");
    }

    #[tokio::test]
    async fn replace_fully_overwrites() {
        let store = ConfigStore::in_memory(sample());
        let v = store.replace(AppConfig::default()).await.unwrap();
        assert_eq!(v, 2);
        assert_eq!(store.get().await.config, AppConfig::default());
    }

    #[tokio::test]
    async fn replace_if_checks_version() {
        let store = ConfigStore::default();
        let read = store.get().await.version;
        store.replace_if(read, sample()).await.unwrap();
        let err = store.replace_if(read, AppConfig::default()).await.unwrap_err();
        assert!(matches!(err, AppError::PreconditionFailed(_)));
        assert_eq!(store.get().await.config, sample());
    }

    #[tokio::test]
    async fn file_backed_store_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = ConfigStore::load(path.clone()).await.unwrap();
        assert_eq!(store.get().await.config, AppConfig::default());
        store.replace(sample()).await.unwrap();

        let reloaded = ConfigStore::load(path).await.unwrap();
        assert_eq!(reloaded.get().await.config, sample());
    }
}
