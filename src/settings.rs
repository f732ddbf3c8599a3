//! Process settings from environment variables (a `.env` file is read by the binary first).

use crate::error::SettingsError;
use std::path::PathBuf;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/report";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_RUN_MODE: &str = "production";
pub const DEFAULT_BODY_LIMIT: usize = 64 * 1024 * 1024;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Deployment mode from `APP_ENV`. Destructive maintenance is allowed only in development.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunMode(String);

impl RunMode {
    pub fn new(mode: impl Into<String>) -> Self {
        RunMode(mode.into())
    }

    pub fn is_development(&self) -> bool {
        self.0 == "development"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: String,
    pub run_mode: RunMode,
    pub body_limit: usize,
    pub max_connections: u32,
    pub config_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: DEFAULT_DATABASE_URL.into(),
            bind_addr: DEFAULT_BIND_ADDR.into(),
            run_mode: RunMode::new(DEFAULT_RUN_MODE),
            body_limit: DEFAULT_BODY_LIMIT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            config_path: None,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, raw: Option<String>, default: T) -> Result<T, SettingsError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| SettingsError::InvalidVar { name, value }),
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Ok(Settings {
            database_url: non_empty("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            run_mode: RunMode::new(non_empty("APP_ENV").unwrap_or_else(|| DEFAULT_RUN_MODE.into())),
            body_limit: parse_var("BODY_LIMIT_BYTES", non_empty("BODY_LIMIT_BYTES"), DEFAULT_BODY_LIMIT)?,
            max_connections: parse_var("DB_MAX_CONNECTIONS", non_empty("DB_MAX_CONNECTIONS"), DEFAULT_MAX_CONNECTIONS)?,
            config_path: non_empty("APP_CONFIG_PATH").map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let s = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(s.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(s.bind_addr, "0.0.0.0:3000");
        assert_eq!(s.run_mode.as_str(), "production");
        assert!(!s.run_mode.is_development());
        assert_eq!(s.body_limit, 64 * 1024 * 1024);
        assert!(s.config_path.is_none());
    }

    #[test]
    fn reads_overrides() {
        let s = Settings::from_lookup(lookup(&[
            ("APP_ENV", "development"),
            ("BODY_LIMIT_BYTES", "1024"),
            ("DB_MAX_CONNECTIONS", "12"),
            ("APP_CONFIG_PATH", "/tmp/app.json"),
        ]))
        .unwrap();
        assert!(s.run_mode.is_development());
        assert_eq!(s.body_limit, 1024);
        assert_eq!(s.max_connections, 12);
        assert_eq!(s.config_path, Some(PathBuf::from("/tmp/app.json")));
    }

    #[test]
    fn invalid_numbers_are_errors() {
        let err = Settings::from_lookup(lookup(&[("BODY_LIMIT_BYTES", "lots")])).unwrap_err();
        assert_eq!(err.to_string(), "invalid value for BODY_LIMIT_BYTES: 'lots'");
    }
}
