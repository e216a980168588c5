//! Layered application settings.
//!
//! Sources, later ones winning: built-in defaults, `config/default.toml`,
//! `config/{RENTSTOCK_ENV}.toml`, then `RENTSTOCK__SECTION__KEY` environment
//! variables. Both files are optional.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Source(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub store: StoreSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    #[serde(default)]
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// Only honoured by the memory backend.
    pub seed_demo_data: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// Used when `RUST_LOG` is unset.
    pub filter: String,
    pub json: bool,
}

impl AppConfig {
    /// Load settings for the environment named by `RENTSTOCK_ENV`
    /// (default `development`).
    pub fn load() -> Result<Self, SettingsError> {
        let env = std::env::var("RENTSTOCK_ENV").unwrap_or_else(|_| "development".into());
        let config = defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                Environment::with_prefix("RENTSTOCK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Self::from_config(config)
    }

    /// Built-in defaults only; ignores files and environment.
    pub fn defaults() -> Result<Self, SettingsError> {
        Self::from_config(defaults()?.build()?)
    }

    fn from_config(config: Config) -> Result<Self, SettingsError> {
        let settings: AppConfig = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.store.backend == StoreBackend::Postgres
            && self
                .store
                .database_url
                .as_deref()
                .is_none_or(|url| url.trim().is_empty())
        {
            return Err(SettingsError::Invalid(
                "store.database_url is required when store.backend = \"postgres\"".to_string(),
            ));
        }
        if self.store.max_connections == 0 {
            return Err(SettingsError::Invalid(
                "store.max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("store.backend", "memory")?
        .set_default("store.max_connections", 5)?
        .set_default("store.seed_demo_data", true)?
        .set_default("log.filter", "info")?
        .set_default("log.json", true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_the_memory_backend() {
        let cfg = AppConfig::defaults().unwrap();
        assert_eq!(cfg.store.backend, StoreBackend::Memory);
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8080");
        assert!(cfg.store.seed_demo_data);
        assert_eq!(cfg.log.filter, "info");
    }

    #[test]
    fn overrides_win_over_defaults() {
        let config = defaults()
            .unwrap()
            .set_override("server.port", 9090)
            .unwrap()
            .set_override("log.json", false)
            .unwrap()
            .build()
            .unwrap();
        let cfg = AppConfig::from_config(config).unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert!(!cfg.log.json);
    }

    #[test]
    fn postgres_backend_requires_a_database_url() {
        let config = defaults()
            .unwrap()
            .set_override("store.backend", "postgres")
            .unwrap()
            .build()
            .unwrap();
        match AppConfig::from_config(config) {
            Err(SettingsError::Invalid(msg)) => assert!(msg.contains("database_url")),
            other => panic!("expected invalid configuration, got {other:?}"),
        }
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let config = defaults()
            .unwrap()
            .set_override("store.backend", "sqlite")
            .unwrap()
            .build()
            .unwrap();
        assert!(matches!(
            AppConfig::from_config(config),
            Err(SettingsError::Source(_))
        ));
    }
}
