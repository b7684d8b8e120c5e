//! # vellum-config
//!
//! Layered configuration loading for Vellum using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`VELLUM_*` prefix, `__` as separator)
//! 2. Project-level `.vellum/config.toml`
//! 3. User-level `~/.config/vellum/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `VELLUM_OUTPUT__PRETTY` -> `output.pretty` and
//! `VELLUM_LOG__LEVEL` -> `log.level`. The bare `VELLUM_LOG` variable is the
//! tracing filter read by the CLI and is not part of the configuration.
//!
//! # Usage
//!
//! ```no_run
//! use vellum_config::VellumConfig;
//!
//! let config = VellumConfig::load_with_dotenv().expect("config");
//! if config.output.pretty {
//!     println!("log level: {}", config.log.level);
//! }
//! ```

mod error;
mod log;
mod output;

pub use error::ConfigError;
pub use log::{LEVELS, LogConfig};
pub use output::OutputConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Project-local config file, relative to the working directory.
pub const PROJECT_CONFIG_PATH: &str = ".vellum/config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct VellumConfig {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl VellumConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`. Use [`Self::load_with_dotenv`] for `.env` loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` when a source can't be read or
    /// extracted, and `ConfigError::InvalidValue` when a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv();
        Self::load()
    }

    /// Extract and check a config from an arbitrary figment.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.log.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment directly or add providers on
    /// top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        let local_path = PathBuf::from(PROJECT_CONFIG_PATH);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("VELLUM_").ignore(&["log"]).split("__"))
    }

    /// Path to the user-global config file.
    #[must_use]
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("vellum").join("config.toml"))
    }

    /// Load `.env` from the current directory or its ancestors. Silently does
    /// nothing if none is found.
    fn load_dotenv() {
        let _ = dotenvy::dotenv();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_loads() {
        let config = VellumConfig::default();
        assert!(config.output.pretty);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn defaults_extract_from_serialized_provider() {
        let figment = Figment::from(Serialized::defaults(VellumConfig::default()));
        let config = VellumConfig::from_figment(&figment).expect("should extract defaults");
        assert_eq!(config, VellumConfig::default());
    }

    #[test]
    fn global_path_ends_with_vellum_config() {
        if let Some(path) = VellumConfig::global_config_path() {
            assert!(path.ends_with("vellum/config.toml"));
        }
    }
}
