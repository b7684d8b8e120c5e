//! Logging defaults.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Levels accepted by `log.level`.
pub const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

fn default_level() -> String {
    "warn".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LogConfig {
    /// Level used when neither `VELLUM_LOG` nor a verbosity flag is set.
    #[serde(default = "default_level")]
    pub level: String,
}

impl LogConfig {
    /// Check that `level` names a tracing level.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for anything outside [`LEVELS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.level.to_ascii_lowercase();
        if LEVELS.contains(&level.as_str()) {
            Ok(())
        } else {
            Err(ConfigError::InvalidValue {
                field: "log.level".to_string(),
                reason: format!("expected one of {}, got '{}'", LEVELS.join(", "), self.level),
            })
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = LogConfig::default();
        assert_eq!(config.level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn level_is_case_insensitive() {
        let config = LogConfig {
            level: "DEBUG".to_string(),
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_level_is_rejected() {
        let config = LogConfig {
            level: "loud".to_string(),
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log.level"), "{err}");
    }
}
