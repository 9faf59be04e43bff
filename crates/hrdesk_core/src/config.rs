//! Runtime configuration loaded from TOML plus environment overrides.
//!
//! # Responsibility
//! - Describe the database location, logging setup and invitation lifetime.
//! - Resolve `file -> environment` precedence in one place.
//!
//! # Invariants
//! - A missing config file yields defaults, never an error.
//! - `invitations.ttl_days >= 1` and `logging.level` is a supported level.

use crate::logging::{default_log_level, normalize_level};
use crate::model::invitation::DEFAULT_INVITATION_TTL_DAYS;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_DB_PATH: &str = "HRDESK_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "HRDESK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "HRDESK_LOG_DIR";

const DEFAULT_DB_PATH: &str = "hrdesk.sqlite3";
const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HrdeskConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub invitations: InvitationConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Relative paths are resolved by the caller.
    pub dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvitationConfig {
    pub ttl_days: i64,
}

impl Default for HrdeskConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            invitations: InvitationConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_PATH),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

impl Default for InvitationConfig {
    fn default() -> Self {
        Self {
            ttl_days: DEFAULT_INVITATION_TTL_DAYS,
        }
    }
}

impl HrdeskConfig {
    /// Loads `path` (defaults when absent) and applies process environment
    /// overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Like [`HrdeskConfig::load`] with an injectable environment lookup.
    pub fn load_with_env(
        path: impl AsRef<Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        config.apply_env(env);
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| env(key).filter(|value| !value.trim().is_empty());
        if let Some(path) = non_empty(ENV_DB_PATH) {
            self.database.path = PathBuf::from(path);
        }
        if let Some(level) = non_empty(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        if let Some(dir) = non_empty(ENV_LOG_DIR) {
            self.logging.dir = PathBuf::from(dir);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "database.path",
                reason: "cannot be empty".to_string(),
            });
        }
        normalize_level(&self.logging.level).map_err(|err| ConfigError::Invalid {
            field: "logging.level",
            reason: err.to_string(),
        })?;
        if self.invitations.ttl_days < 1 {
            return Err(ConfigError::Invalid {
                field: "invitations.ttl_days",
                reason: format!("must be at least 1, got {}", self.invitations.ttl_days),
            });
        }
        Ok(())
    }

    /// Invitation lifetime as a duration.
    pub fn invitation_ttl(&self) -> TimeDelta {
        TimeDelta::days(self.invitations.ttl_days)
    }
}
