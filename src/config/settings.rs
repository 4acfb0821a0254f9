//! TOML-based configuration for statline.
//!
//! Supports a config file (statline.toml) with environment variable
//! expansion in the storage path.
//!
//! Example configuration:
//! ```toml
//! [query]
//! default_limit = 500
//! max_limit = 1000
//! dialect = "postgres"
//! timeout_seconds = 30
//!
//! [defaults]
//! year = 2024
//! week = 7
//! seas_type = "REG"
//! scoring_format = "half_ppr"
//!
//! [storage]
//! path = "${STATLINE_DATA}/league.db"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::registry::ResolutionContext;
use crate::sql::Dialect;
use crate::table_state::Limits;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("No storage path configured")]
    NoStoragePath,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Pagination, dialect and execution settings.
    pub query: QuerySettings,

    /// Context defaults for parameter resolution.
    pub defaults: ResolutionContext,

    /// Embedded store location.
    pub storage: StorageSettings,
}

/// Query settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QuerySettings {
    /// Rows returned when a table state omits `limit`.
    pub default_limit: u64,

    /// Largest `limit` a table state may ask for.
    pub max_limit: u64,

    /// Dialect statements are emitted in.
    pub dialect: Dialect,

    /// Deadline for executing one statement. No deadline when absent.
    pub timeout_seconds: Option<u64>,
}

impl Default for QuerySettings {
    fn default() -> Self {
        let limits = Limits::default();
        Self {
            default_limit: limits.default_limit,
            max_limit: limits.max_limit,
            dialect: Dialect::default(),
            timeout_seconds: None,
        }
    }
}

impl QuerySettings {
    pub fn limits(&self) -> Limits {
        Limits {
            default_limit: self.default_limit,
            max_limit: self.max_limit,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

/// Storage settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageSettings {
    /// SQLite database file (supports ${ENV_VAR} expansion).
    pub path: Option<String>,
}

impl StorageSettings {
    /// Get the database path with environment variables expanded.
    pub fn resolved_path(&self) -> Result<PathBuf, SettingsError> {
        let path = self.path.as_deref().ok_or(SettingsError::NoStoragePath)?;
        Ok(PathBuf::from(expand_env_vars(path)?))
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and check settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.check()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `STATLINE_CONFIG`
    /// 2. `./statline.toml`
    /// 3. `~/.config/statline/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("STATLINE_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("statline.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("statline").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    fn check(&self) -> Result<(), SettingsError> {
        let query = &self.query;
        if query.default_limit == 0 {
            return Err(SettingsError::InvalidConfig(
                "query.default_limit must be positive".into(),
            ));
        }
        if query.default_limit > query.max_limit {
            return Err(SettingsError::InvalidConfig(format!(
                "query.default_limit ({}) exceeds query.max_limit ({})",
                query.default_limit, query.max_limit
            )));
        }
        if query.timeout_seconds == Some(0) {
            return Err(SettingsError::InvalidConfig(
                "query.timeout_seconds must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.peek() == Some(&'{') {
            chars.next();
            chars.by_ref().take_while(|&ch| ch != '}').collect()
        } else {
            let mut name = String::new();
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                name.push(ch);
            }
            name
        };

        if var_name.is_empty() {
            // A lone $ is kept as-is
            result.push('$');
            continue;
        }
        let value = env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name))?;
        result.push_str(&value);
    }

    Ok(result)
}
