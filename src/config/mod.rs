//! Configuration module for statline.
//!
//! Handles the settings file, environment variables and context defaults.

mod settings;

pub use settings::{expand_env_vars, QuerySettings, Settings, SettingsError, StorageSettings};
