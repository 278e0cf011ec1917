//! Configuration management for shop-export
//!
//! Configuration is read from a TOML file:
//! - an explicit `--config <file>` path, which must exist
//! - otherwise `~/.shop-export/config.toml` when present
//! - otherwise built-in defaults
//!
//! ```toml
//! [export]
//! page_size = 500
//! output_directory = "exports"
//!
//! [logging]
//! level = "info"
//!
//! [providers."Exports.ProductXlsx"]
//! worksheet_name = "Catalog"
//!
//! [services]
//! languages = [{ id = 2, culture = "de-DE" }]
//!
//! [[services.categories]]
//! id = 1
//! name = "Furniture"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::services::{
    ExportServices, InMemoryCatalog, InMemoryLocalization, InMemoryStoreMappings, Language,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Export run configuration
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Provider settings keyed by provider system name
    #[serde(default)]
    pub providers: BTreeMap<String, toml::Table>,

    /// Lookup data for localized values, store mappings and category paths
    #[serde(default)]
    pub services: ServicesConfig,
}

/// Lookup data handed to providers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Languages of localized values, in output order
    #[serde(default)]
    pub languages: Vec<Language>,

    #[serde(default)]
    pub localized: Vec<LocalizedValueConfig>,

    #[serde(default)]
    pub store_mappings: Vec<StoreMappingConfig>,

    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
}

/// One translated property value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalizedValueConfig {
    /// Entity name, e.g. `Product`
    pub key_group: String,
    pub entity_id: i64,
    /// Property name, e.g. `Name`
    pub key: String,
    pub language_id: i64,
    pub value: String,
}

/// Stores an entity is limited to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMappingConfig {
    pub entity_name: String,
    pub entity_id: i64,
    pub store_ids: Vec<i64>,
}

/// One node of the category tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

impl ServicesConfig {
    /// Build the in-memory lookups
    pub fn build(&self) -> ExportServices {
        let localization = self.localized.iter().fold(
            InMemoryLocalization::new(self.languages.clone()),
            |lookup, v| lookup.with_value(&v.key_group, v.entity_id, &v.key, v.language_id, &v.value),
        );
        let store_mappings = self
            .store_mappings
            .iter()
            .fold(InMemoryStoreMappings::new(), |lookup, m| {
                lookup.with_mapping(&m.entity_name, m.entity_id, &m.store_ids)
            });
        let catalog = self
            .categories
            .iter()
            .fold(InMemoryCatalog::new(), |catalog, c| {
                catalog.with_category(c.id, &c.name, c.parent_id)
            });

        ExportServices::default()
            .with_localization(localization)
            .with_store_mappings(store_mappings)
            .with_catalog(catalog)
    }
}

/// Export run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Records per segment
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Directory for generated file names
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,

    /// Version written into XML envelopes
    #[serde(default = "default_app_version")]
    pub app_version: String,

    /// Show a progress bar while exporting
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

// Default value functions
fn default_page_size() -> usize {
    1000
}

fn default_output_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_app_version() -> String {
    crate::VERSION.to_string()
}

fn default_show_progress() -> bool {
    true
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    true
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            output_directory: default_output_directory(),
            app_version: default_app_version(),
            show_progress: default_show_progress(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit path or the default location
    ///
    /// # Arguments
    /// * `path` - Explicit configuration file, must exist when given
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration, defaults when no file exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Self::default_path();
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Get the default configuration file path
    ///
    /// # Returns
    /// * `PathBuf` - Path to default configuration file
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".shop-export")
            .join("config.toml")
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<()> {
        if self.export.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "export.page_size".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        if self.export.app_version.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "export.app_version".to_string(),
                value: self.export.app_version.clone(),
            }
            .into());
        }

        Ok(())
    }

    /// Settings of one provider as JSON, `Null` when none are configured
    ///
    /// # Arguments
    /// * `system_name` - Provider system name, e.g. `Exports.ProductXml`
    pub fn provider_settings(&self, system_name: &str) -> Result<serde_json::Value> {
        match self.providers.get(system_name) {
            Some(table) => Ok(serde_json::to_value(table)?),
            None => Ok(serde_json::Value::Null),
        }
    }

    /// Render the configuration as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}
