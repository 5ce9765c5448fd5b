//! Application configuration
//!
//! Provides centralized configuration management with:
//! - Config file loading (optional, TOML)
//! - Environment variable overrides
//! - Runtime defaults
//! - Validation
//!
//! The `csv` and `json` sections hold the editable mapping drafts. They are only
//! turned into parser configurations through [`Config::csv_configuration`] and
//! [`Config::json_configuration`], which validate them.

use crate::parser::{
    CsvConfigurationDraft, CsvFileParserConfiguration, JsonConfigurationDraft,
    JsonFileParserConfiguration,
};
use anyhow::{Context, Result};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const APP_DIR_NAME: &str = "scrobble-parse";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Output configuration
    pub output: OutputConfig,

    /// Paths configuration
    pub paths: PathsConfig,

    /// CSV field mapping
    pub csv: CsvConfigurationDraft,

    /// JSON field mapping
    pub json: JsonConfigurationDraft,

    /// File the configuration was read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub json_pretty: bool,
    pub timestamp_format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub settings_directory: PathBuf,
    pub log_directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "WARN".to_string(),
            format: "pretty".to_string(),
            output: "console".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_pretty: false,
            timestamp_format: "%Y-%m-%d %H:%M:%S".to_string(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let settings_directory = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME);

        Self {
            log_directory: settings_directory.join("logs"),
            settings_directory,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            output: OutputConfig::default(),
            paths: PathsConfig::default(),
            csv: CsvConfigurationDraft::default(),
            json: JsonConfigurationDraft::default(),
            source: None,
        }
    }
}

impl Config {
    /// Load configuration from an explicit file, or the first well-known file
    /// that exists, then apply environment overrides and validate.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let (mut config, source) = match explicit {
            Some(path) => (Self::load_from_file(path)?, Some(path.to_path_buf())),
            None => Self::discover()?,
        };
        config.source = source;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    fn discover() -> Result<(Self, Option<PathBuf>)> {
        let settings_directory = env::var("SCROBBLE_PARSE_SETTINGS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathsConfig::default().settings_directory);

        let config_paths = [
            PathBuf::from("scrobble-parse.toml"),
            PathBuf::from(".scrobble-parse.toml"),
            settings_directory.join(CONFIG_FILE_NAME),
        ];

        for path in &config_paths {
            if path.exists() {
                return Ok((Self::load_from_file(path)?, Some(path.clone())));
            }
        }

        Ok((Self::default(), None))
    }

    /// Load configuration from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        // Logging overrides
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }

        // Path overrides
        if let Ok(val) = env::var("SCROBBLE_PARSE_SETTINGS_DIR") {
            self.paths.settings_directory = PathBuf::from(val);
        }
        if let Ok(val) = env::var("SCROBBLE_PARSE_LOG_DIR") {
            self.paths.log_directory = PathBuf::from(val);
        }

        // Mapping overrides
        if let Ok(val) = env::var("SCROBBLE_PARSE_CSV_DELIMITER") {
            self.csv.delimiter = val;
        }
        if let Ok(val) = env::var("SCROBBLE_PARSE_CSV_ENCODING") {
            self.csv.encoding = val;
        }
        if let Ok(val) = env::var("SCROBBLE_PARSE_FILTER_SHORT_PLAYS") {
            let enabled: bool = val
                .parse()
                .context("Invalid SCROBBLE_PARSE_FILTER_SHORT_PLAYS")?;
            self.csv.filter_short_played_songs = enabled;
            self.json.filter_short_played_songs = enabled;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(anyhow::anyhow!(
                "Log format must be 'pretty' or 'json', got '{}'",
                self.logging.format
            ));
        }

        if !matches!(self.logging.output.as_str(), "console" | "file" | "both") {
            return Err(anyhow::anyhow!(
                "Log output must be 'console', 'file' or 'both', got '{}'",
                self.logging.output
            ));
        }

        let bad_specifier = StrftimeItems::new(&self.output.timestamp_format)
            .any(|item| matches!(item, Item::Error));
        if bad_specifier {
            return Err(anyhow::anyhow!(
                "Output timestamp format '{}' is not a valid strftime format",
                self.output.timestamp_format
            ));
        }

        self.csv_configuration()?;
        self.json_configuration()?;

        Ok(())
    }

    /// Validated CSV snapshot of the `csv` section.
    pub fn csv_configuration(&self) -> Result<CsvFileParserConfiguration> {
        self.csv
            .to_configuration()
            .context("Invalid [csv] configuration")
    }

    /// Validated JSON snapshot of the `json` section.
    pub fn json_configuration(&self) -> Result<JsonFileParserConfiguration> {
        self.json
            .to_configuration()
            .context("Invalid [json] configuration")
    }

    /// Location of the settings file inside the settings directory.
    pub fn settings_file(&self) -> PathBuf {
        self.paths.settings_directory.join(CONFIG_FILE_NAME)
    }

    /// Save current configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        info!(path = %path.display(), "Configuration saved to file");

        Ok(())
    }
}
