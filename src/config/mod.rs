//! Configuration management.
//!
//! Settings come from a TOML file, then environment overrides:
//!
//! ```toml
//! database_path = "/var/lib/monet/monet.db"
//! debug = false
//!
//! [search]
//! page_size = 20
//!
//! [logging]
//! format = "json"   # or "pretty"
//! level = "info"
//! file = "/var/log/monet.log"
//! ```

use crate::search::DEFAULT_PAGE_SIZE;
use crate::storage::{DATABASE_FILE, get_user_data_dir};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "MONET_CONFIG_PATH";
/// Environment variable overriding the database path.
pub const DATABASE_PATH_ENV: &str = "MONET_DATABASE_PATH";
/// Environment variable overriding the log level.
pub const LOG_LEVEL_ENV: &str = "MONET_LOG_LEVEL";

/// Main configuration for monet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonetConfig {
    /// Path of the `SQLite` database file.
    pub database_path: PathBuf,
    /// Debug mode: forces debug-level logging.
    pub debug: bool,
    /// Search settings.
    pub search: SearchConfig,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Search settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Results per page.
    pub page_size: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Logging settings as written in the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoggingSettings {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Filter directive such as `info` or `monet=debug`.
    pub level: Option<String>,
    /// Append logs to this file instead of stderr.
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Database path.
    pub database_path: Option<String>,
    /// Debug mode.
    pub debug: Option<bool>,
    /// Search section.
    pub search: Option<ConfigFileSearch>,
    /// Logging section.
    pub logging: Option<LoggingSettings>,
}

/// Search section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileSearch {
    /// Results per page.
    pub page_size: Option<u32>,
}

impl Default for MonetConfig {
    fn default() -> Self {
        let database_path = get_user_data_dir()
            .map_or_else(|_| PathBuf::from(DATABASE_FILE), |dir| dir.join(DATABASE_FILE));
        Self {
            database_path,
            debug: false,
            search: SearchConfig::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl MonetConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        Self::from_toml(&contents)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid configuration.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;
        let config = Self::from_config_file(file);
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration the way the CLI does.
    ///
    /// The file is `explicit` if given, else `$MONET_CONFIG_PATH`, else
    /// `config.toml` in the platform config directory if it exists, else
    /// defaults. Environment overrides are applied last.
    ///
    /// # Errors
    ///
    /// Returns an error if a named file cannot be loaded, or a config file
    /// or override is invalid.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os(CONFIG_PATH_ENV)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        let mut config = match explicit.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::load_default()?,
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Loads `config.toml` from the platform config directory
    /// (`~/.config/monet/` on Linux), or defaults if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be loaded.
    pub fn load_default() -> Result<Self> {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Ok(Self::default());
        };

        let path = base_dirs.config_dir().join("monet").join("config.toml");
        if path.exists() {
            tracing::debug!(path = %path.display(), "Loading config file");
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Converts a `ConfigFile` to `MonetConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(path) = file.database_path {
            config.database_path = PathBuf::from(path);
        }
        if let Some(debug) = file.debug {
            config.debug = debug;
        }
        if let Some(page_size) = file.search.and_then(|s| s.page_size) {
            config.search.page_size = page_size;
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }

        config
    }

    fn apply_env_overrides(&mut self) {
        if let Some(path) = std::env::var_os(DATABASE_PATH_ENV).filter(|p| !p.is_empty()) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(level) = std::env::var(LOG_LEVEL_ENV).ok().filter(|l| !l.is_empty()) {
            self.logging.level = Some(level);
        }
    }

    /// Checks values the rest of the crate relies on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        if self.search.page_size == 0 {
            return Err(Error::InvalidInput(
                "search.page_size must be greater than 0".to_string(),
            ));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::InvalidInput("database_path must not be empty".to_string()));
        }
        if let Some(format) = &self.logging.format {
            if !matches!(format.to_lowercase().as_str(), "pretty" | "json") {
                return Err(Error::InvalidInput(format!(
                    "logging.format must be 'pretty' or 'json', got '{format}'"
                )));
            }
        }
        Ok(())
    }

    /// Sets the database path.
    #[must_use]
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }
}
