//! Structured logging configuration.

use crate::config::LoggingSettings;
use crate::{Error, Result};
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Filter used when nothing else is configured.
pub const DEFAULT_LEVEL: &str = "info";

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, human readable.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(Error::InvalidInput(format!("unknown log format '{other}'"))),
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Event filter.
    pub filter: EnvFilter,
    /// Log file; stderr when `None`.
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Resolves settings into a logging configuration.
    ///
    /// The filter is `debug` when `verbose` is set, otherwise `RUST_LOG` if
    /// present, otherwise the configured level, otherwise [`DEFAULT_LEVEL`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an unknown format or a filter
    /// directive that does not parse.
    pub fn from_settings(settings: &LoggingSettings, verbose: bool) -> Result<Self> {
        let format = settings
            .format
            .as_deref()
            .map(LogFormat::from_str)
            .transpose()?
            .unwrap_or_default();

        let directive = if verbose {
            "debug".to_string()
        } else if let Some(env) = std::env::var(EnvFilter::DEFAULT_ENV)
            .ok()
            .filter(|v| !v.is_empty())
        {
            env
        } else {
            settings
                .level
                .clone()
                .unwrap_or_else(|| DEFAULT_LEVEL.to_string())
        };

        let filter = EnvFilter::try_new(&directive)
            .map_err(|e| Error::InvalidInput(format!("log filter '{directive}': {e}")))?;

        Ok(Self {
            format,
            filter,
            file: settings.file.clone(),
        })
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: EnvFilter::new(DEFAULT_LEVEL),
            file: None,
        }
    }
}
