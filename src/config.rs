//! Checker configuration: defaults, TOML file, environment and CLI layers.
//!
//! A [`CheckerConfig`] starts from built-in defaults and is overlaid with
//! [`ConfigLayer`]s in increasing priority: config file, environment
//! variables, command-line flags. The merged value is validated once and then
//! handed to each component.
//!
//! Config file example (`$XDG_CONFIG_HOME/redirect-checker/config.toml`):
//!
//! ```toml
//! max_redirections = 5
//! max_retries = 2
//! initial_backoff_ms = 500
//! request_timeout_ms = 8000
//! chunk_size = 4
//! chunk_delay_ms = 1000
//! permanent_redirect_codes = [301, 308]
//! source_column = "src"
//! destination_column = "destination"
//! output_dir = "reports"
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::check::{
    DEFAULT_CHUNK_DELAY, DEFAULT_CHUNK_SIZE, DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_REDIRECTIONS,
    DEFAULT_MAX_RETRIES, DEFAULT_PERMANENT_REDIRECT_CODES, DEFAULT_REQUEST_TIMEOUT, RetryPolicy,
    ValidityPolicy,
};
use crate::parser::{ColumnNames, DEFAULT_DESTINATION_COLUMN, DEFAULT_SOURCE_COLUMN};

/// Directory name under the user config dir.
const CONFIG_DIR_NAME: &str = "redirect-checker";

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Range redirect status codes must fall in.
const REDIRECT_CODE_RANGE: std::ops::RangeInclusive<u16> = 300..=399;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// An environment variable holds an unparsable value.
    #[error("invalid value '{value}' for environment variable {name}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
    },

    /// A merged value is outside its allowed range.
    #[error("invalid config value for `{field}`: {value}. Expected {expected}")]
    InvalidValue {
        /// Field name.
        field: &'static str,
        /// Rendered value.
        value: String,
        /// Description of the allowed values.
        expected: &'static str,
    },
}

impl ConfigError {
    fn invalid_value(field: &'static str, value: impl ToString, expected: &'static str) -> Self {
        Self::InvalidValue {
            field,
            value: value.to_string(),
            expected,
        }
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerConfig {
    /// Hop limit per chain.
    pub max_redirections: u32,
    /// Retries after the initial attempt on transient failures.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub initial_backoff: Duration,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Pairs resolved concurrently per chunk.
    pub chunk_size: usize,
    /// Pause between chunks.
    pub chunk_delay: Duration,
    /// Status codes counted as permanent redirects.
    pub permanent_redirect_codes: Vec<u16>,
    /// Header naming the source column.
    pub source_column: String,
    /// Header naming the expected destination column.
    pub destination_column: String,
    /// Directory the report is written to; defaults to the input's directory.
    pub output_dir: Option<PathBuf>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            max_redirections: DEFAULT_MAX_REDIRECTIONS,
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_delay: DEFAULT_CHUNK_DELAY,
            permanent_redirect_codes: DEFAULT_PERMANENT_REDIRECT_CODES.to_vec(),
            source_column: DEFAULT_SOURCE_COLUMN.to_string(),
            destination_column: DEFAULT_DESTINATION_COLUMN.to_string(),
            output_dir: None,
        }
    }
}

impl CheckerConfig {
    /// Overlays every value set in `layer`.
    pub fn merge(&mut self, layer: &ConfigLayer) {
        if let Some(value) = layer.max_redirections {
            self.max_redirections = value;
        }
        if let Some(value) = layer.max_retries {
            self.max_retries = value;
        }
        if let Some(ms) = layer.initial_backoff_ms {
            self.initial_backoff = Duration::from_millis(ms);
        }
        if let Some(ms) = layer.request_timeout_ms {
            self.request_timeout = Duration::from_millis(ms);
        }
        if let Some(value) = layer.chunk_size {
            self.chunk_size = value;
        }
        if let Some(ms) = layer.chunk_delay_ms {
            self.chunk_delay = Duration::from_millis(ms);
        }
        if let Some(codes) = &layer.permanent_redirect_codes {
            self.permanent_redirect_codes.clone_from(codes);
        }
        if let Some(column) = &layer.source_column {
            self.source_column.clone_from(column);
        }
        if let Some(column) = &layer.destination_column {
            self.destination_column.clone_from(column);
        }
        if let Some(dir) = &layer.output_dir {
            self.output_dir = Some(dir.clone());
        }
    }

    /// Checks every value against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_redirections == 0 {
            return Err(ConfigError::invalid_value(
                "max_redirections",
                self.max_redirections,
                "at least 1",
            ));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::invalid_value(
                "chunk_size",
                self.chunk_size,
                "at least 1",
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::invalid_value(
                "request_timeout",
                "0ms",
                "at least 1ms",
            ));
        }
        if self.permanent_redirect_codes.is_empty() {
            return Err(ConfigError::invalid_value(
                "permanent_redirect_codes",
                "[]",
                "at least one code",
            ));
        }
        if let Some(code) = self
            .permanent_redirect_codes
            .iter()
            .find(|code| !REDIRECT_CODE_RANGE.contains(*code))
        {
            return Err(ConfigError::invalid_value(
                "permanent_redirect_codes",
                code,
                "codes within 300..=399",
            ));
        }
        if self.source_column.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "source_column",
                "\"\"",
                "a non-empty header name",
            ));
        }
        if self.destination_column.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "destination_column",
                "\"\"",
                "a non-empty header name",
            ));
        }
        Ok(())
    }

    /// Retry policy for the header fetcher.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.initial_backoff)
    }

    /// Validity policy for the resolver.
    #[must_use]
    pub fn validity_policy(&self) -> ValidityPolicy {
        ValidityPolicy::new(self.permanent_redirect_codes.iter().copied())
    }

    /// Column names for the input reader.
    #[must_use]
    pub fn column_names(&self) -> ColumnNames {
        ColumnNames::new(self.source_column.clone(), self.destination_column.clone())
    }
}

/// One partial configuration source. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    /// Hop limit per chain.
    pub max_redirections: Option<u32>,
    /// Retries after the initial attempt.
    pub max_retries: Option<u32>,
    /// Initial backoff in milliseconds.
    pub initial_backoff_ms: Option<u64>,
    /// Request timeout in milliseconds.
    pub request_timeout_ms: Option<u64>,
    /// Pairs per chunk.
    pub chunk_size: Option<usize>,
    /// Pause between chunks in milliseconds.
    pub chunk_delay_ms: Option<u64>,
    /// Permanent redirect status codes.
    pub permanent_redirect_codes: Option<Vec<u16>>,
    /// Source column header.
    pub source_column: Option<String>,
    /// Destination column header.
    pub destination_column: Option<String>,
    /// Report output directory.
    pub output_dir: Option<PathBuf>,
}

impl ConfigLayer {
    /// Reads the layer from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if a set variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the layer through `lookup`, which maps variable names to values.
    ///
    /// Empty values are treated as unset. Durations are in milliseconds and
    /// `PERMANENT_REDIRECT_CODES` is a comma-separated list.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if a set variable cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &'static str| lookup(name).filter(|value| !value.trim().is_empty());

        let layer = Self {
            max_redirections: parse_env("MAX_REDIRECTIONS", get("MAX_REDIRECTIONS"))?,
            max_retries: parse_env("MAX_RETRIES", get("MAX_RETRIES"))?,
            initial_backoff_ms: parse_env("INITIAL_BACKOFF", get("INITIAL_BACKOFF"))?,
            request_timeout_ms: parse_env("REQUEST_TIMEOUT", get("REQUEST_TIMEOUT"))?,
            chunk_size: parse_env("CHUNK_SIZE", get("CHUNK_SIZE"))?,
            chunk_delay_ms: parse_env("CHUNK_DELAY", get("CHUNK_DELAY"))?,
            permanent_redirect_codes: get("PERMANENT_REDIRECT_CODES")
                .map(|raw| {
                    parse_code_list(&raw).ok_or(ConfigError::InvalidEnv {
                        name: "PERMANENT_REDIRECT_CODES",
                        value: raw,
                    })
                })
                .transpose()?,
            source_column: get("SOURCE_COLUMN").map(|value| value.trim().to_string()),
            destination_column: get("DESTINATION_COLUMN").map(|value| value.trim().to_string()),
            output_dir: None,
        };
        debug!(?layer, "read environment config");
        Ok(layer)
    }
}

fn parse_env<T: FromStr>(name: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError> {
    let Some(value) = raw else {
        return Ok(None);
    };
    match value.trim().parse::<T>() {
        Ok(parsed) => Ok(Some(parsed)),
        Err(_) => Err(ConfigError::InvalidEnv { name, value }),
    }
}

/// Parses a comma-separated status code list such as `301,308`.
fn parse_code_list(raw: &str) -> Option<Vec<u16>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse().ok())
        .collect()
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/redirect-checker/config.toml`
/// 2. `$HOME/.config/redirect-checker/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    config_path_from(|name| std::env::var_os(name))
}

fn config_path_from(lookup: impl Fn(&str) -> Option<OsString>) -> Option<PathBuf> {
    let non_empty = |name: &str| lookup(name).filter(|value| !value.is_empty());

    if let Some(xdg_config_home) = non_empty("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_FILE_NAME),
        );
    }

    let home = non_empty("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME),
    )
}

/// Loads the config file at the default path, if one exists.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file exists but cannot be read or parsed.
pub fn load_default_file_config() -> Result<Option<ConfigLayer>, ConfigError> {
    match resolve_default_config_path() {
        Some(path) if path.exists() => load_file_config(&path).map(Some),
        _ => Ok(None),
    }
}

/// Loads a TOML config file.
///
/// # Errors
///
/// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
pub fn load_file_config(path: &Path) -> Result<ConfigLayer, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let layer = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loaded config file");
    Ok(layer)
}
