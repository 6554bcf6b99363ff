//! Configuration file loading with precedence handling.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "NARROW_FILTER_CONFIG";
/// Environment variable forcing Zephyr mirror matching on or off.
pub const ZEPHYR_MIRROR_ENV: &str = "NARROW_FILTER_ZEPHYR_MIRROR";
/// Environment variable naming the workspace snapshot to load.
pub const SNAPSHOT_ENV: &str = "NARROW_FILTER_SNAPSHOT";

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Config file path contains invalid UTF-8 or cannot be resolved.
    #[error("Invalid config path: {0}")]
    InvalidPath(String),

    /// Failed to read config file (file may not exist or have permission issues).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/narrow-filter/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Treat the realm as a Zephyr mirror (fuzzy channel/topic matching).
    #[serde(default)]
    pub zephyr_mirror_realm: Option<bool>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,

    /// Pretty-print the JSON report.
    #[serde(default)]
    pub pretty: Option<bool>,

    /// Workspace snapshot to evaluate narrows against.
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
}

/// Resolved configuration after applying precedence rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Fuzzy Zephyr-mirror channel/topic matching.
    pub zephyr_mirror_realm: bool,
    /// Where tracing output goes.
    pub log_file_path: PathBuf,
    /// Pretty-print the JSON report.
    pub pretty: bool,
    /// `None` runs against an empty workspace.
    pub snapshot_path: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            zephyr_mirror_realm: false,
            log_file_path: default_log_path(),
            pretty: true,
            snapshot_path: None,
        }
    }
}

/// Flags given on the command line; `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    /// `--zephyr-mirror`.
    pub zephyr_mirror_realm: Option<bool>,
    /// `--compact` sets this to `Some(false)`.
    pub pretty: Option<bool>,
    /// `--snapshot`.
    pub snapshot_path: Option<PathBuf>,
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/narrow-filter/narrow-filter.log` on Unix-like
/// systems. Falls back to the current directory when no state directory
/// exists.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("narrow-filter").join("narrow-filter.log")
    } else {
        PathBuf::from("narrow-filter.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/narrow-filter/config.toml` on Unix.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("narrow-filter").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `NARROW_FILTER_CONFIG` environment variable
/// 3. Default path `~/.config/narrow-filter/config.toml`
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        if env_path.is_empty() {
            return Err(ConfigError::InvalidPath(format!("{CONFIG_ENV} is empty")));
        }
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Apply environment variable overrides to resolved config.
///
/// Checks for:
/// - `NARROW_FILTER_ZEPHYR_MIRROR`: `1`/`true`/`yes` or `0`/`false`/`no`
/// - `NARROW_FILTER_SNAPSHOT`: snapshot path
///
/// Unrecognized boolean values are ignored.
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Ok(value) = std::env::var(ZEPHYR_MIRROR_ENV) {
        match parse_bool(&value) {
            Some(flag) => config.zephyr_mirror_realm = flag,
            None => tracing::warn!(value = %value, "Ignoring unrecognized {}", ZEPHYR_MIRROR_ENV),
        }
    }

    if let Ok(path) = std::env::var(SNAPSHOT_ENV) {
        if !path.is_empty() {
            config.snapshot_path = Some(PathBuf::from(path));
        }
    }

    config
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Merge config file into defaults to create resolved config.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    ResolvedConfig {
        zephyr_mirror_realm: config
            .zephyr_mirror_realm
            .unwrap_or(defaults.zephyr_mirror_realm),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
        pretty: config.pretty.unwrap_or(defaults.pretty),
        snapshot_path: config.snapshot_path.or(defaults.snapshot_path),
    }
}

/// Apply CLI argument overrides to resolved config.
///
/// CLI args have the highest precedence. Only flags the user actually
/// set are applied.
pub fn apply_cli_overrides(mut config: ResolvedConfig, overrides: CliOverrides) -> ResolvedConfig {
    if let Some(zephyr) = overrides.zephyr_mirror_realm {
        config.zephyr_mirror_realm = zephyr;
    }

    if let Some(pretty) = overrides.pretty {
        config.pretty = pretty;
    }

    if let Some(path) = overrides.snapshot_path {
        config.snapshot_path = Some(path);
    }

    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
