//! Reporter configuration with file discovery and environment support.
//!
//! Configuration is resolved in order:
//! 1. An explicit path passed to [`load_file`]
//! 2. The file named by `QAFLOW_CONFIG_PATH`
//! 3. `reporter.config.json` in the current directory
//! 4. The `QAFLOW_API_KEY` environment variable
//!
//! Discovery is best-effort: a missing or unreadable config file degrades to
//! a logged warning, never a hard failure. The reporter stays unusable until
//! an API key is supplied one way or another.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::warn;

// ============================================================================
// Default Values
// ============================================================================

/// Default collection API base URL
pub const DEFAULT_ENDPOINT: &str = "https://qaflow.tech/api";

/// Default config file name, looked up in the current directory
pub const DEFAULT_CONFIG_FILE: &str = "reporter.config.json";

// ============================================================================
// Environment Variable Names
// ============================================================================

/// Environment variable for the API key
pub const ENV_API_KEY: &str = "QAFLOW_API_KEY";

/// Environment variable for the collection API base URL
pub const ENV_ENDPOINT: &str = "QAFLOW_ENDPOINT";

/// Environment variable overriding the config file location
pub const ENV_CONFIG_PATH: &str = "QAFLOW_CONFIG_PATH";

/// Environment variable for the ping interval (millis)
pub const ENV_PING_INTERVAL: &str = "QAFLOW_PING_INTERVAL";

/// Environment variable toggling automatic screenshot capture
pub const ENV_AUTO_SCREENSHOT: &str = "QAFLOW_AUTO_SCREENSHOT";

// ============================================================================
// Configuration Types
// ============================================================================

/// What the reporter does when a step action fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StepFailurePolicy {
    /// Record the failed step and keep the session open (default)
    #[default]
    Continue,

    /// Record the failed step, then finalize and submit the session before
    /// the failure is returned to the caller
    FinalizeAndSubmit,
}

/// Behavioral options carried alongside the credentials
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReporterOptions {
    /// Keep-alive interval hint for long sessions (millis)
    pub ping_interval: Option<u64>,

    /// Whether integrations should capture screenshots automatically
    pub auto_screenshot: bool,

    /// Failure handling for step actions
    pub step_failure: StepFailurePolicy,
}

/// Full reporter configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReporterConfig {
    /// Bearer credential for the collection API
    pub api_key: String,

    /// Collection API base URL
    pub endpoint: String,

    /// Behavioral options
    pub options: ReporterOptions,
}

impl ReporterConfig {
    /// Create a configuration with the given key and all defaults
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: env::var(ENV_ENDPOINT).unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            options: ReporterOptions::from_env(),
        }
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn options(mut self, options: ReporterOptions) -> Self {
        self.options = options;
        self
    }

    pub fn step_failure(mut self, policy: StepFailurePolicy) -> Self {
        self.options.step_failure = policy;
        self
    }
}

impl ReporterOptions {
    /// Create options from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            ping_interval: env::var(ENV_PING_INTERVAL).ok().and_then(|s| s.parse().ok()),
            auto_screenshot: env::var(ENV_AUTO_SCREENSHOT)
                .map(|s| s == "1" || s.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            step_failure: StepFailurePolicy::Continue,
        }
    }
}

// ============================================================================
// Config File Format
// ============================================================================

/// On-disk shape of `reporter.config.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    /// Bearer credential for the collection API
    pub api_key: String,

    /// Optional behavioral options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<ConfigFileOptions>,
}

/// Options block within the config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFileOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ping_interval: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_screenshot: Option<bool>,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors from explicit configuration loading or writing
#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read or written
    Io(std::io::Error),

    /// Config file is not valid JSON or has the wrong shape
    Parse(serde_json::Error),

    /// Config file parsed but carries an empty API key
    MissingApiKey(PathBuf),

    /// Refused to overwrite an existing file
    AlreadyExists(PathBuf),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "I/O error: {}", err),
            ConfigError::Parse(err) => write!(f, "Invalid config file: {}", err),
            ConfigError::MissingApiKey(path) => {
                write!(f, "No API key in config file: {}", path.display())
            }
            ConfigError::AlreadyExists(path) => {
                write!(f, "Config file already exists: {}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load configuration from a specific file.
pub fn load_file(path: impl AsRef<Path>) -> ConfigResult<ReporterConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)?;
    let file: ConfigFile = serde_json::from_str(&contents)?;

    if file.api_key.trim().is_empty() {
        return Err(ConfigError::MissingApiKey(path.to_path_buf()));
    }

    let file_options = file.options.unwrap_or_default();
    let mut options = ReporterOptions::from_env();
    if file_options.ping_interval.is_some() {
        options.ping_interval = file_options.ping_interval;
    }
    if let Some(auto) = file_options.auto_screenshot {
        options.auto_screenshot = auto;
    }

    Ok(ReporterConfig::new(file.api_key).options(options))
}

/// Best-effort configuration discovery.
///
/// Tries the `QAFLOW_CONFIG_PATH` file, then `reporter.config.json` in the
/// current directory, then the `QAFLOW_API_KEY` environment variable. Every
/// failure downgrades to a warning and the next source is tried.
pub fn discover() -> Option<ReporterConfig> {
    let candidates: Vec<PathBuf> = env::var(ENV_CONFIG_PATH)
        .ok()
        .map(PathBuf::from)
        .into_iter()
        .chain(std::iter::once(PathBuf::from(DEFAULT_CONFIG_FILE)))
        .collect();

    for path in candidates {
        if !path.exists() {
            continue;
        }
        match load_file(&path) {
            Ok(config) => return Some(config),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unusable config file");
            }
        }
    }

    match env::var(ENV_API_KEY) {
        Ok(key) if !key.trim().is_empty() => Some(ReporterConfig::new(key)),
        _ => {
            warn!("no reporter config found; call initialize() with an API key before reporting");
            None
        }
    }
}

// ============================================================================
// Scaffolding
// ============================================================================

/// Render a starter config file body.
pub fn config_template(api_key: &str) -> String {
    let file = ConfigFile {
        api_key: api_key.to_string(),
        options: None,
    };
    let mut body = serde_json::to_string_pretty(&file).unwrap_or_default();
    body.push('\n');
    body
}

/// Write a starter config file, refusing to clobber unless `force` is set.
pub fn write_config_file(path: impl AsRef<Path>, api_key: &str, force: bool) -> ConfigResult<()> {
    let path = path.as_ref();
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()));
    }
    std::fs::write(path, config_template(api_key))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_defaults() {
        let config = ReporterConfig::new("key-123");
        assert_eq!(config.api_key, "key-123");
        assert_eq!(config.options.step_failure, StepFailurePolicy::Continue);
        assert!(!config.options.auto_screenshot);
    }

    #[test]
    fn test_load_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reporter.config.json");
        std::fs::write(
            &path,
            r#"{"apiKey": "abc", "options": {"pingInterval": 5000, "autoScreenshot": true}}"#,
        )
        .unwrap();

        let config = load_file(&path).unwrap();
        assert_eq!(config.api_key, "abc");
        assert_eq!(config.options.ping_interval, Some(5000));
        assert!(config.options.auto_screenshot);
    }

    #[test]
    fn test_load_file_rejects_empty_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reporter.config.json");
        std::fs::write(&path, r#"{"apiKey": "  "}"#).unwrap();

        match load_file(&path) {
            Err(ConfigError::MissingApiKey(_)) => {}
            other => panic!("expected MissingApiKey, got {:?}", other),
        }
    }

    #[test]
    fn test_load_file_rejects_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reporter.config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(load_file(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_write_config_file_respects_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reporter.config.json");

        write_config_file(&path, "first", false).unwrap();
        assert!(matches!(
            write_config_file(&path, "second", false),
            Err(ConfigError::AlreadyExists(_))
        ));

        write_config_file(&path, "second", true).unwrap();
        let config = load_file(&path).unwrap();
        assert_eq!(config.api_key, "second");
    }

    #[test]
    fn test_template_parses_back() {
        let body = config_template("YOUR_API_KEY_HERE");
        let file: ConfigFile = serde_json::from_str(&body).unwrap();
        assert_eq!(file.api_key, "YOUR_API_KEY_HERE");
    }
}
