// crates/profile-updater-config/src/config.rs
// ============================================================================
// Module: Profile Updater Configuration
// Description: Configuration loading and validation for the profile updater.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: profile-updater-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path comes from the caller, then the `PROFILE_UPDATER_CONFIG`
//! environment variable, then `profile-updater.toml` in the working
//! directory. Only the implicit default file may be absent; in that case the
//! built-in defaults apply. Command-line overrides are merged with
//! [`ProfileUpdaterConfig::apply_overrides`] and re-validated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use profile_updater_core::MAX_RECORD_FIELD_BYTES;
use profile_updater_core::PacingPolicy;
use profile_updater_core::ScopeId;
use profile_updater_core::runtime::MAX_CONCURRENCY;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "profile-updater.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "PROFILE_UPDATER_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Minimum remote operation timeout in milliseconds.
pub(crate) const MIN_TIMEOUT_MS: u64 = 1_000;
/// Maximum remote operation timeout in milliseconds.
pub(crate) const MAX_TIMEOUT_MS: u64 = 120_000;
/// Maximum search page size accepted by the directory.
pub(crate) const MAX_PAGE_SIZE: u32 = 100;
/// Maximum region name length.
pub(crate) const MAX_REGION_LENGTH: usize = 64;
/// Maximum base delay and transient step in milliseconds.
pub(crate) const MAX_STEP_MS: u64 = 60_000;
/// Maximum throttling backoff cap in milliseconds.
pub(crate) const MAX_BACKOFF_MS: u64 = 600_000;
/// Maximum throttled attempts per call.
pub(crate) const MAX_THROTTLE_ATTEMPTS: u32 = 20;
/// Maximum transient attempts per call.
pub(crate) const MAX_TRANSIENT_ATTEMPTS: u32 = 10;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Top-level profile updater configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdaterConfig {
    /// Remote directory settings.
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Pacing and retry limits.
    #[serde(default)]
    pub pacing: PacingConfig,
    /// Batch execution settings.
    #[serde(default)]
    pub batch: BatchConfig,
    /// Run log settings.
    #[serde(default)]
    pub log: LogConfig,
}

impl ProfileUpdaterConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        validate_path(&resolved)?;
        if !explicit && !resolved.exists() {
            return Ok(Self::default());
        }
        let bytes = fs::read(&resolved).map_err(|err| {
            ConfigError::Io(format!("{}: {err}", resolved.display()))
        })?;
        Self::from_bytes(&bytes)
    }

    /// Parses and validates configuration from raw file contents.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the content is oversized, not UTF-8,
    /// not valid TOML, or fails validation.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.remote.validate()?;
        self.pacing.validate()?;
        self.batch.validate()?;
        self.log.validate()?;
        Ok(())
    }

    /// Merges command-line overrides and re-validates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an override is out of range.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> Result<(), ConfigError> {
        if let Some(instance_id) = &overrides.instance_id {
            self.remote.instance_id = Some(instance_id.clone());
        }
        if let Some(concurrency) = overrides.concurrency {
            self.batch.concurrency = concurrency;
        }
        if let Some(directory) = &overrides.log_directory {
            self.log.directory = directory.clone();
        }
        if overrides.quiet {
            self.log.console = false;
        }
        self.validate()
    }

    /// Returns the scope id every call runs against.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when no instance id was configured.
    pub fn scope(&self) -> Result<ScopeId, ConfigError> {
        self.remote
            .instance_id
            .as_deref()
            .map(|id| ScopeId::new(id.trim()))
            .ok_or_else(|| ConfigError::Invalid("remote.instance_id must be set".to_string()))
    }

    /// Returns the pacing policy described by `[pacing]`.
    #[must_use]
    pub const fn pacing_policy(&self) -> PacingPolicy {
        self.pacing.policy()
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Instance id override.
    pub instance_id: Option<String>,
    /// Worker count override.
    pub concurrency: Option<usize>,
    /// Log directory override.
    pub log_directory: Option<PathBuf>,
    /// Disable console output.
    pub quiet: bool,
}

// ============================================================================
// SECTION: Remote
// ============================================================================

/// Remote directory configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    /// Directory instance id (the batch scope).
    #[serde(default)]
    pub instance_id: Option<String>,
    /// Optional region (defaults to the environment).
    #[serde(default)]
    pub region: Option<String>,
    /// Optional endpoint override (for compatible test endpoints).
    #[serde(default)]
    pub endpoint_url: Option<String>,
    /// Allow non-TLS endpoints (explicit opt-in).
    #[serde(default)]
    pub allow_http: bool,
    /// Per-operation timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Search page size.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            instance_id: None,
            region: None,
            endpoint_url: None,
            allow_http: false,
            timeout_ms: default_timeout_ms(),
            page_size: default_page_size(),
        }
    }
}

impl RemoteConfig {
    /// Returns the per-operation timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validates remote configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(instance_id) = &self.instance_id {
            validate_identifier("remote.instance_id", instance_id)?;
        }
        if let Some(region) = &self.region {
            let trimmed = region.trim();
            if trimmed.is_empty() || trimmed.len() > MAX_REGION_LENGTH {
                return Err(ConfigError::Invalid(format!(
                    "remote.region must be 1..={MAX_REGION_LENGTH} characters"
                )));
            }
            if !trimmed.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-') {
                return Err(ConfigError::Invalid(
                    "remote.region must contain only letters, digits, and '-'".to_string(),
                ));
            }
        }
        if let Some(endpoint) = &self.endpoint_url {
            let trimmed = endpoint.trim();
            if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
                return Err(ConfigError::Invalid(
                    "remote.endpoint_url must include http:// or https://".to_string(),
                ));
            }
            if trimmed.starts_with("http://") && !self.allow_http {
                return Err(ConfigError::Invalid(
                    "remote.endpoint_url uses http:// without allow_http".to_string(),
                ));
            }
        }
        if !(MIN_TIMEOUT_MS ..= MAX_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "remote.timeout_ms must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS}"
            )));
        }
        if !(1 ..= MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(ConfigError::Invalid(format!(
                "remote.page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Pacing
// ============================================================================

/// Pacing and retry configuration, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PacingConfig {
    /// Minimum spacing between call starts.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Throttled attempts allowed per call.
    #[serde(default = "default_throttle_max_attempts")]
    pub throttle_max_attempts: u32,
    /// Backoff after the first throttling signal.
    #[serde(default = "default_throttle_initial_backoff_ms")]
    pub throttle_initial_backoff_ms: u64,
    /// Upper bound for throttling backoff.
    #[serde(default = "default_throttle_max_backoff_ms")]
    pub throttle_max_backoff_ms: u64,
    /// Transient attempts allowed per call.
    #[serde(default = "default_transient_max_attempts")]
    pub transient_max_attempts: u32,
    /// Linear backoff step for transient failures.
    #[serde(default = "default_transient_backoff_ms")]
    pub transient_backoff_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            throttle_max_attempts: default_throttle_max_attempts(),
            throttle_initial_backoff_ms: default_throttle_initial_backoff_ms(),
            throttle_max_backoff_ms: default_throttle_max_backoff_ms(),
            transient_max_attempts: default_transient_max_attempts(),
            transient_backoff_ms: default_transient_backoff_ms(),
        }
    }
}

impl PacingConfig {
    /// Converts the millisecond fields into a [`PacingPolicy`].
    #[must_use]
    pub const fn policy(&self) -> PacingPolicy {
        PacingPolicy {
            base_delay: Duration::from_millis(self.base_delay_ms),
            throttle_max_attempts: self.throttle_max_attempts,
            throttle_initial_backoff: Duration::from_millis(self.throttle_initial_backoff_ms),
            throttle_max_backoff: Duration::from_millis(self.throttle_max_backoff_ms),
            transient_max_attempts: self.transient_max_attempts,
            transient_backoff: Duration::from_millis(self.transient_backoff_ms),
        }
    }

    /// Validates pacing limits.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.base_delay_ms > MAX_STEP_MS {
            return Err(ConfigError::Invalid(format!(
                "pacing.base_delay_ms must be at most {MAX_STEP_MS}"
            )));
        }
        if !(1 ..= MAX_THROTTLE_ATTEMPTS).contains(&self.throttle_max_attempts) {
            return Err(ConfigError::Invalid(format!(
                "pacing.throttle_max_attempts must be between 1 and {MAX_THROTTLE_ATTEMPTS}"
            )));
        }
        if self.throttle_initial_backoff_ms == 0 || self.throttle_initial_backoff_ms > MAX_STEP_MS {
            return Err(ConfigError::Invalid(format!(
                "pacing.throttle_initial_backoff_ms must be between 1 and {MAX_STEP_MS}"
            )));
        }
        if self.throttle_max_backoff_ms < self.throttle_initial_backoff_ms
            || self.throttle_max_backoff_ms > MAX_BACKOFF_MS
        {
            return Err(ConfigError::Invalid(format!(
                "pacing.throttle_max_backoff_ms must be between throttle_initial_backoff_ms and \
                 {MAX_BACKOFF_MS}"
            )));
        }
        if !(1 ..= MAX_TRANSIENT_ATTEMPTS).contains(&self.transient_max_attempts) {
            return Err(ConfigError::Invalid(format!(
                "pacing.transient_max_attempts must be between 1 and {MAX_TRANSIENT_ATTEMPTS}"
            )));
        }
        if self.transient_backoff_ms > MAX_STEP_MS {
            return Err(ConfigError::Invalid(format!(
                "pacing.transient_backoff_ms must be at most {MAX_STEP_MS}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Batch
// ============================================================================

/// Batch execution configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchConfig {
    /// Worker count; 1 is strictly sequential.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

impl BatchConfig {
    /// Validates batch settings.
    fn validate(self) -> Result<(), ConfigError> {
        if !(1 ..= MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(ConfigError::Invalid(format!(
                "batch.concurrency must be between 1 and {MAX_CONCURRENCY}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Log
// ============================================================================

/// Run log configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Directory receiving the per-run log file.
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,
    /// Mirror events to the console.
    #[serde(default = "default_console")]
    pub console: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
            console: default_console(),
        }
    }
}

impl LogConfig {
    /// Validates log settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("log.directory", &self.directory.to_string_lossy())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default per-operation timeout.
const fn default_timeout_ms() -> u64 {
    30_000
}

/// Default search page size.
const fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

/// Default base delay.
const fn default_base_delay_ms() -> u64 {
    250
}

/// Default throttled attempt cap.
const fn default_throttle_max_attempts() -> u32 {
    6
}

/// Default first throttling backoff.
const fn default_throttle_initial_backoff_ms() -> u64 {
    1_000
}

/// Default throttling backoff cap.
const fn default_throttle_max_backoff_ms() -> u64 {
    30_000
}

/// Default transient attempt cap.
const fn default_transient_max_attempts() -> u32 {
    3
}

/// Default transient backoff step.
const fn default_transient_backoff_ms() -> u64 {
    500
}

/// Default worker count.
const fn default_concurrency() -> usize {
    1
}

/// Default log directory.
fn default_log_directory() -> PathBuf {
    PathBuf::from(".")
}

/// Console output is on unless disabled.
const fn default_console() -> bool {
    true
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path; the flag is true unless the default name was used.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates an identifier value.
fn validate_identifier(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_RECORD_FIELD_BYTES {
        return Err(ConfigError::Invalid(format!(
            "{field} exceeds {MAX_RECORD_FIELD_BYTES} bytes"
        )));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(ConfigError::Invalid(format!("{field} contains control characters")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
