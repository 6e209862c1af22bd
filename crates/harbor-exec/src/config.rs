//! Executor configuration.
//!
//! [`ExecutorConfig`] bundles the resource bounds and capability flags that
//! shape a single executor instance: wall-clock timeout, output ceiling, the
//! set of permitted languages, and the advisory sandbox flags that relax
//! matching security checks. Configuration arrives either programmatically
//! through the builder methods or as an opaque JSON object via
//! [`ExecutorConfig::from_value`].

use std::collections::BTreeSet;
use std::time::Duration;

use harbor_gate::{GatePolicy, Language};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

const CONFIG_TARGET: &str = "harbor_exec::config";

/// Default wall-clock timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Default maximum captured output length, in characters.
pub const DEFAULT_MAX_OUTPUT_LENGTH: usize = 10_000;
/// Default interpreter binary for Python requests.
pub const DEFAULT_PYTHON_BINARY: &str = "python3";
/// Default shell binary for shell requests.
pub const DEFAULT_SHELL_BINARY: &str = "/bin/sh";

/// Configuration keys recognised by [`ExecutorConfig::from_value`].
const KNOWN_KEYS: [&str; 9] = [
    "timeout",
    "max_output_length",
    "allowed_languages",
    "sandboxed",
    "allow_network",
    "allow_file_access",
    "max_operations",
    "python_binary",
    "shell_binary",
];

/// Error raised when an executor configuration cannot be parsed or fails
/// validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration value was malformed or violated a bound.
    #[error("invalid executor configuration: {message}")]
    Invalid {
        /// Description of the offending key or value.
        message: String,
    },
}

/// Resource bounds and capability flags for a sandboxed executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    #[serde(rename = "timeout")]
    timeout_secs: u64,
    max_output_length: usize,
    allowed_languages: BTreeSet<Language>,
    sandboxed: bool,
    allow_network: bool,
    allow_file_access: bool,
    max_operations: u64,
    python_binary: String,
    shell_binary: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_output_length: DEFAULT_MAX_OUTPUT_LENGTH,
            allowed_languages: Language::all().iter().copied().collect(),
            sandboxed: true,
            allow_network: false,
            allow_file_access: false,
            max_operations: 0,
            python_binary: DEFAULT_PYTHON_BINARY.to_owned(),
            shell_binary: DEFAULT_SHELL_BINARY.to_owned(),
        }
    }
}

impl ExecutorConfig {
    /// Creates a configuration with the default bounds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from an opaque JSON object.
    ///
    /// A `null` value yields the defaults. Missing keys fall back to their
    /// defaults. Unknown keys are logged at warn level and ignored so that
    /// configuration written for a newer executor degrades gracefully.
    /// Malformed values for known keys are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a known key holds a value of the
    /// wrong shape, or when the parsed configuration fails validation.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        if let Some(object) = value.as_object() {
            for key in object.keys() {
                if !KNOWN_KEYS.contains(&key.as_str()) {
                    warn!(
                        target: CONFIG_TARGET,
                        key = key.as_str(),
                        "ignoring unknown executor configuration key"
                    );
                }
            }
        }
        let config: Self = serde_json::from_value(value.clone())
            .map_err(|err| ConfigError::Invalid { message: err.to_string() })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                message: String::from("timeout must be positive"),
            });
        }
        if self.python_binary.is_empty() || self.shell_binary.is_empty() {
            return Err(ConfigError::Invalid {
                message: String::from("interpreter binaries must not be empty"),
            });
        }
        Ok(())
    }

    /// Replaces the wall-clock timeout, in seconds.
    #[must_use]
    pub const fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Replaces the maximum captured output length, in characters.
    #[must_use]
    pub const fn with_max_output_length(mut self, max_output_length: usize) -> Self {
        self.max_output_length = max_output_length;
        self
    }

    /// Replaces the set of languages the executor accepts.
    #[must_use]
    pub fn with_allowed_languages(mut self, languages: impl IntoIterator<Item = Language>) -> Self {
        self.allowed_languages = languages.into_iter().collect();
        self
    }

    /// Sets whether shell requests are screened for metacharacters.
    #[must_use]
    pub const fn with_sandboxed(mut self, sandboxed: bool) -> Self {
        self.sandboxed = sandboxed;
        self
    }

    /// Sets whether network-related source patterns are tolerated.
    #[must_use]
    pub const fn with_allow_network(mut self, allow_network: bool) -> Self {
        self.allow_network = allow_network;
        self
    }

    /// Sets whether file-access source patterns are tolerated.
    #[must_use]
    pub const fn with_allow_file_access(mut self, allow_file_access: bool) -> Self {
        self.allow_file_access = allow_file_access;
        self
    }

    /// Replaces the script operation budget. Zero disables the budget and
    /// leaves the wall-clock timeout as the only bound.
    #[must_use]
    pub const fn with_max_operations(mut self, max_operations: u64) -> Self {
        self.max_operations = max_operations;
        self
    }

    /// Replaces the Python interpreter binary.
    #[must_use]
    pub fn with_python_binary(mut self, python_binary: impl Into<String>) -> Self {
        self.python_binary = python_binary.into();
        self
    }

    /// Replaces the shell binary.
    #[must_use]
    pub fn with_shell_binary(mut self, shell_binary: impl Into<String>) -> Self {
        self.shell_binary = shell_binary.into();
        self
    }

    /// Wall-clock timeout applied to each execution.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Wall-clock timeout, in seconds.
    #[must_use]
    pub const fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Maximum captured output length, in characters.
    #[must_use]
    pub const fn max_output_length(&self) -> usize {
        self.max_output_length
    }

    /// Languages the executor accepts.
    #[must_use]
    pub const fn allowed_languages(&self) -> &BTreeSet<Language> {
        &self.allowed_languages
    }

    /// Reports whether `language` is in the allowed set.
    #[must_use]
    pub fn is_language_allowed(&self, language: Language) -> bool {
        self.allowed_languages.contains(&language)
    }

    /// Comma-separated rendering of the allowed languages, for diagnostics.
    #[must_use]
    pub fn allowed_languages_label(&self) -> String {
        self.allowed_languages
            .iter()
            .copied()
            .map(Language::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Whether shell requests are screened for metacharacters.
    #[must_use]
    pub const fn sandboxed(&self) -> bool {
        self.sandboxed
    }

    /// Whether network-related source patterns are tolerated.
    #[must_use]
    pub const fn allow_network(&self) -> bool {
        self.allow_network
    }

    /// Whether file-access source patterns are tolerated.
    #[must_use]
    pub const fn allow_file_access(&self) -> bool {
        self.allow_file_access
    }

    /// Script operation budget. Zero means unlimited.
    #[must_use]
    pub const fn max_operations(&self) -> u64 {
        self.max_operations
    }

    /// Python interpreter binary.
    #[must_use]
    pub fn python_binary(&self) -> &str {
        &self.python_binary
    }

    /// Shell binary.
    #[must_use]
    pub fn shell_binary(&self) -> &str {
        &self.shell_binary
    }

    /// Derives the security-gate policy implied by the capability flags.
    #[must_use]
    pub const fn gate_policy(&self) -> GatePolicy {
        let mut policy = GatePolicy::new();
        if !self.sandboxed {
            policy = policy.unsandboxed();
        }
        if self.allow_network {
            policy = policy.permit_network();
        }
        if self.allow_file_access {
            policy = policy.permit_file_access();
        }
        policy
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    fn defaults_match_documented_bounds() {
        let config = ExecutorConfig::default();
        assert_eq!(config.timeout_secs(), DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.max_output_length(), DEFAULT_MAX_OUTPUT_LENGTH);
        assert_eq!(config.allowed_languages().len(), Language::all().len());
        assert!(config.sandboxed());
        assert!(!config.allow_network());
        assert!(!config.allow_file_access());
        assert_eq!(config.max_operations(), 0);
        assert_eq!(config.python_binary(), DEFAULT_PYTHON_BINARY);
        assert_eq!(config.shell_binary(), DEFAULT_SHELL_BINARY);
    }

    #[rstest]
    fn from_value_applies_overrides() {
        let value = json!({
            "timeout": 5,
            "max_output_length": 64,
            "allowed_languages": ["python"],
            "sandboxed": false,
        });
        let config = ExecutorConfig::from_value(&value).expect("config should parse");
        assert_eq!(config.timeout_secs(), 5);
        assert_eq!(config.max_output_length(), 64);
        assert!(config.is_language_allowed(Language::Python));
        assert!(!config.is_language_allowed(Language::Shell));
        assert!(!config.sandboxed());
    }

    #[rstest]
    fn from_value_tolerates_unknown_keys() {
        let value = json!({ "timeout": 5, "colour": "mauve" });
        let config = ExecutorConfig::from_value(&value).expect("config should parse");
        assert_eq!(config.timeout_secs(), 5);
    }

    #[rstest]
    fn from_value_treats_null_as_defaults() {
        let config = ExecutorConfig::from_value(&Value::Null).expect("null should parse");
        assert_eq!(config, ExecutorConfig::default());
    }

    #[rstest]
    #[case::wrong_type(json!({ "timeout": "fast" }))]
    #[case::zero_timeout(json!({ "timeout": 0 }))]
    #[case::empty_binary(json!({ "python_binary": "" }))]
    fn from_value_rejects_invalid_values(#[case] value: serde_json::Value) {
        let error = ExecutorConfig::from_value(&value).expect_err("config should be rejected");
        assert!(error.to_string().starts_with("invalid executor configuration"));
    }

    #[rstest]
    fn gate_policy_mirrors_capability_flags() {
        let config = ExecutorConfig::new()
            .with_sandboxed(false)
            .with_allow_network(true);
        let policy = config.gate_policy();
        assert!(!policy.sandboxed());
        assert!(policy.allows_network());
        assert!(!policy.allows_file_access());
    }

    #[rstest]
    fn allowed_languages_label_is_sorted_and_joined() {
        let config = ExecutorConfig::new()
            .with_allowed_languages([Language::Shell, Language::Rhai]);
        assert_eq!(config.allowed_languages_label(), "rhai, shell");
    }
}
