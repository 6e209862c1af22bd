//! The capability contract every plugin implements.
//!
//! A plugin is a [`Plugin`] trait object: identity via an immutable
//! descriptor, optional `initialize`/`cleanup` hooks around its registry
//! lifetime, an [`ActivationPolicy`] deciding whether loading alone makes it
//! executable, and an `execute` entry point consuming an opaque
//! [`Parameters`] map. Plugins are shared across threads by the host, so the
//! contract requires `Send + Sync` and `execute` takes `&self`.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::descriptor::PluginDescriptor;
use crate::error::PluginError;

/// When a loaded plugin becomes eligible for execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationPolicy {
    /// Executable as soon as it is loaded; activation is implicit.
    OnLoad,
    /// Requires an explicit activation step after loading.
    #[default]
    Explicit,
}

/// Opaque execution parameters, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(HashMap<String, Value>);

impl Parameters {
    /// Creates an empty parameter map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a parameter, replacing any existing value under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Returns the raw value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the value for `key` when it is a string.
    #[must_use]
    pub fn string(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns the value for `key` when it is an integer.
    #[must_use]
    pub fn integer(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    /// Returns the value for `key` when it is a boolean.
    #[must_use]
    pub fn boolean(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Reports whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Validates that every name in `names` is present.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::MissingParameters`] naming `plugin` and every
    /// absent parameter, in the order requested.
    pub fn require(&self, plugin: &str, names: &[&str]) -> Result<(), PluginError> {
        let missing: Vec<String> = names
            .iter()
            .filter(|name| !self.0.contains_key(**name))
            .map(|name| (*name).to_owned())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PluginError::MissingParameters {
                plugin: plugin.to_owned(),
                missing,
            })
        }
    }

    /// Copies the parameters into a JSON object map.
    #[must_use]
    pub fn to_json_map(&self) -> Map<String, Value> {
        self.0
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl From<HashMap<String, Value>> for Parameters {
    fn from(map: HashMap<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A request to execute one plugin.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRequest {
    plugin_id: String,
    parameters: Parameters,
}

impl ExecutionRequest {
    /// Creates a request with empty parameters.
    pub fn new(plugin_id: impl Into<String>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            parameters: Parameters::new(),
        }
    }

    /// Attaches the parameter map.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// The plugin to execute.
    #[must_use]
    pub const fn plugin_id(&self) -> &str {
        self.plugin_id.as_str()
    }

    /// The request parameters.
    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }
}

/// Contract implemented by every plugin the host can manage.
pub trait Plugin: Send + Sync {
    /// The plugin's immutable identity and capability metadata.
    fn descriptor(&self) -> &PluginDescriptor;

    /// When the plugin becomes eligible for execution.
    fn activation_policy(&self) -> ActivationPolicy {
        ActivationPolicy::Explicit
    }

    /// Called once during load, before the plugin enters the registry.
    ///
    /// # Errors
    ///
    /// A failure aborts the load and the plugin is never registered.
    fn initialize(&self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Runs one request against the plugin.
    ///
    /// # Errors
    ///
    /// Failures are converted by the host into in-band
    /// `{success: false, error}` result maps; they never abort the host.
    fn execute(&self, parameters: &Parameters) -> Result<Value, PluginError>;

    /// Called once during unload, after in-flight executions have drained.
    ///
    /// # Errors
    ///
    /// A failure aborts the unload and the plugin stays registered.
    fn cleanup(&self) -> Result<(), PluginError> {
        Ok(())
    }
}

impl fmt::Debug for dyn Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("id", &self.descriptor().id())
            .finish_non_exhaustive()
    }
}
