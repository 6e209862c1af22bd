//! Plugin host error types.

use thiserror::Error;

use crate::lifecycle::LifecycleState;

/// Errors raised by the plugin host and its collaborators.
///
/// Failures *inside* a plugin's `execute` are not errors: the host converts
/// them into in-band failure maps. This enum covers the host's own contract
/// with callers: unknown identifiers, lifecycle conflicts, load and cleanup
/// faults, and internal lock poisoning surfaced as an error rather than a
/// panic.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PluginError {
    /// No plugin with this identifier is currently loaded.
    #[error("plugin '{id}' not found in registry")]
    NotFound {
        /// The identifier that failed to resolve.
        id: String,
    },

    /// A plugin with this identifier is already loaded.
    #[error("plugin '{id}' is already loaded")]
    AlreadyLoaded {
        /// The identifier of the existing instance.
        id: String,
    },

    /// The plugin could not be resolved, constructed, or initialised.
    #[error("plugin '{id}' failed to load: {message}")]
    Load {
        /// The identifier that was being loaded.
        id: String,
        /// Description of the resolution, construction, or initialise fault.
        message: String,
    },

    /// The plugin's cleanup hook failed during unload.
    #[error("plugin '{id}' failed to clean up: {message}")]
    Cleanup {
        /// The identifier that was being unloaded.
        id: String,
        /// Description of the cleanup fault.
        message: String,
    },

    /// A lifecycle transition was requested that the state machine forbids.
    #[error("plugin '{id}' cannot transition from {from} to {to}")]
    Lifecycle {
        /// The identifier whose transition was refused.
        id: String,
        /// The state the plugin is currently in.
        from: LifecycleState,
        /// The state the caller asked for.
        to: LifecycleState,
    },

    /// Required parameters were absent from an execution request.
    #[error("plugin '{plugin}' missing required parameters: {missing:?}")]
    MissingParameters {
        /// The plugin that rejected the request.
        plugin: String,
        /// The parameter names that were absent.
        missing: Vec<String>,
    },

    /// The plugin is loaded but its current state forbids execution.
    #[error("plugin '{id}' is not executable while {state}")]
    NotExecutable {
        /// The identifier that was asked to execute.
        id: String,
        /// The state that forbids execution.
        state: LifecycleState,
    },

    /// The plugin's configuration blob was malformed.
    #[error("plugin '{id}' has invalid configuration: {message}")]
    Config {
        /// The identifier whose configuration was rejected.
        id: String,
        /// Description of the offending key or value.
        message: String,
    },

    /// An internal lock was poisoned by a panicking writer.
    #[error("{what} lock poisoned")]
    Poisoned {
        /// The lock that was found poisoned.
        what: String,
    },
}

impl PluginError {
    /// Shorthand for a [`PluginError::Poisoned`] over the named lock.
    pub(crate) fn poisoned(what: &str) -> Self {
        Self::Poisoned {
            what: what.to_owned(),
        }
    }
}
