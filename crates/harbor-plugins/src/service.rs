//! The install/activate/execute surface embedders drive.
//!
//! [`PluginService`] pairs a [`PluginHost`] with a [`DescriptorStore`] and
//! keeps the two in step: installing records a descriptor without loading
//! anything, activating loads the instance with the record's configuration
//! and marks the record, and executing auto-activates installed plugins the
//! way the platform's agents expect.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::contract::{ExecutionRequest, Parameters};
use crate::error::PluginError;
use crate::host::PluginHost;
use crate::lifecycle::LifecycleState;
use crate::store::{DescriptorStore, PluginRecord, PluginStatus, StoreError};

const SERVICE_TARGET: &str = "harbor_plugins::service";

/// Error raised by the service layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// The underlying host operation failed.
    #[error(transparent)]
    Plugin(#[from] PluginError),
    /// The plugin has no installation record.
    #[error("plugin '{id}' is not installed")]
    NotInstalled {
        /// The uninstalled plugin.
        id: String,
    },
    /// The plugin already has an installation record.
    #[error("plugin '{id}' is already installed")]
    AlreadyInstalled {
        /// The installed plugin.
        id: String,
    },
    /// The descriptor store failed.
    #[error("plugin store failure: {message}")]
    Store {
        /// The backend's description of the failure.
        message: String,
    },
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        Self::Store {
            message: err.to_string(),
        }
    }
}

/// Installation and execution workflows over a host and a store.
#[derive(Clone)]
pub struct PluginService {
    host: Arc<PluginHost>,
    store: Arc<dyn DescriptorStore>,
}

impl PluginService {
    /// Creates a service over a shared host and store.
    #[must_use]
    pub fn new(host: Arc<PluginHost>, store: Arc<dyn DescriptorStore>) -> Self {
        Self { host, store }
    }

    /// The host this service drives.
    #[must_use]
    pub fn host(&self) -> &PluginHost {
        &self.host
    }

    /// Records a plugin as installed without loading it.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::AlreadyInstalled`] when a record exists,
    /// [`ServiceError::Plugin`] when no binding carries this id, and
    /// [`ServiceError::Store`] for backend failures.
    pub fn install(&self, plugin_id: &str) -> Result<(), ServiceError> {
        if self.store.get(plugin_id)?.is_some() {
            return Err(ServiceError::AlreadyInstalled {
                id: plugin_id.to_owned(),
            });
        }
        let descriptor = self.host.binding_descriptor(plugin_id)?;
        self.store.put(PluginRecord::new(descriptor))?;
        info!(target: SERVICE_TARGET, plugin = plugin_id, "plugin installed");
        Ok(())
    }

    /// Unloads the plugin when live and deletes its record.
    ///
    /// Returns `Ok(false)` when no record existed.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Plugin`] when unloading fails (the record is
    /// then kept) and [`ServiceError::Store`] for backend failures.
    pub fn uninstall(&self, plugin_id: &str) -> Result<bool, ServiceError> {
        self.host.unload(plugin_id)?;
        let existed = self.store.delete(plugin_id)?;
        if existed {
            info!(target: SERVICE_TARGET, plugin = plugin_id, "plugin uninstalled");
        }
        Ok(existed)
    }

    /// Loads (if necessary) and activates an installed plugin.
    ///
    /// The record's configuration blob is applied before loading. A plugin
    /// that is already activated stays activated. When loading fails, the
    /// record's status is set to [`PluginStatus::Error`] before the error
    /// propagates.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotInstalled`] without a record,
    /// [`ServiceError::Plugin`] for load or lifecycle failures, and
    /// [`ServiceError::Store`] for backend failures.
    pub fn activate(&self, plugin_id: &str) -> Result<(), ServiceError> {
        let record = self.require_record(plugin_id)?;
        if !self.host.is_loaded(plugin_id)? {
            self.host.set_config(plugin_id, record.config().clone())?;
            if let Err(err) = self.host.load(plugin_id) {
                self.mark_errored(plugin_id);
                return Err(ServiceError::Plugin(err));
            }
        }
        match self.host.activate(plugin_id) {
            Ok(())
            | Err(PluginError::Lifecycle {
                from: LifecycleState::Activated,
                ..
            }) => {}
            Err(err) => return Err(ServiceError::Plugin(err)),
        }
        self.store.set_status(plugin_id, PluginStatus::Activated)?;
        info!(target: SERVICE_TARGET, plugin = plugin_id, "plugin activated");
        Ok(())
    }

    /// Deactivates an installed plugin and records the new status.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotInstalled`] without a record,
    /// [`ServiceError::Plugin`] when the host transition is invalid, and
    /// [`ServiceError::Store`] for backend failures.
    pub fn deactivate(&self, plugin_id: &str) -> Result<(), ServiceError> {
        self.require_record(plugin_id)?;
        self.host.deactivate(plugin_id)?;
        self.store.set_status(plugin_id, PluginStatus::Deactivated)?;
        info!(target: SERVICE_TARGET, plugin = plugin_id, "plugin deactivated");
        Ok(())
    }

    /// Executes an installed plugin, activating it first when needed.
    ///
    /// Installed-but-unloaded plugins are loaded with their stored
    /// configuration and activated on the fly; plugin-internal failures come
    /// back as `{success: false, error}` result maps through the host's
    /// catch-all boundary.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotInstalled`] without a record and
    /// propagates activation and host errors.
    pub fn execute(&self, plugin_id: &str, parameters: Parameters) -> Result<Value, ServiceError> {
        self.require_record(plugin_id)?;
        if self.host.lifecycle_state(plugin_id)? != LifecycleState::Activated {
            self.activate(plugin_id)?;
        }
        let request = ExecutionRequest::new(plugin_id).with_parameters(parameters);
        Ok(self.host.execute(&request)?)
    }

    fn require_record(&self, plugin_id: &str) -> Result<PluginRecord, ServiceError> {
        self.store
            .get(plugin_id)?
            .ok_or_else(|| ServiceError::NotInstalled {
                id: plugin_id.to_owned(),
            })
    }

    fn mark_errored(&self, plugin_id: &str) {
        if let Err(err) = self.store.set_status(plugin_id, PluginStatus::Error) {
            warn!(
                target: SERVICE_TARGET,
                plugin = plugin_id,
                error = %err,
                "failed to record error status"
            );
        }
    }
}

impl fmt::Debug for PluginService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginService")
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}
