//! Descriptor persistence for installed plugins.
//!
//! The service layer records which plugins an embedder has installed, their
//! administrative status, and their configuration blobs through the
//! [`DescriptorStore`] trait. [`InMemoryStore`] is the stock implementation
//! for tests and embedders without a persistence backend; anything durable
//! (a database, a config directory) implements the same four operations.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::descriptor::PluginDescriptor;

/// Administrative status of an installed plugin.
///
/// This is the service-level record, distinct from the host's runtime
/// lifecycle state: a plugin can be `Activated` here while the process that
/// hosted it has long restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginStatus {
    /// Installed but never activated.
    Installed,
    /// Activated and eligible for execution.
    Activated,
    /// Deactivated by the embedder.
    Deactivated,
    /// The last activation attempt failed to load the plugin.
    Error,
}

impl PluginStatus {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Installed => "installed",
            Self::Activated => "activated",
            Self::Deactivated => "deactivated",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for PluginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One installed plugin as the store sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginRecord {
    descriptor: PluginDescriptor,
    status: PluginStatus,
    config: Value,
}

impl PluginRecord {
    /// Creates a freshly installed record with an empty configuration.
    #[must_use]
    pub fn new(descriptor: PluginDescriptor) -> Self {
        Self {
            descriptor,
            status: PluginStatus::Installed,
            config: json!({}),
        }
    }

    /// Replaces the stored configuration blob.
    #[must_use]
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    /// Replaces the administrative status.
    #[must_use]
    pub const fn with_status(mut self, status: PluginStatus) -> Self {
        self.status = status;
        self
    }

    /// Identifier of the installed plugin.
    #[must_use]
    pub const fn id(&self) -> &str {
        self.descriptor.id()
    }

    /// Descriptor captured at install time.
    #[must_use]
    pub const fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    /// Current administrative status.
    #[must_use]
    pub const fn status(&self) -> PluginStatus {
        self.status
    }

    /// Stored configuration blob.
    #[must_use]
    pub const fn config(&self) -> &Value {
        &self.config
    }
}

/// Error raised by a descriptor store backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("descriptor store failed: {message}")]
pub struct StoreError {
    message: String,
}

impl StoreError {
    /// Creates a store error from a backend message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The backend's description of the failure.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Persistence backend for installed-plugin records.
pub trait DescriptorStore: Send + Sync {
    /// Inserts or replaces the record for its plugin id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend cannot persist the record.
    fn put(&self, record: PluginRecord) -> Result<(), StoreError>;

    /// Fetches the record for `plugin_id`, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend cannot be read.
    fn get(&self, plugin_id: &str) -> Result<Option<PluginRecord>, StoreError>;

    /// Updates the status of an existing record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when no record exists for `plugin_id` or the
    /// backend cannot be written.
    fn set_status(&self, plugin_id: &str, status: PluginStatus) -> Result<(), StoreError>;

    /// Deletes the record for `plugin_id`, reporting whether one existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend cannot be written.
    fn delete(&self, plugin_id: &str) -> Result<bool, StoreError>;
}

/// Volatile store backed by a process-local map.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<String, PluginRecord>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DescriptorStore for InMemoryStore {
    fn put(&self, record: PluginRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        records.insert(record.id().to_owned(), record);
        Ok(())
    }

    fn get(&self, plugin_id: &str) -> Result<Option<PluginRecord>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.get(plugin_id).cloned())
    }

    fn set_status(&self, plugin_id: &str, status: PluginStatus) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let record = records.get_mut(plugin_id).ok_or_else(|| {
            StoreError::new(format!("no record for plugin '{plugin_id}'"))
        })?;
        record.status = status;
        Ok(())
    }

    fn delete(&self, plugin_id: &str) -> Result<bool, StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        Ok(records.remove(plugin_id).is_some())
    }
}

fn poisoned() -> StoreError {
    StoreError::new("record table lock poisoned")
}
