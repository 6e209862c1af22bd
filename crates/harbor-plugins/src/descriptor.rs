//! Plugin identity metadata.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Immutable identity and capability metadata for one plugin.
///
/// The `id` is the unique registry key; `name` is the human-readable label.
/// Capabilities are an unordered set of free-form tags used by capability
/// lookup. A descriptor never changes after the plugin is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    id: String,
    name: String,
    version: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    capabilities: BTreeSet<String>,
}

impl PluginDescriptor {
    /// Creates a descriptor with an empty description and no capabilities.
    pub fn new(id: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            description: String::new(),
            capabilities: BTreeSet::new(),
        }
    }

    /// Replaces the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Replaces the capability set.
    #[must_use]
    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    /// Unique registry identifier.
    #[must_use]
    pub const fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Human-readable name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Plugin version string.
    #[must_use]
    pub const fn version(&self) -> &str {
        self.version.as_str()
    }

    /// Human-readable description, possibly empty.
    #[must_use]
    pub const fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Capability tags, in deterministic order.
    #[must_use]
    pub const fn capabilities(&self) -> &BTreeSet<String> {
        &self.capabilities
    }

    /// Reports whether the plugin advertises `capability`.
    #[must_use]
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }
}

/// Where a plugin binding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginOrigin {
    /// Shipped with the platform and loaded first during bootstrap.
    Core,
    /// Registered by the embedder or discovered from a script directory.
    Custom,
}

impl PluginOrigin {
    /// Returns the lower-case identifier for this origin.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for PluginOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
