//! Insertion-ordered storage for live plugin instances.
//!
//! The registry keeps one [`PluginInstance`] per identifier, shared as
//! `Arc<RwLock<_>>` so lifecycle transitions (write) serialize against
//! in-flight executions (read) per entry. Registration order is tracked
//! beside the map and drives every ordered listing.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::contract::Plugin;
use crate::descriptor::{PluginDescriptor, PluginOrigin};
use crate::lifecycle::LifecycleState;

/// A live plugin with its lifecycle bookkeeping.
pub(crate) struct PluginInstance {
    pub(crate) plugin: Box<dyn Plugin>,
    pub(crate) descriptor: PluginDescriptor,
    pub(crate) state: LifecycleState,
    pub(crate) origin: PluginOrigin,
}

impl PluginInstance {
    /// Wraps a freshly initialised plugin, snapshotting its descriptor.
    pub(crate) fn new(plugin: Box<dyn Plugin>, origin: PluginOrigin) -> Self {
        let descriptor = plugin.descriptor().clone();
        Self {
            plugin,
            descriptor,
            state: LifecycleState::Loaded,
            origin,
        }
    }
}

impl fmt::Debug for PluginInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginInstance")
            .field("id", &self.descriptor.id())
            .field("state", &self.state)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Entries shared between the registry map and in-flight operations.
pub(crate) type SharedInstance = Arc<RwLock<PluginInstance>>;

/// The identifier-keyed entry map plus its insertion-order index.
#[derive(Debug, Default)]
pub(crate) struct EntrySet {
    map: HashMap<String, SharedInstance>,
    order: Vec<String>,
}

impl EntrySet {
    /// Inserts an entry, preserving registration order.
    ///
    /// Returns `false` without inserting when the identifier is taken.
    pub(crate) fn insert(&mut self, id: &str, instance: SharedInstance) -> bool {
        if self.map.contains_key(id) {
            return false;
        }
        self.map.insert(id.to_owned(), instance);
        self.order.push(id.to_owned());
        true
    }

    /// Removes an entry and its order slot.
    pub(crate) fn remove(&mut self, id: &str) -> Option<SharedInstance> {
        let removed = self.map.remove(id);
        if removed.is_some() {
            self.order.retain(|slot| slot != id);
        }
        removed
    }

    /// Returns a shared handle to the entry, if present.
    pub(crate) fn get(&self, id: &str) -> Option<SharedInstance> {
        self.map.get(id).cloned()
    }

    /// Reports whether the identifier is registered.
    pub(crate) fn contains(&self, id: &str) -> bool {
        self.map.contains_key(id)
    }

    /// Snapshots every entry in registration order.
    pub(crate) fn ordered(&self) -> Vec<(String, SharedInstance)> {
        self.order
            .iter()
            .filter_map(|id| self.map.get(id).map(|entry| (id.clone(), Arc::clone(entry))))
            .collect()
    }

    /// Snapshots the registered identifiers in registration order.
    pub(crate) fn ordered_ids(&self) -> Vec<String> {
        self.order.clone()
    }
}
