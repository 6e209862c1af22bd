//! The plugin host: binding registration, lifecycle, and execution.
//!
//! [`PluginHost`] owns the binding table, the live-instance registry, and the
//! per-plugin configuration store. Loading resolves a binding, constructs the
//! plugin with its stored configuration, and runs `initialize`; unloading
//! waits for in-flight executions on the same entry to drain before
//! `cleanup`. The execute boundary converts plugin `Err` returns and panics
//! into `{success: false, error}` result maps so one misbehaving plugin
//! cannot take the host down.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock, RwLockReadGuard};

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::contract::ExecutionRequest;
use crate::descriptor::PluginDescriptor;
use crate::discovery::{BindingTable, PluginBinding, core_bindings};
use crate::error::PluginError;
use crate::lifecycle::{self, LifecycleState};
use crate::registry::{EntrySet, PluginInstance, SharedInstance};

const HOST_TARGET: &str = "harbor_plugins::host";

/// Outcome of a [`PluginHost::bootstrap`] sweep.
///
/// Per-plugin load failures never abort the sweep; they are collected here so
/// the embedder can report or retry them.
#[derive(Debug, Default)]
pub struct BootstrapReport {
    loaded: Vec<String>,
    failures: Vec<(String, PluginError)>,
}

impl BootstrapReport {
    /// Identifiers that loaded, in registration order.
    #[must_use]
    pub fn loaded(&self) -> &[String] {
        &self.loaded
    }

    /// Per-plugin load failures, in registration order.
    #[must_use]
    pub fn failures(&self) -> &[(String, PluginError)] {
        &self.failures
    }

    /// Reports whether every registered binding loaded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Thread-safe plugin registry with lifecycle management.
///
/// The host is shared by reference (typically inside an `Arc`) across caller
/// threads. Each live plugin sits behind its own `RwLock`, so lifecycle
/// transitions on one entry serialize against in-flight executions of the
/// same entry while leaving every other plugin unblocked. The registry-wide
/// map lock is only held for lookup and insertion, never across plugin code.
#[derive(Debug, Default)]
pub struct PluginHost {
    bindings: RwLock<BindingTable>,
    entries: RwLock<EntrySet>,
    configs: RwLock<HashMap<String, Value>>,
}

impl PluginHost {
    /// Creates a host with no bindings registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a host preloaded with the platform's core bindings.
    #[must_use]
    pub fn with_core_bindings() -> Self {
        let mut table = BindingTable::default();
        for binding in core_bindings() {
            table.insert(binding);
        }
        Self {
            bindings: RwLock::new(table),
            entries: RwLock::default(),
            configs: RwLock::default(),
        }
    }

    /// Registers a binding the host can later load by id.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Load`] when a binding with the same id is
    /// already registered, or [`PluginError::Poisoned`] when the binding
    /// table lock is poisoned.
    pub fn register_binding(&self, binding: PluginBinding) -> Result<(), PluginError> {
        let id = binding.id().to_owned();
        let origin = binding.origin();
        let mut bindings = self
            .bindings
            .write()
            .map_err(|_| PluginError::poisoned("binding table"))?;
        if !bindings.insert(binding) {
            return Err(PluginError::Load {
                id,
                message: String::from("a binding with this id is already registered"),
            });
        }
        drop(bindings);
        debug!(
            target: HOST_TARGET,
            plugin = id.as_str(),
            origin = %origin,
            "binding registered"
        );
        Ok(())
    }

    /// Descriptor a binding advertises before any instance exists.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Load`] when no binding carries this id, or
    /// [`PluginError::Poisoned`] when the binding table lock is poisoned.
    pub fn binding_descriptor(&self, plugin_id: &str) -> Result<PluginDescriptor, PluginError> {
        let bindings = self.bindings_read()?;
        bindings
            .get(plugin_id)
            .map(|binding| binding.descriptor().clone())
            .ok_or_else(|| PluginError::Load {
                id: plugin_id.to_owned(),
                message: String::from("no binding registered"),
            })
    }

    /// Constructs, initialises, and registers the plugin behind `plugin_id`.
    ///
    /// The instance is built with the configuration stored via
    /// [`PluginHost::set_config`] (an empty object when none was stored) and
    /// enters the registry in the `Loaded` state.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::AlreadyLoaded`] when the id is live,
    /// [`PluginError::Load`] when no binding is registered or `initialize`
    /// fails, and propagates constructor errors (typically
    /// [`PluginError::Config`]) unchanged.
    pub fn load(&self, plugin_id: &str) -> Result<(), PluginError> {
        if self.entries_read()?.contains(plugin_id) {
            return Err(PluginError::AlreadyLoaded {
                id: plugin_id.to_owned(),
            });
        }
        let binding = {
            let bindings = self.bindings_read()?;
            bindings
                .get(plugin_id)
                .cloned()
                .ok_or_else(|| PluginError::Load {
                    id: plugin_id.to_owned(),
                    message: String::from("no binding registered"),
                })?
        };
        let config = self.stored_config(plugin_id)?;
        let plugin = binding.construct(&config)?;
        plugin.initialize().map_err(|err| PluginError::Load {
            id: plugin_id.to_owned(),
            message: err.to_string(),
        })?;
        let shared: SharedInstance =
            Arc::new(RwLock::new(PluginInstance::new(plugin, binding.origin())));
        let mut entries = self
            .entries
            .write()
            .map_err(|_| PluginError::poisoned("plugin registry"))?;
        if !entries.insert(plugin_id, Arc::clone(&shared)) {
            drop(entries);
            discard_duplicate(plugin_id, &shared);
            return Err(PluginError::AlreadyLoaded {
                id: plugin_id.to_owned(),
            });
        }
        drop(entries);
        info!(
            target: HOST_TARGET,
            plugin = plugin_id,
            origin = %binding.origin(),
            "plugin loaded"
        );
        Ok(())
    }

    /// Unloads a plugin, waiting for in-flight executions to drain first.
    ///
    /// Returns `Ok(false)` when the plugin is not loaded, making unload
    /// idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Cleanup`] when the plugin's `cleanup` hook
    /// fails; the entry then stays registered so the failure can be retried
    /// or inspected. Returns [`PluginError::Poisoned`] for poisoned locks.
    pub fn unload(&self, plugin_id: &str) -> Result<bool, PluginError> {
        let Some(entry) = self.entries_read()?.get(plugin_id) else {
            return Ok(false);
        };
        let mut guard = entry
            .write()
            .map_err(|_| PluginError::poisoned(&format!("plugin entry '{plugin_id}'")))?;
        if guard.state == LifecycleState::Unloaded {
            return Ok(false);
        }
        guard.plugin.cleanup().map_err(|err| PluginError::Cleanup {
            id: plugin_id.to_owned(),
            message: err.to_string(),
        })?;
        guard.state = LifecycleState::Unloaded;
        drop(guard);
        let mut entries = self
            .entries
            .write()
            .map_err(|_| PluginError::poisoned("plugin registry"))?;
        entries.remove(plugin_id);
        drop(entries);
        info!(target: HOST_TARGET, plugin = plugin_id, "plugin unloaded");
        Ok(true)
    }

    /// Unloads (tolerating not-loaded) and loads the plugin again.
    ///
    /// The fresh instance picks up the currently stored configuration.
    ///
    /// # Errors
    ///
    /// Propagates [`PluginHost::unload`] and [`PluginHost::load`] errors.
    pub fn reload(&self, plugin_id: &str) -> Result<(), PluginError> {
        let was_loaded = self.unload(plugin_id)?;
        debug!(
            target: HOST_TARGET,
            plugin = plugin_id,
            was_loaded,
            "reloading plugin"
        );
        self.load(plugin_id)
    }

    /// Executes a plugin through the catch-all boundary.
    ///
    /// Plugin `Err` returns and panics come back as
    /// `{success: false, error}` result maps rather than errors; the host
    /// itself stays healthy either way.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] when the plugin is not loaded and
    /// [`PluginError::NotExecutable`] when its lifecycle state and activation
    /// policy forbid execution.
    pub fn execute(&self, request: &ExecutionRequest) -> Result<Value, PluginError> {
        let plugin_id = request.plugin_id();
        let Some(entry) = self.entries_read()?.get(plugin_id) else {
            return Err(PluginError::NotFound {
                id: plugin_id.to_owned(),
            });
        };
        let guard = entry
            .read()
            .map_err(|_| PluginError::poisoned(&format!("plugin entry '{plugin_id}'")))?;
        let policy = guard.plugin.activation_policy();
        if !lifecycle::may_execute(guard.state, policy) {
            return Err(PluginError::NotExecutable {
                id: plugin_id.to_owned(),
                state: guard.state,
            });
        }
        debug!(target: HOST_TARGET, plugin = plugin_id, "executing plugin");
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| guard.plugin.execute(request.parameters())));
        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                warn!(
                    target: HOST_TARGET,
                    plugin = plugin_id,
                    error = %err,
                    "plugin execution failed"
                );
                Ok(json!({ "success": false, "error": err.to_string() }))
            }
            Err(_) => {
                warn!(
                    target: HOST_TARGET,
                    plugin = plugin_id,
                    "plugin panicked during execution"
                );
                Ok(json!({
                    "success": false,
                    "error": format!("plugin '{plugin_id}' panicked during execution"),
                }))
            }
        }
    }

    /// Transitions a loaded or deactivated plugin to `Activated`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] when the plugin is not loaded and
    /// [`PluginError::Lifecycle`] when the current state does not allow
    /// activation.
    pub fn activate(&self, plugin_id: &str) -> Result<(), PluginError> {
        self.transition(plugin_id, LifecycleState::Activated)
    }

    /// Transitions an activated plugin to `Deactivated`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] when the plugin is not loaded and
    /// [`PluginError::Lifecycle`] when the current state does not allow
    /// deactivation.
    pub fn deactivate(&self, plugin_id: &str) -> Result<(), PluginError> {
        self.transition(plugin_id, LifecycleState::Deactivated)
    }

    /// Descriptors of every live plugin, in load order.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Poisoned`] when a registry lock is poisoned.
    pub fn descriptors(&self) -> Result<Vec<PluginDescriptor>, PluginError> {
        let snapshot = self.entries_read()?.ordered();
        let mut all = Vec::with_capacity(snapshot.len());
        for (id, entry) in snapshot {
            let guard = entry
                .read()
                .map_err(|_| PluginError::poisoned(&format!("plugin entry '{id}'")))?;
            if guard.state != LifecycleState::Unloaded {
                all.push(guard.descriptor.clone());
            }
        }
        Ok(all)
    }

    /// Descriptors of live plugins advertising `capability`, in load order.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Poisoned`] when a registry lock is poisoned.
    pub fn get_by_capability(
        &self,
        capability: &str,
    ) -> Result<Vec<PluginDescriptor>, PluginError> {
        Ok(self
            .descriptors()?
            .into_iter()
            .filter(|descriptor| descriptor.has_capability(capability))
            .collect())
    }

    /// Stores the configuration blob used by the next load of `plugin_id`.
    ///
    /// A live instance is not reconfigured; call [`PluginHost::reload`] to
    /// apply the new configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Poisoned`] when the configuration lock is
    /// poisoned.
    pub fn set_config(&self, plugin_id: &str, config: Value) -> Result<(), PluginError> {
        let mut configs = self
            .configs
            .write()
            .map_err(|_| PluginError::poisoned("config table"))?;
        configs.insert(plugin_id.to_owned(), config);
        Ok(())
    }

    /// Loads every registered binding, collecting per-plugin failures.
    ///
    /// Bindings load in registration order, so core plugins registered ahead
    /// of discovered scripts come up first. A failing plugin never aborts its
    /// siblings.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Poisoned`] when the binding table lock is
    /// poisoned; individual load failures land in the report instead.
    pub fn bootstrap(&self) -> Result<BootstrapReport, PluginError> {
        let ids = self.bindings_read()?.ordered_ids();
        let mut report = BootstrapReport::default();
        for id in ids {
            match self.load(&id) {
                Ok(()) => report.loaded.push(id),
                Err(err) => {
                    warn!(
                        target: HOST_TARGET,
                        plugin = id.as_str(),
                        error = %err,
                        "bootstrap load failed"
                    );
                    report.failures.push((id, err));
                }
            }
        }
        info!(
            target: HOST_TARGET,
            loaded = report.loaded.len(),
            failed = report.failures.len(),
            "bootstrap complete"
        );
        Ok(report)
    }

    /// Unloads every live plugin in reverse load order.
    ///
    /// Returns the plugins that failed to unload together with their errors;
    /// those entries stay registered.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Poisoned`] when the registry lock is poisoned;
    /// individual unload failures are collected instead.
    pub fn shutdown(&self) -> Result<Vec<(String, PluginError)>, PluginError> {
        let mut ids = self.entries_read()?.ordered_ids();
        ids.reverse();
        let mut failures = Vec::new();
        for id in ids {
            if let Err(err) = self.unload(&id) {
                warn!(
                    target: HOST_TARGET,
                    plugin = id.as_str(),
                    error = %err,
                    "shutdown unload failed"
                );
                failures.push((id, err));
            }
        }
        info!(
            target: HOST_TARGET,
            failed = failures.len(),
            "shutdown complete"
        );
        Ok(failures)
    }

    /// Reports whether `plugin_id` has a live instance.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Poisoned`] when the registry lock is poisoned.
    pub fn is_loaded(&self, plugin_id: &str) -> Result<bool, PluginError> {
        Ok(self.entries_read()?.contains(plugin_id))
    }

    /// Current lifecycle state of `plugin_id`; `Unloaded` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Poisoned`] when a registry lock is poisoned.
    pub fn lifecycle_state(&self, plugin_id: &str) -> Result<LifecycleState, PluginError> {
        let Some(entry) = self.entries_read()?.get(plugin_id) else {
            return Ok(LifecycleState::Unloaded);
        };
        let guard = entry
            .read()
            .map_err(|_| PluginError::poisoned(&format!("plugin entry '{plugin_id}'")))?;
        Ok(guard.state)
    }

    fn transition(&self, plugin_id: &str, to: LifecycleState) -> Result<(), PluginError> {
        let Some(entry) = self.entries_read()?.get(plugin_id) else {
            return Err(PluginError::NotFound {
                id: plugin_id.to_owned(),
            });
        };
        let mut guard = entry
            .write()
            .map_err(|_| PluginError::poisoned(&format!("plugin entry '{plugin_id}'")))?;
        let from = guard.state;
        if !from.can_transition(to) {
            return Err(PluginError::Lifecycle {
                id: plugin_id.to_owned(),
                from,
                to,
            });
        }
        guard.state = to;
        drop(guard);
        info!(
            target: HOST_TARGET,
            plugin = plugin_id,
            from = %from,
            to = %to,
            "lifecycle transition"
        );
        Ok(())
    }

    fn stored_config(&self, plugin_id: &str) -> Result<Value, PluginError> {
        let configs = self
            .configs
            .read()
            .map_err(|_| PluginError::poisoned("config table"))?;
        Ok(configs
            .get(plugin_id)
            .cloned()
            .unwrap_or_else(|| json!({})))
    }

    fn entries_read(&self) -> Result<RwLockReadGuard<'_, EntrySet>, PluginError> {
        self.entries
            .read()
            .map_err(|_| PluginError::poisoned("plugin registry"))
    }

    fn bindings_read(&self) -> Result<RwLockReadGuard<'_, BindingTable>, PluginError> {
        self.bindings
            .read()
            .map_err(|_| PluginError::poisoned("binding table"))
    }
}

/// Best-effort cleanup of an instance that lost a concurrent load race.
fn discard_duplicate(plugin_id: &str, shared: &SharedInstance) {
    if let Ok(guard) = shared.read() {
        if let Err(err) = guard.plugin.cleanup() {
            warn!(
                target: HOST_TARGET,
                plugin = plugin_id,
                error = %err,
                "cleanup of duplicate instance failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    use mockall::mock;
    use rstest::rstest;
    use serde_json::json;

    use crate::builtin::{CODE_EXECUTOR_ID, WEB_SEARCH_ID};
    use crate::contract::{ActivationPolicy, Parameters, Plugin};
    use crate::descriptor::PluginOrigin;

    use super::*;

    #[derive(Debug, Clone, Copy, Default)]
    struct ProbeBehaviour {
        policy: ActivationPolicy,
        fail_initialize: bool,
        fail_execute: bool,
        fail_cleanup: bool,
        panic_on_execute: bool,
    }

    impl ProbeBehaviour {
        fn on_load() -> Self {
            Self {
                policy: ActivationPolicy::OnLoad,
                ..Self::default()
            }
        }
    }

    struct Probe {
        descriptor: PluginDescriptor,
        behaviour: ProbeBehaviour,
        calls: Arc<AtomicU32>,
        cleanup_log: Arc<Mutex<Vec<String>>>,
        config: Value,
    }

    impl Plugin for Probe {
        fn descriptor(&self) -> &PluginDescriptor {
            &self.descriptor
        }

        fn activation_policy(&self) -> ActivationPolicy {
            self.behaviour.policy
        }

        fn initialize(&self) -> Result<(), PluginError> {
            if self.behaviour.fail_initialize {
                return Err(PluginError::Config {
                    id: self.descriptor.id().to_owned(),
                    message: String::from("refusing to initialize"),
                });
            }
            Ok(())
        }

        fn execute(&self, parameters: &Parameters) -> Result<Value, PluginError> {
            if self.behaviour.panic_on_execute {
                panic!("probe exploded");
            }
            if self.behaviour.fail_execute {
                return Err(PluginError::Config {
                    id: self.descriptor.id().to_owned(),
                    message: String::from("refusing to execute"),
                });
            }
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({
                "success": true,
                "config": self.config.clone(),
                "parameter_count": parameters.len(),
            }))
        }

        fn cleanup(&self) -> Result<(), PluginError> {
            self.cleanup_log
                .lock()
                .expect("cleanup log lock")
                .push(self.descriptor.id().to_owned());
            if self.behaviour.fail_cleanup {
                return Err(PluginError::Config {
                    id: self.descriptor.id().to_owned(),
                    message: String::from("refusing to clean up"),
                });
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct ProbeSet {
        calls: Arc<AtomicU32>,
        cleanup_log: Arc<Mutex<Vec<String>>>,
    }

    impl ProbeSet {
        fn binding(&self, id: &str, behaviour: ProbeBehaviour) -> PluginBinding {
            self.binding_with_capabilities(id, behaviour, &["probe"])
        }

        fn binding_with_capabilities(
            &self,
            id: &str,
            behaviour: ProbeBehaviour,
            capabilities: &[&str],
        ) -> PluginBinding {
            let descriptor = PluginDescriptor::new(id, id, "0.0.1").with_capabilities(
                capabilities.iter().map(|capability| (*capability).to_owned()),
            );
            let template = descriptor.clone();
            let calls = Arc::clone(&self.calls);
            let cleanup_log = Arc::clone(&self.cleanup_log);
            PluginBinding::new(
                descriptor,
                PluginOrigin::Custom,
                Arc::new(move |config: &Value| {
                    Ok(Box::new(Probe {
                        descriptor: template.clone(),
                        behaviour,
                        calls: Arc::clone(&calls),
                        cleanup_log: Arc::clone(&cleanup_log),
                        config: config.clone(),
                    }) as Box<dyn Plugin>)
                }),
            )
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn cleaned(&self) -> Vec<String> {
            self.cleanup_log.lock().expect("cleanup log lock").clone()
        }
    }

    fn host_with(bindings: Vec<PluginBinding>) -> PluginHost {
        let host = PluginHost::new();
        for binding in bindings {
            host.register_binding(binding).expect("binding registers");
        }
        host
    }

    fn request(plugin_id: &str) -> ExecutionRequest {
        ExecutionRequest::new(plugin_id)
    }

    mock! {
        ContractPlugin {}

        impl Plugin for ContractPlugin {
            fn descriptor(&self) -> &PluginDescriptor;
            fn activation_policy(&self) -> ActivationPolicy;
            fn initialize(&self) -> Result<(), PluginError>;
            fn execute(&self, parameters: &Parameters) -> Result<Value, PluginError>;
            fn cleanup(&self) -> Result<(), PluginError>;
        }
    }

    #[rstest]
    fn load_then_unload_restores_registry_state() {
        let probes = ProbeSet::default();
        let host = host_with(vec![probes.binding("alpha", ProbeBehaviour::default())]);
        host.load("alpha").expect("load succeeds");
        assert!(host.is_loaded("alpha").expect("registry readable"));
        assert_eq!(
            host.lifecycle_state("alpha").expect("registry readable"),
            LifecycleState::Loaded
        );
        assert!(host.unload("alpha").expect("unload succeeds"));
        assert!(!host.is_loaded("alpha").expect("registry readable"));
        assert_eq!(
            host.lifecycle_state("alpha").expect("registry readable"),
            LifecycleState::Unloaded
        );
        assert!(host.descriptors().expect("registry readable").is_empty());
        assert!(!host.unload("alpha").expect("second unload is idempotent"));
    }

    #[rstest]
    fn loading_an_unregistered_id_fails() {
        let host = PluginHost::new();
        let error = host.load("ghost").expect_err("load should fail");
        assert!(matches!(error, PluginError::Load { .. }));
        assert!(error.to_string().contains("no binding registered"));
    }

    #[rstest]
    fn double_load_is_rejected() {
        let probes = ProbeSet::default();
        let host = host_with(vec![probes.binding("alpha", ProbeBehaviour::default())]);
        host.load("alpha").expect("first load succeeds");
        let error = host.load("alpha").expect_err("second load should fail");
        assert_eq!(
            error,
            PluginError::AlreadyLoaded {
                id: String::from("alpha"),
            }
        );
    }

    #[rstest]
    fn duplicate_binding_registration_is_rejected() {
        let probes = ProbeSet::default();
        let host = host_with(vec![probes.binding("alpha", ProbeBehaviour::default())]);
        let error = host
            .register_binding(probes.binding("alpha", ProbeBehaviour::default()))
            .expect_err("duplicate binding should be rejected");
        assert!(error.to_string().contains("already registered"));
    }

    #[rstest]
    fn explicit_policy_requires_activation() {
        let probes = ProbeSet::default();
        let host = host_with(vec![probes.binding("alpha", ProbeBehaviour::default())]);
        host.load("alpha").expect("load succeeds");
        let error = host
            .execute(&request("alpha"))
            .expect_err("execution should be refused");
        assert!(matches!(
            error,
            PluginError::NotExecutable {
                state: LifecycleState::Loaded,
                ..
            }
        ));
        assert_eq!(probes.call_count(), 0);
        host.activate("alpha").expect("activation succeeds");
        let value = host.execute(&request("alpha")).expect("execution succeeds");
        assert_eq!(value.get("success"), Some(&json!(true)));
        assert_eq!(probes.call_count(), 1);
    }

    #[rstest]
    fn on_load_policy_executes_without_activation() {
        let probes = ProbeSet::default();
        let host = host_with(vec![probes.binding("alpha", ProbeBehaviour::on_load())]);
        host.load("alpha").expect("load succeeds");
        let value = host.execute(&request("alpha")).expect("execution succeeds");
        assert_eq!(value.get("success"), Some(&json!(true)));
        assert_eq!(
            host.lifecycle_state("alpha").expect("registry readable"),
            LifecycleState::Loaded
        );
    }

    #[rstest]
    fn executing_an_unknown_plugin_is_not_found() {
        let host = PluginHost::new();
        let error = host
            .execute(&request("ghost"))
            .expect_err("execution should fail");
        assert_eq!(
            error,
            PluginError::NotFound {
                id: String::from("ghost"),
            }
        );
    }

    #[rstest]
    fn invalid_lifecycle_transitions_are_rejected() {
        let probes = ProbeSet::default();
        let host = host_with(vec![probes.binding("alpha", ProbeBehaviour::default())]);
        host.load("alpha").expect("load succeeds");
        let premature = host
            .deactivate("alpha")
            .expect_err("deactivating a loaded plugin should fail");
        assert!(matches!(
            premature,
            PluginError::Lifecycle {
                from: LifecycleState::Loaded,
                to: LifecycleState::Deactivated,
                ..
            }
        ));
        host.activate("alpha").expect("activation succeeds");
        let repeated = host
            .activate("alpha")
            .expect_err("activating twice should fail");
        assert!(matches!(
            repeated,
            PluginError::Lifecycle {
                from: LifecycleState::Activated,
                to: LifecycleState::Activated,
                ..
            }
        ));
        host.deactivate("alpha").expect("deactivation succeeds");
        host.activate("alpha").expect("reactivation succeeds");
    }

    #[rstest]
    fn plugin_errors_come_back_in_band() {
        let probes = ProbeSet::default();
        let behaviour = ProbeBehaviour {
            policy: ActivationPolicy::OnLoad,
            fail_execute: true,
            ..ProbeBehaviour::default()
        };
        let host = host_with(vec![probes.binding("flaky", behaviour)]);
        host.load("flaky").expect("load succeeds");
        let value = host
            .execute(&request("flaky"))
            .expect("failure should be in-band");
        assert_eq!(value.get("success"), Some(&json!(false)));
        let message = value
            .get("error")
            .and_then(Value::as_str)
            .expect("error message present");
        assert!(message.contains("refusing to execute"));
    }

    #[rstest]
    fn plugin_panics_come_back_in_band() {
        let probes = ProbeSet::default();
        let behaviour = ProbeBehaviour {
            policy: ActivationPolicy::OnLoad,
            panic_on_execute: true,
            ..ProbeBehaviour::default()
        };
        let host = host_with(vec![probes.binding("volatile", behaviour)]);
        host.load("volatile").expect("load succeeds");
        let value = host
            .execute(&request("volatile"))
            .expect("panic should be in-band");
        assert_eq!(value.get("success"), Some(&json!(false)));
        let message = value
            .get("error")
            .and_then(Value::as_str)
            .expect("error message present");
        assert!(message.contains("panicked"));
        assert!(host.is_loaded("volatile").expect("host still healthy"));
        let again = host
            .execute(&request("volatile"))
            .expect("host keeps serving after a panic");
        assert_eq!(again.get("success"), Some(&json!(false)));
    }

    #[rstest]
    fn initialize_failure_surfaces_as_load_error() {
        let probes = ProbeSet::default();
        let behaviour = ProbeBehaviour {
            fail_initialize: true,
            ..ProbeBehaviour::default()
        };
        let host = host_with(vec![probes.binding("broken", behaviour)]);
        let error = host.load("broken").expect_err("load should fail");
        assert!(matches!(error, PluginError::Load { .. }));
        assert!(error.to_string().contains("refusing to initialize"));
        assert!(!host.is_loaded("broken").expect("registry readable"));
    }

    #[rstest]
    fn cleanup_failure_keeps_the_entry_registered() {
        let probes = ProbeSet::default();
        let behaviour = ProbeBehaviour {
            fail_cleanup: true,
            ..ProbeBehaviour::default()
        };
        let host = host_with(vec![probes.binding("sticky", behaviour)]);
        host.load("sticky").expect("load succeeds");
        let error = host.unload("sticky").expect_err("unload should fail");
        assert!(matches!(error, PluginError::Cleanup { .. }));
        assert!(host.is_loaded("sticky").expect("entry still registered"));
        assert_eq!(
            host.lifecycle_state("sticky").expect("registry readable"),
            LifecycleState::Loaded
        );
    }

    #[rstest]
    fn stored_config_applies_on_next_load() {
        let probes = ProbeSet::default();
        let host = host_with(vec![probes.binding("alpha", ProbeBehaviour::on_load())]);
        host.load("alpha").expect("load succeeds");
        let default_value = host.execute(&request("alpha")).expect("execution succeeds");
        assert_eq!(default_value.get("config"), Some(&json!({})));
        host.set_config("alpha", json!({ "tag": "v2" }))
            .expect("config stored");
        host.reload("alpha").expect("reload succeeds");
        let tagged = host.execute(&request("alpha")).expect("execution succeeds");
        assert_eq!(tagged.get("config"), Some(&json!({ "tag": "v2" })));
    }

    #[rstest]
    fn reload_of_an_unloaded_plugin_just_loads_it() {
        let probes = ProbeSet::default();
        let host = host_with(vec![probes.binding("alpha", ProbeBehaviour::default())]);
        host.reload("alpha").expect("reload tolerates not-loaded");
        assert!(host.is_loaded("alpha").expect("registry readable"));
    }

    #[rstest]
    fn capability_lookup_preserves_load_order() {
        let probes = ProbeSet::default();
        let host = host_with(vec![
            probes.binding_with_capabilities("alpha", ProbeBehaviour::default(), &["analysis"]),
            probes.binding_with_capabilities("beta", ProbeBehaviour::default(), &["reporting"]),
            probes.binding_with_capabilities("gamma", ProbeBehaviour::default(), &["analysis"]),
        ]);
        for id in ["alpha", "beta", "gamma"] {
            host.load(id).expect("load succeeds");
        }
        let matches: Vec<String> = host
            .get_by_capability("analysis")
            .expect("registry readable")
            .iter()
            .map(|descriptor| descriptor.id().to_owned())
            .collect();
        assert_eq!(matches, vec!["alpha".to_owned(), "gamma".to_owned()]);
        assert!(
            host.get_by_capability("missing")
                .expect("registry readable")
                .is_empty()
        );
    }

    #[rstest]
    fn bootstrap_collects_failures_without_aborting() {
        let probes = ProbeSet::default();
        let failing = ProbeBehaviour {
            fail_initialize: true,
            ..ProbeBehaviour::default()
        };
        let host = host_with(vec![
            probes.binding("alpha", ProbeBehaviour::default()),
            probes.binding("broken", failing),
            probes.binding("gamma", ProbeBehaviour::default()),
        ]);
        let report = host.bootstrap().expect("bootstrap runs");
        assert_eq!(
            report.loaded(),
            &["alpha".to_owned(), "gamma".to_owned()][..]
        );
        assert!(!report.is_clean());
        let (failed_id, failure) = report.failures().first().expect("one failure collected");
        assert_eq!(failed_id, "broken");
        assert!(matches!(failure, PluginError::Load { .. }));
    }

    #[rstest]
    fn shutdown_unloads_in_reverse_load_order() {
        let probes = ProbeSet::default();
        let host = host_with(vec![
            probes.binding("alpha", ProbeBehaviour::default()),
            probes.binding("beta", ProbeBehaviour::default()),
            probes.binding("gamma", ProbeBehaviour::default()),
        ]);
        let report = host.bootstrap().expect("bootstrap runs");
        assert!(report.is_clean());
        let failures = host.shutdown().expect("shutdown runs");
        assert!(failures.is_empty());
        assert_eq!(
            probes.cleaned(),
            vec!["gamma".to_owned(), "beta".to_owned(), "alpha".to_owned()]
        );
        assert!(host.descriptors().expect("registry readable").is_empty());
    }

    #[rstest]
    fn core_bindings_bootstrap_and_serve() {
        let host = PluginHost::with_core_bindings();
        let report = host.bootstrap().expect("bootstrap runs");
        assert!(report.is_clean());
        assert_eq!(
            report.loaded(),
            &[CODE_EXECUTOR_ID.to_owned(), WEB_SEARCH_ID.to_owned()][..]
        );
        let mut parameters = Parameters::new();
        parameters.insert("code", json!("echo bootstrapped"));
        parameters.insert("language", json!("shell"));
        let value = host
            .execute(&ExecutionRequest::new(CODE_EXECUTOR_ID).with_parameters(parameters))
            .expect("code executor runs while loaded");
        assert_eq!(value.get("success"), Some(&json!(true)));
    }

    #[rstest]
    fn binding_descriptor_resolves_without_loading() {
        let host = PluginHost::with_core_bindings();
        let descriptor = host
            .binding_descriptor(WEB_SEARCH_ID)
            .expect("descriptor resolves");
        assert!(descriptor.has_capability("web_search"));
        assert!(!host.is_loaded(WEB_SEARCH_ID).expect("registry readable"));
        let error = host
            .binding_descriptor("ghost")
            .expect_err("unknown id should fail");
        assert!(matches!(error, PluginError::Load { .. }));
    }

    #[rstest]
    fn lifecycle_hooks_run_once_per_load_cycle() {
        let host = PluginHost::new();
        let binding = PluginBinding::new(
            PluginDescriptor::new("mocked", "Mocked", "0.0.1"),
            PluginOrigin::Core,
            Arc::new(|_config: &Value| {
                let mut mock = MockContractPlugin::new();
                mock.expect_descriptor()
                    .return_const(PluginDescriptor::new("mocked", "Mocked", "0.0.1"));
                mock.expect_activation_policy()
                    .return_const(ActivationPolicy::Explicit);
                mock.expect_initialize().times(1).returning(|| Ok(()));
                mock.expect_cleanup().times(1).returning(|| Ok(()));
                Ok(Box::new(mock) as Box<dyn Plugin>)
            }),
        );
        host.register_binding(binding).expect("binding registers");
        host.load("mocked").expect("load succeeds");
        assert!(host.unload("mocked").expect("unload succeeds"));
    }
}
