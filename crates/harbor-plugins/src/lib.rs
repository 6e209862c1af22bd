//! Plugin lifecycle, discovery, and execution host for Harbor.
//!
//! The `harbor-plugins` crate implements the plugin orchestration layer of
//! the agent platform. Plugins are in-process [`Plugin`] trait objects that
//! the [`PluginHost`] loads, activates, and executes behind a per-plugin
//! lifecycle state machine. The built-in plugins delegate untrusted code to
//! `harbor-exec`, which screens every script through the `harbor-gate`
//! security gate before running it in a bounded worker.
//!
//! Plugins reach the host through [`PluginBinding`] values: a binding pairs a
//! plugin's descriptor with a constructor closure, so the host can rebuild an
//! instance from stored configuration on every load. Core bindings cover the
//! bundled `code_executor` and `web_search` plugins; [`discover_scripts`]
//! adds one binding per Rhai script found in a plugin directory.
//!
//! # Architecture
//!
//! The crate is layered. [`PluginHost`] owns the registry of live instances
//! and enforces lifecycle transitions, panic isolation, and configuration
//! handover. [`PluginService`] sits above the host and pairs it with a
//! [`DescriptorStore`], keeping installation records in step with runtime
//! state so a platform frontend can install, activate, and execute plugins
//! through one surface.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use harbor_plugins::{InMemoryStore, Parameters, PluginHost, PluginService};
//!
//! let host = Arc::new(PluginHost::with_core_bindings());
//! let store = Arc::new(InMemoryStore::new());
//! let service = PluginService::new(host, store);
//!
//! service.install("web_search").expect("binding is registered");
//!
//! let mut parameters = Parameters::new();
//! parameters.insert("query", serde_json::json!("rust plugin hosts"));
//! let results = service
//!     .execute("web_search", parameters)
//!     .expect("activation and execution succeed");
//! // `results` carries the simulated search payload as JSON.
//! ```

pub mod builtin;
pub mod contract;
pub mod descriptor;
pub mod discovery;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod service;
pub mod store;

mod registry;

#[cfg(test)]
mod tests;

pub use self::builtin::{
    CODE_EXECUTOR_ID, CodeExecutorPlugin, ScriptPlugin, WEB_SEARCH_ID, WebSearchPlugin,
};
pub use self::contract::{ActivationPolicy, ExecutionRequest, Parameters, Plugin};
pub use self::descriptor::{PluginDescriptor, PluginOrigin};
pub use self::discovery::{PluginBinding, PluginConstructor, core_bindings, discover_scripts};
pub use self::error::PluginError;
pub use self::host::{BootstrapReport, PluginHost};
pub use self::lifecycle::LifecycleState;
pub use self::service::{PluginService, ServiceError};
pub use self::store::{DescriptorStore, InMemoryStore, PluginRecord, PluginStatus, StoreError};
