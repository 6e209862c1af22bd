//! Plugin discovery: the core binding table and the script-directory scan.
//!
//! A [`PluginBinding`] pairs a descriptor snapshot with a typed constructor
//! closure, so the host can advertise and build plugins it has never loaded.
//! [`core_bindings`] lists the plugins shipped with the platform in bootstrap
//! order; [`discover_scripts`] turns a directory of `.rhai` sources into
//! custom bindings backed by [`ScriptPlugin`].

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use harbor_exec::ExecutorConfig;

use crate::builtin::{CodeExecutorPlugin, ScriptPlugin, WebSearchPlugin};
use crate::contract::Plugin;
use crate::descriptor::{PluginDescriptor, PluginOrigin};
use crate::error::PluginError;

const DISCOVERY_TARGET: &str = "harbor_plugins::discovery";

/// File name reserved for the annotated sample shipped with script packs.
const RESERVED_EXAMPLE: &str = "example_plugin.rhai";

/// Factory closure that builds a fresh plugin instance from its stored
/// configuration blob.
pub type PluginConstructor =
    Arc<dyn Fn(&Value) -> Result<Box<dyn Plugin>, PluginError> + Send + Sync>;

/// A plugin the host knows how to construct.
///
/// The descriptor is a snapshot taken at registration time so the service
/// layer can install a plugin without loading it first.
#[derive(Clone)]
pub struct PluginBinding {
    descriptor: PluginDescriptor,
    origin: PluginOrigin,
    constructor: PluginConstructor,
}

impl PluginBinding {
    /// Creates a binding from a descriptor snapshot and a constructor.
    #[must_use]
    pub fn new(
        descriptor: PluginDescriptor,
        origin: PluginOrigin,
        constructor: PluginConstructor,
    ) -> Self {
        Self {
            descriptor,
            origin,
            constructor,
        }
    }

    /// Identifier the binding registers under.
    #[must_use]
    pub const fn id(&self) -> &str {
        self.descriptor.id()
    }

    /// Descriptor advertised before any instance exists.
    #[must_use]
    pub const fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    /// Whether the plugin ships with the platform or was discovered.
    #[must_use]
    pub const fn origin(&self) -> PluginOrigin {
        self.origin
    }

    /// Constructs a fresh plugin instance from `config`.
    ///
    /// # Errors
    ///
    /// Propagates the constructor's [`PluginError`], typically
    /// [`PluginError::Config`] for a malformed configuration blob.
    pub fn construct(&self, config: &Value) -> Result<Box<dyn Plugin>, PluginError> {
        (self.constructor)(config)
    }
}

impl fmt::Debug for PluginBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginBinding")
            .field("descriptor", &self.descriptor)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Bindings keyed by id, with registration order preserved for bootstrap.
#[derive(Debug, Default)]
pub(crate) struct BindingTable {
    map: HashMap<String, PluginBinding>,
    order: Vec<String>,
}

impl BindingTable {
    /// Registers a binding; returns `false` when the id is already taken.
    pub(crate) fn insert(&mut self, binding: PluginBinding) -> bool {
        let id = binding.id().to_owned();
        if self.map.contains_key(&id) {
            return false;
        }
        self.order.push(id.clone());
        self.map.insert(id, binding);
        true
    }

    /// Looks up a binding by id.
    pub(crate) fn get(&self, id: &str) -> Option<&PluginBinding> {
        self.map.get(id)
    }

    /// Registered ids, oldest first.
    pub(crate) fn ordered_ids(&self) -> Vec<String> {
        self.order.clone()
    }
}

/// Builds the binding table entries for the plugins shipped with the
/// platform, in bootstrap order: the code executor first, then web search.
#[must_use]
pub fn core_bindings() -> Vec<PluginBinding> {
    vec![
        PluginBinding::new(
            CodeExecutorPlugin::default().descriptor().clone(),
            PluginOrigin::Core,
            Arc::new(|config: &Value| {
                let plugin = CodeExecutorPlugin::from_config(config)?;
                Ok(Box::new(plugin) as Box<dyn Plugin>)
            }),
        ),
        PluginBinding::new(
            WebSearchPlugin::default().descriptor().clone(),
            PluginOrigin::Core,
            Arc::new(|config: &Value| {
                let plugin = WebSearchPlugin::from_config(config)?;
                Ok(Box::new(plugin) as Box<dyn Plugin>)
            }),
        ),
    ]
}

/// Scans `dir` for custom script plugins.
///
/// Every `*.rhai` file becomes one binding whose id is the file stem, except
/// the reserved `example_plugin.rhai` sample and files whose name starts
/// with an underscore. Results are sorted by file name so discovery order is
/// stable across platforms. An absent directory yields an empty list.
///
/// # Errors
///
/// Returns [`PluginError::Load`] when the directory or one of its script
/// files cannot be read.
pub fn discover_scripts(dir: &Path) -> Result<Vec<PluginBinding>, PluginError> {
    if !dir.exists() {
        debug!(
            target: DISCOVERY_TARGET,
            dir = %dir.display(),
            "script directory absent; nothing to discover"
        );
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(dir).map_err(|err| PluginError::Load {
        id: dir.display().to_string(),
        message: format!("cannot read script directory: {err}"),
    })?;
    let mut scripts = Vec::new();
    for result in entries {
        let entry = result.map_err(|err| PluginError::Load {
            id: dir.display().to_string(),
            message: format!("cannot read script directory entry: {err}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|raw| raw.to_str()) else {
            continue;
        };
        if !is_discoverable(name) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|raw| raw.to_str()) else {
            continue;
        };
        scripts.push((name.to_owned(), stem.to_owned(), path.clone()));
    }
    scripts.sort_by(|left, right| left.0.cmp(&right.0));
    let mut bindings = Vec::with_capacity(scripts.len());
    for (name, stem, path) in scripts {
        let source = fs::read_to_string(&path).map_err(|err| PluginError::Load {
            id: stem.clone(),
            message: format!("cannot read script source '{name}': {err}"),
        })?;
        debug!(
            target: DISCOVERY_TARGET,
            id = stem.as_str(),
            file = name.as_str(),
            "discovered script plugin"
        );
        bindings.push(script_binding(&stem, source));
    }
    Ok(bindings)
}

fn is_discoverable(name: &str) -> bool {
    name.ends_with(".rhai") && name != RESERVED_EXAMPLE && !name.starts_with('_')
}

fn script_binding(id: &str, source: String) -> PluginBinding {
    let descriptor = ScriptPlugin::new(id, source.as_str(), ExecutorConfig::default())
        .descriptor()
        .clone();
    let owned_id = id.to_owned();
    let constructor: PluginConstructor = Arc::new(move |config: &Value| {
        let plugin = ScriptPlugin::from_source(&owned_id, source.as_str(), config)?;
        Ok(Box::new(plugin) as Box<dyn Plugin>)
    });
    PluginBinding::new(descriptor, PluginOrigin::Custom, constructor)
}
