//! Adapter giving a discovered Rhai source a plugin identity.

use serde_json::Value;

use harbor_exec::{CodeRequest, ExecutorConfig, Language, SandboxExecutor};

use crate::builtin::failure;
use crate::contract::{Parameters, Plugin};
use crate::descriptor::PluginDescriptor;
use crate::error::PluginError;

/// Runs one script file's source through the sandboxed executor.
///
/// Each discovered `.rhai` file becomes one `ScriptPlugin` whose identifier
/// is the file stem. Execution forwards the caller's parameters to the
/// script as the `params` constant; the security gate applies to the source
/// on every run.
#[derive(Debug)]
pub struct ScriptPlugin {
    descriptor: PluginDescriptor,
    source: String,
    executor: SandboxExecutor,
}

impl ScriptPlugin {
    /// Builds a script plugin from its source and opaque configuration blob.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Config`] when the blob holds a malformed
    /// executor key.
    pub fn from_source(
        id: &str,
        source: impl Into<String>,
        config: &Value,
    ) -> Result<Self, PluginError> {
        let executor_config = ExecutorConfig::from_value(config).map_err(|err| {
            PluginError::Config {
                id: id.to_owned(),
                message: err.to_string(),
            }
        })?;
        Ok(Self::new(id, source, executor_config))
    }

    /// Builds a script plugin over an already-parsed executor configuration.
    #[must_use]
    pub fn new(id: &str, source: impl Into<String>, config: ExecutorConfig) -> Self {
        let descriptor = PluginDescriptor::new(id, id, "0.1.0")
            .with_description(format!("script plugin backed by {id}.rhai"))
            .with_capabilities([String::from("script"), id.to_owned()]);
        Self {
            descriptor,
            source: source.into(),
            executor: SandboxExecutor::new(config),
        }
    }
}

impl Plugin for ScriptPlugin {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    fn execute(&self, parameters: &Parameters) -> Result<Value, PluginError> {
        let request = CodeRequest::new(Language::Rhai, self.source.clone())
            .with_parameters(parameters.to_json_map());
        let result = self.executor.execute(&request);
        match serde_json::to_value(&result) {
            Ok(value) => Ok(value),
            Err(err) => Ok(failure(&format!("failed to encode execution result: {err}"))),
        }
    }
}
