//! Built-in code execution plugin.
//!
//! Wraps the sandboxed executor in the plugin contract. Requests carry the
//! source under `code`, the language identifier under `language`, and an
//! optional nested `parameters` object forwarded to in-process scripts. The
//! plugin self-activates on load so the platform can execute code as soon as
//! bootstrap finishes.

use serde_json::Value;

use harbor_exec::{CodeRequest, ExecutorConfig, Language, SandboxExecutor};

use crate::builtin::failure;
use crate::contract::{ActivationPolicy, Parameters, Plugin};
use crate::descriptor::PluginDescriptor;
use crate::error::PluginError;

/// Registry identifier of the code execution plugin.
pub const CODE_EXECUTOR_ID: &str = "code_executor";

/// Executes code requests through the gated sandbox executor.
#[derive(Debug)]
pub struct CodeExecutorPlugin {
    descriptor: PluginDescriptor,
    executor: SandboxExecutor,
}

impl CodeExecutorPlugin {
    /// Builds the plugin from its opaque configuration blob.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Config`] when a known executor key holds a
    /// malformed value. Unknown keys are logged and ignored by the executor
    /// configuration parser.
    pub fn from_config(config: &Value) -> Result<Self, PluginError> {
        let executor_config =
            ExecutorConfig::from_value(config).map_err(|err| PluginError::Config {
                id: CODE_EXECUTOR_ID.to_owned(),
                message: err.to_string(),
            })?;
        Ok(Self::with_config(executor_config))
    }

    /// Builds the plugin over an already-parsed executor configuration.
    #[must_use]
    pub fn with_config(config: ExecutorConfig) -> Self {
        let descriptor = PluginDescriptor::new(CODE_EXECUTOR_ID, "Code Executor", "1.0.0")
            .with_description("runs rhai, python, and shell sources inside the sandboxed executor")
            .with_capabilities(["code_execution", "scripting", "automation"]);
        Self {
            descriptor,
            executor: SandboxExecutor::new(config),
        }
    }
}

impl Default for CodeExecutorPlugin {
    fn default() -> Self {
        Self::with_config(ExecutorConfig::default())
    }
}

impl Plugin for CodeExecutorPlugin {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    fn activation_policy(&self) -> ActivationPolicy {
        ActivationPolicy::OnLoad
    }

    fn execute(&self, parameters: &Parameters) -> Result<Value, PluginError> {
        parameters.require(CODE_EXECUTOR_ID, &["code", "language"])?;
        let Some(code) = parameters.string("code") else {
            return Ok(failure("parameter 'code' must be a string"));
        };
        let Some(raw_language) = parameters.string("language") else {
            return Ok(failure("parameter 'language' must be a string"));
        };
        let Ok(language) = raw_language.parse::<Language>() else {
            return Ok(failure(&format!("unsupported language: '{raw_language}'")));
        };

        let script_parameters = parameters
            .get("parameters")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let request = CodeRequest::new(language, code).with_parameters(script_parameters);
        let result = self.executor.execute(&request);
        match serde_json::to_value(&result) {
            Ok(value) => Ok(value),
            Err(err) => Ok(failure(&format!("failed to encode execution result: {err}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn request(code: &str, language: &str) -> Parameters {
        let mut parameters = Parameters::new();
        parameters.insert("code", json!(code));
        parameters.insert("language", json!(language));
        parameters
    }

    #[rstest]
    fn missing_required_parameters_fail_validation() {
        let plugin = CodeExecutorPlugin::default();
        let error = plugin
            .execute(&Parameters::new())
            .expect_err("empty request should fail validation");
        assert_eq!(
            error,
            PluginError::MissingParameters {
                plugin: String::from(CODE_EXECUTOR_ID),
                missing: vec![String::from("code"), String::from("language")],
            }
        );
    }

    #[rstest]
    fn shell_requests_run_and_report_success() {
        let plugin = CodeExecutorPlugin::default();
        let value = plugin
            .execute(&request("echo plugged", "shell"))
            .expect("request should execute");
        assert_eq!(value.get("success"), Some(&json!(true)));
        assert_eq!(value.get("output"), Some(&json!("plugged\n")));
        assert_eq!(value.get("language"), Some(&json!("shell")));
    }

    #[rstest]
    fn unsupported_language_fails_in_band() {
        let plugin = CodeExecutorPlugin::default();
        let value = plugin
            .execute(&request("puts 'hi'", "ruby"))
            .expect("invalid language should fail in-band");
        assert_eq!(value.get("success"), Some(&json!(false)));
        assert_eq!(
            value.get("error"),
            Some(&json!("unsupported language: 'ruby'"))
        );
    }

    #[rstest]
    fn non_string_code_fails_in_band() {
        let plugin = CodeExecutorPlugin::default();
        let mut parameters = Parameters::new();
        parameters.insert("code", json!(42));
        parameters.insert("language", json!("shell"));
        let value = plugin
            .execute(&parameters)
            .expect("typed validation should fail in-band");
        assert_eq!(value.get("success"), Some(&json!(false)));
        assert_eq!(
            value.get("error"),
            Some(&json!("parameter 'code' must be a string"))
        );
    }

    #[rstest]
    fn denied_sources_surface_their_violations() {
        let plugin = CodeExecutorPlugin::default();
        let value = plugin
            .execute(&request("rm -rf /var/tmp/scratch", "shell"))
            .expect("refusal should be in-band");
        assert_eq!(value.get("success"), Some(&json!(false)));
        let violations = value
            .get("violations")
            .and_then(Value::as_array)
            .expect("violations should be listed");
        assert!(!violations.is_empty());
    }

    #[rstest]
    fn config_blob_shapes_the_executor() {
        let plugin = CodeExecutorPlugin::from_config(&json!({ "max_output_length": 2 }))
            .expect("config should parse");
        let value = plugin
            .execute(&request("echo abcdef", "shell"))
            .expect("request should execute");
        let output = value
            .get("output")
            .and_then(Value::as_str)
            .expect("output should be a string");
        assert!(output.starts_with("ab"));
        assert!(output.ends_with("[output truncated]"));
    }

    #[rstest]
    fn malformed_config_is_a_construction_error() {
        let error = CodeExecutorPlugin::from_config(&json!({ "timeout": "soon" }))
            .expect_err("malformed config should be rejected");
        assert!(matches!(error, PluginError::Config { .. }));
    }

    #[rstest]
    fn script_requests_receive_nested_parameters() {
        let plugin = CodeExecutorPlugin::default();
        let mut parameters = request("print(params.subject);", "rhai");
        parameters.insert("parameters", json!({ "subject": "nested" }));
        let value = plugin
            .execute(&parameters)
            .expect("script should execute");
        assert_eq!(value.get("success"), Some(&json!(true)));
        assert_eq!(value.get("output"), Some(&json!("nested\n")));
    }
}
