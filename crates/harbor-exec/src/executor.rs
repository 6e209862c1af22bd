//! Gated execution façade.
//!
//! [`SandboxExecutor`] is the only entry point for running untrusted source.
//! Every request passes the same pipeline: the language must be in the
//! configured allow set, the source must clear the security gate, and only
//! then does the matching runner execute it under the configured resource
//! bounds. Refusals and failures are reported in-band as [`ExecutionResult`]
//! values rather than as errors.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use harbor_gate::{Language, SecurityAnalyzer};

use crate::config::ExecutorConfig;
use crate::result::ExecutionResult;
use crate::{interpreter, script, shell};

/// Tracing target for executor operations.
const EXECUTOR_TARGET: &str = "harbor_exec::executor";

/// A single request to run a source string in a given language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeRequest {
    language: Language,
    code: String,
    #[serde(default)]
    parameters: Map<String, Value>,
}

impl CodeRequest {
    /// Creates a request with no parameters.
    pub fn new(language: Language, code: impl Into<String>) -> Self {
        Self {
            language,
            code: code.into(),
            parameters: Map::new(),
        }
    }

    /// Attaches parameters, exposed to in-process scripts as the `params`
    /// constant. Interpreter and shell runners ignore them.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Language the source should be executed as.
    #[must_use]
    pub const fn language(&self) -> Language {
        self.language
    }

    /// The source string to execute.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Request parameters.
    #[must_use]
    pub const fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }
}

/// Executes code requests behind the security gate, within resource bounds.
#[derive(Debug)]
pub struct SandboxExecutor {
    config: ExecutorConfig,
    analyzer: SecurityAnalyzer,
}

impl SandboxExecutor {
    /// Creates an executor whose gate policy is derived from `config`.
    #[must_use]
    pub const fn new(config: ExecutorConfig) -> Self {
        let analyzer = SecurityAnalyzer::new(config.gate_policy());
        Self { config, analyzer }
    }

    /// The executor's configuration.
    #[must_use]
    pub const fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Runs a request through the gate and, when it clears, the matching
    /// runner.
    ///
    /// Refused requests never reach a runner: no subprocess is spawned and no
    /// script engine is built for them.
    #[must_use]
    pub fn execute(&self, request: &CodeRequest) -> ExecutionResult {
        let gate_started = Instant::now();
        let language = request.language();

        if !self.config.is_language_allowed(language) {
            warn!(
                target: EXECUTOR_TARGET,
                language = language.as_str(),
                "refusing request for disallowed language"
            );
            let violation = format!(
                "language '{language}' is not allowed (allowed: {})",
                self.config.allowed_languages_label()
            );
            return ExecutionResult::denied(language, vec![violation], gate_started.elapsed());
        }

        let verdict = self.analyzer.analyze(request.code(), language);
        if !verdict.allowed() {
            return ExecutionResult::denied(
                language,
                verdict.into_violations(),
                gate_started.elapsed(),
            );
        }

        debug!(
            target: EXECUTOR_TARGET,
            language = language.as_str(),
            code_bytes = request.code().len(),
            "request cleared the security gate"
        );
        match language {
            Language::Rhai => script::run(request.code(), request.parameters(), &self.config),
            Language::Python => interpreter::run(request.code(), &self.config),
            Language::Shell => shell::run(request.code(), &self.config),
        }
    }
}

impl Default for SandboxExecutor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}
