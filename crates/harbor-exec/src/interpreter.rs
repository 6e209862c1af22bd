//! External interpreter runner for Python sources.
//!
//! The source is written to a named temporary file and handed to the
//! configured interpreter binary as its script argument. The temporary file
//! is removed when the handle drops, which covers every exit path including
//! timeouts.

use std::io::Write;
use std::process::Command;
use std::time::Instant;

use tempfile::Builder;
use tracing::debug;

use harbor_gate::Language;

use crate::config::ExecutorConfig;
use crate::process;
use crate::result::ExecutionResult;

/// Tracing target for interpreter runner operations.
const INTERPRETER_TARGET: &str = "harbor_exec::interpreter";

/// Runs a Python source through the configured interpreter binary.
pub(crate) fn run(source: &str, config: &ExecutorConfig) -> ExecutionResult {
    let started = Instant::now();
    let mut script = match Builder::new()
        .prefix("harbor-exec-")
        .suffix(".py")
        .tempfile()
    {
        Ok(script) => script,
        Err(err) => {
            return ExecutionResult::failed(
                Language::Python,
                format!("failed to stage script file: {err}"),
                String::new(),
                None,
                started.elapsed(),
            );
        }
    };
    if let Err(err) = script.write_all(source.as_bytes()) {
        return ExecutionResult::failed(
            Language::Python,
            format!("failed to stage script file: {err}"),
            String::new(),
            None,
            started.elapsed(),
        );
    }

    debug!(
        target: INTERPRETER_TARGET,
        interpreter = config.python_binary(),
        script = %script.path().display(),
        source_bytes = source.len(),
        "staged script for interpreter"
    );

    let mut command = Command::new(config.python_binary());
    command.arg(script.path());
    let outcome = process::run_command(&mut command, config.timeout());
    process::finish(Language::Python, outcome, config)
}
