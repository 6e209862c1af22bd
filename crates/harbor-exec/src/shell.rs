//! Shell command runner.
//!
//! Hands the command string to the configured shell binary via `-c`. The
//! security gate has already screened the command by the time this runner is
//! reached, so the runner itself only supervises the subprocess.

use std::process::Command;

use harbor_gate::Language;

use crate::config::ExecutorConfig;
use crate::process;
use crate::result::ExecutionResult;

/// Runs a shell command through the configured shell binary.
pub(crate) fn run(code: &str, config: &ExecutorConfig) -> ExecutionResult {
    let mut command = Command::new(config.shell_binary());
    command.arg("-c").arg(code);
    let outcome = process::run_command(&mut command, config.timeout());
    process::finish(Language::Shell, outcome, config)
}
