//! Subprocess plumbing for interpreter-based runners.
//!
//! Spawns the child in its own process group with stdout and stderr piped,
//! captures both streams on reader threads, and polls for exit against the
//! configured timeout. On timeout the whole process group is killed with
//! `SIGKILL` so children spawned by the interpreter cannot outlive the bound.

use std::io::Read;
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tracing::{debug, warn};

use harbor_gate::Language;

use crate::config::ExecutorConfig;
use crate::output;
use crate::result::ExecutionResult;

/// Tracing target for subprocess operations.
const PROCESS_TARGET: &str = "harbor_exec::process";

/// How often the wait loop polls the child for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Terminal state of a supervised subprocess.
pub(crate) enum ProcessOutcome {
    /// The child exited within the timeout.
    Completed {
        /// Exit code, when the child exited normally rather than by signal.
        status_code: Option<i32>,
        /// Everything the child wrote to stdout.
        stdout: String,
        /// Everything the child wrote to stderr.
        stderr: String,
        /// Wall-clock time from spawn to exit.
        duration: Duration,
    },
    /// The child was killed after exceeding the timeout. Partial output is
    /// discarded: a timed-out execution reports only the timeout.
    TimedOut {
        /// Wall-clock time from spawn to the kill.
        duration: Duration,
    },
    /// The child could not be spawned or supervised.
    Failed {
        /// Description of the fault.
        message: String,
        /// Wall-clock time spent before the fault.
        duration: Duration,
    },
}

/// Runs `command` to completion under `timeout`, capturing both output
/// streams.
pub(crate) fn run_command(command: &mut Command, timeout: Duration) -> ProcessOutcome {
    let started = Instant::now();
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());
    // A fresh process group lets the timeout kill grandchildren too.
    command.process_group(0);

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) => {
            warn!(
                target: PROCESS_TARGET,
                program = ?command.get_program(),
                error = %err,
                "failed to spawn subprocess"
            );
            return ProcessOutcome::Failed {
                message: format!("failed to spawn interpreter: {err}"),
                duration: started.elapsed(),
            };
        }
    };

    debug!(
        target: PROCESS_TARGET,
        pid = child.id(),
        program = ?command.get_program(),
        "spawned subprocess"
    );

    let stdout_reader = spawn_reader(child.stdout.take());
    let stderr_reader = spawn_reader(child.stderr.take());

    match wait_with_timeout(&mut child, timeout) {
        WaitOutcome::Exited(status) => {
            let stdout = join_reader(stdout_reader);
            let stderr = join_reader(stderr_reader);
            debug!(
                target: PROCESS_TARGET,
                pid = child.id(),
                ?status,
                stdout_bytes = stdout.len(),
                stderr_bytes = stderr.len(),
                "subprocess exited"
            );
            ProcessOutcome::Completed {
                status_code: status.code(),
                stdout,
                stderr,
                duration: started.elapsed(),
            }
        }
        WaitOutcome::TimedOut => {
            warn!(
                target: PROCESS_TARGET,
                pid = child.id(),
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                "subprocess timed out, killing process group"
            );
            kill_process_group(&mut child);
            drop(child.wait());
            // Killing the group closes the pipes, so the readers see EOF.
            drop(join_reader(stdout_reader));
            drop(join_reader(stderr_reader));
            ProcessOutcome::TimedOut {
                duration: started.elapsed(),
            }
        }
        WaitOutcome::WaitFailed(err) => {
            kill_process_group(&mut child);
            drop(child.wait());
            drop(join_reader(stdout_reader));
            drop(join_reader(stderr_reader));
            ProcessOutcome::Failed {
                message: format!("failed to supervise interpreter: {err}"),
                duration: started.elapsed(),
            }
        }
    }
}

/// Folds a [`ProcessOutcome`] into an [`ExecutionResult`], merging stderr
/// into the output stream and applying the output bound.
pub(crate) fn finish(
    language: Language,
    outcome: ProcessOutcome,
    config: &ExecutorConfig,
) -> ExecutionResult {
    match outcome {
        ProcessOutcome::Completed {
            status_code,
            stdout,
            stderr,
            duration,
        } => {
            let mut merged = stdout;
            if !stderr.is_empty() {
                merged.push_str("\nErrors:\n");
                merged.push_str(&stderr);
            }
            let bounded = output::bound(merged, config.max_output_length());
            if status_code == Some(0) {
                ExecutionResult::completed(language, bounded, status_code, duration)
            } else {
                let message = status_code.map_or_else(
                    || String::from("terminated by signal"),
                    |code| format!("exited with status {code}"),
                );
                ExecutionResult::failed(language, message, bounded, status_code, duration)
            }
        }
        ProcessOutcome::TimedOut { duration } => {
            ExecutionResult::timed_out(language, config.timeout_secs(), duration)
        }
        ProcessOutcome::Failed { message, duration } => {
            ExecutionResult::failed(language, message, String::new(), None, duration)
        }
    }
}

/// Captures a stream to a string on a dedicated thread so a full pipe buffer
/// never blocks the child.
fn spawn_reader<R: Read + Send + 'static>(stream: Option<R>) -> Option<JoinHandle<String>> {
    stream.map(|mut reader| {
        thread::spawn(move || {
            let mut bytes = Vec::new();
            if let Err(err) = reader.read_to_end(&mut bytes) {
                debug!(target: PROCESS_TARGET, error = %err, "stream capture ended early");
            }
            String::from_utf8_lossy(&bytes).into_owned()
        })
    })
}

/// Joins a reader thread, treating a panicked or absent reader as empty
/// output.
fn join_reader(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|reader| reader.join().ok())
        .unwrap_or_default()
}

enum WaitOutcome {
    Exited(ExitStatus),
    TimedOut,
    WaitFailed(std::io::Error),
}

/// Polls the child for exit until it finishes or the timeout elapses.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> WaitOutcome {
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return WaitOutcome::Exited(status),
            Ok(None) => {
                if start.elapsed() > timeout {
                    return WaitOutcome::TimedOut;
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(err) => return WaitOutcome::WaitFailed(err),
        }
    }
}

/// Kills the child's process group, falling back to killing the child alone
/// when the group signal cannot be delivered.
fn kill_process_group(child: &mut Child) {
    match i32::try_from(child.id()) {
        Ok(raw_pid) => {
            if let Err(err) = signal::killpg(Pid::from_raw(raw_pid), Signal::SIGKILL) {
                debug!(
                    target: PROCESS_TARGET,
                    pid = child.id(),
                    error = %err,
                    "killpg failed, killing child directly"
                );
                drop(child.kill());
            }
        }
        Err(_) => drop(child.kill()),
    }
}
