//! Bounded execution of untrusted source strings.
//!
//! This crate runs code on behalf of plugins, under three constraints that
//! hold for every request:
//!
//! - **Gated**: the source must clear the `harbor-gate` security analyzer
//!   before anything runs. Refused requests spawn no subprocess and build no
//!   script engine.
//! - **Bounded**: a wall-clock timeout and an output-length ceiling apply to
//!   every execution. Timed-out subprocesses are killed together with their
//!   whole process group.
//! - **In-band**: runtime failures are reported in the [`ExecutionResult`],
//!   not as `Result` errors. Callers branch on [`ExecutionResult::success`]
//!   and [`FailureKind`].
//!
//! Three runners back the [`SandboxExecutor`]: Rhai scripts run in-process on
//! a stripped-down engine, Python sources run through an external interpreter
//! binary, and shell commands run through the system shell.
//!
//! # Example
//!
//! ```rust,no_run
//! use harbor_exec::{CodeRequest, ExecutorConfig, Language, SandboxExecutor};
//!
//! let executor = SandboxExecutor::new(ExecutorConfig::default());
//! let result = executor.execute(&CodeRequest::new(Language::Shell, "echo hello"));
//! assert!(result.success());
//! ```

pub mod config;
pub mod executor;
pub mod result;

mod interpreter;
mod output;
mod process;
mod script;
mod shell;

pub use self::config::{ConfigError, ExecutorConfig};
pub use self::executor::{CodeRequest, SandboxExecutor};
pub use self::output::TRUNCATION_MARKER;
pub use self::result::{ExecutionResult, FailureKind};
pub use harbor_gate::{GatePolicy, Language};
