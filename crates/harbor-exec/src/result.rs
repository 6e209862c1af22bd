//! Execution outcomes.
//!
//! Every execution, including one refused by the security gate, produces an
//! [`ExecutionResult`]. Callers branch on [`ExecutionResult::success`] and the
//! [`FailureKind`] rather than on error types: the executor reserves `Result`
//! errors for configuration problems and reports runtime failures in-band.

use std::time::Duration;

use harbor_gate::Language;
use serde::{Serialize, Serializer};

/// Category of a failed execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The security gate refused the source before anything ran.
    SecurityViolation,
    /// The execution exceeded its wall-clock timeout and was terminated.
    Timeout,
    /// The source ran but failed: a non-zero exit status, a runtime error, or
    /// an infrastructure fault such as a missing interpreter.
    ExecutionError,
}

/// Outcome of a single sandboxed execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    success: bool,
    language: Language,
    output: String,
    output_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    return_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<FailureKind>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    violations: Vec<String>,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    duration: Duration,
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    serializer.serialize_u64(millis)
}

impl ExecutionResult {
    /// Builds a successful result. The output must already be bounded.
    pub(crate) fn completed(
        language: Language,
        output: String,
        return_code: Option<i32>,
        duration: Duration,
    ) -> Self {
        let output_length = output.chars().count();
        Self {
            success: true,
            language,
            output,
            output_length,
            error: None,
            return_code,
            failure: None,
            violations: Vec::new(),
            duration,
        }
    }

    /// Builds a result for a source the security gate refused.
    pub(crate) fn denied(language: Language, violations: Vec<String>, duration: Duration) -> Self {
        let reason = violations
            .first()
            .cloned()
            .unwrap_or_else(|| String::from("refused by security policy"));
        Self {
            success: false,
            language,
            output: String::new(),
            output_length: 0,
            error: Some(format!("security violation: {reason}")),
            return_code: None,
            failure: Some(FailureKind::SecurityViolation),
            violations,
            duration,
        }
    }

    /// Builds a result for an execution terminated at the timeout.
    pub(crate) fn timed_out(language: Language, timeout_secs: u64, duration: Duration) -> Self {
        Self {
            success: false,
            language,
            output: String::new(),
            output_length: 0,
            error: Some(format!("execution timed out after {timeout_secs}s")),
            return_code: None,
            failure: Some(FailureKind::Timeout),
            violations: Vec::new(),
            duration,
        }
    }

    /// Builds a result for a source that ran and failed. Captured output is
    /// preserved so callers can inspect partial progress. The output must
    /// already be bounded.
    pub(crate) fn failed(
        language: Language,
        message: String,
        output: String,
        return_code: Option<i32>,
        duration: Duration,
    ) -> Self {
        let output_length = output.chars().count();
        Self {
            success: false,
            language,
            output,
            output_length,
            error: Some(message),
            return_code,
            failure: Some(FailureKind::ExecutionError),
            violations: Vec::new(),
            duration,
        }
    }

    /// Whether the execution completed with a zero exit status (or, for
    /// in-process scripts, ran to completion).
    #[must_use]
    pub const fn success(&self) -> bool {
        self.success
    }

    /// Language the request was executed as.
    #[must_use]
    pub const fn language(&self) -> Language {
        self.language
    }

    /// Captured output, bounded to the configured maximum length.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Character count of [`ExecutionResult::output`], including the
    /// truncation marker when one was appended.
    #[must_use]
    pub const fn output_length(&self) -> usize {
        self.output_length
    }

    /// Failure description, when the execution did not succeed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Exit status of the subprocess, when one ran and exited normally.
    #[must_use]
    pub const fn return_code(&self) -> Option<i32> {
        self.return_code
    }

    /// Failure category, when the execution did not succeed.
    #[must_use]
    pub const fn failure(&self) -> Option<FailureKind> {
        self.failure
    }

    /// Security violations found by the gate, in discovery order. Empty
    /// unless the gate refused the source.
    #[must_use]
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    /// Wall-clock duration of the execution attempt.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }
}
