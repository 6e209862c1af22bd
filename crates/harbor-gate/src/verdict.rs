//! The allow/deny outcome of a security scan.

/// Outcome of analysing one source string.
///
/// A verdict is produced per execution attempt, consumed immediately by the
/// executor gate, and never persisted. Execution may proceed only when
/// [`allowed`](Self::allowed) returns `true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityVerdict {
    allowed: bool,
    violations: Vec<String>,
}

impl SecurityVerdict {
    /// Builds a verdict from the collected violations.
    ///
    /// The verdict allows execution exactly when `violations` is empty.
    #[must_use]
    pub fn new(violations: Vec<String>) -> Self {
        Self {
            allowed: violations.is_empty(),
            violations,
        }
    }

    /// Builds an explicitly allowing verdict with no violations.
    #[must_use]
    pub const fn allow() -> Self {
        Self {
            allowed: true,
            violations: Vec::new(),
        }
    }

    /// Returns `true` when execution may proceed.
    #[must_use]
    pub const fn allowed(&self) -> bool {
        self.allowed
    }

    /// Returns every violation found, in scan order.
    #[must_use]
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    /// Returns the first violation found, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.violations.first().map(String::as_str)
    }

    /// Consumes the verdict, yielding the violation list.
    #[must_use]
    pub fn into_violations(self) -> Vec<String> {
        self.violations
    }
}
