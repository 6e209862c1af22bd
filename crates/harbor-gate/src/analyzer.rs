//! Orchestration of the per-language scans into a single verdict.

use tracing::warn;

use crate::language::Language;
use crate::policy::GatePolicy;
use crate::verdict::SecurityVerdict;
use crate::{patterns, python, script, shell};

/// Tracing target for gate decisions.
const GATE_TARGET: &str = "harbor_gate::analyzer";

/// Analyses source strings before the executor is allowed to run them.
///
/// Every language passes through the substring denylist; Rhai and Python
/// additionally receive a structural scan of their syntax tree, and shell
/// commands receive the metacharacter scan when the policy is sandboxed.
/// The analyser never fails open: infrastructure problems in a scanner are
/// reported as violations.
///
/// # Example
///
/// ```rust,no_run
/// use harbor_gate::{GatePolicy, Language, SecurityAnalyzer};
///
/// let analyzer = SecurityAnalyzer::new(GatePolicy::new());
/// let verdict = analyzer.analyze("rm -rf /", Language::Shell);
/// assert!(!verdict.allowed());
/// ```
#[derive(Debug, Clone)]
pub struct SecurityAnalyzer {
    policy: GatePolicy,
}

impl SecurityAnalyzer {
    /// Creates an analyser with the given policy.
    #[must_use]
    pub const fn new(policy: GatePolicy) -> Self {
        Self { policy }
    }

    /// Returns the active policy.
    #[must_use]
    pub const fn policy(&self) -> &GatePolicy {
        &self.policy
    }

    /// Scans `source` as `language` and returns the combined verdict.
    #[must_use]
    pub fn analyze(&self, source: &str, language: Language) -> SecurityVerdict {
        let mut violations = patterns::scan(source, self.policy);

        match language {
            Language::Rhai => violations.extend(script::scan(source)),
            Language::Python => match python::scan(source) {
                Ok(found) => violations.extend(found),
                Err(err) => {
                    warn!(
                        target: GATE_TARGET,
                        language = %language,
                        error = %err,
                        "structural scanner unavailable, denying execution"
                    );
                    violations.push(format!("structural scanner unavailable: {err}"));
                }
            },
            Language::Shell => {
                if self.policy.sandboxed() {
                    violations.extend(shell::scan(source));
                }
            }
        }

        let verdict = SecurityVerdict::new(violations);
        if !verdict.allowed() {
            warn!(
                target: GATE_TARGET,
                language = %language,
                violations = verdict.violations().len(),
                reason = verdict.reason().unwrap_or("unspecified"),
                "execution denied by security gate"
            );
        }
        verdict
    }
}

impl Default for SecurityAnalyzer {
    fn default() -> Self {
        Self::new(GatePolicy::new())
    }
}
