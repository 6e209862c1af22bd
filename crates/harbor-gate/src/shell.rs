//! Shell-specific scan applied when execution is sandboxed.
//!
//! Shell commands cannot be parsed structurally with the tools at hand, so
//! the scan stays textual: metacharacters that chain, redirect, or
//! substitute commands are denied, as are a fixed set of destructive
//! command words matched case-insensitively anywhere in the string.

/// Metacharacters that enable chaining, redirection, or substitution.
const METACHARACTERS: &[&str] = &["&", "|", ">", "<", "`", "$("];

/// Destructive commands denied outright.
const BLOCKED_COMMANDS: &[&str] = &[
    "rm", "mv", "dd", "format", "mkfs", "fdisk", "shutdown", "reboot",
];

/// Scans a shell command string, returning any violations found.
pub(crate) fn scan(source: &str) -> Vec<String> {
    let mut violations = Vec::new();
    for meta in METACHARACTERS {
        if source.contains(meta) {
            violations.push(format!("contains shell special character: {meta}"));
        }
    }
    let lowered = source.to_lowercase();
    for command in BLOCKED_COMMANDS {
        if lowered.contains(command) {
            violations.push(format!("blocked command: {command}"));
        }
    }
    violations
}
