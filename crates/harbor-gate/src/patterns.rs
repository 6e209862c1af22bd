//! Substring denylist applied to every language.
//!
//! The scan is deliberately blunt: a match anywhere in the source is a
//! violation, with no tokenisation and no attempt to recognise comments or
//! string literals. Every match is collected; nothing short-circuits.

use crate::policy::GatePolicy;

/// Patterns that are always denied: process-capable module imports, dynamic
/// evaluation primitives, reflection helpers, and destructive verbs.
const CORE_PATTERNS: &[&str] = &[
    "import os",
    "import sys",
    "import subprocess",
    "exec(",
    "eval(",
    "compile(",
    "__import__",
    "getattr",
    "setattr",
    "rm ",
    "del ",
    "format ",
    "mkfs",
    "fdisk",
];

/// Patterns denied unless the policy grants file access.
const FILE_PATTERNS: &[&str] = &["open(", "file("];

/// Patterns denied unless the policy grants network access.
const NETWORK_PATTERNS: &[&str] = &[
    "import socket",
    "import urllib",
    "import requests",
    "import http",
];

/// Scans `source` against the active pattern groups.
pub(crate) fn scan(source: &str, policy: GatePolicy) -> Vec<String> {
    let mut violations = Vec::new();
    collect(source, CORE_PATTERNS, &mut violations);
    if !policy.allows_file_access() {
        collect(source, FILE_PATTERNS, &mut violations);
    }
    if !policy.allows_network() {
        collect(source, NETWORK_PATTERNS, &mut violations);
    }
    violations
}

fn collect(source: &str, patterns: &[&str], violations: &mut Vec<String>) {
    for pattern in patterns {
        if source.contains(pattern) {
            violations.push(format!("contains dangerous pattern: {pattern}"));
        }
    }
}
