//! Pre-execution security gate for caller-supplied source code.
//!
//! The `harbor-gate` crate decides whether a piece of source code may be
//! handed to the sandboxed executor. The decision combines a substring
//! denylist applied to every language with structural scans of the parsed
//! syntax tree for the languages that have one: embedded scripts are
//! compiled and walked through the Rhai AST, and Python sources are parsed
//! with Tree-sitter and inspected for restricted imports and calls.
//!
//! The gate is deny-by-pattern: it blocks known-bad constructs rather than
//! admitting only known-good ones, and it is therefore a best-effort filter,
//! not an isolation boundary. Callers must still run accepted code under the
//! executor's resource bounds.
//!
//! # Example
//!
//! ```rust,no_run
//! use harbor_gate::{GatePolicy, Language, SecurityAnalyzer};
//!
//! let analyzer = SecurityAnalyzer::new(GatePolicy::new());
//! let verdict = analyzer.analyze("print(\"hi\")", Language::Rhai);
//! assert!(verdict.allowed());
//!
//! let verdict = analyzer.analyze("import os", Language::Python);
//! assert!(!verdict.allowed());
//! ```

pub mod analyzer;
pub mod error;
pub mod language;
pub mod policy;
pub mod verdict;

mod patterns;
mod python;
mod script;
mod shell;

pub use self::analyzer::SecurityAnalyzer;
pub use self::error::GateError;
pub use self::language::{Language, LanguageParseError};
pub use self::policy::GatePolicy;
pub use self::verdict::SecurityVerdict;
