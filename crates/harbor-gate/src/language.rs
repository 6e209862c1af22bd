//! Supported execution languages and identifier parsing.
//!
//! This module provides the [`Language`] enum naming the three runtimes the
//! executor understands: in-process Rhai scripts, Python via an external
//! interpreter, and shell commands.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Languages accepted by the security gate and the sandboxed executor.
///
/// Each variant selects both a scanning strategy in the gate and a runner in
/// the executor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Embedded Rhai scripts, interpreted in-process.
    #[default]
    Rhai,
    /// Python sources, run through an external interpreter binary.
    #[serde(alias = "py")]
    Python,
    /// Shell command strings, run through the system shell.
    #[serde(alias = "sh")]
    Shell,
}

impl Language {
    /// Returns the lower-case identifier for this language.
    ///
    /// This is the form used in configuration values and execution results.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rhai => "rhai",
            Self::Python => "python",
            Self::Shell => "shell",
        }
    }

    /// Returns `true` when sources in this language run inside the host
    /// process rather than in a subprocess.
    #[must_use]
    pub const fn is_in_process(self) -> bool {
        matches!(self, Self::Rhai)
    }

    /// Returns all supported languages.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Rhai, Self::Python, Self::Shell]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when parsing a language identifier fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported language: '{0}'")]
pub struct LanguageParseError(String);

impl LanguageParseError {
    /// Returns the input that failed to parse.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.0
    }
}

impl FromStr for Language {
    type Err = LanguageParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalised = input.trim().to_ascii_lowercase();
        match normalised.as_str() {
            "rhai" => Ok(Self::Rhai),
            "python" | "py" => Ok(Self::Python),
            "shell" | "sh" => Ok(Self::Shell),
            _ => Err(LanguageParseError(normalised)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("rhai", Language::Rhai)]
    #[case("Python", Language::Python)]
    #[case("py", Language::Python)]
    #[case("SHELL", Language::Shell)]
    #[case("  sh ", Language::Shell)]
    fn from_str_parses_identifiers_and_aliases(#[case] input: &str, #[case] expected: Language) {
        assert_eq!(Language::from_str(input), Ok(expected));
    }

    #[rstest]
    #[case("javascript")]
    #[case("ruby")]
    #[case("")]
    fn from_str_rejects_unknown_identifiers(#[case] input: &str) {
        let result: Result<Language, _> = input.parse();
        assert!(result.is_err());
    }

    #[test]
    fn display_matches_as_str() {
        for language in Language::all() {
            assert_eq!(language.to_string(), language.as_str());
        }
    }

    #[test]
    fn only_rhai_runs_in_process() {
        assert!(Language::Rhai.is_in_process());
        assert!(!Language::Python.is_in_process());
        assert!(!Language::Shell.is_in_process());
    }

    #[test]
    fn serde_round_trips_identifiers() {
        let json = serde_json::to_string(&Language::Python).expect("serialize");
        assert_eq!(json, "\"python\"");
        let parsed: Language = serde_json::from_str("\"sh\"").expect("deserialize alias");
        assert_eq!(parsed, Language::Shell);
    }
}
