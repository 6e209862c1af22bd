//! Infrastructure errors raised while analysing source code.

use thiserror::Error;

use crate::language::Language;

/// Errors arising from the analyser's own machinery rather than from the
/// code under inspection.
///
/// A [`GateError`] never reaches the caller of
/// [`SecurityAnalyzer::analyze`](crate::SecurityAnalyzer::analyze): the
/// analyser converts it into a deny verdict so that an unavailable scanner
/// fails closed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateError {
    /// A Tree-sitter grammar could not be loaded for the given language.
    #[error("failed to load {language} grammar: {message}")]
    Grammar {
        /// Language whose grammar failed to load.
        language: Language,
        /// Loader error description.
        message: String,
    },
}
