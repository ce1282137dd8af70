//! Error handling for Drill2Gerber
//!
//! Fatal I/O problems propagate through anyhow with path context attached.
//! Everything that can go wrong inside a single drill program is recovered
//! locally and recorded as a [`TranslationIssue`] instead.

use anyhow::Context;
use std::path::Path;

pub type Result<T> = anyhow::Result<T>;

/// Extension trait for Results to add context with file paths
pub trait ResultExt<T> {
    /// Add context with file path information
    fn with_path_context<P: AsRef<Path>>(self, operation: &str, path: P) -> Result<T>;

    /// Add context naming the input line being translated
    fn with_line_context(self, line_number: usize) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error> + Send + Sync + 'static,
{
    fn with_path_context<P: AsRef<Path>>(self, operation: &str, path: P) -> Result<T> {
        self.map_err(|e| e.into())
            .with_context(|| format!("Failed to {} file: {}", operation, path.as_ref().display()))
    }

    fn with_line_context(self, line_number: usize) -> Result<T> {
        self.map_err(|e| e.into())
            .with_context(|| format!("Error at input line {}", line_number))
    }
}

/// Files that could not be opened, kept apart so the binary can pick an exit code
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("Cannot open input file: {path}")]
    InputUnavailable { path: String },

    #[error("Cannot create output file: {path}")]
    OutputUnavailable { path: String },
}

/// How much a translation issue affects the final status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// Recoverable problems found while translating a drill program
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslationIssue {
    #[error("Unrecognised drill coordinate format")]
    FormatUnrecognized,

    #[error("Error while converting coordinate at column {column}: {line}")]
    CoordinateParse { line: String, column: usize },

    #[error("Unsupported code: {code}")]
    UnsupportedGCode { code: String },

    #[error("Invalid embedded G-command: {line}")]
    EmbeddedCommandInvalid { line: String },

    #[error("{reason}")]
    IgnoredCommand { reason: String },
}

impl TranslationIssue {
    pub fn severity(&self) -> Severity {
        match self {
            TranslationIssue::CoordinateParse { .. }
            | TranslationIssue::EmbeddedCommandInvalid { .. } => Severity::Error,
            TranslationIssue::FormatUnrecognized
            | TranslationIssue::UnsupportedGCode { .. }
            | TranslationIssue::IgnoredCommand { .. } => Severity::Warning,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }
}
