//! Error handling for Plume
//!
//! Every stage of the pipeline fails with exactly one of these diagnostics.

use std::fmt;

use crate::utils::Span;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline diagnostic
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ==================== Lexer Errors ====================

    #[error("Lex error at {span}: {message}")]
    Lex { message: String, span: Span },

    // ==================== Parser Errors ====================

    /// `span` is `None` when the token stream ran out mid-rule
    #[error("Parse error{}: {message}", at(.span))]
    Parse { message: String, span: Option<Span> },

    // ==================== Semantic Errors ====================

    #[error("Semantic error at {span}: {message}")]
    Semantic { message: String, span: Span },

    // ==================== Runtime Errors ====================

    #[error("Execution error at {span}: {message}")]
    Execution { message: String, span: Span },

    /// A checked program violated an invariant the analyzer guarantees
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(String),
}

fn at(span: &Option<Span>) -> String {
    span.map(|s| format!(" at {}", s)).unwrap_or_default()
}

/// Which pipeline stage raised a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    Lex,
    Parse,
    Semantic,
    Execution,
    Internal,
    Io,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::Lex => "LexError",
            DiagnosticKind::Parse => "ParseError",
            DiagnosticKind::Semantic => "SemanticError",
            DiagnosticKind::Execution => "ExecutionError",
            DiagnosticKind::Internal => "InternalError",
            DiagnosticKind::Io => "IoError",
        };
        f.write_str(name)
    }
}

impl Error {
    pub fn lex(message: impl Into<String>, span: Span) -> Self {
        Self::Lex { message: message.into(), span }
    }

    pub fn parse(message: impl Into<String>, span: Span) -> Self {
        Self::Parse { message: message.into(), span: Some(span) }
    }

    pub fn unexpected_eof() -> Self {
        Self::Parse { message: "unexpectedly reached end of file".to_string(), span: None }
    }

    pub fn semantic(message: impl Into<String>, span: Span) -> Self {
        Self::Semantic { message: message.into(), span }
    }

    pub fn execution(message: impl Into<String>, span: Span) -> Self {
        Self::Execution { message: message.into(), span }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Get the span associated with this error
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Lex { span, .. } => Some(*span),
            Self::Parse { span, .. } => *span,
            Self::Semantic { span, .. } => Some(*span),
            Self::Execution { span, .. } => Some(*span),
            Self::Internal(_) | Self::Io(_) => None,
        }
    }

    /// The human-readable message without the position prefix
    pub fn message(&self) -> &str {
        match self {
            Self::Lex { message, .. }
            | Self::Parse { message, .. }
            | Self::Semantic { message, .. }
            | Self::Execution { message, .. }
            | Self::Internal(message)
            | Self::Io(message) => message,
        }
    }

    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::Lex { .. } => DiagnosticKind::Lex,
            Self::Parse { .. } => DiagnosticKind::Parse,
            Self::Semantic { .. } => DiagnosticKind::Semantic,
            Self::Execution { .. } => DiagnosticKind::Execution,
            Self::Internal(_) => DiagnosticKind::Internal,
            Self::Io(_) => DiagnosticKind::Io,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
