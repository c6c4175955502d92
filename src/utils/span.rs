//! Source location tracking

use std::fmt;

/// A position in the source code (1-based line and column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Line number, starting at 1
    pub line: usize,
    /// Column of the first character, starting at 1
    pub column: usize,
}

impl Span {
    /// Create a new span
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
