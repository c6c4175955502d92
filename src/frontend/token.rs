//! Token definitions for Plume

use std::fmt;

use crate::utils::Span;

/// Reserved words; none of these may be used as a label.
pub const KEYWORDS: [&str; 21] = [
    "Boolean", "String", "Integer",
    "and", "or", "not",
    "while", "if", "then", "else", "end",
    "program", "begin", "is", "return", "do",
    "print", "print_line",
    "true", "false", "void",
];

/// A token produced by the lexer.
///
/// Plume tokens are classified by the parser, not the lexer: the lexer only
/// decides where a token starts and ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(text: impl Into<String>, span: Span) -> Self {
        Self { text: text.into(), span }
    }

    /// Check the token's text
    pub fn is(&self, text: &str) -> bool {
        self.text == text
    }

    /// A label is a non-keyword made only of ASCII letters, digits and `_`
    /// that does not start with a digit.
    pub fn is_label(&self) -> bool {
        is_label(&self.text)
    }

    pub fn is_int_literal(&self) -> bool {
        !self.text.is_empty() && self.text.bytes().all(|b| b.is_ascii_digit())
    }

    pub fn is_string_literal(&self) -> bool {
        self.text.len() >= 2 && self.text.starts_with('"') && self.text.ends_with('"')
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.text)
    }
}

pub fn is_keyword(s: &str) -> bool {
    KEYWORDS.contains(&s)
}

pub fn is_label(s: &str) -> bool {
    match s.chars().next() {
        Some(first) if !first.is_ascii_digit() => {
            !is_keyword(s) && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
