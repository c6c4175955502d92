//! Structured Feedback Module
//!
//! Machine-readable run reports:
//! - JSON diagnostics with stable error codes
//! - Program statistics

use serde::{Deserialize, Serialize};

use crate::frontend::ast::{Decl, Program, Stmt};
use crate::utils::{DiagnosticKind, Error};

// ==================== Diagnostic Report ====================

/// One diagnostic, as reported to tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    /// Diagnostic class (e.g., "SemanticError")
    pub kind: String,

    /// Stable code (e.g., "S0001")
    pub code: String,

    /// Human-readable message, without position
    pub message: String,

    /// Where it happened, when known
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl DiagnosticReport {
    /// Build a report from a pipeline error
    pub fn from_error(error: &Error, file_name: &str) -> Self {
        let location = error.span().map(|s| Location {
            file: file_name.to_string(),
            line: s.line,
            column: s.column,
        });

        Self {
            kind: error.kind().to_string(),
            code: error_code(error.kind()).to_string(),
            message: error.message().to_string(),
            location,
        }
    }
}

/// Stable code for each diagnostic class
pub fn error_code(kind: DiagnosticKind) -> &'static str {
    match kind {
        DiagnosticKind::Lex => "L0001",
        DiagnosticKind::Parse => "P0001",
        DiagnosticKind::Semantic => "S0001",
        DiagnosticKind::Execution => "E0001",
        DiagnosticKind::Internal => "I0001",
        DiagnosticKind::Io => "O0001",
    }
}

// ==================== Run Feedback ====================

/// Complete feedback for one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFeedback {
    pub success: bool,

    /// Source file
    pub source_file: String,

    /// Empty on success; the pipeline stops at the first diagnostic
    pub diagnostics: Vec<DiagnosticReport>,

    pub stats: RunStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub token_count: usize,

    /// Declared functions
    pub function_count: usize,

    /// Program variables plus every function's params and locals
    pub variable_count: usize,

    /// Statements at every nesting level
    pub statement_count: usize,
}

impl RunStats {
    /// Collect statistics for a parsed program
    pub fn collect(program: &Program, token_count: usize) -> Self {
        let mut stats = Self { token_count, ..Self::default() };

        for decl in &program.decls {
            match decl {
                Decl::Variable(_) => stats.variable_count += 1,
                Decl::Function(func) => {
                    stats.function_count += 1;
                    stats.variable_count += func.scope_decls().count();
                    stats.statement_count += count_stmts(&func.body);
                }
            }
        }
        stats.statement_count += count_stmts(&program.stmts);
        stats
    }
}

fn count_stmts(stmts: &[Stmt]) -> usize {
    stmts
        .iter()
        .map(|stmt| {
            1 + match stmt {
                Stmt::If { then_body, .. } => count_stmts(then_body),
                Stmt::IfElse { then_body, else_body, .. } => {
                    count_stmts(then_body) + count_stmts(else_body)
                }
                Stmt::While { body, .. } => count_stmts(body),
                Stmt::Assign { .. }
                | Stmt::Print { .. }
                | Stmt::Return { .. }
                | Stmt::VoidCall { .. } => 0,
            }
        })
        .sum()
}

impl RunFeedback {
    pub fn success(source_file: String, stats: RunStats) -> Self {
        Self {
            success: true,
            source_file,
            diagnostics: vec![],
            stats,
        }
    }

    pub fn failure(source_file: String, error: &Error, stats: RunStats) -> Self {
        let diagnostics = vec![DiagnosticReport::from_error(error, &source_file)];
        Self {
            success: false,
            source_file,
            diagnostics,
            stats,
        }
    }

    /// Output as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Output as compact JSON (for programmatic use)
    pub fn to_json_compact(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
