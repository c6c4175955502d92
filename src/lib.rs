//! Plume
//!
//! A small imperative teaching language: lexer, parser, semantic analyzer and
//! a tree-walking interpreter.

pub mod executor;
pub mod feedback;
pub mod frontend;
pub mod types;
pub mod utils;

use std::io::Write;
use std::thread;

use executor::Executor;
use frontend::ast::Program;
use frontend::lexer::Lexer;
use frontend::parser::Parser;
use frontend::semantic::SemanticAnalyzer;
use frontend::token::Token;

pub use utils::{DiagnosticKind, Error, Result, Span};

/// Split source text into tokens
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).tokenize()
}

/// Lex and parse, without semantic checks
pub fn parse_source(source: &str) -> Result<Program> {
    let tokens = tokenize(source)?;
    Parser::new(tokens).parse_program()
}

/// Lex, parse and analyze; the returned program is safe to execute
pub fn check(source: &str) -> Result<Program> {
    let program = parse_source(source)?;
    SemanticAnalyzer::new().analyze(&program)?;
    Ok(program)
}

/// Stack size of the executor thread
const EXECUTOR_STACK_SIZE: usize = 1 << 30;

/// Run an analyzed program on a dedicated large-stack thread
pub fn execute(program: &Program, out: &mut (dyn Write + Send)) -> Result<()> {
    thread::scope(|scope| -> Result<()> {
        let worker = thread::Builder::new()
            .name("plume-executor".to_string())
            .stack_size(EXECUTOR_STACK_SIZE)
            .spawn_scoped(scope, move || Executor::new(program, out).run())?;
        worker
            .join()
            .unwrap_or_else(|_| Err(Error::internal("executor thread panicked")))
    })
}

/// Run the whole pipeline, writing program output to `out`.
/// Nothing is written unless the program passes analysis.
pub fn run(source: &str, out: &mut (dyn Write + Send)) -> Result<()> {
    let program = check(source)?;
    execute(&program, out)
}
