//! Plume interpreter
//!
//! Command-line driver: reads a source file and runs, checks or formats it.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::debug;

use plume::feedback::{RunFeedback, RunStats};
use plume::frontend::parser::Parser as PlumeParser;
use plume::frontend::printer::print_program;
use plume::frontend::semantic::SemanticAnalyzer;

/// Plume interpreter
#[derive(Parser, Debug)]
#[command(name = "plume")]
#[command(version)]
#[command(about = "Plume - a small imperative teaching language")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input source file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Print the token stream and stop
    #[arg(long, global = true)]
    emit_tokens: bool,

    /// Report diagnostics as JSON on stderr
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a program
    Run {
        /// Input source file
        input: PathBuf,
    },
    /// Check a program for errors without running it
    Check {
        /// Input source file
        input: PathBuf,
    },
    /// Print a program in canonical form
    Fmt {
        /// Input source file
        input: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Run,
    Check,
    Fmt,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let (mode, input) = match (&cli.command, &cli.input) {
        (Some(Commands::Run { input }), _) => (Mode::Run, input),
        (Some(Commands::Check { input }), _) => (Mode::Check, input),
        (Some(Commands::Fmt { input }), _) => (Mode::Fmt, input),
        (None, Some(input)) => (Mode::Run, input),
        (None, None) => {
            eprintln!("Error: No input file specified");
            eprintln!("Usage: plume <FILE> or plume run <FILE>");
            process::exit(2);
        }
    };

    match process_file(input, mode, &cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// Returns whether the program passed every stage it went through
fn process_file(input: &Path, mode: Mode, cli: &Cli) -> anyhow::Result<bool> {
    let source = fs::read_to_string(input)
        .with_context(|| format!("could not read {}", input.display()))?;
    let file_name = input.display().to_string();
    debug!("{:?} {} ({} bytes)", mode, file_name, source.len());

    let mut stats = RunStats::default();
    let result = pipeline(&source, mode, cli.emit_tokens, &mut stats);

    if cli.json {
        let feedback = match &result {
            Ok(()) => RunFeedback::success(file_name, stats),
            Err(e) => RunFeedback::failure(file_name, e, stats),
        };
        eprintln!("{}", feedback.to_json());
    } else if let Err(e) = &result {
        eprintln!("{}", e);
    }

    Ok(result.is_ok())
}

fn pipeline(source: &str, mode: Mode, emit_tokens: bool, stats: &mut RunStats) -> plume::Result<()> {
    let tokens = plume::tokenize(source)?;
    stats.token_count = tokens.len();

    if emit_tokens {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for token in &tokens {
            writeln!(out, "{}\t{}", token.span, token.text)?;
        }
        return Ok(());
    }

    let program = PlumeParser::new(tokens).parse_program()?;
    *stats = RunStats::collect(&program, stats.token_count);

    match mode {
        Mode::Fmt => print!("{}", print_program(&program)),
        Mode::Check => {
            SemanticAnalyzer::new().analyze(&program)?;
            println!("No errors found");
        }
        Mode::Run => {
            SemanticAnalyzer::new().analyze(&program)?;
            plume::execute(&program, &mut io::stdout())?;
        }
    }
    Ok(())
}
