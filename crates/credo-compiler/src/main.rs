//! Credo Language Compiler
//!
//! Command-line interface for the Credo agent language.

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use credo_ast::{AgentDecl, Member};
use credo_compiler::{
    build, compile, default_output_path, CompileError, CompileOptions, Diagnostic,
};
use credo_lexer::{Lexer, TokenKind};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "credoc")]
#[command(version)]
#[command(about = "The Credo agent language compiler", long_about = None)]
struct Cli {
    /// Log compiler phases to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Do not check argument counts of plan invocations
    #[arg(long, global = true)]
    no_arity_check: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lex source file and display tokens
    Lex {
        /// Source file to lex
        file: PathBuf,
    },
    /// Parse source file and display the agent
    Parse {
        /// Source file to parse
        file: PathBuf,
        /// Show the full syntax tree
        #[arg(long)]
        tree: bool,
    },
    /// Check source files for errors without writing output
    Check {
        /// Source file to check
        file: PathBuf,
    },
    /// Compile an agent and write its instruction listing
    Build {
        /// Source file to compile
        file: PathBuf,
        /// Output file path (defaults to the input with a `.lst` extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Lex { file } => lex_file(file),
        Commands::Parse { file, tree } => parse_file(file, *tree),
        Commands::Check { file } => check_file(file, &options(&cli, file)),
        Commands::Build { file, output } => {
            let output = output.clone().unwrap_or_else(|| default_output_path(file));
            build_file(file, &output, &options(&cli, file))
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn options(cli: &Cli, file: &Path) -> CompileOptions {
    CompileOptions::default()
        .with_unit_name(file.display().to_string())
        .with_call_arity_check(!cli.no_arity_check)
}

fn read_source(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(s) => Some(s),
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            None
        }
    }
}

/// Lex a source file and display tokens
fn lex_file(path: &Path) -> ExitCode {
    let Some(source) = read_source(path) else {
        return ExitCode::FAILURE;
    };

    let tokens = Lexer::new(&source).tokenize();
    println!("Tokens ({}):", tokens.len());
    for token in &tokens {
        println!("  {:>4}:{:<3} {}", token.span.start.line, token.span.start.column, token.kind);
    }

    let unknown = tokens
        .iter()
        .filter(|t| matches!(t.kind, TokenKind::Unknown(_)))
        .count();
    if unknown > 0 {
        println!("\n{} unrecognised token(s)", unknown);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Parse a source file and display the agent
fn parse_file(path: &Path, tree: bool) -> ExitCode {
    let Some(source) = read_source(path) else {
        return ExitCode::FAILURE;
    };

    let filename = path.display().to_string();
    let (agent, parse_errors) = credo_parser::parse(&source);

    for error in &parse_errors {
        report(&filename, &source, &Diagnostic::from(error));
    }

    if tree {
        println!("{:#?}", agent);
    } else {
        print_agent_summary(&agent);
    }

    if parse_errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Check a source file for syntax and semantic errors
fn check_file(path: &Path, options: &CompileOptions) -> ExitCode {
    let Some(source) = read_source(path) else {
        return ExitCode::FAILURE;
    };

    match compile(&source, options) {
        Ok(_) => {
            println!("Check passed: {}", path.display());
            ExitCode::SUCCESS
        }
        Err(error) => fail(&options.unit_name, &source, &error),
    }
}

/// Compile a source file and write its listing
fn build_file(path: &Path, output: &Path, options: &CompileOptions) -> ExitCode {
    let Some(source) = read_source(path) else {
        return ExitCode::FAILURE;
    };

    match build(&source, output, options) {
        Ok(agent) => {
            println!("Compiled agent {} to {}", agent.name, output.display());
            ExitCode::SUCCESS
        }
        Err(error) => fail(&options.unit_name, &source, &error),
    }
}

fn fail(filename: &str, source: &str, error: &CompileError) -> ExitCode {
    for diagnostic in error.diagnostics() {
        report(filename, source, &diagnostic);
    }
    eprintln!("\n{}", error);
    ExitCode::FAILURE
}

fn report(filename: &str, source: &str, diagnostic: &Diagnostic) {
    let span = diagnostic.span.range();
    let result = Report::build(ReportKind::Error, filename, span.start)
        .with_code(diagnostic.code)
        .with_message(diagnostic.title)
        .with_label(
            Label::new((filename, span))
                .with_message(&diagnostic.message)
                .with_color(Color::Red),
        )
        .finish()
        .eprint((filename, Source::from(source)));

    if let Err(e) = result {
        eprintln!("{}: {} ({})", diagnostic.span, diagnostic.message, e);
    }
}

fn print_agent_summary(agent: &AgentDecl) {
    let params: Vec<String> = agent
        .params
        .iter()
        .map(|p| format!("{}: {}", p.name.node, p.ty.node))
        .collect();
    println!("agent {}({})", agent.name.node, params.join(", "));

    for belief in &agent.beliefs {
        let init: Vec<String> = belief.init.iter().map(|e| e.to_string()).collect();
        println!("  bel {}({})", belief.name.node, init.join(", "));
    }

    for member in &agent.members {
        let decl = member.decl();
        let keyword = match member {
            Member::Plan(_) => "plan",
            Member::Handler(_) => "on",
        };
        println!(
            "  {} {}/{} ({} statements)",
            keyword,
            decl.name.node,
            decl.params.len(),
            decl.body.len()
        );
    }
}
