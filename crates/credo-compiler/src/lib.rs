//! Credo Compiler Library
//!
//! Drives the pipeline for one compilation unit: parse, then generate.
//! A unit with syntax errors never reaches the generator, and a unit with
//! semantic errors never yields an artifact.

use credo_codegen::{generate, AgentType, CodegenOptions, InternalError, SemanticError};
use credo_lexer::Span;
use credo_parser::ParseError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub use credo_codegen::pretty_print;

/// Why a unit produced no artifact
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("errors encountered during syntactic analysis, aborting")]
    Syntax(Vec<ParseError>),

    #[error("errors encountered during semantic analysis, no output written")]
    Semantic(Vec<SemanticError>),

    #[error(transparent)]
    Internal(#[from] InternalError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CompileError {
    /// Every diagnostic carried by this failure, in report order
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            CompileError::Syntax(errors) => errors.iter().map(Diagnostic::from).collect(),
            CompileError::Semantic(errors) => errors.iter().map(Diagnostic::from).collect(),
            CompileError::Internal(_) | CompileError::Io(_) => Vec::new(),
        }
    }
}

/// Result type for compilation operations
pub type CompileResult<T> = Result<T, CompileError>;

/// A diagnostic from either channel, flattened for reporting
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub code: &'static str,
    pub title: &'static str,
    pub message: String,
    pub span: Span,
}

impl From<&ParseError> for Diagnostic {
    fn from(error: &ParseError) -> Self {
        let title = match error {
            ParseError::UnexpectedToken { .. } => "unexpected token",
            ParseError::ExpectedStatement { .. } => "expected a statement",
            ParseError::ExpectedAtom { .. } => "expected a value",
            ParseError::IntegerOutOfRange { .. } => "integer literal too large",
            ParseError::TrailingInput { .. } => "trailing input",
        };
        Diagnostic {
            code: error.code(),
            title,
            message: error.to_string(),
            span: error.span(),
        }
    }
}

impl From<&SemanticError> for Diagnostic {
    fn from(error: &SemanticError) -> Self {
        let title = match error {
            SemanticError::NotInScope { .. } => "name not in scope",
            SemanticError::WrongKind { .. } | SemanticError::NotAValue { .. } => {
                "name bound to wrong kind"
            }
            SemanticError::Redeclared { .. } => "duplicate declaration",
            SemanticError::BeliefArityMismatch { .. } => "belief arity mismatch",
            SemanticError::CallArityMismatch { .. } => "argument count mismatch",
            SemanticError::QueryTargetNotIdent { .. } => "invalid query target",
            SemanticError::Tuple { .. } => "unsupported arity",
        };
        Diagnostic {
            code: error.code(),
            title,
            message: error.to_string(),
            span: error.span(),
        }
    }
}

/// Options for compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Name of the unit in logs and reports, usually the file path
    pub unit_name: String,
    /// Reject plan invocations with the wrong number of arguments
    pub check_call_arity: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            unit_name: "<input>".to_string(),
            check_call_arity: true,
        }
    }
}

impl CompileOptions {
    pub fn with_unit_name(mut self, name: impl Into<String>) -> Self {
        self.unit_name = name.into();
        self
    }

    pub fn with_call_arity_check(mut self, enabled: bool) -> Self {
        self.check_call_arity = enabled;
        self
    }

    pub fn codegen_options(&self) -> CodegenOptions {
        CodegenOptions::default().with_call_arity_check(self.check_call_arity)
    }
}

/// Compile one unit of source text.
///
/// # Example
///
/// ```ignore
/// use credo_compiler::{compile, CompileOptions};
///
/// let agent = compile("agent Idle { }", &CompileOptions::default())?;
/// assert_eq!(agent.name, "Idle");
/// ```
pub fn compile(source: &str, options: &CompileOptions) -> CompileResult<AgentType> {
    let unit = options.unit_name.as_str();

    let (agent, parse_errors) = credo_parser::parse(source);
    if !parse_errors.is_empty() {
        info!(unit, errors = parse_errors.len(), "syntactic analysis failed");
        return Err(CompileError::Syntax(parse_errors));
    }
    info!(unit, agent = %agent.name.node, "parsed");

    let (ty, semantic_errors) = generate(&agent, &options.codegen_options())?;
    if !semantic_errors.is_empty() {
        info!(unit, errors = semantic_errors.len(), "semantic analysis failed");
        return Err(CompileError::Semantic(semantic_errors));
    }

    info!(unit, methods = ty.methods.len(), fields = ty.fields.len(), "generated");
    Ok(ty)
}

/// Where `build` writes its listing when no path is given
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("lst")
}

/// Compile `source` and write its listing to `output`.
///
/// On failure any existing file at `output` is removed, so a stale
/// listing never outlives a failed build.
pub fn build(source: &str, output: &Path, options: &CompileOptions) -> CompileResult<AgentType> {
    match compile(source, options) {
        Ok(ty) => {
            fs::write(output, pretty_print(&ty))?;
            info!(output = %output.display(), "listing written");
            Ok(ty)
        }
        Err(error) => {
            match fs::remove_file(output) {
                Ok(()) => info!(output = %output.display(), "removed stale listing"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(CompileError::Io(e)),
            }
            Err(error)
        }
    }
}
