//! Code generation for the Credo agent language.
//!
//! Compiles one [`AgentDecl`] into an [`AgentType`]: a field per belief, a
//! constructor, and a method per plan or handler, all over a small stack
//! instruction set.
//!
//! # Architecture
//!
//! ```text
//! AgentDecl → [generate] → AgentType + Vec<SemanticError> → [pretty_print] → listing
//! ```
//!
//! Semantic mistakes are collected, not raised: generation carries on past
//! them so one run reports as many as possible. Only broken compiler
//! invariants stop it, as an [`InternalError`].
//!
//! # Example
//!
//! ```ignore
//! use credo_codegen::{generate, CodegenOptions};
//!
//! let (agent, _) = credo_parser::parse("agent Idle { }");
//! let (ty, diagnostics) = generate(&agent, &CodegenOptions::default())?;
//! assert!(diagnostics.is_empty());
//! ```

use credo_ast::AgentDecl;
use credo_lexer::Span;
use smol_str::SmolStr;
use thiserror::Error;

mod generator;
pub mod instr;
mod pretty;
pub mod symbols;
pub mod tuple;

pub use generator::CodeGenerator;
pub use instr::{
    AgentType, FieldDef, FieldId, Instr, LocalId, MethodDef, MethodId, MethodKind, ParamDef,
    TupleDesc, TupleId,
};
pub use pretty::pretty_print;
pub use symbols::{Binding, BindingKind, LookupError, ScopeError, SymbolTable};
pub use tuple::{TupleCache, TupleError, MAX_TUPLE_ARITY};

/// Mistakes in a syntactically valid agent
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SemanticError {
    #[error("`{name}` is not in scope")]
    NotInScope { name: SmolStr, span: Span },

    #[error("`{name}` is a {found}, expected a {expected}")]
    WrongKind {
        name: SmolStr,
        expected: BindingKind,
        found: BindingKind,
        span: Span,
    },

    #[error("`{name}` is a {found} and cannot be used as an integer value")]
    NotAValue {
        name: SmolStr,
        found: BindingKind,
        span: Span,
    },

    #[error("`{name}` is already declared in this scope")]
    Redeclared { name: SmolStr, span: Span },

    #[error("belief `{name}` holds {expected} values, but {found} were given")]
    BeliefArityMismatch {
        name: SmolStr,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("`{name}` takes {expected} arguments, but {found} were given")]
    CallArityMismatch {
        name: SmolStr,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("a query on `{belief}` can only bind plain identifiers")]
    QueryTargetNotIdent { belief: SmolStr, span: Span },

    #[error("{source}")]
    Tuple {
        #[source]
        source: TupleError,
        span: Span,
    },
}

impl SemanticError {
    pub fn span(&self) -> Span {
        match self {
            SemanticError::NotInScope { span, .. } => *span,
            SemanticError::WrongKind { span, .. } => *span,
            SemanticError::NotAValue { span, .. } => *span,
            SemanticError::Redeclared { span, .. } => *span,
            SemanticError::BeliefArityMismatch { span, .. } => *span,
            SemanticError::CallArityMismatch { span, .. } => *span,
            SemanticError::QueryTargetNotIdent { span, .. } => *span,
            SemanticError::Tuple { span, .. } => *span,
        }
    }

    /// Stable error code for reporting
    pub fn code(&self) -> &'static str {
        match self {
            SemanticError::NotInScope { .. } => "E2001",
            SemanticError::WrongKind { .. } => "E2002",
            SemanticError::NotAValue { .. } => "E2003",
            SemanticError::Redeclared { .. } => "E2004",
            SemanticError::BeliefArityMismatch { .. } => "E2005",
            SemanticError::CallArityMismatch { .. } => "E2006",
            SemanticError::QueryTargetNotIdent { .. } => "E2007",
            SemanticError::Tuple { .. } => "E2008",
        }
    }

    pub(crate) fn from_lookup(error: LookupError, span: Span) -> Self {
        match error {
            LookupError::NotFound { name } => SemanticError::NotInScope { name, span },
            LookupError::WrongKind {
                name,
                expected,
                found,
            } => SemanticError::WrongKind {
                name,
                expected,
                found,
                span,
            },
        }
    }
}

/// Broken generator invariants. These are compiler bugs, never user errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InternalError {
    #[error("internal compiler error: no open scope to {operation}")]
    EmptyScopeStack { operation: &'static str },

    #[error("internal compiler error: {depth} scopes still open after generation")]
    UnbalancedScopes { depth: usize },

    #[error("internal compiler error: too many {what} in one unit")]
    SlotOverflow { what: &'static str },
}

/// Generator settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Reject invocations whose argument count differs from the plan's
    /// parameter count
    pub check_call_arity: bool,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            check_call_arity: true,
        }
    }
}

impl CodegenOptions {
    pub fn with_call_arity_check(mut self, enabled: bool) -> Self {
        self.check_call_arity = enabled;
        self
    }
}

/// Compile an agent. The type is only valid when the diagnostic list is
/// empty.
pub fn generate(
    agent: &AgentDecl,
    options: &CodegenOptions,
) -> Result<(AgentType, Vec<SemanticError>), InternalError> {
    let mut generator = CodeGenerator::new(options.clone());
    let ty = generator.generate(agent)?;
    Ok((ty, generator.into_diagnostics()))
}
