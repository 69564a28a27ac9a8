//! Lexically scoped symbol table.
//!
//! A stack of frames, innermost last. Lookups walk from the innermost frame
//! outwards, so an inner binding shadows an outer one of the same name for
//! as long as its frame is alive.

use crate::instr::{FieldId, Instr, LocalId, MethodId};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::fmt;
use thiserror::Error;

/// What a name is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Argument slot of the current callable (0 is the receiver)
    Argument { slot: u32 },
    /// Local slot of the current callable
    Local { slot: LocalId },
    /// Belief storage on the receiver
    Field { field: FieldId, arity: usize },
    /// Plan or handler of the agent
    Callable { method: MethodId, params: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Argument,
    Local,
    Field,
    Callable,
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingKind::Argument => write!(f, "parameter"),
            BindingKind::Local => write!(f, "local variable"),
            BindingKind::Field => write!(f, "belief"),
            BindingKind::Callable => write!(f, "plan"),
        }
    }
}

impl Binding {
    pub fn kind(&self) -> BindingKind {
        match self {
            Binding::Argument { .. } => BindingKind::Argument,
            Binding::Local { .. } => BindingKind::Local,
            Binding::Field { .. } => BindingKind::Field,
            Binding::Callable { .. } => BindingKind::Callable,
        }
    }

    /// Instruction that pushes the bound value. Callables have no value.
    pub fn load(&self) -> Option<Instr> {
        match *self {
            Binding::Argument { slot } => Some(Instr::LoadArg(slot)),
            Binding::Local { slot } => Some(Instr::LoadLocal(slot)),
            Binding::Field { field, .. } => Some(Instr::LoadField(field)),
            Binding::Callable { .. } => None,
        }
    }

    /// Instruction that pops into the binding. Callables cannot be written.
    pub fn store(&self) -> Option<Instr> {
        match *self {
            Binding::Argument { slot } => Some(Instr::StoreArg(slot)),
            Binding::Local { slot } => Some(Instr::StoreLocal(slot)),
            Binding::Field { field, .. } => Some(Instr::StoreField(field)),
            Binding::Callable { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("`{name}` is already declared in this scope")]
    Redeclared { name: SmolStr },

    #[error("no open scope to {operation}")]
    EmptyStack { operation: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("`{name}` is not in scope")]
    NotFound { name: SmolStr },

    #[error("`{name}` is a {found}, expected a {expected}")]
    WrongKind {
        name: SmolStr,
        expected: BindingKind,
        found: BindingKind,
    },
}

type Frame = FxHashMap<SmolStr, Binding>;

#[derive(Debug, Default)]
pub struct SymbolTable {
    frames: Vec<Frame>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_scope(&mut self) {
        self.frames.push(Frame::default());
    }

    pub fn exit_scope(&mut self) -> Result<(), ScopeError> {
        self.frames
            .pop()
            .map(|_| ())
            .ok_or(ScopeError::EmptyStack { operation: "exit" })
    }

    /// Number of open frames
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Bind `name` in the innermost frame.
    pub fn register(&mut self, name: impl Into<SmolStr>, binding: Binding) -> Result<(), ScopeError> {
        let frame = self
            .frames
            .last_mut()
            .ok_or(ScopeError::EmptyStack {
                operation: "register into",
            })?;

        let name = name.into();
        if frame.contains_key(&name) {
            return Err(ScopeError::Redeclared { name });
        }
        frame.insert(name, binding);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Like [`SymbolTable::lookup`], but the nearest binding must also be
    /// of the requested kind.
    pub fn lookup_as(&self, name: &str, expected: BindingKind) -> Result<&Binding, LookupError> {
        let binding = self.lookup(name).ok_or_else(|| LookupError::NotFound {
            name: SmolStr::new(name),
        })?;

        if binding.kind() != expected {
            return Err(LookupError::WrongKind {
                name: SmolStr::new(name),
                expected,
                found: binding.kind(),
            });
        }
        Ok(binding)
    }
}
