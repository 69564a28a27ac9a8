//! The emitted artifact: one agent type and the stack instructions of its
//! constructor and members.
//!
//! Every callable runs over an operand stack. Argument slot 0 always holds
//! the receiver, so field instructions never name it explicitly.

use smol_str::SmolStr;
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

/// Index into [`AgentType::fields`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub u32);

/// Index into [`AgentType::methods`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(pub u32);

/// Index into [`AgentType::tuples`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TupleId(pub u32);

/// Index into a method's local slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalId(pub u32);

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

impl fmt::Display for TupleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l{}", self.0)
    }
}

// ============================================================================
// Instructions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instr {
    /// Push argument `n` (0 is the receiver)
    LoadArg(u32),
    /// Pop into argument `n`
    StoreArg(u32),
    LoadLocal(LocalId),
    StoreLocal(LocalId),
    /// Push the receiver's field
    LoadField(FieldId),
    /// Pop into the receiver's field
    StoreField(FieldId),
    PushInt(i64),
    Add,
    Sub,
    Mul,
    Div,
    /// Pop as many integers as the tuple's arity (last pushed is the last
    /// element) and push one tuple
    MakeTuple(TupleId),
    /// Pop a tuple and push its element at the given index
    TupleGet(TupleId, u8),
    /// Pop `argc` values, receiver first, and invoke `method`
    Call { method: MethodId, argc: u32 },
    Return,
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::LoadArg(n) => write!(f, "ldarg {}", n),
            Instr::StoreArg(n) => write!(f, "starg {}", n),
            Instr::LoadLocal(l) => write!(f, "ldloc {}", l),
            Instr::StoreLocal(l) => write!(f, "stloc {}", l),
            Instr::LoadField(field) => write!(f, "ldfld {}", field),
            Instr::StoreField(field) => write!(f, "stfld {}", field),
            Instr::PushInt(v) => write!(f, "push {}", v),
            Instr::Add => write!(f, "add"),
            Instr::Sub => write!(f, "sub"),
            Instr::Mul => write!(f, "mul"),
            Instr::Div => write!(f, "div"),
            Instr::MakeTuple(t) => write!(f, "mktuple {}", t),
            Instr::TupleGet(t, i) => write!(f, "tget {}.{}", t, i),
            Instr::Call { method, argc } => write!(f, "call {}/{}", method, argc),
            Instr::Return => write!(f, "ret"),
        }
    }
}

// ============================================================================
// Artifact
// ============================================================================

/// All-integer tuple type of a fixed arity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TupleDesc {
    pub id: TupleId,
    pub arity: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDef {
    pub name: SmolStr,
    pub ty: SmolStr,
}

/// Storage for one belief
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: SmolStr,
    pub arity: usize,
    /// Tuple type of the stored value. `None` only when the arity is
    /// unsupported, in which case the unit also carries a diagnostic.
    pub tuple: Option<TupleId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Constructor,
    Plan,
    Handler,
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodKind::Constructor => write!(f, "constructor"),
            MethodKind::Plan => write!(f, "plan"),
            MethodKind::Handler => write!(f, "handler"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDef {
    pub name: SmolStr,
    pub kind: MethodKind,
    /// Declared parameters; argument slot `i + 1` holds `params[i]`
    pub params: Vec<ParamDef>,
    /// Names of the local slots, indexed by [`LocalId`]
    pub locals: Vec<SmolStr>,
    pub code: Vec<Instr>,
}

impl MethodDef {
    /// Number of argument slots, receiver included
    pub fn argc(&self) -> usize {
        self.params.len() + 1
    }
}

/// One compiled agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentType {
    pub name: SmolStr,
    pub params: Vec<ParamDef>,
    pub fields: Vec<FieldDef>,
    pub tuples: Vec<TupleDesc>,
    pub constructor: MethodDef,
    pub methods: Vec<MethodDef>,
}

impl AgentType {
    pub fn field(&self, name: &str) -> Option<(FieldId, &FieldDef)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, field)| field.name == name)
            .map(|(i, field)| (FieldId(i as u32), field))
    }

    pub fn method(&self, name: &str) -> Option<(MethodId, &MethodDef)> {
        self.methods
            .iter()
            .enumerate()
            .find(|(_, method)| method.name == name)
            .map(|(i, method)| (MethodId(i as u32), method))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_instr_display() {
        let rendered: Vec<String> = [
            Instr::LoadArg(0),
            Instr::StoreLocal(LocalId(2)),
            Instr::LoadField(FieldId(1)),
            Instr::PushInt(-3),
            Instr::MakeTuple(TupleId(0)),
            Instr::TupleGet(TupleId(0), 1),
            Instr::Call {
                method: MethodId(4),
                argc: 2,
            },
            Instr::Return,
        ]
        .iter()
        .map(|i| i.to_string())
        .collect();

        assert_eq!(
            rendered,
            vec![
                "ldarg 0",
                "stloc l2",
                "ldfld f1",
                "push -3",
                "mktuple t0",
                "tget t0.1",
                "call m4/2",
                "ret"
            ]
        );
    }
}
