//! Credo Language Abstract Syntax Tree
//!
//! A compilation unit is exactly one [`AgentDecl`]. Inside an agent, belief
//! declarations are kept apart from the procedural members (plans and
//! handlers); [`AgentDecl::new`] performs that split so every consumer sees
//! the same shape.

use std::fmt;

// Re-export common types for use by other crates
pub use credo_lexer::Span;
pub use smol_str::SmolStr;

/// A spanned value - wraps any value with source location info
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }

    pub fn dummy(node: T) -> Self {
        Self {
            node,
            span: Span::dummy(),
        }
    }
}

/// Identifier (agent, belief, plan, parameter and variable names)
pub type Ident = Spanned<SmolStr>;

/// Type name attached to a parameter. Carried, never checked.
pub type TypeIdent = Spanned<SmolStr>;

// ============================================================================
// Agents
// ============================================================================

/// The single top-level declaration of a compilation unit
#[derive(Debug, Clone, PartialEq)]
pub struct AgentDecl {
    pub name: Ident,
    pub params: Vec<Param>,
    /// Belief declarations, in source order
    pub beliefs: Vec<BeliefDecl>,
    /// Plans and handlers, in source order
    pub members: Vec<Member>,
    pub span: Span,
}

impl AgentDecl {
    /// Build an agent from its parsed body, moving every belief declaration
    /// into `beliefs` and leaving everything else in `members`.
    pub fn new(name: Ident, params: Vec<Param>, body: Vec<AgentItem>, span: Span) -> Self {
        let mut beliefs = Vec::new();
        let mut members = Vec::new();

        for item in body {
            match item {
                AgentItem::Belief(belief) => beliefs.push(belief),
                AgentItem::Member(member) => members.push(member),
            }
        }

        Self {
            name,
            params,
            beliefs,
            members,
            span,
        }
    }
}

/// One entry of an agent body as it appears in the source
#[derive(Debug, Clone, PartialEq)]
pub enum AgentItem {
    Belief(BeliefDecl),
    Member(Member),
}

/// `name: type`
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub ty: TypeIdent,
    pub span: Span,
}

/// `bel name(atom, ...)`
///
/// `init` only ever holds identifiers and integer literals; its length is
/// the arity of the belief's storage.
#[derive(Debug, Clone, PartialEq)]
pub struct BeliefDecl {
    pub name: Ident,
    pub init: Vec<Expr>,
    pub span: Span,
}

impl BeliefDecl {
    pub fn arity(&self) -> usize {
        self.init.len()
    }
}

// ============================================================================
// Plans and handlers
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Plan,
    Handler,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Plan => write!(f, "plan"),
            MemberKind::Handler => write!(f, "handler"),
        }
    }
}

/// Shared shape of plans and handlers
#[derive(Debug, Clone, PartialEq)]
pub struct ProcDecl {
    pub name: Ident,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    /// `plan name(params) { ... }`
    Plan(ProcDecl),
    /// `on name(params) { ... }`
    Handler(ProcDecl),
}

impl Member {
    pub fn kind(&self) -> MemberKind {
        match self {
            Member::Plan(_) => MemberKind::Plan,
            Member::Handler(_) => MemberKind::Handler,
        }
    }

    pub fn decl(&self) -> &ProcDecl {
        match self {
            Member::Plan(decl) | Member::Handler(decl) => decl,
        }
    }
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `?name(x, ...)` - destructure a belief into fresh locals
    Query(Term),
    /// `+name(e, ...)` - overwrite a belief
    Update(Term),
    /// `!name(e, ...)` - call a plan
    Invoke(Term),
}

/// `name(expr, ...)`
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub name: Ident,
    pub args: Vec<Expr>,
    pub span: Span,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// The name, if this expression is a bare identifier
    pub fn as_ident(&self) -> Option<&SmolStr> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Ident(SmolStr),
    Number(i64),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Fully parenthesised rendering, handy for checking associativity.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Ident(name) => write!(f, "{}", name),
            ExprKind::Number(value) => write!(f, "{}", value),
            ExprKind::Binary { op, left, right } => write!(f, "({} {} {})", left, op, right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ident(name: &str) -> Ident {
        Spanned::dummy(SmolStr::new(name))
    }

    fn proc_decl(name: &str) -> ProcDecl {
        ProcDecl {
            name: ident(name),
            params: Vec::new(),
            body: Vec::new(),
            span: Span::dummy(),
        }
    }

    fn belief(name: &str) -> BeliefDecl {
        BeliefDecl {
            name: ident(name),
            init: vec![Expr::new(ExprKind::Number(0), Span::dummy())],
            span: Span::dummy(),
        }
    }

    #[test]
    fn test_agent_partitions_body() {
        let body = vec![
            AgentItem::Member(Member::Plan(proc_decl("a"))),
            AgentItem::Belief(belief("x")),
            AgentItem::Member(Member::Handler(proc_decl("b"))),
            AgentItem::Belief(belief("y")),
        ];
        let agent = AgentDecl::new(ident("A"), Vec::new(), body, Span::dummy());

        let beliefs: Vec<_> = agent.beliefs.iter().map(|b| b.name.node.as_str()).collect();
        let members: Vec<_> = agent
            .members
            .iter()
            .map(|m| (m.kind(), m.decl().name.node.as_str()))
            .collect();

        assert_eq!(beliefs, vec!["x", "y"]);
        assert_eq!(
            members,
            vec![(MemberKind::Plan, "a"), (MemberKind::Handler, "b")]
        );
    }

    #[test]
    fn test_expr_display_parenthesises() {
        let a = Expr::new(ExprKind::Ident("a".into()), Span::dummy());
        let two = Expr::new(ExprKind::Number(2), Span::dummy());
        let mul = Expr::new(
            ExprKind::Binary {
                op: BinaryOp::Mul,
                left: Box::new(a),
                right: Box::new(two),
            },
            Span::dummy(),
        );
        assert_eq!(mul.to_string(), "(a * 2)");
        assert_eq!(mul.as_ident(), None);
    }
}
