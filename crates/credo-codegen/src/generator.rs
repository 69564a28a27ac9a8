//! AST to stack code.

use crate::instr::*;
use crate::symbols::{Binding, BindingKind, ScopeError, SymbolTable};
use crate::tuple::TupleCache;
use crate::{CodegenOptions, InternalError, SemanticError};
use credo_ast::{
    AgentDecl, BeliefDecl, BinaryOp, Expr, ExprKind, Ident, Member, MemberKind, Param, Stmt,
    StmtKind, Term,
};
use credo_lexer::Span;
use smol_str::SmolStr;
use tracing::{debug, trace};

type Result<T> = std::result::Result<T, InternalError>;

/// Compiles one agent. Owns the scope stack, the tuple cache and the
/// diagnostics of a single unit.
pub struct CodeGenerator {
    options: CodegenOptions,
    symbols: SymbolTable,
    tuples: TupleCache,
    fields: Vec<FieldDef>,
    methods: Vec<MethodDef>,
    diagnostics: Vec<SemanticError>,
}

impl CodeGenerator {
    pub fn new(options: CodegenOptions) -> Self {
        Self {
            options,
            symbols: SymbolTable::new(),
            tuples: TupleCache::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn diagnostics(&self) -> &[SemanticError] {
        &self.diagnostics
    }

    /// Set by the first diagnostic of the unit and never cleared.
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn into_diagnostics(self) -> Vec<SemanticError> {
        self.diagnostics
    }

    /// Build the agent type. Diagnostics stay on the generator, so the
    /// type is only usable while [`CodeGenerator::has_errors`] is false.
    pub fn generate(&mut self, agent: &AgentDecl) -> Result<AgentType> {
        debug!(agent = %agent.name.node, "generating agent");

        self.symbols.enter_scope();
        self.declare_beliefs(&agent.beliefs)?;
        let constructor = self.compile_constructor(agent)?;
        for member in &agent.members {
            self.compile_member(member)?;
        }
        self.close_scope()?;

        if self.symbols.depth() != 0 {
            return Err(InternalError::UnbalancedScopes {
                depth: self.symbols.depth(),
            });
        }

        debug!(
            agent = %agent.name.node,
            methods = self.methods.len(),
            errors = self.diagnostics.len(),
            "agent generated"
        );

        Ok(AgentType {
            name: agent.name.node.clone(),
            params: param_defs(&agent.params),
            fields: std::mem::take(&mut self.fields),
            tuples: std::mem::take(&mut self.tuples).into_descriptors(),
            constructor,
            methods: std::mem::take(&mut self.methods),
        })
    }

    // ========================================================================
    // Scopes and diagnostics
    // ========================================================================

    fn report(&mut self, error: SemanticError) {
        debug!(code = error.code(), at = %error.span(), "semantic error: {}", error);
        self.diagnostics.push(error);
    }

    fn declare(&mut self, name: &SmolStr, span: Span, binding: Binding) -> Result<()> {
        match self.symbols.register(name.clone(), binding) {
            Ok(()) => Ok(()),
            Err(ScopeError::Redeclared { name }) => {
                self.report(SemanticError::Redeclared { name, span });
                Ok(())
            }
            Err(ScopeError::EmptyStack { operation }) => {
                Err(InternalError::EmptyScopeStack { operation })
            }
        }
    }

    fn close_scope(&mut self) -> Result<()> {
        self.symbols
            .exit_scope()
            .map_err(|_| InternalError::EmptyScopeStack { operation: "exit" })
    }

    /// Argument slots 1..=N, slot 0 being the receiver.
    fn declare_params(&mut self, params: &[Param]) -> Result<()> {
        for (i, param) in params.iter().enumerate() {
            let slot = index_u32(i + 1, "parameters")?;
            self.declare(&param.name.node, param.name.span, Binding::Argument { slot })?;
        }
        Ok(())
    }

    /// The tuple type for `arity`, reporting at `span` when unsupported.
    fn tuple_for(&mut self, arity: usize, span: Span) -> Option<TupleId> {
        match self.tuples.describe(arity) {
            Ok(id) => Some(id),
            Err(source) => {
                self.report(SemanticError::Tuple { source, span });
                None
            }
        }
    }

    // ========================================================================
    // Agent structure
    // ========================================================================

    fn declare_beliefs(&mut self, beliefs: &[BeliefDecl]) -> Result<()> {
        for belief in beliefs {
            let arity = belief.arity();
            let tuple = self.tuple_for(arity, belief.span);
            let field = FieldId(index_u32(self.fields.len(), "beliefs")?);

            self.fields.push(FieldDef {
                name: belief.name.node.clone(),
                arity,
                tuple,
            });
            self.declare(
                &belief.name.node,
                belief.name.span,
                Binding::Field { field, arity },
            )?;
        }
        Ok(())
    }

    fn compile_constructor(&mut self, agent: &AgentDecl) -> Result<MethodDef> {
        self.symbols.enter_scope();
        self.declare_params(&agent.params)?;

        let mut method = MethodBuilder::new(
            agent.name.node.clone(),
            MethodKind::Constructor,
            param_defs(&agent.params),
        );

        for (index, belief) in agent.beliefs.iter().enumerate() {
            for atom in &belief.init {
                self.compile_expr(atom, &mut method);
            }

            let supported = self.fields.get(index).is_some_and(|f| f.tuple.is_some());
            if supported {
                self.pack(belief.arity(), belief.span, &mut method);
                method.emit(Instr::StoreField(FieldId(index_u32(index, "beliefs")?)));
            }
        }

        self.close_scope()?;
        Ok(method.finish())
    }

    fn compile_member(&mut self, member: &Member) -> Result<()> {
        let decl = member.decl();
        let kind = match member.kind() {
            MemberKind::Plan => MethodKind::Plan,
            MemberKind::Handler => MethodKind::Handler,
        };
        let id = MethodId(index_u32(self.methods.len(), "methods")?);
        debug!(%kind, name = %decl.name.node, %id, "compiling member");

        // Visible to its own body and to the members after it.
        self.declare(
            &decl.name.node,
            decl.name.span,
            Binding::Callable {
                method: id,
                params: decl.params.len(),
            },
        )?;

        self.symbols.enter_scope();
        self.declare_params(&decl.params)?;

        let mut method = MethodBuilder::new(decl.name.node.clone(), kind, param_defs(&decl.params));
        for stmt in &decl.body {
            self.compile_stmt(stmt, &mut method)?;
        }

        self.close_scope()?;
        self.methods.push(method.finish());
        Ok(())
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn compile_stmt(&mut self, stmt: &Stmt, method: &mut MethodBuilder) -> Result<()> {
        match &stmt.kind {
            StmtKind::Query(term) => self.compile_query(term, method),
            StmtKind::Update(term) => {
                self.compile_update(term, method);
                Ok(())
            }
            StmtKind::Invoke(term) => self.compile_invoke(term, method),
        }
    }

    fn resolve_belief(&mut self, name: &Ident) -> Option<(FieldId, usize)> {
        match self.symbols.lookup_as(&name.node, BindingKind::Field).copied() {
            Ok(Binding::Field { field, arity }) => Some((field, arity)),
            Ok(_) => None,
            Err(error) => {
                self.report(SemanticError::from_lookup(error, name.span));
                None
            }
        }
    }

    fn check_belief_arity(&mut self, term: &Term, arity: usize) -> bool {
        if term.args.len() == arity {
            return true;
        }
        self.report(SemanticError::BeliefArityMismatch {
            name: term.name.node.clone(),
            expected: arity,
            found: term.args.len(),
            span: term.span,
        });
        false
    }

    /// `?name(x, ...)`: project every element into a fresh local.
    fn compile_query(&mut self, term: &Term, method: &mut MethodBuilder) -> Result<()> {
        let Some((field, arity)) = self.resolve_belief(&term.name) else {
            return Ok(());
        };
        if !self.check_belief_arity(term, arity) || self.tuple_for(arity, term.span).is_none() {
            return Ok(());
        }

        for (index, arg) in term.args.iter().enumerate() {
            let Some(name) = arg.as_ident() else {
                self.report(SemanticError::QueryTargetNotIdent {
                    belief: term.name.node.clone(),
                    span: arg.span,
                });
                continue;
            };

            let slot = method.new_local(name.clone())?;
            method.emit(Instr::LoadField(field));
            if let Err(source) = self.tuples.emit_projection(arity, index, &mut method.code) {
                self.report(SemanticError::Tuple {
                    source,
                    span: arg.span,
                });
            }
            method.emit(Instr::StoreLocal(slot));
            self.declare(name, arg.span, Binding::Local { slot })?;
        }
        Ok(())
    }

    /// `+name(e, ...)`: evaluate, pack, overwrite.
    fn compile_update(&mut self, term: &Term, method: &mut MethodBuilder) {
        let target = self.resolve_belief(&term.name);
        for arg in &term.args {
            self.compile_expr(arg, method);
        }

        let Some((field, arity)) = target else {
            return;
        };
        if self.check_belief_arity(term, arity) && self.pack(arity, term.span, method) {
            method.emit(Instr::StoreField(field));
        }
    }

    /// `!name(e, ...)`: receiver, arguments, call.
    fn compile_invoke(&mut self, term: &Term, method: &mut MethodBuilder) -> Result<()> {
        let target = match self
            .symbols
            .lookup_as(&term.name.node, BindingKind::Callable)
            .copied()
        {
            Ok(Binding::Callable { method, params }) => Some((method, params)),
            Ok(_) => None,
            Err(error) => {
                self.report(SemanticError::from_lookup(error, term.name.span));
                None
            }
        };

        method.emit(Instr::LoadArg(0));
        for arg in &term.args {
            self.compile_expr(arg, method);
        }

        let Some((callee, params)) = target else {
            return Ok(());
        };
        if self.options.check_call_arity && term.args.len() != params {
            self.report(SemanticError::CallArityMismatch {
                name: term.name.node.clone(),
                expected: params,
                found: term.args.len(),
                span: term.span,
            });
            return Ok(());
        }

        let argc = index_u32(term.args.len() + 1, "arguments")?;
        method.emit(Instr::Call {
            method: callee,
            argc,
        });
        Ok(())
    }

    fn pack(&mut self, arity: usize, span: Span, method: &mut MethodBuilder) -> bool {
        match self.tuples.emit_create(arity, &mut method.code) {
            Ok(()) => true,
            Err(source) => {
                self.report(SemanticError::Tuple { source, span });
                false
            }
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn compile_expr(&mut self, expr: &Expr, method: &mut MethodBuilder) {
        match &expr.kind {
            ExprKind::Ident(name) => match self.symbols.lookup(name).copied() {
                Some(binding) => match (binding.kind(), binding.load()) {
                    (BindingKind::Argument | BindingKind::Local, Some(load)) => method.emit(load),
                    (found, _) => self.report(SemanticError::NotAValue {
                        name: name.clone(),
                        found,
                        span: expr.span,
                    }),
                },
                None => self.report(SemanticError::NotInScope {
                    name: name.clone(),
                    span: expr.span,
                }),
            },
            ExprKind::Number(value) => method.emit(Instr::PushInt(*value)),
            ExprKind::Binary { op, left, right } => {
                self.compile_expr(left, method);
                self.compile_expr(right, method);
                method.emit(match op {
                    BinaryOp::Add => Instr::Add,
                    BinaryOp::Sub => Instr::Sub,
                    BinaryOp::Mul => Instr::Mul,
                    BinaryOp::Div => Instr::Div,
                });
            }
        }
    }
}

/// A method body under construction
struct MethodBuilder {
    name: SmolStr,
    kind: MethodKind,
    params: Vec<ParamDef>,
    locals: Vec<SmolStr>,
    code: Vec<Instr>,
}

impl MethodBuilder {
    fn new(name: SmolStr, kind: MethodKind, params: Vec<ParamDef>) -> Self {
        Self {
            name,
            kind,
            params,
            locals: Vec::new(),
            code: Vec::new(),
        }
    }

    fn new_local(&mut self, name: SmolStr) -> Result<LocalId> {
        let slot = LocalId(index_u32(self.locals.len(), "locals")?);
        self.locals.push(name);
        Ok(slot)
    }

    fn emit(&mut self, instr: Instr) {
        trace!(method = %self.name, %instr, "emit");
        self.code.push(instr);
    }

    fn finish(mut self) -> MethodDef {
        self.emit(Instr::Return);
        MethodDef {
            name: self.name,
            kind: self.kind,
            params: self.params,
            locals: self.locals,
            code: self.code,
        }
    }
}

fn index_u32(index: usize, what: &'static str) -> Result<u32> {
    u32::try_from(index).map_err(|_| InternalError::SlotOverflow { what })
}

fn param_defs(params: &[Param]) -> Vec<ParamDef> {
    params
        .iter()
        .map(|p| ParamDef {
            name: p.name.node.clone(),
            ty: p.ty.node.clone(),
        })
        .collect()
}
