//! Credo Language Parser
//!
//! Recursive descent over a single look-ahead token. The parser is error
//! tolerant: a mismatched token is recorded and consumed anyway, and a
//! malformed statement is skipped up to the next `;`, so one run reports
//! as many independent mistakes as it can find.
//!
//! ```text
//! agent     := "agent" ident ["(" params ")"] "{" member* "}"
//! member    := belief | "on" procedure | "plan" procedure
//! belief    := "bel" ident "(" [atom ("," atom)*] ")" [";"]
//! procedure := ident ["(" params ")"] "{" (statement ";")* "}"
//! params    := [ident ":" ident ("," ident ":" ident)*]
//! statement := ("?" | "+" | "!") term
//! term      := ident "(" [expr ("," expr)*] ")"
//! expr      := product (("+" | "-") product)*
//! product   := atom (("*" | "/") atom)*
//! atom      := ident | number
//! ```

use credo_ast::*;
use credo_lexer::{Lexer, Token, TokenKind};
use thiserror::Error;
use tracing::debug;

/// Parser error type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("unexpected {found}, expected a statement starting with `?`, `+` or `!`")]
    ExpectedStatement { found: String, span: Span },

    #[error("unexpected {found}, expected an identifier or a number")]
    ExpectedAtom { found: String, span: Span },

    #[error("integer literal `{literal}` does not fit in a machine integer")]
    IntegerOutOfRange { literal: String, span: Span },

    #[error("unexpected {found} after the agent declaration")]
    TrailingInput { found: String, span: Span },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. } => *span,
            ParseError::ExpectedStatement { span, .. } => *span,
            ParseError::ExpectedAtom { span, .. } => *span,
            ParseError::IntegerOutOfRange { span, .. } => *span,
            ParseError::TrailingInput { span, .. } => *span,
        }
    }

    /// Stable error code for reporting
    pub fn code(&self) -> &'static str {
        match self {
            ParseError::UnexpectedToken { .. } => "E1001",
            ParseError::ExpectedStatement { .. } => "E1002",
            ParseError::ExpectedAtom { .. } => "E1003",
            ParseError::IntegerOutOfRange { .. } => "E1004",
            ParseError::TrailingInput { .. } => "E1005",
        }
    }
}

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Parser state
pub struct Parser<'src> {
    tokens: Lexer<'src>,
    current: Token,
    previous_span: Span,
    errors: Vec<ParseError>,
}

impl<'src> Parser<'src> {
    /// Create a new parser from source code
    pub fn new(source: &'src str) -> Self {
        let mut tokens = Lexer::new(source);
        let current = match tokens.next() {
            Some(token) => token,
            None => Token::new(TokenKind::Eof, "end of file", Span::dummy()),
        };

        Self {
            tokens,
            current,
            previous_span: Span::dummy(),
            errors: Vec::new(),
        }
    }

    /// Parse the compilation unit: one agent, then end of file.
    pub fn parse_unit(&mut self) -> AgentDecl {
        let agent = self.parse_agent();

        if !self.is_eof() {
            let error = ParseError::TrailingInput {
                found: self.current.kind.to_string(),
                span: self.current.span,
            };
            self.error(error);
        }

        agent
    }

    /// Get collected errors
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    // ========================================================================
    // Token Navigation
    // ========================================================================

    fn is_eof(&self) -> bool {
        self.current.is_eof()
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.current.kind == *kind
    }

    /// Move to the next token and return the one just left. Past the end
    /// of input the current token stays at end of file.
    fn advance(&mut self) -> Token {
        let next = match self.tokens.next() {
            Some(token) => token,
            None => self.current.clone(),
        };
        self.previous_span = self.current.span;
        std::mem::replace(&mut self.current, next)
    }

    fn error(&mut self, error: ParseError) {
        debug!(code = error.code(), at = %error.span(), "syntax error: {}", error);
        self.errors.push(error);
    }

    fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.into(),
            found: self.current.kind.to_string(),
            span: self.current.span,
        }
    }

    /// Consume a token of the given kind. On a mismatch the error is
    /// recorded and the current token is consumed all the same.
    fn expect(&mut self, kind: TokenKind) -> Token {
        if !self.check(&kind) {
            let error = self.unexpected(kind.describe());
            self.error(error);
        }
        self.advance()
    }

    /// Like [`Parser::expect`] for identifiers. A mismatched token still
    /// yields a name (its lexeme) so the tree keeps its shape.
    fn expect_ident(&mut self) -> Ident {
        if !matches!(self.current.kind, TokenKind::Ident(_)) {
            let error = self.unexpected("identifier");
            self.error(error);
        }
        let token = self.advance();
        match token.kind {
            TokenKind::Ident(name) => Spanned::new(name, token.span),
            _ => Spanned::new(token.lexeme, token.span),
        }
    }

    /// Skip the rest of a malformed statement, through its `;`. Stops short
    /// of a `}` so the enclosing block can still close.
    fn recover_to_next_statement(&mut self) {
        while !self.is_eof() && !self.check(&TokenKind::RBrace) {
            if self.advance().kind == TokenKind::Semi {
                break;
            }
        }
    }

    // ========================================================================
    // Agent Parsing
    // ========================================================================

    fn parse_agent(&mut self) -> AgentDecl {
        let start = self.current.span;
        self.expect(TokenKind::Agent);
        let name = self.expect_ident();
        let params = self.parse_optional_params();

        self.expect(TokenKind::LBrace);
        let body = self.parse_agent_body();
        self.expect(TokenKind::RBrace);

        AgentDecl::new(name, params, body, start.merge(self.previous_span))
    }

    fn parse_agent_body(&mut self) -> Vec<AgentItem> {
        let mut items = Vec::new();

        loop {
            match self.current.kind {
                TokenKind::Bel => items.push(AgentItem::Belief(self.parse_belief())),
                TokenKind::On => {
                    self.advance();
                    let handler = self.parse_procedure();
                    items.push(AgentItem::Member(Member::Handler(handler)));
                }
                TokenKind::Plan => {
                    self.advance();
                    let plan = self.parse_procedure();
                    items.push(AgentItem::Member(Member::Plan(plan)));
                }
                _ => break,
            }
        }

        items
    }

    fn parse_belief(&mut self) -> BeliefDecl {
        let start = self.current.span;
        self.expect(TokenKind::Bel);
        let name = self.expect_ident();

        self.expect(TokenKind::LParen);
        let mut init = Vec::new();
        if !self.check(&TokenKind::RParen) {
            init.extend(self.parse_belief_atom());
            while self.check(&TokenKind::Comma) {
                self.advance();
                init.extend(self.parse_belief_atom());
            }
        }
        self.expect(TokenKind::RParen);
        let span = start.merge(self.previous_span);

        if self.check(&TokenKind::Semi) {
            self.advance();
        }

        BeliefDecl { name, init, span }
    }

    fn parse_belief_atom(&mut self) -> Option<Expr> {
        match self.parse_atom() {
            Ok(atom) => Some(atom),
            Err(error) => {
                self.error(error);
                self.advance();
                None
            }
        }
    }

    // ========================================================================
    // Procedure Parsing
    // ========================================================================

    fn parse_procedure(&mut self) -> ProcDecl {
        let start = self.current.span;
        let name = self.expect_ident();
        let params = self.parse_optional_params();

        self.expect(TokenKind::LBrace);
        let body = self.parse_block_body();
        self.expect(TokenKind::RBrace);

        ProcDecl {
            name,
            params,
            body,
            span: start.merge(self.previous_span),
        }
    }

    fn parse_optional_params(&mut self) -> Vec<Param> {
        let mut params = Vec::new();

        if self.check(&TokenKind::LParen) {
            self.advance();
            if !self.check(&TokenKind::RParen) {
                params.push(self.parse_param());
                while self.check(&TokenKind::Comma) {
                    self.advance();
                    params.push(self.parse_param());
                }
            }
            self.expect(TokenKind::RParen);
        }

        params
    }

    fn parse_param(&mut self) -> Param {
        let name = self.expect_ident();
        self.expect(TokenKind::Colon);
        let ty = self.expect_ident();
        let span = name.span.merge(ty.span);
        Param { name, ty, span }
    }

    fn parse_block_body(&mut self) -> Vec<Stmt> {
        let mut stmts = Vec::new();

        while !self.check(&TokenKind::RBrace) && !self.is_eof() {
            match self.parse_statement() {
                Ok(stmt) => {
                    stmts.push(stmt);
                    self.expect_statement_end();
                }
                Err(e) => {
                    self.error(e);
                    self.recover_to_next_statement();
                }
            }
        }

        stmts
    }

    /// The `;` after a statement. A missing one before `}` is reported
    /// without consuming the brace, which belongs to the block.
    fn expect_statement_end(&mut self) {
        if self.check(&TokenKind::RBrace) {
            let error = self.unexpected(TokenKind::Semi.describe());
            self.error(error);
        } else {
            self.expect(TokenKind::Semi);
        }
    }

    // ========================================================================
    // Statement Parsing
    // ========================================================================

    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        let start = self.current.span;

        let kind = match self.current.kind {
            TokenKind::Question => {
                self.advance();
                StmtKind::Query(self.parse_term()?)
            }
            TokenKind::Plus => {
                self.advance();
                StmtKind::Update(self.parse_term()?)
            }
            TokenKind::Bang => {
                self.advance();
                StmtKind::Invoke(self.parse_term()?)
            }
            _ => {
                return Err(ParseError::ExpectedStatement {
                    found: self.current.kind.to_string(),
                    span: self.current.span,
                })
            }
        };

        Ok(Stmt {
            kind,
            span: start.merge(self.previous_span),
        })
    }

    fn parse_term(&mut self) -> ParseResult<Term> {
        let name = self.expect_ident();
        self.expect(TokenKind::LParen);

        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            args.push(self.parse_expression()?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                args.push(self.parse_expression()?);
            }
        }
        self.expect(TokenKind::RParen);

        let span = name.span.merge(self.previous_span);
        Ok(Term { name, args, span })
    }

    // ========================================================================
    // Expression Parsing
    // ========================================================================

    /// Additive level. Left-associative: `a - b - c` is `(a - b) - c`.
    fn parse_expression(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };

            self.advance();
            let right = self.parse_multiplicative()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_atom()?;

        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };

            self.advance();
            let right = self.parse_atom()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    fn parse_atom(&mut self) -> ParseResult<Expr> {
        let span = self.current.span;
        match &self.current.kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(Expr::new(ExprKind::Ident(name), span))
            }
            TokenKind::Number(literal) => {
                let value = literal
                    .parse::<i64>()
                    .map_err(|_| ParseError::IntegerOutOfRange {
                        literal: literal.to_string(),
                        span,
                    })?;
                self.advance();
                Ok(Expr::new(ExprKind::Number(value), span))
            }
            other => Err(ParseError::ExpectedAtom {
                found: other.to_string(),
                span,
            }),
        }
    }
}

/// Convenience function to parse a string into an agent declaration plus
/// every syntax error found along the way.
pub fn parse(source: &str) -> (AgentDecl, Vec<ParseError>) {
    let mut parser = Parser::new(source);
    let agent = parser.parse_unit();
    (agent, parser.into_errors())
}
