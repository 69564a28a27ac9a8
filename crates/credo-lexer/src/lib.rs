//! Credo Language Lexer
//!
//! Turns agent source text into a lazy stream of tokens. Uses the `logos`
//! crate for the fixed part of the vocabulary; anything logos cannot match
//! becomes an [`TokenKind::Unknown`] token so the scanner itself never fails
//! and malformed input is left for the parser to report.

use logos::Logos;
use smol_str::SmolStr;
use std::fmt;
use std::ops::Range;

/// A point in the source: byte offset plus 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Location {
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(offset: usize, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Half-open source span `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: Location,
    pub end: Location,
}

impl Span {
    pub fn new(start: Location, end: Location) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn dummy() -> Self {
        Self::default()
    }

    /// Byte range covered by this span.
    pub fn range(&self) -> Range<usize> {
        self.start.offset..self.end.offset
    }

    pub fn is_empty(&self) -> bool {
        self.start.offset >= self.end.offset
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.range()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start)
    }
}

/// Maps byte offsets to line/column locations.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .char_indices()
                .filter(|&(_, c)| c == '\n')
                .map(|(i, _)| i + 1),
        );
        Self { line_starts }
    }

    /// Resolve `offset` within `source`. Columns count characters, not bytes.
    pub fn location(&self, source: &str, offset: usize) -> Location {
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = self.line_starts[line - 1];
        let column = source
            .get(line_start..offset)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(offset - line_start);
        Location::new(offset, line as u32, column as u32 + 1)
    }
}

/// A token: what it is, the text it came from, and where.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: SmolStr,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<SmolStr>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

/// All token types in the Credo language
#[derive(Logos, Debug, Clone, PartialEq, Eq, Hash)]
#[logos(skip r"\s+")]
pub enum TokenKind {
    // ========== Keywords ==========
    #[token("agent")]
    Agent,
    #[token("bel")]
    Bel,
    #[token("on")]
    On,
    #[token("plan")]
    Plan,
    #[token("proto")]
    Proto,

    // ========== Operators ==========
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("?")]
    Question,
    #[token("??")]
    QuestionQuestion,
    #[token("!")]
    Bang,

    // ========== Delimiters ==========
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,

    // ========== Literals ==========
    /// Unsigned decimal integer
    #[regex(r"[0-9]+", |lex| SmolStr::new(lex.slice()))]
    Number(SmolStr),

    // ========== Identifiers ==========
    #[regex(r"[A-Za-z][A-Za-z0-9]*", |lex| SmolStr::new(lex.slice()))]
    Ident(SmolStr),

    // ========== Fallback ==========
    /// Unrecognised run of non-whitespace characters
    Unknown(SmolStr),

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Agent => write!(f, "agent"),
            TokenKind::Bel => write!(f, "bel"),
            TokenKind::On => write!(f, "on"),
            TokenKind::Plan => write!(f, "plan"),
            TokenKind::Proto => write!(f, "proto"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Question => write!(f, "?"),
            TokenKind::QuestionQuestion => write!(f, "??"),
            TokenKind::Bang => write!(f, "!"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::LBracket => write!(f, "["),
            TokenKind::RBracket => write!(f, "]"),
            TokenKind::LBrace => write!(f, "{{"),
            TokenKind::RBrace => write!(f, "}}"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Semi => write!(f, ";"),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::Number(s) => write!(f, "number `{}`", s),
            TokenKind::Ident(s) => write!(f, "identifier `{}`", s),
            TokenKind::Unknown(s) => write!(f, "unknown `{}`", s),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}

impl TokenKind {
    /// Human-readable name of the token class, ignoring any payload.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Number(_) => "number",
            TokenKind::Ident(_) => "identifier",
            TokenKind::Unknown(_) => "unknown",
            TokenKind::Eof => "end of file",
            TokenKind::Agent => "`agent`",
            TokenKind::Bel => "`bel`",
            TokenKind::On => "`on`",
            TokenKind::Plan => "`plan`",
            TokenKind::Proto => "`proto`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Question => "`?`",
            TokenKind::QuestionQuestion => "`??`",
            TokenKind::Bang => "`!`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::Comma => "`,`",
            TokenKind::Dot => "`.`",
            TokenKind::Semi => "`;`",
            TokenKind::Colon => "`:`",
        }
    }
}

/// Lexer for Credo source code.
///
/// Yields every token in order, then exactly one [`TokenKind::Eof`], then
/// `None`. Restarting means building a new lexer over the same source.
pub struct Lexer<'src> {
    source: &'src str,
    inner: logos::Lexer<'src, TokenKind>,
    lines: LineIndex,
    finished: bool,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source code
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            inner: TokenKind::lexer(source),
            lines: LineIndex::new(source),
            finished: false,
        }
    }

    /// Get the source code being lexed
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Tokenize the entire source, end-of-file token included
    pub fn tokenize(self) -> Vec<Token> {
        self.collect()
    }

    fn span_of(&self, range: Range<usize>) -> Span {
        Span::new(
            self.lines.location(self.source, range.start),
            self.lines.location(self.source, range.end),
        )
    }

    /// Widen the current error token to the whole non-whitespace run.
    fn unknown_token(&mut self) -> Token {
        let range = self.inner.span();
        let tail = &self.source[range.start..];
        let run = tail.find(char::is_whitespace).unwrap_or(tail.len());
        let end = range.start + run;
        if end > range.end {
            self.inner.bump(end - range.end);
        }
        let end = end.max(range.end);
        let text = &self.source[range.start..end];
        Token::new(
            TokenKind::Unknown(SmolStr::new(text)),
            text,
            self.span_of(range.start..end),
        )
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.inner.next() {
            Some(Ok(kind)) => {
                let range = self.inner.span();
                let lexeme = SmolStr::new(self.inner.slice());
                Some(Token::new(kind, lexeme, self.span_of(range)))
            }
            Some(Err(())) => Some(self.unknown_token()),
            None => {
                self.finished = true;
                let end = self.source.len();
                Some(Token::new(
                    TokenKind::Eof,
                    "end of file",
                    self.span_of(end..end),
                ))
            }
        }
    }
}

impl std::iter::FusedIterator for Lexer<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("agent bel on plan proto"),
            vec![
                TokenKind::Agent,
                TokenKind::Bel,
                TokenKind::On,
                TokenKind::Plan,
                TokenKind::Proto,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        let tokens = kinds("agents belief planner");
        assert_eq!(tokens[0], TokenKind::Ident("agents".into()));
        assert_eq!(tokens[1], TokenKind::Ident("belief".into()));
        assert_eq!(tokens[2], TokenKind::Ident("planner".into()));
    }

    #[test]
    fn test_operators_and_punctuation() {
        assert_eq!(
            kinds("+ - * / ! ( ) [ ] { } , . ; :"),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Bang,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Semi,
                TokenKind::Colon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_question_marks() {
        assert_eq!(
            kinds("? ?? ???"),
            vec![
                TokenKind::Question,
                TokenKind::QuestionQuestion,
                TokenKind::QuestionQuestion,
                TokenKind::Question,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers_and_identifiers() {
        let tokens = kinds("42 count x1 7up");
        assert_eq!(tokens[0], TokenKind::Number("42".into()));
        assert_eq!(tokens[1], TokenKind::Ident("count".into()));
        assert_eq!(tokens[2], TokenKind::Ident("x1".into()));
        // digits first, then a fresh identifier
        assert_eq!(tokens[3], TokenKind::Number("7".into()));
        assert_eq!(tokens[4], TokenKind::Ident("up".into()));
    }

    #[test]
    fn test_unknown_takes_non_whitespace_run() {
        let tokens = Lexer::new("a @#x; b").tokenize();
        assert_eq!(tokens[1].kind, TokenKind::Unknown("@#x;".into()));
        assert_eq!(tokens[1].lexeme, "@#x;");
        assert_eq!(tokens[2].kind, TokenKind::Ident("b".into()));
    }

    #[test]
    fn test_single_eof() {
        let mut lexer = Lexer::new("   \n\t ");
        let eof = lexer.next().unwrap();
        assert!(eof.is_eof());
        assert_eq!(eof.lexeme, "end of file");
        assert!(lexer.next().is_none());
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_span_correctness() {
        let tokens = Lexer::new("agent A {\n  bel x(1);\n}").tokenize();

        assert_eq!(tokens[0].span.range(), 0..5);
        assert_eq!(tokens[0].span.start, Location::new(0, 1, 1));
        assert_eq!(tokens[0].span.end, Location::new(5, 1, 6));

        let bel = &tokens[3];
        assert_eq!(bel.kind, TokenKind::Bel);
        assert_eq!(bel.span.start, Location::new(12, 2, 3));
        assert_eq!(bel.span.end, Location::new(15, 2, 6));

        let eof = tokens.last().unwrap();
        assert_eq!(eof.span.start.line, 3);
        assert!(eof.span.is_empty());
    }

    #[test]
    fn test_token_display() {
        assert_eq!(format!("{}", TokenKind::Agent), "agent");
        assert_eq!(format!("{}", TokenKind::LBrace), "{");
        assert_eq!(format!("{}", TokenKind::Ident("n".into())), "identifier `n`");
        assert_eq!(TokenKind::Ident("n".into()).describe(), "identifier");
        assert_eq!(TokenKind::Semi.describe(), "`;`");
    }

    #[test]
    fn test_line_index_columns_count_chars() {
        let source = "é x";
        let index = LineIndex::new(source);
        // `x` starts at byte 3, but is the third character
        assert_eq!(index.location(source, 3), Location::new(3, 1, 3));
    }
}
