//! Token types for the Frond lexer

use crate::frontend::ast::Position;

/// Segment of a scanned string literal: literal text, or the raw source of
/// an embedded `{expr}` interpolation (re-parsed later by the parser).
#[derive(Debug, Clone, PartialEq)]
pub enum StrSegment {
    Literal(String),
    Expr(String),
}

/// Token kinds for Frond.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ========== Literals ==========
    Ident(String),
    Int(i64),
    Float(f64),
    Str(Vec<StrSegment>),
    True,
    False,

    // ========== Keywords ==========
    Module,
    Import,
    Type,
    Interface,
    Func,
    Return,
    If,
    Else,
    For,
    In,
    From,
    To,
    Through,
    Go,
    Defer,
    Make,
    List,
    Map,
    Channel,
    Of,
    Send,
    Receive,
    Close,
    Panic,
    Recover,
    Error,
    Empty,
    Reference,
    This,
    Discard,
    As,
    OnErr,
    Explain,

    // ========== Keyword operators ==========
    And,    // and  (same precedence as &&)
    Or,     // or   (same precedence as ||)
    Not,    // not  (same precedence as !)
    Equals, // equals (same precedence as ==)

    // ========== Operators ==========
    Walrus,    // :=
    Assign,    // =
    EqEq,      // ==
    NotEq,     // !=
    Lt,        // <
    Gt,        // >
    LtEq,      // <=
    GtEq,      // >=
    Plus,      // +
    Minus,     // -
    Star,      // *
    Slash,     // /
    Percent,   // %
    AndAnd,    // &&
    OrOr,      // ||
    Bang,      // !
    PipeArrow, // |>

    // ========== Delimiters ==========
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Colon,
    Semicolon,
    Underscore, // `_` pipe placeholder

    // ========== Structural ==========
    Newline,
    Indent,
    Dedent,
    Eof,
}

impl TokenKind {
    /// Human-readable name for error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Ident(_) => "identifier",
            TokenKind::Int(_) => "integer literal",
            TokenKind::Float(_) => "float literal",
            TokenKind::Str(_) => "string literal",
            TokenKind::True | TokenKind::False => "boolean literal",
            TokenKind::Newline => "end of line",
            TokenKind::Indent => "indent",
            TokenKind::Dedent => "dedent",
            TokenKind::Eof => "end of file",
            _ => "token",
        }
    }
}

/// Keyword lookup. Words that double as operators (`and`, `or`, `not`,
/// `equals`, `in`) are first-class operator tokens so the expression grammar
/// does not special-case them.
pub fn keyword_kind(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "module" => TokenKind::Module,
        "import" => TokenKind::Import,
        "type" => TokenKind::Type,
        "interface" => TokenKind::Interface,
        "func" => TokenKind::Func,
        "return" => TokenKind::Return,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "for" => TokenKind::For,
        "in" => TokenKind::In,
        "from" => TokenKind::From,
        "to" => TokenKind::To,
        "through" => TokenKind::Through,
        "go" => TokenKind::Go,
        "defer" => TokenKind::Defer,
        "make" => TokenKind::Make,
        "list" => TokenKind::List,
        "map" => TokenKind::Map,
        "channel" => TokenKind::Channel,
        "of" => TokenKind::Of,
        "send" => TokenKind::Send,
        "receive" => TokenKind::Receive,
        "close" => TokenKind::Close,
        "panic" => TokenKind::Panic,
        "recover" => TokenKind::Recover,
        "error" => TokenKind::Error,
        "empty" => TokenKind::Empty,
        "reference" => TokenKind::Reference,
        "this" => TokenKind::This,
        "discard" => TokenKind::Discard,
        "as" => TokenKind::As,
        "onerr" => TokenKind::OnErr,
        "explain" => TokenKind::Explain,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "not" => TokenKind::Not,
        "equals" => TokenKind::Equals,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        _ => return None,
    };
    Some(kind)
}

/// A token with kind, original lexeme, and source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub pos: Position,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, pos: Position) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            pos,
        }
    }
}
