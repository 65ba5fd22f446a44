//! Lexer for the Frond programming language
//!
//! Handles tokenization including:
//! - English keywords and keyword operators (`and`, `equals`, `in`, ...)
//! - Identifiers and literals (int, float, interpolated strings)
//! - Symbolic operators and punctuation (`:=`, `|>`, ...)
//! - Indentation-based blocks (INDENT/DEDENT tokens, 4-space unit)
//!
//! ## Module structure
//!
//! - `tokens` - token types ([`TokenKind`], [`Token`], [`StrSegment`])
//! - `strings` - string literal scanning with `{expr}` segmentation
//! - `indent` - INDENT/DEDENT handling

mod indent;
mod strings;
pub mod tokens;

pub use tokens::{StrSegment, Token, TokenKind};

use crate::frontend::ast::Position;
use crate::frontend::diagnostics::Diagnostic;
use tokens::keyword_kind;

/// Lexer state for one source file.
///
/// Each invocation owns its own indent stack; there is no shared state
/// between runs.
pub struct Lexer {
    chars: Vec<char>,
    start: usize,
    current: usize,
    line: u32,
    column: u32,
    indent_stack: Vec<u32>,
    at_line_start: bool,
    tokens: Vec<Token>,
    errors: Vec<Diagnostic>,
}

/// Tokenize a whole source file.
///
/// Returns the token stream (terminated by `Eof`) or the accumulated
/// diagnostics. Recoverable errors do not stop the scan, so several
/// problems can be reported in one pass.
#[tracing::instrument(skip_all, fields(bytes = source.len()))]
pub fn lex(source: &str) -> Result<Vec<Token>, Vec<Diagnostic>> {
    Lexer::new(source).tokenize()
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            start: 0,
            current: 0,
            line: 1,
            column: 1,
            indent_stack: vec![0],
            at_line_start: true,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, Vec<Diagnostic>> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }

        // Close any open blocks before EOF.
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push_token(TokenKind::Dedent, "");
        }
        self.push_token(TokenKind::Eof, "");

        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.errors)
        }
    }

    // ========================================================================
    // Character handling
    // ========================================================================

    pub(super) fn is_at_end(&self) -> bool {
        self.current >= self.chars.len()
    }

    pub(super) fn peek(&self) -> Option<char> {
        self.chars.get(self.current).copied()
    }

    pub(super) fn peek_next(&self) -> Option<char> {
        self.chars.get(self.current + 1).copied()
    }

    pub(super) fn advance(&mut self) -> Option<char> {
        let c = self.chars.get(self.current).copied();
        if c.is_some() {
            self.current += 1;
            self.column += 1;
        }
        c
    }

    fn matches(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(super) fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    pub(super) fn push_token(&mut self, kind: TokenKind, lexeme: &str) {
        let col = self.column.saturating_sub(lexeme.chars().count() as u32).max(1);
        self.tokens
            .push(Token::new(kind, lexeme, Position::new(self.line, col)));
    }

    pub(super) fn error(&mut self, message: impl Into<String>) {
        self.errors.push(Diagnostic::lexical(message.into(), self.position()));
    }

    fn newline(&mut self) {
        self.push_token(TokenKind::Newline, "\n");
        self.line += 1;
        self.column = 1;
        self.at_line_start = true;
    }

    // ========================================================================
    // Main scanning dispatch
    // ========================================================================

    fn scan_token(&mut self) {
        if self.at_line_start {
            self.handle_indentation();
            self.at_line_start = false;
            if self.is_at_end() {
                return;
            }
            self.start = self.current;
        }

        let Some(c) = self.advance() else { return };

        match c {
            ' ' | '\t' => {
                // Interior whitespace, skipped.
                while matches!(self.peek(), Some(' ') | Some('\t')) {
                    self.advance();
                }
            }
            '\n' => self.newline(),
            '\r' => {
                self.matches('\n');
                self.newline();
            }
            '#' => {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
            }
            '"' | '\'' => self.scan_string(c),
            '(' => self.push_token(TokenKind::LParen, "("),
            ')' => self.push_token(TokenKind::RParen, ")"),
            '[' => self.push_token(TokenKind::LBracket, "["),
            ']' => self.push_token(TokenKind::RBracket, "]"),
            '{' => self.push_token(TokenKind::LBrace, "{"),
            '}' => self.push_token(TokenKind::RBrace, "}"),
            ',' => self.push_token(TokenKind::Comma, ","),
            '.' => self.push_token(TokenKind::Dot, "."),
            ';' => self.push_token(TokenKind::Semicolon, ";"),
            '+' => self.push_token(TokenKind::Plus, "+"),
            '-' => self.push_token(TokenKind::Minus, "-"),
            '*' => self.push_token(TokenKind::Star, "*"),
            '/' => self.push_token(TokenKind::Slash, "/"),
            '%' => self.push_token(TokenKind::Percent, "%"),
            ':' => {
                if self.matches('=') {
                    self.push_token(TokenKind::Walrus, ":=");
                } else {
                    self.push_token(TokenKind::Colon, ":");
                }
            }
            '=' => {
                if self.matches('=') {
                    self.push_token(TokenKind::EqEq, "==");
                } else {
                    self.push_token(TokenKind::Assign, "=");
                }
            }
            '!' => {
                if self.matches('=') {
                    self.push_token(TokenKind::NotEq, "!=");
                } else {
                    self.push_token(TokenKind::Bang, "!");
                }
            }
            '<' => {
                if self.matches('=') {
                    self.push_token(TokenKind::LtEq, "<=");
                } else {
                    self.push_token(TokenKind::Lt, "<");
                }
            }
            '>' => {
                if self.matches('=') {
                    self.push_token(TokenKind::GtEq, ">=");
                } else {
                    self.push_token(TokenKind::Gt, ">");
                }
            }
            '|' => {
                if self.matches('>') {
                    self.push_token(TokenKind::PipeArrow, "|>");
                } else if self.matches('|') {
                    self.push_token(TokenKind::OrOr, "||");
                } else {
                    self.error("unexpected character '|'; did you mean '|>'?");
                }
            }
            '&' => {
                if self.matches('&') {
                    self.push_token(TokenKind::AndAnd, "&&");
                } else {
                    self.error("unexpected character '&'; did you mean '&&'?");
                }
            }
            c if c.is_ascii_digit() => self.scan_number(),
            c if is_ident_start(c) => self.scan_identifier(),
            c => self.error(format!("unexpected character '{c}'")),
        }
    }

    fn scan_number(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        let is_float = self.peek() == Some('.')
            && self.peek_next().is_some_and(|c| c.is_ascii_digit());
        if is_float {
            self.advance(); // consume '.'
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let text: String = self.chars[self.start..self.current].iter().collect();
        if is_float {
            match text.parse::<f64>() {
                Ok(value) => self.push_token(TokenKind::Float(value), &text),
                Err(_) => self.error(format!("invalid float literal '{text}'")),
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => self.push_token(TokenKind::Int(value), &text),
                Err(_) => self.error(format!("integer literal '{text}' out of range")),
            }
        }
    }

    fn scan_identifier(&mut self) {
        while self.peek().is_some_and(is_ident_continue) {
            self.advance();
        }

        let text: String = self.chars[self.start..self.current].iter().collect();
        if text == "_" {
            self.push_token(TokenKind::Underscore, "_");
            return;
        }
        match keyword_kind(&text) {
            Some(kind) => self.push_token(kind, &text),
            None => self.push_token(TokenKind::Ident(text.clone()), &text),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).expect("lex failed").into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scans_keywords_and_identifiers() {
        let kinds = kinds("func greet\n");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Func,
                TokenKind::Ident("greet".into()),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keyword_operators_are_first_class_tokens() {
        let kinds = kinds("a and b or not c equals d\n");
        assert!(kinds.contains(&TokenKind::And));
        assert!(kinds.contains(&TokenKind::Or));
        assert!(kinds.contains(&TokenKind::Not));
        assert!(kinds.contains(&TokenKind::Equals));
    }

    #[test]
    fn indent_and_dedent_are_balanced() {
        let source = "if ready\n    print(1)\n    if deep\n        print(2)\nprint(3)\n";
        let kinds = kinds(source);
        let indents = kinds.iter().filter(|k| **k == TokenKind::Indent).count();
        let dedents = kinds.iter().filter(|k| **k == TokenKind::Dedent).count();
        assert_eq!(indents, 2);
        assert_eq!(indents, dedents);
    }

    #[test]
    fn dedents_are_emitted_at_eof() {
        let kinds = kinds("if ready\n    print(1)");
        assert!(kinds.contains(&TokenKind::Dedent));
        assert_eq!(*kinds.last().unwrap(), TokenKind::Eof);
    }

    #[test]
    fn non_multiple_of_four_indent_is_one_diagnostic() {
        let errs = lex("if ready\n   print(1)\n").unwrap_err();
        let indent_errs: Vec<_> = errs
            .iter()
            .filter(|d| d.message.contains("multiple of 4"))
            .collect();
        assert_eq!(indent_errs.len(), 1);
        assert_eq!(indent_errs[0].pos.line, 2);
    }

    #[test]
    fn tabs_in_indentation_are_rejected() {
        let errs = lex("if ready\n\tprint(1)\n").unwrap_err();
        assert!(errs.iter().any(|d| d.message.contains("tabs")));
    }

    #[test]
    fn indentation_mismatch_is_fatal() {
        // 8 then dedent to 4 is fine; dedent landing on 6 is not.
        let errs = lex("if a\n    if b\n        x := 1\n      y := 2\n").unwrap_err();
        assert!(errs.iter().any(|d| d.message.contains("mismatch") || d.message.contains("multiple")));
    }

    #[test]
    fn interpolated_string_is_segmented() {
        let tokens = lex("\"Hello, {name}!\"\n").unwrap();
        let TokenKind::Str(parts) = &tokens[0].kind else {
            panic!("expected string token");
        };
        assert_eq!(
            parts,
            &vec![
                StrSegment::Literal("Hello, ".into()),
                StrSegment::Expr("name".into()),
                StrSegment::Literal("!".into()),
            ]
        );
    }

    #[test]
    fn single_quoted_strings_do_not_interpolate() {
        let tokens = lex("'Hello, {name}!'\n").unwrap();
        let TokenKind::Str(parts) = &tokens[0].kind else {
            panic!("expected string token");
        };
        assert_eq!(parts, &vec![StrSegment::Literal("Hello, {name}!".into())]);
    }

    #[test]
    fn unterminated_string_is_reported() {
        let errs = lex("\"oops\n").unwrap_err();
        assert!(errs.iter().any(|d| d.message.contains("nterminated")));
    }

    #[test]
    fn pipe_and_walrus_operators() {
        let kinds = kinds("x := y |> f()\n");
        assert!(kinds.contains(&TokenKind::Walrus));
        assert!(kinds.contains(&TokenKind::PipeArrow));
    }

    #[test]
    fn comments_are_skipped() {
        let kinds = kinds("# a comment\nx := 1\n");
        assert!(!kinds.iter().any(|k| matches!(k, TokenKind::Ident(n) if n == "comment")));
    }
}
