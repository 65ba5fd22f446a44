//! String literal scanning for the Frond lexer
//!
//! Double-quoted strings support `{expr}` interpolation. The lexer segments
//! the literal into an ordered list of literal-text and embedded-expression
//! segments; the parser later re-parses each expression segment as a full
//! expression. Single-quoted strings are plain text.

use super::tokens::StrSegment;
use super::{Lexer, TokenKind};

impl Lexer {
    pub(super) fn scan_string(&mut self, quote: char) {
        let mut segments: Vec<StrSegment> = Vec::new();
        let mut literal = String::new();

        loop {
            match self.peek() {
                None => {
                    self.error("unterminated string literal");
                    return;
                }
                Some('\n') => {
                    self.error("unterminated string literal (newline in string)");
                    return;
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.advance() {
                        Some('n') => literal.push('\n'),
                        Some('t') => literal.push('\t'),
                        Some('r') => literal.push('\r'),
                        Some('\\') => literal.push('\\'),
                        Some('"') => literal.push('"'),
                        Some('\'') => literal.push('\''),
                        Some('{') => literal.push('{'),
                        Some(c) => literal.push(c),
                        None => {
                            self.error("unterminated string literal");
                            return;
                        }
                    }
                }
                Some('{') if quote == '"' => {
                    self.advance();
                    if !literal.is_empty() {
                        segments.push(StrSegment::Literal(std::mem::take(&mut literal)));
                    }
                    if !self.scan_interpolation(&mut segments) {
                        return;
                    }
                }
                Some(c) => {
                    self.advance();
                    literal.push(c);
                }
            }
        }

        if !literal.is_empty() || segments.is_empty() {
            segments.push(StrSegment::Literal(literal));
        }

        let lexeme: String = self.chars[self.start..self.current].iter().collect();
        self.push_token(TokenKind::Str(segments), &lexeme);
    }

    /// Scan the inside of a `{...}` span, collecting the raw expression
    /// source. Nested braces (e.g. a map literal) are tracked by depth.
    fn scan_interpolation(&mut self, segments: &mut Vec<StrSegment>) -> bool {
        let mut source = String::new();
        let mut depth: u32 = 1;

        loop {
            match self.peek() {
                None | Some('\n') => {
                    self.error("unterminated interpolation in string literal");
                    return false;
                }
                Some('{') => {
                    depth += 1;
                    source.push('{');
                    self.advance();
                }
                Some('}') => {
                    self.advance();
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    source.push('}');
                }
                Some(c) => {
                    source.push(c);
                    self.advance();
                }
            }
        }

        if source.trim().is_empty() {
            self.error("empty interpolation in string literal");
            return false;
        }
        segments.push(StrSegment::Expr(source));
        true
    }
}
