//! Type expression grammar
//!
//! English-like type syntax maps onto the generated Go types:
//!
//! ```text
//! Frond                     Go
//! -----                     --
//! list of string            []string
//! map of string to int      map[string]int
//! reference User            *User
//! channel of int            chan int
//! func(int) bool            func(int) bool
//! ```
//!
//! `list`, `map`, and `channel` are context-sensitive: they are only type
//! keywords when followed by `of`, so they stay usable as variable names.

use super::Parser;
use crate::frontend::ast::TypeExpr;
use crate::frontend::diagnostics::Diagnostic;
use crate::frontend::lexer::TokenKind;

/// Primitive type names recognized by the surface language.
pub const PRIMITIVES: &[&str] = &[
    "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16", "uint32", "uint64",
    "float", "float32", "float64", "string", "bool", "byte", "rune", "any", "any2",
];

impl Parser<'_> {
    pub(super) fn parse_type_expr(&mut self) -> Result<TypeExpr, Diagnostic> {
        match self.peek_kind() {
            TokenKind::Reference => {
                let tok = self.advance();
                let elem = self.parse_type_expr()?;
                Ok(TypeExpr::Reference {
                    elem: Box::new(elem),
                    pos: tok.pos,
                })
            }
            TokenKind::List => {
                let tok = self.advance();
                self.consume(&TokenKind::Of, "expected 'of' after 'list'")?;
                let elem = self.parse_type_expr()?;
                Ok(TypeExpr::List {
                    elem: Box::new(elem),
                    pos: tok.pos,
                })
            }
            TokenKind::Map => {
                let tok = self.advance();
                self.consume(&TokenKind::Of, "expected 'of' after 'map'")?;
                let key = self.parse_type_expr()?;
                self.consume(&TokenKind::To, "expected 'to' after map key type")?;
                let value = self.parse_type_expr()?;
                Ok(TypeExpr::Map {
                    key: Box::new(key),
                    value: Box::new(value),
                    pos: tok.pos,
                })
            }
            TokenKind::Channel => {
                let tok = self.advance();
                self.consume(&TokenKind::Of, "expected 'of' after 'channel'")?;
                let elem = self.parse_type_expr()?;
                Ok(TypeExpr::Channel {
                    elem: Box::new(elem),
                    pos: tok.pos,
                })
            }
            TokenKind::Func => {
                let tok = self.advance();
                self.consume(&TokenKind::LParen, "expected '(' after 'func'")?;
                let mut params = Vec::new();
                if !self.check(&TokenKind::RParen) {
                    params.push(self.parse_type_expr()?);
                    while self.matches(&TokenKind::Comma) {
                        params.push(self.parse_type_expr()?);
                    }
                }
                self.consume(&TokenKind::RParen, "expected ')' after function type parameters")?;

                let mut returns = Vec::new();
                if self.type_follows() {
                    if self.matches(&TokenKind::LParen) {
                        loop {
                            returns.push(self.parse_type_expr()?);
                            if !self.matches(&TokenKind::Comma) {
                                break;
                            }
                        }
                        self.consume(&TokenKind::RParen, "expected ')' after return types")?;
                    } else {
                        returns.push(self.parse_type_expr()?);
                    }
                }

                Ok(TypeExpr::Function {
                    params,
                    returns,
                    pos: tok.pos,
                })
            }
            // `error` is a keyword but also a valid type name.
            TokenKind::Error => {
                let tok = self.advance();
                Ok(TypeExpr::Primitive {
                    name: "error".to_string(),
                    pos: tok.pos,
                })
            }
            TokenKind::Ident(_) => {
                let tok = self.advance();
                let TokenKind::Ident(name) = tok.kind else { unreachable!() };
                if PRIMITIVES.contains(&name.as_str()) {
                    return Ok(TypeExpr::Primitive { name, pos: tok.pos });
                }
                // Qualified type: package.Type
                let mut name = name;
                if self.matches(&TokenKind::Dot) {
                    let (member, _) = self.consume_ident("expected type name after '.'")?;
                    name.push('.');
                    name.push_str(&member);
                }
                Ok(TypeExpr::Named { name, pos: tok.pos })
            }
            _ => {
                let tok = self.peek();
                Err(Diagnostic::syntax(
                    format!("expected type, got '{}'", tok.lexeme),
                    tok.pos,
                ))
            }
        }
    }

    /// Whether the next token can begin a type expression.
    pub(super) fn type_follows(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Ident(_)
                | TokenKind::List
                | TokenKind::Map
                | TokenKind::Channel
                | TokenKind::Reference
                | TokenKind::Func
                | TokenKind::Error
        )
    }
}
