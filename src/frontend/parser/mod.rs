//! Parser for the Frond programming language
//!
//! Recursive-descent with precedence climbing for expressions. The parser is
//! single-pass and recovers from errors by synchronizing at statement and
//! declaration boundaries, accumulating one diagnostic per error instead of
//! aborting on the first.
//!
//! ## Module structure
//!
//! - `decl` - module/import/type/interface/function declarations
//! - `stmt` - statements, blocks, and the `onerr` clause
//! - `expr` - expression grammar, pipe strategy resolution
//! - `types` - type expression grammar

mod decl;
mod expr;
mod stmt;
mod types;

use crate::frontend::ast::{Declaration, ExprId, Position, Program};
use crate::frontend::diagnostics::Diagnostic;
use crate::frontend::lexer::{Token, TokenKind};

/// Parse a token stream into an AST [`Program`].
///
/// Returns `Err` with every diagnostic the parser could soundly produce in
/// one pass; a partial AST is not surfaced through this API.
#[tracing::instrument(skip_all, fields(token_count = tokens.len()))]
pub fn parse(tokens: &[Token]) -> Result<Program, Vec<Diagnostic>> {
    Parser::new(tokens).parse()
}

/// Parser state.
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    next_expr_id: u32,
    errors: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            next_expr_id: 0,
            errors: Vec::new(),
        }
    }

    /// Parse the entire token stream.
    pub fn parse(mut self) -> Result<Program, Vec<Diagnostic>> {
        let mut program = Program {
            module: None,
            imports: Vec::new(),
            declarations: Vec::new(),
        };

        self.skip_newlines();
        program.module = self.parse_module_decl();
        self.skip_newlines();

        while self.check(&TokenKind::Import) {
            match self.parse_import_decl() {
                Ok(import) => program.imports.push(import),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                }
            }
            self.skip_newlines();
        }

        while !self.is_at_end() {
            match self.parse_declaration() {
                Ok(decl) => program.declarations.push(decl),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                }
            }
            self.skip_newlines();
            // Stray DEDENTs can appear at top level after error recovery;
            // ignoring them avoids cascaded errors.
            while self.check(&TokenKind::Dedent) {
                self.advance();
            }
        }

        if self.errors.is_empty() {
            Ok(program)
        } else {
            Err(self.errors)
        }
    }

    pub(super) fn parse_declaration(&mut self) -> Result<Declaration, Diagnostic> {
        match self.peek_kind() {
            TokenKind::Type => Ok(Declaration::Type(self.parse_type_decl()?)),
            TokenKind::Interface => Ok(Declaration::Interface(self.parse_interface_decl()?)),
            TokenKind::Func => Ok(Declaration::Function(self.parse_function_decl()?)),
            _ => {
                let tok = self.advance();
                Err(Diagnostic::syntax(
                    format!("expected declaration, got '{}'", tok.lexeme),
                    tok.pos,
                ))
            }
        }
    }

    // ========================================================================
    // Token stream helpers
    // ========================================================================

    pub(super) fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub(super) fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    pub(super) fn peek_at(&self, offset: usize) -> &Token {
        static EOF: Token = Token {
            kind: TokenKind::Eof,
            lexeme: String::new(),
            pos: Position { line: 0, column: 0 },
        };
        self.tokens
            .get(self.pos + offset)
            .or_else(|| self.tokens.last())
            .unwrap_or(&EOF)
    }

    pub(super) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    pub(super) fn position(&self) -> Position {
        self.peek().pos
    }

    pub(super) fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len().saturating_sub(1) {
            self.pos += 1;
        }
        tok
    }

    /// Compare kinds by discriminant only (payloads ignored).
    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(kind)
    }

    pub(super) fn check_at(&self, offset: usize, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek_at(offset).kind) == std::mem::discriminant(kind)
    }

    pub(super) fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(super) fn consume(&mut self, kind: &TokenKind, message: &str) -> Result<Token, Diagnostic> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let tok = self.peek();
            Err(Diagnostic::syntax(
                format!("{message}, got '{}'", describe(tok)),
                tok.pos,
            ))
        }
    }

    pub(super) fn consume_ident(&mut self, message: &str) -> Result<(String, Position), Diagnostic> {
        match self.peek_kind().clone() {
            TokenKind::Ident(name) => {
                let tok = self.advance();
                Ok((name, tok.pos))
            }
            // `error`, `list`, and `map` double as ordinary identifiers.
            TokenKind::Error | TokenKind::List | TokenKind::Map => {
                let tok = self.advance();
                Ok((tok.lexeme.clone(), tok.pos))
            }
            _ => {
                let tok = self.peek();
                Err(Diagnostic::syntax(
                    format!("{message}, got '{}'", describe(tok)),
                    tok.pos,
                ))
            }
        }
    }

    pub(super) fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) || self.check(&TokenKind::Semicolon) {
            self.advance();
        }
    }

    pub(super) fn fresh_expr_id(&mut self) -> ExprId {
        let id = ExprId(self.next_expr_id);
        self.next_expr_id += 1;
        id
    }

    /// Discard tokens up to the next plausible declaration or statement
    /// boundary so one error does not cascade.
    pub(super) fn synchronize(&mut self) {
        while !self.is_at_end() {
            match self.peek_kind() {
                TokenKind::Newline | TokenKind::Dedent => {
                    self.advance();
                    return;
                }
                TokenKind::Type
                | TokenKind::Interface
                | TokenKind::Func
                | TokenKind::Import => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

fn describe(tok: &Token) -> String {
    if tok.lexeme.is_empty() {
        tok.kind.describe().to_string()
    } else {
        tok.lexeme.clone()
    }
}

#[cfg(test)]
mod tests;
