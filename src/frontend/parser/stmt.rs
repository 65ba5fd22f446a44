//! Statement grammar
//!
//! Blocks are INDENT..DEDENT delimited. Statement errors are recovered at
//! line granularity so a bad statement produces one diagnostic and parsing
//! resumes on the next line.
//!
//! The `onerr` clause is parsed here as a trailing modifier on var-decl,
//! assignment, and expression statements. Handler forms:
//!
//! ```text
//! x := f() onerr                 block handler (optional `as e` alias)
//! x := f() onerr panic "msg"     panic with message
//! x := f() onerr return          propagate with zero values
//! x := f() onerr return a, b     explicit return values
//! x := f() onerr explain "hint"  wrap and propagate
//! x := f() onerr 0               literal default fallback
//! x := f() onerr discard         ignore the error
//! ```

use super::Parser;
use crate::frontend::ast::{
    AssignStmt, Block, DeferStmt, ElseArm, Expr, ExprStmt, ForHeader, ForStmt, GoStmt, IfStmt,
    OnErrClause, OnErrHandler, ReturnStmt, SendStmt, Statement, VarDeclStmt,
};
use crate::frontend::diagnostics::Diagnostic;
use crate::frontend::lexer::{StrSegment, TokenKind};

impl Parser<'_> {
    /// NEWLINE INDENT statement* DEDENT
    pub(super) fn parse_block(&mut self) -> Result<Block, Diagnostic> {
        self.consume(&TokenKind::Newline, "expected newline before indented block")?;
        self.skip_newlines();
        let open = self.consume(&TokenKind::Indent, "expected indented block")?;

        let mut statements = Vec::new();
        self.skip_newlines();
        while !self.check(&TokenKind::Dedent) && !self.is_at_end() {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize_statement();
                }
            }
            self.skip_newlines();
        }
        self.consume(&TokenKind::Dedent, "expected dedent to close block")?;

        Ok(Block {
            statements,
            pos: open.pos,
        })
    }

    /// Like [`Parser::synchronize`] but never consumes the DEDENT that
    /// closes the enclosing block.
    fn synchronize_statement(&mut self) {
        while !self.is_at_end() {
            match self.peek_kind() {
                TokenKind::Newline => {
                    self.advance();
                    return;
                }
                TokenKind::Dedent => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    pub(super) fn parse_statement(&mut self) -> Result<Statement, Diagnostic> {
        match self.peek_kind() {
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::If => Ok(Statement::If(self.parse_if_stmt()?)),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::Defer => {
                let tok = self.advance();
                let call = self.parse_expression()?;
                self.expect_line_end()?;
                Ok(Statement::Defer(DeferStmt {
                    call,
                    pos: tok.pos,
                }))
            }
            TokenKind::Go => {
                let tok = self.advance();
                let call = self.parse_expression()?;
                self.expect_line_end()?;
                Ok(Statement::Go(GoStmt {
                    call,
                    pos: tok.pos,
                }))
            }
            TokenKind::Send => {
                let tok = self.advance();
                let value = self.parse_expression()?;
                self.consume(&TokenKind::To, "expected 'to' after value in send statement")?;
                let channel = self.parse_expression()?;
                self.expect_line_end()?;
                Ok(Statement::Send(SendStmt {
                    value,
                    channel,
                    pos: tok.pos,
                }))
            }
            _ => {
                let mut stmt = self.parse_simple_statement()?;
                if self.check(&TokenKind::OnErr) {
                    let clause = self.parse_onerr_clause()?;
                    attach_onerr(&mut stmt, clause)?;
                } else {
                    self.expect_line_end()?;
                }
                Ok(stmt)
            }
        }
    }

    /// Var-decl, assignment, or expression statement, without terminator or
    /// onerr handling. Also used for C-style `for` init/post clauses.
    fn parse_simple_statement(&mut self) -> Result<Statement, Diagnostic> {
        if let Some(stmt) = self.try_parse_walrus_decl()? {
            return Ok(stmt);
        }
        if let Some(stmt) = self.try_parse_typed_decl()? {
            return Ok(stmt);
        }

        let expr = self.parse_expression()?;
        if self.check(&TokenKind::Assign) {
            let tok = self.advance();
            let value = self.parse_expression()?;
            return Ok(Statement::Assign(AssignStmt {
                target: expr,
                value,
                onerr: None,
                pos: tok.pos,
            }));
        }
        Ok(Statement::Expr(ExprStmt { expr, onerr: None }))
    }

    /// `x := e` / `x, err := e`
    fn try_parse_walrus_decl(&mut self) -> Result<Option<Statement>, Diagnostic> {
        if !matches!(self.peek_kind(), TokenKind::Ident(_) | TokenKind::Underscore) {
            return Ok(None);
        }
        let save = self.pos;
        let pos = self.position();
        let mut names = Vec::new();
        loop {
            match self.peek_kind().clone() {
                TokenKind::Ident(name) => {
                    self.advance();
                    names.push(name);
                }
                TokenKind::Underscore => {
                    self.advance();
                    names.push("_".to_string());
                }
                _ => {
                    self.pos = save;
                    return Ok(None);
                }
            }
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }
        if !self.matches(&TokenKind::Walrus) {
            self.pos = save;
            return Ok(None);
        }
        let value = self.parse_expression()?;
        Ok(Some(Statement::VarDecl(VarDeclStmt {
            names,
            ty: None,
            value,
            onerr: None,
            pos,
        })))
    }

    /// `x Type = e` — explicit annotation form. Resolved by speculative
    /// parse: an identifier followed by a complete type expression and `=`
    /// is a declaration; anything else backtracks to the expression path.
    fn try_parse_typed_decl(&mut self) -> Result<Option<Statement>, Diagnostic> {
        if !matches!(self.peek_kind(), TokenKind::Ident(_)) {
            return Ok(None);
        }
        let save = self.pos;
        let (name, pos) = match self.consume_ident("expected identifier") {
            Ok(v) => v,
            Err(_) => {
                self.pos = save;
                return Ok(None);
            }
        };
        if !self.type_follows() {
            self.pos = save;
            return Ok(None);
        }
        let ty = match self.parse_type_expr() {
            Ok(ty) => ty,
            Err(_) => {
                self.pos = save;
                return Ok(None);
            }
        };
        if !self.matches(&TokenKind::Assign) {
            self.pos = save;
            return Ok(None);
        }
        let value = self.parse_expression()?;
        Ok(Some(Statement::VarDecl(VarDeclStmt {
            names: vec![name],
            ty: Some(ty),
            value,
            onerr: None,
            pos,
        })))
    }

    fn parse_return_stmt(&mut self) -> Result<Statement, Diagnostic> {
        let tok = self.advance();
        let mut values = Vec::new();
        if !self.at_line_end() {
            values.push(self.parse_expression()?);
            while self.matches(&TokenKind::Comma) {
                values.push(self.parse_expression()?);
            }
        }
        self.expect_line_end()?;
        Ok(Statement::Return(ReturnStmt {
            values,
            pos: tok.pos,
        }))
    }

    fn parse_if_stmt(&mut self) -> Result<IfStmt, Diagnostic> {
        let tok = self.advance(); // `if`
        let condition = self.parse_expression()?;
        let consequence = self.parse_block()?;

        let alternative = if self.matches(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                Some(ElseArm::If(Box::new(self.parse_if_stmt()?)))
            } else {
                Some(ElseArm::Block(self.parse_block()?))
            }
        } else {
            None
        };

        Ok(IfStmt {
            condition,
            consequence,
            alternative,
            pos: tok.pos,
        })
    }

    /// The unified `for` statement. Four header forms, disambiguated by
    /// lookahead:
    ///
    /// ```text
    /// for i from 0 to 10        range, exclusive end
    /// for i from 1 through 10   range, inclusive end
    /// for x in items            collection (with optional index: i, x)
    /// for count < limit         condition
    /// for i := 0; i < n; i = i + 1
    /// ```
    fn parse_for_stmt(&mut self) -> Result<Statement, Diagnostic> {
        let tok = self.advance(); // `for`

        // Bare `for` is the infinite loop.
        if self.check(&TokenKind::Newline) {
            let body = self.parse_block()?;
            return Ok(Statement::For(ForStmt {
                header: ForHeader::Clauses {
                    init: None,
                    condition: None,
                    post: None,
                },
                body,
                pos: tok.pos,
            }));
        }

        if matches!(self.peek_kind(), TokenKind::Ident(_)) && self.check_at(1, &TokenKind::From) {
            let (var, _) = self.consume_ident("expected loop variable")?;
            self.advance(); // `from`
            let start = self.parse_expression()?;
            let inclusive = match self.peek_kind() {
                TokenKind::To => {
                    self.advance();
                    false
                }
                TokenKind::Through => {
                    self.advance();
                    true
                }
                _ => {
                    let pos = self.position();
                    return Err(Diagnostic::syntax(
                        "expected 'to' or 'through' in range loop",
                        pos,
                    ));
                }
            };
            let end = self.parse_expression()?;
            let body = self.parse_block()?;
            return Ok(Statement::For(ForStmt {
                header: ForHeader::Range {
                    var,
                    start,
                    end,
                    inclusive,
                },
                body,
                pos: tok.pos,
            }));
        }

        let collection_form = matches!(self.peek_kind(), TokenKind::Ident(_) | TokenKind::Underscore)
            && (self.check_at(1, &TokenKind::In)
                || (self.check_at(1, &TokenKind::Comma)
                    && self.check_at(2, &TokenKind::Ident(String::new()))
                    && self.check_at(3, &TokenKind::In)));
        if collection_form {
            let first = self.advance().lexeme;
            let (index, value) = if self.matches(&TokenKind::Comma) {
                let (value, _) = self.consume_ident("expected value variable")?;
                (Some(first), value)
            } else {
                (None, first)
            };
            self.consume(&TokenKind::In, "expected 'in' in collection loop")?;
            let collection = self.parse_expression()?;
            let body = self.parse_block()?;
            return Ok(Statement::For(ForStmt {
                header: ForHeader::Collection {
                    index,
                    value,
                    collection,
                },
                body,
                pos: tok.pos,
            }));
        }

        if self.has_semicolon_before_newline() {
            let init = if self.check(&TokenKind::Semicolon) {
                None
            } else {
                Some(Box::new(self.parse_simple_statement()?))
            };
            self.consume(&TokenKind::Semicolon, "expected ';' after for-loop init")?;
            let condition = if self.check(&TokenKind::Semicolon) {
                None
            } else {
                Some(self.parse_expression()?)
            };
            self.consume(&TokenKind::Semicolon, "expected ';' after for-loop condition")?;
            let post = if self.check(&TokenKind::Newline) {
                None
            } else {
                Some(Box::new(self.parse_simple_statement()?))
            };
            let body = self.parse_block()?;
            return Ok(Statement::For(ForStmt {
                header: ForHeader::Clauses {
                    init,
                    condition,
                    post,
                },
                body,
                pos: tok.pos,
            }));
        }

        let condition = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(Statement::For(ForStmt {
            header: ForHeader::Condition { condition },
            body,
            pos: tok.pos,
        }))
    }

    fn has_semicolon_before_newline(&self) -> bool {
        let mut offset = 0;
        loop {
            match &self.peek_at(offset).kind {
                TokenKind::Semicolon => return true,
                TokenKind::Newline | TokenKind::Eof => return false,
                _ => offset += 1,
            }
        }
    }

    // ========================================================================
    // onerr clause
    // ========================================================================

    fn parse_onerr_clause(&mut self) -> Result<OnErrClause, Diagnostic> {
        let tok = self.advance(); // `onerr`
        let pos = tok.pos;

        // Block handler, optionally with a named alias for the caught error.
        if self.check(&TokenKind::Newline) {
            let block = self.parse_block()?;
            return Ok(OnErrClause {
                handler: OnErrHandler::Block(block),
                explain: None,
                alias: None,
                pos,
            });
        }
        if self.check(&TokenKind::As) {
            self.advance();
            let (alias, _) = self.consume_ident("expected error name after 'onerr as'")?;
            let block = self.parse_block()?;
            return Ok(OnErrClause {
                handler: OnErrHandler::Block(block),
                explain: None,
                alias: Some(alias),
                pos,
            });
        }

        let handler = match self.peek_kind() {
            TokenKind::Panic => {
                self.advance();
                let message = self.parse_expression()?;
                OnErrHandler::Panic(Box::new(message))
            }
            TokenKind::Discard => {
                self.advance();
                OnErrHandler::Discard
            }
            TokenKind::Explain => {
                // Standalone `onerr explain "hint"` wraps and propagates.
                self.advance();
                let hint = self.consume_string_literal("expected message after 'explain'")?;
                self.expect_line_end()?;
                return Ok(OnErrClause {
                    handler: OnErrHandler::Propagate,
                    explain: Some(hint),
                    alias: None,
                    pos,
                });
            }
            TokenKind::Return => {
                self.advance();
                if self.at_line_end() || self.check(&TokenKind::Explain) {
                    OnErrHandler::Propagate
                } else {
                    let mut values = vec![self.parse_expression()?];
                    while self.matches(&TokenKind::Comma) {
                        values.push(self.parse_expression()?);
                    }
                    OnErrHandler::Return(values)
                }
            }
            _ => {
                let fallback = self.parse_expression()?;
                OnErrHandler::Default(Box::new(fallback))
            }
        };

        let explain = if self.matches(&TokenKind::Explain) {
            Some(self.consume_string_literal("expected message after 'explain'")?)
        } else {
            None
        };

        self.expect_line_end()?;
        Ok(OnErrClause {
            handler,
            explain,
            alias: None,
            pos,
        })
    }

    fn consume_string_literal(&mut self, message: &str) -> Result<String, Diagnostic> {
        match self.peek_kind().clone() {
            TokenKind::Str(segments) => {
                let tok = self.advance();
                let mut text = String::new();
                for segment in &segments {
                    match segment {
                        StrSegment::Literal(s) => text.push_str(s),
                        StrSegment::Expr(_) => {
                            return Err(Diagnostic::syntax(
                                "explain message must be a plain string literal",
                                tok.pos,
                            ));
                        }
                    }
                }
                Ok(text)
            }
            _ => {
                let pos = self.position();
                Err(Diagnostic::syntax(message, pos))
            }
        }
    }

    fn at_line_end(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Newline | TokenKind::Dedent | TokenKind::Semicolon | TokenKind::Eof
        )
    }

    fn expect_line_end(&mut self) -> Result<(), Diagnostic> {
        // A statement ending in an indentation-delimited construct (e.g. an
        // indented composite literal) has already consumed its DEDENT; the
        // next statement's tokens follow directly.
        let after_dedent = self.pos > 0
            && matches!(self.tokens[self.pos - 1].kind, TokenKind::Dedent);
        if self.at_line_end() || after_dedent {
            Ok(())
        } else {
            let tok = self.peek();
            Err(Diagnostic::syntax(
                format!("expected end of line, got '{}'", tok.lexeme),
                tok.pos,
            ))
        }
    }
}

/// `onerr` attaches to var-decl, assignment, and expression statements only.
fn attach_onerr(stmt: &mut Statement, clause: OnErrClause) -> Result<(), Diagnostic> {
    match stmt {
        Statement::VarDecl(s) => s.onerr = Some(clause),
        Statement::Assign(s) => s.onerr = Some(clause),
        Statement::Expr(s) => s.onerr = Some(clause),
        _ => {
            return Err(Diagnostic::syntax(
                "'onerr' can only follow a variable declaration, assignment, or call statement",
                clause.pos,
            ));
        }
    }
    Ok(())
}
