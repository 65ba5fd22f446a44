//! Expression grammar
//!
//! Precedence climbing, lowest to highest:
//!
//! 1. `or`
//! 2. pipe `|>`
//! 3. `and`
//! 4. comparison (`equals`, `==`, `!=`, `<`, `>`, `<=`, `>=`, `in`)
//! 5. additive (`+`, `-`)
//! 6. multiplicative (`*`, `/`, `%`)
//! 7. unary (`not`, `-`)
//! 8. postfix (call, method call, index, slice, `as` cast)
//! 9. primary
//!
//! `onerr` is NOT an expression operator; it is a statement-level clause
//! (see `stmt.rs`).

use super::Parser;
use crate::frontend::ast::{
    Arg, BinaryOp, Expr, FieldInit, PipeStrategy, Position, StrPart, UnaryOp,
};
use crate::frontend::diagnostics::Diagnostic;
use crate::frontend::lexer::{StrSegment, TokenKind};

impl Parser<'_> {
    pub(super) fn parse_expression(&mut self) -> Result<Expr, Diagnostic> {
        self.parse_or_expr()
    }

    fn parse_or_expr(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_pipe_expr()?;
        while self.check(&TokenKind::Or) || self.check(&TokenKind::OrOr) {
            let op_tok = self.advance();
            let right = self.parse_pipe_expr()?;
            left = Expr::Binary {
                op: BinaryOp::Or,
                left: Box::new(left),
                right: Box::new(right),
                pos: op_tok.pos,
            };
        }
        Ok(left)
    }

    fn parse_pipe_expr(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_and_expr()?;
        while self.check(&TokenKind::PipeArrow) {
            let op_tok = self.advance();
            let right = self.parse_and_expr()?;
            let strategy = resolve_pipe_strategy(&left, &right);
            left = Expr::Pipe {
                id: self.fresh_expr_id(),
                strategy,
                left: Box::new(left),
                right: Box::new(right),
                pos: op_tok.pos,
            };
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_comparison_expr()?;
        while self.check(&TokenKind::And) || self.check(&TokenKind::AndAnd) {
            let op_tok = self.advance();
            let right = self.parse_comparison_expr()?;
            left = Expr::Binary {
                op: BinaryOp::And,
                left: Box::new(left),
                right: Box::new(right),
                pos: op_tok.pos,
            };
        }
        Ok(left)
    }

    fn parse_comparison_expr(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_additive_expr()?;
        loop {
            let (op, pos) = match self.peek_kind() {
                TokenKind::EqEq | TokenKind::Equals => (BinaryOp::Eq, self.advance().pos),
                TokenKind::NotEq => (BinaryOp::Ne, self.advance().pos),
                TokenKind::Lt => (BinaryOp::Lt, self.advance().pos),
                TokenKind::Gt => (BinaryOp::Gt, self.advance().pos),
                TokenKind::LtEq => (BinaryOp::Le, self.advance().pos),
                TokenKind::GtEq => (BinaryOp::Ge, self.advance().pos),
                TokenKind::In => (BinaryOp::In, self.advance().pos),
                // `not equals` / `not in` are two-token operators.
                TokenKind::Not if self.check_at(1, &TokenKind::Equals) => {
                    let pos = self.advance().pos;
                    self.advance();
                    (BinaryOp::Ne, pos)
                }
                TokenKind::Not if self.check_at(1, &TokenKind::In) => {
                    let pos = self.advance().pos;
                    self.advance();
                    (BinaryOp::NotIn, pos)
                }
                _ => break,
            };
            let right = self.parse_additive_expr()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                pos,
            };
        }
        Ok(left)
    }

    fn parse_additive_expr(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_multiplicative_expr()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let pos = self.advance().pos;
            let right = self.parse_multiplicative_expr()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                pos,
            };
        }
        Ok(left)
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_unary_expr()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            let pos = self.advance().pos;
            let right = self.parse_unary_expr()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                pos,
            };
        }
        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr, Diagnostic> {
        match self.peek_kind() {
            TokenKind::Not | TokenKind::Bang => {
                let pos = self.advance().pos;
                let operand = self.parse_unary_expr()?;
                Ok(Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                    pos,
                })
            }
            TokenKind::Minus => {
                let pos = self.advance().pos;
                let operand = self.parse_unary_expr()?;
                Ok(Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                    pos,
                })
            }
            _ => self.parse_postfix_expr(),
        }
    }

    fn parse_postfix_expr(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_primary_expr()?;

        loop {
            match self.peek_kind() {
                TokenKind::LParen => {
                    let pos = self.advance().pos;
                    let args = self.parse_call_args()?;
                    self.consume(&TokenKind::RParen, "expected ')' after arguments")?;
                    expr = match expr {
                        // obj.M(args) is a method call, not a call on a field.
                        Expr::Field { object, name, .. } => Expr::MethodCall {
                            id: self.fresh_expr_id(),
                            receiver: Some(object),
                            method: name,
                            args,
                            pos,
                        },
                        callee => Expr::Call {
                            id: self.fresh_expr_id(),
                            callee: Box::new(callee),
                            args,
                            pos,
                        },
                    };
                }
                TokenKind::Dot => {
                    let pos = self.advance().pos;
                    let (name, _) = self.consume_ident("expected field or method name after '.'")?;
                    expr = Expr::Field {
                        object: Box::new(expr),
                        name,
                        pos,
                    };
                }
                TokenKind::LBracket => {
                    let pos = self.advance().pos;
                    expr = self.parse_index_or_slice(expr, pos)?;
                }
                TokenKind::As => {
                    let pos = self.advance().pos;
                    let ty = self.parse_type_expr()?;
                    expr = Expr::Cast {
                        expr: Box::new(expr),
                        ty,
                        pos,
                    };
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_index_or_slice(&mut self, object: Expr, pos: Position) -> Result<Expr, Diagnostic> {
        // `[:end]`
        if self.matches(&TokenKind::Colon) {
            let end = if self.check(&TokenKind::RBracket) {
                None
            } else {
                Some(Box::new(self.parse_expression()?))
            };
            self.consume(&TokenKind::RBracket, "expected ']' after slice")?;
            return Ok(Expr::Slice {
                object: Box::new(object),
                start: None,
                end,
                pos,
            });
        }

        let first = self.parse_expression()?;
        if self.matches(&TokenKind::Colon) {
            let end = if self.check(&TokenKind::RBracket) {
                None
            } else {
                Some(Box::new(self.parse_expression()?))
            };
            self.consume(&TokenKind::RBracket, "expected ']' after slice")?;
            Ok(Expr::Slice {
                object: Box::new(object),
                start: Some(Box::new(first)),
                end,
                pos,
            })
        } else {
            self.consume(&TokenKind::RBracket, "expected ']' after index")?;
            Ok(Expr::Index {
                object: Box::new(object),
                index: Box::new(first),
                pos,
            })
        }
    }

    fn parse_primary_expr(&mut self) -> Result<Expr, Diagnostic> {
        match self.peek_kind().clone() {
            TokenKind::Int(value) => {
                let tok = self.advance();
                Ok(Expr::Int { value, pos: tok.pos })
            }
            TokenKind::Float(value) => {
                let tok = self.advance();
                Ok(Expr::Float { value, pos: tok.pos })
            }
            TokenKind::True | TokenKind::False => {
                let tok = self.advance();
                Ok(Expr::Bool {
                    value: tok.kind == TokenKind::True,
                    pos: tok.pos,
                })
            }
            TokenKind::Str(segments) => {
                let tok = self.advance();
                let parts = self.parse_string_parts(&segments, tok.pos)?;
                Ok(Expr::Str { parts, pos: tok.pos })
            }
            TokenKind::Ident(_) => self.parse_ident_or_struct_literal(),
            TokenKind::This => {
                let tok = self.advance();
                Ok(Expr::This { pos: tok.pos })
            }
            TokenKind::Underscore => {
                let tok = self.advance();
                Ok(Expr::Placeholder { pos: tok.pos })
            }
            TokenKind::Empty => {
                let tok = self.advance();
                let ty = if self.type_follows() {
                    Some(self.parse_type_expr()?)
                } else {
                    None
                };
                Ok(Expr::Empty { ty, pos: tok.pos })
            }
            TokenKind::Error => self.parse_error_expr(),
            TokenKind::Make => self.parse_make_expr(),
            TokenKind::Close => {
                let tok = self.advance();
                let channel = self.parse_expression()?;
                Ok(Expr::Close {
                    channel: Box::new(channel),
                    pos: tok.pos,
                })
            }
            TokenKind::Panic => {
                let tok = self.advance();
                let message = self.parse_expression()?;
                Ok(Expr::Panic {
                    message: Box::new(message),
                    pos: tok.pos,
                })
            }
            TokenKind::Recover => {
                let tok = self.advance();
                Ok(Expr::Recover { pos: tok.pos })
            }
            TokenKind::Receive => {
                let tok = self.advance();
                self.consume(&TokenKind::From, "expected 'from' after 'receive'")?;
                let channel = self.parse_expression()?;
                Ok(Expr::Receive {
                    channel: Box::new(channel),
                    pos: tok.pos,
                })
            }
            TokenKind::List => {
                if self.check_at(1, &TokenKind::Of) {
                    self.parse_typed_list_literal()
                } else {
                    let tok = self.advance();
                    Ok(Expr::Ident {
                        name: tok.lexeme,
                        pos: tok.pos,
                    })
                }
            }
            TokenKind::Map => {
                if self.check_at(1, &TokenKind::Of) {
                    self.parse_map_literal()
                } else {
                    let tok = self.advance();
                    Ok(Expr::Ident {
                        name: tok.lexeme,
                        pos: tok.pos,
                    })
                }
            }
            TokenKind::LBracket => {
                let tok = self.advance();
                let elements = self.parse_expr_list_until(&TokenKind::RBracket)?;
                self.consume(&TokenKind::RBracket, "expected ']' after list literal")?;
                Ok(Expr::ListLit {
                    elem_ty: None,
                    elements,
                    pos: tok.pos,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.consume(&TokenKind::RParen, "expected ')' after expression")?;
                Ok(expr)
            }
            // Shorthand method call for pipes: `.M(args)`
            TokenKind::Dot => {
                let tok = self.advance();
                let (method, _) = self.consume_ident("expected method name after '.'")?;
                self.consume(&TokenKind::LParen, "expected '(' after shorthand method name")?;
                let args = self.parse_call_args()?;
                self.consume(&TokenKind::RParen, "expected ')' after arguments")?;
                Ok(Expr::MethodCall {
                    id: self.fresh_expr_id(),
                    receiver: None,
                    method,
                    args,
                    pos: tok.pos,
                })
            }
            _ => {
                let tok = self.advance();
                Err(Diagnostic::syntax(
                    format!("unexpected token in expression: '{}'", tok.lexeme),
                    tok.pos,
                ))
            }
        }
    }

    /// An identifier, or a composite literal when followed by `{` or by an
    /// indented `field: value` block. Both literal forms produce the same
    /// AST shape.
    fn parse_ident_or_struct_literal(&mut self) -> Result<Expr, Diagnostic> {
        let tok = self.advance();
        let TokenKind::Ident(name) = tok.kind else { unreachable!() };

        if self.check(&TokenKind::LBrace) {
            self.advance();
            let mut fields = Vec::new();
            if !self.check(&TokenKind::RBrace) {
                loop {
                    let (field, _) = self.consume_ident("expected field name in composite literal")?;
                    self.consume(&TokenKind::Colon, "expected ':' after field name")?;
                    let value = self.parse_expression()?;
                    fields.push(FieldInit { name: field, value });
                    if self.matches(&TokenKind::Comma) {
                        if self.check(&TokenKind::RBrace) {
                            break;
                        }
                        continue;
                    }
                    break;
                }
            }
            self.consume(&TokenKind::RBrace, "expected '}' after composite literal")?;
            return Ok(Expr::StructLit {
                name,
                fields,
                pos: tok.pos,
            });
        }

        // Indentation-delimited form:
        //   p := Point
        //       x: 1
        //       y: 2
        let indented = self.check(&TokenKind::Newline)
            && self.check_at(1, &TokenKind::Indent)
            && self.check_at(2, &TokenKind::Ident(String::new()))
            && self.check_at(3, &TokenKind::Colon);
        if indented {
            self.advance(); // newline
            self.advance(); // indent
            let mut fields = Vec::new();
            while !self.check(&TokenKind::Dedent) && !self.is_at_end() {
                self.skip_newlines();
                if self.check(&TokenKind::Dedent) {
                    break;
                }
                let (field, _) = self.consume_ident("expected field name in composite literal")?;
                self.consume(&TokenKind::Colon, "expected ':' after field name")?;
                let value = self.parse_expression()?;
                fields.push(FieldInit { name: field, value });
                self.matches(&TokenKind::Comma);
                self.skip_newlines();
            }
            self.consume(&TokenKind::Dedent, "expected dedent after composite literal fields")?;
            return Ok(Expr::StructLit {
                name,
                fields,
                pos: tok.pos,
            });
        }

        Ok(Expr::Ident { name, pos: tok.pos })
    }

    /// `error "message"` constructs an error value; `error` followed by a
    /// delimiter is the plain identifier (e.g. the reserved interpolation
    /// name inside onerr handlers).
    fn parse_error_expr(&mut self) -> Result<Expr, Diagnostic> {
        let tok = self.advance();
        let follows_value = matches!(
            self.peek_kind(),
            TokenKind::Str(_)
                | TokenKind::Ident(_)
                | TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::LParen
        );
        if !follows_value {
            return Ok(Expr::Ident {
                name: "error".to_string(),
                pos: tok.pos,
            });
        }
        let message = self.parse_expression()?;
        Ok(Expr::ErrorNew {
            message: Box::new(message),
            pos: tok.pos,
        })
    }

    fn parse_make_expr(&mut self) -> Result<Expr, Diagnostic> {
        let tok = self.advance();
        self.consume(&TokenKind::LParen, "expected '(' after 'make'")?;
        let ty = self.parse_type_expr()?;
        let mut args = Vec::new();
        while self.matches(&TokenKind::Comma) {
            args.push(self.parse_expression()?);
        }
        self.consume(&TokenKind::RParen, "expected ')' after make arguments")?;
        Ok(Expr::Make {
            ty,
            args,
            pos: tok.pos,
        })
    }

    /// `list of T [a, b]` — typed list literal (may be empty).
    fn parse_typed_list_literal(&mut self) -> Result<Expr, Diagnostic> {
        let tok = self.advance(); // `list`
        self.consume(&TokenKind::Of, "expected 'of' after 'list'")?;
        let elem_ty = self.parse_type_expr()?;
        self.consume(&TokenKind::LBracket, "expected '[' in typed list literal")?;
        let elements = self.parse_expr_list_until(&TokenKind::RBracket)?;
        self.consume(&TokenKind::RBracket, "expected ']' after list literal")?;
        Ok(Expr::ListLit {
            elem_ty: Some(elem_ty),
            elements,
            pos: tok.pos,
        })
    }

    /// `map of K to V {k: v, ...}`
    fn parse_map_literal(&mut self) -> Result<Expr, Diagnostic> {
        let tok = self.advance(); // `map`
        self.consume(&TokenKind::Of, "expected 'of' after 'map'")?;
        let key_ty = self.parse_type_expr()?;
        self.consume(&TokenKind::To, "expected 'to' after map key type")?;
        let value_ty = self.parse_type_expr()?;
        self.consume(&TokenKind::LBrace, "expected '{' in map literal")?;
        let mut entries = Vec::new();
        if !self.check(&TokenKind::RBrace) {
            loop {
                let key = self.parse_expression()?;
                self.consume(&TokenKind::Colon, "expected ':' after map key")?;
                let value = self.parse_expression()?;
                entries.push((key, value));
                if self.matches(&TokenKind::Comma) {
                    if self.check(&TokenKind::RBrace) {
                        break;
                    }
                    continue;
                }
                break;
            }
        }
        self.consume(&TokenKind::RBrace, "expected '}' after map literal")?;
        Ok(Expr::MapLit {
            key_ty,
            value_ty,
            entries,
            pos: tok.pos,
        })
    }

    fn parse_expr_list_until(&mut self, end: &TokenKind) -> Result<Vec<Expr>, Diagnostic> {
        let mut elements = Vec::new();
        if !self.check(end) {
            loop {
                elements.push(self.parse_expression()?);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
                if self.check(end) {
                    break;
                }
            }
        }
        Ok(elements)
    }

    /// Call arguments: positional and named (`width: 3`). Positional
    /// arguments cannot follow named ones.
    pub(super) fn parse_call_args(&mut self) -> Result<Vec<Arg>, Diagnostic> {
        let mut args = Vec::new();
        let mut seen_named = false;

        if self.check(&TokenKind::RParen) {
            return Ok(args);
        }

        loop {
            let named = matches!(self.peek_kind(), TokenKind::Ident(_))
                && self.check_at(1, &TokenKind::Colon);
            if named {
                let (name, _) = self.consume_ident("expected argument name")?;
                self.advance(); // ':'
                let value = self.parse_expression()?;
                args.push(Arg {
                    name: Some(name),
                    value,
                });
                seen_named = true;
            } else {
                if seen_named {
                    let pos = self.position();
                    return Err(Diagnostic::syntax(
                        "positional argument cannot follow named argument",
                        pos,
                    ));
                }
                let value = self.parse_expression()?;
                args.push(Arg { name: None, value });
            }

            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }

        Ok(args)
    }

    /// Re-parse each embedded `{expr}` segment of a string literal as a full
    /// expression.
    fn parse_string_parts(
        &mut self,
        segments: &[StrSegment],
        pos: Position,
    ) -> Result<Vec<StrPart>, Diagnostic> {
        let mut parts = Vec::with_capacity(segments.len());
        for segment in segments {
            match segment {
                StrSegment::Literal(text) => parts.push(StrPart::Literal(text.clone())),
                StrSegment::Expr(src) => {
                    let expr = self.parse_embedded_expr(src, pos)?;
                    parts.push(StrPart::Expr(Box::new(expr)));
                }
            }
        }
        Ok(parts)
    }

    fn parse_embedded_expr(&mut self, src: &str, pos: Position) -> Result<Expr, Diagnostic> {
        let tokens = crate::frontend::lexer::lex(src).map_err(|errs| {
            let detail = errs
                .first()
                .map(|d| d.message.clone())
                .unwrap_or_else(|| "invalid expression".to_string());
            Diagnostic::syntax(format!("invalid interpolation '{{{src}}}': {detail}"), pos)
        })?;

        let mut sub = Parser::new(&tokens);
        sub.next_expr_id = self.next_expr_id;
        let result = sub.parse_expression();
        self.next_expr_id = sub.next_expr_id;

        let expr = result.map_err(|e| {
            Diagnostic::syntax(format!("invalid interpolation '{{{src}}}': {}", e.message), pos)
        })?;
        sub.skip_newlines();
        if !sub.is_at_end() {
            return Err(Diagnostic::syntax(
                format!("invalid interpolation '{{{src}}}': trailing tokens"),
                pos,
            ));
        }
        Ok(expr)
    }
}

/// Decide how a pipe injects its left operand, in priority order:
/// explicit `_` placeholder, shorthand method receiver, context-first,
/// data-first default.
fn resolve_pipe_strategy(left: &Expr, right: &Expr) -> PipeStrategy {
    let args = match right {
        Expr::Call { args, .. } => Some(args),
        Expr::MethodCall { args, .. } => Some(args),
        _ => None,
    };
    if let Some(args) = args {
        if args
            .iter()
            .any(|a| matches!(a.value, Expr::Placeholder { .. }))
        {
            return PipeStrategy::Placeholder;
        }
    }
    if matches!(right, Expr::MethodCall { receiver: None, .. }) {
        return PipeStrategy::Method;
    }
    if is_context_expr(left) {
        return PipeStrategy::ContextFirst;
    }
    PipeStrategy::DataFirst
}

/// Context-like left operands: the literal `ctx` identifier or a call into
/// the `context` package (`context.Background()`, `context.WithTimeout(..)`).
fn is_context_expr(expr: &Expr) -> bool {
    match expr {
        Expr::Ident { name, .. } => name == "ctx",
        Expr::MethodCall {
            receiver: Some(receiver),
            ..
        } => matches!(&**receiver, Expr::Ident { name, .. } if name == "context"),
        _ => false,
    }
}
