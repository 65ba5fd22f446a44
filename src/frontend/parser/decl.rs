//! Declaration grammar: module, imports, types, interfaces, functions.

use super::Parser;
use crate::frontend::ast::{
    FieldDecl, FunctionDecl, ImportDecl, InterfaceDecl, MethodSig, ModuleDecl, Param, Receiver,
    TypeDecl, TypeExpr,
};
use crate::frontend::diagnostics::Diagnostic;
use crate::frontend::lexer::{StrSegment, TokenKind};

impl Parser<'_> {
    /// Optional leading `module name`. Errors here are recorded and the
    /// declaration skipped rather than failing the whole parse.
    pub(super) fn parse_module_decl(&mut self) -> Option<ModuleDecl> {
        if !self.check(&TokenKind::Module) {
            return None;
        }
        let tok = self.advance();
        match self.consume_ident("expected module name after 'module'") {
            Ok((name, _)) => Some(ModuleDecl {
                name,
                pos: tok.pos,
            }),
            Err(e) => {
                self.errors.push(e);
                self.synchronize();
                None
            }
        }
    }

    /// `import "path/to/pkg" [as alias]`
    pub(super) fn parse_import_decl(&mut self) -> Result<ImportDecl, Diagnostic> {
        let tok = self.advance(); // `import`
        let path = self.consume_import_path()?;
        let alias = if self.matches(&TokenKind::As) {
            let (name, _) = self.consume_ident("expected alias after 'as'")?;
            Some(name)
        } else {
            None
        };
        Ok(ImportDecl {
            path,
            alias,
            pos: tok.pos,
        })
    }

    fn consume_import_path(&mut self) -> Result<String, Diagnostic> {
        match self.peek_kind().clone() {
            TokenKind::Str(segments) => {
                let tok = self.advance();
                let mut path = String::new();
                for segment in &segments {
                    match segment {
                        StrSegment::Literal(s) => path.push_str(s),
                        StrSegment::Expr(_) => {
                            return Err(Diagnostic::syntax(
                                "import path must be a plain string literal",
                                tok.pos,
                            ));
                        }
                    }
                }
                Ok(path)
            }
            _ => {
                let tok = self.peek();
                Err(Diagnostic::syntax(
                    format!("expected string literal for import path, got '{}'", tok.lexeme),
                    tok.pos,
                ))
            }
        }
    }

    /// `type Name` NEWLINE INDENT field* DEDENT
    ///
    /// Field: `name Type` with an optional serialization alias
    /// `as "json_name"` that becomes a struct tag in the generated code.
    pub(super) fn parse_type_decl(&mut self) -> Result<TypeDecl, Diagnostic> {
        let tok = self.advance(); // `type`
        let (name, _) = self.consume_ident("expected type name after 'type'")?;
        self.consume(&TokenKind::Newline, "expected newline after type name")?;
        self.skip_newlines();
        self.consume(&TokenKind::Indent, "expected indented field block")?;

        let mut fields = Vec::new();
        self.skip_newlines();
        while !self.check(&TokenKind::Dedent) && !self.is_at_end() {
            let (field_name, field_pos) = self.consume_ident("expected field name")?;
            let ty = self.parse_type_expr()?;
            let alias = if self.matches(&TokenKind::As) {
                Some(self.consume_field_alias()?)
            } else {
                None
            };
            fields.push(FieldDecl {
                name: field_name,
                ty,
                alias,
                pos: field_pos,
            });
            self.skip_newlines();
        }
        self.consume(&TokenKind::Dedent, "expected dedent after fields")?;

        Ok(TypeDecl {
            name,
            fields,
            pos: tok.pos,
        })
    }

    fn consume_field_alias(&mut self) -> Result<String, Diagnostic> {
        match self.peek_kind().clone() {
            TokenKind::Str(segments) => {
                let tok = self.advance();
                match segments.as_slice() {
                    [StrSegment::Literal(alias)] => Ok(alias.clone()),
                    _ => Err(Diagnostic::syntax(
                        "field alias must be a plain string literal",
                        tok.pos,
                    )),
                }
            }
            _ => {
                let pos = self.position();
                Err(Diagnostic::syntax(
                    "expected string literal after 'as' in field alias",
                    pos,
                ))
            }
        }
    }

    /// `interface Name` NEWLINE INDENT method-signature* DEDENT
    pub(super) fn parse_interface_decl(&mut self) -> Result<InterfaceDecl, Diagnostic> {
        let tok = self.advance(); // `interface`
        let (name, _) = self.consume_ident("expected interface name")?;
        self.consume(&TokenKind::Newline, "expected newline after interface name")?;
        self.skip_newlines();
        self.consume(&TokenKind::Indent, "expected indented method block")?;

        let mut methods = Vec::new();
        self.skip_newlines();
        while !self.check(&TokenKind::Dedent) && !self.is_at_end() {
            let (method_name, method_pos) = self.consume_ident("expected method name")?;
            self.consume(&TokenKind::LParen, "expected '(' after method name")?;
            let params = self.parse_params()?;
            self.consume(&TokenKind::RParen, "expected ')' after method parameters")?;
            let returns = self.parse_return_types()?;
            methods.push(MethodSig {
                name: method_name,
                params,
                returns,
                pos: method_pos,
            });
            self.skip_newlines();
        }
        self.consume(&TokenKind::Dedent, "expected dedent after interface methods")?;

        Ok(InterfaceDecl {
            name,
            methods,
            pos: tok.pos,
        })
    }

    /// `func Name(params) [returns]` or a method
    /// `func (recv TypeName) Name(params) [returns]`, followed by a block.
    pub(super) fn parse_function_decl(&mut self) -> Result<FunctionDecl, Diagnostic> {
        let tok = self.advance(); // `func`

        let receiver = if self.check(&TokenKind::LParen) {
            self.advance();
            let (recv_name, recv_pos) = self.consume_ident("expected receiver name")?;
            let recv_ty = self.parse_type_expr()?;
            self.consume(&TokenKind::RParen, "expected ')' after receiver")?;
            Some(Receiver {
                name: recv_name,
                ty: recv_ty,
                pos: recv_pos,
            })
        } else {
            None
        };

        let (name, _) = self.consume_ident("expected function name")?;
        self.consume(&TokenKind::LParen, "expected '(' after function name")?;
        let params = self.parse_params()?;
        self.consume(&TokenKind::RParen, "expected ')' after parameters")?;
        let returns = self.parse_return_types()?;
        let body = self.parse_block()?;

        Ok(FunctionDecl {
            name,
            receiver,
            params,
            returns,
            body,
            pos: tok.pos,
        })
    }

    /// Parameters: `name Type [= default]`, comma-separated. Parameters with
    /// defaults must be contiguous at the end of the list.
    fn parse_params(&mut self) -> Result<Vec<Param>, Diagnostic> {
        let mut params = Vec::new();
        let mut seen_default = false;

        if self.check(&TokenKind::RParen) {
            return Ok(params);
        }

        loop {
            let (name, pos) = self.consume_ident("expected parameter name")?;
            let ty = self.parse_type_expr()?;

            let default = if self.matches(&TokenKind::Assign) {
                seen_default = true;
                Some(self.parse_expression()?)
            } else {
                if seen_default {
                    return Err(Diagnostic::syntax(
                        format!(
                            "parameter '{name}' must have a default value \
                             (parameters with defaults must be contiguous at the end)"
                        ),
                        pos,
                    ));
                }
                None
            };

            params.push(Param {
                name,
                ty,
                default,
                pos,
            });

            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }

        Ok(params)
    }

    /// Return types: empty (no return value), a single type, a bare comma
    /// list (`int, error`), or a parenthesized list.
    fn parse_return_types(&mut self) -> Result<Vec<TypeExpr>, Diagnostic> {
        let mut returns = Vec::new();

        if self.check(&TokenKind::Newline) || self.check(&TokenKind::Indent) {
            return Ok(returns);
        }

        if self.matches(&TokenKind::LParen) {
            loop {
                returns.push(self.parse_type_expr()?);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
            self.consume(&TokenKind::RParen, "expected ')' after return types")?;
            return Ok(returns);
        }

        returns.push(self.parse_type_expr()?);
        while self.matches(&TokenKind::Comma) {
            returns.push(self.parse_type_expr()?);
        }
        Ok(returns)
    }
}
