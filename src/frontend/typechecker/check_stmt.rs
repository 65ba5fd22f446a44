//! Pass 4, statement side: scope-stack walk over function bodies.

use super::Checker;
use crate::frontend::ast::{
    AssignStmt, Block, Declaration, ElseArm, Expr, ForHeader, ForStmt, Program, ReturnStmt,
    SendStmt, Statement, VarDeclStmt,
};
use crate::frontend::diagnostics::Diagnostic;
use crate::frontend::symbols::{Symbol, SymbolKind, TypeInfo};

impl<'a> Checker<'a> {
    pub(super) fn check_bodies(&mut self, program: &'a Program) {
        for decl in &program.declarations {
            let Declaration::Function(f) = decl else {
                continue;
            };

            self.scopes.push();
            if let Some(recv) = &f.receiver {
                let recv_ty = TypeInfo::from_expr(&recv.ty);
                self.declare(recv.name.clone(), recv_ty.clone(), SymbolKind::Parameter, recv.pos);
                self.declare("this".to_string(), recv_ty, SymbolKind::Parameter, recv.pos);
            }
            for param in &f.params {
                let ty = TypeInfo::from_expr(&param.ty);
                if let Some(default) = &param.default {
                    let default_ty = self.check_expr(default);
                    if !default_ty.compatible_with(&ty) {
                        self.error(Diagnostic::type_error(
                            format!(
                                "default value for '{}' has type {}, expected {}",
                                param.name,
                                default_ty.describe(),
                                ty.describe()
                            ),
                            param.pos,
                        ));
                    }
                }
                self.declare(param.name.clone(), ty, SymbolKind::Parameter, param.pos);
            }

            self.current_returns = f.returns.iter().map(TypeInfo::from_expr).collect();
            self.check_block(&f.body);
            self.current_returns = Vec::new();
            self.scopes.pop();
        }
    }

    pub(super) fn check_block(&mut self, block: &Block) {
        self.scopes.push();
        for stmt in &block.statements {
            self.check_statement(stmt);
        }
        self.scopes.pop();
    }

    pub(super) fn check_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::VarDecl(s) => self.check_var_decl(s),
            Statement::Assign(s) => self.check_assign(s),
            Statement::Expr(s) => {
                let ty = self.check_expr(&s.expr);
                if let Some(clause) = &s.onerr {
                    self.check_onerr(clause, &ty, false);
                }
            }
            Statement::Return(s) => self.check_return(s),
            Statement::If(s) => {
                let cond = self.check_expr(&s.condition);
                self.expect_bool(&cond, s.condition.pos());
                self.check_block(&s.consequence);
                let mut alt = s.alternative.as_ref();
                while let Some(arm) = alt {
                    match arm {
                        ElseArm::Block(block) => {
                            self.check_block(block);
                            alt = None;
                        }
                        ElseArm::If(elif) => {
                            let cond = self.check_expr(&elif.condition);
                            self.expect_bool(&cond, elif.condition.pos());
                            self.check_block(&elif.consequence);
                            alt = elif.alternative.as_ref();
                        }
                    }
                }
            }
            Statement::For(s) => self.check_for(s),
            Statement::Defer(s) => self.check_spawned_call(&s.call, "defer"),
            Statement::Go(s) => self.check_spawned_call(&s.call, "go"),
            Statement::Send(s) => self.check_send(s),
        }
    }

    fn check_var_decl(&mut self, s: &VarDeclStmt) {
        let value_ty = self.check_expr(&s.value);

        // The onerr clause consumes the trailing error; the declared names
        // bind to the remaining values.
        let bound_ty = if s.onerr.is_some() {
            strip_trailing_error(&value_ty)
        } else {
            value_ty.clone()
        };

        match (s.names.len(), &bound_ty) {
            (1, ty) => {
                let ty = match ty {
                    // A single name cannot hold a multi-value result.
                    TypeInfo::Tuple(items) if items.len() != 1 => {
                        self.error(Diagnostic::type_error(
                            format!(
                                "cannot bind a {}-value result to one name",
                                items.len()
                            ),
                            s.pos,
                        ));
                        TypeInfo::Unknown
                    }
                    TypeInfo::Tuple(items) => items[0].clone(),
                    other => other.clone(),
                };
                let declared = match &s.ty {
                    Some(annotation) => {
                        self.validate_type_expr(annotation);
                        let annotated = TypeInfo::from_expr(annotation);
                        if !ty.compatible_with(&annotated) {
                            self.error(Diagnostic::type_error(
                                format!(
                                    "cannot assign {} to '{}' of type {}",
                                    ty.describe(),
                                    s.names[0],
                                    annotated.describe()
                                ),
                                s.pos,
                            ));
                        }
                        annotated
                    }
                    None => ty,
                };
                self.declare_name(&s.names[0], declared, s.pos);
            }
            (n, TypeInfo::Tuple(items)) => {
                if items.len() != n {
                    self.error(Diagnostic::type_error(
                        format!("expected {n} values, got {}", items.len()),
                        s.pos,
                    ));
                }
                for (name, ty) in s.names.iter().zip(items.iter().chain(std::iter::repeat(
                    &TypeInfo::Unknown,
                ))) {
                    self.declare_name(name, ty.clone(), s.pos);
                }
            }
            (_, TypeInfo::Unknown) => {
                for name in &s.names {
                    self.declare_name(name, TypeInfo::Unknown, s.pos);
                }
            }
            (n, other) => {
                self.error(Diagnostic::type_error(
                    format!(
                        "expected {n} values, got a single {}",
                        other.describe()
                    ),
                    s.pos,
                ));
                for name in &s.names {
                    self.declare_name(name, TypeInfo::Unknown, s.pos);
                }
            }
        }

        if let Some(clause) = &s.onerr {
            self.check_onerr(clause, &value_ty, true);
        }
    }

    fn check_assign(&mut self, s: &AssignStmt) {
        if !matches!(
            s.target,
            Expr::Ident { .. } | Expr::Field { .. } | Expr::Index { .. }
        ) {
            self.error(Diagnostic::type_error(
                "left side of '=' must be a variable, field, or index",
                s.pos,
            ));
        }
        let target_ty = self.check_expr(&s.target);
        let value_ty = self.check_expr(&s.value);
        let effective = if s.onerr.is_some() {
            strip_trailing_error(&value_ty)
        } else {
            value_ty.clone()
        };
        let effective = match effective {
            TypeInfo::Tuple(items) if items.len() == 1 => items[0].clone(),
            other => other,
        };
        if !effective.compatible_with(&target_ty) {
            self.error(Diagnostic::type_error(
                format!(
                    "cannot assign {} to a target of type {}",
                    effective.describe(),
                    target_ty.describe()
                ),
                s.pos,
            ));
        }
        if let Some(clause) = &s.onerr {
            self.check_onerr(clause, &value_ty, true);
        }
    }

    fn check_return(&mut self, s: &ReturnStmt) {
        let expected = self.current_returns.clone();

        // A single call expression may satisfy a multi-value signature.
        if s.values.len() == 1 && expected.len() > 1 {
            let ty = self.check_expr(&s.values[0]);
            match ty {
                TypeInfo::Tuple(items) => {
                    if items.len() != expected.len() {
                        self.error(Diagnostic::type_error(
                            format!(
                                "expected {} return values, got {}",
                                expected.len(),
                                items.len()
                            ),
                            s.pos,
                        ));
                    }
                }
                TypeInfo::Unknown => {}
                _ => {
                    self.error(Diagnostic::type_error(
                        format!("expected {} return values, got 1", expected.len()),
                        s.pos,
                    ));
                }
            }
            return;
        }

        if s.values.len() != expected.len() {
            self.error(Diagnostic::type_error(
                format!(
                    "expected {} return value(s), got {}",
                    expected.len(),
                    s.values.len()
                ),
                s.pos,
            ));
        }
        for (value, want) in s.values.iter().zip(expected.iter()) {
            let ty = self.check_expr(value);
            let ty = match ty {
                TypeInfo::Tuple(items) if items.len() == 1 => items[0].clone(),
                other => other,
            };
            if !ty.compatible_with(want) {
                self.error(Diagnostic::type_error(
                    format!(
                        "return type mismatch: expected {}, got {}",
                        want.describe(),
                        ty.describe()
                    ),
                    value.pos(),
                ));
            }
        }
        for value in s.values.iter().skip(expected.len()) {
            self.check_expr(value);
        }
    }

    fn check_for(&mut self, s: &ForStmt) {
        self.scopes.push();
        match &s.header {
            ForHeader::Range {
                var, start, end, ..
            } => {
                let int = TypeInfo::Primitive("int".to_string());
                let start_ty = self.check_expr(start);
                let end_ty = self.check_expr(end);
                if !start_ty.compatible_with(&int) || !end_ty.compatible_with(&int) {
                    self.error(Diagnostic::type_error(
                        "range bounds must be int",
                        s.pos,
                    ));
                }
                self.declare_name(var, int, s.pos);
            }
            ForHeader::Collection {
                index,
                value,
                collection,
            } => {
                let coll_ty = self.check_expr(collection);
                let (index_ty, value_ty) = match &coll_ty {
                    TypeInfo::List(elem) => {
                        (TypeInfo::Primitive("int".to_string()), (**elem).clone())
                    }
                    TypeInfo::Map(k, v) => ((**k).clone(), (**v).clone()),
                    TypeInfo::Primitive(name) if name == "string" => (
                        TypeInfo::Primitive("int".to_string()),
                        TypeInfo::Primitive("rune".to_string()),
                    ),
                    TypeInfo::Channel(elem) => (TypeInfo::Unknown, (**elem).clone()),
                    TypeInfo::Unknown => (TypeInfo::Unknown, TypeInfo::Unknown),
                    other => {
                        self.error(Diagnostic::type_error(
                            format!("cannot iterate over {}", other.describe()),
                            collection.pos(),
                        ));
                        (TypeInfo::Unknown, TypeInfo::Unknown)
                    }
                };
                if let Some(index) = index {
                    self.declare_name(index, index_ty, s.pos);
                }
                self.declare_name(value, value_ty, s.pos);
            }
            ForHeader::Condition { condition } => {
                let ty = self.check_expr(condition);
                self.expect_bool(&ty, condition.pos());
            }
            ForHeader::Clauses {
                init,
                condition,
                post,
            } => {
                if let Some(init) = init {
                    self.check_statement(init);
                }
                if let Some(condition) = condition {
                    let ty = self.check_expr(condition);
                    self.expect_bool(&ty, condition.pos());
                }
                if let Some(post) = post {
                    self.check_statement(post);
                }
            }
        }
        self.check_block(&s.body);
        self.scopes.pop();
    }

    fn check_spawned_call(&mut self, call: &Expr, keyword: &str) {
        if !matches!(
            call,
            Expr::Call { .. } | Expr::MethodCall { .. } | Expr::Pipe { .. }
        ) {
            self.error(Diagnostic::type_error(
                format!("'{keyword}' requires a function or method call"),
                call.pos(),
            ));
        }
        self.check_expr(call);
    }

    fn check_send(&mut self, s: &SendStmt) {
        let value_ty = self.check_expr(&s.value);
        let channel_ty = self.check_expr(&s.channel);
        match channel_ty {
            TypeInfo::Channel(elem) => {
                if !value_ty.compatible_with(&elem) {
                    self.error(Diagnostic::type_error(
                        format!(
                            "cannot send {} on a channel of {}",
                            value_ty.describe(),
                            elem.describe()
                        ),
                        s.pos,
                    ));
                }
            }
            TypeInfo::Unknown => {}
            other => {
                self.error(Diagnostic::type_error(
                    format!("cannot send on a value of type {}", other.describe()),
                    s.pos,
                ));
            }
        }
    }

    pub(super) fn declare_name(
        &mut self,
        name: &str,
        ty: TypeInfo,
        pos: crate::frontend::ast::Position,
    ) {
        if name == "_" {
            return;
        }
        self.declare(name.to_string(), ty, SymbolKind::Variable, pos);
    }

    pub(super) fn declare(
        &mut self,
        name: String,
        ty: TypeInfo,
        kind: SymbolKind,
        pos: crate::frontend::ast::Position,
    ) {
        self.scopes.declare(Symbol {
            name,
            kind,
            ty,
            pos,
            mutable: true,
        });
    }
}

/// The value shape the non-error targets bind to once an onerr clause has
/// consumed the trailing error.
fn strip_trailing_error(ty: &TypeInfo) -> TypeInfo {
    match ty {
        TypeInfo::Tuple(items) => match items.split_last() {
            Some((last, rest)) if last.is_error() => match rest {
                [] => TypeInfo::Tuple(Vec::new()),
                [single] => single.clone(),
                many => TypeInfo::Tuple(many.to_vec()),
            },
            _ => ty.clone(),
        },
        _ if ty.is_error() => TypeInfo::Tuple(Vec::new()),
        _ => ty.clone(),
    }
}
