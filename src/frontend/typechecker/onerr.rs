//! onerr clause validation against the enclosing function's signature.

use super::Checker;
use crate::frontend::ast::{OnErrClause, OnErrHandler};
use crate::frontend::diagnostics::{Diagnostic, Severity};
use crate::frontend::symbols::{SymbolKind, TypeInfo};

impl<'a> Checker<'a> {
    /// `value_ty` is the unstripped type of the guarded expression;
    /// `has_target` is true for var-decl and assignment statements, where a
    /// default fallback has something to assign into.
    pub(super) fn check_onerr(&mut self, clause: &OnErrClause, value_ty: &TypeInfo, has_target: bool) {
        if !can_fail(value_ty) {
            self.error(Diagnostic::onerr(
                format!(
                    "'onerr' on an expression of type {} that cannot fail",
                    value_ty.describe()
                ),
                clause.pos,
            ));
        }

        match &clause.handler {
            OnErrHandler::Block(block) => {
                self.scopes.push();
                let bound = clause.alias.clone().unwrap_or_else(|| "error".to_string());
                self.declare(
                    bound,
                    TypeInfo::Primitive("error".to_string()),
                    SymbolKind::Variable,
                    clause.pos,
                );
                let saved = self.onerr_alias_active;
                self.onerr_alias_active = clause.alias.is_some();
                self.check_block(block);
                self.onerr_alias_active = saved;
                self.scopes.pop();
            }
            OnErrHandler::Panic(message) => {
                self.with_bound_error(clause, |checker| {
                    let ty = checker.check_expr(message);
                    if !ty.compatible_with(&TypeInfo::Primitive("string".to_string())) {
                        checker.error(Diagnostic::onerr(
                            format!("panic message must be a string, got {}", ty.describe()),
                            clause.pos,
                        ));
                    }
                });
            }
            OnErrHandler::Propagate => {
                if !self
                    .current_returns
                    .last()
                    .map_or(false, TypeInfo::is_error)
                {
                    self.error(Diagnostic::onerr(
                        "'onerr return' requires the enclosing function to return a trailing error",
                        clause.pos,
                    ));
                }
            }
            OnErrHandler::Return(values) => {
                let expected = self.current_returns.clone();
                if values.len() != expected.len() {
                    self.error(Diagnostic::onerr(
                        format!(
                            "'onerr return' must match the enclosing signature: \
                             expected {} value(s), got {}",
                            expected.len(),
                            values.len()
                        ),
                        clause.pos,
                    ));
                }
                self.with_bound_error(clause, |checker| {
                    for (value, want) in values.iter().zip(expected.iter()) {
                        let ty = checker.check_expr(value);
                        if !ty.compatible_with(want) {
                            checker.error(Diagnostic::onerr(
                                format!(
                                    "'onerr return' value type mismatch: expected {}, got {}",
                                    want.describe(),
                                    ty.describe()
                                ),
                                value.pos(),
                            ));
                        }
                    }
                    for value in values.iter().skip(expected.len()) {
                        checker.check_expr(value);
                    }
                });
            }
            OnErrHandler::Default(fallback) => {
                if !has_target {
                    self.error(Diagnostic::onerr(
                        "a default fallback requires a declaration or assignment target",
                        clause.pos,
                    ));
                }
                let fallback_ty = self.check_expr(fallback);
                if let TypeInfo::Tuple(items) = value_ty {
                    if let Some((last, rest)) = items.split_last() {
                        if last.is_error() && rest.len() == 1 && !fallback_ty.compatible_with(&rest[0])
                        {
                            self.error(Diagnostic::onerr(
                                format!(
                                    "default fallback has type {}, expected {}",
                                    fallback_ty.describe(),
                                    rest[0].describe()
                                ),
                                fallback.pos(),
                            ));
                        }
                    }
                }
            }
            OnErrHandler::Discard => {
                if self.options.strict && !self.options.source_path.ends_with("_test.fr") {
                    let mut d = Diagnostic::lint(
                        "'onerr discard' outside a test file",
                        clause.pos,
                    )
                    .with_hint("handle the error, or move this code into a *_test.fr file");
                    d.severity = Severity::Error;
                    self.error(d);
                }
            }
        }
    }

    /// Run `f` with the reserved `error` name bound, for handler forms whose
    /// message or values may interpolate the caught error.
    fn with_bound_error(&mut self, clause: &OnErrClause, f: impl FnOnce(&mut Self)) {
        self.scopes.push();
        self.declare(
            "error".to_string(),
            TypeInfo::Primitive("error".to_string()),
            SymbolKind::Variable,
            clause.pos,
        );
        f(self);
        self.scopes.pop();
    }
}

fn can_fail(ty: &TypeInfo) -> bool {
    match ty {
        TypeInfo::Unknown => true,
        TypeInfo::Tuple(items) => items.last().map_or(false, TypeInfo::is_error),
        _ => ty.is_error(),
    }
}
