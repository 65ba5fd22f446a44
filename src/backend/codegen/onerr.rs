//! `onerr` desugaring.
//!
//! Every fallible statement lowers to Go's two-value capture with a
//! uniquely numbered error temporary, then one conditional per handler
//! form. `discard` is the exception: it binds the error to `_` and emits
//! no conditional at all.

use crate::frontend::ast::{
    AssignStmt, Expr, ExprStmt, OnErrClause, OnErrHandler, VarDeclStmt,
};

use super::Generator;

impl Generator<'_> {
    pub(super) fn gen_var_decl_onerr(&mut self, stmt: &VarDeclStmt) {
        let Some(clause) = &stmt.onerr else { return };
        let names = stmt.names.join(", ");
        let value = self.gen_expr(&stmt.value);

        if matches!(clause.handler, OnErrHandler::Discard) {
            self.push_line(&format!("{names}, _ := {value}"));
            return;
        }

        let err = self.fresh_err_name();
        self.push_line(&format!("{names}, {err} := {value}"));
        self.gen_handler(&err, clause, Some(&stmt.names[0]));
    }

    pub(super) fn gen_assign_onerr(&mut self, stmt: &AssignStmt) {
        let Some(clause) = &stmt.onerr else { return };
        let target = self.gen_expr(&stmt.target);
        let value = self.gen_expr(&stmt.value);
        let tmp = self.fresh_tmp_name();

        if matches!(clause.handler, OnErrHandler::Discard) {
            self.push_line(&format!("{tmp}, _ := {value}"));
            self.push_line(&format!("{target} = {tmp}"));
            return;
        }

        let err = self.fresh_err_name();
        self.push_line(&format!("{tmp}, {err} := {value}"));
        self.gen_handler(&err, clause, Some(&tmp));
        self.push_line(&format!("{target} = {tmp}"));
    }

    pub(super) fn gen_expr_stmt_onerr(&mut self, stmt: &ExprStmt) {
        let Some(clause) = &stmt.onerr else { return };
        let count = expr_id(&stmt.expr)
            .and_then(|id| self.analysis.return_counts.get(&id).copied())
            .unwrap_or(1);
        let value = self.gen_expr(&stmt.expr);

        if matches!(clause.handler, OnErrHandler::Discard) {
            // All-blank targets need plain assignment.
            let blanks = vec!["_"; count].join(", ");
            self.push_line(&format!("{blanks} = {value}"));
            return;
        }

        let err = self.fresh_err_name();
        let mut targets = vec!["_"; count.saturating_sub(1)];
        targets.push(&err);
        self.push_line(&format!("{} := {value}", targets.join(", ")));
        self.gen_handler(&err, clause, None);
    }

    /// The `if err != nil { ... }` branch for every handler except discard.
    fn gen_handler(&mut self, err: &str, clause: &OnErrClause, target: Option<&str>) {
        self.push_line(&format!("if {err} != nil {{"));
        self.indent += 1;

        if let Some(hint) = &clause.explain {
            self.push_line(&format!("{err} = fmt.Errorf(\"{hint}: %w\", {err})"));
        }

        let source_name = clause.alias.clone().unwrap_or_else(|| "error".to_string());
        match &clause.handler {
            OnErrHandler::Block(body) => {
                self.error_binding = Some((source_name, err.to_string()));
                self.gen_block(body);
                self.error_binding = None;
            }
            OnErrHandler::Panic(message) => {
                self.error_binding = Some((source_name, err.to_string()));
                let message = self.gen_expr(message);
                self.error_binding = None;
                self.push_line(&format!("panic({message})"));
            }
            OnErrHandler::Propagate => {
                let line = self.propagate_return(err);
                self.push_line(&line);
            }
            OnErrHandler::Return(values) => {
                self.error_binding = Some((source_name, err.to_string()));
                let values: Vec<String> = values.iter().map(|v| self.gen_expr(v)).collect();
                self.error_binding = None;
                self.push_line(&format!("return {}", values.join(", ")));
            }
            OnErrHandler::Default(fallback) => {
                let fallback = self.gen_expr(fallback);
                match target {
                    Some(target) => self.push_line(&format!("{target} = {fallback}")),
                    None => debug_assert!(false, "default handler without a target"),
                }
            }
            OnErrHandler::Discard => debug_assert!(false, "discard reaches no conditional"),
        }

        self.indent -= 1;
        self.push_line("}");
    }

    /// `return <zero>, ..., err` matching the enclosing signature.
    fn propagate_return(&self, err: &str) -> String {
        let returns = &self.current_returns;
        if returns.len() <= 1 {
            return format!("return {err}");
        }
        let mut parts: Vec<String> = returns[..returns.len() - 1]
            .iter()
            .map(|ty| self.zero_value(ty))
            .collect();
        parts.push(err.to_string());
        format!("return {}", parts.join(", "))
    }
}

fn expr_id(expr: &Expr) -> Option<crate::frontend::ast::ExprId> {
    match expr {
        Expr::Call { id, .. } | Expr::MethodCall { id, .. } | Expr::Pipe { id, .. } => Some(*id),
        _ => None,
    }
}
