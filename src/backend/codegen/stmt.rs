//! Statement emission.
//!
//! Statements carrying an `onerr` clause are handed to the onerr module;
//! everything here is the direct lowering.

use crate::frontend::ast::{
    AssignStmt, Block, ElseArm, ForHeader, ForStmt, IfStmt, Statement, VarDeclStmt,
};

use super::Generator;

impl Generator<'_> {
    pub(super) fn gen_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            self.gen_statement(stmt);
        }
    }

    pub(super) fn gen_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::VarDecl(s) => {
                if s.onerr.is_some() {
                    self.gen_var_decl_onerr(s);
                } else {
                    let line = self.var_decl_line(s);
                    self.push_line(&line);
                }
            }
            Statement::Assign(s) => {
                if s.onerr.is_some() {
                    self.gen_assign_onerr(s);
                } else {
                    let line = self.assign_line(s);
                    self.push_line(&line);
                }
            }
            Statement::Expr(s) => {
                if s.onerr.is_some() {
                    self.gen_expr_stmt_onerr(s);
                } else {
                    let line = self.gen_expr(&s.expr);
                    self.push_line(&line);
                }
            }
            Statement::Return(s) => {
                if s.values.is_empty() {
                    self.push_line("return");
                } else {
                    let values: Vec<String> =
                        s.values.iter().map(|v| self.gen_expr(v)).collect();
                    self.push_line(&format!("return {}", values.join(", ")));
                }
            }
            Statement::If(s) => self.gen_if(s),
            Statement::For(s) => self.gen_for(s),
            Statement::Defer(s) => {
                let call = self.gen_expr(&s.call);
                self.push_line(&format!("defer {call}"));
            }
            Statement::Go(s) => {
                let call = self.gen_expr(&s.call);
                self.push_line(&format!("go {call}"));
            }
            Statement::Send(s) => {
                let channel = self.gen_expr(&s.channel);
                let value = self.gen_expr(&s.value);
                self.push_line(&format!("{channel} <- {value}"));
            }
        }
    }

    /// Lowering for the onerr-free declaration forms: `x := v`,
    /// `a, b := v`, and the annotated `var x T = v`.
    pub(super) fn var_decl_line(&self, stmt: &VarDeclStmt) -> String {
        match &stmt.ty {
            Some(ty) => format!(
                "var {} {} = {}",
                stmt.names[0],
                self.go_type(ty),
                self.gen_expr(&stmt.value)
            ),
            None => format!("{} := {}", stmt.names.join(", "), self.gen_expr(&stmt.value)),
        }
    }

    fn assign_line(&self, stmt: &AssignStmt) -> String {
        format!(
            "{} = {}",
            self.gen_expr(&stmt.target),
            self.gen_expr(&stmt.value)
        )
    }

    fn gen_if(&mut self, stmt: &IfStmt) {
        let condition = self.gen_expr(&stmt.condition);
        self.push_line(&format!("if {condition} {{"));
        self.indent += 1;
        self.gen_block(&stmt.consequence);
        self.indent -= 1;

        let mut alternative = stmt.alternative.as_ref();
        while let Some(arm) = alternative {
            match arm {
                ElseArm::If(elif) => {
                    let condition = self.gen_expr(&elif.condition);
                    self.push_line(&format!("}} else if {condition} {{"));
                    self.indent += 1;
                    self.gen_block(&elif.consequence);
                    self.indent -= 1;
                    alternative = elif.alternative.as_ref();
                }
                ElseArm::Block(block) => {
                    self.push_line("} else {");
                    self.indent += 1;
                    self.gen_block(block);
                    self.indent -= 1;
                    alternative = None;
                }
            }
        }
        self.push_line("}");
    }

    fn gen_for(&mut self, stmt: &ForStmt) {
        let header = match &stmt.header {
            ForHeader::Range {
                var,
                start,
                end,
                inclusive,
            } => {
                let start = self.gen_expr(start);
                let end = self.gen_expr(end);
                let cmp = if *inclusive { "<=" } else { "<" };
                format!("for {var} := {start}; {var} {cmp} {end}; {var}++ {{")
            }
            ForHeader::Collection {
                index,
                value,
                collection,
            } => {
                let collection = self.gen_expr(collection);
                let index = index.as_deref().unwrap_or("_");
                format!("for {index}, {value} := range {collection} {{")
            }
            ForHeader::Condition { condition } => {
                format!("for {} {{", self.gen_expr(condition))
            }
            ForHeader::Clauses {
                init,
                condition,
                post,
            } => {
                if init.is_none() && condition.is_none() && post.is_none() {
                    "for {".to_string()
                } else {
                    let init = init.as_deref().map(|s| self.inline_stmt(s)).unwrap_or_default();
                    let condition = condition
                        .as_ref()
                        .map(|c| self.gen_expr(c))
                        .unwrap_or_default();
                    let post = post.as_deref().map(|s| self.inline_stmt(s)).unwrap_or_default();
                    format!("for {init}; {condition}; {post} {{")
                }
            }
        };
        self.push_line(&header);
        self.indent += 1;
        self.gen_block(&stmt.body);
        self.indent -= 1;
        self.push_line("}");
    }

    /// Single-line rendering for C-style loop clauses. Only the simple
    /// statement forms can appear there.
    fn inline_stmt(&self, stmt: &Statement) -> String {
        match stmt {
            Statement::VarDecl(s) => self.var_decl_line(s),
            Statement::Assign(s) => self.assign_line(s),
            Statement::Expr(s) => self.gen_expr(&s.expr),
            _ => {
                debug_assert!(false, "non-simple statement in a loop clause");
                String::new()
            }
        }
    }
}
