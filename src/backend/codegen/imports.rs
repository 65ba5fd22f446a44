//! Import block assembly.
//!
//! User imports pass through verbatim (with aliases); a pre-scan of the
//! tree adds the Go packages the generated code itself needs: `fmt` for
//! interpolation and console output, `errors` for plain error construction,
//! `os` for protocol-mode stderr writes, `slices` for the `in` operator,
//! `time` when a `time.*` type appears. The block is sorted and
//! deduplicated so generation stays byte-stable.

use std::collections::BTreeMap;

use crate::frontend::ast::{
    Block, Declaration, ElseArm, Expr, ForHeader, OnErrClause, OnErrHandler, Program, Statement,
    StrPart, TypeExpr,
};
use crate::Options;

pub(super) fn collect(program: &Program, options: &Options) -> Vec<String> {
    let mut imports: BTreeMap<String, Option<String>> = BTreeMap::new();
    for import in &program.imports {
        imports.insert(import.path.clone(), import.alias.clone());
    }

    let mut scan = Scan::default();
    for decl in &program.declarations {
        match decl {
            Declaration::Function(f) => {
                for param in &f.params {
                    scan.scan_type(&param.ty);
                }
                for ret in &f.returns {
                    scan.scan_type(ret);
                }
                scan.scan_block(&f.body);
            }
            Declaration::Type(t) => {
                for field in &t.fields {
                    scan.scan_type(&field.ty);
                }
            }
            Declaration::Interface(i) => {
                for method in &i.methods {
                    for param in &method.params {
                        scan.scan_type(&param.ty);
                    }
                    for ret in &method.returns {
                        scan.scan_type(ret);
                    }
                }
            }
        }
    }

    let mut auto = |name: &str| {
        imports.entry(name.to_string()).or_insert(None);
    };
    if scan.needs_fmt {
        auto("fmt");
    }
    if scan.needs_errors {
        auto("errors");
    }
    if scan.needs_slices {
        auto("slices");
    }
    if scan.needs_time {
        auto("time");
    }
    if options.protocol_output && scan.has_print {
        auto("os");
    }

    imports
        .into_iter()
        .map(|(path, alias)| match alias {
            Some(alias) => format!("{alias} \"{path}\""),
            None => format!("\"{path}\""),
        })
        .collect()
}

#[derive(Default)]
struct Scan {
    needs_fmt: bool,
    needs_errors: bool,
    needs_slices: bool,
    needs_time: bool,
    has_print: bool,
}

impl Scan {
    fn scan_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            self.scan_statement(stmt);
        }
    }

    fn scan_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::VarDecl(s) => {
                if let Some(ty) = &s.ty {
                    self.scan_type(ty);
                }
                self.scan_expr(&s.value);
                self.scan_onerr(&s.onerr);
            }
            Statement::Assign(s) => {
                self.scan_expr(&s.target);
                self.scan_expr(&s.value);
                self.scan_onerr(&s.onerr);
            }
            Statement::Expr(s) => {
                self.scan_expr(&s.expr);
                self.scan_onerr(&s.onerr);
            }
            Statement::Return(s) => {
                for value in &s.values {
                    self.scan_expr(value);
                }
            }
            Statement::If(s) => {
                self.scan_expr(&s.condition);
                self.scan_block(&s.consequence);
                let mut alt = s.alternative.as_ref();
                while let Some(arm) = alt {
                    match arm {
                        ElseArm::Block(block) => {
                            self.scan_block(block);
                            alt = None;
                        }
                        ElseArm::If(elif) => {
                            self.scan_expr(&elif.condition);
                            self.scan_block(&elif.consequence);
                            alt = elif.alternative.as_ref();
                        }
                    }
                }
            }
            Statement::For(s) => {
                match &s.header {
                    ForHeader::Range { start, end, .. } => {
                        self.scan_expr(start);
                        self.scan_expr(end);
                    }
                    ForHeader::Collection { collection, .. } => self.scan_expr(collection),
                    ForHeader::Condition { condition } => self.scan_expr(condition),
                    ForHeader::Clauses {
                        init,
                        condition,
                        post,
                    } => {
                        if let Some(init) = init {
                            self.scan_statement(init);
                        }
                        if let Some(condition) = condition {
                            self.scan_expr(condition);
                        }
                        if let Some(post) = post {
                            self.scan_statement(post);
                        }
                    }
                }
                self.scan_block(&s.body);
            }
            Statement::Defer(s) => self.scan_expr(&s.call),
            Statement::Go(s) => self.scan_expr(&s.call),
            Statement::Send(s) => {
                self.scan_expr(&s.value);
                self.scan_expr(&s.channel);
            }
        }
    }

    fn scan_onerr(&mut self, onerr: &Option<OnErrClause>) {
        let Some(clause) = onerr else { return };
        if clause.explain.is_some() {
            // Explain hints wrap with fmt.Errorf.
            self.needs_fmt = true;
        }
        match &clause.handler {
            OnErrHandler::Block(block) => self.scan_block(block),
            OnErrHandler::Panic(message) => self.scan_expr(message),
            OnErrHandler::Return(values) => {
                for value in values {
                    self.scan_expr(value);
                }
            }
            OnErrHandler::Default(fallback) => self.scan_expr(fallback),
            OnErrHandler::Propagate | OnErrHandler::Discard => {}
        }
    }

    fn scan_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Str { parts, .. } => {
                if parts.iter().any(|p| matches!(p, StrPart::Expr(_))) {
                    self.needs_fmt = true;
                }
                for part in parts {
                    if let StrPart::Expr(e) = part {
                        self.scan_expr(e);
                    }
                }
            }
            Expr::ErrorNew { message, .. } => {
                if message.is_interpolated() {
                    self.needs_fmt = true;
                } else {
                    self.needs_errors = true;
                }
                self.scan_expr(message);
            }
            Expr::Binary {
                op, left, right, ..
            } => {
                if matches!(
                    op,
                    crate::frontend::ast::BinaryOp::In | crate::frontend::ast::BinaryOp::NotIn
                ) {
                    self.needs_slices = true;
                }
                self.scan_expr(left);
                self.scan_expr(right);
            }
            Expr::Call { callee, args, .. } => {
                if matches!(&**callee, Expr::Ident { name, .. } if name == "print") {
                    self.needs_fmt = true;
                    self.has_print = true;
                }
                self.scan_expr(callee);
                for arg in args {
                    self.scan_expr(&arg.value);
                }
            }
            Expr::MethodCall { receiver, args, .. } => {
                if let Some(receiver) = receiver {
                    self.scan_expr(receiver);
                }
                for arg in args {
                    self.scan_expr(&arg.value);
                }
            }
            Expr::Pipe { left, right, .. } => {
                self.scan_expr(left);
                self.scan_expr(right);
            }
            Expr::Unary { operand, .. } => self.scan_expr(operand),
            Expr::Field { object, .. } => self.scan_expr(object),
            Expr::Index { object, index, .. } => {
                self.scan_expr(object);
                self.scan_expr(index);
            }
            Expr::Slice {
                object, start, end, ..
            } => {
                self.scan_expr(object);
                if let Some(start) = start {
                    self.scan_expr(start);
                }
                if let Some(end) = end {
                    self.scan_expr(end);
                }
            }
            Expr::StructLit { fields, .. } => {
                for field in fields {
                    self.scan_expr(&field.value);
                }
            }
            Expr::ListLit {
                elem_ty, elements, ..
            } => {
                if let Some(ty) = elem_ty {
                    self.scan_type(ty);
                }
                for element in elements {
                    self.scan_expr(element);
                }
            }
            Expr::MapLit {
                key_ty,
                value_ty,
                entries,
                ..
            } => {
                self.scan_type(key_ty);
                self.scan_type(value_ty);
                for (k, v) in entries {
                    self.scan_expr(k);
                    self.scan_expr(v);
                }
            }
            Expr::Receive { channel, .. } | Expr::Close { channel, .. } => {
                self.scan_expr(channel)
            }
            Expr::Cast { expr, ty, .. } => {
                self.scan_expr(expr);
                self.scan_type(ty);
            }
            Expr::Make { ty, args, .. } => {
                self.scan_type(ty);
                for arg in args {
                    self.scan_expr(arg);
                }
            }
            Expr::Empty { ty, .. } => {
                if let Some(ty) = ty {
                    self.scan_type(ty);
                }
            }
            Expr::Panic { message, .. } => self.scan_expr(message),
            _ => {}
        }
    }

    fn scan_type(&mut self, ty: &TypeExpr) {
        match ty {
            TypeExpr::Named { name, .. } => {
                if name.starts_with("time.") {
                    self.needs_time = true;
                }
            }
            TypeExpr::List { elem, .. }
            | TypeExpr::Channel { elem, .. }
            | TypeExpr::Reference { elem, .. } => self.scan_type(elem),
            TypeExpr::Map { key, value, .. } => {
                self.scan_type(key);
                self.scan_type(value);
            }
            TypeExpr::Function { params, returns, .. } => {
                for p in params {
                    self.scan_type(p);
                }
                for r in returns {
                    self.scan_type(r);
                }
            }
            TypeExpr::Primitive { .. } => {}
        }
    }
}
