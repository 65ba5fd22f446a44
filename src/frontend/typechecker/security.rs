//! Pass 5: security policy checks.
//!
//! Pattern-matched on qualified call names (`pkg.Function`), these are hard
//! errors, never warnings. Handler context is detected by the presence of a
//! `web.ResponseWriter` parameter. Pipes that inject the piped value as the
//! first argument shift every checked argument index down by one.

use crate::frontend::ast::{
    Arg, Block, Declaration, ElseArm, Expr, FunctionDecl, OnErrHandler, PipeStrategy, Program,
    Statement, TypeExpr,
};
use crate::frontend::diagnostics::Diagnostic;
use crate::Options;

const SQL_FUNCTIONS: &[&str] = &[
    "db.Query",
    "db.QueryRow",
    "db.Exec",
    "db.TxQuery",
    "db.TxQueryRow",
    "db.TxExec",
];

const FETCH_FUNCTIONS: &[&str] = &["fetch.Get", "fetch.Post", "fetch.New"];

const FILES_FUNCTIONS: &[&str] = &[
    "files.Read",
    "files.ReadBytes",
    "files.Write",
    "files.WriteString",
    "files.Append",
    "files.AppendString",
    "files.Delete",
    "files.DeleteAll",
    "files.List",
    "files.ListRecursive",
];

const REDIRECT_FUNCTIONS: &[&str] = &["web.Redirect", "web.RedirectPermanent"];

pub(super) fn check(program: &Program, options: &Options, errors: &mut Vec<Diagnostic>) {
    let mut pass = SecurityPass { options, errors };
    for decl in &program.declarations {
        if let Declaration::Function(f) = decl {
            pass.check_function(f);
        }
    }
}

struct SecurityPass<'a> {
    options: &'a Options,
    errors: &'a mut Vec<Diagnostic>,
}

impl SecurityPass<'_> {
    fn check_function(&mut self, f: &FunctionDecl) {
        let in_handler = f.params.iter().any(|p| is_response_writer(&p.ty));
        self.walk_block(&f.body, in_handler);
    }

    fn walk_block(&mut self, block: &Block, in_handler: bool) {
        for stmt in &block.statements {
            self.walk_statement(stmt, in_handler);
        }
    }

    fn walk_statement(&mut self, stmt: &Statement, in_handler: bool) {
        match stmt {
            Statement::VarDecl(s) => {
                self.walk_expr(&s.value, in_handler, false);
                self.walk_onerr(&s.onerr, in_handler);
            }
            Statement::Assign(s) => {
                self.walk_expr(&s.target, in_handler, false);
                self.walk_expr(&s.value, in_handler, false);
                self.walk_onerr(&s.onerr, in_handler);
            }
            Statement::Expr(s) => {
                self.walk_expr(&s.expr, in_handler, false);
                self.walk_onerr(&s.onerr, in_handler);
            }
            Statement::Return(s) => {
                for value in &s.values {
                    self.walk_expr(value, in_handler, false);
                }
            }
            Statement::If(s) => {
                self.walk_expr(&s.condition, in_handler, false);
                self.walk_block(&s.consequence, in_handler);
                let mut alt = s.alternative.as_ref();
                while let Some(arm) = alt {
                    match arm {
                        ElseArm::Block(block) => {
                            self.walk_block(block, in_handler);
                            alt = None;
                        }
                        ElseArm::If(elif) => {
                            self.walk_expr(&elif.condition, in_handler, false);
                            self.walk_block(&elif.consequence, in_handler);
                            alt = elif.alternative.as_ref();
                        }
                    }
                }
            }
            Statement::For(s) => {
                match &s.header {
                    crate::frontend::ast::ForHeader::Range { start, end, .. } => {
                        self.walk_expr(start, in_handler, false);
                        self.walk_expr(end, in_handler, false);
                    }
                    crate::frontend::ast::ForHeader::Collection { collection, .. } => {
                        self.walk_expr(collection, in_handler, false);
                    }
                    crate::frontend::ast::ForHeader::Condition { condition } => {
                        self.walk_expr(condition, in_handler, false);
                    }
                    crate::frontend::ast::ForHeader::Clauses {
                        init,
                        condition,
                        post,
                    } => {
                        if let Some(init) = init {
                            self.walk_statement(init, in_handler);
                        }
                        if let Some(condition) = condition {
                            self.walk_expr(condition, in_handler, false);
                        }
                        if let Some(post) = post {
                            self.walk_statement(post, in_handler);
                        }
                    }
                }
                self.walk_block(&s.body, in_handler);
            }
            Statement::Defer(s) => self.walk_expr(&s.call, in_handler, false),
            Statement::Go(s) => self.walk_expr(&s.call, in_handler, false),
            Statement::Send(s) => {
                self.walk_expr(&s.value, in_handler, false);
                self.walk_expr(&s.channel, in_handler, false);
            }
        }
    }

    fn walk_onerr(&mut self, onerr: &Option<crate::frontend::ast::OnErrClause>, in_handler: bool) {
        let Some(clause) = onerr else { return };
        match &clause.handler {
            OnErrHandler::Block(block) => self.walk_block(block, in_handler),
            OnErrHandler::Panic(message) => self.walk_expr(message, in_handler, false),
            OnErrHandler::Return(values) => {
                for value in values {
                    self.walk_expr(value, in_handler, false);
                }
            }
            OnErrHandler::Default(fallback) => self.walk_expr(fallback, in_handler, false),
            OnErrHandler::Propagate | OnErrHandler::Discard => {}
        }
    }

    /// `piped` is set when this expression is the right side of a pipe whose
    /// strategy injects the piped value as the first argument.
    fn walk_expr(&mut self, expr: &Expr, in_handler: bool, piped: bool) {
        match expr {
            Expr::Pipe {
                strategy,
                left,
                right,
                ..
            } => {
                self.walk_expr(left, in_handler, false);
                let injects = matches!(
                    strategy,
                    PipeStrategy::ContextFirst | PipeStrategy::DataFirst
                );
                self.walk_expr(right, in_handler, injects);
            }
            Expr::MethodCall {
                receiver,
                method,
                args,
                pos,
                ..
            } => {
                if let Some(Expr::Ident { name, .. }) = receiver.as_deref() {
                    let qualified = format!("{name}.{method}");
                    self.apply_rules(&qualified, args, in_handler, piped, *pos);
                }
                if let Some(receiver) = receiver {
                    self.walk_expr(receiver, in_handler, false);
                }
                for arg in args {
                    self.walk_expr(&arg.value, in_handler, false);
                }
            }
            Expr::Call { callee, args, .. } => {
                self.walk_expr(callee, in_handler, false);
                for arg in args {
                    self.walk_expr(&arg.value, in_handler, false);
                }
            }
            Expr::Binary { left, right, .. } => {
                self.walk_expr(left, in_handler, false);
                self.walk_expr(right, in_handler, false);
            }
            Expr::Unary { operand, .. } => self.walk_expr(operand, in_handler, false),
            Expr::Field { object, .. } => self.walk_expr(object, in_handler, false),
            Expr::Index { object, index, .. } => {
                self.walk_expr(object, in_handler, false);
                self.walk_expr(index, in_handler, false);
            }
            Expr::Slice {
                object, start, end, ..
            } => {
                self.walk_expr(object, in_handler, false);
                if let Some(start) = start {
                    self.walk_expr(start, in_handler, false);
                }
                if let Some(end) = end {
                    self.walk_expr(end, in_handler, false);
                }
            }
            Expr::StructLit { fields, .. } => {
                for field in fields {
                    self.walk_expr(&field.value, in_handler, false);
                }
            }
            Expr::ListLit { elements, .. } => {
                for element in elements {
                    self.walk_expr(element, in_handler, false);
                }
            }
            Expr::MapLit { entries, .. } => {
                for (k, v) in entries {
                    self.walk_expr(k, in_handler, false);
                    self.walk_expr(v, in_handler, false);
                }
            }
            Expr::Str { parts, .. } => {
                for part in parts {
                    if let crate::frontend::ast::StrPart::Expr(e) = part {
                        self.walk_expr(e, in_handler, false);
                    }
                }
            }
            Expr::Receive { channel, .. } => self.walk_expr(channel, in_handler, false),
            Expr::Cast { expr, .. } => self.walk_expr(expr, in_handler, false),
            Expr::Make { args, .. } => {
                for arg in args {
                    self.walk_expr(arg, in_handler, false);
                }
            }
            Expr::ErrorNew { message, .. } | Expr::Panic { message, .. } => {
                self.walk_expr(message, in_handler, false);
            }
            Expr::Close { channel, .. } => self.walk_expr(channel, in_handler, false),
            _ => {}
        }
    }

    fn apply_rules(
        &mut self,
        qualified: &str,
        args: &[Arg],
        in_handler: bool,
        piped: bool,
        pos: crate::frontend::ast::Position,
    ) {
        if SQL_FUNCTIONS.contains(&qualified) {
            // db.Query(pool, "SELECT ...") — SQL at index 1, or 0 when the
            // pool is piped in.
            let index = if piped { 0 } else { 1 };
            if let Some(arg) = args.get(index) {
                if arg.value.is_interpolated() {
                    self.errors.push(
                        Diagnostic::policy(
                            format!(
                                "SQL injection risk: string interpolation in {qualified} query"
                            ),
                            arg.value.pos(),
                        )
                        .with_hint(
                            "use parameter placeholders ($1, $2, ...) instead of interpolation",
                        ),
                    );
                }
            }
        }

        if qualified == "web.HTML" {
            let index = if piped { 0 } else { 1 };
            if let Some(arg) = args.get(index) {
                if !arg.value.is_literal() {
                    self.errors.push(
                        Diagnostic::policy(
                            format!("XSS risk: {qualified} with non-literal content"),
                            pos,
                        )
                        .with_hint("use web.SafeHTML to HTML-escape user-controlled content"),
                    );
                }
            }
        }

        if FETCH_FUNCTIONS.contains(&qualified) && in_handler {
            self.errors.push(
                Diagnostic::policy(
                    format!("SSRF risk: {qualified} inside an HTTP handler"),
                    pos,
                )
                .with_hint("use fetch.SafeGet to restrict outbound requests"),
            );
        }

        if FILES_FUNCTIONS.contains(&qualified) && in_handler {
            self.errors.push(
                Diagnostic::policy(
                    format!("path traversal risk: {qualified} inside an HTTP handler"),
                    pos,
                )
                .with_hint("use sandbox.* with a restricted root for user-controlled paths"),
            );
        }

        if qualified == "shell.Run" && !piped {
            // A piped command's origin cannot be verified here; skip it.
            if let Some(arg) = args.first() {
                if !arg.value.is_literal() {
                    self.errors.push(
                        Diagnostic::policy(
                            "command injection risk: shell.Run with a non-literal argument",
                            pos,
                        )
                        .with_hint(
                            "shell.Run splits on whitespace without quoting; \
                             use shell.Output with separate arguments for variable input",
                        ),
                    );
                }
            }
        }

        if REDIRECT_FUNCTIONS.contains(&qualified)
            && !self.options.source_path.contains("stdlib/")
        {
            // web.Redirect(w, r, url) — URL at index 2, or 1 when piped.
            let index = if piped { 1 } else { 2 };
            if let Some(arg) = args.get(index) {
                if !arg.value.is_literal() {
                    self.errors.push(
                        Diagnostic::policy(
                            format!("open redirect risk: {qualified} with a non-literal URL"),
                            pos,
                        )
                        .with_hint("use web.SafeRedirect with an allowed-host list"),
                    );
                }
            }
        }
    }
}

fn is_response_writer(ty: &TypeExpr) -> bool {
    match ty {
        TypeExpr::Named { name, .. } => name == "web.ResponseWriter",
        TypeExpr::Reference { elem, .. } => is_response_writer(elem),
        _ => false,
    }
}
