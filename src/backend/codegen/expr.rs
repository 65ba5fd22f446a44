//! Expression rendering.
//!
//! Every expression renders to a self-contained Go fragment. Binary
//! expressions are always parenthesized so nesting never needs precedence
//! bookkeeping; gofmt strips the redundant pairs downstream.

use crate::frontend::ast::{
    Arg, BinaryOp, Expr, ExprId, PipeStrategy, StrPart, TypeExpr, UnaryOp,
};
use crate::frontend::typechecker::FunctionInfo;

use super::Generator;

impl Generator<'_> {
    pub(super) fn gen_expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Int { value, .. } => value.to_string(),
            Expr::Float { value, .. } => {
                let rendered = value.to_string();
                // Keep float literals float-typed in Go.
                if rendered.contains('.') || rendered.contains('e') {
                    rendered
                } else {
                    format!("{rendered}.0")
                }
            }
            Expr::Str { parts, .. } => self.gen_string(parts),
            Expr::Bool { value, .. } => value.to_string(),
            Expr::Ident { name, .. } => self.gen_ident(name),
            Expr::This { .. } => self
                .current_receiver
                .clone()
                .unwrap_or_else(|| "this".to_string()),
            Expr::Placeholder { .. } => {
                // Only reachable through pipe substitution.
                "_".to_string()
            }
            Expr::Binary {
                op, left, right, ..
            } => self.gen_binary(*op, left, right),
            Expr::Unary { op, operand, .. } => {
                let operand = self.gen_expr(operand);
                match op {
                    UnaryOp::Not => format!("!{operand}"),
                    UnaryOp::Neg => format!("-{operand}"),
                }
            }
            Expr::Pipe {
                strategy,
                left,
                right,
                ..
            } => self.gen_pipe(*strategy, left, right),
            Expr::Call { callee, args, .. } => self.gen_call(callee, args, None),
            Expr::MethodCall {
                receiver,
                method,
                args,
                ..
            } => self.gen_method_call(receiver.as_deref(), method, args, None),
            Expr::Field { object, name, .. } => {
                format!("{}.{name}", self.gen_expr(object))
            }
            Expr::Index { object, index, .. } => self.gen_index(object, index),
            Expr::Slice {
                object, start, end, ..
            } => {
                let object = self.gen_expr(object);
                let start = start.as_deref().map(|e| self.gen_expr(e)).unwrap_or_default();
                let end = end.as_deref().map(|e| self.gen_expr(e)).unwrap_or_default();
                format!("{object}[{start}:{end}]")
            }
            Expr::StructLit { name, fields, .. } => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|f| format!("{}: {}", f.name, self.gen_expr(&f.value)))
                    .collect();
                format!("{name}{{{}}}", fields.join(", "))
            }
            Expr::ListLit {
                elem_ty, elements, ..
            } => {
                let prefix = match elem_ty {
                    Some(ty) => format!("[]{}", self.go_type(ty)),
                    None => "[]any".to_string(),
                };
                let elements: Vec<String> =
                    elements.iter().map(|e| self.gen_expr(e)).collect();
                format!("{prefix}{{{}}}", elements.join(", "))
            }
            Expr::MapLit {
                key_ty,
                value_ty,
                entries,
                ..
            } => {
                let prefix = format!(
                    "map[{}]{}",
                    self.go_type(key_ty),
                    self.go_type(value_ty)
                );
                let entries: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", self.gen_expr(k), self.gen_expr(v)))
                    .collect();
                format!("{prefix}{{{}}}", entries.join(", "))
            }
            Expr::Receive { channel, .. } => format!("<-{}", self.gen_expr(channel)),
            Expr::Cast { expr, ty, .. } => self.gen_cast(expr, ty),
            Expr::Make { ty, args, .. } => {
                let target = self.go_type(ty);
                if args.is_empty() {
                    // Slices need an explicit length.
                    if target.starts_with("[]") {
                        format!("make({target}, 0)")
                    } else {
                        format!("make({target})")
                    }
                } else {
                    let args: Vec<String> = args.iter().map(|a| self.gen_expr(a)).collect();
                    format!("make({target}, {})", args.join(", "))
                }
            }
            Expr::Empty { ty, .. } => match ty {
                Some(ty) => self.zero_value(ty),
                None => "nil".to_string(),
            },
            Expr::ErrorNew { message, .. } => self.gen_error_new(message),
            Expr::Panic { message, .. } => format!("panic({})", self.gen_expr(message)),
            Expr::Recover { .. } => "recover()".to_string(),
            Expr::Close { channel, .. } => format!("close({})", self.gen_expr(channel)),
        }
    }

    fn gen_ident(&self, name: &str) -> String {
        if let Some((source, target)) = &self.error_binding {
            if name == source {
                return target.clone();
            }
        }
        name.to_string()
    }

    fn gen_binary(&self, op: BinaryOp, left: &Expr, right: &Expr) -> String {
        let left = self.gen_expr(left);
        let right = self.gen_expr(right);
        match op {
            BinaryOp::In => format!("slices.Contains({right}, {left})"),
            BinaryOp::NotIn => format!("!slices.Contains({right}, {left})"),
            _ => {
                let op = match op {
                    BinaryOp::Add => "+",
                    BinaryOp::Sub => "-",
                    BinaryOp::Mul => "*",
                    BinaryOp::Div => "/",
                    BinaryOp::Mod => "%",
                    BinaryOp::Eq => "==",
                    BinaryOp::Ne => "!=",
                    BinaryOp::Lt => "<",
                    BinaryOp::Gt => ">",
                    BinaryOp::Le => "<=",
                    BinaryOp::Ge => ">=",
                    BinaryOp::And => "&&",
                    BinaryOp::Or => "||",
                    BinaryOp::In | BinaryOp::NotIn => unreachable!(),
                };
                format!("({left} {op} {right})")
            }
        }
    }

    // ========================================================================
    // Strings
    // ========================================================================

    fn gen_string(&self, parts: &[StrPart]) -> String {
        if !parts.iter().any(|p| matches!(p, StrPart::Expr(_))) {
            let literal: String = parts
                .iter()
                .map(|p| match p {
                    StrPart::Literal(text) => go_escape(text),
                    StrPart::Expr(_) => String::new(),
                })
                .collect();
            return format!("\"{literal}\"");
        }
        let (format_str, args) = self.interpolation_parts(parts);
        format!("fmt.Sprintf(\"{format_str}\", {})", args.join(", "))
    }

    /// `%v` format string plus rendered segment expressions.
    pub(super) fn interpolation_parts(&self, parts: &[StrPart]) -> (String, Vec<String>) {
        let mut format_str = String::new();
        let mut args = Vec::new();
        for part in parts {
            match part {
                // `%` doubles so escaped text embeds safely in the format.
                StrPart::Literal(text) => {
                    format_str.push_str(&go_escape(text).replace('%', "%%"))
                }
                StrPart::Expr(expr) => {
                    format_str.push_str("%v");
                    args.push(self.gen_expr(expr));
                }
            }
        }
        (format_str, args)
    }

    fn gen_error_new(&self, message: &Expr) -> String {
        if let Expr::Str { parts, .. } = message {
            if message.is_interpolated() {
                let (format_str, args) = self.interpolation_parts(parts);
                return format!("fmt.Errorf(\"{format_str}\", {})", args.join(", "));
            }
            return format!("errors.New({})", self.gen_string(parts));
        }
        format!("errors.New({})", self.gen_expr(message))
    }

    // ========================================================================
    // Calls
    // ========================================================================

    /// `injected` is the already-rendered piped value to prepend, when a
    /// context-first or data-first pipe feeds this call.
    fn gen_call(&self, callee: &Expr, args: &[Arg], injected: Option<String>) -> String {
        if let Expr::Ident { name, .. } = callee {
            if name == "print" {
                return self.gen_print(args, injected);
            }
            if let Some(info) = self.analysis.functions.get(name) {
                if info.receiver.is_none() {
                    let args = self.fill_call_args(info, args, injected);
                    return format!("{name}({})", args.join(", "));
                }
            }
        }
        let callee = self.gen_expr(callee);
        let mut rendered: Vec<String> = Vec::new();
        if let Some(injected) = injected {
            rendered.push(injected);
        }
        rendered.extend(args.iter().map(|a| self.gen_expr(&a.value)));
        format!("{callee}({})", rendered.join(", "))
    }

    fn gen_method_call(
        &self,
        receiver: Option<&Expr>,
        method: &str,
        args: &[Arg],
        injected: Option<String>,
    ) -> String {
        let target = match receiver {
            Some(receiver) => self.gen_expr(receiver),
            None => {
                // Shorthand receivers are filled in by pipe lowering before
                // this point on validated trees.
                debug_assert!(false, "shorthand method call outside a pipe");
                String::new()
            }
        };
        if let Some(info) = self.method_info(method, args.len()) {
            let args = self.fill_call_args(info, args, injected);
            return format!("{target}.{method}({})", args.join(", "));
        }
        let mut rendered: Vec<String> = Vec::new();
        if let Some(injected) = injected {
            rendered.push(injected);
        }
        rendered.extend(args.iter().map(|a| self.gen_expr(&a.value)));
        format!("{target}.{method}({})", rendered.join(", "))
    }

    /// Unique registered method matching `name`, for default-argument fill.
    /// Ambiguous names fall back to positional rendering.
    fn method_info(&self, name: &str, _arg_count: usize) -> Option<&FunctionInfo> {
        let suffix = format!(".{name}");
        let mut found = None;
        for (key, info) in &self.analysis.functions {
            if info.receiver.is_some() && key.ends_with(&suffix) {
                if found.is_some() {
                    return None;
                }
                found = Some(info);
            }
        }
        found
    }

    fn gen_print(&self, args: &[Arg], injected: Option<String>) -> String {
        let mut rendered: Vec<String> = Vec::new();
        if self.options.protocol_output {
            rendered.push("os.Stderr".to_string());
        }
        if let Some(injected) = injected {
            rendered.push(injected);
        }
        rendered.extend(args.iter().map(|a| self.gen_expr(&a.value)));
        if self.options.protocol_output {
            format!("fmt.Fprintln({})", rendered.join(", "))
        } else {
            format!("fmt.Println({})", rendered.join(", "))
        }
    }

    /// Positional argument list for a registered signature: named arguments
    /// are remapped to their declared slot and omitted trailing parameters
    /// take their default expressions.
    fn fill_call_args(
        &self,
        info: &FunctionInfo,
        args: &[Arg],
        injected: Option<String>,
    ) -> Vec<String> {
        let mut slots: Vec<Option<String>> = vec![None; info.param_names.len()];
        let mut next = 0;
        if let Some(injected) = injected {
            if !slots.is_empty() {
                slots[0] = Some(injected);
                next = 1;
            }
        }
        for arg in args {
            match &arg.name {
                Some(name) => {
                    if let Some(i) = info.param_names.iter().position(|p| p == name) {
                        slots[i] = Some(self.gen_expr(&arg.value));
                    }
                }
                None => {
                    if next < slots.len() {
                        slots[next] = Some(self.gen_expr(&arg.value));
                        next += 1;
                    }
                }
            }
        }
        slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| match slot {
                Some(rendered) => rendered,
                None => match info.defaults.get(i).and_then(|d| d.as_ref()) {
                    Some(default) => self.gen_expr(default),
                    None => {
                        debug_assert!(false, "missing argument without default");
                        "nil".to_string()
                    }
                },
            })
            .collect()
    }

    // ========================================================================
    // Pipes
    // ========================================================================

    fn gen_pipe(&self, strategy: PipeStrategy, left: &Expr, right: &Expr) -> String {
        let mut piped = self.gen_expr(left);
        if let Some(count) = expr_id(left).and_then(|id| self.analysis.return_counts.get(&id)) {
            if *count >= 2 {
                // Keep only the first value of a multi-return producer.
                let blanks = vec!["_"; count - 1].join(", ");
                piped = format!("func() any {{ val, {blanks} := {piped}; return val }}()");
            }
        }

        match strategy {
            PipeStrategy::Placeholder => match right {
                Expr::Call { callee, args, .. } => {
                    let callee = match &**callee {
                        Expr::Ident { name, .. } if name == "print" => {
                            return self.gen_print(&substitute_placeholder(args, &piped), None)
                        }
                        other => self.gen_expr(other),
                    };
                    let args = substitute_placeholder(args, &piped);
                    let rendered: Vec<String> =
                        args.iter().map(|a| self.gen_expr(&a.value)).collect();
                    format!("{callee}({})", rendered.join(", "))
                }
                Expr::MethodCall {
                    receiver: Some(receiver),
                    method,
                    args,
                    ..
                } => {
                    let args = substitute_placeholder(args, &piped);
                    self.gen_method_call(Some(receiver), method, &args, None)
                }
                _ => {
                    debug_assert!(false, "placeholder pipe without a call target");
                    piped
                }
            },
            PipeStrategy::Method => match right {
                Expr::MethodCall { method, args, .. } => {
                    let rendered: Vec<String> =
                        args.iter().map(|a| self.gen_expr(&a.value)).collect();
                    format!("{piped}.{method}({})", rendered.join(", "))
                }
                _ => {
                    debug_assert!(false, "method pipe without a shorthand target");
                    piped
                }
            },
            PipeStrategy::ContextFirst | PipeStrategy::DataFirst => match right {
                Expr::Call { callee, args, .. } => self.gen_call(callee, args, Some(piped)),
                Expr::MethodCall {
                    receiver: Some(receiver),
                    method,
                    args,
                    ..
                } => self.gen_method_call(Some(receiver), method, args, Some(piped)),
                Expr::Ident { name, .. } => {
                    if name == "print" {
                        self.gen_print(&[], Some(piped))
                    } else {
                        format!("{name}({piped})")
                    }
                }
                _ => {
                    debug_assert!(false, "pipe into a non-call expression");
                    piped
                }
            },
        }
    }

    // ========================================================================
    // Index and cast
    // ========================================================================

    fn gen_index(&self, object: &Expr, index: &Expr) -> String {
        let rendered = self.gen_expr(object);
        if let Some(k) = negative_literal(index) {
            return format!("{rendered}[len({rendered})-{k}]");
        }
        format!("{rendered}[{}]", self.gen_expr(index))
    }

    fn gen_cast(&self, expr: &Expr, ty: &TypeExpr) -> String {
        let value = self.gen_expr(expr);
        let conversion = match ty {
            TypeExpr::Primitive { name, .. } => name != "error",
            TypeExpr::List { elem, .. } => {
                matches!(&**elem, TypeExpr::Primitive { name, .. } if name != "error")
            }
            _ => false,
        };
        let target = self.go_type(ty);
        if conversion {
            format!("{target}({value})")
        } else {
            format!("{value}.({target})")
        }
    }
}

/// Magnitude of a negative integer literal, spelled either way.
fn negative_literal(index: &Expr) -> Option<i64> {
    match index {
        Expr::Int { value, .. } if *value < 0 => Some(-value),
        Expr::Unary {
            op: UnaryOp::Neg,
            operand,
            ..
        } => match &**operand {
            Expr::Int { value, .. } if *value > 0 => Some(*value),
            _ => None,
        },
        _ => None,
    }
}

fn substitute_placeholder(args: &[Arg], piped: &str) -> Vec<Arg> {
    args.iter()
        .map(|arg| match &arg.value {
            Expr::Placeholder { pos } => Arg {
                name: arg.name.clone(),
                value: Expr::Ident {
                    name: piped.to_string(),
                    pos: *pos,
                },
            },
            _ => arg.clone(),
        })
        .collect()
}

fn expr_id(expr: &Expr) -> Option<ExprId> {
    match expr {
        Expr::Call { id, .. } | Expr::MethodCall { id, .. } | Expr::Pipe { id, .. } => Some(*id),
        _ => None,
    }
}

// Go string escaping for double-quoted literals.
fn go_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}
