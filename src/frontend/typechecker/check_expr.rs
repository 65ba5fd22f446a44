//! Pass 4, expression side: type inference and call checking.

use super::Checker;
use crate::frontend::ast::{
    Arg, BinaryOp, Expr, ExprId, PipeStrategy, Position, StrPart, UnaryOp,
};
use crate::frontend::diagnostics::Diagnostic;
use crate::frontend::symbols::TypeInfo;

/// Builtins available without import. `append` returns its first argument's
/// type; `len` returns int; the rest are opaque.
const BUILTINS: &[&str] = &["print", "len", "append", "cap", "copy", "delete", "min", "max"];

impl<'a> Checker<'a> {
    pub(super) fn check_expr(&mut self, expr: &Expr) -> TypeInfo {
        match expr {
            Expr::Int { .. } => TypeInfo::Primitive("int".to_string()),
            Expr::Float { .. } => TypeInfo::Primitive("float".to_string()),
            Expr::Bool { .. } => TypeInfo::Primitive("bool".to_string()),
            Expr::Str { parts, .. } => {
                for part in parts {
                    if let StrPart::Expr(e) = part {
                        self.check_expr(e);
                    }
                }
                TypeInfo::Primitive("string".to_string())
            }
            Expr::Ident { name, pos } => self.check_ident(name, *pos),
            Expr::This { pos } => match self.scopes.lookup("this") {
                Some(sym) => sym.ty.clone(),
                None => {
                    self.error(Diagnostic::type_error(
                        "'this' is only valid inside a method body",
                        *pos,
                    ));
                    TypeInfo::Unknown
                }
            },
            Expr::Placeholder { pos } => {
                if !self.in_pipe_rhs {
                    self.error(Diagnostic::type_error(
                        "'_' placeholder is only valid inside a piped call",
                        *pos,
                    ));
                }
                TypeInfo::Unknown
            }
            Expr::Binary {
                op,
                left,
                right,
                pos,
            } => self.check_binary(*op, left, right, *pos),
            Expr::Unary { op, operand, pos } => {
                let ty = self.check_expr(operand);
                match op {
                    UnaryOp::Not => {
                        self.expect_bool(&ty, *pos);
                        TypeInfo::Primitive("bool".to_string())
                    }
                    UnaryOp::Neg => {
                        if !is_numeric(&ty) {
                            self.error(Diagnostic::type_error(
                                format!("cannot negate a value of type {}", ty.describe()),
                                *pos,
                            ));
                        }
                        ty
                    }
                }
            }
            Expr::Pipe {
                id,
                strategy,
                left,
                right,
                ..
            } => self.check_pipe(*id, *strategy, left, right),
            Expr::Call {
                id,
                callee,
                args,
                pos,
            } => self.check_call(*id, callee, args, *pos),
            Expr::MethodCall {
                id,
                receiver,
                method,
                args,
                pos,
            } => self.check_method_call(*id, receiver.as_deref(), method, args, *pos),
            Expr::Field { object, name, pos } => self.check_field(object, name, *pos),
            Expr::Index { object, index, pos } => self.check_index(object, index, *pos),
            Expr::Slice {
                object, start, end, ..
            } => {
                let ty = self.check_expr(object);
                if let Some(start) = start {
                    self.check_expr(start);
                }
                if let Some(end) = end {
                    self.check_expr(end);
                }
                match ty {
                    TypeInfo::List(_) | TypeInfo::Primitive(_) | TypeInfo::Unknown => ty,
                    other => {
                        self.error(Diagnostic::type_error(
                            format!("cannot slice a value of type {}", other.describe()),
                            object.pos(),
                        ));
                        TypeInfo::Unknown
                    }
                }
            }
            Expr::StructLit { name, fields, pos } => self.check_struct_lit(name, fields, *pos),
            Expr::ListLit {
                elem_ty, elements, ..
            } => {
                let declared = elem_ty.as_ref().map(TypeInfo::from_expr);
                let mut inferred = declared.clone().unwrap_or(TypeInfo::Unknown);
                for element in elements {
                    let ty = self.check_expr(element);
                    if inferred.is_unknown() {
                        inferred = ty;
                    } else if !ty.compatible_with(&inferred) {
                        self.error(Diagnostic::type_error(
                            format!(
                                "list element type mismatch: expected {}, got {}",
                                inferred.describe(),
                                ty.describe()
                            ),
                            element.pos(),
                        ));
                    }
                }
                TypeInfo::List(Box::new(inferred))
            }
            Expr::MapLit {
                key_ty,
                value_ty,
                entries,
                ..
            } => {
                let key = TypeInfo::from_expr(key_ty);
                let value = TypeInfo::from_expr(value_ty);
                for (k, v) in entries {
                    let kt = self.check_expr(k);
                    let vt = self.check_expr(v);
                    if !kt.compatible_with(&key) {
                        self.error(Diagnostic::type_error(
                            format!(
                                "map key type mismatch: expected {}, got {}",
                                key.describe(),
                                kt.describe()
                            ),
                            k.pos(),
                        ));
                    }
                    if !vt.compatible_with(&value) {
                        self.error(Diagnostic::type_error(
                            format!(
                                "map value type mismatch: expected {}, got {}",
                                value.describe(),
                                vt.describe()
                            ),
                            v.pos(),
                        ));
                    }
                }
                TypeInfo::Map(Box::new(key), Box::new(value))
            }
            Expr::Receive { channel, pos } => match self.check_expr(channel) {
                TypeInfo::Channel(elem) => *elem,
                TypeInfo::Unknown => TypeInfo::Unknown,
                other => {
                    self.error(Diagnostic::type_error(
                        format!("cannot receive from a value of type {}", other.describe()),
                        *pos,
                    ));
                    TypeInfo::Unknown
                }
            },
            Expr::Cast { expr, ty, pos } => {
                let source = self.check_expr(expr);
                self.validate_type_expr(ty);
                let target = TypeInfo::from_expr(ty);
                // Assertion to an interface type gets a structural
                // conformance check when the source type is known.
                if let (TypeInfo::Named(src), TypeInfo::Named(dst)) = (&source, &target) {
                    if self.interfaces.contains_key(dst) {
                        if let Err(message) = self.conforms(src, dst) {
                            self.error(Diagnostic::type_error(message, *pos));
                        }
                    }
                }
                target
            }
            Expr::Make { ty, args, pos } => {
                for arg in args {
                    self.check_expr(arg);
                }
                self.validate_type_expr(ty);
                let target = TypeInfo::from_expr(ty);
                match target {
                    TypeInfo::List(_) | TypeInfo::Map(_, _) | TypeInfo::Channel(_) => target,
                    other => {
                        self.error(Diagnostic::type_error(
                            format!("'make' requires a list, map, or channel type, got {}", other.describe()),
                            *pos,
                        ));
                        TypeInfo::Unknown
                    }
                }
            }
            Expr::Empty { ty, .. } => match ty {
                Some(ty) => {
                    self.validate_type_expr(ty);
                    TypeInfo::from_expr(ty)
                }
                None => TypeInfo::Unknown,
            },
            Expr::ErrorNew { message, pos } => {
                let ty = self.check_expr(message);
                if !ty.compatible_with(&TypeInfo::Primitive("string".to_string())) {
                    self.error(Diagnostic::type_error(
                        format!("error message must be a string, got {}", ty.describe()),
                        *pos,
                    ));
                }
                TypeInfo::Primitive("error".to_string())
            }
            Expr::Panic { message, .. } => {
                self.check_expr(message);
                TypeInfo::Tuple(Vec::new())
            }
            Expr::Recover { .. } => TypeInfo::Unknown,
            Expr::Close { channel, pos } => {
                let ty = self.check_expr(channel);
                if !matches!(ty, TypeInfo::Channel(_) | TypeInfo::Unknown) {
                    self.error(Diagnostic::type_error(
                        format!("cannot close a value of type {}", ty.describe()),
                        *pos,
                    ));
                }
                TypeInfo::Tuple(Vec::new())
            }
        }
    }

    fn check_ident(&mut self, name: &str, pos: Position) -> TypeInfo {
        if let Some(sym) = self.scopes.lookup(name) {
            return sym.ty.clone();
        }
        if name == "error" {
            if self.onerr_alias_active {
                self.error(Diagnostic::onerr(
                    "the caught error is bound to a named alias; use the alias instead of 'error'",
                    pos,
                ));
            } else {
                self.error(Diagnostic::onerr(
                    "'error' is only bound inside an onerr handler",
                    pos,
                ));
            }
            return TypeInfo::Primitive("error".to_string());
        }
        if let Some(info) = self.functions.get(name) {
            return TypeInfo::Function {
                params: info.param_types.clone(),
                returns: info.returns.clone(),
            };
        }
        if self.packages.contains(name) || BUILTINS.contains(&name) {
            return TypeInfo::Unknown;
        }
        self.error(Diagnostic::type_error(
            format!("undefined identifier '{name}'"),
            pos,
        ));
        TypeInfo::Unknown
    }

    fn check_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr, pos: Position) -> TypeInfo {
        let lt = self.check_expr(left);
        let rt = self.check_expr(right);
        match op {
            BinaryOp::Add => {
                let string = TypeInfo::Primitive("string".to_string());
                if lt.compatible_with(&string) && rt.compatible_with(&string) {
                    return pick_known(lt, rt);
                }
                self.expect_numeric_pair(&lt, &rt, "+", pos)
            }
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                self.expect_numeric_pair(&lt, &rt, op_text(op), pos)
            }
            BinaryOp::Eq | BinaryOp::Ne => {
                if !lt.compatible_with(&rt) {
                    self.error(Diagnostic::type_error(
                        format!(
                            "cannot compare {} with {}",
                            lt.describe(),
                            rt.describe()
                        ),
                        pos,
                    ));
                }
                TypeInfo::Primitive("bool".to_string())
            }
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => {
                if !lt.compatible_with(&rt) {
                    self.error(Diagnostic::type_error(
                        format!("cannot order {} against {}", lt.describe(), rt.describe()),
                        pos,
                    ));
                }
                TypeInfo::Primitive("bool".to_string())
            }
            BinaryOp::And | BinaryOp::Or => {
                self.expect_bool(&lt, left.pos());
                self.expect_bool(&rt, right.pos());
                TypeInfo::Primitive("bool".to_string())
            }
            BinaryOp::In | BinaryOp::NotIn => {
                match &rt {
                    TypeInfo::List(elem) => {
                        if !lt.compatible_with(elem) {
                            self.error(Diagnostic::type_error(
                                format!(
                                    "cannot test {} membership in {}",
                                    lt.describe(),
                                    rt.describe()
                                ),
                                pos,
                            ));
                        }
                    }
                    TypeInfo::Unknown => {}
                    other => {
                        self.error(Diagnostic::type_error(
                            format!("'in' requires a list, got {}", other.describe()),
                            pos,
                        ));
                    }
                }
                TypeInfo::Primitive("bool".to_string())
            }
        }
    }

    fn check_pipe(
        &mut self,
        id: ExprId,
        strategy: PipeStrategy,
        left: &Expr,
        right: &Expr,
    ) -> TypeInfo {
        self.check_expr(left);

        let saved_rhs = self.in_pipe_rhs;
        let saved_injects = self.pipe_injects_arg;
        self.in_pipe_rhs = true;
        self.pipe_injects_arg = matches!(
            strategy,
            PipeStrategy::ContextFirst | PipeStrategy::DataFirst
        );
        let result = self.check_expr(right);
        self.in_pipe_rhs = saved_rhs;
        self.pipe_injects_arg = saved_injects;

        // Chained pipes need the effective call's return count on the pipe
        // node itself.
        if let Some(count) = self.expr_return_count(right) {
            self.return_counts.insert(id, count);
        }
        result
    }

    fn expr_return_count(&self, expr: &Expr) -> Option<usize> {
        match expr {
            Expr::Call { id, .. } | Expr::MethodCall { id, .. } | Expr::Pipe { id, .. } => {
                self.return_counts.get(id).copied()
            }
            _ => None,
        }
    }

    fn check_call(&mut self, id: ExprId, callee: &Expr, args: &[Arg], pos: Position) -> TypeInfo {
        let injected = std::mem::take(&mut self.pipe_injects_arg);

        if let Expr::Ident { name, .. } = callee {
            if self.scopes.lookup(name).is_none() {
                if let Some(ty) = self.check_builtin_call(name, args, pos) {
                    return ty;
                }
                if let Some(info) = self.functions.get(name).cloned() {
                    self.check_args_against(&info, args, injected, pos);
                    self.return_counts.insert(id, info.returns.len());
                    return returns_type(&info.returns);
                }
                self.error(Diagnostic::type_error(
                    format!("undefined function '{name}'"),
                    pos,
                ));
                for arg in args {
                    self.check_expr(&arg.value);
                }
                return TypeInfo::Unknown;
            }
        }

        // Calling a function-typed value.
        let callee_ty = self.check_expr(callee);
        for arg in args {
            self.check_expr(&arg.value);
        }
        match callee_ty {
            TypeInfo::Function { params, returns } => {
                let provided = args.len() + usize::from(injected);
                if provided != params.len() {
                    self.error(Diagnostic::type_error(
                        format!(
                            "wrong number of arguments: expected {}, got {provided}",
                            params.len()
                        ),
                        pos,
                    ));
                }
                self.return_counts.insert(id, returns.len());
                returns_type(&returns)
            }
            TypeInfo::Unknown => TypeInfo::Unknown,
            other => {
                self.error(Diagnostic::type_error(
                    format!("cannot call a value of type {}", other.describe()),
                    pos,
                ));
                TypeInfo::Unknown
            }
        }
    }

    fn check_builtin_call(&mut self, name: &str, args: &[Arg], pos: Position) -> Option<TypeInfo> {
        if !BUILTINS.contains(&name) {
            return None;
        }
        let mut arg_types = Vec::with_capacity(args.len());
        for arg in args {
            if arg.name.is_some() {
                self.error(Diagnostic::type_error(
                    format!("builtin '{name}' does not take named arguments"),
                    pos,
                ));
            }
            arg_types.push(self.check_expr(&arg.value));
        }
        let ty = match name {
            "len" | "cap" => TypeInfo::Primitive("int".to_string()),
            "append" => arg_types.first().cloned().unwrap_or(TypeInfo::Unknown),
            "print" | "delete" | "copy" => TypeInfo::Tuple(Vec::new()),
            _ => TypeInfo::Unknown,
        };
        Some(ty)
    }

    fn check_method_call(
        &mut self,
        id: ExprId,
        receiver: Option<&Expr>,
        method: &str,
        args: &[Arg],
        pos: Position,
    ) -> TypeInfo {
        let injected = std::mem::take(&mut self.pipe_injects_arg);

        let Some(receiver) = receiver else {
            // Pipe shorthand `.M(args)`; the piped value becomes the
            // receiver, so nothing further can be resolved statically.
            if !self.in_pipe_rhs {
                self.error(Diagnostic::type_error(
                    "a leading-dot method call is only valid on the right of '|>'",
                    pos,
                ));
            }
            for arg in args {
                self.check_expr(&arg.value);
            }
            return TypeInfo::Unknown;
        };

        // Package function call: fetch.Get(url)
        if let Expr::Ident { name, .. } = receiver {
            if self.packages.contains(name) && self.scopes.lookup(name).is_none() {
                for arg in args {
                    self.check_expr(&arg.value);
                }
                return TypeInfo::Unknown;
            }
        }

        let receiver_ty = self.check_expr(receiver);
        let type_name = match &receiver_ty {
            TypeInfo::Named(name) => Some(name.clone()),
            TypeInfo::Reference(inner) => match inner.as_ref() {
                TypeInfo::Named(name) => Some(name.clone()),
                _ => None,
            },
            _ => None,
        };

        if let Some(type_name) = type_name {
            let key = format!("{type_name}.{method}");
            if let Some(info) = self.functions.get(&key).cloned() {
                self.check_args_against(&info, args, injected, pos);
                self.return_counts.insert(id, info.returns.len());
                return returns_type(&info.returns);
            }
            if self.types.contains_key(&type_name) {
                self.error(Diagnostic::type_error(
                    format!("type '{type_name}' has no method '{method}'"),
                    pos,
                ));
                return TypeInfo::Unknown;
            }
        }

        for arg in args {
            self.check_expr(&arg.value);
        }
        TypeInfo::Unknown
    }

    /// Arity, named-argument remapping, and per-position compatibility
    /// against a registered signature. `injected` accounts for a piped
    /// value prepended as the first argument.
    fn check_args_against(
        &mut self,
        info: &super::FunctionInfo,
        args: &[Arg],
        injected: bool,
        pos: Position,
    ) {
        let shift = usize::from(injected);
        let total = info.param_types.len();
        let mut filled = vec![false; total.max(args.len() + shift)];
        if injected && !filled.is_empty() {
            filled[0] = true;
        }
        let mut positional = shift;

        for arg in args {
            let ty = self.check_expr(&arg.value);
            let slot = match &arg.name {
                Some(name) => match info.param_names.iter().position(|p| p == name) {
                    Some(index) => index,
                    None => {
                        self.error(Diagnostic::type_error(
                            format!("no parameter named '{name}'"),
                            arg.value.pos(),
                        ));
                        continue;
                    }
                },
                None => {
                    let index = positional;
                    positional += 1;
                    index
                }
            };
            if slot >= total {
                self.error(Diagnostic::type_error(
                    format!("wrong number of arguments: expected at most {total}"),
                    pos,
                ));
                continue;
            }
            if filled[slot] && arg.name.is_some() {
                self.error(Diagnostic::type_error(
                    format!(
                        "argument '{}' specified more than once",
                        info.param_names[slot]
                    ),
                    arg.value.pos(),
                ));
                continue;
            }
            filled[slot] = true;
            let expected = &info.param_types[slot];
            let placeholder = matches!(arg.value, Expr::Placeholder { .. });
            // Interface-typed parameters take any type whose method set
            // conforms; everything else is structural compatibility.
            let interface_param = matches!(
                expected,
                TypeInfo::Named(want) if self.interfaces.contains_key(want)
            );
            if interface_param {
                if let (TypeInfo::Named(have), TypeInfo::Named(want)) = (&ty, expected) {
                    if self.types.contains_key(have) {
                        if let Err(message) = self.conforms(have, want) {
                            self.error(Diagnostic::type_error(message, arg.value.pos()));
                        }
                    }
                }
            } else if !placeholder && !ty.compatible_with(expected) {
                self.error(Diagnostic::type_error(
                    format!(
                        "argument type mismatch for '{}': expected {}, got {}",
                        info.param_names[slot],
                        expected.describe(),
                        ty.describe()
                    ),
                    arg.value.pos(),
                ));
            }
        }

        for (index, is_filled) in filled.iter().enumerate().take(total) {
            if !is_filled && info.defaults.get(index).map_or(true, |d| d.is_none()) {
                self.error(Diagnostic::type_error(
                    format!(
                        "missing argument for parameter '{}'",
                        info.param_names[index]
                    ),
                    pos,
                ));
            }
        }
    }

    fn check_field(&mut self, object: &Expr, name: &str, pos: Position) -> TypeInfo {
        // Package member access: pkg.Constant
        if let Expr::Ident { name: obj, .. } = object {
            if self.packages.contains(obj) && self.scopes.lookup(obj).is_none() {
                return TypeInfo::Unknown;
            }
        }

        let object_ty = self.check_expr(object);
        let type_name = match &object_ty {
            TypeInfo::Named(n) => Some(n.clone()),
            TypeInfo::Reference(inner) => match inner.as_ref() {
                TypeInfo::Named(n) => Some(n.clone()),
                _ => None,
            },
            _ => None,
        };
        if let Some(type_name) = type_name {
            if let Some(decl) = self.types.get(&type_name) {
                return match decl.fields.iter().find(|f| f.name == name) {
                    Some(field) => TypeInfo::from_expr(&field.ty),
                    None => {
                        self.error(Diagnostic::type_error(
                            format!("type '{type_name}' has no field '{name}'"),
                            pos,
                        ));
                        TypeInfo::Unknown
                    }
                };
            }
        }
        TypeInfo::Unknown
    }

    fn check_index(&mut self, object: &Expr, index: &Expr, pos: Position) -> TypeInfo {
        let object_ty = self.check_expr(object);
        let index_ty = self.check_expr(index);
        match object_ty {
            TypeInfo::List(elem) => {
                let int = TypeInfo::Primitive("int".to_string());
                if !index_ty.compatible_with(&int) {
                    self.error(Diagnostic::type_error(
                        format!("list index must be int, got {}", index_ty.describe()),
                        pos,
                    ));
                }
                *elem
            }
            TypeInfo::Map(key, value) => {
                if !index_ty.compatible_with(&key) {
                    self.error(Diagnostic::type_error(
                        format!(
                            "map key type mismatch: expected {}, got {}",
                            key.describe(),
                            index_ty.describe()
                        ),
                        pos,
                    ));
                }
                *value
            }
            TypeInfo::Primitive(name) if name == "string" => {
                TypeInfo::Primitive("byte".to_string())
            }
            TypeInfo::Unknown => TypeInfo::Unknown,
            other => {
                self.error(Diagnostic::type_error(
                    format!("cannot index a value of type {}", other.describe()),
                    pos,
                ));
                TypeInfo::Unknown
            }
        }
    }

    fn check_struct_lit(
        &mut self,
        name: &str,
        fields: &[crate::frontend::ast::FieldInit],
        pos: Position,
    ) -> TypeInfo {
        let Some(decl) = self.types.get(name) else {
            if name.contains('.') || self.packages.contains(name) {
                for field in fields {
                    self.check_expr(&field.value);
                }
                return TypeInfo::Named(name.to_string());
            }
            self.error(Diagnostic::type_error(
                format!("undefined type '{name}'"),
                pos,
            ));
            for field in fields {
                self.check_expr(&field.value);
            }
            return TypeInfo::Unknown;
        };

        let declared: Vec<(String, TypeInfo)> = decl
            .fields
            .iter()
            .map(|f| (f.name.clone(), TypeInfo::from_expr(&f.ty)))
            .collect();

        for field in fields {
            match declared.iter().find(|(n, _)| n == &field.name) {
                Some((field_name, expected)) => {
                    let ty = self.check_expr(&field.value);
                    if !ty.compatible_with(expected) {
                        self.error(Diagnostic::type_error(
                            format!(
                                "field '{field_name}' expects {}, got {}",
                                expected.describe(),
                                ty.describe()
                            ),
                            field.value.pos(),
                        ));
                    }
                }
                None => {
                    self.error(Diagnostic::type_error(
                        format!("type '{name}' has no field '{}'", field.name),
                        field.value.pos(),
                    ));
                    self.check_expr(&field.value);
                }
            }
        }
        TypeInfo::Named(name.to_string())
    }

    pub(super) fn expect_bool(&mut self, ty: &TypeInfo, pos: Position) {
        let bool_ty = TypeInfo::Primitive("bool".to_string());
        if !ty.compatible_with(&bool_ty) {
            self.error(Diagnostic::type_error(
                format!("expected bool, got {}", ty.describe()),
                pos,
            ));
        }
    }

    fn expect_numeric_pair(
        &mut self,
        lt: &TypeInfo,
        rt: &TypeInfo,
        op: &str,
        pos: Position,
    ) -> TypeInfo {
        if !is_numeric(lt) || !is_numeric(rt) {
            self.error(Diagnostic::type_error(
                format!(
                    "operator '{op}' requires numeric operands, got {} and {}",
                    lt.describe(),
                    rt.describe()
                ),
                pos,
            ));
            return TypeInfo::Unknown;
        }
        pick_known(lt.clone(), rt.clone())
    }
}

fn is_numeric(ty: &TypeInfo) -> bool {
    match ty {
        TypeInfo::Unknown => true,
        TypeInfo::Primitive(name) => matches!(
            name.as_str(),
            "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16"
                | "uint32" | "uint64" | "float" | "float32" | "float64" | "byte" | "rune"
                | "any"
        ),
        _ => false,
    }
}

fn pick_known(lt: TypeInfo, rt: TypeInfo) -> TypeInfo {
    if lt.is_unknown() {
        rt
    } else {
        lt
    }
}

fn op_text(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        _ => "?",
    }
}

fn returns_type(returns: &[TypeInfo]) -> TypeInfo {
    match returns {
        [] => TypeInfo::Tuple(Vec::new()),
        [single] => single.clone(),
        many => TypeInfo::Tuple(many.to_vec()),
    }
}
