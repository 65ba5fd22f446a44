//! Passes 1 and 2: type collection and signature registration.

use super::{Checker, FunctionInfo};
use crate::frontend::ast::{Declaration, Program, TypeExpr};
use crate::frontend::diagnostics::Diagnostic;
use crate::frontend::symbols::TypeInfo;

impl<'a> Checker<'a> {
    /// Register every named type and interface before anything is resolved,
    /// so declarations can reference each other in any order.
    pub(super) fn collect_types(&mut self, program: &'a Program) {
        for import in &program.imports {
            let name = import
                .alias
                .clone()
                .unwrap_or_else(|| last_path_segment(&import.path));
            self.packages.insert(name);
        }

        for decl in &program.declarations {
            match decl {
                Declaration::Type(t) => {
                    if self.types.contains_key(&t.name) || self.interfaces.contains_key(&t.name) {
                        self.error(Diagnostic::type_error(
                            format!("duplicate type declaration '{}'", t.name),
                            t.pos,
                        ));
                        continue;
                    }
                    self.types.insert(t.name.clone(), t);
                }
                Declaration::Interface(i) => {
                    if self.types.contains_key(&i.name) || self.interfaces.contains_key(&i.name) {
                        self.error(Diagnostic::type_error(
                            format!("duplicate type declaration '{}'", i.name),
                            i.pos,
                        ));
                        continue;
                    }
                    self.interfaces.insert(i.name.clone(), i);
                }
                Declaration::Function(_) => {}
            }
        }

        // Field types can now be validated against the full type set.
        for decl in &program.declarations {
            if let Declaration::Type(t) = decl {
                for field in &t.fields {
                    self.validate_type_expr(&field.ty);
                }
            }
        }
    }

    /// Register every function and method signature before checking any
    /// body, so mutually recursive functions resolve against each other.
    pub(super) fn register_signatures(&mut self, program: &'a Program) {
        for decl in &program.declarations {
            let Declaration::Function(f) = decl else {
                continue;
            };

            for param in &f.params {
                self.validate_type_expr(&param.ty);
            }
            for ret in &f.returns {
                self.validate_type_expr(ret);
            }

            let receiver = match &f.receiver {
                Some(recv) => {
                    self.validate_type_expr(&recv.ty);
                    Some(base_type_name(&recv.ty))
                }
                None => None,
            };

            let key = match &receiver {
                Some(recv_ty) => format!("{recv_ty}.{}", f.name),
                None => f.name.clone(),
            };
            if self.functions.contains_key(&key) {
                self.error(Diagnostic::type_error(
                    format!("duplicate function declaration '{key}'"),
                    f.pos,
                ));
                continue;
            }

            let info = FunctionInfo {
                param_names: f.params.iter().map(|p| p.name.clone()).collect(),
                param_types: f.params.iter().map(|p| TypeInfo::from_expr(&p.ty)).collect(),
                defaults: f.params.iter().map(|p| p.default.clone()).collect(),
                returns: f.returns.iter().map(TypeInfo::from_expr).collect(),
                receiver,
            };
            self.functions.insert(key, info);
        }
    }

    /// Report unresolved named types. Qualified names (`pkg.Type`) are
    /// accepted when the package is imported.
    pub(super) fn validate_type_expr(&mut self, ty: &TypeExpr) {
        match ty {
            TypeExpr::Primitive { .. } => {}
            TypeExpr::Named { name, pos } => {
                if let Some((pkg, _)) = name.split_once('.') {
                    if !self.packages.contains(pkg) {
                        self.error(Diagnostic::type_error(
                            format!("unknown package '{pkg}' in type '{name}'"),
                            *pos,
                        ));
                    }
                } else if !self.types.contains_key(name) && !self.interfaces.contains_key(name) {
                    self.error(Diagnostic::type_error(
                        format!("undefined type '{name}'"),
                        *pos,
                    ));
                }
            }
            TypeExpr::List { elem, .. }
            | TypeExpr::Channel { elem, .. }
            | TypeExpr::Reference { elem, .. } => self.validate_type_expr(elem),
            TypeExpr::Map { key, value, .. } => {
                self.validate_type_expr(key);
                self.validate_type_expr(value);
            }
            TypeExpr::Function { params, returns, .. } => {
                for p in params {
                    self.validate_type_expr(p);
                }
                for r in returns {
                    self.validate_type_expr(r);
                }
            }
        }
    }
}

fn last_path_segment(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

/// The type name a method set attaches to: `reference Counter` and
/// `Counter` both contribute methods to `Counter`.
pub(super) fn base_type_name(ty: &TypeExpr) -> String {
    match ty {
        TypeExpr::Reference { elem, .. } => base_type_name(elem),
        TypeExpr::Named { name, .. } | TypeExpr::Primitive { name, .. } => name.clone(),
        // A receiver is always a (possibly referenced) named type.
        _ => String::new(),
    }
}
