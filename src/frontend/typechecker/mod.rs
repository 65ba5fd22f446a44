//! Semantic analysis for Frond
//!
//! Five passes over the parsed tree, in fixed order:
//!
//! 1. type collection (names first, so forward references resolve)
//! 2. signature registration (before any body, enabling mutual recursion)
//! 3. interface conformance (structural, at use sites)
//! 4. body checking (scope-stack walk with local inference for `:=`)
//! 5. security policy checks
//!
//! Every diagnostic from this phase is fatal: code generation never runs on
//! a partially valid tree. The AST is never mutated; annotations codegen
//! needs are collected into the [`Analysis`] side table.

mod check_expr;
mod check_stmt;
mod collect;
mod onerr;
mod security;

use std::collections::{HashMap, HashSet};

use crate::frontend::ast::{Expr, ExprId, InterfaceDecl, Program, TypeDecl};
use crate::frontend::diagnostics::Diagnostic;
use crate::frontend::symbols::{ScopeStack, TypeInfo};
use crate::Options;

/// Side-table output of semantic analysis. The AST stays immutable; codegen
/// reads annotations from here by [`ExprId`].
#[derive(Debug, Default)]
pub struct Analysis {
    /// Declared return count for call-shaped expressions whose callee the
    /// checker resolved. Missing entries mean "assume one value".
    pub return_counts: HashMap<ExprId, usize>,
    /// Registered signatures, keyed by function name (methods as
    /// `Type.Method`). Codegen uses the default-parameter tables to fill
    /// omitted trailing arguments.
    pub functions: HashMap<String, FunctionInfo>,
}

#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub param_names: Vec<String>,
    pub param_types: Vec<TypeInfo>,
    pub defaults: Vec<Option<Expr>>,
    pub returns: Vec<TypeInfo>,
    /// Receiver type name for methods.
    pub receiver: Option<String>,
}

impl FunctionInfo {
    pub fn required_params(&self) -> usize {
        self.defaults.iter().filter(|d| d.is_none()).count()
    }

    pub fn returns_trailing_error(&self) -> bool {
        self.returns.last().is_some_and(TypeInfo::is_error)
    }
}

/// Run all semantic passes over a parsed program.
#[tracing::instrument(skip_all, fields(declarations = program.declarations.len()))]
pub fn analyze(program: &Program, options: &Options) -> Result<Analysis, Vec<Diagnostic>> {
    let mut checker = Checker::new(options);

    checker.collect_types(program);
    checker.register_signatures(program);
    if checker.errors.is_empty() {
        checker.check_bodies(program);
    }
    security::check(program, options, &mut checker.errors);

    if checker.errors.is_empty() {
        Ok(Analysis {
            return_counts: checker.return_counts,
            functions: checker.functions,
        })
    } else {
        Err(checker.errors)
    }
}

pub(super) struct Checker<'a> {
    options: &'a Options,
    /// Declared struct types by name.
    types: HashMap<String, &'a TypeDecl>,
    /// Declared interfaces by name.
    interfaces: HashMap<String, &'a InterfaceDecl>,
    /// Registered signatures (pass 2), methods keyed as `Type.Method`.
    functions: HashMap<String, FunctionInfo>,
    /// Imported package identifiers (alias or last path segment).
    packages: HashSet<String>,
    scopes: ScopeStack,
    return_counts: HashMap<ExprId, usize>,
    errors: Vec<Diagnostic>,
    /// Return types of the function body currently being checked.
    current_returns: Vec<TypeInfo>,
    /// Set while checking expressions on the right side of a pipe, where
    /// `_` and the `.M()` shorthand are legal.
    in_pipe_rhs: bool,
    /// Set when the pipe strategy injects the piped value as an extra
    /// argument, so call arity checks account for it.
    pipe_injects_arg: bool,
    /// Set inside a block handler that declared `onerr as <alias>`; the
    /// reserved name `error` is a hard error there.
    onerr_alias_active: bool,
}

impl<'a> Checker<'a> {
    fn new(options: &'a Options) -> Self {
        Self {
            options,
            types: HashMap::new(),
            interfaces: HashMap::new(),
            functions: HashMap::new(),
            packages: HashSet::new(),
            scopes: ScopeStack::new(),
            return_counts: HashMap::new(),
            errors: Vec::new(),
            current_returns: Vec::new(),
            in_pipe_rhs: false,
            pipe_injects_arg: false,
            onerr_alias_active: false,
        }
    }

    pub(super) fn error(&mut self, diagnostic: Diagnostic) {
        self.errors.push(diagnostic);
    }

    /// Whether `name` resolves to a known type-level entity.
    pub(super) fn is_known_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
            || self.interfaces.contains_key(name)
            || name.contains('.')
    }

    /// Structural interface conformance: does `type_name`'s method set cover
    /// every signature of `interface_name`?
    pub(super) fn conforms(&self, type_name: &str, interface_name: &str) -> Result<(), String> {
        let Some(iface) = self.interfaces.get(interface_name) else {
            return Ok(());
        };
        for sig in &iface.methods {
            let key = format!("{type_name}.{}", sig.name);
            let Some(method) = self.functions.get(&key) else {
                return Err(format!(
                    "type '{type_name}' does not implement '{interface_name}': missing method '{}'",
                    sig.name
                ));
            };
            if method.param_types.len() != sig.params.len()
                || method.returns.len() != sig.returns.len()
            {
                return Err(format!(
                    "type '{type_name}' does not implement '{interface_name}': \
                     method '{}' has a different signature",
                    sig.name
                ));
            }
            let params_match = method
                .param_types
                .iter()
                .zip(&sig.params)
                .all(|(have, want)| have.compatible_with(&TypeInfo::from_expr(&want.ty)));
            let returns_match = method
                .returns
                .iter()
                .zip(&sig.returns)
                .all(|(have, want)| have.compatible_with(&TypeInfo::from_expr(want)));
            if !params_match || !returns_match {
                return Err(format!(
                    "type '{type_name}' does not implement '{interface_name}': \
                     method '{}' has a different signature",
                    sig.name
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
