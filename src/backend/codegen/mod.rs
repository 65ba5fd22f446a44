//! Go code generation for Frond
//!
//! Consumes a validated [`Program`] plus the semantic [`Analysis`] side
//! table and emits Go source text. This phase never fails on well-formed
//! input: any shape the semantic pass should have rejected is a compiler
//! defect, not a user diagnostic.
//!
//! Output layout: header comment, `package` line, deduplicated import block
//! from a pre-scan, then declarations in source order. Generation is
//! deterministic, so two runs over the same tree yield identical bytes.

mod decl;
mod expr;
mod generics;
mod imports;
mod onerr;
mod stmt;

use crate::frontend::ast::{Program, TypeExpr};
use crate::frontend::typechecker::Analysis;
use crate::version::VERSION;
use crate::Options;

use generics::GenericsMap;

/// Emit Go source for a validated program.
#[tracing::instrument(skip_all)]
pub fn generate(program: &Program, analysis: &Analysis, options: &Options) -> String {
    Generator::new(program, analysis, options).generate()
}

pub(super) struct Generator<'a> {
    program: &'a Program,
    analysis: &'a Analysis,
    options: &'a Options,
    out: String,
    indent: usize,
    /// Numbers the onerr error temporaries (`err`, `err2`, ...) within the
    /// current function so nested clauses never shadow each other.
    temp_count: u32,
    /// Declared return types of the function being generated; propagate
    /// handlers need them for zero values.
    current_returns: Vec<TypeExpr>,
    /// Inside an onerr handler: maps the source-visible error name
    /// (`error` or the clause alias) to the generated temporary.
    error_binding: Option<(String, String)>,
    /// Receiver name of the method being generated; `this` renders to it.
    current_receiver: Option<String>,
    /// Generic-parameter substitution for the current function, when the
    /// whitelist applies.
    generics: Option<GenericsMap>,
}

impl<'a> Generator<'a> {
    fn new(program: &'a Program, analysis: &'a Analysis, options: &'a Options) -> Self {
        Self {
            program,
            analysis,
            options,
            out: String::new(),
            indent: 0,
            temp_count: 0,
            current_returns: Vec::new(),
            error_binding: None,
            current_receiver: None,
            generics: None,
        }
    }

    fn generate(mut self) -> String {
        let package = self
            .program
            .module
            .as_ref()
            .map(|m| m.name.clone())
            .unwrap_or_else(|| self.options.package_name.clone());

        self.push_line(&format!(
            "// Code generated by the Frond compiler v{VERSION}. DO NOT EDIT."
        ));
        self.push_line(&format!("package {package}"));
        self.blank_line();

        let imports = imports::collect(self.program, self.options);
        if !imports.is_empty() {
            self.push_line("import (");
            self.indent += 1;
            for entry in &imports {
                self.push_line(entry);
            }
            self.indent -= 1;
            self.push_line(")");
            self.blank_line();
        }

        for (i, decl) in self.program.declarations.iter().enumerate() {
            if i > 0 {
                self.blank_line();
            }
            self.gen_declaration(decl);
        }

        self.out
    }

    // ========================================================================
    // Writer helpers
    // ========================================================================

    pub(super) fn push_line(&mut self, line: &str) {
        for _ in 0..self.indent {
            self.out.push('\t');
        }
        self.out.push_str(line);
        self.out.push('\n');
    }

    pub(super) fn blank_line(&mut self) {
        self.out.push('\n');
    }

    /// Fresh error temporary: `err`, `err2`, `err3`, ... per function.
    pub(super) fn fresh_err_name(&mut self) -> String {
        self.temp_count += 1;
        if self.temp_count == 1 {
            "err".to_string()
        } else {
            format!("err{}", self.temp_count)
        }
    }

    /// Fresh value temporary for pipe and assignment lowering.
    pub(super) fn fresh_tmp_name(&mut self) -> String {
        self.temp_count += 1;
        format!("tmp{}", self.temp_count)
    }

    /// Render a type expression as Go source, applying any active generic
    /// substitution.
    pub(super) fn go_type(&self, ty: &TypeExpr) -> String {
        if let Some(generics) = &self.generics {
            if let Some(substituted) = generics.substitute(ty) {
                return substituted;
            }
        }
        self.go_type_plain(ty)
    }

    pub(super) fn go_type_plain(&self, ty: &TypeExpr) -> String {
        match ty {
            TypeExpr::Primitive { name, .. } => go_primitive(name).to_string(),
            TypeExpr::Named { name, .. } => name.clone(),
            TypeExpr::List { elem, .. } => format!("[]{}", self.go_type(elem)),
            TypeExpr::Map { key, value, .. } => {
                format!("map[{}]{}", self.go_type(key), self.go_type(value))
            }
            TypeExpr::Channel { elem, .. } => format!("chan {}", self.go_type(elem)),
            TypeExpr::Reference { elem, .. } => format!("*{}", self.go_type(elem)),
            TypeExpr::Function { params, returns, .. } => {
                let params: Vec<String> = params.iter().map(|p| self.go_type(p)).collect();
                let rendered = format!("func({})", params.join(", "));
                match returns.len() {
                    0 => rendered,
                    1 => format!("{rendered} {}", self.go_type(&returns[0])),
                    _ => {
                        let returns: Vec<String> =
                            returns.iter().map(|r| self.go_type(r)).collect();
                        format!("{rendered} ({})", returns.join(", "))
                    }
                }
            }
        }
    }

    /// The Go zero value for a declared type.
    pub(super) fn zero_value(&self, ty: &TypeExpr) -> String {
        if let Some(generics) = &self.generics {
            if let Some(param) = generics.placeholder_param(ty) {
                // Zero of a type parameter.
                return format!("*new({param})");
            }
        }
        match ty {
            TypeExpr::Primitive { name, .. } => match name.as_str() {
                "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16"
                | "uint32" | "uint64" | "byte" | "rune" => "0".to_string(),
                "float" | "float32" | "float64" => "0.0".to_string(),
                "string" => "\"\"".to_string(),
                "bool" => "false".to_string(),
                _ => "nil".to_string(),
            },
            TypeExpr::Named { name, .. } => {
                // Qualified external types and local interfaces zero to nil;
                // local struct types to their empty literal.
                if name.contains('.') || !self.is_struct_type(name) {
                    "nil".to_string()
                } else {
                    format!("{name}{{}}")
                }
            }
            TypeExpr::List { .. }
            | TypeExpr::Map { .. }
            | TypeExpr::Channel { .. }
            | TypeExpr::Reference { .. }
            | TypeExpr::Function { .. } => "nil".to_string(),
        }
    }

    fn is_struct_type(&self, name: &str) -> bool {
        self.program.declarations.iter().any(|d| {
            matches!(d, crate::frontend::ast::Declaration::Type(t) if t.name == name)
        })
    }
}

/// Frond primitive names to Go spellings.
pub(super) fn go_primitive(name: &str) -> &str {
    match name {
        "float" => "float64",
        other => other,
    }
}
