//! Generic-parameter synthesis for whitelisted library sources.
//!
//! Frond has no generics syntax. Library code under specific stdlib paths
//! uses the placeholder type names `any` and `any2` in signatures, and the
//! generator maps them to fresh Go type parameters in first-occurrence
//! order. Outside the whitelist no generics are ever synthesized; `any`
//! stays Go's `any`.

use crate::frontend::ast::{FunctionDecl, TypeExpr};

/// Source paths whose functions are eligible for synthesis.
const WHITELIST: &[&str] = &[
    "stdlib/slice/",
    "stdlib/iterator/",
    "stdlib/fetch/",
    "stdlib/json/",
];

const PLACEHOLDERS: &[&str] = &["any", "any2"];

/// Placeholder-to-type-parameter mapping for one function.
pub(super) struct GenericsMap {
    /// (placeholder, parameter name, constraint), in declaration order.
    params: Vec<(String, String, &'static str)>,
}

impl GenericsMap {
    /// Build the mapping for `f`, or `None` when the file is outside the
    /// whitelist or the signature has no placeholders.
    pub(super) fn for_function(f: &FunctionDecl, source_path: &str) -> Option<Self> {
        if !WHITELIST.iter().any(|dir| source_path.contains(dir)) {
            return None;
        }

        // First-occurrence order over parameters then returns, tracking
        // whether a placeholder ever sits in map-key position.
        let mut seen: Vec<(String, bool)> = Vec::new();
        for param in &f.params {
            scan(&param.ty, false, &mut seen);
        }
        for ret in &f.returns {
            scan(ret, false, &mut seen);
        }
        if seen.is_empty() {
            return None;
        }

        // GroupBy's second placeholder is its key-selector result and must
        // be comparable even though it never appears as a literal map key.
        if f.name == "GroupBy" && seen.len() > 1 {
            seen[1].1 = true;
        }

        let mut value_letters = ["T", "U", "V", "W"].iter();
        let mut key_letters = ["K", "K2"].iter();
        let params = seen
            .into_iter()
            .map(|(placeholder, comparable)| {
                if comparable {
                    let letter = key_letters.next().copied().unwrap_or("K");
                    (placeholder, letter.to_string(), "comparable")
                } else {
                    let letter = value_letters.next().copied().unwrap_or("T");
                    (placeholder, letter.to_string(), "any")
                }
            })
            .collect();

        Some(Self { params })
    }

    /// `[T any, K comparable]` for the function signature.
    pub(super) fn param_list(&self) -> String {
        let rendered: Vec<String> = self
            .params
            .iter()
            .map(|(_, name, constraint)| format!("{name} {constraint}"))
            .collect();
        format!("[{}]", rendered.join(", "))
    }

    /// Substitute a placeholder leaf; `None` for every other type shape
    /// (the recursive renderer handles nesting).
    pub(super) fn substitute(&self, ty: &TypeExpr) -> Option<String> {
        self.placeholder_param(ty)
    }

    /// The type parameter standing in for `ty`, when `ty` is a placeholder.
    pub(super) fn placeholder_param(&self, ty: &TypeExpr) -> Option<String> {
        let name = match ty {
            TypeExpr::Primitive { name, .. } | TypeExpr::Named { name, .. } => name,
            _ => return None,
        };
        self.params
            .iter()
            .find(|(placeholder, _, _)| placeholder == name)
            .map(|(_, param, _)| param.clone())
    }
}

fn scan(ty: &TypeExpr, in_key_position: bool, seen: &mut Vec<(String, bool)>) {
    match ty {
        TypeExpr::Primitive { name, .. } | TypeExpr::Named { name, .. } => {
            if PLACEHOLDERS.contains(&name.as_str()) {
                match seen.iter_mut().find(|(n, _)| n == name) {
                    Some(entry) => entry.1 |= in_key_position,
                    None => seen.push((name.clone(), in_key_position)),
                }
            }
        }
        TypeExpr::List { elem, .. }
        | TypeExpr::Channel { elem, .. }
        | TypeExpr::Reference { elem, .. } => scan(elem, false, seen),
        TypeExpr::Map { key, value, .. } => {
            scan(key, true, seen);
            scan(value, false, seen);
        }
        TypeExpr::Function { params, returns, .. } => {
            for p in params {
                scan(p, false, seen);
            }
            for r in returns {
                scan(r, false, seen);
            }
        }
    }
}
