//! Symbols, type descriptors, and the scope stack
//!
//! Scopes follow a strict stack discipline: pushed on entering a function or
//! block, popped on leaving it, lookups walk outward. No symbol is visible
//! before its defining scope is pushed.

use std::collections::HashMap;

use crate::frontend::ast::{Position, TypeExpr};

/// Resolved type descriptor with structural equality.
///
/// `Unknown` is the inference fallback for values whose type the checker
/// cannot see (calls into unresolved packages); it is compatible with
/// everything so that partial knowledge never produces false positives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeInfo {
    /// `int`, `float`, `string`, `bool`, `byte`, `rune`, `any`, `error`
    Primitive(String),
    /// User-declared struct/interface or qualified external type.
    Named(String),
    List(Box<TypeInfo>),
    Map(Box<TypeInfo>, Box<TypeInfo>),
    Channel(Box<TypeInfo>),
    Reference(Box<TypeInfo>),
    Function {
        params: Vec<TypeInfo>,
        returns: Vec<TypeInfo>,
    },
    /// Multi-value result of a call; never a declared type.
    Tuple(Vec<TypeInfo>),
    Unknown,
}

impl TypeInfo {
    pub fn from_expr(ty: &TypeExpr) -> Self {
        match ty {
            TypeExpr::Primitive { name, .. } => TypeInfo::Primitive(name.clone()),
            TypeExpr::Named { name, .. } => TypeInfo::Named(name.clone()),
            TypeExpr::List { elem, .. } => TypeInfo::List(Box::new(Self::from_expr(elem))),
            TypeExpr::Map { key, value, .. } => TypeInfo::Map(
                Box::new(Self::from_expr(key)),
                Box::new(Self::from_expr(value)),
            ),
            TypeExpr::Channel { elem, .. } => TypeInfo::Channel(Box::new(Self::from_expr(elem))),
            TypeExpr::Reference { elem, .. } => {
                TypeInfo::Reference(Box::new(Self::from_expr(elem)))
            }
            TypeExpr::Function { params, returns, .. } => TypeInfo::Function {
                params: params.iter().map(Self::from_expr).collect(),
                returns: returns.iter().map(Self::from_expr).collect(),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TypeInfo::Primitive(name) if name == "error")
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, TypeInfo::Unknown)
    }

    /// Structural compatibility. `any` accepts everything; `Unknown` on
    /// either side suppresses the check entirely.
    pub fn compatible_with(&self, other: &TypeInfo) -> bool {
        match (self, other) {
            (TypeInfo::Unknown, _) | (_, TypeInfo::Unknown) => true,
            // `any2` is the second generic placeholder in library sources
            // and is just as permissive.
            (TypeInfo::Primitive(a), _) | (_, TypeInfo::Primitive(a))
                if a == "any" || a == "any2" =>
            {
                true
            }
            // Numeric widening between int flavors and float flavors is
            // handled by explicit casts; identical names only.
            (TypeInfo::Primitive(a), TypeInfo::Primitive(b)) => a == b,
            (TypeInfo::Named(a), TypeInfo::Named(b)) => a == b,
            (TypeInfo::List(a), TypeInfo::List(b)) => a.compatible_with(b),
            (TypeInfo::Map(ak, av), TypeInfo::Map(bk, bv)) => {
                ak.compatible_with(bk) && av.compatible_with(bv)
            }
            (TypeInfo::Channel(a), TypeInfo::Channel(b)) => a.compatible_with(b),
            (TypeInfo::Reference(a), TypeInfo::Reference(b)) => a.compatible_with(b),
            // A value of named type may flow into an interface slot; the
            // conformance pass validates the method set separately.
            (TypeInfo::Named(_), TypeInfo::Reference(_))
            | (TypeInfo::Reference(_), TypeInfo::Named(_)) => true,
            (
                TypeInfo::Function {
                    params: ap,
                    returns: ar,
                },
                TypeInfo::Function {
                    params: bp,
                    returns: br,
                },
            ) => {
                ap.len() == bp.len()
                    && ar.len() == br.len()
                    && ap.iter().zip(bp).all(|(a, b)| a.compatible_with(b))
                    && ar.iter().zip(br).all(|(a, b)| a.compatible_with(b))
            }
            (TypeInfo::Tuple(a), TypeInfo::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.compatible_with(y))
            }
            _ => false,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            TypeInfo::Primitive(name) | TypeInfo::Named(name) => name.clone(),
            TypeInfo::List(elem) => format!("list of {}", elem.describe()),
            TypeInfo::Map(k, v) => format!("map of {} to {}", k.describe(), v.describe()),
            TypeInfo::Channel(elem) => format!("channel of {}", elem.describe()),
            TypeInfo::Reference(elem) => format!("reference {}", elem.describe()),
            TypeInfo::Function { params, returns } => {
                let params: Vec<String> = params.iter().map(TypeInfo::describe).collect();
                let returns: Vec<String> = returns.iter().map(TypeInfo::describe).collect();
                format!("func({}) {}", params.join(", "), returns.join(", "))
            }
            TypeInfo::Tuple(items) => {
                let items: Vec<String> = items.iter().map(TypeInfo::describe).collect();
                format!("({})", items.join(", "))
            }
            TypeInfo::Unknown => "unknown".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Parameter,
    Function,
    Type,
    /// An imported package name; member access goes through it unchecked.
    Package,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: TypeInfo,
    pub pos: Position,
    pub mutable: bool,
}

/// Nested lexical scopes; the bottom scope holds file-level declarations.
#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<HashMap<String, Symbol>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn push(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        debug_assert!(self.scopes.len() > 1, "popping the file-level scope");
        self.scopes.pop();
    }

    /// Declare a symbol in the innermost scope. Returns the previous symbol
    /// when the name is already taken in that scope (shadowing an outer
    /// scope is fine).
    pub fn declare(&mut self, symbol: Symbol) -> Option<Symbol> {
        match self.scopes.last_mut() {
            Some(scope) => scope.insert(symbol.name.clone(), symbol),
            None => None,
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|s| s.get(name))
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_outward_through_scopes() {
        let mut scopes = ScopeStack::new();
        scopes.declare(Symbol {
            name: "x".to_string(),
            kind: SymbolKind::Variable,
            ty: TypeInfo::Primitive("int".to_string()),
            pos: Position::new(1, 1),
            mutable: true,
        });
        scopes.push();
        assert!(scopes.lookup("x").is_some());
        scopes.declare(Symbol {
            name: "x".to_string(),
            kind: SymbolKind::Variable,
            ty: TypeInfo::Primitive("string".to_string()),
            pos: Position::new(2, 1),
            mutable: true,
        });
        assert_eq!(
            scopes.lookup("x").map(|s| s.ty.clone()),
            Some(TypeInfo::Primitive("string".to_string()))
        );
        scopes.pop();
        assert_eq!(
            scopes.lookup("x").map(|s| s.ty.clone()),
            Some(TypeInfo::Primitive("int".to_string()))
        );
    }

    #[test]
    fn unknown_is_compatible_with_anything() {
        let unknown = TypeInfo::Unknown;
        let int = TypeInfo::Primitive("int".to_string());
        let list = TypeInfo::List(Box::new(int.clone()));
        assert!(unknown.compatible_with(&int));
        assert!(list.compatible_with(&TypeInfo::List(Box::new(TypeInfo::Unknown))));
        assert!(!int.compatible_with(&TypeInfo::Primitive("string".to_string())));
    }
}
