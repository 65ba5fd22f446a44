//! Frond Compiler Frontend
//!
//! This module contains all frontend components:
//! - `lexer`: tokenization of source code (indentation-sensitive)
//! - `parser`: parsing tokens into AST
//! - `ast`: abstract syntax tree definitions
//! - `symbols`: symbol table and scope management
//! - `typechecker`: semantic analysis, onerr validation, security checks
//! - `diagnostics`: error reporting

pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod symbols;
pub mod typechecker;
