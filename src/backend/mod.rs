//! Frond Compiler Backend
//!
//! Go source text emission from a semantically validated AST.

pub mod codegen;
