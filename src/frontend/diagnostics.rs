//! Diagnostics and error reporting for Frond
//!
//! Every phase accumulates [`Diagnostic`]s instead of failing fast, so that a
//! single compiler invocation surfaces as many independent problems as can be
//! soundly produced. Phase boundaries are where diagnostics become fatal:
//! parsing recovers, semantic analysis never does.

use crate::frontend::ast::Position;

/// How severe a diagnostic is.
///
/// Semantic diagnostics are always [`Severity::Error`]; `Warning` only exists
/// for the strict-mode lint class, and even those are promoted to errors when
/// strict mode is on (there are no warnings that still produce output).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// Which phase (and rule class) produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Malformed indentation, unterminated literal, invalid character.
    Lexical,
    /// Grammar violation, recovered at declaration/statement granularity.
    Syntax,
    /// Missing annotation, undefined symbol, type or arity mismatch,
    /// interface non-conformance.
    Type,
    /// Security rule violation. Always fatal, never advisory.
    Policy,
    /// Malformed `onerr` handler, reserved-name misuse, or a propagate form
    /// incompatible with the enclosing signature.
    OnErr,
    /// Strict-mode secondary class (discarded errors outside tests).
    Lint,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Lexical => write!(f, "error"),
            Category::Syntax => write!(f, "syntax error"),
            Category::Type => write!(f, "type error"),
            Category::Policy => write!(f, "security error"),
            Category::OnErr => write!(f, "onerr error"),
            Category::Lint => write!(f, "lint"),
        }
    }
}

/// A compile-time diagnostic with location information.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Source file path. Empty while a phase runs; stamped by the driver.
    pub file: String,
    pub pos: Position,
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    /// Optional fix hint shown alongside the message.
    pub hint: Option<String>,
}

impl Diagnostic {
    fn new(category: Category, message: String, pos: Position) -> Self {
        Self {
            file: String::new(),
            pos,
            severity: Severity::Error,
            category,
            message,
            hint: None,
        }
    }

    pub fn lexical(message: impl Into<String>, pos: Position) -> Self {
        Self::new(Category::Lexical, message.into(), pos)
    }

    pub fn syntax(message: impl Into<String>, pos: Position) -> Self {
        Self::new(Category::Syntax, message.into(), pos)
    }

    pub fn type_error(message: impl Into<String>, pos: Position) -> Self {
        Self::new(Category::Type, message.into(), pos)
    }

    pub fn policy(message: impl Into<String>, pos: Position) -> Self {
        Self::new(Category::Policy, message.into(), pos)
    }

    pub fn onerr(message: impl Into<String>, pos: Position) -> Self {
        Self::new(Category::OnErr, message.into(), pos)
    }

    pub fn lint(message: impl Into<String>, pos: Position) -> Self {
        let mut d = Self::new(Category::Lint, message.into(), pos);
        d.severity = Severity::Warning;
        d
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_file(mut self, file: &str) -> Self {
        self.file = file.to_string();
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}: {}",
            self.file, self.pos.line, self.pos.column, self.category, self.message
        )?;
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {hint})")?;
        }
        Ok(())
    }
}

/// Library-level failure: a non-empty list of diagnostics.
///
/// [`crate::compile`] returns the raw `Vec<Diagnostic>` for tooling; this
/// wrapper exists for callers that want a single `std::error::Error` value
/// with miette-rendered output.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("compilation failed with {} diagnostic(s)", .diagnostics.len())]
pub struct CompileFailure {
    pub diagnostics: Vec<Diagnostic>,
    #[help]
    pub help: Option<String>,
}

impl CompileFailure {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        let help = diagnostics.first().map(|d| d.to_string());
        Self { diagnostics, help }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_location_and_hint() {
        let d = Diagnostic::policy("SQL injection risk", Position::new(3, 7))
            .with_file("api.fr")
            .with_hint("use parameter placeholders");
        let text = d.to_string();
        assert!(text.contains("api.fr:3:7"));
        assert!(text.contains("security error"));
        assert!(text.contains("use parameter placeholders"));
    }

    #[test]
    fn lint_diagnostics_are_warnings() {
        let d = Diagnostic::lint("discarded error outside tests", Position::new(1, 1));
        assert_eq!(d.severity, Severity::Warning);
    }
}
