//! Frond compiler
//!
//! Frond is a beginner-friendly, indentation-based language that compiles to
//! Go source text. The pipeline is four strictly sequential phases over one
//! compilation unit:
//!
//! 1. [`frontend::lexer`] — indentation-sensitive tokenization, string
//!    interpolation segmentation
//! 2. [`frontend::parser`] — recursive descent into an immutable AST, pipe
//!    strategy resolution, `onerr` clauses
//! 3. [`frontend::typechecker`] — type collection, signature-first checking,
//!    interface conformance, security policy
//! 4. [`backend::codegen`] — Go text emission
//!
//! The caller receives either complete generated text or a non-empty
//! diagnostic list; there is no partial emission.
//!
//! ```
//! use frond::{compile, Options};
//!
//! let source = "func Main()\n    print(\"hello\")\n";
//! let go = compile(source, &Options::default()).unwrap();
//! assert!(go.contains("fmt.Println"));
//! ```
//!
//! # Panics
//!
//! The public API does not panic on any input. Internal invariant violations
//! (a codegen shape the semantic pass should have rejected) are compiler
//! defects guarded by `debug_assert!`, not user-facing diagnostics.

pub mod backend;
pub mod frontend;
mod version;

pub use frontend::diagnostics::{Category, CompileFailure, Diagnostic, Severity};
pub use version::VERSION;

/// Per-compilation options, resolved by the external front end.
#[derive(Debug, Clone)]
pub struct Options {
    /// Go package name for the generated file. The `module` declaration in
    /// the source wins when present.
    pub package_name: String,
    /// Source path, used for diagnostics, the generics whitelist, and the
    /// stdlib redirect exemption.
    pub source_path: String,
    /// Lower `print` to standard error so protocol-speaking programs do not
    /// corrupt a machine-readable stdout. The directive detection happens
    /// outside the core; this is the already-resolved flag.
    pub protocol_output: bool,
    /// Fail on the secondary lint class (discarded errors outside tests).
    pub strict: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            package_name: "main".to_string(),
            source_path: String::new(),
            protocol_output: false,
            strict: false,
        }
    }
}

/// Compile one Frond source unit to Go source text.
///
/// Pure and single-threaded: no state persists between calls, and phases
/// run strictly in order. Lexical and syntax errors are accumulated with
/// best-effort recovery; any semantic diagnostic aborts before generation.
#[tracing::instrument(skip_all, fields(path = %options.source_path, bytes = source.len()))]
pub fn compile(source: &str, options: &Options) -> Result<String, Vec<Diagnostic>> {
    let tokens = frontend::lexer::lex(source).map_err(|e| stamp(e, &options.source_path))?;
    let program = frontend::parser::parse(&tokens).map_err(|e| stamp(e, &options.source_path))?;
    let analysis = frontend::typechecker::analyze(&program, options)
        .map_err(|e| stamp(e, &options.source_path))?;
    Ok(backend::codegen::generate(&program, &analysis, options))
}

fn stamp(diagnostics: Vec<Diagnostic>, path: &str) -> Vec<Diagnostic> {
    diagnostics
        .into_iter()
        .map(|d| d.with_file(path))
        .collect()
}
