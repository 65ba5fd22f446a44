//! Compiler version, embedded in the header comment of generated Go files.

/// Version string reported in generated output.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
