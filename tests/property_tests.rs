//! Property-based tests over the lexer and the full pipeline.
//!
//! These verify structural invariants across generated inputs rather than
//! specific translations; the example-driven coverage lives in
//! tests/pipeline_tests.rs.

use frond::frontend::lexer::{lex, StrSegment, TokenKind};
use frond::{compile, Options};
use proptest::prelude::*;

fn ident_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,8}"
}

/// A function body nested `depth` blocks deep through `if` statements.
fn nested_source(depth: usize) -> String {
    let mut source = String::from("func Main()\n");
    for level in 0..depth {
        let indent = " ".repeat(4 * (level + 1));
        source.push_str(&format!("{indent}if true\n"));
    }
    let innermost = " ".repeat(4 * (depth + 1));
    source.push_str(&format!("{innermost}print(1)\n"));
    source
}

proptest! {
    /// INDENT and DEDENT counts balance over any successfully lexed file.
    #[test]
    fn indents_and_dedents_balance(depth in 0usize..8) {
        let tokens = lex(&nested_source(depth)).expect("lexing failed");
        let indents = tokens
            .iter()
            .filter(|t| matches!(t.kind, TokenKind::Indent))
            .count();
        let dedents = tokens
            .iter()
            .filter(|t| matches!(t.kind, TokenKind::Dedent))
            .count();
        prop_assert_eq!(indents, dedents);
    }

    /// Interpolation segment lists reconstruct the original literal.
    #[test]
    fn interpolation_segments_reconstruct(
        before in "[a-z ]{0,10}",
        name in ident_strategy(),
        after in "[a-z ]{0,10}",
    ) {
        let literal = format!("{before}{{{name}}}{after}");
        let source = format!("func Main()\n    print(\"{literal}\")\n");
        let tokens = lex(&source).expect("lexing failed");

        let segments = tokens
            .iter()
            .find_map(|t| match &t.kind {
                TokenKind::Str(segments) => Some(segments),
                _ => None,
            })
            .expect("no string token");

        let mut reconstructed = String::new();
        for segment in segments {
            match segment {
                StrSegment::Literal(text) => reconstructed.push_str(text),
                StrSegment::Expr(expr) => {
                    reconstructed.push('{');
                    reconstructed.push_str(expr);
                    reconstructed.push('}');
                }
            }
        }
        prop_assert_eq!(reconstructed, literal);
    }

    /// The compiler is a pure function: same source, same bytes.
    #[test]
    fn generation_is_deterministic(a in ident_strategy(), b in ident_strategy()) {
        // Prefixes keep the generated names distinct and clear of keywords.
        let (a, b) = (format!("p{a}"), format!("q{b}"));
        let source = format!(
            "func Add({a} int, {b} int) int\n    return {a} + {b}\n"
        );
        let first = compile(&source, &Options::default()).expect("compile failed");
        let second = compile(&source, &Options::default()).expect("compile failed");
        prop_assert_eq!(first, second);
    }

    /// A line indented by a non-multiple of four yields exactly one
    /// indentation diagnostic for that line.
    #[test]
    fn misaligned_indent_reports_once(extra in 1usize..4) {
        let indent = " ".repeat(4 + extra);
        let source = format!("func Main()\n{indent}print(1)\n");
        let errors = lex(&source).expect_err("expected an indentation error");
        let indent_errors = errors
            .iter()
            .filter(|d| d.message.contains("indent"))
            .count();
        prop_assert_eq!(indent_errors, 1);
    }
}
