use pretty_assertions::assert_eq;

use super::parse;
use crate::frontend::ast::*;
use crate::frontend::lexer::lex;

fn parse_source(source: &str) -> Program {
    let tokens = lex(source).expect("lexing failed");
    parse(&tokens).expect("parsing failed")
}

fn parse_errors(source: &str) -> Vec<String> {
    let tokens = lex(source).expect("lexing failed");
    match parse(&tokens) {
        Ok(_) => vec![],
        Err(diags) => diags.into_iter().map(|d| d.message).collect(),
    }
}

fn first_function(program: &Program) -> &FunctionDecl {
    program
        .declarations
        .iter()
        .find_map(|d| match d {
            Declaration::Function(f) => Some(f),
            _ => None,
        })
        .expect("no function declaration")
}

#[test]
fn parses_module_and_imports() {
    let program = parse_source(
        "module greeter\n\
         import \"stdlib/strings\"\n\
         import \"stdlib/fetch\" as web\n\
         func Main()\n    \
             Print(\"hi\")\n",
    );
    assert_eq!(program.module.as_ref().map(|m| m.name.as_str()), Some("greeter"));
    assert_eq!(program.imports.len(), 2);
    assert_eq!(program.imports[0].path, "stdlib/strings");
    assert_eq!(program.imports[1].alias.as_deref(), Some("web"));
}

#[test]
fn parses_two_value_return_signature() {
    let program = parse_source(
        "func Divide(a int, b int) int, error\n    \
             if b equals 0\n        \
                 return 0, error \"division by zero\"\n    \
             return a / b, empty error\n",
    );
    let f = first_function(&program);
    assert_eq!(f.name, "Divide");
    assert_eq!(f.params.len(), 2);
    assert_eq!(f.returns.len(), 2);
    assert!(matches!(&f.returns[1], TypeExpr::Primitive { name, .. } if name == "error"));

    // The zero branch returns a constructed error as its second value.
    let Statement::If(if_stmt) = &f.body.statements[0] else {
        panic!("expected if statement");
    };
    assert!(matches!(
        &if_stmt.condition,
        Expr::Binary { op: BinaryOp::Eq, .. }
    ));
    let Statement::Return(ret) = &if_stmt.consequence.statements[0] else {
        panic!("expected return in if body");
    };
    assert_eq!(ret.values.len(), 2);
    assert!(matches!(&ret.values[1], Expr::ErrorNew { .. }));
}

#[test]
fn parses_method_with_receiver() {
    let program = parse_source(
        "func (c Counter) Increment()\n    \
             c.value = c.value + 1\n",
    );
    let f = first_function(&program);
    let receiver = f.receiver.as_ref().expect("expected receiver");
    assert_eq!(receiver.name, "c");
    assert!(matches!(&receiver.ty, TypeExpr::Named { name, .. } if name == "Counter"));
}

#[test]
fn parses_default_parameters() {
    let program = parse_source(
        "func Pad(s string, width int = 8) string\n    \
             return s\n",
    );
    let f = first_function(&program);
    assert!(f.params[0].default.is_none());
    assert!(matches!(
        f.params[1].default,
        Some(Expr::Int { value: 8, .. })
    ));
}

#[test]
fn rejects_non_trailing_default_parameter() {
    let errors = parse_errors(
        "func Pad(width int = 8, s string) string\n    \
             return s\n",
    );
    assert!(errors.iter().any(|m| m.contains("contiguous at the end")));
}

#[test]
fn parses_type_decl_with_field_alias() {
    let program = parse_source(
        "type User\n    \
             name string as \"user_name\"\n    \
             age int\n",
    );
    let Declaration::Type(decl) = &program.declarations[0] else {
        panic!("expected type declaration");
    };
    assert_eq!(decl.name, "User");
    assert_eq!(decl.fields[0].alias.as_deref(), Some("user_name"));
    assert_eq!(decl.fields[1].alias, None);
}

#[test]
fn parses_interface_decl() {
    let program = parse_source(
        "interface Shape\n    \
             Area() float\n    \
             Scale(factor float) Shape\n",
    );
    let Declaration::Interface(decl) = &program.declarations[0] else {
        panic!("expected interface declaration");
    };
    assert_eq!(decl.methods.len(), 2);
    assert_eq!(decl.methods[1].params.len(), 1);
}

#[test]
fn parses_var_decl_forms() {
    let program = parse_source(
        "func Main()\n    \
             x := 1\n    \
             y, err := Fetch()\n    \
             name string = \"frond\"\n",
    );
    let f = first_function(&program);
    let Statement::VarDecl(multi) = &f.body.statements[1] else {
        panic!("expected var decl");
    };
    assert_eq!(multi.names, vec!["y".to_string(), "err".to_string()]);
    let Statement::VarDecl(typed) = &f.body.statements[2] else {
        panic!("expected typed var decl");
    };
    assert!(matches!(&typed.ty, Some(TypeExpr::Primitive { name, .. }) if name == "string"));
}

#[test]
fn parses_for_variants() {
    let program = parse_source(
        "func Main()\n    \
             for i from 0 to 10\n        \
                 Use(i)\n    \
             for i from 1 through 10\n        \
                 Use(i)\n    \
             for i, item in items\n        \
                 Use(item)\n    \
             for count < limit\n        \
                 Bump()\n    \
             for i := 0; i < n; i = i + 1\n        \
                 Use(i)\n",
    );
    let f = first_function(&program);
    let headers: Vec<&ForHeader> = f
        .body
        .statements
        .iter()
        .map(|s| match s {
            Statement::For(f) => &f.header,
            other => panic!("expected for statement, got {other:?}"),
        })
        .collect();

    assert!(matches!(headers[0], ForHeader::Range { inclusive: false, .. }));
    assert!(matches!(headers[1], ForHeader::Range { inclusive: true, .. }));
    assert!(
        matches!(headers[2], ForHeader::Collection { index: Some(i), .. } if i == "i")
    );
    assert!(matches!(headers[3], ForHeader::Condition { .. }));
    assert!(matches!(
        headers[4],
        ForHeader::Clauses {
            init: Some(_),
            condition: Some(_),
            post: Some(_)
        }
    ));
}

#[test]
fn parses_send_and_receive() {
    let program = parse_source(
        "func Main()\n    \
             send 42 to ch\n    \
             x := receive from ch\n",
    );
    let f = first_function(&program);
    assert!(matches!(&f.body.statements[0], Statement::Send(_)));
    let Statement::VarDecl(decl) = &f.body.statements[1] else {
        panic!("expected var decl");
    };
    assert!(matches!(&decl.value, Expr::Receive { .. }));
}

// ============================================================================
// Pipe strategies
// ============================================================================

fn pipe_strategy(source: &str) -> PipeStrategy {
    let program = parse_source(source);
    let f = first_function(&program);
    let Statement::VarDecl(decl) = &f.body.statements[0] else {
        panic!("expected var decl");
    };
    let Expr::Pipe { strategy, .. } = &decl.value else {
        panic!("expected pipe, got {:?}", decl.value);
    };
    *strategy
}

#[test]
fn pipe_placeholder_strategy() {
    let strategy = pipe_strategy(
        "func Main()\n    \
             r := data |> Process(config, _)\n",
    );
    assert_eq!(strategy, PipeStrategy::Placeholder);
}

#[test]
fn pipe_method_strategy() {
    let strategy = pipe_strategy(
        "func Main()\n    \
             r := name |> .ToUpper()\n",
    );
    assert_eq!(strategy, PipeStrategy::Method);
}

#[test]
fn pipe_context_first_strategy() {
    let strategy = pipe_strategy(
        "func Main()\n    \
             r := ctx |> fetch.Get(url)\n",
    );
    assert_eq!(strategy, PipeStrategy::ContextFirst);
}

#[test]
fn pipe_data_first_strategy() {
    let strategy = pipe_strategy(
        "func Main()\n    \
             r := rows |> Summarize(3)\n",
    );
    assert_eq!(strategy, PipeStrategy::DataFirst);
}

#[test]
fn placeholder_beats_context_first() {
    let strategy = pipe_strategy(
        "func Main()\n    \
             r := ctx |> fetch.Get(url, _)\n",
    );
    assert_eq!(strategy, PipeStrategy::Placeholder);
}

#[test]
fn pipe_chains_left_associative() {
    let program = parse_source(
        "func Main()\n    \
             r := a |> F() |> G()\n",
    );
    let f = first_function(&program);
    let Statement::VarDecl(decl) = &f.body.statements[0] else {
        panic!("expected var decl");
    };
    let Expr::Pipe { left, .. } = &decl.value else {
        panic!("expected pipe");
    };
    assert!(matches!(&**left, Expr::Pipe { .. }));
}

// ============================================================================
// onerr
// ============================================================================

fn onerr_of(source: &str) -> OnErrClause {
    let program = parse_source(source);
    let f = first_function(&program);
    match &f.body.statements[0] {
        Statement::VarDecl(s) => s.onerr.clone().expect("no onerr clause"),
        Statement::Expr(s) => s.onerr.clone().expect("no onerr clause"),
        Statement::Assign(s) => s.onerr.clone().expect("no onerr clause"),
        other => panic!("unexpected statement {other:?}"),
    }
}

#[test]
fn onerr_default_fallback() {
    let clause = onerr_of(
        "func Main()\n    \
             n := Parse(text) onerr 0\n",
    );
    assert!(matches!(clause.handler, OnErrHandler::Default(_)));
    assert_eq!(clause.explain, None);
}

#[test]
fn onerr_bare_return_is_propagate() {
    let clause = onerr_of(
        "func Main()\n    \
             n := Parse(text) onerr return\n",
    );
    assert!(matches!(clause.handler, OnErrHandler::Propagate));
}

#[test]
fn onerr_return_with_values() {
    let clause = onerr_of(
        "func Main()\n    \
             n := Parse(text) onerr return 0, empty error\n",
    );
    let OnErrHandler::Return(values) = clause.handler else {
        panic!("expected return handler");
    };
    assert_eq!(values.len(), 2);
}

#[test]
fn onerr_explain_propagates_with_hint() {
    let clause = onerr_of(
        "func Main()\n    \
             n := Parse(text) onerr explain \"bad input\"\n",
    );
    assert!(matches!(clause.handler, OnErrHandler::Propagate));
    assert_eq!(clause.explain.as_deref(), Some("bad input"));
}

#[test]
fn onerr_discard() {
    let clause = onerr_of(
        "func Main()\n    \
             Cleanup() onerr discard\n",
    );
    assert!(matches!(clause.handler, OnErrHandler::Discard));
}

#[test]
fn onerr_panic_with_message() {
    let clause = onerr_of(
        "func Main()\n    \
             n := Parse(text) onerr panic \"unrecoverable\"\n",
    );
    assert!(matches!(clause.handler, OnErrHandler::Panic(_)));
}

#[test]
fn onerr_block_with_alias() {
    let clause = onerr_of(
        "func Main()\n    \
             n := Parse(text) onerr as e\n        \
                 Log(e)\n",
    );
    assert_eq!(clause.alias.as_deref(), Some("e"));
    let OnErrHandler::Block(block) = clause.handler else {
        panic!("expected block handler");
    };
    assert_eq!(block.statements.len(), 1);
}

#[test]
fn onerr_rejected_on_return_statement() {
    let errors = parse_errors(
        "func Main()\n    \
             return 1 onerr 0\n",
    );
    assert!(!errors.is_empty());
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn keyword_operators_parse_like_symbolic_ones() {
    let program = parse_source(
        "func Main()\n    \
             a := x equals y and not z\n    \
             b := x not equals y or w in items\n",
    );
    let f = first_function(&program);
    let Statement::VarDecl(a) = &f.body.statements[0] else {
        panic!("expected var decl");
    };
    assert!(matches!(&a.value, Expr::Binary { op: BinaryOp::And, .. }));
    let Statement::VarDecl(b) = &f.body.statements[1] else {
        panic!("expected var decl");
    };
    let Expr::Binary { op: BinaryOp::Or, right, .. } = &b.value else {
        panic!("expected or");
    };
    assert!(matches!(&**right, Expr::Binary { op: BinaryOp::In, .. }));
}

#[test]
fn parses_struct_literal_brace_form() {
    let program = parse_source(
        "func Main()\n    \
             p := Point{x: 1, y: 2}\n",
    );
    let f = first_function(&program);
    let Statement::VarDecl(decl) = &f.body.statements[0] else {
        panic!("expected var decl");
    };
    let Expr::StructLit { name, fields, .. } = &decl.value else {
        panic!("expected struct literal");
    };
    assert_eq!(name, "Point");
    assert_eq!(fields.len(), 2);
}

#[test]
fn parses_struct_literal_indented_form() {
    let program = parse_source(
        "func Main()\n    \
             p := Point\n        \
                 x: 1\n        \
                 y: 2\n    \
             Show(p)\n",
    );
    let f = first_function(&program);
    assert_eq!(f.body.statements.len(), 2);
    let Statement::VarDecl(decl) = &f.body.statements[0] else {
        panic!("expected var decl");
    };
    let Expr::StructLit { fields, .. } = &decl.value else {
        panic!("expected struct literal");
    };
    assert_eq!(fields.len(), 2);
}

#[test]
fn parses_named_arguments() {
    let program = parse_source(
        "func Main()\n    \
             r := Pad(\"x\", width: 3)\n",
    );
    let f = first_function(&program);
    let Statement::VarDecl(decl) = &f.body.statements[0] else {
        panic!("expected var decl");
    };
    let Expr::Call { args, .. } = &decl.value else {
        panic!("expected call");
    };
    assert_eq!(args[0].name, None);
    assert_eq!(args[1].name.as_deref(), Some("width"));
}

#[test]
fn rejects_positional_after_named_argument() {
    let errors = parse_errors(
        "func Main()\n    \
             r := Pad(width: 3, \"x\")\n",
    );
    assert!(errors
        .iter()
        .any(|m| m.contains("positional argument cannot follow named")));
}

#[test]
fn parses_interpolated_string_into_parts() {
    let program = parse_source(
        "func Main()\n    \
             s := \"Hello, {name}!\"\n",
    );
    let f = first_function(&program);
    let Statement::VarDecl(decl) = &f.body.statements[0] else {
        panic!("expected var decl");
    };
    let Expr::Str { parts, .. } = &decl.value else {
        panic!("expected string");
    };
    assert_eq!(parts.len(), 3);
    assert!(matches!(&parts[0], StrPart::Literal(s) if s == "Hello, "));
    assert!(
        matches!(&parts[1], StrPart::Expr(e) if matches!(&**e, Expr::Ident { name, .. } if name == "name"))
    );
    assert!(matches!(&parts[2], StrPart::Literal(s) if s == "!"));
}

#[test]
fn parses_collection_types_and_literals() {
    let program = parse_source(
        "func Main()\n    \
             xs := list of int [1, 2, 3]\n    \
             m := map of string to int {\"a\": 1}\n    \
             ch := make(channel of int, 8)\n",
    );
    let f = first_function(&program);
    let Statement::VarDecl(xs) = &f.body.statements[0] else {
        panic!("expected var decl");
    };
    assert!(matches!(
        &xs.value,
        Expr::ListLit { elem_ty: Some(_), elements, .. } if elements.len() == 3
    ));
    let Statement::VarDecl(m) = &f.body.statements[1] else {
        panic!("expected var decl");
    };
    assert!(matches!(&m.value, Expr::MapLit { entries, .. } if entries.len() == 1));
    let Statement::VarDecl(ch) = &f.body.statements[2] else {
        panic!("expected var decl");
    };
    assert!(matches!(
        &ch.value,
        Expr::Make { ty: TypeExpr::Channel { .. }, args, .. } if args.len() == 1
    ));
}

#[test]
fn parses_slice_and_negative_index() {
    let program = parse_source(
        "func Main()\n    \
             a := xs[1:3]\n    \
             b := xs[:2]\n    \
             c := xs[-1]\n",
    );
    let f = first_function(&program);
    let Statement::VarDecl(a) = &f.body.statements[0] else {
        panic!("expected var decl");
    };
    assert!(matches!(
        &a.value,
        Expr::Slice { start: Some(_), end: Some(_), .. }
    ));
    let Statement::VarDecl(b) = &f.body.statements[1] else {
        panic!("expected var decl");
    };
    assert!(matches!(&b.value, Expr::Slice { start: None, end: Some(_), .. }));
    let Statement::VarDecl(c) = &f.body.statements[2] else {
        panic!("expected var decl");
    };
    let Expr::Index { index, .. } = &c.value else {
        panic!("expected index");
    };
    assert!(matches!(&**index, Expr::Unary { op: UnaryOp::Neg, .. }));
}

#[test]
fn parses_cast_expression() {
    let program = parse_source(
        "func Main()\n    \
             f := n as float\n    \
             s := shape as Circle\n",
    );
    let f = first_function(&program);
    let Statement::VarDecl(a) = &f.body.statements[0] else {
        panic!("expected var decl");
    };
    assert!(matches!(
        &a.value,
        Expr::Cast { ty: TypeExpr::Primitive { .. }, .. }
    ));
    let Statement::VarDecl(b) = &f.body.statements[1] else {
        panic!("expected var decl");
    };
    assert!(matches!(&b.value, Expr::Cast { ty: TypeExpr::Named { .. }, .. }));
}

#[test]
fn recovers_and_reports_multiple_errors() {
    let errors = parse_errors(
        "func Broken(\n    \
             return 1\n\
         func AlsoBroken(\n    \
             return 2\n",
    );
    assert!(errors.len() >= 2, "expected at least two diagnostics, got {errors:?}");
}

#[test]
fn else_if_chain() {
    let program = parse_source(
        "func Main()\n    \
             if a\n        \
                 X()\n    \
             else if b\n        \
                 Y()\n    \
             else\n        \
                 Z()\n",
    );
    let f = first_function(&program);
    let Statement::If(if_stmt) = &f.body.statements[0] else {
        panic!("expected if");
    };
    let Some(ElseArm::If(elif)) = &if_stmt.alternative else {
        panic!("expected else-if arm");
    };
    assert!(matches!(elif.alternative, Some(ElseArm::Block(_))));
}
