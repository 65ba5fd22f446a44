use pretty_assertions::assert_eq;

use super::analyze;
use crate::frontend::diagnostics::{Category, Diagnostic};
use crate::frontend::lexer::lex;
use crate::frontend::parser::parse;
use crate::Options;

fn analyze_with(source: &str, options: &Options) -> Result<super::Analysis, Vec<Diagnostic>> {
    let tokens = lex(source).expect("lexing failed");
    let program = parse(&tokens).expect("parsing failed");
    analyze(&program, options)
}

fn check(source: &str) -> Result<super::Analysis, Vec<Diagnostic>> {
    analyze_with(source, &Options::default())
}

fn messages(result: Result<super::Analysis, Vec<Diagnostic>>) -> Vec<String> {
    match result {
        Ok(_) => vec![],
        Err(diags) => diags.into_iter().map(|d| d.message).collect(),
    }
}

const DIVIDE: &str = "func Divide(a int, b int) int, error\n    \
     if b equals 0\n        \
         return 0, error \"division by zero\"\n    \
     return a / b, empty error\n";

#[test]
fn divide_example_checks_cleanly() {
    let analysis = check(DIVIDE).expect("expected clean analysis");
    let info = analysis.functions.get("Divide").expect("Divide registered");
    assert_eq!(info.returns.len(), 2);
    assert!(info.returns_trailing_error());
}

#[test]
fn undefined_identifier_is_reported() {
    let errors = messages(check(
        "func Main()\n    print(missing)\n",
    ));
    assert_eq!(errors, vec!["undefined identifier 'missing'".to_string()]);
}

#[test]
fn undefined_function_is_reported() {
    let errors = messages(check("func Main()\n    Nope(1)\n"));
    assert_eq!(errors, vec!["undefined function 'Nope'".to_string()]);
}

#[test]
fn duplicate_type_is_reported() {
    let errors = messages(check(
        "type User\n    name string\n\
         type User\n    age int\n\
         func Main()\n    print(1)\n",
    ));
    assert!(
        errors.iter().any(|m| m.contains("duplicate")),
        "got: {errors:?}"
    );
}

#[test]
fn call_arity_is_enforced() {
    let source = format!("{DIVIDE}func Main()\n    x := Divide(1)\n    print(x)\n");
    let errors = messages(check(&source));
    assert!(
        errors.iter().any(|m| m.contains("missing argument")),
        "got: {errors:?}"
    );
}

#[test]
fn named_arguments_remap_and_defaults_fill() {
    let source = "func Pad(text string, width int = 4) string\n    \
             return text\n\
         func Main()\n    \
             print(Pad(\"hi\"))\n    \
             print(Pad(\"hi\", width: 8))\n";
    assert!(check(source).is_ok());
}

#[test]
fn unknown_named_argument_is_reported() {
    let source = "func Pad(text string, width int = 4) string\n    \
             return text\n\
         func Main()\n    \
             print(Pad(\"hi\", depth: 8))\n";
    let errors = messages(check(source));
    assert!(
        errors.iter().any(|m| m.contains("no parameter named 'depth'")),
        "got: {errors:?}"
    );
}

#[test]
fn argument_type_mismatch_is_reported() {
    let source = format!("{DIVIDE}func Main()\n    x := Divide(1, \"two\")\n    print(x)\n");
    let errors = messages(check(&source));
    assert!(
        errors.iter().any(|m| m.contains("argument type mismatch")),
        "got: {errors:?}"
    );
}

#[test]
fn pipe_injection_counts_toward_arity() {
    let source = "func Double(x int) int\n    \
             return x * 2\n\
         func Main()\n    \
             y := 5 |> Double()\n    \
             print(y)\n";
    assert!(check(source).is_ok());
}

#[test]
fn placeholder_pipe_fills_the_marked_slot() {
    let source = "func Clamp(lo int, x int, hi int) int\n    \
             return x\n\
         func Main()\n    \
             y := 5 |> Clamp(1, _, 10)\n    \
             print(y)\n";
    assert!(check(source).is_ok());
}

#[test]
fn method_calls_resolve_against_the_receiver_type() {
    let source = "type Counter\n    value int\n\
         func (c Counter) Bump() int\n    \
             return c.value + 1\n\
         func Main()\n    \
             c := Counter{value: 1}\n    \
             print(c.Bump())\n";
    assert!(check(source).is_ok());
}

#[test]
fn missing_method_is_reported() {
    let source = "type Counter\n    value int\n\
         func Main()\n    \
             c := Counter{value: 1}\n    \
             print(c.Missing())\n";
    let errors = messages(check(source));
    assert_eq!(
        errors,
        vec!["type 'Counter' has no method 'Missing'".to_string()]
    );
}

#[test]
fn interface_conformance_is_structural() {
    let source = "interface Greeter\n    Greet() string\n\
         type Robot\n    id int\n\
         func (r Robot) Greet() string\n    \
             return \"beep\"\n\
         func Announce(g Greeter)\n    \
             print(g.Greet())\n\
         func Main()\n    \
             r := Robot{id: 1}\n    \
             Announce(r)\n";
    assert!(check(source).is_ok());
}

#[test]
fn missing_interface_method_is_reported() {
    let source = "interface Greeter\n    Greet() string\n\
         type Robot\n    id int\n\
         func Announce(g Greeter)\n    \
             print(1)\n\
         func Main()\n    \
             r := Robot{id: 1}\n    \
             Announce(r)\n";
    let errors = messages(check(source));
    assert!(
        errors
            .iter()
            .any(|m| m.contains("does not implement 'Greeter'")),
        "got: {errors:?}"
    );
}

// ============================================================================
// onerr validation
// ============================================================================

#[test]
fn propagate_requires_a_trailing_error_return() {
    let source = format!(
        "{DIVIDE}func Use() int\n    \
             x := Divide(1, 2) onerr return\n    \
             return x\n"
    );
    let errors = messages(check(&source));
    assert!(
        errors
            .iter()
            .any(|m| m.contains("requires the enclosing function to return a trailing error")),
        "got: {errors:?}"
    );
}

#[test]
fn propagate_is_fine_with_a_trailing_error() {
    let source = format!(
        "{DIVIDE}func Use() int, error\n    \
             x := Divide(1, 2) onerr return\n    \
             return x, empty error\n"
    );
    assert!(check(&source).is_ok());
}

#[test]
fn error_interpolation_under_an_alias_is_rejected() {
    let source = format!(
        "{DIVIDE}func Use()\n    \
             x := Divide(1, 0) onerr as e\n        \
                 print(\"failed: {{error}}\")\n    \
             print(x)\n"
    );
    let errors = messages(check(&source));
    assert!(
        errors.iter().any(|m| m.contains("use the alias")),
        "got: {errors:?}"
    );
}

#[test]
fn alias_interpolation_is_accepted() {
    let source = format!(
        "{DIVIDE}func Use()\n    \
             x := Divide(1, 0) onerr as e\n        \
                 print(\"failed: {{e}}\")\n    \
             print(x)\n"
    );
    assert!(check(&source).is_ok());
}

#[test]
fn onerr_on_an_infallible_expression_is_rejected() {
    let source = "func Pure() int\n    \
             return 1\n\
         func Main()\n    \
             x := Pure() onerr discard\n    \
             print(x)\n";
    let errors = messages(check(source));
    assert!(
        errors.iter().any(|m| m.contains("cannot fail")),
        "got: {errors:?}"
    );
}

#[test]
fn strict_mode_rejects_discard_outside_tests() {
    let source = format!(
        "{DIVIDE}func Use()\n    \
             x := Divide(1, 0) onerr discard\n    \
             print(x)\n"
    );
    let strict = Options {
        strict: true,
        ..Options::default()
    };
    let errors = messages(analyze_with(&source, &strict));
    assert!(
        errors.iter().any(|m| m.contains("onerr discard")),
        "got: {errors:?}"
    );

    // The same file under a test path is exempt.
    let test_file = Options {
        strict: true,
        source_path: "app/divide_test.fr".to_string(),
        ..Options::default()
    };
    assert!(analyze_with(&source, &test_file).is_ok());
}

// ============================================================================
// Security policy
// ============================================================================

fn policy_errors(source: &str, options: &Options) -> Vec<Diagnostic> {
    match analyze_with(source, options) {
        Ok(_) => vec![],
        Err(diags) => diags
            .into_iter()
            .filter(|d| matches!(d.category, Category::Policy))
            .collect(),
    }
}

#[test]
fn sql_interpolation_is_flagged() {
    let source = "import \"stdlib/db\"\n\
         func Find(pool db.Pool, name string)\n    \
             db.Exec(pool, \"DELETE FROM users WHERE name = '{name}'\") onerr discard\n";
    let errors = policy_errors(source, &Options::default());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("SQL injection"));
    assert!(errors[0].hint.as_deref().is_some_and(|h| h.contains("placeholders")));
}

#[test]
fn sql_with_parameter_placeholders_is_fine() {
    let source = "import \"stdlib/db\"\n\
         func Find(pool db.Pool, name string)\n    \
             db.Exec(pool, \"DELETE FROM users WHERE name = $1\", name) onerr discard\n";
    assert!(policy_errors(source, &Options::default()).is_empty());
}

#[test]
fn piped_sql_shifts_the_checked_argument() {
    let source = "import \"stdlib/db\"\n\
         func Find(pool db.Pool, name string)\n    \
             pool |> db.Exec(\"DELETE FROM users WHERE name = '{name}'\") onerr discard\n";
    let errors = policy_errors(source, &Options::default());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("SQL injection"));
}

#[test]
fn non_literal_html_content_is_flagged() {
    let source = "import \"stdlib/web\"\n\
         func Page(w web.ResponseWriter, content string)\n    \
             web.HTML(w, content)\n";
    let errors = policy_errors(source, &Options::default());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("XSS"));
}

#[test]
fn fetch_inside_a_handler_is_flagged() {
    let source = "import \"stdlib/web\"\n\
         import \"stdlib/fetch\"\n\
         func Proxy(w web.ResponseWriter, url string)\n    \
             body := fetch.Get(url) onerr discard\n    \
             print(body)\n";
    let errors = policy_errors(source, &Options::default());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("SSRF"));
}

#[test]
fn fetch_outside_a_handler_is_fine() {
    let source = "import \"stdlib/fetch\"\n\
         func Poll(url string)\n    \
             body := fetch.Get(url) onerr discard\n    \
             print(body)\n";
    assert!(policy_errors(source, &Options::default()).is_empty());
}

#[test]
fn file_access_inside_a_handler_is_flagged() {
    let source = "import \"stdlib/web\"\n\
         import \"stdlib/files\"\n\
         func Download(w web.ResponseWriter, path string)\n    \
             data := files.Read(path) onerr discard\n    \
             print(data)\n";
    let errors = policy_errors(source, &Options::default());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("path traversal"));
}

#[test]
fn shell_run_with_a_variable_is_flagged() {
    let source = "import \"stdlib/shell\"\n\
         func Run(cmd string)\n    \
             shell.Run(cmd) onerr discard\n";
    let errors = policy_errors(source, &Options::default());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("command injection"));
}

#[test]
fn non_literal_redirect_is_flagged_outside_stdlib() {
    let source = "import \"stdlib/web\"\n\
         func Go(w web.ResponseWriter, r web.Request, target string)\n    \
             web.Redirect(w, r, target)\n";
    let errors = policy_errors(source, &Options::default());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("open redirect"));

    let stdlib = Options {
        source_path: "stdlib/web/redirect.fr".to_string(),
        ..Options::default()
    };
    assert!(policy_errors(source, &stdlib).is_empty());
}
