//! End-to-end tests over the public `compile` entry point: source text in,
//! Go text out, with the diagnostic paths exercised alongside.

use frond::{compile, Category, Options};

fn compile_default(source: &str) -> String {
    compile(source, &Options::default()).expect("expected successful compilation")
}

fn compile_errors(source: &str, options: &Options) -> Vec<frond::Diagnostic> {
    match compile(source, options) {
        Ok(_) => vec![],
        Err(diags) => diags,
    }
}

const DIVIDE: &str = "func Divide(a int, b int) int, error\n    \
     if b equals 0\n        \
         return 0, error \"division by zero\"\n    \
     return a / b, empty error\n";

#[test]
fn divide_generates_a_two_value_go_function() {
    let go = compile_default(DIVIDE);
    assert!(go.starts_with("// Code generated by the Frond compiler v"));
    assert!(go.contains("package main"));
    assert!(go.contains("func Divide(a int, b int) (int, error) {"));
    assert!(go.contains("return 0, errors.New(\"division by zero\")"));
    assert!(go.contains("return (a / b), nil"));
    assert!(go.contains("\"errors\""));
}

#[test]
fn module_declaration_overrides_the_package_option() {
    let go = compile_default(&format!("module mathutil\n{DIVIDE}"));
    assert!(go.contains("package mathutil"));
}

#[test]
fn keyword_operators_render_symbolically() {
    let go = compile_default(
        "func Check(a bool, b bool, x int) bool\n    \
             return a and not b or x equals 3\n",
    );
    assert!(go.contains("&&"));
    assert!(go.contains("!b"));
    assert!(go.contains("||"));
    assert!(go.contains("== 3"));
}

#[test]
fn membership_lowers_to_slices_contains() {
    let go = compile_default(
        "func Has(xs list of int, x int) bool\n    \
             return x in xs\n",
    );
    assert!(go.contains("slices.Contains(xs, x)"));
    assert!(go.contains("\"slices\""));
}

#[test]
fn interpolation_lowers_to_sprintf() {
    let go = compile_default(
        "func Greet(name string) string\n    \
             return \"hello, {name}!\"\n",
    );
    assert!(go.contains("fmt.Sprintf(\"hello, %v!\", name)"));
    assert!(go.contains("\"fmt\""));
}

// ============================================================================
// Pipes
// ============================================================================

#[test]
fn data_first_pipe_matches_the_plain_call() {
    let go = compile_default(
        "func Double(x int) int\n    \
             return x * 2\n\
         func Main()\n    \
             print(5 |> Double())\n    \
             print(Double(5))\n",
    );
    assert_eq!(go.matches("fmt.Println(Double(5))").count(), 2);
}

#[test]
fn placeholder_pipe_fills_the_marked_position() {
    let go = compile_default(
        "func Clamp(lo int, x int, hi int) int\n    \
             return x\n\
         func Main()\n    \
             print(5 |> Clamp(1, _, 10))\n",
    );
    assert!(go.contains("Clamp(1, 5, 10)"));
}

#[test]
fn method_pipe_becomes_a_receiver_call() {
    let go = compile_default(
        "type Counter\n    value int\n\
         func (c Counter) Bump() int\n    \
             return c.value + 1\n\
         func Main()\n    \
             c := Counter{value: 1}\n    \
             print(c |> .Bump())\n",
    );
    assert!(go.contains("fmt.Println(c.Bump())"));
}

#[test]
fn multi_return_pipe_keeps_only_the_first_value() {
    let go = compile_default(&format!(
        "{DIVIDE}func Double(x int) int\n    \
             return x * 2\n\
         func Main()\n    \
             print(Divide(6, 3) |> Double())\n"
    ));
    assert!(go.contains("func() any { val, _ := Divide(6, 3); return val }()"));
}

// ============================================================================
// onerr lowering
// ============================================================================

#[test]
fn onerr_propagate_returns_zero_values_plus_the_error() {
    let go = compile_default(&format!(
        "{DIVIDE}func Use() int, error\n    \
             x := Divide(6, 0) onerr return\n    \
             return x, empty error\n"
    ));
    assert!(go.contains("x, err := Divide(6, 0)"));
    assert!(go.contains("if err != nil {"));
    assert!(go.contains("return 0, err"));
}

#[test]
fn onerr_discard_emits_no_conditional() {
    let go = compile_default(&format!(
        "{DIVIDE}func Use() int\n    \
             x := Divide(6, 0) onerr discard\n    \
             return x\n"
    ));
    assert!(go.contains("x, _ := Divide(6, 0)"));
    assert!(!go.contains("!= nil"));
}

#[test]
fn onerr_default_assigns_the_fallback() {
    let go = compile_default(&format!(
        "{DIVIDE}func Use() int\n    \
             x := Divide(6, 0) onerr 42\n    \
             return x\n"
    ));
    assert!(go.contains("x, err := Divide(6, 0)"));
    assert!(go.contains("x = 42"));
}

#[test]
fn onerr_explain_wraps_before_propagating() {
    let go = compile_default(&format!(
        "{DIVIDE}func Use() int, error\n    \
             x := Divide(6, 0) onerr explain \"compute failed\"\n    \
             return x, empty error\n"
    ));
    assert!(go.contains("err = fmt.Errorf(\"compute failed: %w\", err)"));
    assert!(go.contains("return 0, err"));
}

#[test]
fn onerr_panic_interpolates_the_caught_error() {
    let go = compile_default(&format!(
        "{DIVIDE}func Use() int\n    \
             x := Divide(6, 0) onerr panic \"gave up: {{error}}\"\n    \
             return x\n"
    ));
    assert!(go.contains("panic(fmt.Sprintf(\"gave up: %v\", err))"));
}

#[test]
fn onerr_temporaries_number_upward_within_a_function() {
    let go = compile_default(&format!(
        "{DIVIDE}func Use() int, error\n    \
             a := Divide(6, 0) onerr return\n    \
             b := Divide(8, 2) onerr return\n    \
             return a + b, empty error\n"
    ));
    assert!(go.contains("a, err := Divide(6, 0)"));
    assert!(go.contains("b, err2 := Divide(8, 2)"));
}

// ============================================================================
// Output modes and policy failures
// ============================================================================

#[test]
fn protocol_output_sends_print_to_stderr() {
    let options = Options {
        protocol_output: true,
        ..Options::default()
    };
    let go = compile("func Main()\n    print(\"ready\")\n", &options)
        .expect("expected successful compilation");
    assert!(go.contains("fmt.Fprintln(os.Stderr, \"ready\")"));
    assert!(go.contains("\"os\""));
}

#[test]
fn security_violations_abort_compilation() {
    let source = "import \"stdlib/db\"\n\
         func Find(pool db.Pool, name string)\n    \
             db.Query(pool, \"SELECT * FROM users WHERE name = '{name}'\") onerr discard\n";
    let errors = compile_errors(source, &Options::default());
    assert!(!errors.is_empty());
    assert!(errors
        .iter()
        .any(|d| matches!(d.category, Category::Policy)));
}

#[test]
fn diagnostics_carry_the_source_path() {
    let options = Options {
        source_path: "app/main.fr".to_string(),
        ..Options::default()
    };
    let errors = compile_errors("func Main()\n    print(missing)\n", &options);
    assert!(!errors.is_empty());
    assert!(errors.iter().all(|d| d.file == "app/main.fr"));
}

// ============================================================================
// Generics synthesis
// ============================================================================

#[test]
fn whitelisted_library_source_synthesizes_type_parameters() {
    let options = Options {
        package_name: "slice".to_string(),
        source_path: "stdlib/slice/map.fr".to_string(),
        ..Options::default()
    };
    let source = "func Map(items list of any, f func(any) any2) list of any2\n    \
             result := make(list of any2, 0)\n    \
             for x in items\n        \
                 result = append(result, f(x))\n    \
             return result\n";
    let go = compile(source, &options).expect("expected successful compilation");
    assert!(go.contains("func Map[T any, U any](items []T, f func(T) U) []U {"));
    assert!(go.contains("make([]U, 0)"));
}

#[test]
fn map_key_placeholder_gets_a_comparable_parameter() {
    let options = Options {
        package_name: "slice".to_string(),
        source_path: "stdlib/slice/group.fr".to_string(),
        ..Options::default()
    };
    let source = "func GroupBy(items list of any, key func(any) any2) map of any2 to list of any\n    \
             result := make(map of any2 to list of any)\n    \
             return result\n";
    let go = compile(source, &options).expect("expected successful compilation");
    assert!(go.contains(
        "func GroupBy[T any, K comparable](items []T, key func(T) K) map[K][]T {"
    ));
    assert!(go.contains("make(map[K][]T)"));
}

#[test]
fn no_generics_outside_the_whitelist() {
    let source = "func Identity(x any) any\n    \
             return x\n";
    let go = compile_default(source);
    assert!(go.contains("func Identity(x any) any {"));
    assert!(!go.contains('['));
}

// ============================================================================
// Structural properties
// ============================================================================

#[test]
fn generation_is_byte_stable() {
    let source = format!(
        "{DIVIDE}func Main()\n    \
             x := Divide(6, 3) onerr discard\n    \
             print(\"result: {{x}}\")\n"
    );
    let first = compile_default(&source);
    let second = compile_default(&source);
    assert_eq!(first, second);
}

#[test]
fn struct_fields_carry_json_tags_from_aliases() {
    let go = compile_default(
        "type User\n    \
             name string as \"user_name\"\n    \
             age int\n\
         func Main()\n    \
             u := User{name: \"ada\", age: 36}\n    \
             print(u.name)\n",
    );
    assert!(go.contains("type User struct {"));
    assert!(go.contains("name string `json:\"user_name\"`"));
    assert!(go.contains("age int"));
}

#[test]
fn range_loops_lower_to_native_for() {
    let go = compile_default(
        "func Sum(n int) int\n    \
             total := 0\n    \
             for i from 0 to n\n        \
                 total = total + i\n    \
             for j from 1 through 3\n        \
                 total = total + j\n    \
             return total\n",
    );
    assert!(go.contains("for i := 0; i < n; i++ {"));
    assert!(go.contains("for j := 1; j <= 3; j++ {"));
}

#[test]
fn negative_literal_index_counts_from_the_end() {
    let go = compile_default(
        "func Last(xs list of int) int\n    \
             return xs[-1]\n",
    );
    assert!(go.contains("xs[len(xs)-1]"));
}

#[test]
fn channels_render_go_primitives() {
    let go = compile_default(
        "func Pump(ch channel of int)\n    \
             send 1 to ch\n    \
             x := receive from ch\n    \
             print(x)\n    \
             close ch\n",
    );
    assert!(go.contains("ch <- 1"));
    assert!(go.contains("x := <-ch"));
    assert!(go.contains("close(ch)"));
}
