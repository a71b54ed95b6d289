use pretty_assertions::assert_eq;

use tinylang::runner::{Outcome, Session};

struct Run {
    outcome: Outcome,
    output: String,
    errors: Vec<String>,
}

fn run(source: &str) -> Run {
    let (mut session, output) = Session::capturing();
    let outcome = session.run(source);

    Run {
        outcome,
        output: output.contents(),
        errors: session
            .diagnostics()
            .errors()
            .iter()
            .map(|e| e.to_string())
            .collect(),
    }
}

/// Run a program that must complete and return what it printed.
fn output_of(source: &str) -> String {
    let result = run(source);

    assert_eq!(
        result.outcome,
        Outcome::Completed,
        "errors: {:?}",
        result.errors
    );

    result.output
}

fn assert_runtime_error(source: &str, expected_output: &str, expected_error: &str) {
    let result = run(source);

    assert_eq!(result.outcome, Outcome::RuntimeError);
    assert_eq!(result.output, expected_output);
    assert_eq!(result.errors, vec![expected_error.to_string()]);
}

// ───────────────────────── expressions ─────────────────────────

#[test]
fn integral_division_prints_without_fraction() {
    assert_eq!(output_of("print 6 / 3;"), "2\n");
    assert_eq!(output_of("print 7 / 2;"), "3.5\n");
    assert_eq!(output_of("print -0.5 * 4;"), "-2\n");
}

#[test]
fn extended_arithmetic_operators() {
    assert_eq!(output_of("print 2 ** 10;"), "1024\n");
    assert_eq!(output_of("print 7 % 3;"), "1\n");
    assert_eq!(output_of("print 2 ** 3 * 2;"), "16\n");
}

#[test]
fn plus_concatenates_when_either_side_is_a_string() {
    assert_eq!(
        output_of("print \"a\" + \"b\"; print \"n=\" + 3; print 1.5 + \"x\"; print nil + \"!\";"),
        "ab\nn=3\n1.5x\nnil!\n"
    );
}

#[test]
fn equality_never_raises() {
    assert_eq!(
        output_of("print 1 == \"1\"; print nil == false; print nil == nil; print \"a\" != \"b\";"),
        "false\nfalse\ntrue\ntrue\n"
    );
}

#[test]
fn truthiness_and_short_circuit_values() {
    let source = "\
print 0 and \"zero is truthy\";
print \"\" and \"empty is truthy\";
print nil or \"fallback\";
print false and undefined_name;
print true or undefined_name;";

    assert_eq!(
        output_of(source),
        "zero is truthy\nempty is truthy\nfallback\nfalse\ntrue\n"
    );
}

#[test]
fn operand_type_errors() {
    assert_runtime_error(
        "print 1 - \"a\";",
        "",
        "Operands of '-' must be numbers.\n[line 1]",
    );
    assert_runtime_error(
        "print true + 1;",
        "",
        "Operands of '+' must be numbers.\n[line 1]",
    );
    assert_runtime_error(
        "print \"a\" < \"b\";",
        "",
        "Operands of '<' must be numbers.\n[line 1]",
    );
    assert_runtime_error(
        "print -\"a\";",
        "",
        "Operand of '-' must be a number.\n[line 1]",
    );
}

#[test]
fn division_by_zero_halts_the_program() {
    assert_runtime_error(
        "print \"before\";\n1 / 0;\nprint \"after\";",
        "before\n",
        "Division by zero.\n[line 2]",
    );
    assert_runtime_error("print 5 % 0;", "", "Division by zero.\n[line 1]");
}

// ───────────────────────── variables and scope ─────────────────

#[test]
fn shadowing_does_not_mutate_outer_binding() {
    assert_eq!(
        output_of("let x = 10; { let x = x + 1; print x; } print x;"),
        "11\n10\n"
    );
}

#[test]
fn uninitialised_variables_are_nil() {
    assert_eq!(output_of("let a; print a;"), "nil\n");
}

#[test]
fn undefined_variables() {
    assert_runtime_error(
        "print missing;",
        "",
        "Undefined variable 'missing'.\n[line 1]",
    );
    assert_runtime_error(
        "missing = 1;",
        "",
        "Undefined variable 'missing'.\n[line 1]",
    );
}

#[test]
fn loops() {
    let source = "\
let total = 0;
for (let i = 1; i <= 4; i = i + 1) total = total + i;
print total;
let n = 3;
while (n > 0) { print n; n = n - 1; }";

    assert_eq!(output_of(source), "10\n3\n2\n1\n");
}

// ───────────────────────── functions and closures ──────────────

#[test]
fn closures_share_mutable_state() {
    let source = "\
fn make() { let i = 0; fn inc() { i = i + 1; return i; } return inc; }
let c = make();
print c();
print c();";

    assert_eq!(output_of(source), "1\n2\n");
}

#[test]
fn two_closures_see_the_same_frame() {
    let source = "\
let get; let set;
{
  let shared = 1;
  fn g() { return shared; }
  fn s(v) { shared = v; }
  get = g; set = s;
}
set(42);
print get();";

    assert_eq!(output_of(source), "42\n");
}

#[test]
fn return_unwinds_nested_blocks_and_loops() {
    let source = "\
fn find() {
  let i = 0;
  while (true) {
    { if (i == 3) return i; }
    i = i + 1;
  }
}
print find();
fn nothing() { return; }
print nothing();
fn implicit() {}
print implicit();";

    assert_eq!(output_of(source), "3\nnil\nnil\n");
}

#[test]
fn recursion() {
    let source = "\
fn fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }
print fib(15);";

    assert_eq!(output_of(source), "610\n");
}

#[test]
fn function_literals_and_display() {
    let source = "\
let add = fn (a, b) { return a + b; };
print add(2, 3);
print add;
fn named() {}
print named;
print clock;";

    assert_eq!(
        output_of(source),
        "5\n<fn anonymous>\n<fn named>\n<native fn clock>\n"
    );
}

#[test]
fn clock_returns_seconds() {
    assert_eq!(output_of("print clock() > 1000000000;"), "true\n");
}

#[test]
fn call_errors() {
    assert_runtime_error(
        "fn f(a) {} f();",
        "",
        "Expected 1 arguments but got 0.\n[line 1]",
    );
    assert_runtime_error(
        "\"text\"();",
        "",
        "Can only call functions and classes.\n[line 1]",
    );
    assert_runtime_error(
        "clock(1);",
        "",
        "Expected 0 arguments but got 1.\n[line 1]",
    );
}

// ───────────────────────── classes ─────────────────────────────

#[test]
fn methods_and_arity() {
    let source = "\
class A { fn greet() { return \"hi\"; } }
class B { }
let a = A();
print a.greet();
print a;
print A;
a.greet(1);";

    assert_runtime_error(
        source,
        "hi\nA instance\nA\n",
        "Expected 0 arguments but got 1.\n[line 7]",
    );
}

#[test]
fn initializers_fields_and_this() {
    let source = "\
class Point {
  fn init(x, y) { this.x = x; this.y = y; }
  fn sum() { return this.x + this.y; }
}
let p = Point(1, 2);
print p.sum();
p.x = 10;
print p.sum();
print p.init(3, 4) == p;
print p.sum();";

    assert_eq!(output_of(source), "3\n12\ntrue\n7\n");
}

#[test]
fn fields_shadow_methods_and_bound_methods_remember_this() {
    let source = "\
class Box {
  fn init(v) { this.v = v; }
  fn get() { return this.v; }
}
let b = Box(1);
let m = b.get;
b.v = 2;
print m();
b.get = \"field\";
print b.get;";

    assert_eq!(output_of(source), "2\nfield\n");
}

#[test]
fn constructor_arity() {
    assert_runtime_error(
        "class P { fn init(a) {} } P();",
        "",
        "Expected 1 arguments but got 0.\n[line 1]",
    );
    assert_runtime_error(
        "class Q {} Q(1, 2);",
        "",
        "Expected 0 arguments but got 2.\n[line 1]",
    );
}

#[test]
fn static_init_does_not_hide_inherited_initializer() {
    let source = "\
class A { fn init(x) { this.x = x; } }
class B < A { static fn init() { return 1; } }
let b = B(5);
print b.x;
print B.init();";

    assert_eq!(output_of(source), "5\n1\n");
}

#[test]
fn property_errors() {
    assert_runtime_error(
        "class A {} print A().nope;",
        "",
        "Undefined property 'nope'.\n[line 1]",
    );
    assert_runtime_error("print 4.x;", "", "Only instances have properties.\n[line 1]");
    assert_runtime_error(
        "let s = \"str\"; s.x = 1;",
        "",
        "Only instances have fields.\n[line 1]",
    );
}

#[test]
fn static_methods() {
    let source = "\
class Math {
  static fn square(n) { return n * n; }
  fn viaInstance() { return Math.square(3); }
}
print Math.square(4);
print Math().square(5);
print Math().viaInstance();";

    assert_eq!(output_of(source), "16\n25\n9\n");
}

#[test]
fn inheritance_and_super() {
    let source = "\
class Animal {
  fn init(name) { this.name = name; }
  fn speak() { return this.name + \" makes a sound\"; }
}
class Dog < Animal {
  fn speak() { return super.speak() + \" (woof)\"; }
}
let d = Dog(\"Rex\");
print d.speak();
print d;";

    assert_eq!(output_of(source), "Rex makes a sound (woof)\nDog instance\n");
}

#[test]
fn super_resolves_from_the_declaring_class() {
    let source = "\
class A { fn method() { print \"A\"; } }
class B < A { fn method() { print \"B\"; } fn test() { super.method(); } }
class C < B {}
C().test();";

    assert_eq!(output_of(source), "A\n");
}

#[test]
fn superclass_must_be_a_class() {
    assert_runtime_error(
        "let NotClass = 1;\nclass A < NotClass {}",
        "",
        "Superclass must be a class.\n[line 2]",
    );
}

#[test]
fn classes_can_refer_to_themselves() {
    let source = "\
class Node {
  fn init(next) { this.next = next; }
  fn spawn() { return Node(this); }
}
print Node(nil).spawn().next.next;";

    assert_eq!(output_of(source), "nil\n");
}

// ───────────────────────── compile errors ──────────────────────

#[test]
fn syntax_errors_prevent_execution() {
    let result = run("print \"never\";\n1 + + ;\nprint \"also never\";");

    assert_eq!(result.outcome, Outcome::CompileError);
    assert_eq!(result.output, "");
    assert_eq!(
        result.errors,
        vec!["[line 2] Error at '+': Expect expression."]
    );
}

#[test]
fn lexical_and_syntax_errors_are_all_reported() {
    let result = run("let a = @;\nprint (1;");

    assert_eq!(result.outcome, Outcome::CompileError);
    assert_eq!(
        result.errors,
        vec![
            "[line 1] Error: Unexpected character.",
            "[line 1] Error at ';': Expect expression.",
            "[line 2] Error at ';': Expect ')' after expression.",
        ]
    );
}

#[test]
fn exit_codes() {
    assert_eq!(Outcome::Completed.exit_code(), 0);
    assert_eq!(Outcome::CompileError.exit_code(), 65);
    assert_eq!(Outcome::RuntimeError.exit_code(), 70);
}
