use pretty_assertions::assert_eq;

use tinylang::ast_printer::AstPrinter;
use tinylang::ast_reader::read_program;
use tinylang::diagnostics::Diagnostics;
use tinylang::interpreter::Interpreter;
use tinylang::parser::Parser;
use tinylang::resolver::Resolver;
use tinylang::runner::{CapturedOutput, Session};
use tinylang::scanner::scan;
use tinylang::stmt::Stmt;

const PROGRAMS: &[&str] = &[
    "print 1 + 2 * 3 - -4 / (2 ** 1) % 3;",
    "let x = 10; { let x = x + 1; print x; } print x;",
    "let s; s = \"multi word\" + \" string\"; print s; print !nil == true;",
    "print nil or false and 1 >= 2 or 3 != 4;",
    "for (let i = 0; i < 3; i = i + 1) { if (i == 1) print \"one\"; else print i; }",
    "fn make() { let i = 0; fn inc() { i = i + 1; return i; } return inc; } \
     let c = make(); print c(); print c();",
    "let twice = fn (f, v) { return f(f(v)); }; print twice(fn (n) { return n * 2; }, 5);",
    "class A { fn init(v) { this.v = v; } fn get() { return this.v; } static fn unit() { return A(1); } } \
     class B < A { fn get() { return super.get() + 100; } } \
     let b = B(2); b.v = b.v + 1; print b.get(); print A.unit().get(); print b;",
    "fn early(n) { while (true) { if (n > 2) return n; n = n + 1; } } print early(0); \
     fn none() { return; } print none();",
];

fn parse(source: &str) -> Vec<Stmt> {
    let mut diagnostics = Diagnostics::quiet();
    let tokens = scan(source, &mut diagnostics);
    let statements = Parser::new(tokens).parse(&mut diagnostics);

    assert!(
        !diagnostics.had_error(),
        "{:?}: {:?}",
        source,
        diagnostics.messages()
    );

    statements
}

fn run_source(source: &str) -> String {
    let (mut session, output) = Session::capturing();
    session.run(source);
    output.contents()
}

fn run_statements(statements: &[Stmt]) -> String {
    let output = CapturedOutput::new();
    let mut interpreter = Interpreter::with_output(Box::new(output.clone()));
    let mut diagnostics = Diagnostics::quiet();

    Resolver::new(&mut interpreter, &mut diagnostics).resolve(statements);
    assert!(!diagnostics.had_error(), "{:?}", diagnostics.messages());

    interpreter.interpret(statements).unwrap();

    output.contents()
}

#[test]
fn printing_the_reread_tree_is_stable() {
    for source in PROGRAMS {
        let printed = AstPrinter::print_program(&parse(source));
        let reread = read_program(&printed).unwrap();

        assert_eq!(AstPrinter::print_program(&reread), printed, "{}", source);
    }
}

#[test]
fn reread_tree_runs_the_same() {
    for source in PROGRAMS {
        let printed = AstPrinter::print_program(&parse(source));
        let reread = read_program(&printed).unwrap();

        assert_eq!(run_statements(&reread), run_source(source), "{}", source);
    }
}

#[test]
fn overflowing_literals_read_back_as_numbers() {
    let source = format!("print 1{} + 1; print -0;", "0".repeat(400));

    let printed = AstPrinter::print_program(&parse(&source));
    assert_eq!(printed, "(print (+ 1e999 1))\n(print (- 0))");

    let reread = read_program(&printed).unwrap();
    assert_eq!(AstPrinter::print_program(&reread), printed);
    assert_eq!(run_statements(&reread), "Infinity\n-0\n");
    assert_eq!(run_source(&source), "Infinity\n-0\n");
}

#[test]
fn expression_forms() {
    let statements = parse("a.b(c, \"d\").e = fn () { return this; };");

    assert_eq!(
        AstPrinter::print_program(&statements),
        "(set (get (call (get a b) c \"d\") e) (fn () (return this)))"
    );
}

#[test]
fn reader_rejects_malformed_text() {
    assert!(read_program("(print 1").is_err());
    assert!(read_program("(unknown 1 2)").is_err());
    assert!(read_program("(let)").is_err());
    assert!(read_program("(class A (nonsense))").is_err());
}
