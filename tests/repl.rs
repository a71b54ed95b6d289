use std::io::Cursor;

use pretty_assertions::assert_eq;

use tinylang::runner::{CapturedOutput, Outcome, Session};

#[test]
fn bindings_persist_across_lines() {
    let (mut session, output) = Session::capturing();

    assert_eq!(session.run_line("let x = 1;"), Outcome::Completed);
    assert_eq!(
        session.run_line("fn bump() { x = x + 1; return x; }"),
        Outcome::Completed
    );
    assert_eq!(session.run_line("print bump();"), Outcome::Completed);
    assert_eq!(session.run_line("print x;"), Outcome::Completed);

    assert_eq!(output.contents(), "2\n2\n");
}

#[test]
fn single_expression_lines_echo_their_value() {
    let (mut session, output) = Session::capturing();

    session.run_line("1 + 2;");
    session.run_line("\"a\" + \"b\";");
    // Two statements on one line: nothing echoed.
    session.run_line("3; 4;");
    session.run_line("let y = 5;");
    session.run_line("y;");

    assert_eq!(output.contents(), "3\nab\n5\n");
}

#[test]
fn errors_do_not_poison_later_lines() {
    let (mut session, output) = Session::capturing();

    assert_eq!(session.run_line("print ;"), Outcome::CompileError);
    assert_eq!(
        session.diagnostics().messages(),
        vec!["Expect expression."]
    );

    assert_eq!(session.run_line("print 1 / 0;"), Outcome::RuntimeError);
    assert_eq!(session.diagnostics().messages(), vec!["Division by zero."]);
    assert!(session.diagnostics().had_runtime_error());
    assert!(!session.diagnostics().had_error());

    assert_eq!(session.run_line("print \"still alive\";"), Outcome::Completed);
    assert!(session.diagnostics().errors().is_empty());

    assert_eq!(output.contents(), "still alive\n");
}

#[test]
fn closures_from_earlier_lines_keep_their_distances() {
    let (mut session, output) = Session::capturing();

    session.run_line("fn counter() { let n = 0; return fn () { n = n + 1; return n; }; }");
    session.run_line("let c = counter();");
    session.run_line("{ let n = 100; print c(); }");
    session.run_line("print c();");

    assert_eq!(output.contents(), "1\n2\n");
}

#[test]
fn loop_stops_at_exit_in_any_case() {
    let (mut session, output) = Session::capturing();
    let prompt = CapturedOutput::new();

    let input = Cursor::new("print 1;\nExIt\nprint 2;\n");
    session.repl(input, prompt.clone()).unwrap();

    assert_eq!(output.contents(), "1\n");
    assert_eq!(prompt.contents(), "> > ");
}

#[test]
fn loop_stops_at_end_of_input() {
    let (mut session, output) = Session::capturing();
    let prompt = CapturedOutput::new();

    let input = Cursor::new("let a = 2;\na * 21;\n");
    session.repl(input, prompt.clone()).unwrap();

    assert_eq!(output.contents(), "42\n");
    assert_eq!(prompt.contents(), "> > > ");
}
