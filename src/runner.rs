//! The scan → parse → resolve → interpret pipeline.
//!
//! A [`Session`] owns one interpreter, so globals and resolved distances
//! persist across REPL lines, and one [`Diagnostics`] collector that is reset
//! before every run.

use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner;
use crate::stmt::Stmt;
use crate::token::Token;

/// How a single run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,

    /// Lexical, syntax or resolution errors; nothing was executed.
    CompileError,

    RuntimeError,
}

impl Outcome {
    /// Process exit status for file mode.
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Completed => 0,
            Outcome::CompileError => 65,
            Outcome::RuntimeError => 70,
        }
    }
}

/// In‑memory, cloneable `Write` sink.  Every clone appends to the same buffer.
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.borrow()).into_owned()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct Session {
    interpreter: Interpreter,
    diagnostics: Diagnostics,
    /// First `ExprId` for the next parse; ids never repeat within a session.
    next_id: u32,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Prints to stdout, reports to stderr.
    pub fn new() -> Self {
        Self::with_parts(Interpreter::new(), Diagnostics::new())
    }

    /// Program output goes to `out`; diagnostics are recorded but not echoed.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        Self::with_parts(Interpreter::with_output(out), Diagnostics::quiet())
    }

    /// A quiet session whose program output is captured in memory.
    pub fn capturing() -> (Self, CapturedOutput) {
        let output = CapturedOutput::new();
        (Self::with_output(Box::new(output.clone())), output)
    }

    fn with_parts(interpreter: Interpreter, diagnostics: Diagnostics) -> Self {
        info!("Session created");

        Self {
            interpreter,
            diagnostics,
            next_id: 0,
        }
    }

    /// Diagnostics from the most recent run.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// File mode: run a whole program.
    pub fn run(&mut self, source: &str) -> Outcome {
        info!("Running program ({} bytes)", source.len());

        self.execute(source, false)
    }

    /// REPL mode: like [`Session::run`], but a line holding exactly one
    /// expression statement prints its value.
    pub fn run_line(&mut self, line: &str) -> Outcome {
        debug!("Running REPL line: {}", line);

        self.execute(line, true)
    }

    /// Read lines from `input` until EOF or `exit` (any case), writing the
    /// `"> "` prompt to `prompt` before each one.  Errors are reported and
    /// the loop carries on.
    pub fn repl<R: BufRead, W: Write>(&mut self, input: R, mut prompt: W) -> Result<()> {
        info!("Starting REPL");

        let mut lines = input.lines();

        loop {
            write!(prompt, "> ")?;
            prompt.flush()?;

            let Some(line) = lines.next() else {
                break;
            };
            let line: String = line?;

            if line.trim_end_matches(['\r', '\n']).eq_ignore_ascii_case("exit") {
                break;
            }

            let outcome = self.run_line(&line);
            debug!("REPL line finished: {:?}", outcome);
        }

        info!("REPL finished");

        Ok(())
    }

    fn execute(&mut self, source: &str, echo: bool) -> Outcome {
        self.diagnostics.reset();

        let Some(statements) = self.compile(source) else {
            return Outcome::CompileError;
        };

        let result = match statements.as_slice() {
            [Stmt::Expression(expr)] if echo => self.interpreter.interpret_expression(expr),
            _ => self.interpreter.interpret(&statements),
        };

        match result {
            Ok(()) => Outcome::Completed,
            Err(e) => {
                debug!("Runtime error: {}", e);
                self.diagnostics.report(e);
                Outcome::RuntimeError
            }
        }
    }

    /// Scan, parse and resolve.  `None` if any stage reported an error.
    fn compile(&mut self, source: &str) -> Option<Vec<Stmt>> {
        let tokens: Vec<Token> = scanner::scan(source, &mut self.diagnostics);
        debug!("Scanned {} tokens", tokens.len());

        let mut parser = Parser::with_id_base(tokens, self.next_id);
        let statements: Vec<Stmt> = parser.parse(&mut self.diagnostics);
        self.next_id = parser.next_id();

        if self.diagnostics.had_error() {
            info!("Compile errors; skipping resolution");
            return None;
        }

        Resolver::new(&mut self.interpreter, &mut self.diagnostics).resolve(&statements);

        if self.diagnostics.had_error() {
            info!("Resolution errors; skipping execution");
            return None;
        }

        Some(statements)
    }
}
