//! Explicit diagnostics collector threaded through the pipeline.
//!
//! Every stage reports into a `Diagnostics` instead of flipping process‑wide
//! flags.  The session resets it before each file run and before each REPL line.

use log::debug;

use crate::error::TinyLangError;

#[derive(Debug)]
pub struct Diagnostics {
    errors: Vec<TinyLangError>,
    had_error: bool,
    had_runtime_error: bool,
    echo: bool,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    /// A collector that also writes every report to standard error.
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            had_error: false,
            had_runtime_error: false,
            echo: true,
        }
    }

    /// A collector that only records.
    pub fn quiet() -> Self {
        Self {
            echo: false,
            ..Self::new()
        }
    }

    pub fn report(&mut self, error: TinyLangError) {
        debug!("Diagnostic reported: {}", error);

        if self.echo {
            eprintln!("{}", error);
        }

        if error.is_compile_time() {
            self.had_error = true;
        } else {
            self.had_runtime_error = true;
        }

        self.errors.push(error);
    }

    /// Any lexical, syntactic or resolution error since the last reset?
    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    pub fn errors(&self) -> &[TinyLangError] {
        &self.errors
    }

    /// Messages of every recorded error, in report order.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(TinyLangError::message).collect()
    }

    pub fn reset(&mut self) {
        debug!("Resetting diagnostics ({} recorded)", self.errors.len());

        self.errors.clear();
        self.had_error = false;
        self.had_runtime_error = false;
    }
}
