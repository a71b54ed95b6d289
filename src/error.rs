//! Centralised error hierarchy for the **TinyLang interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here.  This enables a
//! uniform `Result<T>` alias throughout the crate and ergonomic inter‑operation
//! with `anyhow`, while still preserving rich diagnostic detail.
//!
//! The `Display` form of every variant *is* the user‑facing diagnostic line:
//!
//! * compile‑time errors: `[line <n>] Error<where>: <message>`
//! * runtime errors: `<message>\n[line <n>]`
//!
//! The module **does not** print diagnostics itself; see [`crate::diagnostics`].

use std::io;
use thiserror::Error;

use log::info;

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TinyLangError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.  `location` is empty, ` at end`, or ` at '<lexeme>'`.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        location: String,
        line: usize,
    },

    /// Static‑analysis or resolution failure (redeclaration, illegal `return`, …).
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        location: String,
        line: usize,
    },

    /// Runtime evaluation error raised at a specific token.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Malformed input handed to [`crate::ast_reader`].
    #[error("Error reading AST: {message}")]
    Read { message: String },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl TinyLangError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        TinyLangError::Lex { message, line }
    }

    /// Helper constructor for the **parser**; the location is derived from `token`.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Parse error: line={}, lexeme={}, msg={}",
            token.line, token.lexeme, message
        );

        TinyLangError::Parse {
            message,
            location: location_of(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Resolve error: line={}, lexeme={}, msg={}",
            token.line, token.lexeme, message
        );

        TinyLangError::Resolve {
            message,
            location: location_of(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", token.line, message);

        TinyLangError::Runtime {
            message,
            line: token.line,
        }
    }

    /// Helper constructor for the **AST reader**.
    pub fn read<S: Into<String>>(msg: S) -> Self {
        TinyLangError::Read {
            message: msg.into(),
        }
    }

    /// `true` for lexical, syntactic and resolution errors.
    pub fn is_compile_time(&self) -> bool {
        matches!(
            self,
            TinyLangError::Lex { .. } | TinyLangError::Parse { .. } | TinyLangError::Resolve { .. }
        )
    }

    /// The bare message, without the line decoration.
    pub fn message(&self) -> String {
        match self {
            TinyLangError::Lex { message, .. }
            | TinyLangError::Parse { message, .. }
            | TinyLangError::Resolve { message, .. }
            | TinyLangError::Runtime { message, .. }
            | TinyLangError::Read { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

fn location_of(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, TinyLangError>;
