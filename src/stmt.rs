use std::rc::Rc;

use crate::expr::Expr;
use crate::token::Token;

/// Shared body of a function declaration, method, or function literal.
///
/// Held behind `Rc` so that every runtime closure created from the same
/// declaration points at one immutable copy of the body.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    /// `None` for anonymous function literals.
    pub name: Option<Token>,

    /// Parameter name tokens (arity ≤ 255).
    pub params: Vec<Token>,

    pub body: Vec<Stmt>,

    /// Set by a leading `static` inside a class body.
    pub is_static: bool,
}

impl FunctionDecl {
    /// Declared name, or `"anonymous"` for literals.
    pub fn name(&self) -> &str {
        self.name
            .as_ref()
            .map(|t| t.lexeme.as_str())
            .unwrap_or("anonymous")
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// **Abstract‑Syntax‑Tree node** for *statements*.  A program is a sequence
/// of these nodes returned by [`crate::parser::Parser::parse`].
///
/// There is no `for` node: the parser desugars `for` into `Block`/`While`.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    Print(Expr),

    /// Variable declaration: `"let" IDENT ("=" initializer)? ";"`.
    Let {
        name: Token,
        initializer: Option<Expr>,
    },

    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    While {
        condition: Expr,
        body: Box<Stmt>,
    },

    /// Named function declaration; `decl.name` is always present.
    Function(Rc<FunctionDecl>),

    Return {
        /// The `return` keyword token (for resolver error locations).
        keyword: Token,

        /// Absent ⇒ `nil` is returned.
        value: Option<Expr>,
    },

    Class {
        name: Token,

        /// Always an `Expr::Variable` when present.
        superclass: Option<Expr>,

        /// Instance and static methods, in declaration order.
        methods: Vec<Rc<FunctionDecl>>,
    },
}
