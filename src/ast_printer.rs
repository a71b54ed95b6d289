use crate::expr::{Expr, LiteralValue};
use crate::stmt::{FunctionDecl, Stmt};
use crate::value::format_number;

/// Converts statements and expressions to a fully parenthesised prefix form.
/// The output is read back by [`crate::ast_reader`].
pub struct AstPrinter;

impl AstPrinter {
    /// One line per top‑level statement.
    pub fn print_program(statements: &[Stmt]) -> String {
        statements
            .iter()
            .map(Self::print_stmt)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => Self::print_expr(expr),

            Stmt::Print(expr) => format!("(print {})", Self::print_expr(expr)),

            Stmt::Let { name, initializer } => match initializer {
                Some(init) => format!("(let {} {})", name.lexeme, Self::print_expr(init)),
                None => format!("(let {})", name.lexeme),
            },

            Stmt::Block(statements) => parenthesize("block", statements.iter().map(Self::print_stmt)),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let mut parts = vec![Self::print_expr(condition), Self::print_stmt(then_branch)];
                if let Some(else_stmt) = else_branch {
                    parts.push(Self::print_stmt(else_stmt));
                }
                parenthesize("if", parts)
            }

            Stmt::While { condition, body } => format!(
                "(while {} {})",
                Self::print_expr(condition),
                Self::print_stmt(body)
            ),

            Stmt::Function(decl) => Self::print_function(decl),

            Stmt::Return { value, .. } => match value {
                Some(value) => format!("(return {})", Self::print_expr(value)),
                None => "(return)".into(),
            },

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let mut parts = vec![name.lexeme.clone()];
                if let Some(superclass) = superclass {
                    parts.push("<".into());
                    parts.push(Self::print_expr(superclass));
                }
                parts.extend(methods.iter().map(|m| Self::print_function(m)));
                parenthesize("class", parts)
            }
        }
    }

    pub fn print_expr(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => match lit {
                LiteralValue::True => "true".into(),

                LiteralValue::False => "false".into(),

                LiteralValue::Nil => "nil".into(),

                LiteralValue::Str(s) => format!("\"{}\"", s),

                LiteralValue::Number(n) => print_number(*n),
            },

            // ── grouping ────────────────────────────────────────────────
            Expr::Grouping(inner) => format!("(group {})", Self::print_expr(inner)),

            // ── operators ───────────────────────────────────────────────
            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print_expr(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print_expr(left),
                Self::print_expr(right)
            ),

            // ── names ───────────────────────────────────────────────────
            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                format!("(assign {} {})", name.lexeme, Self::print_expr(value))
            }

            Expr::This { .. } => "this".into(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),

            // ── calls and properties ────────────────────────────────────
            Expr::Call {
                callee, arguments, ..
            } => {
                let mut s = format!("(call {}", Self::print_expr(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print_expr(arg));
                }
                s.push(')');
                s
            }

            Expr::Get { object, name } => {
                format!("(get {} {})", Self::print_expr(object), name.lexeme)
            }

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(set {} {} {})",
                Self::print_expr(object),
                name.lexeme,
                Self::print_expr(value)
            ),

            // ── function literal ────────────────────────────────────────
            Expr::Function(decl) => {
                let mut parts = vec![print_params(decl)];
                parts.extend(decl.body.iter().map(Self::print_stmt));
                parenthesize("fn", parts)
            }
        }
    }

    fn print_function(decl: &FunctionDecl) -> String {
        let head = if decl.is_static { "static fn" } else { "fn" };

        let mut parts = vec![decl.name().to_string(), print_params(decl)];
        parts.extend(decl.body.iter().map(Self::print_stmt));
        parenthesize(head, parts)
    }
}

/// Literals that overflow `f64` print as an equally overflowing numeral so
/// they read back as numbers.
fn print_number(n: f64) -> String {
    if n.is_infinite() {
        let text = if n > 0.0 { "1e999" } else { "-1e999" };
        text.to_string()
    } else {
        format_number(n)
    }
}

fn print_params(decl: &FunctionDecl) -> String {
    let names: Vec<&str> = decl.params.iter().map(|p| p.lexeme.as_str()).collect();
    format!("({})", names.join(" "))
}

fn parenthesize<I>(head: &str, parts: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut s = format!("({}", head);
    for part in parts {
        s.push(' ');
        s.push_str(&part);
    }
    s.push(')');
    s
}
