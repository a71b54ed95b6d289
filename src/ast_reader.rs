//! Reader for the prefix form produced by [`crate::ast_printer::AstPrinter`].
//!
//! Reading happens in two passes: the text is first split into a tree of
//! atoms, string literals and lists, which is then lowered into [`Stmt`] and
//! [`Expr`] nodes.  Every variable‑like node receives a fresh [`ExprId`]
//! (numbered from zero) so the result can be resolved and run like parser
//! output.  Synthesised tokens carry line 1.

use std::rc::Rc;

use log::debug;

use crate::error::{Result, TinyLangError};
use crate::expr::{Expr, ExprId, LiteralValue};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};

const LINE: usize = 1;

#[derive(Debug, Clone, PartialEq)]
enum SExpr {
    Atom(String),
    Str(String),
    List(Vec<SExpr>),
}

/// Parse printed statements back into AST nodes.
pub fn read_program(text: &str) -> Result<Vec<Stmt>> {
    let forms: Vec<SExpr> = split_forms(text)?;

    debug!("Read {} top-level forms", forms.len());

    let mut reader = Reader { next_id: 0 };
    forms.iter().map(|form| reader.stmt(form)).collect()
}

// ────────────────────── pass one: text → tree ───────────────────────

fn split_forms(text: &str) -> Result<Vec<SExpr>> {
    let mut chars = text.chars().peekable();
    let mut stack: Vec<Vec<SExpr>> = vec![Vec::new()];

    while let Some(&c) = chars.peek() {
        match c {
            '(' => {
                chars.next();
                stack.push(Vec::new());
            }

            ')' => {
                chars.next();
                let list = stack.pop().filter(|_| !stack.is_empty());
                let (Some(list), Some(parent)) = (list, stack.last_mut()) else {
                    return Err(TinyLangError::read("Unbalanced ')'."));
                };
                parent.push(SExpr::List(list));
            }

            '"' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some(ch) => s.push(ch),
                        None => return Err(TinyLangError::read("Unterminated string.")),
                    }
                }
                push_form(&mut stack, SExpr::Str(s))?;
            }

            c if c.is_whitespace() => {
                chars.next();
            }

            _ => {
                let mut atom = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_whitespace() || matches!(ch, '(' | ')' | '"') {
                        break;
                    }
                    atom.push(ch);
                    chars.next();
                }
                push_form(&mut stack, SExpr::Atom(atom))?;
            }
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(forms), true) => Ok(forms),
        _ => Err(TinyLangError::read("Unbalanced '('.")),
    }
}

fn push_form(stack: &mut [Vec<SExpr>], form: SExpr) -> Result<()> {
    stack
        .last_mut()
        .map(|top| top.push(form))
        .ok_or_else(|| TinyLangError::read("Unbalanced ')'."))
}

// ────────────────────── pass two: tree → AST ────────────────────────

struct Reader {
    next_id: u32,
}

impl Reader {
    fn fresh_id(&mut self) -> ExprId {
        let id = ExprId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn stmt(&mut self, form: &SExpr) -> Result<Stmt> {
        let SExpr::List(items) = form else {
            return Ok(Stmt::Expression(self.expr(form)?));
        };

        let Some(head) = items.first().and_then(atom) else {
            return Ok(Stmt::Expression(self.expr(form)?));
        };

        match (head, items.len()) {
            ("print", 2) => Ok(Stmt::Print(self.expr(&items[1])?)),

            ("let", 2) => Ok(Stmt::Let {
                name: self.name(&items[1])?,
                initializer: None,
            }),

            ("let", 3) => Ok(Stmt::Let {
                name: self.name(&items[1])?,
                initializer: Some(self.expr(&items[2])?),
            }),

            ("block", _) => Ok(Stmt::Block(self.stmts(&items[1..])?)),

            ("if", 3 | 4) => Ok(Stmt::If {
                condition: self.expr(&items[1])?,
                then_branch: Box::new(self.stmt(&items[2])?),
                else_branch: match items.get(3) {
                    Some(else_form) => Some(Box::new(self.stmt(else_form)?)),
                    None => None,
                },
            }),

            ("while", 3) => Ok(Stmt::While {
                condition: self.expr(&items[1])?,
                body: Box::new(self.stmt(&items[2])?),
            }),

            ("return", 1 | 2) => Ok(Stmt::Return {
                keyword: Token::new(TokenType::RETURN, "return", LINE),
                value: match items.get(1) {
                    Some(value) => Some(self.expr(value)?),
                    None => None,
                },
            }),

            // `(fn name (..) ..)` declares; `(fn (..) ..)` is a literal.
            ("fn", _) if matches!(items.get(1), Some(SExpr::Atom(_))) => {
                Ok(Stmt::Function(self.function(&items[1..], false)?))
            }

            ("class", _) => self.class(&items[1..]),

            _ => Ok(Stmt::Expression(self.expr(form)?)),
        }
    }

    fn stmts(&mut self, forms: &[SExpr]) -> Result<Vec<Stmt>> {
        forms.iter().map(|form| self.stmt(form)).collect()
    }

    fn class(&mut self, items: &[SExpr]) -> Result<Stmt> {
        let name: Token = self.name(items.first().ok_or_else(|| malformed("class"))?)?;

        let (superclass, rest) = match items.get(1).and_then(atom) {
            Some("<") => {
                let super_name = self.name(items.get(2).ok_or_else(|| malformed("class"))?)?;
                let superclass = Expr::Variable {
                    id: self.fresh_id(),
                    name: super_name,
                };
                (Some(superclass), &items[3..])
            }
            _ => (None, &items[1..]),
        };

        let mut methods: Vec<Rc<FunctionDecl>> = Vec::with_capacity(rest.len());
        for method in rest {
            let SExpr::List(parts) = method else {
                return Err(malformed("method"));
            };

            let decl = match (parts.first().and_then(atom), parts.get(1).and_then(atom)) {
                (Some("static"), Some("fn")) => self.function(&parts[2..], true)?,
                (Some("fn"), _) => self.function(&parts[1..], false)?,
                _ => return Err(malformed("method")),
            };
            methods.push(decl);
        }

        Ok(Stmt::Class {
            name,
            superclass,
            methods,
        })
    }

    /// `name (params..) body..`
    fn function(&mut self, items: &[SExpr], is_static: bool) -> Result<Rc<FunctionDecl>> {
        let name: Token = self.name(items.first().ok_or_else(|| malformed("fn"))?)?;
        let params: Vec<Token> = self.params(items.get(1))?;
        let body: Vec<Stmt> = self.stmts(items.get(2..).unwrap_or_default())?;

        Ok(Rc::new(FunctionDecl {
            name: Some(name),
            params,
            body,
            is_static,
        }))
    }

    fn params(&mut self, form: Option<&SExpr>) -> Result<Vec<Token>> {
        let Some(SExpr::List(names)) = form else {
            return Err(malformed("parameter list"));
        };

        names.iter().map(|name| self.name(name)).collect()
    }

    fn name(&mut self, form: &SExpr) -> Result<Token> {
        atom(form)
            .map(|name| Token::identifier(name, LINE))
            .ok_or_else(|| TinyLangError::read(format!("Expected a name, found {:?}.", form)))
    }

    fn expr(&mut self, form: &SExpr) -> Result<Expr> {
        match form {
            SExpr::Str(s) => Ok(Expr::Literal(LiteralValue::Str(s.clone()))),

            SExpr::Atom(a) => self.atom_expr(a),

            SExpr::List(items) => {
                let head: &str = items.first().and_then(atom).ok_or_else(|| malformed("list"))?;
                self.list_expr(head, &items[1..])
            }
        }
    }

    fn atom_expr(&mut self, a: &str) -> Result<Expr> {
        let expr = match a {
            "true" => Expr::Literal(LiteralValue::True),
            "false" => Expr::Literal(LiteralValue::False),
            "nil" => Expr::Literal(LiteralValue::Nil),
            "this" => Expr::This {
                id: self.fresh_id(),
                keyword: Token::new(TokenType::THIS, "this", LINE),
            },
            _ if a.trim_start_matches('-').starts_with(|c: char| c.is_ascii_digit()) => {
                let n: f64 = a
                    .parse()
                    .map_err(|_| TinyLangError::read(format!("Invalid number '{}'.", a)))?;
                Expr::Literal(LiteralValue::Number(n))
            }
            _ => Expr::Variable {
                id: self.fresh_id(),
                name: Token::identifier(a, LINE),
            },
        };

        Ok(expr)
    }

    fn list_expr(&mut self, head: &str, args: &[SExpr]) -> Result<Expr> {
        let expr = match (head, args) {
            ("group", [inner]) => Expr::Grouping(Box::new(self.expr(inner)?)),

            ("assign", [name, value]) => Expr::Assign {
                id: self.fresh_id(),
                name: self.name(name)?,
                value: Box::new(self.expr(value)?),
            },

            ("call", [callee, arguments @ ..]) => {
                let callee = self.expr(callee)?;
                let arguments = arguments
                    .iter()
                    .map(|arg| self.expr(arg))
                    .collect::<Result<Vec<Expr>>>()?;

                Expr::Call {
                    callee: Box::new(callee),
                    paren: Token::new(TokenType::RIGHT_PAREN, ")", LINE),
                    arguments,
                }
            }

            ("get", [object, name]) => Expr::Get {
                object: Box::new(self.expr(object)?),
                name: self.name(name)?,
            },

            ("set", [object, name, value]) => Expr::Set {
                object: Box::new(self.expr(object)?),
                name: self.name(name)?,
                value: Box::new(self.expr(value)?),
            },

            ("super", [method]) => Expr::Super {
                id: self.fresh_id(),
                keyword: Token::new(TokenType::SUPER, "super", LINE),
                method: self.name(method)?,
            },

            ("fn", [params, body @ ..]) => {
                let params = self.params(Some(params))?;
                let body = self.stmts(body)?;

                Expr::Function(Rc::new(FunctionDecl {
                    name: None,
                    params,
                    body,
                    is_static: false,
                }))
            }

            (op, [left, right]) => {
                let token_type = TokenType::from_operator(op)
                    .ok_or_else(|| TinyLangError::read(format!("Unknown operator '{}'.", op)))?;
                let is_logical = matches!(token_type, TokenType::AND | TokenType::OR);

                let left = Box::new(self.expr(left)?);
                let operator = Token::new(token_type, op, LINE);
                let right = Box::new(self.expr(right)?);

                if is_logical {
                    Expr::Logical {
                        left,
                        operator,
                        right,
                    }
                } else {
                    Expr::Binary {
                        left,
                        operator,
                        right,
                    }
                }
            }

            (op @ ("-" | "!"), [right]) => {
                let token_type = TokenType::from_operator(op)
                    .ok_or_else(|| TinyLangError::read(format!("Unknown operator '{}'.", op)))?;

                Expr::Unary {
                    operator: Token::new(token_type, op, LINE),
                    right: Box::new(self.expr(right)?),
                }
            }

            _ => return Err(malformed(head)),
        };

        Ok(expr)
    }
}

fn atom(form: &SExpr) -> Option<&str> {
    match form {
        SExpr::Atom(a) => Some(a.as_str()),
        _ => None,
    }
}

fn malformed(what: &str) -> TinyLangError {
    TinyLangError::read(format!("Malformed '{}' form.", what))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_nested_lists_and_strings() {
        let forms = split_forms(r#"(print (+ "a b" 1))"#).unwrap();

        assert_eq!(
            forms,
            vec![SExpr::List(vec![
                SExpr::Atom("print".into()),
                SExpr::List(vec![
                    SExpr::Atom("+".into()),
                    SExpr::Str("a b".into()),
                    SExpr::Atom("1".into()),
                ]),
            ])]
        );
    }

    #[test]
    fn rejects_unbalanced_input() {
        assert!(split_forms("(print 1").is_err());
        assert!(split_forms("print 1)").is_err());
        assert!(split_forms("(print \"oops)").is_err());
    }

    #[test]
    fn operator_arity_picks_node_kind() {
        let stmts = read_program("(- 1)\n(- 2 1)\n(and true nil)").unwrap();

        assert!(matches!(stmts[0], Stmt::Expression(Expr::Unary { .. })));
        assert!(matches!(stmts[1], Stmt::Expression(Expr::Binary { .. })));
        assert!(matches!(stmts[2], Stmt::Expression(Expr::Logical { .. })));
    }
}
