use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::callable::{Function, NativeFunction};
use crate::class::{Class, Instance};
use crate::environment::{EnvRef, Environment};
use crate::error::{Result, TinyLangError};
use crate::expr::{Expr, ExprId, LiteralValue};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// How a statement finished.  A `return` unwinds every enclosing block up to
/// the nearest call boundary as `Flow::Return`; runtime errors travel in `Err`.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    /// Lexical distances recorded by the resolver; absent ⇒ global.
    locals: HashMap<ExprId, usize>,
    out: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter whose `print` writes to standard output.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// An interpreter whose `print` writes to `out`.  Defines native functions
    /// such as `clock` in the global frame.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::Native(Rc::new(NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: |_args: &[Value]| {
                    let micros = chrono::Utc::now().timestamp_micros();
                    Ok(Value::Number(micros as f64 / 1_000_000.0))
                },
            })),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out,
        }
    }

    /// Called by the resolver for every local variable occurrence.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Called by the resolver for occurrences that resolve in the global frame.
    pub fn note_global(&mut self, id: ExprId) {
        self.locals.remove(&id);
    }

    /// Interprets a list of statements (a "program").  Stops at the first
    /// runtime error and returns it.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            self.execute(stmt)?;
        }

        info!("Interpretation completed successfully");

        Ok(())
    }

    /// Evaluates a lone expression and prints its value (REPL echo).
    pub fn interpret_expression(&mut self, expr: &Expr) -> Result<()> {
        let value = self.evaluate(expr)?;
        writeln!(self.out, "{}", value)?;
        self.out.flush()?;

        Ok(())
    }

    /// Run `statements` with `environment` as the current frame, restoring
    /// the previous frame on every exit path.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> Result<Flow> {
        let previous: EnvRef = std::mem::replace(&mut self.environment, environment);

        let result = self.execute_all(statements);

        self.environment = previous;

        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }

        Ok(Flow::Normal)
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                debug!("Printing {} value: {}", value.kind(), value);
                writeln!(self.out, "{}", value)?;
                Ok(Flow::Normal)
            }

            Stmt::Let { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                debug!("Entering block with {} statements", statements.len());
                let environment = Environment::child_of(&self.environment);
                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                debug!("Entering while loop");
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name());
                let function = Function::new(Rc::clone(decl), Rc::clone(&self.environment), false);
                self.environment
                    .borrow_mut()
                    .define(decl.name(), Value::Function(Rc::new(function)));
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                self.declare_class(name, superclass.as_ref(), methods)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn declare_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<()> {
        debug!("Declaring class '{}'", name.lexeme);

        let superclass: Option<Rc<Class>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    let token = match expr {
                        Expr::Variable { name, .. } => name,
                        _ => name,
                    };
                    return Err(TinyLangError::runtime(token, "Superclass must be a class."));
                }
            },
            None => None,
        };

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        let method_env: EnvRef = match &superclass {
            Some(superclass) => {
                let env = Environment::child_of(&self.environment);
                env.borrow_mut()
                    .define("super", Value::Class(Rc::clone(superclass)));
                env
            }
            None => Rc::clone(&self.environment),
        };

        let mut instance_methods: HashMap<String, Rc<Function>> = HashMap::new();
        let mut static_methods: HashMap<String, Rc<Function>> = HashMap::new();

        for method in methods {
            let is_initializer = !method.is_static && method.name() == "init";
            let function = Rc::new(Function::new(
                Rc::clone(method),
                Rc::clone(&method_env),
                is_initializer,
            ));

            if method.is_static {
                static_methods.insert(method.name().to_string(), function);
            } else {
                instance_methods.insert(method.name().to_string(), function);
            }
        }

        let class = Class::new(
            name.lexeme.clone(),
            superclass,
            instance_methods,
            static_methods,
        );

        self.environment
            .borrow_mut()
            .assign(name, Value::Class(Rc::new(class)))?;

        info!("Class '{}' defined", name.lexeme);

        Ok(())
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(evaluate_literal(literal)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val = self.evaluate(left)?;

                let decided = if operator.token_type == TokenType::OR {
                    left_val.is_truthy()
                } else {
                    !left_val.is_truthy()
                };

                if decided {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        Environment::assign_at(&self.environment, distance, name, value.clone())?
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val = self.evaluate(callee)?;

                let mut arg_values: Vec<Value> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    arg_values.push(self.evaluate(arg)?);
                }

                self.invoke_callable(callee_val, paren, arg_values)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => instance.get(name),

                // Static access: the method comes back unbound.
                Value::Class(class) => class
                    .find_method(&name.lexeme)
                    .map(Value::Function)
                    .ok_or_else(|| {
                        TinyLangError::runtime(
                            name,
                            format!("Undefined property '{}'.", name.lexeme),
                        )
                    }),

                _ => Err(TinyLangError::runtime(
                    name,
                    "Only instances have properties.",
                )),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(TinyLangError::runtime(name, "Only instances have fields."));
                };

                let value = self.evaluate(value)?;
                instance.set(&name.lexeme, value.clone());

                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),

            Expr::Function(decl) => Ok(Value::Function(Rc::new(Function::new(
                Rc::clone(decl),
                Rc::clone(&self.environment),
                false,
            )))),
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value> {
        let distance: usize = match self.locals.get(&id) {
            Some(&distance) if distance > 0 => distance,
            _ => {
                return Err(TinyLangError::runtime(
                    keyword,
                    "Can't use 'super' outside of a subclass method.",
                ))
            }
        };

        let Value::Class(superclass) = Environment::get_at(&self.environment, distance, keyword)?
        else {
            return Err(TinyLangError::runtime(keyword, "Superclass must be a class."));
        };

        let this = Token::identifier("this", keyword.line);
        let Value::Instance(instance) = Environment::get_at(&self.environment, distance - 1, &this)?
        else {
            return Err(TinyLangError::runtime(
                keyword,
                "Only instances have properties.",
            ));
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) if found.is_static() => Ok(Value::Function(found)),
            Some(found) => Ok(Value::Function(Rc::new(found.bind(&instance)))),
            None => Err(TinyLangError::runtime(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    /// Evaluates a unary expression.
    fn evaluate_unary(&mut self, op: &Token, expr: &Expr) -> Result<Value> {
        let right_val = self.evaluate(expr)?;

        match op.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(TinyLangError::runtime(
                    op,
                    format!("Operand of '{}' must be a number.", op.lexeme),
                )),
            },
            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),
            _ => Err(TinyLangError::runtime(
                op,
                format!("Invalid unary operator '{}'.", op.lexeme),
            )),
        }
    }

    /// Evaluates a binary expression.
    fn evaluate_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> Result<Value> {
        let left_val = self.evaluate(left)?;
        let right_val = self.evaluate(right)?;

        debug!(
            "Binary '{}' on {} and {}",
            op.lexeme,
            left_val.kind(),
            right_val.kind()
        );

        match op.token_type {
            TokenType::EQUAL_EQUAL => return Ok(Value::Bool(left_val == right_val)),
            TokenType::BANG_EQUAL => return Ok(Value::Bool(left_val != right_val)),
            TokenType::PLUS => {
                if matches!(left_val, Value::String(_)) || matches!(right_val, Value::String(_)) {
                    return Ok(Value::String(format!("{}{}", left_val, right_val)));
                }
            }
            _ => {}
        }

        let (a, b) = match (&left_val, &right_val) {
            (Value::Number(a), Value::Number(b)) => (*a, *b),
            _ => {
                return Err(TinyLangError::runtime(
                    op,
                    format!("Operands of '{}' must be numbers.", op.lexeme),
                ))
            }
        };

        let result = match op.token_type {
            TokenType::PLUS => Value::Number(a + b),
            TokenType::MINUS => Value::Number(a - b),
            TokenType::STAR => Value::Number(a * b),
            TokenType::STAR_STAR => Value::Number(a.powf(b)),
            TokenType::SLASH | TokenType::PERCENT if b == 0.0 => {
                return Err(TinyLangError::runtime(op, "Division by zero."));
            }
            TokenType::SLASH => Value::Number(a / b),
            TokenType::PERCENT => Value::Number(a % b),
            TokenType::GREATER => Value::Bool(a > b),
            TokenType::GREATER_EQUAL => Value::Bool(a >= b),
            TokenType::LESS => Value::Bool(a < b),
            TokenType::LESS_EQUAL => Value::Bool(a <= b),
            _ => {
                return Err(TinyLangError::runtime(
                    op,
                    format!("Invalid binary operator '{}'.", op.lexeme),
                ))
            }
        };

        Ok(result)
    }

    /// Invokes a callable (class, user function, bound method, or native).
    fn invoke_callable(
        &mut self,
        callee_val: Value,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        match callee_val {
            Value::Class(class) => {
                debug!("Constructing instance of '{}'", class.name);

                let instance = Rc::new(Instance::new(Rc::clone(&class)));

                match class.find_initializer() {
                    Some(init) => {
                        check_arity(paren, init.arity(), arguments.len())?;
                        init.bind(&instance).call(self, arguments)?;
                    }
                    None => check_arity(paren, 0, arguments.len())?,
                }

                Ok(Value::Instance(instance))
            }

            Value::Function(function) => {
                check_arity(paren, function.arity(), arguments.len())?;

                let result = function.call(self, arguments)?;
                debug!("Function '{}' returned: {}", function.name(), result);

                Ok(result)
            }

            Value::Native(native) => {
                check_arity(paren, native.arity, arguments.len())?;

                let result =
                    (native.func)(&arguments).map_err(|msg| TinyLangError::runtime(paren, msg))?;
                info!("Native function '{}' returned: {}", native.name, result);

                Ok(result)
            }

            _ => Err(TinyLangError::runtime(
                paren,
                "Can only call functions and classes.",
            )),
        }
    }
}

fn evaluate_literal(literal: &LiteralValue) -> Value {
    match literal {
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::Str(s) => Value::String(s.clone()),
        LiteralValue::True => Value::Bool(true),
        LiteralValue::False => Value::Bool(false),
        LiteralValue::Nil => Value::Nil,
    }
}

fn check_arity(paren: &Token, expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(TinyLangError::runtime(
            paren,
            format!("Expected {} arguments but got {}.", expected, got),
        ));
    }

    Ok(())
}
