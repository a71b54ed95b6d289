use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::class::Instance;
use crate::environment::{EnvRef, Environment};
use crate::error::Result;
use crate::interpreter::{Flow, Interpreter};
use crate::stmt::FunctionDecl;
use crate::value::Value;

/// A user‑defined function, lambda, or bound method: the declaration plus the
/// frame that was active when it was evaluated.
pub struct Function {
    decl: Rc<FunctionDecl>,
    closure: EnvRef,
    is_initializer: bool,
}

impl Function {
    pub fn new(decl: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Self {
            decl,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        self.decl.name()
    }

    pub fn arity(&self) -> usize {
        self.decl.arity()
    }

    pub fn is_static(&self) -> bool {
        self.decl.is_static
    }

    /// A copy of this method whose closure is a synthetic frame, enclosing the
    /// original closure, with `this` bound to `instance`.
    pub fn bind(&self, instance: &Rc<Instance>) -> Function {
        debug!(
            "Binding method '{}' to {} instance",
            self.name(),
            instance.class().name
        );

        let environment: EnvRef = Environment::child_of(&self.closure);
        environment
            .borrow_mut()
            .define("this", Value::Instance(Rc::clone(instance)));

        Function::new(Rc::clone(&self.decl), environment, self.is_initializer)
    }

    /// Run the body in a fresh child frame of the closure.  Arity has already
    /// been checked by the caller.
    pub fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        debug!("Calling function '{}'", self.name());

        let environment: EnvRef = Environment::child_of(&self.closure);

        for (param, argument) in self.decl.params.iter().zip(arguments) {
            environment.borrow_mut().define(&param.lexeme, argument);
        }

        let flow: Flow = interpreter.execute_block(&self.decl.body, environment)?;

        // Initializers always hand back the instance they were bound to.
        if self.is_initializer {
            return Ok(self.closure.borrow().get_here("this").unwrap_or(Value::Nil));
        }

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

/// A function implemented in Rust and installed in the global frame.
pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub func: fn(&[Value]) -> std::result::Result<Value, String>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}
