use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::callable::Function;
use crate::error::{Result, TinyLangError};
use crate::token::Token;
use crate::value::Value;

/// A class: instance methods, static methods, and an optional superclass.
pub struct Class {
    pub name: String,
    superclass: Option<Rc<Class>>,
    methods: HashMap<String, Rc<Function>>,
    static_methods: HashMap<String, Rc<Function>>,
}

impl Class {
    pub fn new(
        name: String,
        superclass: Option<Rc<Class>>,
        methods: HashMap<String, Rc<Function>>,
        static_methods: HashMap<String, Rc<Function>>,
    ) -> Self {
        Self {
            name,
            superclass,
            methods,
            static_methods,
        }
    }

    /// Instance methods, then static methods, then the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }

        if let Some(method) = self.static_methods.get(name) {
            return Some(Rc::clone(method));
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }

    /// The nearest instance `init` up the superclass chain.  Static methods
    /// named `init` never construct.
    pub fn find_initializer(&self) -> Option<Rc<Function>> {
        match self.methods.get("init") {
            Some(init) => Some(Rc::clone(init)),
            None => self
                .superclass
                .as_ref()
                .and_then(|superclass| superclass.find_initializer()),
        }
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<class {}>", self.name)
    }
}

/// An object created by calling a class.  Fields start empty and are only
/// populated through property assignment.
pub struct Instance {
    class: Rc<Class>,
    fields: RefCell<HashMap<String, Value>>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: RefCell::new(HashMap::new()),
        }
    }

    pub fn class(&self) -> &Rc<Class> {
        &self.class
    }

    /// Fields shadow methods.  Instance methods come back bound to `self`;
    /// static methods come back unbound.
    pub fn get(self: &Rc<Self>, name: &Token) -> Result<Value> {
        if let Some(value) = self.fields.borrow().get(&name.lexeme) {
            return Ok(value.clone());
        }

        match self.class.find_method(&name.lexeme) {
            Some(method) if method.is_static() => Ok(Value::Function(method)),

            Some(method) => Ok(Value::Function(Rc::new(method.bind(self)))),

            None => {
                debug!(
                    "Property '{}' missing on {} instance",
                    name.lexeme, self.class.name
                );

                Err(TinyLangError::runtime(
                    name,
                    format!("Undefined property '{}'.", name.lexeme),
                ))
            }
        }
    }

    pub fn set(&self, name: &str, value: Value) {
        self.fields.borrow_mut().insert(name.to_string(), value);
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} instance>", self.class.name)
    }
}
