use crate::error::{Result, TinyLangError};
use crate::token::Token;
use crate::value::Value;
use log::trace;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope frame.  Closures, running blocks and child frames
/// each hold one; a frame lives as long as any of them.
pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    /// The global frame.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap a fresh child frame of `enclosing` in a shared handle.
    pub fn child_of(enclosing: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Self::with_enclosing(Rc::clone(enclosing))))
    }

    /// Bind `name` in this frame, shadowing any previous binding of the same
    /// name in this frame.
    pub fn define(&mut self, name: &str, value: Value) {
        trace!("define '{}' = {}", name, value);

        self.values.insert(name.to_string(), value);
    }

    /// Linear lookup through the enclosing chain.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Linear assignment through the enclosing chain; the binding must exist.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// Direct read from this frame only.
    pub fn get_here(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    /// The frame exactly `distance` enclosing links above `env`.
    pub fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
        let mut current: EnvRef = Rc::clone(env);

        for _ in 0..distance {
            let next = current.borrow().enclosing.clone()?;
            current = next;
        }

        Some(current)
    }

    /// Read `name` from the frame `distance` links up, without searching.
    pub fn get_at(env: &EnvRef, distance: usize, name: &Token) -> Result<Value> {
        trace!("get_at '{}' distance {}", name.lexeme, distance);

        Self::ancestor(env, distance)
            .and_then(|frame| frame.borrow().get_here(&name.lexeme))
            .ok_or_else(|| undefined(name))
    }

    /// Write `name` in the frame `distance` links up, without searching.
    pub fn assign_at(env: &EnvRef, distance: usize, name: &Token, value: Value) -> Result<()> {
        trace!("assign_at '{}' distance {}", name.lexeme, distance);

        let frame: EnvRef = Self::ancestor(env, distance).ok_or_else(|| undefined(name))?;
        frame.borrow_mut().define(&name.lexeme, value);

        Ok(())
    }
}

fn undefined(name: &Token) -> TinyLangError {
    TinyLangError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Token {
        Token::identifier(s, 1)
    }

    #[test]
    fn lookup_walks_enclosing_frames() {
        let global: EnvRef = Rc::new(RefCell::new(Environment::new()));
        global.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::child_of(&Environment::child_of(&global));

        assert_eq!(inner.borrow().get(&name("a")).ok(), Some(Value::Number(1.0)));
        assert_eq!(
            Environment::get_at(&inner, 2, &name("a")).ok(),
            Some(Value::Number(1.0))
        );
        assert!(Environment::get_at(&inner, 1, &name("a")).is_err());
    }

    #[test]
    fn assign_requires_existing_binding() {
        let global: EnvRef = Rc::new(RefCell::new(Environment::new()));
        let inner = Environment::child_of(&global);

        let err = inner
            .borrow_mut()
            .assign(&name("missing"), Value::Nil)
            .unwrap_err();
        assert_eq!(err.message(), "Undefined variable 'missing'.");

        global.borrow_mut().define("x", Value::Nil);
        inner
            .borrow_mut()
            .assign(&name("x"), Value::Bool(true))
            .unwrap();
        assert_eq!(global.borrow().get_here("x"), Some(Value::Bool(true)));
    }

    #[test]
    fn assign_at_targets_exact_frame() {
        let global: EnvRef = Rc::new(RefCell::new(Environment::new()));
        global.borrow_mut().define("x", Value::Number(1.0));
        let inner = Environment::child_of(&global);
        inner.borrow_mut().define("x", Value::Number(2.0));

        Environment::assign_at(&inner, 1, &name("x"), Value::Number(10.0)).unwrap();

        assert_eq!(inner.borrow().get_here("x"), Some(Value::Number(2.0)));
        assert_eq!(global.borrow().get_here("x"), Some(Value::Number(10.0)));
    }
}
