use crate::error::{GrisError, Result};
use crate::token::Token;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One frame of the runtime scope chain.
///
/// Frames are shared through `Rc<RefCell<_>>` so closures keep their
/// defining frame alive after the block that created it has exited.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up in this frame only.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    /// Walk the chain outward until `name` is found.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

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

    /// The frame `distance` hops up from `env` (`0` is `env` itself).
    pub fn ancestor(env: &Rc<RefCell<Environment>>, distance: usize) -> Option<Rc<RefCell<Environment>>> {
        let mut current = Rc::clone(env);

        for _ in 0..distance {
            let next = current.borrow().enclosing.clone()?;
            current = next;
        }

        Some(current)
    }

    pub fn get_at(env: &Rc<RefCell<Environment>>, distance: usize, name: &Token) -> Result<Value> {
        Self::ancestor(env, distance)
            .and_then(|frame| {
                let value = frame.borrow().lookup(&name.lexeme);
                value
            })
            .ok_or_else(|| undefined(name))
    }

    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &Token,
        value: Value,
    ) -> Result<()> {
        let frame = Self::ancestor(env, distance).ok_or_else(|| undefined(name))?;
        let mut frame = frame.borrow_mut();

        match frame.values.get_mut(&name.lexeme) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(undefined(name)),
        }
    }
}

fn undefined(name: &Token) -> GrisError {
    GrisError::runtime(
        name.line,
        name.col,
        format!("Undefined variable '{}'", name.lexeme),
    )
}
