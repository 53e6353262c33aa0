use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use crate::ast::FunctionDecl;
use crate::environment::Environment;
use crate::error::{GrisError, Result};
use crate::resolver::{CONSTRUCTOR, THIS};
use crate::token::Token;

/// Signature of a native implementation.  Built‑ins write through `out`.
pub type NativeFn = fn(&[Value], &mut dyn Write) -> std::result::Result<Value, String>;

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Number(f64),
    String(String),
    Void,
    Native(Rc<NativeFunction>),
    Function(Rc<Function>),
    Class(Rc<Class>),
    Instance(Rc<Instance>),
}

impl Value {
    /// Kind name used in runtime error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "Boolean",
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::Void => "Void",
            Value::Native(_) | Value::Function(_) => "Function",
            Value::Class(_) => "Class",
            Value::Instance(_) => "Instance",
        }
    }
}

impl PartialEq for Value {
    /// Values of different kinds are never equal.  Callables, classes and
    /// instances compare by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Void, Value::Void) => true,
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    let mut buf = itoa::Buffer::new();
                    write!(f, "{}", buf.format(*n as i64))
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Void => write!(f, "Void"),

            Value::Native(native) => write!(f, "<built-in {}>", native.name),

            Value::Function(function) => write!(f, "{}", function.name()),

            Value::Class(class) => write!(f, "{}", class.name),

            Value::Instance(instance) => write!(f, "<{} instance>", instance.class.name),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Callables
// ─────────────────────────────────────────────────────────────────────────────

/// A function implemented in Rust.
#[derive(Debug)]
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFn,
}

/// A user function or method closed over its defining environment.
pub struct Function {
    pub declaration: Rc<FunctionDecl>,
    pub closure: Rc<RefCell<Environment>>,
    pub is_initializer: bool,
}

impl Function {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// A copy of this function whose closure has `this` bound to `instance`.
    pub fn bind(&self, instance: Rc<Instance>) -> Function {
        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));
        environment.define(THIS, Value::Instance(instance));

        Function {
            declaration: Rc::clone(&self.declaration),
            closure: Rc::new(RefCell::new(environment)),
            is_initializer: self.is_initializer,
        }
    }
}

impl fmt::Debug for Function {
    // The closure may contain this very function; print the name only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .field("is_initializer", &self.is_initializer)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Classes and instances
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<Class>>,
    pub methods: HashMap<String, Rc<Function>>,
}

impl Class {
    /// Look `name` up in this class, then each ancestor in turn.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }

    /// The nearest `constructor` in the inheritance chain.
    pub fn initializer(&self) -> Option<Rc<Function>> {
        self.find_method(CONSTRUCTOR)
    }

    /// Number of arguments a call to the class expects.
    pub fn arity(&self) -> usize {
        self.initializer().map_or(0, |init| init.arity())
    }
}

#[derive(Debug)]
pub struct Instance {
    pub class: Rc<Class>,
    fields: RefCell<HashMap<String, Value>>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: RefCell::new(HashMap::new()),
        }
    }

    /// Field first, then a method bound to this instance.
    pub fn get(self: &Rc<Self>, name: &Token) -> Result<Value> {
        if let Some(value) = self.fields.borrow().get(&name.lexeme) {
            return Ok(value.clone());
        }

        match self.class.find_method(&name.lexeme) {
            Some(method) => Ok(Value::Function(Rc::new(method.bind(Rc::clone(self))))),
            None => Err(GrisError::runtime(
                name.line,
                name.col,
                format!("Undefined property '{}'", name.lexeme),
            )),
        }
    }

    pub fn set(&self, name: &Token, value: Value) {
        self.fields.borrow_mut().insert(name.lexeme.clone(), value);
    }
}
