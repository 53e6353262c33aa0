//! Tree‑walking evaluator for **Gris**.
//!
//! The interpreter owns one *current* environment, swapped for a fresh child
//! on every block or call and put back afterwards whether the block finished
//! normally, returned early or failed.  Variable access uses the distances the
//! resolver recorded in [`Locals`]; references without an entry are globals.
//!
//! `return` is not an error: statements yield a [`Flow`] and a `Return` travels
//! up through the enclosing blocks until the call boundary consumes it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{ClassDecl, Expr, LiteralValue, Reference, Stmt};
use crate::builtins;
use crate::environment::Environment;
use crate::error::{GrisError, Result};
use crate::resolver::{Locals, CONSTRUCTOR, SUPER, THIS};
use crate::token::{Token, TokenType};
use crate::value::{Class, Function, Instance, Value};

/// How a statement finished.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: Locals,
    output: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter whose built‑ins write to standard output.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// An interpreter whose built‑ins write to `output`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        for builtin in builtins::all() {
            debug!("Defining native function '{}'", builtin.name);
            globals
                .borrow_mut()
                .define(builtin.name, Value::Native(builtin.function));
        }

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: Locals::new(),
            output,
        }
    }

    /// Run a resolved and type‑checked program.
    pub fn interpret(&mut self, statements: &[Stmt], locals: Locals) -> Result<()> {
        info!("Interpreting {} statements", statements.len());

        self.locals = locals;

        let result = self.execute_all(statements);
        self.output.flush()?;
        result?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }

        Ok(Flow::Normal)
    }

    /// Run `statements` inside `environment`, then restore the previous one.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Result<Flow> {
        let previous = mem::replace(&mut self.environment, environment);
        let result = self.execute_all(statements);
        self.environment = previous;

        result
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Stmt::Val {
                name, initializer, ..
            } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Void,
                };

                debug!("Defining '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
            }

            Stmt::Block(statements) => {
                let environment = Environment::with_enclosing(Rc::clone(&self.environment));
                return self.execute_block(statements, Rc::new(RefCell::new(environment)));
            }

            Stmt::If {
                keyword,
                condition,
                then_branch,
                else_branch,
            } => {
                if self.condition(keyword, condition)? {
                    return self.execute(then_branch);
                } else if let Some(else_stmt) = else_branch {
                    return self.execute(else_stmt);
                }
            }

            Stmt::While {
                keyword,
                condition,
                body,
            } => {
                while self.condition(keyword, condition)? {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);

                let function = Function::new(Rc::clone(decl), Rc::clone(&self.environment), false);
                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, Value::Function(Rc::new(function)));
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Void,
                };

                return Ok(Flow::Return(value));
            }

            Stmt::Class(decl) => self.define_class(decl)?,
        }

        Ok(Flow::Normal)
    }

    fn define_class(&mut self, decl: &ClassDecl) -> Result<()> {
        debug!("Defining class '{}'", decl.name.lexeme);

        let superclass = match &decl.superclass {
            Some(reference) => match self.look_up(reference)? {
                Value::Class(class) => Some(class),
                other => {
                    return Err(GrisError::runtime(
                        reference.name.line,
                        reference.name.col,
                        format!("Superclass must be a class, got {}", other.type_name()),
                    ))
                }
            },
            None => None,
        };

        // Methods close over an extra frame holding `super`.
        let closure = match &superclass {
            Some(superclass) => {
                let mut environment = Environment::with_enclosing(Rc::clone(&self.environment));
                environment.define(SUPER, Value::Class(Rc::clone(superclass)));
                Rc::new(RefCell::new(environment))
            }
            None => Rc::clone(&self.environment),
        };

        let methods: HashMap<String, Rc<Function>> = decl
            .methods
            .iter()
            .map(|method| {
                let is_initializer = method.name.lexeme == CONSTRUCTOR;
                let function = Function::new(Rc::clone(method), Rc::clone(&closure), is_initializer);
                (method.name.lexeme.clone(), Rc::new(function))
            })
            .collect();

        let class = Class {
            name: decl.name.lexeme.clone(),
            superclass,
            methods,
        };

        self.environment
            .borrow_mut()
            .define(&decl.name.lexeme, Value::Class(Rc::new(class)));

        Ok(())
    }

    fn condition(&mut self, keyword: &Token, condition: &Expr) -> Result<bool> {
        match self.evaluate(condition)? {
            Value::Bool(b) => Ok(b),
            other => Err(GrisError::runtime(
                keyword.line,
                keyword.col,
                format!("Condition must be a Boolean, got {}", other.type_name()),
            )),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal { value, .. } => Ok(match value {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Null => Value::Void,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;

                match (&operator.token_type, right) {
                    (TokenType::BANG, Value::Bool(b)) => Ok(Value::Bool(!b)),
                    (TokenType::MINUS, Value::Number(n)) => Ok(Value::Number(-n)),
                    (_, other) => Err(GrisError::runtime(
                        operator.line,
                        operator.col,
                        format!(
                            "Invalid operand for unary '{}': {}",
                            operator.lexeme,
                            other.type_name()
                        ),
                    )),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                binary(operator, left, right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                let truth = match left {
                    Value::Bool(b) => b,
                    ref other => {
                        return Err(GrisError::runtime(
                            operator.line,
                            operator.col,
                            format!(
                                "Operand of '{}' must be a Boolean, got {}",
                                operator.lexeme,
                                other.type_name()
                            ),
                        ))
                    }
                };

                let short_circuit = match operator.token_type {
                    TokenType::OR => truth,
                    _ => !truth,
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Ternary {
                condition,
                question,
                then_branch,
                else_branch,
            } => {
                if self.condition(question, condition)? {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Variable(reference) | Expr::This(reference) => self.look_up(reference),

            Expr::Assign { target, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(target.id) {
                    Some(distance) => Environment::assign_at(
                        &self.environment,
                        distance,
                        &target.name,
                        value.clone(),
                    )?,
                    None => self
                        .globals
                        .borrow_mut()
                        .assign(&target.name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }

                self.call(callee, args, paren)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => instance.get(name),
                other => Err(GrisError::runtime(
                    name.line,
                    name.col,
                    format!("Only instances have properties, got {}", other.type_name()),
                )),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let instance = match self.evaluate(object)? {
                    Value::Instance(instance) => instance,
                    other => {
                        return Err(GrisError::runtime(
                            name.line,
                            name.col,
                            format!("Only instances have fields, got {}", other.type_name()),
                        ))
                    }
                };

                let value = self.evaluate(value)?;
                instance.set(name, value.clone());
                Ok(value)
            }

            Expr::Super { keyword, method } => self.super_method(keyword, method),
        }
    }

    /// `super.method`: look up from the superclass, bind to the current `this`.
    fn super_method(&mut self, keyword: &Reference, method: &Token) -> Result<Value> {
        let name = &keyword.name;
        let unresolved = || GrisError::runtime(name.line, name.col, "Unresolved 'super'");

        let distance = self.locals.get(keyword.id).ok_or_else(unresolved)?;

        let superclass = match Environment::get_at(&self.environment, distance, name)? {
            Value::Class(class) => class,
            _ => return Err(unresolved()),
        };

        // `this` lives in the frame just inside the one holding `super`.
        let receiver = distance
            .checked_sub(1)
            .and_then(|d| Environment::ancestor(&self.environment, d))
            .and_then(|frame| {
                let value = frame.borrow().lookup(THIS);
                value
            });

        let instance = match receiver {
            Some(Value::Instance(instance)) => instance,
            _ => return Err(unresolved()),
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(instance)))),
            None => Err(GrisError::runtime(
                method.line,
                method.col,
                format!("Undefined property '{}'", method.lexeme),
            )),
        }
    }

    fn look_up(&self, reference: &Reference) -> Result<Value> {
        match self.locals.get(reference.id) {
            Some(distance) => Environment::get_at(&self.environment, distance, &reference.name),
            None => self.globals.borrow().get(&reference.name),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Calls
    // ─────────────────────────────────────────────────────────────────────────

    fn call(&mut self, callee: Value, args: Vec<Value>, paren: &Token) -> Result<Value> {
        let arity = match &callee {
            Value::Native(native) => native.arity,
            Value::Function(function) => function.arity(),
            Value::Class(class) => class.arity(),
            other => {
                return Err(GrisError::runtime(
                    paren.line,
                    paren.col,
                    format!("Can only call functions and classes, got {}", other.type_name()),
                ))
            }
        };

        if args.len() != arity {
            return Err(GrisError::runtime(
                paren.line,
                paren.col,
                format!("Expected {} arguments but got {}", arity, args.len()),
            ));
        }

        match callee {
            Value::Native(native) => {
                debug!("Calling native function '{}'", native.name);
                (native.func)(&args, &mut *self.output)
                    .map_err(|msg| GrisError::runtime(paren.line, paren.col, msg))
            }

            Value::Function(function) => self.call_function(&function, args),

            Value::Class(class) => {
                let instance = Rc::new(Instance::new(Rc::clone(&class)));

                if let Some(initializer) = class.initializer() {
                    self.call_function(&initializer.bind(Rc::clone(&instance)), args)?;
                }

                Ok(Value::Instance(instance))
            }

            _ => Ok(Value::Void),
        }
    }

    fn call_function(&mut self, function: &Function, args: Vec<Value>) -> Result<Value> {
        debug!("Calling function '{}'", function.name());

        let mut environment = Environment::with_enclosing(Rc::clone(&function.closure));
        for (param, arg) in function.declaration.params.iter().zip(args) {
            environment.define(&param.name.lexeme, arg);
        }

        let flow = self.execute_block(
            &function.declaration.body,
            Rc::new(RefCell::new(environment)),
        )?;

        if function.is_initializer {
            let name = &function.declaration.name;
            return function.closure.borrow().lookup(THIS).ok_or_else(|| {
                GrisError::runtime(name.line, name.col, "Initializer has no bound instance")
            });
        }

        Ok(match flow {
            Flow::Return(value) => value,
            Flow::Normal => Value::Void,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Operators
// ─────────────────────────────────────────────────────────────────────────────

fn binary(operator: &Token, left: Value, right: Value) -> Result<Value> {
    match operator.token_type {
        TokenType::EQUAL_EQUAL => return Ok(Value::Bool(left == right)),
        TokenType::BANG_EQUAL => return Ok(Value::Bool(left != right)),
        _ => {}
    }

    let (l, r) = match (&left, &right) {
        (Value::Number(l), Value::Number(r)) => (*l, *r),
        _ => {
            return Err(GrisError::runtime(
                operator.line,
                operator.col,
                format!(
                    "Operands of '{}' must be Numbers, got {} and {}",
                    operator.lexeme,
                    left.type_name(),
                    right.type_name()
                ),
            ))
        }
    };

    Ok(match operator.token_type {
        TokenType::PLUS => Value::Number(l + r),
        TokenType::MINUS => Value::Number(l - r),
        TokenType::STAR => Value::Number(l * r),
        TokenType::SLASH => Value::Number(l / r),
        TokenType::PERCENT => Value::Number(l % r),
        // Both sides are truncated to integers first.
        TokenType::CARET => Value::Number(f64::from(l as i32).powf(f64::from(r as i32))),
        TokenType::GREATER => Value::Bool(l > r),
        TokenType::GREATER_EQUAL => Value::Bool(l >= r),
        TokenType::LESS => Value::Bool(l < r),
        TokenType::LESS_EQUAL => Value::Bool(l <= r),
        _ => {
            return Err(GrisError::runtime(
                operator.line,
                operator.col,
                format!("Unknown binary operator '{}'", operator.lexeme),
            ))
        }
    })
}
