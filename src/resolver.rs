//! Static resolver pass for **Gris**.
//!
//! This resolver does three things in one AST walk:
//! 1. Builds lexical scopes (a global frame plus a stack of local frames, each
//!    tracking whether a name is declared, defined or used).
//! 2. Reports scoping errors: redeclaration, reading a variable in its own
//!    initializer, local classes, self‑inheritance, misplaced `this`, `super` or
//!    `return`, and undefined names.
//! 3. Records, for every reference that binds to a local frame, how many frames
//!    up that binding lives.  The resulting [`Locals`] table drives both the type
//!    checker and the interpreter; references absent from it are globals.
//!
//! The first error aborts the pass.

use std::collections::HashMap;

use crate::ast::{ClassDecl, Expr, FunctionDecl, NodeId, Reference, Stmt, TypeExpr};
use crate::builtins;
use crate::error::{GrisError, Result};
use crate::scope::{Lookup, Scopes};
use crate::token::Token;

use log::{debug, info};

/// Name under which the receiver is bound in a method's enclosing frame.
pub const THIS: &str = "this";

/// Name under which the superclass is bound in a subclass's extra frame.
pub const SUPER: &str = "super";

/// Name of the method that acts as a class's initializer.
pub const CONSTRUCTOR: &str = "constructor";

/// Distance table: reference node → number of frames between use and binding.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Locals {
    distances: HashMap<NodeId, usize>,
}

impl Locals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note(&mut self, id: NodeId, distance: usize) {
        self.distances.insert(id, distance);
    }

    /// `None` means the reference is global.
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<usize> {
        self.distances.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }
}

/// Lifecycle of a binding while it is being resolved.
///
/// `Used` is recorded but never reported on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VariableState {
    Declared,
    Defined,
    Used,
}

/// What kind of function body we are inside, for validating `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

/// What kind of class body we are inside, for validating `this` and `super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

pub struct Resolver {
    scopes: Scopes<VariableState>,
    locals: Locals,
    current_function: FunctionType,
    current_class: ClassType,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    /// Create a resolver whose global frame already holds the built‑ins.
    pub fn new() -> Self {
        info!("Resolver instantiated");

        let mut scopes = Scopes::new();
        for builtin in builtins::all() {
            scopes.declare_global(builtin.name, VariableState::Used);
        }

        Resolver {
            scopes,
            locals: Locals::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    /// Walk all top‑level statements and return the distance table.
    pub fn resolve(mut self, statements: &[Stmt]) -> Result<Locals> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt)?;
        }

        info!("Resolved {} local reference(s)", self.locals.len());
        Ok(self.locals)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Class(decl) => self.resolve_class(decl)?,

            Stmt::Block(statements) => {
                self.scopes.begin();
                let result = self.resolve_block(statements);
                self.scopes.end();
                result?;
            }

            Stmt::Val {
                name,
                type_expr,
                initializer,
            } => {
                if let Some(t) = type_expr {
                    self.resolve_type(t)?;
                }

                self.declare(name)?;
                if let Some(expr) = initializer {
                    self.resolve_expr(expr)?;
                }
                self.define(name);
            }

            Stmt::Function(decl) => {
                debug!("Resolving function '{}'", decl.name.lexeme);

                self.resolve_signature(decl)?;
                self.declare(&decl.name)?;
                self.define(&decl.name);
                self.resolve_function(decl, FunctionType::Function)?;
            }

            Stmt::Expression(expr) => self.resolve_expr(expr)?,

            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.resolve_expr(condition)?;
                self.resolve_stmt(then_branch)?;
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb)?;
                }
            }

            Stmt::While {
                condition, body, ..
            } => {
                self.resolve_expr(condition)?;
                self.resolve_stmt(body)?;
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    return Err(error(keyword, "Can't return from top-level code"));
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        return Err(error(keyword, "Can't return a value from an initializer"));
                    }

                    self.resolve_expr(expr)?;
                }
            }
        }

        Ok(())
    }

    fn resolve_block(&mut self, statements: &[Stmt]) -> Result<()> {
        for s in statements {
            self.resolve_stmt(s)?;
        }

        Ok(())
    }

    fn resolve_class(&mut self, decl: &ClassDecl) -> Result<()> {
        debug!("Resolving class '{}'", decl.name.lexeme);

        if !self.scopes.is_global() {
            return Err(error(&decl.name, "Class declared in local scope"));
        }

        let enclosing = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(&decl.name)?;
        self.define(&decl.name);

        if let Some(superclass) = &decl.superclass {
            if superclass.name.lexeme == decl.name.lexeme {
                return Err(error(&superclass.name, "Class can't inherit from itself"));
            }

            self.current_class = ClassType::Subclass;
            self.resolve_reference(superclass)?;
        }

        // Signatures see the global scope only.
        for method in &decl.methods {
            self.resolve_signature(method)?;
        }

        if decl.superclass.is_some() {
            self.scopes.begin();
            self.scopes.declare(SUPER, VariableState::Used);
        }

        self.scopes.begin();
        self.scopes.declare(THIS, VariableState::Used);

        let mut result = Ok(());
        for method in &decl.methods {
            let kind = if method.name.lexeme == CONSTRUCTOR {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };

            result = self.resolve_function(method, kind);
            if result.is_err() {
                break;
            }
        }

        self.scopes.end();
        if decl.superclass.is_some() {
            self.scopes.end();
        }

        self.current_class = enclosing;
        result
    }

    /// Resolve parameter and return annotations in the current scope.
    fn resolve_signature(&mut self, decl: &FunctionDecl) -> Result<()> {
        for param in &decl.params {
            self.resolve_type(&param.type_expr)?;
        }

        if let Some(t) = &decl.return_type {
            self.resolve_type(t)?;
        }

        Ok(())
    }

    /// Enter a fresh scope for a function's parameters and body.
    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionType) -> Result<()> {
        let enclosing = self.current_function;
        self.current_function = kind;

        self.scopes.begin();

        let mut result = Ok(());
        for param in &decl.params {
            result = self.declare(&param.name);
            if result.is_err() {
                break;
            }
            self.define(&param.name);
        }

        if result.is_ok() {
            result = self.resolve_block(&decl.body);
        }

        self.scopes.end();

        self.current_function = enclosing;
        result
    }

    fn resolve_type(&mut self, type_expr: &TypeExpr) -> Result<()> {
        if let TypeExpr::Named(reference) = type_expr {
            self.resolve_reference(reference)?;
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Literal { .. } => {}

            Expr::Grouping(inner) => self.resolve_expr(inner)?,

            Expr::Unary { right, .. } => self.resolve_expr(right)?,

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left)?;
                self.resolve_expr(right)?;
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.resolve_expr(condition)?;
                self.resolve_expr(then_branch)?;
                self.resolve_expr(else_branch)?;
            }

            Expr::Variable(reference) => self.resolve_reference(reference)?,

            Expr::Assign { target, value } => {
                self.resolve_expr(value)?;
                self.resolve_reference(target)?;
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee)?;
                for arg in arguments {
                    self.resolve_expr(arg)?;
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object)?,

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object)?;
                self.resolve_expr(value)?;
            }

            Expr::This(reference) => {
                if self.current_class == ClassType::None {
                    return Err(error(&reference.name, "'this' outside of a class"));
                }

                self.resolve_reference(reference)?;
            }

            Expr::Super { keyword, .. } => match self.current_class {
                ClassType::None => {
                    return Err(error(&keyword.name, "'super' outside of class"));
                }
                ClassType::Class => {
                    return Err(error(
                        &keyword.name,
                        "'super' in a class with no superclass",
                    ));
                }
                ClassType::Subclass => self.resolve_reference(keyword)?,
            },
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    fn declare(&mut self, name: &Token) -> Result<()> {
        if self.scopes.contains_in_current(&name.lexeme) {
            return Err(error(
                name,
                "Already a variable with this name in this scope",
            ));
        }

        self.scopes.declare(&name.lexeme, VariableState::Declared);
        Ok(())
    }

    fn define(&mut self, name: &Token) {
        self.scopes.declare(&name.lexeme, VariableState::Defined);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this reference as either a local at distance `d` or a global,
    /// and mark the binding used.
    fn resolve_reference(&mut self, reference: &Reference) -> Result<()> {
        let name: &str = &reference.name.lexeme;

        let lookup = match self.scopes.find(name) {
            Some(lookup) => lookup,
            None => return Err(error(&reference.name, "Undefined variable")),
        };

        if let Some(state) = self.scopes.get_mut(lookup, name) {
            if *state == VariableState::Declared {
                return Err(error(
                    &reference.name,
                    "Can't read local variable in its own initializer",
                ));
            }

            *state = VariableState::Used;
        }

        match lookup {
            Lookup::Local(distance) => {
                debug!("Resolved '{}' at distance {}", name, distance);
                self.locals.note(reference.id, distance);
            }
            Lookup::Global => debug!("Resolved '{}' as global", name),
        }

        Ok(())
    }
}

fn error(token: &Token, message: &str) -> GrisError {
    GrisError::resolve(token.line, token.col, message)
}
