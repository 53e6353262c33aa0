//! Static type checker for **Gris**.
//!
//! Runs after the resolver has succeeded and assigns a [`Type`] to every
//! expression.  It keeps its own frame stack, opened and closed at the same
//! points as the resolver's, and every name lookup is cross‑checked against the
//! resolver's [`Locals`]: if the two walks ever disagree on where a name lives
//! the checker reports it instead of guessing.
//!
//! Like the resolver the pass is fail‑fast; the first violation aborts it.
//!
//! ### Classes
//!
//! Class types are kept in `classes` and referred to by [`ClassId`].  A class
//! name is bound to `Type::Class`, instances of it (including `this` inside its
//! methods and any annotation naming it) are `Type::Instance`.  There are no
//! field declarations: outside the class hierarchy only methods are visible on
//! an instance, while inside a method of the class or a subclass any other
//! property name reads as `Any`.

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{ClassDecl, Expr, FunctionDecl, LiteralValue, Reference, Stmt, TypeExpr};
use crate::builtins;
use crate::error::{GrisError, Result};
use crate::resolver::{Locals, CONSTRUCTOR, SUPER, THIS};
use crate::scope::{Lookup, Scopes};
use crate::token::{Token, TokenType};
use crate::types::{ClassId, ClassType, FunctionType, Type, TypeTag};

use log::{debug, info};

pub struct TypeChecker<'l> {
    locals: &'l Locals,
    scopes: Scopes<Type>,
    classes: Vec<ClassType>,

    /// Declared return type of the function being checked.
    current_return: Option<Type>,

    /// Class whose methods are being checked.
    current_class: Option<ClassId>,
}

impl<'l> TypeChecker<'l> {
    /// Create a checker over the distance table produced by the resolver.
    pub fn new(locals: &'l Locals) -> Self {
        info!("TypeChecker instantiated");

        let mut scopes = Scopes::new();
        for builtin in builtins::all() {
            scopes.declare_global(builtin.name, Type::Function(builtin.signature));
        }

        Self {
            locals,
            scopes,
            classes: Vec::new(),
            current_return: None,
            current_class: None,
        }
    }

    /// Check every top‑level statement.
    pub fn check(mut self, statements: &[Stmt]) -> Result<()> {
        info!("Beginning type check over {} statement(s)", statements.len());

        for stmt in statements {
            self.check_stmt(stmt)?;
        }

        info!("Type check succeeded");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    fn check_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.type_of(expr)?;
            }

            Stmt::Val {
                name,
                type_expr,
                initializer,
            } => {
                let declared = match type_expr {
                    Some(t) => Some(self.resolve_annotation(t)?),
                    None => None,
                };

                let inferred = match initializer {
                    Some(expr) => Some(self.type_of(expr)?),
                    None => None,
                };

                let ty = match (declared, inferred) {
                    (Some(declared), Some(inferred)) => {
                        if !declared.matches(&inferred) {
                            return Err(error(
                                name,
                                format!(
                                    "Variable '{}' of type '{}' cannot be initialized with '{}'",
                                    name.lexeme, declared, inferred
                                ),
                            ));
                        }
                        declared
                    }
                    (Some(ty), None) | (None, Some(ty)) => ty,
                    (None, None) => Type::Void,
                };

                debug!("val '{}': {}", name.lexeme, ty);
                self.scopes.declare(&name.lexeme, ty);
            }

            Stmt::Block(statements) => {
                self.scopes.begin();
                let result = self.check_block(statements);
                self.scopes.end();
                result?;
            }

            Stmt::If {
                keyword,
                condition,
                then_branch,
                else_branch,
            } => {
                self.expect_condition(keyword, condition)?;
                self.check_stmt(then_branch)?;
                if let Some(eb) = else_branch.as_deref() {
                    self.check_stmt(eb)?;
                }
            }

            Stmt::While {
                keyword,
                condition,
                body,
            } => {
                self.expect_condition(keyword, condition)?;
                self.check_stmt(body)?;
            }

            Stmt::Function(decl) => {
                let signature = self.signature(decl)?;
                self.scopes
                    .declare(&decl.name.lexeme, Type::Function(Rc::clone(&signature)));
                self.check_function(decl, &signature)?;
            }

            Stmt::Return { keyword, value } => {
                let actual = match value {
                    Some(expr) => self.type_of(expr)?,
                    None => Type::Void,
                };

                let expected = match &self.current_return {
                    Some(t) => t,
                    None => return Err(error(keyword, "Can't return from top-level code")),
                };

                if !expected.matches(&actual) {
                    return Err(error(
                        keyword,
                        format!(
                            "Return type '{}' does not match declared return type '{}'",
                            actual, expected
                        ),
                    ));
                }
            }

            Stmt::Class(decl) => self.check_class(decl)?,
        }

        Ok(())
    }

    fn check_block(&mut self, statements: &[Stmt]) -> Result<()> {
        for stmt in statements {
            self.check_stmt(stmt)?;
        }

        Ok(())
    }

    fn expect_condition(&mut self, keyword: &Token, condition: &Expr) -> Result<()> {
        let ty = self.type_of(condition)?;

        if !ty.is_boolean() {
            return Err(error(
                keyword,
                format!("Condition must be a Boolean, got '{}'", ty),
            ));
        }

        Ok(())
    }

    fn check_class(&mut self, decl: &ClassDecl) -> Result<()> {
        debug!("Checking class '{}'", decl.name.lexeme);

        let superclass = match &decl.superclass {
            Some(reference) => match self.lookup(reference)? {
                Type::Class(id) => Some(id),
                other => {
                    return Err(error(
                        &reference.name,
                        format!("Superclass must be a class, got '{}'", other),
                    ))
                }
            },
            None => None,
        };

        let id = ClassId::new(self.classes.len(), &decl.name.lexeme);
        self.classes.push(ClassType {
            name: decl.name.lexeme.clone(),
            superclass: superclass.clone(),
            methods: HashMap::new(),
        });
        self.scopes
            .declare(&decl.name.lexeme, Type::Class(id.clone()));

        // Signatures are built at global scope, so they may name this class.
        let mut signatures: Vec<Rc<FunctionType>> = Vec::with_capacity(decl.methods.len());
        for method in &decl.methods {
            let signature = self.signature(method)?;
            self.classes[id.index()]
                .methods
                .insert(method.name.lexeme.clone(), Rc::clone(&signature));
            signatures.push(signature);
        }

        if let Some(superclass) = &superclass {
            self.scopes.begin();
            self.scopes.declare(SUPER, Type::Class(superclass.clone()));
        }

        self.scopes.begin();
        self.scopes.declare(THIS, Type::Instance(id.clone()));

        let enclosing = self.current_class.replace(id);

        let mut result = Ok(());
        for (method, signature) in decl.methods.iter().zip(&signatures) {
            result = self.check_function(method, signature);
            if result.is_err() {
                break;
            }
        }

        self.current_class = enclosing;

        self.scopes.end();
        if superclass.is_some() {
            self.scopes.end();
        }

        result
    }

    /// Build a function's signature from its annotations in the current scope.
    fn signature(&mut self, decl: &FunctionDecl) -> Result<Rc<FunctionType>> {
        let mut params = Vec::with_capacity(decl.params.len());
        for param in &decl.params {
            params.push(self.resolve_annotation(&param.type_expr)?);
        }

        let return_type = match &decl.return_type {
            Some(t) => self.resolve_annotation(t)?,
            None => Type::Void,
        };

        Ok(Rc::new(FunctionType::new(
            decl.name.lexeme.clone(),
            params,
            return_type,
        )))
    }

    fn check_function(&mut self, decl: &FunctionDecl, signature: &FunctionType) -> Result<()> {
        debug!("Checking function '{}'", decl.name.lexeme);

        let enclosing = self.current_return.replace(signature.return_type.clone());

        self.scopes.begin();
        for (param, ty) in decl.params.iter().zip(&signature.params) {
            self.scopes.declare(&param.name.lexeme, ty.clone());
        }

        let result = self.check_block(&decl.body);
        self.scopes.end();

        self.current_return = enclosing;
        result
    }

    /// Turn an annotation into a type.  A class name denotes its instances.
    fn resolve_annotation(&mut self, type_expr: &TypeExpr) -> Result<Type> {
        let reference = match type_expr {
            TypeExpr::Boolean => return Ok(Type::Boolean),
            TypeExpr::Number => return Ok(Type::Number),
            TypeExpr::String => return Ok(Type::String),
            TypeExpr::Void => return Ok(Type::Void),
            TypeExpr::Named(reference) => reference,
        };

        match self.lookup(reference)? {
            Type::Class(id) => Ok(Type::Instance(id)),
            other => Err(error(
                &reference.name,
                format!(
                    "Type '{}' does not name a class (found '{}')",
                    reference.name.lexeme, other
                ),
            )),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    fn type_of(&mut self, expr: &Expr) -> Result<Type> {
        match expr {
            Expr::Literal { value, .. } => Ok(match value {
                LiteralValue::Number(_) => Type::Number,
                LiteralValue::Str(_) => Type::String,
                LiteralValue::Bool(_) => Type::Boolean,
                LiteralValue::Null => Type::Void,
            }),

            Expr::Grouping(inner) => self.type_of(inner),

            Expr::Unary { operator, right } => {
                let ty = self.type_of(right)?;

                match operator.token_type {
                    TokenType::BANG if !ty.is_boolean() => {
                        Err(error(operator, "Unary '!' requires a Boolean"))
                    }
                    TokenType::BANG => Ok(Type::Boolean),
                    _ if !ty.is_number() => Err(error(operator, "Unary '-' requires a Number")),
                    _ => Ok(Type::Number),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.type_of(left)?;
                let right = self.type_of(right)?;
                self.binary(operator, &left, &right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.type_of(left)?;
                let right = self.type_of(right)?;

                if !left.is_boolean() {
                    return Err(error(operator, "Left expression is not a Boolean"));
                }
                if !right.is_boolean() {
                    return Err(error(operator, "Right expression is not a Boolean"));
                }

                Ok(Type::Boolean)
            }

            Expr::Ternary {
                condition,
                question,
                then_branch,
                else_branch,
            } => {
                let condition = self.type_of(condition)?;
                if !condition.is_boolean() {
                    return Err(error(question, "Ternary condition is not a Boolean"));
                }

                let then_type = self.type_of(then_branch)?;
                let else_type = self.type_of(else_branch)?;

                if !then_type.matches(&else_type) {
                    return Err(error(
                        question,
                        format!(
                            "Ternary branches have different types: '{}' and '{}'",
                            then_type, else_type
                        ),
                    ));
                }

                Ok(then_type)
            }

            Expr::Variable(reference) => self.lookup(reference),

            Expr::Assign { target, value } => {
                let value = self.type_of(value)?;
                let variable = self.lookup(target)?;

                if matches!(variable, Type::Function(_) | Type::Class(_)) {
                    return Err(error(
                        &target.name,
                        format!("Cannot assign to '{}' of type '{}'", target.name.lexeme, variable),
                    ));
                }

                if !variable.matches(&value) {
                    return Err(error(
                        &target.name,
                        format!(
                            "Variable of type '{}' does not match assignment type '{}'",
                            variable, value
                        ),
                    ));
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.type_of(callee)?;

                let mut args = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.type_of(argument)?);
                }

                self.call(paren, &callee, &args)
            }

            Expr::Get { object, name } => {
                let id = self.instance_class(object, name)?;

                if let Some(method) = self.find_method(&id, &name.lexeme) {
                    return Ok(Type::Function(method));
                }

                match &self.current_class {
                    Some(current) if self.inherits(current, &id) => Ok(Type::any()),
                    _ => Err(error(
                        name,
                        format!("Class '{}' does not have property '{}'", id.name(), name.lexeme),
                    )),
                }
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let id = self.instance_class(object, name)?;

                if self.find_method(&id, &name.lexeme).is_some() {
                    return Err(error(
                        name,
                        format!("Cannot assign to method '{}'", name.lexeme),
                    ));
                }

                self.type_of(value)
            }

            Expr::This(reference) => self.lookup(reference),

            Expr::Super { keyword, method } => {
                let superclass = match self.lookup(keyword)? {
                    Type::Class(id) => id,
                    _ => return Err(error(&keyword.name, "Superclass is not a class")),
                };

                self.find_method(&superclass, &method.lexeme)
                    .map(Type::Function)
                    .ok_or_else(|| {
                        error(
                            method,
                            format!(
                                "Superclass '{}' does not have method '{}'",
                                superclass.name(),
                                method.lexeme
                            ),
                        )
                    })
            }
        }
    }

    fn binary(&self, operator: &Token, left: &Type, right: &Type) -> Result<Type> {
        match operator.token_type {
            TokenType::EQUAL_EQUAL | TokenType::BANG_EQUAL => {
                if !left.matches(right) {
                    return Err(error(
                        operator,
                        format!(
                            "Left, type '{}', does not match that of right, type '{}'",
                            left, right
                        ),
                    ));
                }

                Ok(Type::Boolean)
            }

            _ => {
                if !left.is_number() {
                    return Err(error(
                        operator,
                        format!("Left of operator '{}' is not a Number", operator.lexeme),
                    ));
                }
                if !right.is_number() {
                    return Err(error(
                        operator,
                        format!("Right of operator '{}' is not a Number", operator.lexeme),
                    ));
                }

                match operator.token_type {
                    TokenType::GREATER
                    | TokenType::GREATER_EQUAL
                    | TokenType::LESS
                    | TokenType::LESS_EQUAL => Ok(Type::Boolean),
                    _ => Ok(Type::Number),
                }
            }
        }
    }

    fn call(&self, paren: &Token, callee: &Type, args: &[Type]) -> Result<Type> {
        match callee {
            Type::Function(signature) => {
                if !signature.accepts(args) {
                    return Err(error(
                        paren,
                        format!(
                            "Arguments do not match the parameters of '{}': expected {}",
                            signature.name, callee
                        ),
                    ));
                }

                Ok(signature.return_type.clone())
            }

            Type::Class(id) => {
                let accepted = match self.find_method(id, CONSTRUCTOR) {
                    Some(constructor) => constructor.accepts(args),
                    None => args.is_empty(),
                };

                if !accepted {
                    return Err(error(
                        paren,
                        format!(
                            "Arguments do not match the constructor of class '{}'",
                            id.name()
                        ),
                    ));
                }

                Ok(Type::Instance(id.clone()))
            }

            // A field read inside a class may hold anything, including a function.
            Type::Generic(tags) if tags.contains(&TypeTag::Function) => Ok(Type::any()),

            _ => Err(error(paren, format!("Expression of type '{}' is not callable", callee))),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Type of a name, at the location recorded by the resolver.
    fn lookup(&self, reference: &Reference) -> Result<Type> {
        let name: &str = &reference.name.lexeme;

        let found = self.scopes.find(name);
        let recorded = self.locals.get(reference.id);

        let at = match (recorded, found) {
            (_, None) => {
                return Err(error(
                    &reference.name,
                    format!("Undefined variable '{}'", name),
                ))
            }
            (Some(distance), Some(Lookup::Local(d))) if distance == d => Lookup::Local(distance),
            (None, Some(Lookup::Global)) => Lookup::Global,
            (recorded, Some(found)) => {
                return Err(error(
                    &reference.name,
                    format!(
                        "Scope mismatch for '{}': resolved at {:?}, found at {:?}",
                        name, recorded, found
                    ),
                ))
            }
        };

        self.scopes.get(at, name).cloned().ok_or_else(|| {
            error(
                &reference.name,
                format!("Undefined variable '{}'", name),
            )
        })
    }

    /// The class of `object`, which must be an instance.
    fn instance_class(&mut self, object: &Expr, name: &Token) -> Result<ClassId> {
        match self.type_of(object)? {
            Type::Instance(id) => Ok(id),
            other => Err(error(
                name,
                format!("Object of type '{}' is not an instance of a class", other),
            )),
        }
    }

    /// Method `name` on class `id` or its nearest ancestor that has one.
    fn find_method(&self, id: &ClassId, name: &str) -> Option<Rc<FunctionType>> {
        let mut current = Some(id);

        while let Some(class_id) = current {
            let class = self.classes.get(class_id.index())?;
            if let Some(method) = class.methods.get(name) {
                return Some(Rc::clone(method));
            }
            current = class.superclass.as_ref();
        }

        None
    }

    /// `true` when `class` is `ancestor` or one of its subclasses.
    fn inherits(&self, class: &ClassId, ancestor: &ClassId) -> bool {
        let mut current = Some(class);

        while let Some(class_id) = current {
            if class_id == ancestor {
                return true;
            }
            current = self
                .classes
                .get(class_id.index())
                .and_then(|c| c.superclass.as_ref());
        }

        false
    }
}

fn error<S: Into<String>>(token: &Token, message: S) -> GrisError {
    GrisError::typing(token.line, token.col, message)
}
