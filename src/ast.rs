//! Abstract syntax tree shared by every pass after parsing.
//!
//! The tree is immutable once built.  Nodes that refer to a binding by name
//! (variables, assignment targets, `this`, `super`, named type annotations) carry
//! a [`Reference`] whose [`NodeId`] is unique within one parse.  The resolver keys
//! its distance table by that id, so two textually identical references at
//! different positions resolve independently.

use std::rc::Rc;

use crate::token::Token;

/// Identity of a reference-bearing node, assigned by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// A use of a name: the token as written plus the node's identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub id: NodeId,
    pub name: Token,
}

/// A literal constant that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal, stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    /// `true` / `false`.
    Bool(bool),

    /// `null`, which evaluates to `Void`.
    Null,
}

/// A type annotation as written in the source.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Boolean,
    Number,
    String,
    Void,

    /// A class name, resolved later to an instance type.
    Named(Reference),
}

/// A declared function or method parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Token,
    pub type_expr: TypeExpr,
}

/// A function or method declaration.  Shared by `Rc` so runtime closures can
/// hold on to it.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Param>,

    /// Absent ⇒ `Void`.
    pub return_type: Option<TypeExpr>,
    pub body: Vec<Stmt>,
}

/// A class declaration with optional single superclass.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: Token,
    pub superclass: Option<Reference>,
    pub methods: Vec<Rc<FunctionDecl>>,
}

/// Every kind of *expression* in Gris.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal {
        value: LiteralValue,
        token: Token,
    },

    /// `!x`, `-x`
    Unary {
        operator: Token,
        right: Box<Expr>,
    },

    /// Arithmetic, exponent, relational and equality operators.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Short‑circuiting `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// `condition ? then : else`
    Ternary {
        condition: Box<Expr>,
        question: Token,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// Parenthesised sub‑expression.
    Grouping(Box<Expr>),

    Variable(Reference),

    Assign {
        target: Reference,
        value: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        /// The closing `)` token, retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// object.property
    Get {
        object: Box<Expr>,
        name: Token,
    },

    /// object.property = value
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    This(Reference),

    /// `super.method`
    Super {
        keyword: Reference,
        method: Token,
    },
}

/// Every kind of *statement*.  `for` loops are desugared by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    /// `val name (: type)? (= initializer)?;`
    Val {
        name: Token,
        type_expr: Option<TypeExpr>,
        initializer: Option<Expr>,
    },

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt>),

    If {
        keyword: Token,
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    While {
        keyword: Token,
        condition: Expr,
        body: Box<Stmt>,
    },

    Function(Rc<FunctionDecl>),

    Return {
        keyword: Token,
        value: Option<Expr>,
    },

    Class(ClassDecl),
}
