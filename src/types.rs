//! Static type model used by the type checker.
//!
//! Class types are not stored inline: the checker owns a table of
//! [`ClassType`]s and every `Type` refers to one by [`ClassId`].  Two class
//! types are compatible only when they carry the same id, which makes classes
//! nominal even when two declarations look alike.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Discriminant of a [`Type`], used by `Generic` to list what it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Boolean,
    Number,
    String,
    Void,
    Function,
    Class,
    Instance,
}

impl TypeTag {
    pub const ALL: [TypeTag; 7] = [
        TypeTag::Boolean,
        TypeTag::Number,
        TypeTag::String,
        TypeTag::Void,
        TypeTag::Function,
        TypeTag::Class,
        TypeTag::Instance,
    ];
}

/// Handle into the checker's class table.
///
/// Equality looks at the index only; the name is kept for messages.
#[derive(Debug, Clone)]
pub struct ClassId {
    index: usize,
    name: Rc<str>,
}

impl ClassId {
    pub fn new(index: usize, name: &str) -> Self {
        Self {
            index,
            name: Rc::from(name),
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for ClassId {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for ClassId {}

/// Signature of a function, method or built-in.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    pub name: String,
    pub return_type: Type,
    pub params: Vec<Type>,
}

impl FunctionType {
    pub fn new<S: Into<String>>(name: S, params: Vec<Type>, return_type: Type) -> Self {
        Self {
            name: name.into(),
            return_type,
            params,
        }
    }

    /// `true` when `arguments` match the parameters in count and position.
    pub fn accepts(&self, arguments: &[Type]) -> bool {
        self.params.len() == arguments.len()
            && self
                .params
                .iter()
                .zip(arguments)
                .all(|(param, arg)| param.matches(arg))
    }
}

/// A class as seen by the checker.
#[derive(Debug, Clone)]
pub struct ClassType {
    pub name: String,
    pub superclass: Option<ClassId>,
    pub methods: HashMap<String, Rc<FunctionType>>,
}

/// Static type of an expression or binding.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Boolean,
    Number,
    String,
    Void,

    Function(Rc<FunctionType>),

    /// The class itself, as bound to its name.
    Class(ClassId),

    /// An instance of the class.
    Instance(ClassId),

    /// Accepts any type whose tag is listed.
    Generic(Vec<TypeTag>),
}

impl Type {
    /// `Generic` over every tag.
    pub fn any() -> Self {
        Type::Generic(TypeTag::ALL.to_vec())
    }

    pub fn tag(&self) -> Option<TypeTag> {
        Some(match self {
            Type::Boolean => TypeTag::Boolean,
            Type::Number => TypeTag::Number,
            Type::String => TypeTag::String,
            Type::Void => TypeTag::Void,
            Type::Function(_) => TypeTag::Function,
            Type::Class(_) => TypeTag::Class,
            Type::Instance(_) => TypeTag::Instance,
            Type::Generic(_) => return None,
        })
    }

    /// Compatibility between two types.
    ///
    /// A `Generic` side accepts the other side's tag.  Functions compare return
    /// type and parameters pairwise.  Everything else needs identical tags, and
    /// class types must also name the same class.
    pub fn matches(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Generic(a), Type::Generic(b)) => a.iter().any(|tag| b.contains(tag)),

            (Type::Generic(tags), t) | (t, Type::Generic(tags)) => {
                t.tag().map_or(false, |tag| tags.contains(&tag))
            }

            (Type::Function(a), Type::Function(b)) => {
                a.return_type.matches(&b.return_type) && a.accepts(&b.params)
            }

            (Type::Class(a), Type::Class(b)) | (Type::Instance(a), Type::Instance(b)) => a == b,

            _ => self.tag() == other.tag(),
        }
    }

    #[inline]
    pub fn is_number(&self) -> bool {
        self.matches(&Type::Number)
    }

    #[inline]
    pub fn is_boolean(&self) -> bool {
        self.matches(&Type::Boolean)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Boolean => write!(f, "Boolean"),
            Type::Number => write!(f, "Number"),
            Type::String => write!(f, "String"),
            Type::Void => write!(f, "Void"),
            Type::Function(func) => {
                write!(f, "(")?;
                for (i, param) in func.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                write!(f, ") -> {}", func.return_type)
            }
            Type::Class(id) => write!(f, "class {}", id.name()),
            Type::Instance(id) => write!(f, "{}", id.name()),
            Type::Generic(tags) if tags.len() == TypeTag::ALL.len() => write!(f, "Any"),
            Type::Generic(tags) => {
                let names: Vec<String> = tags.iter().map(|t| format!("{:?}", t)).collect();
                write!(f, "{}", names.join(" | "))
            }
        }
    }
}
