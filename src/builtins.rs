//! The native functions available in every program.
//!
//! Each built‑in is a name, a static signature and a Rust implementation.
//! The resolver, the type checker and the interpreter all seed their global
//! tables from [`all`], so the three can never disagree about what exists.

use std::io::Write;
use std::rc::Rc;

use crate::types::{FunctionType, Type};
use crate::value::{NativeFn, NativeFunction, Value};

pub struct Builtin {
    pub name: &'static str,
    pub signature: Rc<FunctionType>,
    pub function: Rc<NativeFunction>,
}

impl Builtin {
    fn new(name: &'static str, params: Vec<Type>, return_type: Type, func: NativeFn) -> Self {
        let arity = params.len();

        Self {
            name,
            signature: Rc::new(FunctionType::new(name, params, return_type)),
            function: Rc::new(NativeFunction { name, arity, func }),
        }
    }
}

pub fn all() -> Vec<Builtin> {
    vec![
        Builtin::new("abs", vec![Type::Number], Type::Number, abs),
        Builtin::new("len", vec![Type::String], Type::Number, len),
        Builtin::new(
            "charAt",
            vec![Type::String, Type::Number],
            Type::String,
            char_at,
        ),
        Builtin::new("print", vec![Type::any()], Type::Void, print),
        Builtin::new("println", vec![Type::any()], Type::Void, println),
    ]
}

fn abs(args: &[Value], _: &mut dyn Write) -> Result<Value, String> {
    match args {
        [Value::Number(n)] => Ok(Value::Number(n.abs())),
        _ => Err("abs expects a Number".into()),
    }
}

fn len(args: &[Value], _: &mut dyn Write) -> Result<Value, String> {
    match args {
        [Value::String(s)] => Ok(Value::Number(s.chars().count() as f64)),
        _ => Err("len expects a String".into()),
    }
}

/// Index is truncated toward zero; negative and non-finite indices are out of range.
fn char_at(args: &[Value], _: &mut dyn Write) -> Result<Value, String> {
    let (s, index) = match args {
        [Value::String(s), Value::Number(n)] => (s, n.trunc()),
        _ => return Err("charAt expects a String and a Number".into()),
    };

    let out_of_range = || {
        format!(
            "Index {} out of range for string of length {}",
            index,
            s.chars().count()
        )
    };

    if !index.is_finite() || index < 0.0 {
        return Err(out_of_range());
    }

    s.chars()
        .nth(index as usize)
        .map(|c| Value::String(c.to_string()))
        .ok_or_else(out_of_range)
}

fn print(args: &[Value], out: &mut dyn Write) -> Result<Value, String> {
    for value in args {
        write!(out, "{}", value).map_err(|e| e.to_string())?;
    }

    Ok(Value::Void)
}

fn println(args: &[Value], out: &mut dyn Write) -> Result<Value, String> {
    for value in args {
        write!(out, "{}", value).map_err(|e| e.to_string())?;
    }
    writeln!(out).map_err(|e| e.to_string())?;

    Ok(Value::Void)
}
