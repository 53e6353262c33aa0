//! Gris: a small statically typed scripting language.
//!
//! Source goes through four passes, each of which must succeed before the
//! next starts: scanning and parsing, scope resolution, type checking, and
//! evaluation.  The helpers at the bottom of this file wire them together and
//! attach the offending source line to every error they return.

pub mod ast;
pub mod ast_printer;
pub mod builtins;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod scope;
pub mod token;
pub mod types;
pub mod typing;
pub mod value;

use std::io::Write;

use log::info;

use crate::ast::Stmt;
use crate::error::{GrisError, Result};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::{Locals, Resolver};
use crate::scanner::Scanner;
use crate::token::Token;
use crate::typing::TypeChecker;

/// Every error of a failed stage, in source order.
pub type Errors = Vec<GrisError>;

fn with_source(errors: Errors, source: &str) -> Errors {
    errors.into_iter().map(|e| e.with_source(source)).collect()
}

/// Decode raw file contents into source text.
pub fn decode(bytes: Vec<u8>) -> Result<String> {
    let source = String::from_utf8(bytes)?;
    info!("Decoded {} bytes of source", source.len());
    Ok(source)
}

/// Scan `source`, collecting every lexical error.
pub fn scan(source: &str) -> std::result::Result<Vec<Token>, Errors> {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    for token in Scanner::new(source) {
        match token {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(with_source(errors, source))
    }
}

/// Scan and parse `source`.
pub fn parse(source: &str) -> std::result::Result<Vec<Stmt>, Errors> {
    let tokens = scan(source)?;

    Parser::new(tokens)
        .parse()
        .map_err(|errors| with_source(errors, source))
}

/// Resolve and type‑check a parsed program, returning its distance table.
pub fn analyze(statements: &[Stmt]) -> Result<Locals> {
    let locals = Resolver::new().resolve(statements)?;
    TypeChecker::new(&locals).check(statements)?;

    info!("Static analysis succeeded");
    Ok(locals)
}

/// Parse and analyze `source` without running it.
pub fn check(source: &str) -> std::result::Result<(Vec<Stmt>, Locals), Errors> {
    let statements = parse(source)?;
    let locals = analyze(&statements).map_err(|e| vec![e.with_source(source)])?;

    Ok((statements, locals))
}

/// Run `source` end to end, sending program output to `output`.
pub fn run(source: &str, output: Box<dyn Write>) -> std::result::Result<(), Errors> {
    let (statements, locals) = check(source)?;

    Interpreter::with_output(output)
        .interpret(&statements, locals)
        .map_err(|e| vec![e.with_source(source)])
}
