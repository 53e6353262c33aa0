//! Centralised error hierarchy for the **Gris** toolchain.
//!
//! Every pass (scanner, parser, resolver, type checker, interpreter) converts its
//! failure modes into one of the variants defined here, so the whole crate can share
//! a single `Result<T>` alias and the CLI can inter‑operate with `anyhow`.
//!
//! Each diagnostic carries the message, the 1‑based line and column, and the text of
//! the offending source line.  The module **does not** print diagnostics itself.

use std::fmt;
use std::io;

use log::info;
use thiserror::Error;

/// Location and text of a single diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Human‑readable description.
    pub message: String,

    /// 1‑based line where the error occurred.
    pub line: usize,

    /// 1‑based column of the offending token.
    pub col: usize,

    /// Text of the source line, filled in by [`GrisError::with_source`].
    pub source_line: String,
}

impl Diagnostic {
    fn new(message: String, line: usize, col: usize) -> Self {
        Self {
            message,
            line,
            col,
            source_line: String::new(),
        }
    }
}

impl fmt::Display for Diagnostic {
    /// Renders the message, the `line:col | source` gutter and a caret under the column.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let gutter = format!("{}:{} | ", self.line, self.col);
        let pad = gutter.len() + self.col.saturating_sub(1);

        writeln!(f, "{}", self.message)?;
        writeln!(f, "\t{}{}", gutter, self.source_line)?;
        write!(f, "\t{}^", " ".repeat(pad))
    }
}

/// Canonical error type used throughout the crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GrisError {
    /// Malformed character, string or comment.
    #[error("[Lexing Error] {0}")]
    Lex(Diagnostic),

    /// Grammar violation.  The parser accumulates these.
    #[error("[Parsing Error] {0}")]
    Parse(Diagnostic),

    /// Scope misuse detected by the resolver.
    #[error("[Resolving Error] {0}")]
    Resolve(Diagnostic),

    /// Static type violation.
    #[error("[Typing Error] {0}")]
    Type(Diagnostic),

    /// Failure while evaluating a program.
    #[error("[Runtime Error] {0}")]
    Runtime(Diagnostic),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl GrisError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, col: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: {}:{} {}", line, col, message);

        GrisError::Lex(Diagnostic::new(message, line, col))
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, col: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: {}:{} {}", line, col, message);

        GrisError::Parse(Diagnostic::new(message, line, col))
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(line: usize, col: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: {}:{} {}", line, col, message);

        GrisError::Resolve(Diagnostic::new(message, line, col))
    }

    /// Helper constructor for the **type checker**.
    pub fn typing<S: Into<String>>(line: usize, col: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Type error: {}:{} {}", line, col, message);

        GrisError::Type(Diagnostic::new(message, line, col))
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(line: usize, col: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: {}:{} {}", line, col, message);

        GrisError::Runtime(Diagnostic::new(message, line, col))
    }

    /// The diagnostic payload, if this is a language error rather than an I/O one.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            GrisError::Lex(d)
            | GrisError::Parse(d)
            | GrisError::Resolve(d)
            | GrisError::Type(d)
            | GrisError::Runtime(d) => Some(d),
            GrisError::Io(_) | GrisError::Utf8(_) => None,
        }
    }

    /// Message text without location, or the wrapped error's text.
    pub fn message(&self) -> String {
        match self.diagnostic() {
            Some(d) => d.message.clone(),
            None => self.to_string(),
        }
    }

    /// Attach the offending line of `source` to the diagnostic.
    pub fn with_source(mut self, source: &str) -> Self {
        if let GrisError::Lex(d)
        | GrisError::Parse(d)
        | GrisError::Resolve(d)
        | GrisError::Type(d)
        | GrisError::Runtime(d) = &mut self
        {
            d.source_line = source
                .lines()
                .nth(d.line.saturating_sub(1))
                .unwrap_or_default()
                .to_string();
        }

        self
    }

    /// Process exit code used by the CLI for this error class.
    pub fn exit_code(&self) -> i32 {
        match self {
            GrisError::Runtime(_) => 70,
            GrisError::Io(_) | GrisError::Utf8(_) => 74,
            _ => 65,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, GrisError>;
