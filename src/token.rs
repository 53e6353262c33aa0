use log::debug;
use serde::Serialize;
use std::fmt;
use std::mem;

/// The different kinds of tokens recognized by the Gris scanner.
///
/// Variants without data represent punctuation, operators or keywords.
/// `STRING(String)` and `NUMBER(f64)` carry their literal values.
/// `IDENTIFIER` is used for user‑defined names.
/// `EOF` marks the end of input.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Serialize)]
pub enum TokenType {
    /// '('
    LEFT_PAREN,

    /// ')'
    RIGHT_PAREN,

    /// '{'
    LEFT_BRACE,

    /// '}'
    RIGHT_BRACE,

    /// ','
    COMMA,

    /// '.'
    DOT,

    /// ';'
    SEMICOLON,

    /// ':'
    COLON,

    /// '?'
    QUESTION,

    /// '-'
    MINUS,

    /// '->'
    ARROW,

    /// '+'
    PLUS,

    /// '/'
    SLASH,

    /// '*'
    STAR,

    /// '%'
    PERCENT,

    /// '^'
    CARET,

    /// '!'
    BANG,

    /// '!='
    BANG_EQUAL,

    /// '='
    EQUAL,

    /// '=='
    EQUAL_EQUAL,

    /// '>'
    GREATER,

    /// '>='
    GREATER_EQUAL,

    /// '<'
    LESS,

    /// '<='
    LESS_EQUAL,

    /// A user‑defined identifier
    IDENTIFIER,

    /// A string literal (contents without quotes)
    STRING(String),

    /// A numeric literal
    NUMBER(f64),

    AND,
    CLASS,
    DEF,
    ELSE,
    FALSE,
    FOR,
    IF,
    NULL,
    OR,
    RETURN,
    SUPER,
    THIS,
    TRUE,
    VAL,
    WHILE,

    /// Type keywords
    BOOLEAN_TYPE,
    NUMBER_TYPE,
    STRING_TYPE,
    VOID_TYPE,

    /// End‑of‑file marker
    EOF,
}

impl PartialEq for TokenType {
    /// Two TokenTypes are equal if they share the same variant
    /// (ignoring any inner data). Uses `mem::discriminant` to compare.
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

impl TokenType {
    /// Variant name without payload, as printed by `gris tokenize`.
    pub fn name(&self) -> &'static str {
        match self {
            TokenType::LEFT_PAREN => "LEFT_PAREN",
            TokenType::RIGHT_PAREN => "RIGHT_PAREN",
            TokenType::LEFT_BRACE => "LEFT_BRACE",
            TokenType::RIGHT_BRACE => "RIGHT_BRACE",
            TokenType::COMMA => "COMMA",
            TokenType::DOT => "DOT",
            TokenType::SEMICOLON => "SEMICOLON",
            TokenType::COLON => "COLON",
            TokenType::QUESTION => "QUESTION",
            TokenType::MINUS => "MINUS",
            TokenType::ARROW => "ARROW",
            TokenType::PLUS => "PLUS",
            TokenType::SLASH => "SLASH",
            TokenType::STAR => "STAR",
            TokenType::PERCENT => "PERCENT",
            TokenType::CARET => "CARET",
            TokenType::BANG => "BANG",
            TokenType::BANG_EQUAL => "BANG_EQUAL",
            TokenType::EQUAL => "EQUAL",
            TokenType::EQUAL_EQUAL => "EQUAL_EQUAL",
            TokenType::GREATER => "GREATER",
            TokenType::GREATER_EQUAL => "GREATER_EQUAL",
            TokenType::LESS => "LESS",
            TokenType::LESS_EQUAL => "LESS_EQUAL",
            TokenType::IDENTIFIER => "IDENTIFIER",
            TokenType::STRING(_) => "STRING",
            TokenType::NUMBER(_) => "NUMBER",
            TokenType::AND => "AND",
            TokenType::CLASS => "CLASS",
            TokenType::DEF => "DEF",
            TokenType::ELSE => "ELSE",
            TokenType::FALSE => "FALSE",
            TokenType::FOR => "FOR",
            TokenType::IF => "IF",
            TokenType::NULL => "NULL",
            TokenType::OR => "OR",
            TokenType::RETURN => "RETURN",
            TokenType::SUPER => "SUPER",
            TokenType::THIS => "THIS",
            TokenType::TRUE => "TRUE",
            TokenType::VAL => "VAL",
            TokenType::WHILE => "WHILE",
            TokenType::BOOLEAN_TYPE => "BOOLEAN_TYPE",
            TokenType::NUMBER_TYPE => "NUMBER_TYPE",
            TokenType::STRING_TYPE => "STRING_TYPE",
            TokenType::VOID_TYPE => "VOID_TYPE",
            TokenType::EOF => "EOF",
        }
    }
}

/// A single lexical token with its source position.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token {
    /// The category of this token.
    pub token_type: TokenType,

    /// The exact substring from the source that produced this token.
    pub lexeme: String,

    /// 1‑based line number in the source.
    pub line: usize,

    /// 1‑based column of the token's first character.
    pub col: usize,
}

impl Token {
    /// Create a new Token with the given type, lexeme and position.
    pub fn new<S: Into<String>>(token_type: TokenType, lexeme: S, line: usize, col: usize) -> Self {
        let lexeme: String = lexeme.into();

        debug!(
            "Creating new token: type={:?}, lexeme={}, line={}, col={}",
            token_type, lexeme, line, col
        );

        Self {
            token_type,
            lexeme,
            line,
            col,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 3 → "3.0", 3.14 → "3.14"
        let literal: String = match &self.token_type {
            TokenType::STRING(s) => s.clone(),
            TokenType::NUMBER(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                let mut buf = itoa::Buffer::new();
                format!("{}.0", buf.format(*n as i64))
            }
            TokenType::NUMBER(n) => n.to_string(),
            _ => "null".to_string(),
        };

        write!(
            f,
            "{} {} {}",
            self.token_type.name(),
            self.lexeme,
            literal
        )
    }
}
