//! Module `scanner` implements a one‑pass, streaming lexer for the Gris language.
//!
//! It transforms a source string into a sequence of [`Token`]s, skipping whitespace
//! and comments, and emitting exactly one `EOF` token at the end. Designed as a
//! `FusedIterator`, it can be chained safely with other iterator adapters.
//!
//! # Token Recognition (`scan_token`)
//!
//! - Single‑character tokens: `(`, `)`, `{`, `}`, `,`, `.`, `;`, `:`, `?`, `+`, `*`, `%`, `^`.
//! - Two‑character operators: `!=`, `==`, `<=`, `>=`, `->`.
//! - String literals: `"` … `"`, allowing multi‑line and reporting unterminated errors.
//! - Numeric literals: integer and optional fractional part.
//! - Identifiers/keywords: alphanumeric/_ sequences, resolved via a perfect‑hash `KEYWORDS` map.
//! - Comments: `//` to end of line (skipped with `memchr`) and nestable `/* … */`.
//!
//! Errors do not stop the iterator: the offending lexeme is skipped and scanning
//! resumes, so a caller can collect every lexical error of a file in one pass.

use crate::error::{GrisError, Result};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"     => TokenType::AND,
    b"class"   => TokenType::CLASS,
    b"def"     => TokenType::DEF,
    b"else"    => TokenType::ELSE,
    b"false"   => TokenType::FALSE,
    b"for"     => TokenType::FOR,
    b"if"      => TokenType::IF,
    b"null"    => TokenType::NULL,
    b"or"      => TokenType::OR,
    b"return"  => TokenType::RETURN,
    b"super"   => TokenType::SUPER,
    b"this"    => TokenType::THIS,
    b"true"    => TokenType::TRUE,
    b"val"     => TokenType::VAL,
    b"while"   => TokenType::WHILE,
    b"Boolean" => TokenType::BOOLEAN_TYPE,
    b"Number"  => TokenType::NUMBER_TYPE,
    b"String"  => TokenType::STRING_TYPE,
    b"Void"    => TokenType::VOID_TYPE,
};

/// A single pass **scanner / lexer** that converts source text into a
/// sequence of [`Token`]s.
pub struct Scanner<'a> {
    src: &'a str,               // entire source file
    bytes: &'a [u8],            // `src` viewed as bytes
    start: usize,               // index of the *first* byte of the current lexeme
    curr: usize,                // index *one past* the last byte examined
    line: usize,                // 1‑based line counter (\n increments)
    line_start: usize,          // byte index where the current line begins
    start_line: usize,          // line of the current lexeme's first byte
    start_col: usize,           // column of the current lexeme's first byte
    pending: Option<TokenType>, // recognised token kind waiting to be emitted
    finished: bool,             // EOF already emitted
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `src`.
    #[inline]
    pub fn new(src: &'a str) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            bytes: src.as_bytes(),
            start: 0,
            curr: 0,
            line: 1,
            line_start: 0,
            start_line: 1,
            start_col: 1,
            pending: None,
            finished: false,
        }
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.bytes.len()
    }

    /// Advance one byte and return it.  Callers guard with [`Self::is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.bytes[self.curr];
        self.curr += 1;
        b
    }

    /// Peek at the current byte without consuming it.  Returns `0` past EOF.
    #[inline(always)]
    fn peek(&self) -> u8 {
        self.bytes.get(self.curr).copied().unwrap_or(0)
    }

    /// Peek one byte beyond [`Self::peek`].  Safe at EOF.
    #[inline(always)]
    fn peek_next(&self) -> u8 {
        self.bytes.get(self.curr + 1).copied().unwrap_or(0)
    }

    /// Conditionally consume a byte **iff** it matches `expected`.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Record that the byte just consumed was a newline.
    #[inline(always)]
    fn newline(&mut self) {
        self.line += 1;
        self.line_start = self.curr;
    }

    fn error<S: Into<String>>(&self, msg: S) -> GrisError {
        GrisError::lex(self.start_line, self.start_col, msg)
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a *single* token starting at `self.curr`.  If the lexeme produces an
    /// actual token the kind is stored in `self.pending`.  Whitespace and
    /// comments are skipped by returning `Ok(())` with `pending = None`.
    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        let tt = match b {
            // ── single‑character punctuators ──────────────────────────────
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b';' => TokenType::SEMICOLON,
            b':' => TokenType::COLON,
            b'?' => TokenType::QUESTION,
            b'+' => TokenType::PLUS,
            b'*' => TokenType::STAR,
            b'%' => TokenType::PERCENT,
            b'^' => TokenType::CARET,

            // ── two‑character operators ──────────────────────────────────
            b'-' if self.match_byte(b'>') => TokenType::ARROW,
            b'-' => TokenType::MINUS,
            b'!' if self.match_byte(b'=') => TokenType::BANG_EQUAL,
            b'!' => TokenType::BANG,
            b'=' if self.match_byte(b'=') => TokenType::EQUAL_EQUAL,
            b'=' => TokenType::EQUAL,
            b'<' if self.match_byte(b'=') => TokenType::LESS_EQUAL,
            b'<' => TokenType::LESS,
            b'>' if self.match_byte(b'=') => TokenType::GREATER_EQUAL,
            b'>' => TokenType::GREATER,

            // ── whitespace / newline ─────────────────────────────────────
            b' ' | b'\r' | b'\t' => return Ok(()),

            b'\n' => {
                self.newline();
                return Ok(());
            }

            // ── comments and slash ───────────────────────────────────────
            b'/' if self.match_byte(b'/') => {
                // Fast‑forward to the next newline; the newline itself is
                // consumed by the main loop so line tracking stays in one place.
                match memchr(b'\n', &self.bytes[self.curr..]) {
                    Some(pos) => self.curr += pos,
                    None => self.curr = self.bytes.len(),
                }
                return Ok(());
            }

            b'/' if self.match_byte(b'*') => return self.block_comment(),

            b'/' => TokenType::SLASH,

            b'"' => self.parse_string()?,

            b'0'..=b'9' => self.parse_number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.parse_identifier(),

            // ── unexpected character ─────────────────────────────────────
            _ => {
                // Swallow UTF‑8 continuation bytes so the next lexeme starts on
                // a character boundary.
                while (0x80..0xC0).contains(&self.peek()) {
                    self.advance();
                }

                let ch = &self.src[self.start..self.curr];

                return Err(self.error(format!("Unexpected character '{}'", ch)));
            }
        };

        self.pending = Some(tt);

        Ok(())
    }

    /// Skip a `/* … */` comment.  Nested comments must be balanced.
    fn block_comment(&mut self) -> Result<()> {
        let mut depth = 0usize;

        loop {
            if self.is_at_end() {
                return Err(self.error("Unterminated block comment"));
            }

            match (self.peek(), self.peek_next()) {
                (b'*', b'/') => {
                    self.curr += 2;

                    if depth == 0 {
                        return Ok(());
                    }

                    depth -= 1;
                }

                (b'/', b'*') => {
                    self.curr += 2;
                    depth += 1;
                }

                (b'\n', _) => {
                    self.advance();
                    self.newline();
                }

                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Parse a double‑quoted string literal.
    ///
    /// * `self.start` still points to the opening `"`.
    /// * When we return, `self.curr` points **past** the closing `"`.
    fn parse_string(&mut self) -> Result<TokenType> {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.newline();
            }
        }

        if self.is_at_end() {
            return Err(self.error("Unterminated string literal"));
        }

        self.advance(); // consume closing quote

        // Slice excluding the surrounding quotes.
        let s: &str = &self.src[self.start + 1..self.curr - 1];

        Ok(TokenType::STRING(s.to_owned()))
    }

    /// Parse a numeric literal (`123`, `3.14`).  Fractions are optional.
    fn parse_number(&mut self) -> TokenType {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // Optional fractional part.
        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // consume "."

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let s: &str = &self.src[self.start..self.curr];
        let n: f64 = s.parse::<f64>().unwrap_or(0.0); // digits only, cannot fail

        TokenType::NUMBER(n)
    }

    /// Parse an identifier and decide if it is a **keyword** or a generic
    /// `IDENTIFIER` token.
    fn parse_identifier(&mut self) -> TokenType {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        let slice: &[u8] = &self.bytes[self.start..self.curr];

        KEYWORDS
            .get(slice)
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            // 1. EOF guard – emit exactly one EOF then terminate.
            if self.is_at_end() {
                self.finished = true;
                let col = self.curr - self.line_start + 1;
                return Some(Ok(Token::new(TokenType::EOF, "", self.line, col)));
            }

            // 2. Reset per‑token state.
            self.start = self.curr;
            self.start_line = self.line;
            self.start_col = self.start - self.line_start + 1;
            self.pending = None;

            // 3. Attempt to scan a token.
            if let Err(e) = self.scan_token() {
                debug!("Lexing error: {}", e.message());
                return Some(Err(e));
            }

            // 4. If a real token was recognised, build and return it.
            if let Some(tt) = self.pending.take() {
                let lex: &str = &self.src[self.start..self.curr];

                return Some(Ok(Token::new(tt, lex, self.start_line, self.start_col)));
            }
            // Otherwise it was whitespace / comment → continue loop.
        }
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
