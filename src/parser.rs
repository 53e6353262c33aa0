/*!
Recursive‑descent parser for Gris.

Grammar (EBNF, condensed)
--------------------------

```text
program     → declaration* EOF ;
declaration → "class" classDecl | "def" function | "val" valDecl | statement ;
classDecl   → IDENT ( "<" IDENT )? "{" function* "}" ;
function    → IDENT "(" params? ")" ( "->" type )? block ;
params      → IDENT ":" type ( "," IDENT ":" type )* ;
valDecl     → IDENT ( ":" type )? ( "=" expression )? ";" ;
type        → "Boolean" | "Number" | "String" | "Void" | IDENT ;
statement   → forStmt | ifStmt | returnStmt | whileStmt | block | exprStmt ;
expression  → assignment ;
assignment  → ( call "." )? IDENT "=" assignment | ternary ;
ternary     → or ( "?" or ":" ternary )? ;
or          → and ( "or" and )* ;
and         → equality ( "and" equality )* ;
equality    → comparison ( ( "!=" | "==" ) comparison )* ;
comparison  → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term        → factor ( ( "-" | "+" ) factor )* ;
factor      → exponent ( ( "/" | "*" | "%" ) exponent )* ;
exponent    → unary ( "^" unary )* ;
unary       → ( "!" | "-" ) unary | call ;
call        → primary ( "(" arguments? ")" | "." IDENT )* ;
primary     → "true" | "false" | "null" | NUMBER | STRING | "this"
            | "super" "." IDENT | IDENT | "(" expression ")" ;
```

`for` loops are desugared into `while` inside blocks, so later passes never see
them.

Errors are accumulated: after a syntax error the parser records it, discards
tokens up to the next statement boundary and carries on, so one run can report
several problems.

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse`       | `info` | Lifecycle milestones.                     |
| `declaration`, `statement`   | `debug`| High‑level descent into grammar branches. |
| Error recovery               | `debug`| Tokens discarded while synchronizing.     |
*/

use std::rc::Rc;

use crate::ast::{
    ClassDecl, Expr, FunctionDecl, LiteralValue, NodeId, Param, Reference, Stmt, TypeExpr,
};
use crate::error::{GrisError, Result};
use crate::token::{Token, TokenType};

use log::{debug, info};

const MAX_ARGS: usize = 255;

/// Top‑level parser over a scanned token stream.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    next_id: usize,
    errors: Vec<GrisError>,
}

impl Parser {
    /// Construct a new parser.  The stream must end with an `EOF` token.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        if tokens.last().map_or(true, |t| t.token_type != TokenType::EOF) {
            let (line, col) = tokens.last().map_or((1, 1), |t| (t.line, t.col));
            tokens.push(Token::new(TokenType::EOF, "", line, col));
        }

        Self {
            tokens,
            current: 0,
            next_id: 0,
            errors: Vec::new(),
        }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program.  Returns every syntax error if any occurred.
    pub fn parse(mut self) -> std::result::Result<Vec<Stmt>, Vec<GrisError>> {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        if self.errors.is_empty() {
            info!("Parsed {} statements", statements.len());
            Ok(statements)
        } else {
            info!("Parse failed with {} error(s)", self.errors.len());
            Err(self.errors)
        }
    }

    // ──────────────────────── declaration rules ───────────────────

    /// Parse one declaration, recovering at the next statement boundary on error.
    fn declaration(&mut self) -> Option<Stmt> {
        debug!("Entering declaration");

        let result = if self.matches(TokenType::CLASS) {
            self.class_declaration()
        } else if self.matches(TokenType::DEF) {
            self.function("function").map(Stmt::Function)
        } else if self.matches(TokenType::VAL) {
            self.val_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                self.errors.push(e);
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self) -> Result<Stmt> {
        let name = self.consume(TokenType::IDENTIFIER, "Expected class name")?;

        let superclass = if self.matches(TokenType::LESS) {
            let token = self.consume(TokenType::IDENTIFIER, "Expected superclass name")?;
            Some(self.reference(token))
        } else {
            None
        };

        self.consume(TokenType::LEFT_BRACE, "Expected '{' before class body")?;

        let mut methods: Vec<Rc<FunctionDecl>> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after class body")?;

        Ok(Stmt::Class(ClassDecl {
            name,
            superclass,
            methods,
        }))
    }

    fn function(&mut self, kind: &str) -> Result<Rc<FunctionDecl>> {
        let name = self.consume(TokenType::IDENTIFIER, &format!("Expected {} name", kind))?;

        self.consume(
            TokenType::LEFT_PAREN,
            &format!("Expected '(' after {} name", kind),
        )?;

        let mut params: Vec<Param> = Vec::new();
        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARGS {
                    let next = self.peek();
                    return Err(GrisError::parse(
                        next.line,
                        next.col,
                        "No more than 255 parameters",
                    ));
                }

                let param = self.consume(TokenType::IDENTIFIER, "Expected parameter name")?;
                self.consume(TokenType::COLON, "Expected ':' after parameter name")?;
                let type_expr = self.type_expression()?;

                params.push(Param {
                    name: param,
                    type_expr,
                });

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after parameters")?;

        let return_type = if self.matches(TokenType::ARROW) {
            Some(self.type_expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::LEFT_BRACE,
            &format!("Expected '{{' before {} body", kind),
        )?;
        let body = self.block()?;

        Ok(Rc::new(FunctionDecl {
            name,
            params,
            return_type,
            body,
        }))
    }

    fn val_declaration(&mut self) -> Result<Stmt> {
        let name = self.consume(TokenType::IDENTIFIER, "Expected variable name")?;

        let type_expr = if self.matches(TokenType::COLON) {
            Some(self.type_expression()?)
        } else {
            None
        };

        let initializer = if self.matches(TokenType::EQUAL) {
            Some(self.expression()?)
        } else {
            None
        };

        if type_expr.is_none() && initializer.is_none() {
            return Err(GrisError::parse(
                name.line,
                name.col,
                "Expected a type annotation or an initializer",
            ));
        }

        self.consume(
            TokenType::SEMICOLON,
            "Expected ';' after variable declaration",
        )?;

        Ok(Stmt::Val {
            name,
            type_expr,
            initializer,
        })
    }

    fn type_expression(&mut self) -> Result<TypeExpr> {
        if self.is_at_end() {
            let eof = self.peek();
            return Err(GrisError::parse(eof.line, eof.col, "Expected type expression"));
        }

        let token = self.advance();

        match token.token_type {
            TokenType::BOOLEAN_TYPE => Ok(TypeExpr::Boolean),
            TokenType::NUMBER_TYPE => Ok(TypeExpr::Number),
            TokenType::STRING_TYPE => Ok(TypeExpr::String),
            TokenType::VOID_TYPE => Ok(TypeExpr::Void),
            TokenType::IDENTIFIER => Ok(TypeExpr::Named(self.reference(token))),
            _ => Err(GrisError::parse(
                token.line,
                token.col,
                "Expected type expression",
            )),
        }
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        debug!("Entering statement at {:?}", self.peek().token_type);

        if self.matches(TokenType::FOR) {
            self.for_statement()
        } else if self.matches(TokenType::IF) {
            self.if_statement()
        } else if self.matches(TokenType::RETURN) {
            self.return_statement()
        } else if self.matches(TokenType::WHILE) {
            self.while_statement()
        } else if self.matches(TokenType::LEFT_BRACE) {
            Ok(Stmt::Block(self.block()?))
        } else {
            self.expression_statement()
        }
    }

    /// Desugars `for (init; cond; incr) body` into
    /// `{ init; while (cond) { body; incr; } }`.
    fn for_statement(&mut self) -> Result<Stmt> {
        let keyword = self.previous();

        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'for'")?;

        let initializer = if self.matches(TokenType::SEMICOLON) {
            None
        } else if self.matches(TokenType::VAL) {
            Some(self.val_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::SEMICOLON, "Expected ';' after loop condition")?;

        let increment = if !self.check(TokenType::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after for clauses")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        let condition = condition.unwrap_or_else(|| Expr::Literal {
            value: LiteralValue::Bool(true),
            token: keyword.clone(),
        });

        body = Stmt::While {
            keyword,
            condition,
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        let keyword = self.previous();

        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'if'")?;
        let condition = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after if condition")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.matches(TokenType::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            keyword,
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        let keyword = self.previous();

        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'while'")?;
        let condition = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after condition")?;
        let body = Box::new(self.statement()?);

        Ok(Stmt::While {
            keyword,
            condition,
            body,
        })
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let keyword = self.previous();
        let value = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expected ';' after return value")?;
        Ok(Stmt::Return { keyword, value })
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr = self.expression()?;
        self.consume(TokenType::SEMICOLON, "Expected ';' after expression")?;
        Ok(Stmt::Expression(expr))
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after block")?;
        Ok(statements)
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr = self.ternary()?;

        if self.matches(TokenType::EQUAL) {
            let equals = self.previous();
            let value = Box::new(self.assignment()?);

            return match expr {
                Expr::Variable(target) => Ok(Expr::Assign { target, value }),

                Expr::Get { object, name } => Ok(Expr::Set {
                    object,
                    name,
                    value,
                }),

                _ => Err(GrisError::parse(
                    equals.line,
                    equals.col,
                    "Invalid assignment target",
                )),
            };
        }

        Ok(expr)
    }

    fn ternary(&mut self) -> Result<Expr> {
        let expr = self.logical_or()?;

        if self.matches(TokenType::QUESTION) {
            let question = self.previous();
            let then_branch = self.logical_or()?;

            self.consume(TokenType::COLON, "Expected ':' after ternary operator '?'")?;
            let else_branch = self.ternary()?;

            return Ok(Expr::Ternary {
                condition: Box::new(expr),
                question,
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            });
        }

        Ok(expr)
    }

    fn logical_or(&mut self) -> Result<Expr> {
        let mut expr = self.logical_and()?;

        while self.matches(TokenType::OR) {
            let operator = self.previous();
            let right = self.logical_and()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expr> {
        let mut expr = self.equality()?;

        while self.matches(TokenType::AND) {
            let operator = self.previous();
            let right = self.equality()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// Left‑associative binary level: `next ( op next )*`.
    fn binary_level(
        &mut self,
        operators: &[TokenType],
        next: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let mut expr = next(self)?;

        while operators.iter().any(|op| self.check(op.clone())) {
            let operator = self.advance();
            let right = next(self)?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        self.binary_level(
            &[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.binary_level(
            &[
                TokenType::GREATER,
                TokenType::GREATER_EQUAL,
                TokenType::LESS,
                TokenType::LESS_EQUAL,
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> Result<Expr> {
        self.binary_level(&[TokenType::MINUS, TokenType::PLUS], Self::factor)
    }

    fn factor(&mut self) -> Result<Expr> {
        self.binary_level(
            &[TokenType::SLASH, TokenType::STAR, TokenType::PERCENT],
            Self::exponent,
        )
    }

    fn exponent(&mut self) -> Result<Expr> {
        self.binary_level(&[TokenType::CARET], Self::unary)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.matches(TokenType::BANG) || self.matches(TokenType::MINUS) {
            let operator = self.previous();
            let right = self.unary()?;
            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.matches(TokenType::LEFT_PAREN) {
                expr = self.finish_call(expr)?;
            } else if self.matches(TokenType::DOT) {
                let name = self.consume(TokenType::IDENTIFIER, "Expected property name after '.'")?;

                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();
        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARGS {
                    let next = self.peek();
                    return Err(GrisError::parse(
                        next.line,
                        next.col,
                        "No more than 255 arguments",
                    ));
                }

                arguments.push(self.expression()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        let paren = self.consume(TokenType::RIGHT_PAREN, "Expected ')' after arguments")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        if self.is_at_end() {
            let eof = self.peek();
            return Err(GrisError::parse(eof.line, eof.col, "Expected expression"));
        }

        let token = self.advance();

        let value = match &token.token_type {
            TokenType::FALSE => LiteralValue::Bool(false),
            TokenType::TRUE => LiteralValue::Bool(true),
            TokenType::NULL => LiteralValue::Null,
            TokenType::NUMBER(n) => LiteralValue::Number(*n),
            TokenType::STRING(s) => LiteralValue::Str(s.clone()),

            TokenType::SUPER => {
                self.consume(TokenType::DOT, "Expected '.' after 'super'")?;
                let method = self.consume(TokenType::IDENTIFIER, "Expected superclass method name")?;
                let keyword = self.reference(token);
                return Ok(Expr::Super { keyword, method });
            }

            TokenType::THIS => return Ok(Expr::This(self.reference(token))),

            TokenType::IDENTIFIER => return Ok(Expr::Variable(self.reference(token))),

            TokenType::LEFT_PAREN => {
                let expr = self.expression()?;
                self.consume(TokenType::RIGHT_PAREN, "Expected ')' after expression")?;
                return Ok(Expr::Grouping(Box::new(expr)));
            }

            _ => {
                // Leave the offending token for synchronize() to discard.
                self.current -= 1;
                return Err(GrisError::parse(token.line, token.col, "Expected expression"));
            }
        };

        Ok(Expr::Literal { value, token })
    }

    // ────────────────────── utility helpers ───────────────────────

    /// Wrap a name token in a fresh reference node.
    fn reference(&mut self, name: Token) -> Reference {
        let id = NodeId(self.next_id);
        self.next_id += 1;

        Reference { id, name }
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<Token> {
        if self.check(ttype) {
            return Ok(self.advance());
        }

        let next = self.peek();
        debug!("Expected token missing at {}:{}: {}", next.line, next.col, message);

        Err(GrisError::parse(next.line, next.col, message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    #[inline(always)]
    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> Token {
        self.tokens[self.current.saturating_sub(1)].clone()
    }

    /// Discards tokens until it thinks it is at a statement boundary.
    fn synchronize(&mut self) {
        self.advance(); // skip the token that caused the error

        while !self.is_at_end() {
            if matches!(self.previous().token_type, TokenType::SEMICOLON) {
                return;
            }

            match self.peek().token_type {
                TokenType::CLASS
                | TokenType::DEF
                | TokenType::VAL
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::RETURN => return,
                _ => {}
            }

            debug!("Synchronize discarding {:?}", self.peek().token_type);
            self.advance();
        }
    }
}
