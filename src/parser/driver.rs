//! Recursive-descent driver for the Patito grammar
//!
//! ```text
//! program    : PROGRAM ID ';' vars funcs MAIN '(' ')' body END
//! vars       : VAR (id_list ':' type ';')+ | empty
//! func       : (VOID | type) ID '(' params ')' '[' vars body ']' ';'
//! body       : '{' statement* '}'
//! statement  : assign | condition | cycle | f_call ';' | print | return
//! condition  : IF '(' expression ')' body (ELSE body)?
//! cycle      : WHILE '(' expression ')' DO body
//! print      : PRINT '(' (expression | CTE_STRING) (',' ...)* ')' ';'
//! expression : exp (('>' | '<' | '!=') exp)?
//! exp        : termino (('+' | '-') termino)*
//! termino    : factor (('*' | '/') factor)*
//! factor     : '(' expression ')' | ('+' | '-') factor | f_call | cte | ID
//! ```
//!
//! Precedence lives entirely in the grammar; the sink only ever sees
//! reductions in bottom-up order.

use super::reduction::{CallContext, Reduction, ReductionSink, UnaryOp};
use crate::compiler::types::{Operator, ReturnType, Type};
use crate::error::{Error, Result};
use crate::lexer::{Token, TokenKind};

/// Deepest nesting of blocks or factors accepted before reporting a syntax error
const MAX_NESTING: usize = 200;

/// Parser that turns a token stream into reduction events
pub struct Parser<'a, S: ReductionSink + ?Sized> {
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
    sink: &'a mut S,
}

impl<'a, S: ReductionSink + ?Sized> Parser<'a, S> {
    /// Creates a parser that feeds `sink`
    pub fn new(mut tokens: Vec<Token>, sink: &'a mut S) -> Self {
        if tokens.last().map(|t| &t.kind) != Some(&TokenKind::Eof) {
            let line = tokens.last().map(|t| t.line).unwrap_or(1);
            tokens.push(Token::new(TokenKind::Eof, String::new(), line, 1));
        }
        Parser {
            tokens,
            current: 0,
            depth: 0,
            sink,
        }
    }

    /// Parses a whole program
    pub fn parse(mut self) -> Result<()> {
        self.consume(&TokenKind::Program)?;
        let (name, line) = self.consume_identifier()?;
        self.consume(&TokenKind::Semicolon)?;
        self.reduce(Reduction::ProgramStart { name, line })?;

        self.vars()?;
        while matches!(
            self.peek().kind,
            TokenKind::Void | TokenKind::IntType | TokenKind::FloatType
        ) {
            self.function()?;
        }

        let main_line = self.consume(&TokenKind::Main)?.line;
        self.consume(&TokenKind::LeftParen)?;
        self.consume(&TokenKind::RightParen)?;
        self.reduce(Reduction::MainStart { line: main_line })?;
        self.body()?;

        let end_line = self.consume(&TokenKind::End)?.line;
        self.reduce(Reduction::ProgramEnd { line: end_line })?;

        if self.peek().kind != TokenKind::Eof {
            return Err(self.error());
        }
        Ok(())
    }

    fn vars(&mut self) -> Result<()> {
        if !self.match_kind(&TokenKind::Var) {
            return Ok(());
        }

        loop {
            let (first, line) = self.consume_identifier()?;
            let mut names = vec![first];
            while self.match_kind(&TokenKind::Comma) {
                names.push(self.consume_identifier()?.0);
            }
            self.consume(&TokenKind::Colon)?;
            let ty = self.value_type()?;
            self.consume(&TokenKind::Semicolon)?;
            self.reduce(Reduction::VarDecl { names, ty, line })?;

            if !matches!(self.peek().kind, TokenKind::Identifier(_)) {
                return Ok(());
            }
        }
    }

    fn function(&mut self) -> Result<()> {
        let return_type = if self.match_kind(&TokenKind::Void) {
            ReturnType::Void
        } else {
            ReturnType::from(self.value_type()?)
        };
        let (name, line) = self.consume_identifier()?;
        self.consume(&TokenKind::LeftParen)?;
        self.reduce(Reduction::FunctionHeader {
            name,
            return_type,
            line,
        })?;

        if self.peek().kind != TokenKind::RightParen {
            loop {
                let (name, line) = self.consume_identifier()?;
                self.consume(&TokenKind::Colon)?;
                let ty = self.value_type()?;
                self.reduce(Reduction::Param { name, ty, line })?;
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(&TokenKind::RightParen)?;

        self.consume(&TokenKind::LeftBracket)?;
        self.vars()?;
        let body_line = self.peek().line;
        self.reduce(Reduction::FunctionBodyStart { line: body_line })?;
        self.body()?;
        let end_line = self.consume(&TokenKind::RightBracket)?.line;
        self.consume(&TokenKind::Semicolon)?;
        self.reduce(Reduction::FunctionEnd { line: end_line })
    }

    fn body(&mut self) -> Result<()> {
        self.enter_nested()?;
        let result = self.block();
        self.depth -= 1;
        result
    }

    fn block(&mut self) -> Result<()> {
        self.consume(&TokenKind::LeftBrace)?;
        while self.peek().kind != TokenKind::RightBrace {
            self.statement()?;
        }
        self.consume(&TokenKind::RightBrace)?;
        Ok(())
    }

    fn statement(&mut self) -> Result<()> {
        let line = self.peek().line;
        let kind = self.peek().kind.clone();
        match kind {
            TokenKind::Identifier(_) if self.peek_next().kind == TokenKind::LeftParen => {
                self.call(CallContext::Statement)?;
                self.consume(&TokenKind::Semicolon)?;
                Ok(())
            }
            TokenKind::Identifier(_) => {
                let (name, line) = self.consume_identifier()?;
                self.consume(&TokenKind::Assign)?;
                self.expression()?;
                self.consume(&TokenKind::Semicolon)?;
                self.reduce(Reduction::Assign { name, line })
            }
            TokenKind::If => {
                self.advance();
                self.consume(&TokenKind::LeftParen)?;
                self.expression()?;
                self.consume(&TokenKind::RightParen)?;
                self.reduce(Reduction::IfCondition { line })?;
                self.body()?;
                if self.peek().kind == TokenKind::Else {
                    let else_line = self.advance().line;
                    self.reduce(Reduction::Else { line: else_line })?;
                    self.body()?;
                }
                self.reduce(Reduction::IfEnd { line })
            }
            TokenKind::While => {
                self.advance();
                self.reduce(Reduction::WhileStart { line })?;
                self.consume(&TokenKind::LeftParen)?;
                self.expression()?;
                self.consume(&TokenKind::RightParen)?;
                self.reduce(Reduction::WhileCondition { line })?;
                self.consume(&TokenKind::Do)?;
                self.body()?;
                self.reduce(Reduction::WhileEnd { line })
            }
            TokenKind::Print => {
                self.advance();
                self.consume(&TokenKind::LeftParen)?;
                loop {
                    self.print_item()?;
                    if !self.match_kind(&TokenKind::Comma) {
                        break;
                    }
                }
                self.consume(&TokenKind::RightParen)?;
                self.consume(&TokenKind::Semicolon)?;
                Ok(())
            }
            TokenKind::Return => {
                self.advance();
                self.expression()?;
                self.consume(&TokenKind::Semicolon)?;
                self.reduce(Reduction::Return { line })
            }
            _ => Err(self.error()),
        }
    }

    fn print_item(&mut self) -> Result<()> {
        if let TokenKind::String(value) = &self.peek().kind {
            let value = value.clone();
            let line = self.advance().line;
            return self.reduce(Reduction::PrintString { value, line });
        }
        let line = self.peek().line;
        self.expression()?;
        self.reduce(Reduction::PrintExpression { line })
    }

    fn expression(&mut self) -> Result<()> {
        self.exp()?;
        let op = match self.peek().kind {
            TokenKind::Greater => Operator::Gt,
            TokenKind::Less => Operator::Lt,
            TokenKind::NotEqual => Operator::NotEq,
            _ => return Ok(()),
        };
        let line = self.advance().line;
        self.exp()?;
        self.reduce(Reduction::Binary { op, line })
    }

    fn exp(&mut self) -> Result<()> {
        self.termino()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => Operator::Add,
                TokenKind::Minus => Operator::Sub,
                _ => return Ok(()),
            };
            let line = self.advance().line;
            self.termino()?;
            self.reduce(Reduction::Binary { op, line })?;
        }
    }

    fn termino(&mut self) -> Result<()> {
        self.factor()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => Operator::Mul,
                TokenKind::Slash => Operator::Div,
                _ => return Ok(()),
            };
            let line = self.advance().line;
            self.factor()?;
            self.reduce(Reduction::Binary { op, line })?;
        }
    }

    fn factor(&mut self) -> Result<()> {
        self.enter_nested()?;
        let result = self.primary();
        self.depth -= 1;
        result
    }

    fn primary(&mut self) -> Result<()> {
        let token = self.peek().clone();
        let line = token.line;
        match token.kind {
            TokenKind::LeftParen => {
                self.advance();
                self.expression()?;
                self.consume(&TokenKind::RightParen)?;
                self.reduce(Reduction::Parenthesized { line })
            }
            TokenKind::Plus | TokenKind::Minus => {
                self.advance();
                self.factor()?;
                let op = if token.kind == TokenKind::Minus {
                    UnaryOp::Minus
                } else {
                    UnaryOp::Plus
                };
                self.reduce(Reduction::Unary { op, line })
            }
            TokenKind::Integer(value) => {
                self.advance();
                self.reduce(Reduction::IntLiteral { value, line })
            }
            TokenKind::Float(value) => {
                self.advance();
                self.reduce(Reduction::FloatLiteral { value, line })
            }
            TokenKind::Identifier(_) if self.peek_next().kind == TokenKind::LeftParen => {
                self.call(CallContext::Expression)
            }
            TokenKind::Identifier(name) => {
                self.advance();
                self.reduce(Reduction::Identifier { name, line })
            }
            _ => Err(self.error()),
        }
    }

    fn call(&mut self, context: CallContext) -> Result<()> {
        let (name, line) = self.consume_identifier()?;
        self.consume(&TokenKind::LeftParen)?;

        let mut argc = 0;
        if self.peek().kind != TokenKind::RightParen {
            loop {
                self.expression()?;
                argc += 1;
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(&TokenKind::RightParen)?;

        self.reduce(Reduction::Call {
            name,
            argc,
            context,
            line,
        })
    }

    fn value_type(&mut self) -> Result<Type> {
        match self.peek().kind {
            TokenKind::IntType => {
                self.advance();
                Ok(Type::Int)
            }
            TokenKind::FloatType => {
                self.advance();
                Ok(Type::Float)
            }
            _ => Err(self.error()),
        }
    }

    fn enter_nested(&mut self) -> Result<()> {
        if self.depth >= MAX_NESTING {
            return Err(self.error());
        }
        self.depth += 1;
        Ok(())
    }

    fn reduce(&mut self, reduction: Reduction) -> Result<()> {
        self.sink.reduce(reduction)
    }

    fn error(&mut self) -> Error {
        let token = self.peek().clone();
        self.sink.syntax_error(&token.describe(), token.line)
    }

    fn consume(&mut self, kind: &TokenKind) -> Result<Token> {
        if &self.peek().kind == kind {
            Ok(self.advance())
        } else {
            Err(self.error())
        }
    }

    fn consume_identifier(&mut self) -> Result<(String, usize)> {
        match &self.peek().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let line = self.advance().line;
                Ok((name, line))
            }
            _ => Err(self.error()),
        }
    }

    fn match_kind(&mut self, kind: &TokenKind) -> bool {
        if &self.peek().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn peek(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.current.min(last)]
    }

    fn peek_next(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.current + 1).min(last)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.current < self.tokens.len() - 1 {
            self.current += 1;
        }
        token
    }
}
