//! Reduction events: the interface between a parser and the compiler core
//!
//! A driver delivers one [`Reduction`] per grammar reduction, bottom-up and
//! left to right. Expression operands are never carried in the event: they
//! were pushed by earlier `Identifier`/literal/`Binary` reductions, so a
//! `Binary` event only says which operator combines the top two operands.

use crate::compiler::types::{Operator, ReturnType, Type};
use crate::error::{Error, Result};

/// Unary operator applied to the operand on top of the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `+x`, a no-op
    Plus,
    /// `-x`
    Minus,
}

/// How a call's value is used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallContext {
    /// Call statement: a return value is discarded
    Statement,
    /// Call inside an expression: the value is pushed as an operand
    Expression,
}

/// A grammar reduction with its synthesized attributes
#[derive(Debug, Clone, PartialEq)]
pub enum Reduction {
    // Program structure
    /// `program <name> ;`
    ProgramStart { name: String, line: usize },
    /// `<names> : <type> ;` inside a `var` section
    VarDecl {
        names: Vec<String>,
        ty: Type,
        line: usize,
    },
    /// `<return type> <name> (`
    FunctionHeader {
        name: String,
        return_type: ReturnType,
        line: usize,
    },
    /// One formal parameter `<name> : <type>`
    Param { name: String, ty: Type, line: usize },
    /// First statement of a function body is next
    FunctionBodyStart { line: usize },
    /// Function declaration closed
    FunctionEnd { line: usize },
    /// `main` body begins
    MainStart { line: usize },
    /// `end`
    ProgramEnd { line: usize },

    // Expressions
    /// Variable reference
    Identifier { name: String, line: usize },
    /// Integer literal
    IntLiteral { value: i64, line: usize },
    /// Float literal
    FloatLiteral { value: f64, line: usize },
    /// Unary sign applied to the top operand
    Unary { op: UnaryOp, line: usize },
    /// Binary operator applied to the top two operands
    Binary { op: Operator, line: usize },
    /// `( expr )`
    Parenthesized { line: usize },
    /// Call whose `argc` arguments are on top of the stack, leftmost deepest
    Call {
        name: String,
        argc: usize,
        context: CallContext,
        line: usize,
    },

    // Statements
    /// `<name> = expr ;`
    Assign { name: String, line: usize },
    /// One expression item of a `print`
    PrintExpression { line: usize },
    /// One string item of a `print`
    PrintString { value: String, line: usize },
    /// Condition of an `if` reduced
    IfCondition { line: usize },
    /// `else` reached
    Else { line: usize },
    /// `if` statement closed
    IfEnd { line: usize },
    /// `while` keyword, before the condition
    WhileStart { line: usize },
    /// Condition of a `while` reduced
    WhileCondition { line: usize },
    /// `while` body closed
    WhileEnd { line: usize },
    /// `return expr ;`
    Return { line: usize },
}

impl Reduction {
    /// Source line of the reduction
    pub fn line(&self) -> usize {
        match self {
            Reduction::ProgramStart { line, .. }
            | Reduction::VarDecl { line, .. }
            | Reduction::FunctionHeader { line, .. }
            | Reduction::Param { line, .. }
            | Reduction::FunctionBodyStart { line }
            | Reduction::FunctionEnd { line }
            | Reduction::MainStart { line }
            | Reduction::ProgramEnd { line }
            | Reduction::Identifier { line, .. }
            | Reduction::IntLiteral { line, .. }
            | Reduction::FloatLiteral { line, .. }
            | Reduction::Unary { line, .. }
            | Reduction::Binary { line, .. }
            | Reduction::Parenthesized { line }
            | Reduction::Call { line, .. }
            | Reduction::Assign { line, .. }
            | Reduction::PrintExpression { line }
            | Reduction::PrintString { line, .. }
            | Reduction::IfCondition { line }
            | Reduction::Else { line }
            | Reduction::IfEnd { line }
            | Reduction::WhileStart { line }
            | Reduction::WhileCondition { line }
            | Reduction::WhileEnd { line }
            | Reduction::Return { line } => *line,
        }
    }
}

/// Consumer of reduction events
pub trait ReductionSink {
    /// Handle one reduction; the first error aborts the parse
    fn reduce(&mut self, reduction: Reduction) -> Result<()>;

    /// Called when the token stream does not match the grammar
    ///
    /// Returns the error the driver aborts with.
    fn syntax_error(&mut self, token: &str, line: usize) -> Error {
        Error::SyntaxError {
            line,
            token: token.to_string(),
        }
    }
}

/// Records every reduction; useful to inspect what a driver emits
#[derive(Debug, Default)]
pub struct ReductionLog {
    /// Reductions in arrival order
    pub events: Vec<Reduction>,
}

impl ReductionSink for ReductionLog {
    fn reduce(&mut self, reduction: Reduction) -> Result<()> {
        self.events.push(reduction);
        Ok(())
    }
}
