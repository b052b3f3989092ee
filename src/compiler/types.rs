//! # Type System for Patito Compilation
//!
//! The language has exactly two value types. Relational operators yield `int`
//! (nonzero is true), and string literals exist only as `print` arguments, so
//! they never take part in typing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Patito value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Float,
}

impl Type {
    /// Keyword used for this type in source text
    pub fn keyword(&self) -> &'static str {
        match self {
            Type::Int => "int",
            Type::Float => "float",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Declared return type of a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnType {
    /// No value; the function may not `return`
    Void,
    /// Returns an `int`
    Int,
    /// Returns a `float` (an `int` expression is promoted)
    Float,
}

impl ReturnType {
    /// The value type carried by a non-void return, `None` for void
    pub fn value_type(&self) -> Option<Type> {
        match self {
            ReturnType::Void => None,
            ReturnType::Int => Some(Type::Int),
            ReturnType::Float => Some(Type::Float),
        }
    }
}

impl From<Type> for ReturnType {
    fn from(ty: Type) -> Self {
        match ty {
            Type::Int => ReturnType::Int,
            Type::Float => ReturnType::Float,
        }
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnType::Void => f.write_str("void"),
            ReturnType::Int => f.write_str("int"),
            ReturnType::Float => f.write_str("float"),
        }
    }
}

/// Operators known to the semantic cube
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `!=`
    NotEq,
    /// `=` (assignment compatibility pseudo-operator)
    Assign,
}

impl Operator {
    /// Arithmetic operators: result promotes to float
    pub const ARITHMETIC: [Operator; 4] =
        [Operator::Add, Operator::Sub, Operator::Mul, Operator::Div];

    /// Relational operators: result is always int
    pub const RELATIONAL: [Operator; 3] = [Operator::Gt, Operator::Lt, Operator::NotEq];

    /// Source symbol of the operator
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::NotEq => "!=",
            Operator::Assign => "=",
        }
    }

    /// True for `+ - * /`
    pub fn is_arithmetic(&self) -> bool {
        Self::ARITHMETIC.contains(self)
    }

    /// True for `> < !=`
    pub fn is_relational(&self) -> bool {
        Self::RELATIONAL.contains(self)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_type_value_type() {
        assert_eq!(ReturnType::Void.value_type(), None);
        assert_eq!(ReturnType::Float.value_type(), Some(Type::Float));
        assert_eq!(ReturnType::from(Type::Int), ReturnType::Int);
    }

    #[test]
    fn test_operator_classes_are_disjoint() {
        for op in Operator::ARITHMETIC {
            assert!(!op.is_relational());
        }
        assert!(!Operator::Assign.is_arithmetic());
        assert!(!Operator::Assign.is_relational());
    }
}
