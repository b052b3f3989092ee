//! Operator/type compatibility oracle

use super::types::{Operator, Type};

/// The semantic cube: `(left, operator, right) -> result`
///
/// A pure lookup. `None` means the combination is invalid and the caller
/// should raise a type error.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemanticCube;

impl SemanticCube {
    /// Creates the cube
    pub fn new() -> Self {
        SemanticCube
    }

    /// Result type of `left op right`, or `None` when undefined
    pub fn result_type(&self, left: Type, op: Operator, right: Type) -> Option<Type> {
        use Type::{Float, Int};

        match op {
            Operator::Add | Operator::Sub | Operator::Mul | Operator::Div => match (left, right) {
                (Int, Int) => Some(Int),
                _ => Some(Float),
            },
            Operator::Gt | Operator::Lt | Operator::NotEq => Some(Int),
            // `left` is the destination, `right` the assigned value.
            Operator::Assign => match (left, right) {
                (Int, Int) => Some(Int),
                (Float, Float) | (Float, Int) => Some(Float),
                (Int, Float) => None,
            },
        }
    }

    /// True when `left op right` has a rule
    pub fn is_valid(&self, left: Type, op: Operator, right: Type) -> bool {
        self.result_type(left, op, right).is_some()
    }
}
