//! Quadruple (four-address code) definitions

use super::address::Address;
use crate::compiler::types::Operator;
use serde::ser::{Serialize, SerializeTuple, Serializer};
use std::fmt;

/// Quadruple operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    // Arithmetic (result = arg1 op arg2)
    /// Addition
    Add,
    /// Subtraction
    Sub,
    /// Multiplication
    Mul,
    /// Division
    Div,

    // Relational (result is 1 or 0)
    /// Greater than
    Gt,
    /// Less than
    Lt,
    /// Not equal
    NotEq,

    /// Copy: result = arg1
    Assign,
    /// Negation: result = -arg1
    Neg,
    /// Emit arg1 to the output
    Print,

    // Control flow
    /// Unconditional jump to result
    Goto,
    /// Jump to result when arg1 is zero
    GotoF,

    // Calling convention
    /// Reserve an activation record for the function named by arg1
    Era,
    /// Copy arg1 into the pending record at the parameter address in result
    Param,
    /// Commit the call to the function in arg1 and jump to the entry index in result
    Gosub,
    /// Return to the caller
    EndFunc,
}

impl OpCode {
    /// Textual mnemonic used in serialized output
    pub fn mnemonic(&self) -> &'static str {
        match self {
            OpCode::Add => "+",
            OpCode::Sub => "-",
            OpCode::Mul => "*",
            OpCode::Div => "/",
            OpCode::Gt => ">",
            OpCode::Lt => "<",
            OpCode::NotEq => "!=",
            OpCode::Assign => "=",
            OpCode::Neg => "unary-",
            OpCode::Print => "PRINT",
            OpCode::Goto => "GOTO",
            OpCode::GotoF => "GOTOF",
            OpCode::Era => "ERA",
            OpCode::Param => "PARAM",
            OpCode::Gosub => "GOSUB",
            OpCode::EndFunc => "ENDFUNC",
        }
    }

    /// Binary operator for an arithmetic or relational opcode
    pub fn binary_operator(&self) -> Option<Operator> {
        match self {
            OpCode::Add => Some(Operator::Add),
            OpCode::Sub => Some(Operator::Sub),
            OpCode::Mul => Some(Operator::Mul),
            OpCode::Div => Some(Operator::Div),
            OpCode::Gt => Some(Operator::Gt),
            OpCode::Lt => Some(Operator::Lt),
            OpCode::NotEq => Some(Operator::NotEq),
            _ => None,
        }
    }

    /// True for `GOTO` and `GOTOF`
    pub fn is_jump(&self) -> bool {
        matches!(self, OpCode::Goto | OpCode::GotoF)
    }
}

impl From<Operator> for OpCode {
    fn from(op: Operator) -> Self {
        match op {
            Operator::Add => OpCode::Add,
            Operator::Sub => OpCode::Sub,
            Operator::Mul => OpCode::Mul,
            Operator::Div => OpCode::Div,
            Operator::Gt => OpCode::Gt,
            Operator::Lt => OpCode::Lt,
            Operator::NotEq => OpCode::NotEq,
            Operator::Assign => OpCode::Assign,
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl Serialize for OpCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.mnemonic())
    }
}

/// One operand slot of a quadruple
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Memory slot
    Address(Address),
    /// Quadruple index used as a control-transfer target
    Jump(usize),
    /// Function name (`ERA`)
    Function(String),
    /// Jump target not known yet; patched exactly once
    Pending,
}

impl Operand {
    /// The address, if this operand is one
    pub fn address(&self) -> Option<Address> {
        match self {
            Operand::Address(address) => Some(*address),
            _ => None,
        }
    }

    /// The jump target, if this operand is one
    pub fn jump(&self) -> Option<usize> {
        match self {
            Operand::Jump(target) => Some(*target),
            _ => None,
        }
    }
}

impl From<Address> for Operand {
    fn from(address: Address) -> Self {
        Operand::Address(address)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Address(address) => write!(f, "{}", address),
            Operand::Jump(target) => write!(f, "{}", target),
            Operand::Function(name) => f.write_str(name),
            Operand::Pending => f.write_str("?"),
        }
    }
}

impl Serialize for Operand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Operand::Address(address) => serializer.serialize_u32(address.to_raw()),
            Operand::Jump(target) => serializer.serialize_u64(*target as u64),
            Operand::Function(name) => serializer.serialize_str(name),
            Operand::Pending => serializer.serialize_none(),
        }
    }
}

/// Owned tuple form of a quadruple
pub type QuadTuple = (OpCode, Option<Operand>, Option<Operand>, Option<Operand>);

/// A single IR instruction: `(operator, operand1, operand2, result)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quadruple {
    /// Operator
    pub op: OpCode,
    /// First source operand
    pub arg1: Option<Operand>,
    /// Second source operand
    pub arg2: Option<Operand>,
    /// Destination address or jump target
    pub result: Option<Operand>,
}

impl Quadruple {
    /// Creates a quadruple
    pub fn new(
        op: OpCode,
        arg1: Option<Operand>,
        arg2: Option<Operand>,
        result: Option<Operand>,
    ) -> Self {
        Quadruple {
            op,
            arg1,
            arg2,
            result,
        }
    }

    /// Owned 4-tuple view of the quadruple
    pub fn to_tuple(&self) -> QuadTuple {
        (
            self.op,
            self.arg1.clone(),
            self.arg2.clone(),
            self.result.clone(),
        )
    }

    /// True when some operand still waits for a jump target
    pub fn is_pending(&self) -> bool {
        [&self.arg1, &self.arg2, &self.result]
            .iter()
            .any(|operand| matches!(operand, Some(Operand::Pending)))
    }
}

impl Serialize for Quadruple {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(4)?;
        tuple.serialize_element(&self.op)?;
        tuple.serialize_element(&self.arg1)?;
        tuple.serialize_element(&self.arg2)?;
        tuple.serialize_element(&self.result)?;
        tuple.end()
    }
}

impl fmt::Display for Quadruple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn slot(operand: &Option<Operand>) -> String {
            operand
                .as_ref()
                .map(Operand::to_string)
                .unwrap_or_else(|| "_".to_string())
        }

        write!(
            f,
            "({}, {}, {}, {})",
            self.op,
            slot(&self.arg1),
            slot(&self.arg2),
            slot(&self.result)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ir::address::{Segment, SlotKind};

    fn addr(segment: Segment, kind: SlotKind, offset: u32) -> Operand {
        Operand::Address(Address::new(segment, kind, offset).unwrap())
    }

    #[test]
    fn test_serializes_as_four_tuple() {
        let quad = Quadruple::new(
            OpCode::Add,
            Some(addr(Segment::Global, SlotKind::Int, 0)),
            Some(addr(Segment::Constant, SlotKind::Int, 1)),
            Some(addr(Segment::Temporary, SlotKind::Int, 0)),
        );
        assert_eq!(
            serde_json::to_string(&quad).unwrap(),
            r#"["+",1000,7001,5000]"#
        );

        let era = Quadruple::new(
            OpCode::Era,
            Some(Operand::Function("fact".to_string())),
            None,
            None,
        );
        assert_eq!(
            serde_json::to_string(&era).unwrap(),
            r#"["ERA","fact",null,null]"#
        );
    }

    #[test]
    fn test_display_marks_pending_and_empty() {
        let quad = Quadruple::new(OpCode::Goto, None, None, Some(Operand::Pending));
        assert!(quad.is_pending());
        assert_eq!(quad.to_string(), "(GOTO, _, _, ?)");
    }
}
