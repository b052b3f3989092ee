use serde::{Deserialize, Serialize};
use std::fmt;

use crate::compiler::ir::SlotKind;

/// Runtime value representation
///
/// Also used for the compile-time constant pool, so that the VM can preload
/// constants without conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// 64-bit integer value
    Int(i64),
    /// 64-bit floating-point value
    Float(f64),
    /// String literal (print argument only)
    Str(String),
}

impl Value {
    /// Slot kind this value belongs in
    pub fn kind(&self) -> SlotKind {
        match self {
            Value::Int(_) => SlotKind::Int,
            Value::Float(_) => SlotKind::Float,
            Value::Str(_) => SlotKind::Str,
        }
    }

    /// Human-readable type name
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    /// Integer view, if this is an int
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Float view; ints are widened
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            Value::Str(_) => None,
        }
    }

    /// Truthiness used by `GOTOF`: nonzero numbers are true
    pub fn is_truthy(&self) -> Option<bool> {
        match self {
            Value::Int(n) => Some(*n != 0),
            Value::Float(f) => Some(*f != 0.0),
            Value::Str(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => {
                // Keep a decimal point so floats stay distinguishable from ints.
                if x.fract() == 0.0 && x.is_finite() {
                    write!(f, "{:.1}", x)
                } else {
                    write!(f, "{}", x)
                }
            }
            Value::Str(s) => f.write_str(s),
        }
    }
}
