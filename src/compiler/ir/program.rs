//! Compiled program artifact

use super::quadruple::{QuadTuple, Quadruple};
use crate::compiler::function_directory::FunctionDirectory;
use crate::compiler::memory::ConstantTable;
use crate::compiler::symbols::SymbolTable;
use crate::error::Result;
use serde::Serialize;

/// Output of a successful compilation
///
/// Holds everything the VM needs (quadruples and the constant pool) together
/// with the tables built during translation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledProgram {
    /// Name from the `program` header
    pub name: String,
    /// Linear IR, every jump patched
    pub quadruples: Vec<Quadruple>,
    /// Constant address to value bindings
    pub constants: ConstantTable,
    /// Global variables
    pub globals: SymbolTable,
    /// Declared functions
    pub functions: FunctionDirectory,
}

impl CompiledProgram {
    /// Quadruples as owned 4-tuples
    pub fn tuples(&self) -> Vec<QuadTuple> {
        self.quadruples.iter().map(Quadruple::to_tuple).collect()
    }

    /// Pretty JSON rendering of the whole artifact
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
