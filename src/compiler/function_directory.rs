//! Function directory: name to signature

use super::ir::Address;
use super::memory::FrameSize;
use super::symbols::SymbolTable;
use super::types::{ReturnType, Type};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One formal parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub ty: Type,
    /// Local address the caller's `PARAM` writes to
    pub address: Address,
}

/// Everything the compiler and VM know about a function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSignature {
    /// Function name
    pub name: String,
    /// Declared return type
    pub return_type: ReturnType,
    /// Formal parameters, in declaration order
    pub params: Vec<Parameter>,
    /// Parameters and local variables
    pub locals: SymbolTable,
    /// Index of the first body quadruple, set once
    pub entry: Option<usize>,
    /// Global slot receiving the return value (non-void only)
    pub return_address: Option<Address>,
    /// Declaration line
    pub line: usize,
    /// Slots used per activation, recorded when the function is closed
    pub frame: FrameSize,
    /// Whether a `return` statement appeared in the body
    #[serde(skip)]
    pub has_return: bool,
}

impl FunctionSignature {
    /// Create a signature with no parameters
    pub fn new(name: impl Into<String>, return_type: ReturnType, line: usize) -> Self {
        FunctionSignature {
            name: name.into(),
            return_type,
            params: Vec::new(),
            locals: SymbolTable::new(),
            entry: None,
            return_address: None,
            line,
            frame: FrameSize::default(),
            has_return: false,
        }
    }

    /// Parameter types in order
    pub fn param_types(&self) -> Vec<Type> {
        self.params.iter().map(|p| p.ty).collect()
    }

    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Record the entry quadruple; it can only be set once
    pub fn set_entry(&mut self, index: usize) -> Result<()> {
        match self.entry {
            Some(existing) => Err(Error::internal(format!(
                "entry of '{}' already set to {}",
                self.name, existing
            ))),
            None => {
                self.entry = Some(index);
                Ok(())
            }
        }
    }
}

/// Name to signature map, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<FunctionSignature>", into = "Vec<FunctionSignature>")]
pub struct FunctionDirectory {
    functions: Vec<FunctionSignature>,
    index: HashMap<String, usize>,
}

impl FunctionDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function; duplicates are a redefinition
    pub fn insert(&mut self, signature: FunctionSignature) -> Result<()> {
        if self.index.contains_key(&signature.name) {
            return Err(Error::Redefinition {
                name: signature.name,
                line: signature.line,
            });
        }
        self.index
            .insert(signature.name.clone(), self.functions.len());
        self.functions.push(signature);
        Ok(())
    }

    /// Look up a function
    pub fn get(&self, name: &str) -> Option<&FunctionSignature> {
        self.index.get(name).map(|&i| &self.functions[i])
    }

    /// Mutable lookup
    pub fn get_mut(&mut self, name: &str) -> Option<&mut FunctionSignature> {
        match self.index.get(name) {
            Some(&i) => self.functions.get_mut(i),
            None => None,
        }
    }

    /// True when `name` is a declared function
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Functions in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &FunctionSignature> {
        self.functions.iter()
    }

    /// Number of functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// True when no function was declared
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl From<Vec<FunctionSignature>> for FunctionDirectory {
    fn from(functions: Vec<FunctionSignature>) -> Self {
        let index = functions
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        FunctionDirectory { functions, index }
    }
}

impl From<FunctionDirectory> for Vec<FunctionSignature> {
    fn from(directory: FunctionDirectory) -> Self {
        directory.functions
    }
}
