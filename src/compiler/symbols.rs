//! Per-scope symbol tables

use super::ir::Address;
use super::types::Type;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a variable lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageClass {
    /// Program-level `var`
    Global,
    /// Function-level `var`
    Local,
    /// Function parameter
    Parameter,
}

/// A declared variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// Identifier
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub ty: Type,
    /// Storage class
    pub storage: StorageClass,
    /// Declaration line
    pub line: usize,
    /// Assigned virtual address
    pub address: Address,
}

/// Identifier to symbol map for one scope, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Symbol>", into = "Vec<Symbol>")]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    index: HashMap<String, usize>,
}

impl SymbolTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a symbol; redeclaring a name in the same table is an error
    pub fn insert(&mut self, symbol: Symbol) -> Result<()> {
        if self.index.contains_key(&symbol.name) {
            return Err(Error::Redefinition {
                name: symbol.name,
                line: symbol.line,
            });
        }
        self.index.insert(symbol.name.clone(), self.symbols.len());
        self.symbols.push(symbol);
        Ok(())
    }

    /// Look up a name
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.index.get(name).map(|&i| &self.symbols[i])
    }

    /// True when `name` is declared here
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Symbols in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    /// Number of symbols
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// True when nothing is declared
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl From<Vec<Symbol>> for SymbolTable {
    fn from(symbols: Vec<Symbol>) -> Self {
        let index = symbols
            .iter()
            .enumerate()
            .map(|(i, symbol)| (symbol.name.clone(), i))
            .collect();
        SymbolTable { symbols, index }
    }
}

impl From<SymbolTable> for Vec<Symbol> {
    fn from(table: SymbolTable) -> Self {
        table.symbols
    }
}
