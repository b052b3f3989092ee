//! # Patito Compiler - Source to Quadruples
//!
//! This module translates Patito programs into a linear quadruple IR over a
//! segmented virtual address space.
//!
//! ## Architecture
//!
//! ```text
//! Source → Tokens → Reductions → Translator → Quadruples + Constant Table
//!                                   │
//!                     SemanticAnalyzer (symbols, functions, memory, cube)
//! ```
//!
//! The translator only consumes [`Reduction`](crate::parser::Reduction)
//! events, so any parser able to produce them can drive it; the bundled
//! [`Parser`] is one such driver.
//!
//! ## Usage
//!
//! ```
//! use patito::compiler::{CompileOptions, Compiler};
//!
//! let source = "program demo; var x : int; main() { x = 10 + 20; print(x); } end";
//! let compiler = Compiler::new(CompileOptions::default());
//! let program = compiler.compile(source)?;
//! assert_eq!(program.name, "demo");
//! # Ok::<(), patito::Error>(())
//! ```

pub mod analyzer;
pub mod function_directory;
pub mod ir;
pub mod memory;
pub mod semantic_cube;
pub mod symbols;
pub mod translator;
pub mod types;

pub use analyzer::{AnalysisResult, Scope, SemanticAnalyzer};
pub use function_directory::{FunctionDirectory, FunctionSignature, Parameter};
pub use ir::{CompiledProgram, QuadrupleGenerator};
pub use memory::{ConstantTable, FrameSize, MemoryManager};
pub use semantic_cube::SemanticCube;
pub use symbols::{StorageClass, Symbol, SymbolTable};
pub use translator::Translator;
pub use types::{Operator, ReturnType, Type};

use crate::lexer::Scanner;
use crate::parser::Parser;
use crate::Result;

/// Compilation options
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Identifier reserved for the entry body; no function may use it
    ///
    /// This only reserves the name. The entry body itself is always written
    /// with the `main` keyword, so with the default of `"main"` the
    /// reservation is already implied by the grammar.
    pub entry_point: String,
    /// Log every quadruple of the finished program at `debug` level
    pub trace_quadruples: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            entry_point: "main".to_string(),
            trace_quadruples: false,
        }
    }
}

/// Patito to quadruple compiler
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    /// Create a new compiler with options
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// Options in effect
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile Patito source text
    pub fn compile(&self, source: &str) -> Result<CompiledProgram> {
        // Phase 1: Scan
        let tokens = Scanner::new(source).scan_tokens()?;

        // Phase 2: Parse and translate
        let mut translator = Translator::new(self.options.entry_point.clone());
        Parser::new(tokens, &mut translator).parse()?;
        let program = translator.finish()?;

        tracing::debug!(
            "compiled '{}': {} quadruples, {} constants, {} functions",
            program.name,
            program.quadruples.len(),
            program.constants.len(),
            program.functions.len()
        );

        if self.options.trace_quadruples {
            for (index, quad) in program.quadruples.iter().enumerate() {
                tracing::debug!("{:>4}: {}", index, quad);
            }
        }

        Ok(program)
    }
}

/// Compile with default options
pub fn compile(source: &str) -> Result<CompiledProgram> {
    Compiler::new(CompileOptions::default()).compile(source)
}
