#![allow(missing_docs)]
//! # Patito - A Small Procedural Language
//!
//! A compiler and virtual machine for Patito, a teaching language with `int`
//! and `float` variables, functions (recursion included), `if`/`else`,
//! `while` loops and `print`.
//!
//! Source text is translated into **quadruples** over a segmented virtual
//! address space, then executed by a stack-of-frames virtual machine.
//!
//! ## Quick Start
//!
//! ```rust
//! use patito::{run, Value};
//!
//! # fn main() -> patito::Result<()> {
//! let output = run(r#"
//!     program demo;
//!     var a, b : int;
//!     main() {
//!         a = 10;
//!         b = 20;
//!         print(a + b);
//!     }
//!     end
//! "#)?;
//!
//! assert_eq!(output, vec![Value::Int(30)]);
//! # Ok(())
//! # }
//! ```
//!
//! ### Compile and Execute Separately
//!
//! ```rust
//! use patito::{CompileOptions, Compiler, Value, VirtualMachine};
//!
//! # fn main() -> patito::Result<()> {
//! let source = r#"
//!     program fact;
//!     int factorial(n : int) [
//!         {
//!             if (n < 2) { return 1; }
//!             return n * factorial(n - 1);
//!         }
//!     ];
//!     main() { print("5! =", factorial(5)); }
//!     end
//! "#;
//!
//! let program = Compiler::new(CompileOptions::default()).compile(source)?;
//! let output = VirtualMachine::new(&program).execute()?;
//!
//! assert_eq!(output, vec![Value::Str("5! =".into()), Value::Int(120)]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Source → Scanner → Tokens → Parser ─(reductions)→ Translator → Quadruples → VirtualMachine
//! ```
//!
//! ### Main Components
//!
//! - [`Scanner`] - Tokenizes source code
//! - [`Parser`] - Recursive-descent driver emitting [`Reduction`] events
//! - [`Translator`] - Consumes reductions and emits quadruples
//! - [`SemanticAnalyzer`] - Scopes, symbol tables, type checks, memory
//! - [`VirtualMachine`] - Executes quadruples with activation records
//!
//! ## Error Handling
//!
//! Every failure is an [`Error`]. Compilation stops at the first error;
//! runtime faults carry the index of the failing quadruple.
//!
//! ```rust
//! use patito::{run, Error};
//!
//! let err = run("program p; var x : int; main() { x = 3.14; } end").unwrap_err();
//! assert!(matches!(err, Error::TypeError { line: 1, .. }));
//! ```

// Module declarations
/// Version of the Patito compiler
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod compiler;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod runtime;

// Re-export main types
pub use compiler::ir::{Address, CompiledProgram, OpCode, Operand, Quadruple, Segment, SlotKind};
pub use compiler::{compile, CompileOptions, Compiler, SemanticAnalyzer, Translator};
pub use error::{Error, Fault, Result};
pub use lexer::{Scanner, Token, TokenKind};
pub use parser::{Parser, Reduction, ReductionSink};
pub use runtime::{ExecutionStats, Value, VirtualMachine, VmOptions};

/// Compile and execute `source` with default options, returning the printed values
pub fn run(source: &str) -> Result<Vec<Value>> {
    let program = compile(source)?;
    VirtualMachine::new(&program).execute()
}
