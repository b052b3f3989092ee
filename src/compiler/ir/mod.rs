//! # Intermediate Representation (IR) for Patito Compilation
//!
//! Patito compiles to a linear sequence of quadruples
//! `(operator, operand1, operand2, result)` over a segmented virtual address
//! space, executed directly by [`crate::runtime::VirtualMachine`].
//!
//! ## Module Structure
//!
//! ```text
//! ir/
//! ├── mod.rs        # This file - module definition and re-exports
//! ├── address.rs    # Segment, SlotKind, Address (range encoding)
//! ├── quadruple.rs  # OpCode, Operand, Quadruple
//! ├── program.rs    # CompiledProgram (output artifact)
//! └── generator.rs  # QuadrupleGenerator (append + patch-once)
//! ```
//!
//! ## Opcodes
//!
//! | Category | Opcodes |
//! |----------|---------|
//! | Arithmetic | `+` `-` `*` `/` `unary-` |
//! | Relational | `>` `<` `!=` (result 1 or 0) |
//! | Data | `=` `PRINT` |
//! | Control | `GOTO` `GOTOF` |
//! | Calls | `ERA` `PARAM` `GOSUB` `ENDFUNC` |

pub mod address;
mod generator;
mod program;
mod quadruple;

pub use address::{Address, InvalidAddress, Segment, SlotKind, SEGMENT_SLOTS};
pub use generator::QuadrupleGenerator;
pub use program::CompiledProgram;
pub use quadruple::{OpCode, Operand, QuadTuple, Quadruple};
