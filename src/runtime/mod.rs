//! Runtime execution for compiled Patito programs

mod memory;
mod value;
mod vm;

pub use memory::{Frame, Memory};
pub use value::Value;
pub use vm::{ExecutionStats, VirtualMachine, VmOptions};
