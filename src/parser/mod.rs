//! Patito Parser Module
//!
//! Defines the reduction-event interface the compiler core consumes and a
//! recursive-descent driver that produces those events from tokens.

mod driver;
mod reduction;

pub use driver::Parser;
pub use reduction::{CallContext, Reduction, ReductionLog, ReductionSink, UnaryOp};
