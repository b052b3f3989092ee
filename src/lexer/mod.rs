//! Lexical analysis for Patito
//!
//! Converts source text into a stream of tokens. Part of the reference front
//! end; the compiler core never sees tokens.

mod scanner;
mod token;

pub use scanner::Scanner;
pub use token::{Token, TokenKind};
