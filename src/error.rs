//! Error types for the Patito compiler and virtual machine

use thiserror::Error;

/// Patito compilation and execution errors
///
/// Every compile-time error is fatal: the first one raised aborts translation
/// and no partial quadruple sequence is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Front end errors
    /// Character the scanner does not recognize
    #[error("Lexical error at line {line}: illegal character '{ch}'")]
    LexerError {
        /// Offending character
        ch: char,
        /// Line number where it appeared
        line: usize,
    },

    /// Malformed token sequence
    ///
    /// **Triggered by:** a token the grammar does not allow at that point
    /// **Example:** `x = ;` (missing expression), or a program without `end`
    #[error("Syntax error at line {line}: unexpected {token}")]
    SyntaxError {
        /// Line number where the error was detected
        line: usize,
        /// Offending lexeme, or `end of input`
        token: String,
    },

    // Semantic errors
    /// Duplicate variable, parameter, or function name in the same scope
    ///
    /// **Example:** `var x : int; x : float;`
    #[error("Redefinition of '{name}' at line {line}")]
    Redefinition {
        /// Redeclared identifier
        name: String,
        /// Line of the second declaration
        line: usize,
    },

    /// Reference to an undeclared variable or function
    ///
    /// **Example:** `y = 1;` when `y` was never declared
    #[error("Undefined variable '{name}' at line {line}")]
    UndefinedVariable {
        /// Unknown identifier
        name: String,
        /// Line of the reference
        line: usize,
    },

    /// Invalid operand types, assignment, call, or return
    ///
    /// **Example:** `int x; x = 3.14;` (narrowing assignment)
    #[error("Type error at line {line}: {message}")]
    TypeError {
        /// Line where the check failed
        line: usize,
        /// Error description
        message: String,
    },

    /// A (segment, kind) address range ran out of slots
    #[error("Out of {kind} slots in the {segment} segment")]
    SegmentOverflow {
        /// Segment name
        segment: String,
        /// Value kind name
        kind: String,
    },

    /// Translator or generator bug (jump stack imbalance, unpatched target, ...)
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Output artifact could not be serialized
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Writing program output failed
    #[error("I/O error: {0}")]
    IoError(String),

    // Runtime errors
    /// Virtual machine aborted while executing a quadruple
    #[error("Runtime fault at quadruple {index}: {fault}")]
    RuntimeFault {
        /// Index of the failing quadruple
        index: usize,
        /// Underlying cause
        fault: Fault,
    },
}

/// Cause of a virtual machine abort
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Fault {
    /// Address outside every segment range
    #[error("segmentation fault: address {0} out of range")]
    SegmentationFault(u32),

    /// Attempt to write into the constant segment
    #[error("segmentation fault: cannot write to constant address {0}")]
    ConstantWrite(u32),

    /// Read of a slot that was never written
    #[error("read of uninitialized address {0}")]
    UninitializedRead(u32),

    /// Float value stored into an int-typed address
    #[error("cannot store a float into int address {0}")]
    NarrowingStore(u32),

    /// Arithmetic on a string constant
    #[error("string constant at address {0} used as a number")]
    NotANumber(u32),

    /// Integer result does not fit in 64 bits
    #[error("integer overflow")]
    IntegerOverflow,

    /// Integer or float division by zero
    #[error("division by zero")]
    DivisionByZero,

    /// `PARAM` or `GOSUB` with no pending activation record
    #[error("no activation record reserved (missing ERA)")]
    NoPendingFrame,

    /// `ENDFUNC` executed outside of any call
    #[error("return with an empty call stack")]
    EmptyCallStack,

    /// Call depth exceeded the configured ceiling
    #[error("stack overflow: call depth exceeded {0}")]
    StackOverflow(usize),

    /// Printed value count exceeded the configured ceiling
    #[error("output limit of {0} values exceeded")]
    OutputLimit(usize),

    /// Operand missing or of the wrong shape for its opcode
    #[error("malformed quadruple: {0}")]
    Malformed(String),
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::InternalError(msg.into())
    }

    /// Create a type error with a message
    pub fn type_error(line: usize, msg: impl Into<String>) -> Self {
        Error::TypeError {
            line,
            message: msg.into(),
        }
    }

    /// Source line the error refers to, when it has one
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::LexerError { line, .. }
            | Error::SyntaxError { line, .. }
            | Error::Redefinition { line, .. }
            | Error::UndefinedVariable { line, .. }
            | Error::TypeError { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// True for errors that signal a bug in the compiler itself
    pub fn is_internal(&self) -> bool {
        matches!(self, Error::InternalError(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err.to_string())
    }
}

/// Result type for Patito operations
pub type Result<T> = std::result::Result<T, Error>;
