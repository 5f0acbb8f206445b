//! The error hierarchy threaded through the interpreter and facade.
use thiserror::Error;

use crate::bytecode::Pc;

/// Errors raised by the call/repeat stack bookkeeping.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum StackError {
    #[error("stack growth past fast-depth failed to allocate")]
    GrowthFailed,
}

/// Errors raised while decoding or dispatching bytecode.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum BytecodeError {
    #[error("an unsupported opcode tag {0:#04X} was read at pc {1}")]
    InvalidOpcode(u8, Pc),
    #[error("pc {pc} is out of range for an image of length {len}")]
    PcOutOfRange { pc: Pc, len: usize },
}

/// Configuration and system errors surfaced at the facade boundary.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum FacadeError {
    #[error("bytecode and/or world have not been successfully loaded")]
    StateNotValid,
    #[error("no symbol named '{0}' was found in the symbol table")]
    SymbolNotFound(String),
    #[error("the compiler rejected the source: {0}")]
    CompilationError(String),
    #[error("source file not found: {0}")]
    FileNotFound(String),
    #[error("the facade has not been initialized")]
    NotInitialized,
}

/// The unified error type threaded through the interpreter and facade.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum ProcessError {
    #[error("{0}")]
    Stack(#[from] StackError),
    #[error("{0}")]
    Bytecode(#[from] BytecodeError),
    #[error("{0}")]
    Facade(#[from] FacadeError),
}
