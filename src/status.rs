//! The status codes published across the facade boundary, and the atomic cell
//! used to publish them with release/acquire semantics.
use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::{FacadeError, ProcessError, StackError};

/// The status codes exposed at the facade boundary. Exactly one is published
/// per `run_symbol` invocation — either synchronously, for configuration
/// errors that never reach the interpreter, or once the interpreter
/// terminates.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[repr(u8)]
pub enum StatusCode {
    /// Root `RETN` reached.
    Success = 0,
    /// A run has started and has not yet terminated.
    InProgress = 1,
    /// A system failure occurred, e.g. an allocation failure during stack growth.
    UnknownError = 2,
    /// The facade is not ready, or is being (re-)initialized.
    NotInitialized = 3,
    /// The requested source file does not exist.
    FileNotFound = 4,
    /// The injected compiler rejected the source text.
    CompilationError = 5,
    /// Bytecode and/or world have not been loaded.
    StateNotValid = 6,
    /// `run_symbol`'s argument did not resolve to an entry point.
    SymbolNotFound = 7,
    /// `STEP` attempted to move into a wall or off the grid.
    StepOutOfBounds = 8,
    /// `PICK_UP` was attempted on a cell already holding zero flags.
    PickupZeroFlags = 9,
    /// `PLACE` was attempted on a cell already holding `MAX_FLAGS` flags.
    PlaceMaxFlags = 10,
    /// The `STOP` opcode was executed.
    StopEncountered = 11,
}

impl StatusCode {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => StatusCode::Success,
            1 => StatusCode::InProgress,
            2 => StatusCode::UnknownError,
            3 => StatusCode::NotInitialized,
            4 => StatusCode::FileNotFound,
            5 => StatusCode::CompilationError,
            6 => StatusCode::StateNotValid,
            7 => StatusCode::SymbolNotFound,
            8 => StatusCode::StepOutOfBounds,
            9 => StatusCode::PickupZeroFlags,
            10 => StatusCode::PlaceMaxFlags,
            11 => StatusCode::StopEncountered,
            _ => unreachable!("StatusCell only ever stores values written by StatusCode::as_u8"),
        }
    }
}

impl From<&ProcessError> for StatusCode {
    fn from(err: &ProcessError) -> Self {
        match err {
            ProcessError::Stack(StackError::GrowthFailed) => StatusCode::UnknownError,
            ProcessError::Bytecode(_) => StatusCode::UnknownError,
            ProcessError::Facade(FacadeError::StateNotValid) => StatusCode::StateNotValid,
            ProcessError::Facade(FacadeError::SymbolNotFound(_)) => StatusCode::SymbolNotFound,
            ProcessError::Facade(FacadeError::CompilationError(_)) => {
                StatusCode::CompilationError
            }
            ProcessError::Facade(FacadeError::FileNotFound(_)) => StatusCode::FileNotFound,
            ProcessError::Facade(FacadeError::NotInitialized) => StatusCode::NotInitialized,
        }
    }
}

/// An atomic cell publishing [`StatusCode`] with release/acquire semantics: a
/// host thread that observes a terminal status through [`StatusCell::load`] is
/// guaranteed to see the world state as the interpreter left it, provided it
/// then acquires the facade lock before reading world state.
pub struct StatusCell {
    code: AtomicU8,
}

impl StatusCell {
    /// Will create a cell initialized to `initial`.
    pub fn new(initial: StatusCode) -> Self {
        Self {
            code: AtomicU8::new(initial as u8),
        }
    }

    /// Will publish `code`, making it visible to any thread that subsequently
    /// [`load`](StatusCell::load)s this cell.
    pub fn publish(&self, code: StatusCode) {
        self.code.store(code as u8, Ordering::Release);
    }

    /// Will read the most recently published status code.
    pub fn load(&self) -> StatusCode {
        StatusCode::from_u8(self.code.load(Ordering::Acquire))
    }
}
