//! The VM facade: lifecycle, load/reset, invocation by symbol, world
//! import/export, and status reporting. This is the only public entry point
//! embedders are expected to drive directly (or through the optional `ffi`
//! surface built on top of it).
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::bytecode::Pc;
use crate::compiler::{Compiler, SourceLoader};
use crate::definitions::grid::{CELLS, SIDE, WALL, WALL_EXPORT};
use crate::error::{FacadeError, ProcessError};
use crate::grid::Grid;
use crate::interpreter::Interpreter;
use crate::robot::Robot;
use crate::status::{StatusCell, StatusCode};
use crate::symbols::SymbolTable;

/// The mutable state guarded by the facade's single exclusive lock: the
/// bytecode image, the symbol table, the grid, the robot, and the two
/// load-validity flags. Everything here is owned by the VM and mutated only
/// while the lock is held.
struct VmState {
    image: Vec<u8>,
    symbols: SymbolTable,
    grid: Grid,
    robot: Robot,
    bytecode_valid: bool,
    world_valid: bool,
}

impl VmState {
    fn fresh() -> Self {
        Self {
            image: Vec::new(),
            symbols: SymbolTable::new(),
            grid: Grid::new(),
            robot: Robot::new(0, 0, 0, 0, 0),
            bytecode_valid: false,
            world_valid: false,
        }
    }
}

/// The VM instance. Exactly one run, load, or world-import at a time is in
/// flight, serialized by `state`'s lock (see the concurrency model). The
/// status cell and the short-circuit flag are the only fields a host may
/// touch from another thread without holding that lock.
pub struct Vm {
    state: Mutex<VmState>,
    status: StatusCell,
    interrupted: AtomicBool,
}

impl Vm {
    /// Will initialize a fresh, unloaded VM.
    pub fn init() -> Self {
        log::debug!("vm initialized");
        Self {
            state: Mutex::new(VmState::fresh()),
            status: StatusCell::new(StatusCode::NotInitialized),
            interrupted: AtomicBool::new(false),
        }
    }

    /// Will drop any loaded bytecode/world and return the VM to its
    /// just-initialized state.
    pub fn destroy(&self) {
        let mut state = self.state.lock();
        *state = VmState::fresh();
        self.status.publish(StatusCode::NotInitialized);
        log::debug!("vm destroyed");
    }

    /// Will compile `source` via the injected `compiler` and, on success,
    /// replace the bytecode image and symbol table.
    pub fn load_bytecode(&self, compiler: &dyn Compiler, source: &[u8]) -> StatusCode {
        let mut state = self.state.lock();
        match compiler.compile(source) {
            Ok((image, symbols)) => {
                log::debug!("bytecode loaded ({} bytes, {} symbols)", image.len(), symbols.len());
                state.image = image;
                state.symbols = symbols;
                state.bytecode_valid = true;
                self.publish_and_return(StatusCode::Success)
            }
            Err(message) => {
                log::warn!("compilation rejected: {}", message);
                state.bytecode_valid = false;
                self.publish_err(FacadeError::CompilationError(message))
            }
        }
    }

    /// Will read `path` via the injected `loader`, then hand the buffer to
    /// [`Vm::load_bytecode`].
    pub fn load_bytecode_file(
        &self,
        compiler: &dyn Compiler,
        loader: &dyn SourceLoader,
        path: &str,
    ) -> StatusCode {
        match loader.read(path) {
            Ok(source) => self.load_bytecode(compiler, &source),
            Err(io_err) => {
                log::warn!("source file not found: {} ({})", path, io_err);
                let mut state = self.state.lock();
                state.bytecode_valid = false;
                self.publish_err(FacadeError::FileNotFound(path.to_string()))
            }
        }
    }

    /// Will overwrite the grid and robot from a row-major `cells` array
    /// (length `N*N`, `255` denoting a wall) and a `(px, py, d, hx, hy)`
    /// robot record.
    pub fn load_world(&self, cells: &[u8], robot_record: [u32; 5]) -> StatusCode {
        if cells.len() != CELLS {
            log::warn!("world import rejected: expected {} cells, got {}", CELLS, cells.len());
            let mut state = self.state.lock();
            state.world_valid = false;
            return self.publish_err(FacadeError::StateNotValid);
        }

        let mut state = self.state.lock();
        for y in 0..SIDE {
            for x in 0..SIDE {
                let raw = cells[x + y * SIDE];
                let nibble = if raw == WALL_EXPORT { WALL } else { raw };
                state.grid.set(x, y, nibble);
            }
        }
        let [px, py, d, hx, hy] = robot_record;
        state.robot = Robot::new(px as usize, py as usize, d as u8, hx as usize, hy as usize);
        state.world_valid = true;
        log::debug!("world imported, robot at ({}, {})", px, py);
        self.publish_and_return(StatusCode::Success)
    }

    /// Will resolve `name` to a bytecode entry point and drive the
    /// interpreter until termination, publishing and returning the resulting
    /// status.
    pub fn run_symbol(&self, name: &[u8]) -> StatusCode {
        let mut state = self.state.lock();
        if !state.bytecode_valid || !state.world_valid {
            log::warn!("run_symbol rejected: bytecode/world not loaded");
            return self.publish_err(FacadeError::StateNotValid);
        }
        let entry_pc = match state.symbols.lookup(name) {
            Some(pc) => pc,
            None => {
                log::warn!("run_symbol: symbol {:?} not found", String::from_utf8_lossy(name));
                return self.publish_err(FacadeError::SymbolNotFound(
                    String::from_utf8_lossy(name).into_owned(),
                ));
            }
        };

        // Deliberately not cleared here: a host may call `short_circuit()` at
        // any time, including before this run_symbol even starts, and that
        // armed flag must still be observed on the interpreter's first fetch
        // (see §5). It is only ever this run's business, so it is consumed
        // once this run has actually terminated, not proactively up front.
        self.status.publish(StatusCode::InProgress);
        log::debug!("run_symbol: entering at pc={}", entry_pc);

        let VmState {
            image, grid, robot, ..
        } = &mut *state;
        let mut interp = Interpreter::new(image, grid, robot, &self.interrupted);
        let outcome = interp.run(entry_pc);
        self.interrupted.store(false, Ordering::Release);
        self.publish_outcome(outcome)
    }

    /// Will signal the running interpreter to unwind at its next instruction
    /// fetch. Safe to call from any thread, at any time, without the facade
    /// lock.
    pub fn short_circuit(&self) {
        self.interrupted.store(true, Ordering::Release);
    }

    /// Will export the grid into `out` (length `N*N`), wall nibbles emitted
    /// as `255`.
    pub fn read_world(&self, out: &mut [u8]) -> StatusCode {
        if out.len() != CELLS {
            return self.publish_err(FacadeError::StateNotValid);
        }
        let state = self.state.lock();
        if !state.world_valid {
            return self.publish_err(FacadeError::StateNotValid);
        }
        for y in 0..SIDE {
            for x in 0..SIDE {
                let nibble = state.grid.get(x, y);
                out[x + y * SIDE] = if nibble == WALL { WALL_EXPORT } else { nibble };
            }
        }
        self.publish_and_return(StatusCode::Success)
    }

    /// Will return a stable-ordered snapshot of every bound symbol, for
    /// diagnostics/debugging tooling.
    pub fn dump_symbols(&self) -> Vec<(String, Pc)> {
        self.state.lock().symbols.dump()
    }

    /// Will return the most recently published status, without taking the
    /// facade lock.
    pub fn status(&self) -> StatusCode {
        self.status.load()
    }

    fn publish_and_return(&self, code: StatusCode) -> StatusCode {
        self.status.publish(code);
        code
    }

    fn publish_err(&self, err: FacadeError) -> StatusCode {
        let process_err = ProcessError::from(err);
        let code = StatusCode::from(&process_err);
        self.status.publish(code);
        code
    }

    fn publish_outcome(&self, outcome: Result<StatusCode, ProcessError>) -> StatusCode {
        let code = match &outcome {
            Ok(code) => *code,
            Err(err) => StatusCode::from(err),
        };
        self.status.publish(code);
        code
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::init()
    }
}
