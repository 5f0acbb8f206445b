//! The fetch/dispatch loop: a fixed-opcode switch driven by a call stack, a
//! repeat stack, a condition evaluator, and an externally triggerable
//! short-circuit interrupt.
use std::sync::atomic::{AtomicBool, Ordering};

use crate::bytecode::{decode_head, read_branch_target, read_repeat, ConditionCode, OpTag, Pc};
use crate::definitions::{
    bytecode::ENTRY_ZERO,
    grid::{SIDE, WALL},
    interpreter::{FAST_DEPTH, GROWTH_STEP},
};
use crate::error::{ProcessError, StackError};
use crate::grid::Grid;
use crate::robot::{Facing, Robot};
use crate::status::StatusCode;

/// Bookkeeping for one active (or paused, for outer loops) `REPEAT` loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RepeatFrame {
    origin: Pc,
    remaining: u16,
}

/// Will push onto `stack`, growing it by [`GROWTH_STEP`] once its preallocated
/// [`FAST_DEPTH`] capacity is exhausted. Below that threshold pushes are
/// infallible; past it, allocation failure surfaces as [`StackError::GrowthFailed`].
fn push_checked<T>(stack: &mut Vec<T>, value: T) -> Result<(), ProcessError> {
    if stack.len() == stack.capacity() {
        stack.try_reserve(GROWTH_STEP).map_err(|_| {
            log::error!("stack growth past fast-depth {} failed to allocate", FAST_DEPTH);
            ProcessError::from(StackError::GrowthFailed)
        })?;
    }
    stack.push(value);
    Ok(())
}

/// Executes bytecode against a borrowed world until termination.
///
/// `call_stack`, `repeat_stack`, `cur_repeat` and `depth` are all local to a
/// single call to [`Interpreter::run`] — nothing about a run's control-flow
/// bookkeeping survives past its return, by design (see the facade's run-once
/// execution model).
pub struct Interpreter<'w> {
    image: &'w [u8],
    grid: &'w mut Grid,
    robot: &'w mut Robot,
    interrupted: &'w AtomicBool,
    call_stack: Vec<Pc>,
    repeat_stack: Vec<RepeatFrame>,
    cur_repeat: Option<RepeatFrame>,
    depth: usize,
}

impl<'w> Interpreter<'w> {
    /// Will create an interpreter bound to `image`, `grid`, `robot` and the
    /// shared `interrupted` flag the host toggles via `short_circuit`.
    pub fn new(
        image: &'w [u8],
        grid: &'w mut Grid,
        robot: &'w mut Robot,
        interrupted: &'w AtomicBool,
    ) -> Self {
        Self {
            image,
            grid,
            robot,
            interrupted,
            call_stack: Vec::with_capacity(FAST_DEPTH),
            repeat_stack: Vec::with_capacity(FAST_DEPTH),
            cur_repeat: None,
            depth: 0,
        }
    }

    /// Will return the repeat-stack-depth + call-stack-depth invariant total.
    /// Exposed for tests; not part of the public contract.
    #[cfg(test)]
    fn depth(&self) -> usize {
        self.depth
    }

    /// Will run starting at `entry_pc` until normal termination, a
    /// primitive-level error, a host interrupt, or `STOP`.
    pub fn run(&mut self, entry_pc: Pc) -> Result<StatusCode, ProcessError> {
        let mut pc = entry_pc;
        loop {
            // The host may set `interrupted` from another thread at any time;
            // we observe it here, at the next instruction fetch, and redirect
            // to the synthetic `RETN` reserved at offset zero. Because every
            // open call frame unwinds through the same redirected fetch, this
            // converges to `SUCCESS` after at most `call_stack.len()` more
            // dispatches, none of which re-enter user code.
            let fetch_pc = if self.interrupted.load(Ordering::Acquire) {
                ENTRY_ZERO as Pc
            } else {
                pc
            };

            let head_byte = *self
                .image
                .get(fetch_pc as usize)
                .ok_or(crate::error::BytecodeError::PcOutOfRange {
                    pc: fetch_pc,
                    len: self.image.len(),
                })?;
            let head = decode_head(head_byte, fetch_pc)?;
            log::trace!("pc={} tag={:?} robot=({},{})", fetch_pc, head.tag, self.robot.px, self.robot.py);

            match head.tag {
                OpTag::Step => match self.robot.preview_step(SIDE) {
                    Some((x, y)) if self.grid.get(x, y) != WALL => {
                        self.robot.px = x;
                        self.robot.py = y;
                        pc = fetch_pc + 1;
                    }
                    _ => return Ok(StatusCode::StepOutOfBounds),
                },
                OpTag::Left => {
                    self.robot.turn_left();
                    pc = fetch_pc + 1;
                }
                OpTag::PickUp => {
                    let cell = self.grid.get(self.robot.px, self.robot.py);
                    if cell == 0 {
                        return Ok(StatusCode::PickupZeroFlags);
                    }
                    self.grid.set(self.robot.px, self.robot.py, cell - 1);
                    pc = fetch_pc + 1;
                }
                OpTag::Place => {
                    let cell = self.grid.get(self.robot.px, self.robot.py);
                    if cell >= crate::definitions::grid::MAX_FLAGS {
                        return Ok(StatusCode::PlaceMaxFlags);
                    }
                    self.grid.set(self.robot.px, self.robot.py, cell + 1);
                    pc = fetch_pc + 1;
                }
                OpTag::Branch => {
                    let cond = self.eval_condition(head.condcode) ^ head.invert;
                    pc = if cond {
                        read_branch_target(self.image, fetch_pc)?
                    } else {
                        fetch_pc + 5
                    };
                }
                OpTag::BranchLinked => {
                    let cond = self.eval_condition(head.condcode) ^ head.invert;
                    if cond {
                        let target = read_branch_target(self.image, fetch_pc)?;
                        push_checked(&mut self.call_stack, fetch_pc + 5)?;
                        self.depth += 1;
                        pc = target;
                    } else {
                        pc = fetch_pc + 5;
                    }
                }
                OpTag::Retn => match self.call_stack.pop() {
                    Some(return_pc) => {
                        self.depth -= 1;
                        pc = return_pc;
                    }
                    None => return Ok(StatusCode::Success),
                },
                OpTag::Stop => return Ok(StatusCode::StopEncountered),
                OpTag::Repeat => {
                    let (loop_top, count) = read_repeat(self.image, fetch_pc)?;

                    let first_visit = match self.cur_repeat {
                        Some(frame) => frame.origin != fetch_pc,
                        None => true,
                    };
                    if first_visit {
                        // First-visit detection keys off pointer/PC equality with
                        // `cur_repeat`'s origin: a single PC is assumed to host at
                        // most one logical REPEAT, so it can never already be
                        // paused further down the repeat stack (see SPEC_FULL §9).
                        debug_assert!(
                            !self.repeat_stack.iter().any(|frame| frame.origin == fetch_pc),
                            "REPEAT at pc {} is already paused on the repeat stack; \
                             two distinct REPEATs must not share a PC",
                            fetch_pc
                        );
                        if let Some(prev) = self.cur_repeat.take() {
                            push_checked(&mut self.repeat_stack, prev)?;
                        }
                        self.cur_repeat = Some(RepeatFrame {
                            origin: fetch_pc,
                            remaining: count,
                        });
                        self.depth += 1;
                    }

                    let frame = self
                        .cur_repeat
                        .as_mut()
                        .expect("cur_repeat was just populated above");
                    if frame.remaining == 1 {
                        self.cur_repeat = self.repeat_stack.pop();
                        self.depth -= 1;
                        pc = fetch_pc + 7;
                    } else {
                        frame.remaining -= 1;
                        pc = loop_top;
                    }
                }
            }
        }
    }

    /// Will evaluate the raw (pre-invert) condition selected by `condcode`.
    fn eval_condition(&self, condcode: ConditionCode) -> bool {
        match condcode {
            ConditionCode::IsWall => match self.robot.preview_step(SIDE) {
                None => true,
                Some((x, y)) => self.grid.get(x, y) == WALL,
            },
            ConditionCode::IsFlag => {
                let cell = self.grid.get(self.robot.px, self.robot.py);
                cell != 0 && cell != WALL
            }
            ConditionCode::IsHome => self.robot.is_home(),
            ConditionCode::IsNorth => self.robot.facing == Facing::North,
            ConditionCode::IsWest => self.robot.facing == Facing::West,
            ConditionCode::IsSouth => self.robot.facing == Facing::South,
            ConditionCode::IsEast => self.robot.facing == Facing::East,
            ConditionCode::None => true,
        }
    }
}

/// A snapshot of the execution state for debugging tooling, analogous to the
/// register/stack introspection a disassembler-style dump provides. Gated to
/// debug builds to keep it out of the non-debug path.
#[cfg(debug_assertions)]
impl<'w> std::fmt::Display for Interpreter<'w> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "depth={} call_stack={} repeat_stack={} cur_repeat={:?} robot=({},{},{:?})",
            self.depth,
            self.call_stack.len(),
            self.repeat_stack.len(),
            self.cur_repeat,
            self.robot.px,
            self.robot.py,
            self.robot.facing,
        )
    }
}

#[cfg(test)]
mod tests;
