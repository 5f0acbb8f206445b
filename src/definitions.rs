/// The definitions

/// The definitions for the grid / world.
pub mod grid {
    /// The side length of the (always square) map, in cells.
    pub const SIDE: usize = 20;

    /// The total cell count of the map.
    pub const CELLS: usize = SIDE * SIDE;

    /// The highest flag count a cell may hold before `PLACE` refuses to add more.
    pub const MAX_FLAGS: u8 = 8;

    /// The nibble value reserved to mark a cell as a wall.
    pub const WALL: u8 = 0xF;

    /// The byte value used at the world-import/export boundary to denote a wall,
    /// as opposed to the internal packed nibble representation.
    pub const WALL_EXPORT: u8 = 255;
}

/// The definitions needed for the bytecode layout.
pub mod bytecode {
    /// Byte offset of the instruction every activation unwinds to once its call
    /// stack is exhausted, and the synthetic target of a short-circuit interrupt.
    /// This offset must always hold a `RETN` instruction.
    pub const ENTRY_ZERO: usize = 0;

    /// Length, in bytes, of the fixed-size instructions (`STEP`, `LEFT`,
    /// `PICK_UP`, `PLACE`, `RETN`, `STOP`).
    pub const LEN_SIMPLE: usize = 1;

    /// Length, in bytes, of `BRANCH`/`BRANCH_LINKED`: head byte + 4-byte target PC.
    pub const LEN_BRANCH: usize = 5;

    /// Length, in bytes, of `REPEAT`: head byte + 4-byte loop-top PC + 2-byte count.
    pub const LEN_REPEAT: usize = 7;
}

/// The definitions for the interpreter's call/repeat stacks.
pub mod interpreter {
    /// The depth up to which the call and repeat stacks are preallocated; pushes
    /// below this depth are infallible. Crossing it triggers a cold-path growth.
    pub const FAST_DEPTH: usize = 512;

    /// The number of additional frames reserved each time the fast-depth
    /// threshold is crossed.
    pub const GROWTH_STEP: usize = 16;
}
