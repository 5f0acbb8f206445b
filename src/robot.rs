//! Robot position, home, and facing, with the pure step-preview arithmetic the
//! interpreter's `STEP`/`BRANCH` opcodes lean on.

/// The facing of the robot. The discriminant values are load-bearing: they are
/// exactly the `d` values the bytecode's `IS_NORTH`/`IS_WEST`/`IS_SOUTH`/`IS_EAST`
/// conditions compare against, and `turn_left` advances counter-clockwise by
/// incrementing modulo 4.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Facing {
    North = 0,
    West = 1,
    South = 2,
    East = 3,
}

impl Facing {
    fn from_index(index: u8) -> Self {
        match index % 4 {
            0 => Facing::North,
            1 => Facing::West,
            2 => Facing::South,
            _ => Facing::East,
        }
    }

    fn index(self) -> u8 {
        self as u8
    }
}

/// Position, home, and facing of the robot. Replaced wholesale on world import;
/// mutated in place by the interpreter's primitives.
#[derive(Debug, Clone, Copy)]
pub struct Robot {
    pub px: usize,
    pub py: usize,
    pub hx: usize,
    pub hy: usize,
    pub facing: Facing,
}

impl Robot {
    /// Will build a robot from the five-word import record `(px, py, d, hx, hy)`.
    pub fn new(px: usize, py: usize, d: u8, hx: usize, hy: usize) -> Self {
        Self {
            px,
            py,
            hx,
            hy,
            facing: Facing::from_index(d),
        }
    }

    /// Will return the cell the robot would enter if it stepped forward, or
    /// `None` when that step would leave the `side`-by-`side` grid. Pure: does
    /// not mutate the robot.
    pub fn preview_step(&self, side: usize) -> Option<(usize, usize)> {
        match self.facing {
            Facing::North => (self.py + 1 < side).then(|| (self.px, self.py + 1)),
            Facing::West => self.px.checked_sub(1).map(|x| (x, self.py)),
            Facing::South => self.py.checked_sub(1).map(|y| (self.px, y)),
            Facing::East => (self.px + 1 < side).then(|| (self.px + 1, self.py)),
        }
    }

    /// Will advance the robot's facing counter-clockwise by one quarter turn:
    /// `d <- (d + 1) mod 4`.
    pub fn turn_left(&mut self) {
        self.facing = Facing::from_index(self.facing.index() + 1);
    }

    /// Will return whether the robot currently stands on its home cell.
    pub fn is_home(&self) -> bool {
        (self.px, self.py) == (self.hx, self.hy)
    }
}
