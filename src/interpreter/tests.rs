//! Scenario tests for the fetch/dispatch loop, exercising the six concrete
//! scenarios from the interpreter's contract plus the stack-depth invariants.
use std::sync::atomic::AtomicBool;

use super::*;
use crate::bytecode::{encode_branch, encode_repeat, encode_simple, ConditionCode, OpTag};

fn robot_at(px: usize, py: usize, d: u8, hx: usize, hy: usize) -> Robot {
    Robot::new(px, py, d, hx, hy)
}

fn run_image(image: &[u8], grid: &mut Grid, robot: &mut Robot) -> StatusCode {
    let interrupted = AtomicBool::new(false);
    let mut interp = Interpreter::new(image, grid, robot, &interrupted);
    interp.run(0).expect("well-formed test bytecode does not error")
}

#[test]
fn scenario_1_step_then_retn_moves_robot_north() {
    let image = [encode_simple(OpTag::Step), encode_simple(OpTag::Retn)];
    let mut grid = Grid::new();
    let mut robot = robot_at(5, 5, 0, 5, 5);

    let status = run_image(&image, &mut grid, &mut robot);

    assert_eq!(StatusCode::Success, status);
    assert_eq!((5, 6), (robot.px, robot.py));
}

#[test]
fn scenario_2_four_lefts_is_identity_facing() {
    let image = [
        encode_simple(OpTag::Left),
        encode_simple(OpTag::Left),
        encode_simple(OpTag::Left),
        encode_simple(OpTag::Left),
        encode_simple(OpTag::Retn),
    ];
    let mut grid = Grid::new();
    let mut robot = robot_at(5, 5, 0, 5, 5);

    let status = run_image(&image, &mut grid, &mut robot);

    assert_eq!(StatusCode::Success, status);
    assert_eq!(Facing::North, robot.facing);
}

#[test]
fn scenario_3_pickup_on_empty_cell_errors_and_leaves_cell_unchanged() {
    let image = [encode_simple(OpTag::PickUp), encode_simple(OpTag::Retn)];
    let mut grid = Grid::new();
    let mut robot = robot_at(5, 5, 0, 5, 5);

    let status = run_image(&image, &mut grid, &mut robot);

    assert_eq!(StatusCode::PickupZeroFlags, status);
    assert_eq!(0, grid.get(5, 5));
}

#[test]
fn scenario_4_repeat_three_places_raises_flag_count_to_three() {
    // layout: [0] PLACE (loop top)  [1..8) REPEAT(top=0, count=3)  [8] RETN
    let mut image = vec![encode_simple(OpTag::Place)];
    encode_repeat(&mut image, 0, 3);
    image.push(encode_simple(OpTag::Retn));

    let mut grid = Grid::new();
    let mut robot = robot_at(5, 5, 0, 5, 5);

    let status = run_image(&image, &mut grid, &mut robot);

    assert_eq!(StatusCode::Success, status);
    assert_eq!(3, grid.get(5, 5));
}

#[test]
fn scenario_5_branch_linked_call_then_continue() {
    // [0..5) BRANCH_LINKED -> 10 (call `main`'s body), return address = 5
    // [5] STEP; [6] RETN                    (root's continuation after the call)
    // [10] STEP; [11] RETN                  (body of `main`)
    let mut image = Vec::new();
    encode_branch(&mut image, OpTag::BranchLinked, ConditionCode::None, false, 10);
    image.push(encode_simple(OpTag::Step));
    image.push(encode_simple(OpTag::Retn));
    while image.len() < 10 {
        image.push(0);
    }
    image.push(encode_simple(OpTag::Step));
    image.push(encode_simple(OpTag::Retn));

    let mut grid = Grid::new();
    let mut robot = robot_at(5, 5, 0, 5, 5);

    let status = run_image(&image, &mut grid, &mut robot);

    assert_eq!(StatusCode::Success, status);
    assert_eq!((5, 7), (robot.px, robot.py));
}

#[test]
fn scenario_6_short_circuit_redirects_the_very_next_fetch_to_the_synthetic_retn() {
    // offset 0 is the reserved RETN; the real entry point (an effectively
    // unbounded loop) starts at offset 1.
    let mut image = vec![encode_simple(OpTag::Retn), encode_simple(OpTag::Step)];
    encode_repeat(&mut image, 1, u16::MAX);
    image.push(encode_simple(OpTag::Retn));

    let mut grid = Grid::new();
    let mut robot = robot_at(0, 0, 0, 0, 0);
    let interrupted = AtomicBool::new(false);

    // Signalled before the first fetch: the interpreter must redirect to the
    // synthetic RETN at offset zero on its very next fetch, never dispatching
    // the STEP the real entry point would have run first.
    interrupted.store(true, std::sync::atomic::Ordering::Release);
    let mut interp = Interpreter::new(&image, &mut grid, &mut robot, &interrupted);
    let status = interp.run(1).unwrap();

    assert_eq!(StatusCode::Success, status);
    assert_eq!((0, 0), (robot.px, robot.py));
}

#[test]
fn short_circuit_unwinds_through_every_open_call_frame() {
    // Whatever the real program was doing, once interrupted the only
    // instruction the interpreter will ever fetch again is the synthetic RETN
    // at offset zero — so two already-open call frames must pop one at a time
    // until the call stack (and depth) are back to zero and SUCCESS publishes.
    let image = [encode_simple(OpTag::Retn)];
    let mut grid = Grid::new();
    let mut robot = robot_at(0, 0, 0, 0, 0);
    let interrupted = AtomicBool::new(false);

    let mut interp = Interpreter::new(&image, &mut grid, &mut robot, &interrupted);
    interp.call_stack.push(6);
    interp.call_stack.push(15);
    interp.depth = 2;

    interrupted.store(true, std::sync::atomic::Ordering::Release);
    let status = interp.run(0).unwrap();

    assert_eq!(StatusCode::Success, status);
    assert_eq!(0, interp.depth());
    assert!(interp.call_stack.is_empty());
}

#[test]
fn branch_takes_target_when_condition_is_true() {
    // IS_HOME is true at (5,5); BRANCH jumps straight to the STEP at offset 6,
    // skipping the STOP sitting right after the branch instruction.
    let mut image = Vec::new();
    encode_branch(&mut image, OpTag::Branch, ConditionCode::IsHome, false, 6);
    image.push(encode_simple(OpTag::Stop));
    image.push(encode_simple(OpTag::Step));
    image.push(encode_simple(OpTag::Retn));

    let mut grid = Grid::new();
    let mut robot = robot_at(5, 5, 0, 5, 5);
    let status = run_image(&image, &mut grid, &mut robot);

    assert_eq!(StatusCode::Success, status);
    assert_eq!((5, 6), (robot.px, robot.py));
}

#[test]
fn branch_falls_through_by_five_when_condition_is_false() {
    // IS_HOME is false after moving away from home; BRANCH falls through to
    // the STOP right after it instead of jumping to the far-away target.
    let mut image = Vec::new();
    encode_branch(&mut image, OpTag::Branch, ConditionCode::IsHome, false, 200);
    image.push(encode_simple(OpTag::Stop));

    let mut grid = Grid::new();
    let mut robot = robot_at(5, 6, 0, 5, 5);
    let status = run_image(&image, &mut grid, &mut robot);

    assert_eq!(StatusCode::StopEncountered, status);
}

#[test]
fn invert_flips_the_evaluated_condition() {
    // NONE is always true; inverted it is always false, so BRANCH falls through.
    let mut image = Vec::new();
    encode_branch(&mut image, OpTag::Branch, ConditionCode::None, true, 10);
    image.push(encode_simple(OpTag::Retn));

    let mut grid = Grid::new();
    let mut robot = robot_at(5, 5, 0, 5, 5);
    let status = run_image(&image, &mut grid, &mut robot);

    assert_eq!(StatusCode::Success, status);
}

#[test]
fn step_into_a_wall_errors_without_moving_the_robot() {
    let image = [encode_simple(OpTag::Step), encode_simple(OpTag::Retn)];
    let mut grid = Grid::new();
    grid.set(5, 6, crate::definitions::grid::WALL);
    let mut robot = robot_at(5, 5, 0, 5, 5);

    let status = run_image(&image, &mut grid, &mut robot);

    assert_eq!(StatusCode::StepOutOfBounds, status);
    assert_eq!((5, 5), (robot.px, robot.py));
}

#[test]
fn place_on_a_full_cell_errors_without_changing_it() {
    let image = [encode_simple(OpTag::Place), encode_simple(OpTag::Retn)];
    let mut grid = Grid::new();
    grid.set(5, 5, crate::definitions::grid::MAX_FLAGS);
    let mut robot = robot_at(5, 5, 0, 5, 5);

    let status = run_image(&image, &mut grid, &mut robot);

    assert_eq!(StatusCode::PlaceMaxFlags, status);
    assert_eq!(crate::definitions::grid::MAX_FLAGS, grid.get(5, 5));
}

#[test]
fn stop_opcode_is_distinguished_from_success() {
    let image = [encode_simple(OpTag::Stop)];
    let mut grid = Grid::new();
    let mut robot = robot_at(5, 5, 0, 5, 5);

    let status = run_image(&image, &mut grid, &mut robot);

    assert_eq!(StatusCode::StopEncountered, status);
}

#[test]
fn nested_repeats_track_combined_depth() {
    // outer REPEAT(2) wraps an inner REPEAT(2) wrapping a single PLACE.
    // layout: [0] PLACE  [1..8) inner REPEAT(top=0,count=2)  [8..15) outer REPEAT(top=0,count=2)  [15] RETN
    let mut image = vec![encode_simple(OpTag::Place)];
    encode_repeat(&mut image, 0, 2);
    encode_repeat(&mut image, 0, 2);
    image.push(encode_simple(OpTag::Retn));

    let mut grid = Grid::new();
    let mut robot = robot_at(5, 5, 0, 5, 5);
    let status = run_image(&image, &mut grid, &mut robot);

    assert_eq!(StatusCode::Success, status);
    // Each of the 2 outer passes runs the inner loop's 2 passes: 4 PLACEs total.
    assert_eq!(4, grid.get(5, 5));
}

#[test]
fn depth_is_zero_on_return_to_success() {
    let image = [encode_simple(OpTag::Retn)];
    let mut grid = Grid::new();
    let mut robot = robot_at(5, 5, 0, 5, 5);
    let interrupted = AtomicBool::new(false);
    let mut interp = Interpreter::new(&image, &mut grid, &mut robot, &interrupted);
    let status = interp.run(0).unwrap();
    assert_eq!(StatusCode::Success, status);
    assert_eq!(0, interp.depth());
}
