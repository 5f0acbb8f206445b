//! The optional C-compatible embedding surface: exports mirroring the facade
//! operations, strings as pointer+length, buffers caller-owned. Off by
//! default behind the `ffi` feature so the core crate stays a plain Rust
//! library unless a host opts in.
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::slice;

use crate::compiler::{Compiler, FsSourceLoader, SourceLoader};
use crate::definitions::grid::CELLS;
use crate::status::StatusCode;
use crate::vm::Vm;

/// Will allocate a fresh [`Vm`] and hand the caller an opaque owning pointer.
/// The caller is responsible for eventually passing it to [`karel_vm_free`].
#[no_mangle]
pub extern "C" fn karel_vm_new() -> *mut Vm {
    Box::into_raw(Box::new(Vm::init()))
}

/// Will drop the VM behind `vm`. `vm` must have come from [`karel_vm_new`]
/// and must not be used again afterwards.
///
/// # Safety
/// `vm` must be a valid, non-aliased pointer previously returned by
/// [`karel_vm_new`].
#[no_mangle]
pub unsafe extern "C" fn karel_vm_free(vm: *mut Vm) {
    if !vm.is_null() {
        drop(Box::from_raw(vm));
    }
}

/// Will load world state from `cells` (exactly `N*N` bytes) and `robot`
/// (exactly 5 `u32` words, `(px, py, d, hx, hy)`).
///
/// # Safety
/// `vm` must be a valid pointer from [`karel_vm_new`]. `cells` must point to
/// at least `cells_len` readable bytes; `robot` must point to at least 5
/// readable `u32`s.
#[no_mangle]
pub unsafe extern "C" fn karel_vm_load_world(
    vm: *const Vm,
    cells: *const u8,
    cells_len: usize,
    robot: *const u32,
) -> StatusCode {
    let guard = catch_unwind(AssertUnwindSafe(|| {
        let vm = &*vm;
        if cells_len != CELLS {
            return StatusCode::StateNotValid;
        }
        let cells = slice::from_raw_parts(cells, cells_len);
        let robot = slice::from_raw_parts(robot, 5);
        let robot_record: [u32; 5] = robot.try_into().expect("checked length above");
        vm.load_world(cells, robot_record)
    }));
    guard.unwrap_or(StatusCode::UnknownError)
}

/// Will export the current world into `out` (must point to at least `N*N`
/// writable bytes).
///
/// # Safety
/// `vm` must be a valid pointer from [`karel_vm_new`]. `out` must point to at
/// least `out_len` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn karel_vm_read_world(
    vm: *const Vm,
    out: *mut u8,
    out_len: usize,
) -> StatusCode {
    let guard = catch_unwind(AssertUnwindSafe(|| {
        let vm = &*vm;
        if out_len != CELLS {
            return StatusCode::StateNotValid;
        }
        let out = slice::from_raw_parts_mut(out, out_len);
        vm.read_world(out)
    }));
    guard.unwrap_or(StatusCode::UnknownError)
}

/// Will resolve and run `name` (a UTF-8 byte string of length `name_len`,
/// not necessarily nul-terminated).
///
/// # Safety
/// `vm` must be a valid pointer from [`karel_vm_new`]. `name` must point to
/// at least `name_len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn karel_vm_run_symbol(
    vm: *const Vm,
    name: *const u8,
    name_len: usize,
) -> StatusCode {
    let guard = catch_unwind(AssertUnwindSafe(|| {
        let vm = &*vm;
        let name = slice::from_raw_parts(name, name_len);
        vm.run_symbol(name)
    }));
    guard.unwrap_or(StatusCode::UnknownError)
}

/// Will set the short-circuit flag from any thread, including one running
/// concurrently with [`karel_vm_run_symbol`].
///
/// # Safety
/// `vm` must be a valid pointer from [`karel_vm_new`].
#[no_mangle]
pub unsafe extern "C" fn karel_vm_short_circuit(vm: *const Vm) {
    if let Ok(()) = catch_unwind(AssertUnwindSafe(|| (&*vm).short_circuit())) {}
}

/// A minimal `Compiler`/`SourceLoader` pair usable from C hosts that already
/// have their own bytecode pipeline and only want to hand over raw bytes: it
/// never actually compiles Karel source, it hands the source buffer back
/// verbatim as a single unnamed bytecode image starting at offset 0.
///
/// Hosts with a real Karel front end should implement [`Compiler`]
/// themselves instead and skip this FFI path's [`karel_vm_load_bytecode_raw`]
/// entirely; it exists only so the C ABI is usable without linking a second
/// Rust crate for the front end.
struct RawImageCompiler;

impl Compiler for RawImageCompiler {
    fn compile(&self, source: &[u8]) -> Result<(Vec<u8>, crate::symbols::SymbolTable), String> {
        let mut symbols = crate::symbols::SymbolTable::new();
        symbols.insert(b"main".to_vec(), 0);
        Ok((source.to_vec(), symbols))
    }
}

/// Will install `source` (length `source_len`) verbatim as the bytecode
/// image, bound to the single entry symbol `main` at offset 0.
///
/// # Safety
/// `vm` must be a valid pointer from [`karel_vm_new`]. `source` must point to
/// at least `source_len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn karel_vm_load_bytecode_raw(
    vm: *const Vm,
    source: *const u8,
    source_len: usize,
) -> StatusCode {
    let guard = catch_unwind(AssertUnwindSafe(|| {
        let vm = &*vm;
        let source = slice::from_raw_parts(source, source_len);
        vm.load_bytecode(&RawImageCompiler, source)
    }));
    guard.unwrap_or(StatusCode::UnknownError)
}

/// Will read `path` (a nul-free UTF-8 byte string of length `path_len`) off
/// disk via [`FsSourceLoader`] and install it the same way as
/// [`karel_vm_load_bytecode_raw`].
///
/// # Safety
/// `vm` must be a valid pointer from [`karel_vm_new`]. `path` must point to
/// at least `path_len` readable bytes containing valid UTF-8.
#[no_mangle]
pub unsafe extern "C" fn karel_vm_load_bytecode_raw_file(
    vm: *const Vm,
    path: *const u8,
    path_len: usize,
) -> StatusCode {
    let guard = catch_unwind(AssertUnwindSafe(|| {
        let vm = &*vm;
        let path_bytes = slice::from_raw_parts(path, path_len);
        let path = match std::str::from_utf8(path_bytes) {
            Ok(path) => path,
            Err(_) => return StatusCode::FileNotFound,
        };
        vm.load_bytecode_file(&RawImageCompiler, &FsSourceLoader, path)
    }));
    guard.unwrap_or(StatusCode::UnknownError)
}
