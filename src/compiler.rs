//! The two external collaborators the facade drives but never implements
//! itself: the source-to-bytecode compiler and the file-system loader.
use crate::symbols::SymbolTable;

/// Turns Karel source text into a bytecode image and a symbol table.
///
/// This crate ships no Karel-language front end; callers inject their own
/// implementation. Tests inject a trivial hand-assembling stub to exercise
/// the facade end to end (see the `tests` submodule of [`crate::vm`]).
#[cfg_attr(test, mockall::automock)]
pub trait Compiler {
    /// Will compile `source` into a flat bytecode image together with the
    /// symbol table binding procedure names to entry offsets, or return an
    /// error message describing why the source was rejected.
    fn compile(&self, source: &[u8]) -> Result<(Vec<u8>, SymbolTable), String>;
}

/// Reads a path into an owned byte buffer.
///
/// The default implementation shells out to [`std::fs::read`]; embedders may
/// substitute their own (virtual filesystems, bundled assets, etc.).
#[cfg_attr(test, mockall::automock)]
pub trait SourceLoader {
    /// Will read the file at `path` in full, or report that it could not be
    /// read (most commonly because it does not exist).
    fn read(&self, path: &str) -> std::io::Result<Vec<u8>>;
}

/// The default [`SourceLoader`], backed directly by the filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSourceLoader;

impl SourceLoader for FsSourceLoader {
    fn read(&self, path: &str) -> std::io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}
