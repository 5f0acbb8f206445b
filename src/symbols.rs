//! The symbol table mapping procedure names to bytecode entry offsets.
use hashbrown::HashMap;

use crate::bytecode::Pc;

/// Maps a procedure name (an owned byte string) to its bytecode entry offset.
/// Key storage is owned by the table; entries are written during load and
/// cleared wholesale on reload.
#[derive(Default)]
pub struct SymbolTable {
    entries: HashMap<Box<[u8]>, Pc>,
}

impl SymbolTable {
    /// Will create an empty symbol table.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Will bind `name` to bytecode offset `pc`, overwriting any previous
    /// binding for the same name (keys are unique by construction).
    pub fn insert(&mut self, name: impl Into<Box<[u8]>>, pc: Pc) {
        self.entries.insert(name.into(), pc);
    }

    /// Will resolve `name` to its bytecode entry offset, if bound.
    pub fn lookup(&self, name: &[u8]) -> Option<Pc> {
        self.entries.get(name).copied()
    }

    /// Will drop every binding, leaving the table empty.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Will return the number of bound symbols.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Will return whether the table currently has no bindings.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Will iterate over every `(name, pc)` binding, in unspecified order.
    pub fn iterate(&self) -> impl Iterator<Item = (&[u8], Pc)> {
        self.entries.iter().map(|(name, pc)| (name.as_ref(), *pc))
    }

    /// Will return a stable (lexically sorted by name), UTF-8-lossy snapshot of
    /// every binding, suitable for diagnostics/debugging tooling.
    pub fn dump(&self) -> Vec<(String, Pc)> {
        let mut dump: Vec<_> = self
            .iterate()
            .map(|(name, pc)| (String::from_utf8_lossy(name).into_owned(), pc))
            .collect();
        dump.sort_by(|a, b| a.0.cmp(&b.0));
        dump
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_resolves_inserted_symbol() {
        let mut table = SymbolTable::new();
        table.insert(b"main".to_vec(), 0x200);
        assert_eq!(Some(0x200), table.lookup(b"main"));
    }

    #[test]
    fn lookup_of_unknown_name_is_none() {
        let table = SymbolTable::new();
        assert_eq!(None, table.lookup(b"missing"));
    }

    #[test]
    fn reinserting_overwrites_the_binding() {
        let mut table = SymbolTable::new();
        table.insert(b"main".to_vec(), 0x200);
        table.insert(b"main".to_vec(), 0x300);
        assert_eq!(Some(0x300), table.lookup(b"main"));
        assert_eq!(1, table.len());
    }

    #[test]
    fn clear_drops_every_binding() {
        let mut table = SymbolTable::new();
        table.insert(b"main".to_vec(), 0x200);
        table.insert(b"turnRight".to_vec(), 0x210);
        table.clear();
        assert!(table.is_empty());
        assert_eq!(None, table.lookup(b"main"));
    }

    #[test]
    fn dump_is_sorted_by_name() {
        let mut table = SymbolTable::new();
        table.insert(b"turnRight".to_vec(), 0x210);
        table.insert(b"main".to_vec(), 0x200);
        let dump = table.dump();
        assert_eq!(
            vec![("main".to_string(), 0x200), ("turnRight".to_string(), 0x210)],
            dump
        );
    }
}
