//! String interning for identifiers.
//!
//! The source language has no module system and no concurrency: a single
//! thread tokenizes, parses, optimizes and emits one file end to end. So
//! unlike a general-purpose compiler's globally-shared, thread-safe symbol
//! table, [`Interner`] is a plain owned value that the driver creates once
//! per compilation and threads through the pipeline. [`Symbol`] stays a
//! cheap `Copy` index either way.

use rustc_hash::FxHashMap;

/// A compact, `Copy` handle to an interned identifier string.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

impl std::fmt::Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

/// Owns the backing storage for every [`Symbol`] produced during one
/// compilation.
#[derive(Default)]
pub struct Interner {
    strings: Vec<Box<str>>,
    lookup: FxHashMap<Box<str>, u32>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `text`, returning the existing symbol if it was seen before.
    pub fn intern(&mut self, text: &str) -> Symbol {
        if let Some(&id) = self.lookup.get(text) {
            return Symbol(id);
        }
        let id = self.strings.len() as u32;
        let boxed: Box<str> = text.into();
        self.strings.push(boxed.clone());
        self.lookup.insert(boxed, id);
        Symbol(id)
    }

    /// Resolve a symbol back to its string. Panics if `symbol` was not
    /// produced by this same `Interner` — symbols from different
    /// `Interner`s are never comparable anyway since each compilation owns
    /// its own table.
    pub fn resolve(&self, symbol: Symbol) -> &str {
        &self.strings[symbol.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_the_same_string_twice_returns_the_same_symbol() {
        let mut interner = Interner::new();
        let a = interner.intern("fib");
        let b = interner.intern("fib");
        assert_eq!(a, b);
        assert_eq!(interner.resolve(a), "fib");
    }

    #[test]
    fn distinct_strings_get_distinct_symbols() {
        let mut interner = Interner::new();
        let a = interner.intern("fib");
        let b = interner.intern("n");
        assert_ne!(a, b);
    }
}
