//! The variable scope stack.
//!
//! Scopes nest as a plain `Vec` rather than a parent-linked rib tree: the
//! innermost scope is always the last element, entering a block pushes a
//! fresh map, and leaving pops it. `next_local_address` tracks the next
//! free byte offset in the current function's frame; a stack of saved
//! values lets a block exit restore exactly the address the outer scope
//! held before the block was entered.

use rustc_hash::FxHashMap;
use svmc_util::{CompileError, CompileResult, Interner, Origin, Symbol};

/// Every declared variable occupies 8 bytes of its function's frame.
pub const VARIABLE_SIZE: u32 = 8;

#[derive(Debug, Clone, Copy)]
pub struct VariableSymbol {
    pub address: u32,
    pub origin: Origin,
}

pub struct VariableScope {
    scopes: Vec<FxHashMap<Symbol, VariableSymbol>>,
    next_local_address: u32,
    saved_addresses: Vec<u32>,
}

impl VariableScope {
    /// A scope stack ready for one function body: a single (the function's
    /// own) scope, addresses starting at 0.
    pub fn new() -> Self {
        Self {
            scopes: vec![FxHashMap::default()],
            next_local_address: 0,
            saved_addresses: Vec::new(),
        }
    }

    /// Resets the stack for a new function — the codegen visitor calls
    /// this once per `FunctionDefinition` rather than constructing a new
    /// `VariableScope`.
    pub fn enter_function(&mut self) {
        self.scopes.clear();
        self.scopes.push(FxHashMap::default());
        self.next_local_address = 0;
        self.saved_addresses.clear();
    }

    pub fn enter_block(&mut self) {
        self.saved_addresses.push(self.next_local_address);
        self.scopes.push(FxHashMap::default());
    }

    pub fn exit_block(&mut self) {
        self.scopes.pop();
        self.next_local_address = self
            .saved_addresses
            .pop()
            .expect("exit_block called without a matching enter_block");
    }

    pub fn next_local_address(&self) -> u32 {
        self.next_local_address
    }

    /// Declares `name` in the innermost scope, returning its address.
    /// Redeclaring a name already present in that same innermost scope is
    /// a `Redefinition` error; a name shadowing an outer scope's binding is
    /// fine.
    pub fn declare(
        &mut self,
        name: Symbol,
        origin: Origin,
        interner: &Interner,
    ) -> CompileResult<u32> {
        let innermost = self.scopes.last_mut().expect("scope stack is never empty");
        if let Some(existing) = innermost.get(&name) {
            return Err(CompileError::redefinition(
                interner.resolve(name),
                existing.origin,
                origin,
            ));
        }
        let address = self.next_local_address;
        innermost.insert(name, VariableSymbol { address, origin });
        self.next_local_address += VARIABLE_SIZE;
        Ok(address)
    }

    /// Looks up `name`, scanning from the innermost scope outward.
    pub fn lookup(&self, name: Symbol) -> Option<&VariableSymbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(&name))
    }
}

impl Default for VariableScope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadowing_a_name_in_a_nested_block_does_not_error() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let mut scope = VariableScope::new();
        let outer_addr = scope.declare(x, Origin::new(1, 1), &interner).unwrap();
        scope.enter_block();
        let inner_addr = scope.declare(x, Origin::new(2, 1), &interner).unwrap();
        assert_eq!(scope.lookup(x).unwrap().address, inner_addr);
        scope.exit_block();
        assert_eq!(scope.lookup(x).unwrap().address, outer_addr);
        assert_eq!(scope.next_local_address(), VARIABLE_SIZE);
    }

    #[test]
    fn redeclaring_in_the_same_scope_is_a_redefinition_error() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let mut scope = VariableScope::new();
        scope.declare(x, Origin::new(1, 1), &interner).unwrap();
        let err = scope.declare(x, Origin::new(2, 1), &interner).unwrap_err();
        assert!(matches!(err, CompileError::Redefinition { .. }));
    }

    #[test]
    fn addresses_are_sequential_within_a_scope() {
        let mut interner = Interner::new();
        let a = interner.intern("a");
        let b = interner.intern("b");
        let mut scope = VariableScope::new();
        let a_addr = scope.declare(a, Origin::new(1, 1), &interner).unwrap();
        let b_addr = scope.declare(b, Origin::new(1, 2), &interner).unwrap();
        assert_eq!(a_addr, 0);
        assert_eq!(b_addr, VARIABLE_SIZE);
    }
}
