//! The function table: a single flat map keyed by name, unlike the nested
//! variable scope stack — the source language has no nested function
//! declarations and no global variables, so one map for the whole program
//! is enough.

use rustc_hash::FxHashMap;
use svmc_util::{CompileError, CompileResult, Interner, Origin, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    Void,
    Number,
}

/// Where a call to this function lowers to: a `CALL <label>` to
/// user-defined code, or a single built-in opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionTarget {
    Label(Symbol),
    Internal(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct FunctionSymbol {
    pub return_kind: ReturnKind,
    pub arity: usize,
    pub origin: Origin,
    pub target: FunctionTarget,
}

pub struct FunctionTable {
    functions: FxHashMap<Symbol, FunctionSymbol>,
}

impl FunctionTable {
    /// A function table pre-loaded with `read`, `print` and `sqrt`.
    pub fn with_builtins(interner: &mut Interner) -> Self {
        let mut functions = FxHashMap::default();
        functions.insert(
            interner.intern("read"),
            FunctionSymbol {
                return_kind: ReturnKind::Number,
                arity: 0,
                origin: Origin::DUMMY,
                target: FunctionTarget::Internal("IN"),
            },
        );
        functions.insert(
            interner.intern("print"),
            FunctionSymbol {
                return_kind: ReturnKind::Void,
                arity: 1,
                origin: Origin::DUMMY,
                target: FunctionTarget::Internal("OUT"),
            },
        );
        functions.insert(
            interner.intern("sqrt"),
            FunctionSymbol {
                return_kind: ReturnKind::Number,
                arity: 1,
                origin: Origin::DUMMY,
                target: FunctionTarget::Internal("SQRT"),
            },
        );
        Self { functions }
    }

    /// Declares a user function. Source functions have no return-type
    /// annotation, so every one is registered as `Number`.
    pub fn declare(
        &mut self,
        name: Symbol,
        arity: usize,
        origin: Origin,
        interner: &Interner,
    ) -> CompileResult<()> {
        if let Some(existing) = self.functions.get(&name) {
            return Err(CompileError::redefinition(
                interner.resolve(name),
                existing.origin,
                origin,
            ));
        }
        self.functions.insert(
            name,
            FunctionSymbol {
                return_kind: ReturnKind::Number,
                arity,
                origin,
                target: FunctionTarget::Label(name),
            },
        );
        Ok(())
    }

    pub fn lookup(&self, name: Symbol) -> Option<&FunctionSymbol> {
        self.functions.get(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_resolve_to_internal_opcodes() {
        let mut interner = Interner::new();
        let table = FunctionTable::with_builtins(&mut interner);
        let print_sym = interner.intern("print");
        let print = table.lookup(print_sym).unwrap();
        assert_eq!(print.target, FunctionTarget::Internal("OUT"));
        assert_eq!(print.return_kind, ReturnKind::Void);
        assert_eq!(print.arity, 1);
    }

    #[test]
    fn redeclaring_a_function_name_is_a_redefinition_error() {
        let mut interner = Interner::new();
        let mut table = FunctionTable::with_builtins(&mut interner);
        let f = interner.intern("f");
        table.declare(f, 0, Origin::new(1, 1), &interner).unwrap();
        let err = table.declare(f, 1, Origin::new(2, 1), &interner).unwrap_err();
        assert!(matches!(err, CompileError::Redefinition { .. }));
    }

    #[test]
    fn redeclaring_a_builtin_name_is_also_rejected() {
        let mut interner = Interner::new();
        let mut table = FunctionTable::with_builtins(&mut interner);
        let print_sym = interner.intern("print");
        let err = table
            .declare(print_sym, 2, Origin::new(1, 1), &interner)
            .unwrap_err();
        assert!(matches!(err, CompileError::Redefinition { .. }));
    }
}
