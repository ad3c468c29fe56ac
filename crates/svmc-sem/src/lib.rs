//! svmc-sem — the symbol table.
//!
//! Two independent tables, because the two namespaces nest differently:
//! [`scope::VariableScope`] is a stack that grows and shrinks with lexical
//! blocks, while [`functions::FunctionTable`] is a single flat map for the
//! whole program (functions only ever live at top level).

pub mod functions;
pub mod scope;

pub use functions::{FunctionSymbol, FunctionTable, FunctionTarget, ReturnKind};
pub use scope::{VariableScope, VariableSymbol, VARIABLE_SIZE};
