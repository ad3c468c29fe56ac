//! svmc-opt — AST tree rewriters.
//!
//! The optimizer only ever touches the AST the parser produced; it has no
//! notion of a control-flow graph, a basic block, or an SSA value, so there
//! is nothing here resembling a MIR. Rewrites compose into a fixed default
//! pipeline: unary-plus elision, double-negation collapse, then a composite
//! trivial-arithmetic/constant-folding pass.

pub mod passes;

pub use passes::optimize;
