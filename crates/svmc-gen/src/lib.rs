//! svmc-gen — the code generator.
//!
//! Lowers an optimized AST directly to textual stack-machine assembly; there
//! is no further IR and no register allocator, since the target machine has
//! exactly the three registers `AX`/`BX`/`CX` and an operand stack.

pub mod generator;

pub use generator::generate;
