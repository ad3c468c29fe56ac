//! svmc-ast — AST node definitions and the recursive-descent parser that
//! builds them.
//!
//! The grammar has no left recursion to eliminate and no operator-binding-
//! power table to consult: precedence is baked directly into the
//! `Expression`/`Term`/`Factor` production chain, and comparisons only ever
//! occur inside a conditional header, never as a general expression.

pub mod ast;
pub mod parser;

pub use ast::{
    Block, Comparison, Expr, ExprKind, FunctionDefinition, Program, Stmt, StmtKind, Variable,
};
pub use parser::Parser;
