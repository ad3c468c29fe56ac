//! svmc-lex — the tokenizer.
//!
//! Turns source text into a flat sequence of [`token::Token`]s in a single
//! forward pass. The only state carried across characters is the current
//! line/column and the previously emitted token, which the tokenizer needs
//! to decide whether a `+`/`-` is binary or unary.

pub mod lexer;
pub mod token;

pub use lexer::Lexer;
pub use token::{BinOpKind, CompOpKind, Keyword, ParenKind, Token, TokenKind, UnOpKind};
