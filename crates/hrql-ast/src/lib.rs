//! Token, error, and AST types shared by the HRQL lexer, parser, and
//! compiler.
//!
//! This crate carries no semantics of its own — no name resolution, no SQL
//! knowledge — only the closed tagged sums the rest of the workspace matches
//! on, following the split between `prql-ast` and `prqlc` in the crate this
//! workspace is modeled on.

mod error;
mod expr;
pub mod registry;
mod span;
mod token;

pub use error::{Error, ErrorKind, Reason, WithErrorInfo};
pub use expr::*;
pub use span::Span;
pub use token::{Token, TokenKind};

pub type Result<T, E = Error> = std::result::Result<T, E>;
