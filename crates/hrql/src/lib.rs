//! Semantic compiler and SQL backend for HRQL (spec §2).
//!
//! Wires the pieces from `hrql-ast`/`hrql-parser` (tokens, AST, function
//! registry) together with the parts that live in this crate: the schema
//! catalog interface, the resolver capability, the semantic compiler, the
//! storage-agnostic `Plan`, the SQL backend, the count estimator, and the
//! generic-list filter micro-language. Mirrors the split between
//! `prqlc-ast`/`prqlc-parser` (syntax) and `prqlc` (semantics + codegen) in
//! the crate this workspace is modeled on.

pub mod compile;
pub mod estimator;
pub mod filter;
pub mod param;
pub mod plan;
pub mod resolver;
pub mod schema;
pub mod sql;
pub mod testing;

pub use hrql_ast::{Error, ErrorKind, Reason, WithErrorInfo};
pub use hrql_parser::{parse, parse_with_limit};

pub type Result<T, E = Error> = std::result::Result<T, E>;
