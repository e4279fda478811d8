//! Semantic analysis + LLVM IR emission.
//!
//! Walks a parsed [`crate::ast::Program`] and writes one textual LLVM
//! module. There is no separate type-checking pass: types are inferred
//! and validated while emitting, and any semantic error aborts the
//! compilation before a module is produced.
//!
//! # Module structure
//!
//! - `state.rs` - the `CodeGen` struct: buffers, counters, symbol stack,
//!   function table, string pool, expression-type cache
//! - `program.rs` - module assembly, declaration registration, and the
//!   string-literal pre-pass
//! - `statements.rs` - statement and function emission, control flow
//! - `expressions.rs` - expression emission and type inference
//! - `conversions.rs` - the cast table, implicit coercion, default
//!   promotions
//! - `platform.rs` - target triple / datalayout pairs
//!
//! # Naming
//!
//! `%tN` temporaries and `bbN` labels come from monotonic counters that
//! reset at the start of each function, keeping output diffable.

mod conversions;
mod expressions;
mod platform;
mod program;
mod state;
mod statements;

pub use platform::{target_datalayout, target_triple};
pub use state::CodeGen;
