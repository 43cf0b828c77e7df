//! Type engine for the Jolt compiler.
//!
//! This crate provides:
//! - `ScopeArena` / `Symbol` - Lexical scope chains with declaration
//!   back-pointers
//! - `CheckerState` - The multi-pass engine: struct/const/global
//!   collection, function signature capture, literal seeding, and
//!   iterative function specialization over untyped parameters
//!
//! The engine accumulates diagnostics and keeps going; callers gate on
//! `DiagnosticContext::has_errors()` before consuming the typed tree.

pub mod infer;
pub mod scope;
pub mod state;

pub use scope::{Scope, ScopeArena, ScopeId, Symbol, SymbolId};
pub use state::CheckerState;
