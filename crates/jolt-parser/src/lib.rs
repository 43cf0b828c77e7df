//! Parser and AST types for the Jolt compiler.
//!
//! This crate provides:
//! - `NodeArena` / `NodeKind` - The syntax tree, stored as an index arena
//! - `ParserState` - Recursive-descent parser with Pratt expression parsing
//!
//! The parser owns a `TypeTable` for the duration of the parse: type
//! annotations and anonymous object types are registered as they are
//! encountered, so the tree carries `TypeId` handles from the start.

pub mod ast;
pub mod parser;

pub use ast::{
    BinaryOp, DeclKind, FieldDef, IncDecOp, Node, NodeArena, NodeKind, NumberValue, Param,
    UnaryOp,
};
pub use jolt_types::NodeId;
pub use parser::ParserState;
