//! Type registry for the Jolt compiler.
//!
//! All types live in a `TypeTable` arena and are handled through `TypeId`
//! indices; handle equality after alias resolution is the compiler's type
//! equality. Anonymous object types are structurally interned, so two
//! object types with the same ordered field list share one `TypeId`.
//!
//! The table is a value owned by one analysis unit (a compiled program or
//! one LSP analysis job); nothing here is process-global.

pub mod table;

pub use table::{
    FunctionType, IntWidth, NodeId, Specialization, TypeId, TypeKind, TypeRegistryError,
    TypeTable,
};
