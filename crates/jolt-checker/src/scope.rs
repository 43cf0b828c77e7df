//! Lexical scopes and symbol storage.
//!
//! Scopes form a linked chain through parent indices; symbols live in one
//! arena so declaration back-pointers stay valid however many scopes come
//! and go during iterative inference.

use jolt_common::Span;
use jolt_types::{NodeId, TypeId};
use rustc_hash::FxHashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

/// One named entry: declaration node, resolved type, const flag, optional
/// fixed array size, and a slot for back-end values (opaque here).
#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: String,
    pub decl: NodeId,
    /// Span of the declared name itself (for index queries).
    pub name_span: Span,
    pub ty: TypeId,
    pub is_const: bool,
    pub array_size: Option<u32>,
    pub backend_slot: Option<u64>,
}

impl Symbol {
    #[must_use]
    pub fn new(name: impl Into<String>, decl: NodeId, ty: TypeId, is_const: bool) -> Self {
        Self {
            name: name.into(),
            decl,
            name_span: Span::dummy(),
            ty,
            is_const,
            array_size: None,
            backend_slot: None,
        }
    }

    #[must_use]
    pub fn with_name_span(mut self, span: Span) -> Self {
        self.name_span = span;
        self
    }
}

/// One scope table with a link to its parent.
#[derive(Debug, Default)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    entries: FxHashMap<String, SymbolId>,
}

/// Error returned when an insertion collides with a `const` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateDeclaration;

/// Arena of scopes and symbols for one analysis unit.
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
}

impl ScopeArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a child scope linking to `parent` (or a root scope).
    pub fn new_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent,
            entries: FxHashMap::default(),
        });
        id
    }

    /// Insert into the innermost scope. If the name already exists in
    /// that scope and either entry is a const, the insertion fails with
    /// Duplicate Declaration; otherwise the new entry shadows the old.
    pub fn insert(
        &mut self,
        scope: ScopeId,
        symbol: Symbol,
    ) -> Result<SymbolId, DuplicateDeclaration> {
        if let Some(existing) = self.scopes[scope.0 as usize].entries.get(&symbol.name) {
            let existing = &self.symbols[existing.0 as usize];
            if existing.is_const || symbol.is_const {
                return Err(DuplicateDeclaration);
            }
        }
        let id = SymbolId(self.symbols.len() as u32);
        let name = symbol.name.clone();
        self.symbols.push(symbol);
        self.scopes[scope.0 as usize].entries.insert(name, id);
        Ok(id)
    }

    /// Search from the innermost scope outward; first match wins.
    #[must_use]
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id.0 as usize];
            if let Some(sym) = scope.entries.get(name) {
                return Some(*sym);
            }
            current = scope.parent;
        }
        None
    }

    /// Search only the given scope, without walking parents.
    #[must_use]
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scopes[scope.0 as usize].entries.get(name).copied()
    }

    #[must_use]
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    #[must_use]
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }
}

#[cfg(test)]
#[path = "../tests/scope_tests.rs"]
mod tests;
