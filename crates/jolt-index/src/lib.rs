//! Position-indexed lookup from identifier occurrences to declarations.
//!
//! A `CodeIndex` is built from a parsed (and usually type-inferred)
//! program: one entry per declaration name and per resolved identifier
//! reference, flattened into a single array sorted by start position.
//! Lookups are a binary search plus a small linear window, so
//! `find_at_position` stays O(log n + k).
//!
//! An index built before inference has no symbol links yet; identifier
//! references then fall back to name matching against the collected
//! definitions, which keeps go-to-definition usable while the worker
//! catches up.

use jolt_checker::{ScopeArena, SymbolId};
use jolt_common::limits::INDEX_LOOKUP_WINDOW;
use jolt_common::{LineMap, Position, Range, Span};
use jolt_parser::ast::{NodeArena, NodeKind};
use jolt_types::{NodeId, TypeId};
use rustc_hash::FxHashMap;

/// What a `CodeInfo` describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodeInfoKind {
    Variable,
    Function,
    Struct,
}

/// Handle into the index's info table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CodeInfoId(pub u32);

/// One declaration known to the index.
#[derive(Clone, Debug)]
pub struct CodeInfo {
    pub name: String,
    pub kind: CodeInfoKind,
    pub ty: TypeId,
    /// The declaration node in the program tree.
    pub decl: NodeId,
    /// Range of the declared name.
    pub decl_range: Range,
}

/// One occurrence: a definition name or a resolved reference.
#[derive(Clone, Debug)]
pub struct IndexEntry {
    pub range: Range,
    pub span: Span,
    pub info: CodeInfoId,
    pub is_definition: bool,
}

/// Sorted position table over one document.
#[derive(Debug, Default)]
pub struct CodeIndex {
    entries: Vec<IndexEntry>,
    infos: Vec<CodeInfo>,
}

struct Builder<'a> {
    arena: &'a NodeArena,
    scopes: &'a ScopeArena,
    line_map: &'a LineMap,
    source: &'a str,
    infos: Vec<CodeInfo>,
    entries: Vec<IndexEntry>,
    /// SymbolId -> info, for resolved references.
    by_symbol: FxHashMap<u32, CodeInfoId>,
    /// Declaration name -> info, the pre-inference fallback.
    by_name: FxHashMap<String, CodeInfoId>,
}

impl CodeIndex {
    /// Build the index for `program`. `scopes` may be empty when
    /// inference has not run; see the module docs for the fallback.
    #[must_use]
    pub fn build(
        arena: &NodeArena,
        scopes: &ScopeArena,
        program: NodeId,
        source: &str,
        line_map: &LineMap,
    ) -> Self {
        let mut builder = Builder {
            arena,
            scopes,
            line_map,
            source,
            infos: Vec::new(),
            entries: Vec::new(),
            by_symbol: FxHashMap::default(),
            by_name: FxHashMap::default(),
        };
        // Definitions first so references (including forward references)
        // can link to them.
        builder.collect_definitions(program);
        builder.collect_references(program);

        let mut entries = builder.entries;
        entries.sort_by_key(|e| (e.range.start.line, e.range.start.character));
        Self {
            entries,
            infos: builder.infos,
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    #[must_use]
    pub fn info(&self, id: CodeInfoId) -> &CodeInfo {
        &self.infos[id.0 as usize]
    }

    /// The entry covering `position`, if any. Binary search over start
    /// positions, then a short linear window on both sides to cope with
    /// overlapping ranges.
    #[must_use]
    pub fn find_at_position(&self, position: Position) -> Option<&IndexEntry> {
        if self.entries.is_empty() {
            return None;
        }
        let key = (position.line, position.character);
        let anchor = self
            .entries
            .partition_point(|e| (e.range.start.line, e.range.start.character) <= key);
        let lo = anchor.saturating_sub(INDEX_LOOKUP_WINDOW + 1);
        let hi = (anchor + INDEX_LOOKUP_WINDOW).min(self.entries.len());
        self.entries[lo..hi]
            .iter()
            .rev()
            .find(|e| e.range.contains(position))
    }

    /// Every occurrence of the declaration behind `info`, optionally
    /// including the definition itself.
    #[must_use]
    pub fn references_of(&self, info: CodeInfoId, include_definition: bool) -> Vec<&IndexEntry> {
        self.entries
            .iter()
            .filter(|e| e.info == info && (include_definition || !e.is_definition))
            .collect()
    }

    #[must_use]
    pub fn definition_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_definition).count()
    }
}

impl Builder<'_> {
    fn range_of(&self, span: Span) -> Range {
        self.line_map.span_to_range(span, self.source)
    }

    fn add_info(
        &mut self,
        name: &str,
        kind: CodeInfoKind,
        ty: TypeId,
        decl: NodeId,
        name_span: Span,
        symbol: Option<u32>,
    ) -> CodeInfoId {
        let id = CodeInfoId(self.infos.len() as u32);
        self.infos.push(CodeInfo {
            name: name.to_string(),
            kind,
            ty,
            decl,
            decl_range: self.range_of(name_span),
        });
        if let Some(raw) = symbol {
            self.by_symbol.insert(raw, id);
        }
        self.by_name.entry(name.to_string()).or_insert(id);
        id
    }

    fn symbol_ty(&self, symbol: Option<u32>) -> TypeId {
        symbol
            .map(|raw| self.scopes.symbol(SymbolId(raw)).ty)
            .unwrap_or(TypeId::UNKNOWN)
    }

    fn collect_definitions(&mut self, node: NodeId) {
        match &self.arena.get(node).kind {
            NodeKind::VarDecl {
                name,
                name_span,
                symbol,
                ..
            } => {
                let ty = self.symbol_ty(*symbol);
                let info =
                    self.add_info(name, CodeInfoKind::Variable, ty, node, *name_span, *symbol);
                self.push_entry(*name_span, info, true);
            }
            NodeKind::FunctionDecl {
                name,
                name_span,
                symbol,
                ..
            } => {
                let ty = self.symbol_ty(*symbol);
                let info =
                    self.add_info(name, CodeInfoKind::Function, ty, node, *name_span, *symbol);
                self.push_entry(*name_span, info, true);
            }
            NodeKind::StructDecl {
                name,
                name_span,
                symbol,
                ..
            } => {
                let ty = self.symbol_ty(*symbol);
                let info =
                    self.add_info(name, CodeInfoKind::Struct, ty, node, *name_span, *symbol);
                self.push_entry(*name_span, info, true);
            }
            _ => {}
        }
        for child in self.arena.children(node) {
            self.collect_definitions(child);
        }
    }

    fn collect_references(&mut self, node: NodeId) {
        if let NodeKind::Ident { name, symbol } = &self.arena.get(node).kind {
            let span = self.arena.get(node).span;
            let info = match symbol {
                Some(raw) => match self.by_symbol.get(raw) {
                    Some(info) => Some(*info),
                    None => {
                        // Resolved to something without a collected
                        // definition (a parameter); synthesize its info
                        // from the symbol's own name span.
                        let sym = self.scopes.symbol(SymbolId(*raw));
                        let name_span = sym.name_span;
                        let ty = sym.ty;
                        let decl = sym.decl;
                        let id = self.add_info(
                            name,
                            CodeInfoKind::Variable,
                            ty,
                            decl,
                            name_span,
                            Some(*raw),
                        );
                        Some(id)
                    }
                },
                None => self.by_name.get(name).copied(),
            };
            if let Some(info) = info {
                self.push_entry(span, info, false);
            }
        }
        for child in self.arena.children(node) {
            self.collect_references(child);
        }
    }

    fn push_entry(&mut self, span: Span, info: CodeInfoId, is_definition: bool) {
        if span.is_dummy() {
            return;
        }
        self.entries.push(IndexEntry {
            range: self.range_of(span),
            span,
            info,
            is_definition,
        });
    }
}

#[cfg(test)]
#[path = "../tests/index_tests.rs"]
mod tests;
