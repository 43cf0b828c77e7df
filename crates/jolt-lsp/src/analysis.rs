//! Self-contained analysis jobs.
//!
//! An `AnalysisWork` bundles everything one inference run needs: the
//! parsed tree, its own type registry and scope arena, the diagnostics,
//! and the source snapshot it was parsed from. Nothing inside is shared
//! across threads; ownership of the whole box moves between the I/O
//! loop, the queue, and the worker.

use jolt_checker::{CheckerState, ScopeArena};
use jolt_common::diagnostics::LspDiagnostic;
use jolt_common::{DiagnosticContext, LineMap};
use jolt_index::CodeIndex;
use jolt_parser::ast::NodeArena;
use jolt_parser::parser::ParserState;
use jolt_types::{NodeId, TypeTable};

pub struct AnalysisWork {
    pub uri: String,
    pub version: i32,
    pub source: String,
    pub line_map: LineMap,
    pub arena: NodeArena,
    pub program: NodeId,
    pub types: TypeTable,
    pub scopes: ScopeArena,
    pub diags: DiagnosticContext,
}

impl AnalysisWork {
    /// Parse `source` without running type inference.
    #[must_use]
    pub fn parse(uri: &str, version: i32, source: &str) -> Self {
        let mut parser = ParserState::new(uri, source);
        let program = parser.parse_program();
        let (arena, types, diags) = parser.into_parts();
        Self {
            uri: uri.to_string(),
            version,
            source: source.to_string(),
            line_map: LineMap::build(source),
            arena,
            program,
            types,
            scopes: ScopeArena::new(),
            diags,
        }
    }

    /// Run the full type engine over the parsed tree.
    pub fn run_inference(&mut self) {
        let mut checker = CheckerState::new(
            &mut self.arena,
            &mut self.types,
            &mut self.scopes,
            &mut self.diags,
        );
        checker.check(self.program);
    }

    /// Build a position index from the current (typed or untyped) tree.
    #[must_use]
    pub fn build_index(&self) -> CodeIndex {
        CodeIndex::build(
            &self.arena,
            &self.scopes,
            self.program,
            &self.source,
            &self.line_map,
        )
    }

    /// Diagnostics in the LSP wire shape.
    #[must_use]
    pub fn lsp_diagnostics(&self) -> Vec<LspDiagnostic> {
        self.diags.to_lsp(&self.line_map, &self.source)
    }
}
