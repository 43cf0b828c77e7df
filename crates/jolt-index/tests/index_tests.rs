use super::*;
use jolt_checker::{CheckerState, ScopeArena};
use jolt_common::{LineMap, Position};
use jolt_parser::ast::NodeArena;
use jolt_parser::parser::ParserState;
use jolt_types::NodeId;

fn build_index(source: &str, infer: bool) -> (CodeIndex, NodeArena, ScopeArena) {
    let mut parser = ParserState::new("test.jolt", source);
    let program = parser.parse_program();
    let (mut arena, mut types, mut diags) = parser.into_parts();
    let mut scopes = ScopeArena::new();
    if infer {
        let mut checker = CheckerState::new(&mut arena, &mut types, &mut scopes, &mut diags);
        checker.check(program);
        assert!(!diags.has_errors(), "{:?}", diags.diagnostics());
    }
    let line_map = LineMap::build(source);
    let index = CodeIndex::build(&arena, &scopes, program, source, &line_map);
    (index, arena, scopes)
}

fn entry_at(index: &CodeIndex, line: u32, character: u32) -> Option<CodeInfoId> {
    index
        .find_at_position(Position::new(line, character))
        .map(|e| e.info)
}

#[test]
fn definitions_are_collected_for_all_decl_kinds() {
    let source = "var g = 1;\nfunction f() { return g; }\nstruct S { a: i32; }";
    let (index, _, _) = build_index(source, true);
    assert_eq!(index.definition_count(), 3);

    let kinds: Vec<CodeInfoKind> = index
        .entries()
        .iter()
        .filter(|e| e.is_definition)
        .map(|e| index.info(e.info).kind)
        .collect();
    assert!(kinds.contains(&CodeInfoKind::Variable));
    assert!(kinds.contains(&CodeInfoKind::Function));
    assert!(kinds.contains(&CodeInfoKind::Struct));
}

#[test]
fn reference_resolves_to_declaration() {
    // let x = 1;
    // x;
    let source = "let x = 1;\nx;";
    let (index, arena, _) = build_index(source, true);

    // Position of the second `x` (line 1, col 0).
    let entry = index.find_at_position(Position::new(1, 0)).expect("entry");
    assert!(!entry.is_definition);
    let info = index.info(entry.info);
    assert_eq!(info.name, "x");
    assert_eq!(info.decl_range.start.line, 0);
    assert_eq!(info.decl_range.start.character, 4);
    assert!(matches!(
        arena.get(info.decl).kind,
        jolt_parser::ast::NodeKind::VarDecl { .. }
    ));
}

#[test]
fn entries_are_sorted_by_position() {
    let source = "var a = 1;\nvar b = a;\nvar c = a + b;";
    let (index, _, _) = build_index(source, true);
    let starts: Vec<(u32, u32)> = index
        .entries()
        .iter()
        .map(|e| (e.range.start.line, e.range.start.character))
        .collect();
    let mut sorted = starts.clone();
    sorted.sort();
    assert_eq!(starts, sorted);
}

#[test]
fn find_at_position_is_self_consistent() {
    let source = "var g = 1;\nfunction f(n: i32) { return g + n; }\nf(2);";
    let (index, _, _) = build_index(source, true);
    for entry in index.entries() {
        let found = index
            .find_at_position(entry.range.start)
            .unwrap_or_else(|| panic!("lookup failed at {:?}", entry.range.start));
        assert_eq!(found.info, entry.info);
    }
}

#[test]
fn references_of_links_all_occurrences() {
    let source = "var g = 1;\nfunction f() { return g; }\ng;";
    let (index, _, _) = build_index(source, true);
    // Find g's definition entry.
    let def = index
        .entries()
        .iter()
        .find(|e| e.is_definition && index.info(e.info).name == "g")
        .expect("definition of g");

    let refs = index.references_of(def.info, false);
    assert_eq!(refs.len(), 2, "one from f's body, one at top level");
    let with_decl = index.references_of(def.info, true);
    assert_eq!(with_decl.len(), 3);
}

#[test]
fn untyped_index_still_finds_definitions_by_name() {
    // No inference: symbol links are absent, name fallback applies.
    let source = "let x = 1;\nx;";
    let (index, _, _) = build_index(source, false);
    let entry = index.find_at_position(Position::new(1, 0)).expect("entry");
    let info = index.info(entry.info);
    assert_eq!(info.name, "x");
    assert_eq!(info.decl_range.start.line, 0);
}

#[test]
fn parameter_references_resolve_to_the_parameter_name() {
    let source = "function f(value: i32) { return value; }";
    let (index, _, _) = build_index(source, true);
    // The `value` in the body (line 0, col 32).
    let entry = entry_at(&index, 0, 32).expect("reference entry");
    let info = index.info(entry);
    assert_eq!(info.name, "value");
    // Declaration range covers the parameter name, not the function.
    assert_eq!(info.decl_range.start.character, 11);
}

#[test]
fn positions_outside_any_range_return_none() {
    let source = "var a = 1;";
    let (index, _, _) = build_index(source, true);
    assert!(index.find_at_position(Position::new(5, 0)).is_none());
    assert!(index.find_at_position(Position::new(0, 9)).is_none());
}

#[test]
fn specialization_clones_do_not_pollute_the_index() {
    let source = "function id(x) { return x; } id(1); id(\"s\");";
    let (index, _, _) = build_index(source, true);
    // The body exists three times in the arena (original + 2 clones),
    // but the index walks only the program tree: one reference to `x`.
    let x_refs: Vec<_> = index
        .entries()
        .iter()
        .filter(|e| !e.is_definition && index.info(e.info).name == "x")
        .collect();
    assert_eq!(x_refs.len(), 1);
}
