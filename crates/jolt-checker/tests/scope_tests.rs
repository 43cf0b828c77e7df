use super::*;
use jolt_types::{NodeId, TypeId};

#[test]
fn lookup_walks_parent_chain() {
    let mut arena = ScopeArena::new();
    let outer = arena.new_scope(None);
    let inner = arena.new_scope(Some(outer));

    let sym = arena
        .insert(outer, Symbol::new("g", NodeId(1), TypeId::I32, false))
        .unwrap();

    assert_eq!(arena.lookup(inner, "g"), Some(sym));
    assert_eq!(arena.lookup_local(inner, "g"), None);
    assert_eq!(arena.lookup(inner, "missing"), None);
}

#[test]
fn inner_scope_shadows_outer() {
    let mut arena = ScopeArena::new();
    let outer = arena.new_scope(None);
    let inner = arena.new_scope(Some(outer));

    let outer_sym = arena
        .insert(outer, Symbol::new("x", NodeId(1), TypeId::I32, false))
        .unwrap();
    let inner_sym = arena
        .insert(inner, Symbol::new("x", NodeId(2), TypeId::STRING, false))
        .unwrap();

    assert_eq!(arena.lookup(inner, "x"), Some(inner_sym));
    assert_eq!(arena.lookup(outer, "x"), Some(outer_sym));
}

#[test]
fn same_scope_shadowing_is_allowed_for_mutables() {
    let mut arena = ScopeArena::new();
    let scope = arena.new_scope(None);

    arena
        .insert(scope, Symbol::new("x", NodeId(1), TypeId::I32, false))
        .unwrap();
    let second = arena
        .insert(scope, Symbol::new("x", NodeId(2), TypeId::F64, false))
        .unwrap();
    assert_eq!(arena.lookup(scope, "x"), Some(second));
}

#[test]
fn const_collision_is_a_duplicate_declaration() {
    let mut arena = ScopeArena::new();
    let scope = arena.new_scope(None);

    arena
        .insert(scope, Symbol::new("k", NodeId(1), TypeId::I32, true))
        .unwrap();
    // Shadowing a const fails either way around.
    assert!(
        arena
            .insert(scope, Symbol::new("k", NodeId(2), TypeId::I32, false))
            .is_err()
    );
    let mut arena2 = ScopeArena::new();
    let scope2 = arena2.new_scope(None);
    arena2
        .insert(scope2, Symbol::new("k", NodeId(1), TypeId::I32, false))
        .unwrap();
    assert!(
        arena2
            .insert(scope2, Symbol::new("k", NodeId(2), TypeId::I32, true))
            .is_err()
    );
}

#[test]
fn symbols_keep_declaration_back_pointers() {
    let mut arena = ScopeArena::new();
    let scope = arena.new_scope(None);
    let mut symbol = Symbol::new("buf", NodeId(9), TypeId::UNKNOWN, false);
    symbol.array_size = Some(16);
    let id = arena.insert(scope, symbol).unwrap();

    let stored = arena.symbol(id);
    assert_eq!(stored.decl, NodeId(9));
    assert_eq!(stored.array_size, Some(16));
    assert_eq!(stored.backend_slot, None);

    arena.symbol_mut(id).ty = TypeId::I64;
    assert_eq!(arena.symbol(id).ty, TypeId::I64);
}
