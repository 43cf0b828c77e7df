use jolt_common::{DiagnosticContext, Severity, diagnostic_codes};
use jolt_parser::ast::{NodeArena, NodeKind};
use jolt_parser::parser::ParserState;
use jolt_types::{NodeId, TypeId, TypeTable};

use crate::scope::{ScopeArena, SymbolId};
use crate::state::CheckerState;

struct Checked {
    arena: NodeArena,
    types: TypeTable,
    scopes: ScopeArena,
    diags: DiagnosticContext,
    program: NodeId,
    iterations: u32,
}

fn run_engine(source: &str) -> Checked {
    let mut parser = ParserState::new("test.jolt", source);
    let program = parser.parse_program();
    let (mut arena, mut types, mut diags) = parser.into_parts();
    let mut scopes = ScopeArena::new();
    let iterations = {
        let mut checker = CheckerState::new(&mut arena, &mut types, &mut scopes, &mut diags);
        checker.check(program);
        checker.iterations
    };
    Checked {
        arena,
        types,
        scopes,
        diags,
        program,
        iterations,
    }
}

/// The function type bound to a top-level function named `name`.
fn function_type(checked: &Checked, name: &str) -> TypeId {
    let NodeKind::Program { scope, .. } = &checked.arena.get(checked.program).kind else {
        panic!("not a program");
    };
    let scope = crate::scope::ScopeId(scope.unwrap());
    let sym = checked
        .scopes
        .lookup(scope, name)
        .unwrap_or_else(|| panic!("no symbol '{name}'"));
    checked.scopes.symbol(sym).ty
}

fn error_messages(checked: &Checked) -> Vec<String> {
    checked
        .diags
        .diagnostics()
        .iter()
        .map(|d| d.message.clone())
        .collect()
}

// =============================================================================
// End-to-end scenarios
// =============================================================================

#[test]
fn globals_are_visible_inside_functions() {
    let checked = run_engine("var G = 0; function p() { return G; }");
    assert!(
        !checked.diags.has_errors(),
        "unexpected: {:?}",
        error_messages(&checked)
    );
    let p = function_type(&checked, "p");
    let f = checked.types.function(p).unwrap();
    assert_eq!(f.ret, TypeId::I32, "inferred return type of p");

    // The reference to G inside p resolved to the module-scope symbol.
    let mut found = false;
    for id in checked.arena.ids() {
        if let NodeKind::Ident {
            name,
            symbol: Some(sym),
        } = &checked.arena.get(id).kind
        {
            if name == "G" {
                let symbol = checked.scopes.symbol(SymbolId(*sym));
                assert!(matches!(
                    checked.arena.get(symbol.decl).kind,
                    NodeKind::VarDecl { .. }
                ));
                found = true;
            }
        }
    }
    assert!(found, "no resolved reference to G");
}

#[test]
fn call_sites_mint_one_specialization_per_type_tuple() {
    let checked =
        run_engine("function id(x) { return x; } id(1); id(3.14); id(\"a\"); id(2);");
    assert!(
        !checked.diags.has_errors(),
        "unexpected: {:?}",
        error_messages(&checked)
    );
    let id_ty = function_type(&checked, "id");
    let f = checked.types.function(id_ty).unwrap();
    assert_eq!(f.specializations.len(), 3, "i32, f64, string");

    let params: Vec<Vec<TypeId>> = f
        .specializations
        .iter()
        .map(|s| s.params.to_vec())
        .collect();
    assert!(params.contains(&vec![TypeId::I32]));
    assert!(params.contains(&vec![TypeId::F64]));
    assert!(params.contains(&vec![TypeId::STRING]));

    let mangled: Vec<&str> = f
        .specializations
        .iter()
        .map(|s| s.mangled.as_str())
        .collect();
    assert!(mangled.contains(&"id$i32"));
    assert!(mangled.contains(&"id$f64"));
    assert!(mangled.contains(&"id$string"));

    // Each specialization returned its parameter type, and each call
    // site carries the matching resolved type.
    for spec in &f.specializations {
        assert_eq!(spec.ret, spec.params[0]);
    }
    let mut call_types = Vec::new();
    for id in checked.arena.ids() {
        if matches!(checked.arena.get(id).kind, NodeKind::Call { .. }) {
            call_types.push(checked.arena.ty(id));
        }
    }
    assert_eq!(
        call_types,
        [TypeId::I32, TypeId::F64, TypeId::STRING, TypeId::I32]
    );
}

#[test]
fn const_mutation_is_rejected_once_at_the_mutation() {
    let checked = run_engine("const a = 10; a++;");
    assert_eq!(checked.diags.count(Severity::Error), 1);
    let diag = &checked.diags.diagnostics()[0];
    assert_eq!(diag.message, "Cannot modify const variable");
    assert_eq!(diag.code, diagnostic_codes::CONST_ASSIGNMENT);
    // Reported at the `a++` expression, not at the declaration.
    assert_eq!(diag.span.start, 14);
}

#[test]
fn undefined_variable_produces_exactly_one_diagnostic() {
    let checked = run_engine("function f() { return z; }");
    assert_eq!(checked.diags.count(Severity::Error), 1);
    let diag = &checked.diags.diagnostics()[0];
    assert_eq!(diag.code, diagnostic_codes::UNDEFINED_VARIABLE);
    assert_eq!(diag.message, "undefined variable 'z'");
}

#[test]
fn second_engine_run_is_idempotent() {
    let source = "function id(x) { return x; } id(1); id(\"s\");\nvar g = id(2);";
    let mut parser = ParserState::new("test.jolt", source);
    let program = parser.parse_program();
    let (mut arena, mut types, mut diags) = parser.into_parts();
    let mut scopes = ScopeArena::new();

    {
        let mut checker = CheckerState::new(&mut arena, &mut types, &mut scopes, &mut diags);
        checker.check(program);
    }
    assert!(!diags.has_errors());
    let specs_before = types.len();
    let diags_before = diags.total();

    {
        let mut checker = CheckerState::new(&mut arena, &mut types, &mut scopes, &mut diags);
        checker.check(program);
    }
    assert_eq!(types.len(), specs_before, "no new types on second run");
    assert_eq!(diags.total(), diags_before, "no new diagnostics");
}

// =============================================================================
// Operator and rule coverage
// =============================================================================

#[test]
fn integer_promotion_follows_the_wider_operand() {
    let checked = run_engine("var a: i8 = 1i8; var b: i32 = 2; var c = a + b; c;");
    assert!(!checked.diags.has_errors());
    // `c` adopted the promoted type.
    for id in checked.arena.ids() {
        if let NodeKind::VarDecl { name, symbol, .. } = &checked.arena.get(id).kind {
            if name == "c" {
                let sym = checked.scopes.symbol(SymbolId(symbol.unwrap()));
                assert_eq!(sym.ty, TypeId::I32);
            }
        }
    }
}

#[test]
fn mixed_signedness_is_an_error() {
    let checked = run_engine("var a: i32 = 1; var b: u32 = 2; a + b;");
    assert!(checked.diags.has_errors());
    assert!(
        checked
            .diags
            .diagnostics()
            .iter()
            .any(|d| d.code == diagnostic_codes::INTEGER_MIX)
    );
}

#[test]
fn integer_float_mixing_is_an_error() {
    let checked = run_engine("1 + 2.5;");
    assert!(checked.diags.has_errors());
    assert!(
        error_messages(&checked)
            .iter()
            .any(|m| m.contains("integer and floating-point"))
    );
}

#[test]
fn string_concatenation_only_for_two_strings() {
    let good = run_engine("\"a\" + \"b\";");
    assert!(!good.diags.has_errors());

    let bad = run_engine("\"a\" - \"b\";");
    assert!(bad.diags.has_errors());
    assert!(
        bad.diags
            .diagnostics()
            .iter()
            .any(|d| d.code == diagnostic_codes::INVALID_OPERAND)
    );
}

#[test]
fn logical_operators_require_bool() {
    let checked = run_engine("1 && true;");
    assert!(checked.diags.has_errors());
    assert!(
        checked
            .diags
            .diagnostics()
            .iter()
            .any(|d| d.code == diagnostic_codes::NON_BOOL_OPERAND)
    );
}

#[test]
fn comparisons_yield_bool() {
    let checked = run_engine("var ok = 1 < 2; function f(): bool { return 3 == 4; }");
    assert!(!checked.diags.has_errors());
}

#[test]
fn return_type_join_mismatch_is_reported() {
    let checked = run_engine("function f(c: bool) { if (c) { return 1; } return \"s\"; }");
    assert!(checked.diags.has_errors());
    assert!(
        error_messages(&checked)
            .iter()
            .any(|m| m.contains("return type mismatch"))
    );
}

#[test]
fn function_without_returns_is_void() {
    let checked = run_engine("function noop(x: i32) { x + 1; }");
    assert!(!checked.diags.has_errors());
    let f_ty = function_type(&checked, "noop");
    assert_eq!(checked.types.function(f_ty).unwrap().ret, TypeId::VOID);
}

#[test]
fn fully_typed_function_checks_arguments() {
    let checked = run_engine("function add(a: i32, b: i32): i32 { return a + b; } add(1, \"x\");");
    assert!(checked.diags.has_errors());
    assert!(
        error_messages(&checked)
            .iter()
            .any(|m| m.contains("argument 2 to 'add'"))
    );
}

#[test]
fn arity_mismatch_is_reported() {
    let checked = run_engine("function one(a: i32): i32 { return a; } one(1, 2);");
    assert!(checked.diags.has_errors());
    assert!(
        error_messages(&checked)
            .iter()
            .any(|m| m.contains("expects 1 argument(s), found 2"))
    );
}

#[test]
fn external_functions_require_full_annotations() {
    let checked = run_engine("external function foo(a): i32;");
    assert!(checked.diags.has_errors());
    assert!(
        checked
            .diags
            .diagnostics()
            .iter()
            .any(|d| d.code == diagnostic_codes::EXTERNAL_MISSING_ANNOTATION)
    );

    let good = run_engine("external function printf(fmt: string, ...): i32; printf(\"hi\", 1);");
    assert!(!good.diags.has_errors(), "{:?}", error_messages(&good));
}

#[test]
fn struct_literal_shares_the_struct_type() {
    let checked = run_engine(
        "struct Point { x: i32; y: i32; }\nvar p: Point = { x: 1, y: 2 };\nvar q = p.x;",
    );
    assert!(
        !checked.diags.has_errors(),
        "unexpected: {:?}",
        error_messages(&checked)
    );
}

#[test]
fn object_literals_with_equal_shape_share_one_type() {
    let checked = run_engine("var a = { n: 1 }; var b = { n: 2 };");
    assert!(!checked.diags.has_errors());
    let mut literal_types = Vec::new();
    for id in checked.arena.ids() {
        if matches!(checked.arena.get(id).kind, NodeKind::ObjectLit { .. }) {
            literal_types.push(checked.arena.ty(id));
        }
    }
    assert_eq!(literal_types.len(), 2);
    assert_eq!(literal_types[0], literal_types[1], "handle equality");
}

#[test]
fn unknown_member_is_reported() {
    let checked = run_engine("var p = { x: 1 }; p.y;");
    assert!(checked.diags.has_errors());
    assert!(
        checked
            .diags
            .diagnostics()
            .iter()
            .any(|d| d.code == diagnostic_codes::UNKNOWN_MEMBER)
    );
}

#[test]
fn methods_bind_self_and_specialize() {
    let source = "struct Point {\n  x: i32;\n  function shifted(d) { return self.x + d; }\n}\nvar p: Point = { x: 3 };\nvar s = p.shifted(4);";
    let checked = run_engine(source);
    assert!(
        !checked.diags.has_errors(),
        "unexpected: {:?}",
        error_messages(&checked)
    );
    for id in checked.arena.ids() {
        if let NodeKind::VarDecl { name, symbol, .. } = &checked.arena.get(id).kind {
            if name == "s" {
                let sym = checked.scopes.symbol(SymbolId(symbol.unwrap()));
                assert_eq!(sym.ty, TypeId::I32);
            }
        }
    }
}

#[test]
fn indexing_requires_integer_index() {
    let checked = run_engine("var xs = [1, 2, 3]; xs[\"a\"];");
    assert!(checked.diags.has_errors());
    assert!(
        checked
            .diags
            .diagnostics()
            .iter()
            .any(|d| d.code == diagnostic_codes::NON_INTEGER_INDEX)
    );

    let good = run_engine("var xs = [1, 2, 3]; var first = xs[0]; first + 1;");
    assert!(!good.diags.has_errors(), "{:?}", error_messages(&good));
}

#[test]
fn duplicate_const_declaration_is_rejected() {
    let checked = run_engine("const k = 1; const k = 2;");
    assert!(checked.diags.has_errors());
    assert!(
        checked
            .diags
            .diagnostics()
            .iter()
            .any(|d| d.code == diagnostic_codes::DUPLICATE_DECLARATION)
    );
}

#[test]
fn shadowing_in_inner_scopes_is_allowed() {
    let checked = run_engine("var x = 1; { var x = \"s\"; x + \"!\"; } x + 1;");
    assert!(
        !checked.diags.has_errors(),
        "unexpected: {:?}",
        error_messages(&checked)
    );
}

#[test]
fn unknown_annotation_type_is_reported() {
    let checked = run_engine("var p: Mystery;");
    assert!(checked.diags.has_errors());
    assert!(
        checked
            .diags
            .diagnostics()
            .iter()
            .any(|d| d.code == diagnostic_codes::UNKNOWN_TYPE && d.message.contains("Mystery"))
    );
}

#[test]
fn inference_converges_quickly_on_chained_functions() {
    let source = "function a() { return b(); } function b() { return c(); } function c() { return 7; } var r = a();";
    let checked = run_engine(source);
    assert!(
        !checked.diags.has_errors(),
        "unexpected: {:?}",
        error_messages(&checked)
    );
    let a_ty = function_type(&checked, "a");
    assert_eq!(checked.types.function(a_ty).unwrap().ret, TypeId::I32);
    assert!(checked.iterations <= 8, "took {}", checked.iterations);
}

#[test]
fn loop_conditions_must_be_bool() {
    let checked = run_engine("while (1) { }");
    assert!(checked.diags.has_errors());
    assert!(
        error_messages(&checked)
            .iter()
            .any(|m| m.contains("while condition must be 'bool'"))
    );

    let good = run_engine("var n = 0; while (n < 3) { n = n + 1; }");
    assert!(!good.diags.has_errors(), "{:?}", error_messages(&good));
}

#[test]
fn break_outside_a_loop_is_reported() {
    let checked = run_engine("break;");
    assert!(checked.diags.has_errors());
    assert!(
        error_messages(&checked)
            .iter()
            .any(|m| m.contains("'break' outside of a loop"))
    );

    let good = run_engine("for (var i = 0; i < 3; i++) { if (i == 1) { break; } }");
    assert!(!good.diags.has_errors(), "{:?}", error_messages(&good));
}

#[test]
fn for_header_declarations_are_scoped_to_the_loop() {
    let checked = run_engine("for (var i = 0; i < 3; i++) { i; }\ni;");
    // The trailing `i` is outside the loop header's scope.
    assert!(checked.diags.has_errors());
    assert!(
        checked
            .diags
            .diagnostics()
            .iter()
            .any(|d| d.code == diagnostic_codes::UNDEFINED_VARIABLE)
    );
}

#[test]
fn compound_assignment_respects_operand_rules() {
    let good = run_engine("var x = 1; x += 2; x <<= 1; x %= 3;");
    assert!(!good.diags.has_errors(), "{:?}", error_messages(&good));

    let bad = run_engine("var s = \"a\"; s -= \"b\";");
    assert!(bad.diags.has_errors());

    let mixed = run_engine("var x = 1; x += 2.5;");
    assert!(mixed.diags.has_errors());
    assert!(
        error_messages(&mixed)
            .iter()
            .any(|m| m.contains("integer and floating-point"))
    );
}

#[test]
fn shift_requires_integer_operands() {
    let checked = run_engine("1.5 << 2;");
    assert!(checked.diags.has_errors());
    assert!(
        checked
            .diags
            .diagnostics()
            .iter()
            .any(|d| d.code == diagnostic_codes::INVALID_OPERAND)
    );
}

#[test]
fn negating_an_unsigned_integer_is_rejected() {
    let checked = run_engine("var u: u32 = 5u32; -u;");
    assert!(checked.diags.has_errors());
    assert!(
        error_messages(&checked)
            .iter()
            .any(|m| m.contains("cannot negate an unsigned integer"))
    );
}

#[test]
fn annotated_method_bodies_are_checked_without_calls() {
    // `scaled` is fully annotated, so its body is checked even though
    // nothing calls it; `self` resolves to the struct type.
    let source =
        "struct Box { w: i32; function scaled(k: i32): i32 { return self.w * k; } }";
    let checked = run_engine(source);
    assert!(
        !checked.diags.has_errors(),
        "unexpected: {:?}",
        error_messages(&checked)
    );

    let bad = "struct Box { w: i32; function broken(k: i32): i32 { return self.missing; } }";
    let checked = run_engine(bad);
    assert!(checked.diags.has_errors());
    assert!(
        checked
            .diags
            .diagnostics()
            .iter()
            .any(|d| d.code == diagnostic_codes::UNKNOWN_MEMBER)
    );
}

#[test]
fn assignment_through_ref_annotated_variables_type_checks() {
    let checked = run_engine(
        "var xs: ref i32[]; function first(v: ref i32[]) { return v[0]; }",
    );
    assert!(
        !checked.diags.has_errors(),
        "unexpected: {:?}",
        error_messages(&checked)
    );
    let f_ty = function_type(&checked, "first");
    assert_eq!(checked.types.function(f_ty).unwrap().ret, TypeId::I32);
}

#[test]
fn runaway_specialization_is_capped_with_a_diagnostic() {
    // Each self-call nests the argument type one array level deeper; the
    // engine must stop minting specializations and say which function
    // would not converge.
    let checked = run_engine("function w(x) { return w([x]); } w(1);");
    assert!(checked.diags.has_errors());
    assert!(
        checked
            .diags
            .diagnostics()
            .iter()
            .any(|d| d.code == diagnostic_codes::INFERENCE_NON_CONVERGENCE
                && d.message.contains("'w'"))
    );
}

#[test]
fn ternary_branches_must_agree() {
    let checked = run_engine("var c = true; var r = c ? 1 : \"s\";");
    assert!(checked.diags.has_errors());
    assert!(
        error_messages(&checked)
            .iter()
            .any(|m| m.contains("ternary branches"))
    );
}
