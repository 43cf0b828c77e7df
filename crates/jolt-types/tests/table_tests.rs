use super::*;
use smallvec::smallvec;

#[test]
fn singletons_are_preseeded() {
    let table = TypeTable::new();
    assert!(matches!(table.kind(TypeId::BOOL), TypeKind::Bool));
    assert!(matches!(
        table.kind(TypeId::I32),
        TypeKind::Int { width: IntWidth::W32, signed: true }
    ));
    assert!(matches!(
        table.kind(TypeId::U64),
        TypeKind::Int { width: IntWidth::W64, signed: false }
    ));
    assert_eq!(table.lookup_named("string"), Some(TypeId::STRING));
}

#[test]
fn int_is_an_alias_of_i32() {
    let table = TypeTable::new();
    let int = table.lookup_named("int").unwrap();
    assert_ne!(int, TypeId::I32);
    assert_eq!(table.resolve_alias(int), TypeId::I32);
    assert!(table.equal(int, TypeId::I32));
}

#[test]
fn object_interning_is_structural() {
    let mut table = TypeTable::new();
    let a = table.intern_object(
        vec![("x".to_string(), TypeId::I32), ("y".to_string(), TypeId::I32)],
        None,
    );
    let b = table.intern_object(
        vec![("x".to_string(), TypeId::I32), ("y".to_string(), TypeId::I32)],
        None,
    );
    assert_eq!(a, b);

    // Field order matters.
    let c = table.intern_object(
        vec![("y".to_string(), TypeId::I32), ("x".to_string(), TypeId::I32)],
        None,
    );
    assert_ne!(a, c);

    // Aliased field types intern to the same shape.
    let int = table.lookup_named("int").unwrap();
    let d = table.intern_object(
        vec![("x".to_string(), int), ("y".to_string(), TypeId::I32)],
        None,
    );
    assert_eq!(a, d);
}

#[test]
fn struct_registration_shares_interned_shape() {
    let mut table = TypeTable::new();
    let point = table
        .register_struct(
            "Point",
            vec![("x".to_string(), TypeId::I32), ("y".to_string(), TypeId::I32)],
            NodeId(7),
        )
        .unwrap();
    let literal = table.intern_object(
        vec![("x".to_string(), TypeId::I32), ("y".to_string(), TypeId::I32)],
        None,
    );
    assert_eq!(point, literal);
    assert_eq!(table.lookup_named("Point"), Some(point));
    assert_eq!(table.display(point), "Point");
}

#[test]
fn duplicate_struct_names_are_rejected() {
    let mut table = TypeTable::new();
    table
        .register_struct("S", vec![("a".to_string(), TypeId::BOOL)], NodeId(1))
        .unwrap();
    let err = table
        .register_struct("S", vec![("b".to_string(), TypeId::I8)], NodeId(2))
        .unwrap_err();
    assert_eq!(err, TypeRegistryError::DuplicateStruct("S".to_string()));
}

#[test]
fn forward_reference_resolves_after_registration() {
    let mut table = TypeTable::new();
    let placeholder = table.named_placeholder("Late");
    assert_eq!(table.resolve_alias(placeholder), TypeId::UNKNOWN);

    let late = table
        .register_struct("Late", vec![("v".to_string(), TypeId::F64)], NodeId(3))
        .unwrap();
    assert_eq!(table.resolve_alias(placeholder), late);
    assert!(table.undefined_named().is_empty());
}

#[test]
fn unresolved_names_are_listed() {
    let mut table = TypeTable::new();
    table.named_placeholder("Ghost");
    let undefined = table.undefined_named();
    assert_eq!(undefined.len(), 1);
    assert_eq!(undefined[0].0, "Ghost");
}

#[test]
fn recursive_alias_is_rejected() {
    let mut table = TypeTable::new();
    let a = table.register_alias("A", TypeId::I32).unwrap();
    let b = table.register_alias("B", a).unwrap();
    // C -> B -> A -> i32 is fine.
    table.register_alias("C", b).unwrap();
    // B -> ... -> B cycles.
    let err = table.register_alias("B", b).unwrap_err();
    assert_eq!(err, TypeRegistryError::RecursiveAlias("B".to_string()));
}

#[test]
fn arrays_and_refs_are_interned() {
    let mut table = TypeTable::new();
    let int = table.lookup_named("int").unwrap();
    let a1 = table.array_of(TypeId::I32);
    let a2 = table.array_of(int);
    assert_eq!(a1, a2);
    assert_eq!(table.array_element(a1), Some(TypeId::I32));

    let r1 = table.ref_to(a1, false);
    let r2 = table.ref_to(a2, false);
    let r3 = table.ref_to(a1, true);
    assert_eq!(r1, r2);
    assert_ne!(r1, r3);
    // Indexing through a ref-to-array reaches the element type.
    assert_eq!(table.array_element(r1), Some(TypeId::I32));
}

#[test]
fn specialization_lookup_matches_under_aliases() {
    let mut table = TypeTable::new();
    let int = table.lookup_named("int").unwrap();
    let f = table.create_function(FunctionType {
        name: "id".to_string(),
        params: smallvec![TypeId::UNKNOWN],
        ret: TypeId::UNKNOWN,
        variadic: false,
        decl: NodeId(0),
        specializations: Vec::new(),
    });
    table.function_mut(f).unwrap().specializations.push(Specialization {
        mangled: "id$i32".to_string(),
        params: smallvec![TypeId::I32],
        ret: TypeId::I32,
        body: NodeId(9),
    });

    assert_eq!(table.find_specialization(f, &[TypeId::I32]), Some(0));
    assert_eq!(table.find_specialization(f, &[int]), Some(0));
    assert_eq!(table.find_specialization(f, &[TypeId::F64]), None);
    assert_eq!(table.find_specialization(f, &[]), None);
}

#[test]
fn fully_typed_requires_no_unknowns() {
    let typed = FunctionType {
        name: "f".to_string(),
        params: smallvec![TypeId::I32, TypeId::STRING],
        ret: TypeId::VOID,
        variadic: false,
        decl: NodeId(0),
        specializations: Vec::new(),
    };
    assert!(typed.is_fully_typed());

    let untyped = FunctionType {
        params: smallvec![TypeId::UNKNOWN],
        ..typed.clone()
    };
    assert!(!untyped.is_fully_typed());
}

#[test]
fn mangled_names_use_resolved_type_names() {
    let mut table = TypeTable::new();
    let int = table.lookup_named("int").unwrap();
    assert_eq!(table.mangle("id", &[int]), "id$i32");
    assert_eq!(table.mangle("add", &[TypeId::F64, TypeId::STRING]), "add$f64_string");
    assert_eq!(table.mangle("main", &[]), "main$");
}

#[test]
fn method_registration_and_lookup() {
    let mut table = TypeTable::new();
    let point = table
        .register_struct("Point", vec![("x".to_string(), TypeId::I32)], NodeId(1))
        .unwrap();
    let f = table.create_function(FunctionType {
        name: "norm".to_string(),
        params: smallvec![],
        ret: TypeId::UNKNOWN,
        variadic: false,
        decl: NodeId(2),
        specializations: Vec::new(),
    });
    table.register_method(point, "norm", f).unwrap();
    assert_eq!(table.method(point, "norm"), Some(f));
    assert_eq!(table.method(point, "missing"), None);
    assert!(table.register_method(point, "norm", f).is_err());
}
