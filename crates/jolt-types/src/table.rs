//! The type arena and its interning maps.

use indexmap::IndexMap;
use jolt_common::limits::MAX_ALIAS_DEPTH;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Index of a node in the syntax arena.
///
/// The registry stores these as opaque back-pointers (declaration nodes,
/// function bodies) and never dereferences them itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// Canonical handle for a type. Compare with `TypeTable::equal` (which
/// resolves aliases); raw handle equality is the pointer equality of
/// interned types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const UNKNOWN: TypeId = TypeId(0);
    pub const VOID: TypeId = TypeId(1);
    pub const BOOL: TypeId = TypeId(2);
    pub const F32: TypeId = TypeId(3);
    pub const F64: TypeId = TypeId(4);
    pub const STRING: TypeId = TypeId(5);
    pub const I8: TypeId = TypeId(6);
    pub const I16: TypeId = TypeId(7);
    pub const I32: TypeId = TypeId(8);
    pub const I64: TypeId = TypeId(9);
    pub const U8: TypeId = TypeId(10);
    pub const U16: TypeId = TypeId(11);
    pub const U32: TypeId = TypeId(12);
    pub const U64: TypeId = TypeId(13);

    #[must_use]
    pub const fn is_unknown(self) -> bool {
        self.0 == Self::UNKNOWN.0
    }
}

/// Bit width of a fixed-width integer type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            IntWidth::W8 => 8,
            IntWidth::W16 => 16,
            IntWidth::W32 => 32,
            IntWidth::W64 => 64,
        }
    }
}

/// One concrete typed clone of a function body, bound to a specific tuple
/// of parameter types.
#[derive(Clone, Debug)]
pub struct Specialization {
    /// Mangled name: function name plus parameter type names.
    pub mangled: String,
    pub params: SmallVec<[TypeId; 4]>,
    pub ret: TypeId,
    /// Root of the independently typed body clone.
    pub body: NodeId,
}

/// A function's type: parameter types (possibly Unknown), return type
/// (possibly Unknown), and the specializations minted at call sites.
#[derive(Clone, Debug)]
pub struct FunctionType {
    pub name: String,
    pub params: SmallVec<[TypeId; 4]>,
    pub ret: TypeId,
    pub variadic: bool,
    /// The `FunctionDecl` node this type was created from.
    pub decl: NodeId,
    pub specializations: Vec<Specialization>,
}

impl FunctionType {
    /// Fully typed means no Unknown parameter or return type.
    #[must_use]
    pub fn is_fully_typed(&self) -> bool {
        !self.ret.is_unknown() && self.params.iter().all(|p| !p.is_unknown())
    }
}

/// The stored form of one type.
#[derive(Clone, Debug)]
pub enum TypeKind {
    Unknown,
    Void,
    Bool,
    /// The two floating-point forms; `wide` selects f64.
    Float { wide: bool },
    Str,
    Int { width: IntWidth, signed: bool },
    /// A named alias for another type. A target of `UNKNOWN` marks a
    /// forward reference that has not been defined yet.
    Alias { name: String, target: TypeId },
    Array { element: TypeId },
    Ref { target: TypeId, mutable: bool },
    Object {
        fields: IndexMap<String, TypeId>,
        /// Declaration node of the struct this shape was registered from
        /// (used for field default values); None for anonymous literals.
        decl: Option<NodeId>,
    },
    Function(Box<FunctionType>),
}

/// Errors raised by registration operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRegistryError {
    DuplicateStruct(String),
    DuplicateMethod { type_name: String, method: String },
    RecursiveAlias(String),
}

impl std::fmt::Display for TypeRegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateStruct(name) => write!(f, "duplicate struct declaration '{name}'"),
            Self::DuplicateMethod { type_name, method } => {
                write!(f, "duplicate method '{method}' on '{type_name}'")
            }
            Self::RecursiveAlias(name) => write!(f, "recursive type alias '{name}'"),
        }
    }
}

impl std::error::Error for TypeRegistryError {}

/// Arena of all types for one analysis unit.
pub struct TypeTable {
    types: Vec<TypeKind>,
    /// Structural interning of object types, keyed on the ordered
    /// (name, alias-resolved type) field sequence.
    object_intern: FxHashMap<Vec<(String, TypeId)>, TypeId>,
    array_intern: FxHashMap<TypeId, TypeId>,
    ref_intern: FxHashMap<(TypeId, bool), TypeId>,
    /// Defined named types (structs and built-in names).
    named: FxHashMap<String, TypeId>,
    /// Forward references: alias types awaiting their struct definition.
    pending_named: FxHashMap<String, TypeId>,
    /// Preferred display name per object type (first struct name wins).
    object_names: FxHashMap<TypeId, String>,
    /// Per-type method tables: receiver type -> method name -> function type.
    methods: FxHashMap<TypeId, FxHashMap<String, TypeId>>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    #[must_use]
    pub fn new() -> Self {
        // Order must match the TypeId constants.
        let types = vec![
            TypeKind::Unknown,
            TypeKind::Void,
            TypeKind::Bool,
            TypeKind::Float { wide: false },
            TypeKind::Float { wide: true },
            TypeKind::Str,
            TypeKind::Int { width: IntWidth::W8, signed: true },
            TypeKind::Int { width: IntWidth::W16, signed: true },
            TypeKind::Int { width: IntWidth::W32, signed: true },
            TypeKind::Int { width: IntWidth::W64, signed: true },
            TypeKind::Int { width: IntWidth::W8, signed: false },
            TypeKind::Int { width: IntWidth::W16, signed: false },
            TypeKind::Int { width: IntWidth::W32, signed: false },
            TypeKind::Int { width: IntWidth::W64, signed: false },
        ];
        let mut table = Self {
            types,
            object_intern: FxHashMap::default(),
            array_intern: FxHashMap::default(),
            ref_intern: FxHashMap::default(),
            named: FxHashMap::default(),
            pending_named: FxHashMap::default(),
            object_names: FxHashMap::default(),
            methods: FxHashMap::default(),
        };
        for (name, id) in [
            ("void", TypeId::VOID),
            ("bool", TypeId::BOOL),
            ("f32", TypeId::F32),
            ("f64", TypeId::F64),
            ("string", TypeId::STRING),
        ] {
            table.named.insert(name.to_string(), id);
        }
        // The platform alias: `int` and `i32` are distinct names for the
        // same type under alias resolution.
        table
            .register_alias("int", TypeId::I32)
            .expect("builtin alias cannot cycle");
        table
    }

    #[must_use]
    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.types[id.0 as usize]
    }

    fn push(&mut self, kind: TypeKind) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(kind);
        id
    }

    // =========================================================================
    // Alias handling
    // =========================================================================

    /// Walk alias targets to the first non-alias type. Idempotent. A
    /// pending forward reference resolves to `UNKNOWN`.
    #[must_use]
    pub fn resolve_alias(&self, mut id: TypeId) -> TypeId {
        for _ in 0..MAX_ALIAS_DEPTH {
            match self.kind(id) {
                TypeKind::Alias { target, .. } => {
                    if target.is_unknown() {
                        return TypeId::UNKNOWN;
                    }
                    id = *target;
                }
                _ => return id,
            }
        }
        TypeId::UNKNOWN
    }

    /// Register `name` as an alias of `target`. Cycles are rejected.
    pub fn register_alias(
        &mut self,
        name: &str,
        target: TypeId,
    ) -> Result<TypeId, TypeRegistryError> {
        // Walking the target chain must terminate before the new alias is
        // added; anything that leads back through a pending reference to
        // this name would cycle.
        let mut walk = target;
        for _ in 0..MAX_ALIAS_DEPTH {
            match self.kind(walk) {
                TypeKind::Alias { name: n, target: t } => {
                    if n == name {
                        return Err(TypeRegistryError::RecursiveAlias(name.to_string()));
                    }
                    if t.is_unknown() {
                        break;
                    }
                    walk = *t;
                }
                _ => break,
            }
        }
        let id = self.push(TypeKind::Alias {
            name: name.to_string(),
            target,
        });
        self.named.insert(name.to_string(), id);
        Ok(id)
    }

    // =========================================================================
    // Named types
    // =========================================================================

    /// Look up a defined named type.
    #[must_use]
    pub fn lookup_named(&self, name: &str) -> Option<TypeId> {
        self.named.get(name).copied()
    }

    /// Handle for a named type reference, creating a forward-reference
    /// placeholder when the name is not yet defined.
    pub fn named_placeholder(&mut self, name: &str) -> TypeId {
        if let Some(id) = self.named.get(name) {
            return *id;
        }
        if let Some(id) = self.pending_named.get(name) {
            return *id;
        }
        let id = self.push(TypeKind::Alias {
            name: name.to_string(),
            target: TypeId::UNKNOWN,
        });
        self.pending_named.insert(name.to_string(), id);
        id
    }

    /// Names referenced as types but never defined, with their reference
    /// placeholders.
    #[must_use]
    pub fn undefined_named(&self) -> Vec<(String, TypeId)> {
        let mut out: Vec<_> = self
            .pending_named
            .iter()
            .map(|(n, id)| (n.clone(), *id))
            .collect();
        out.sort();
        out
    }

    /// Register a named struct type. The field structure is interned like
    /// any other object type, so a struct and a matching anonymous object
    /// literal share one handle.
    pub fn register_struct(
        &mut self,
        name: &str,
        fields: Vec<(String, TypeId)>,
        decl: NodeId,
    ) -> Result<TypeId, TypeRegistryError> {
        if self.named.contains_key(name) {
            return Err(TypeRegistryError::DuplicateStruct(name.to_string()));
        }
        let id = self.intern_object(fields, Some(decl));
        self.named.insert(name.to_string(), id);
        self.object_names.entry(id).or_insert_with(|| name.to_string());
        if let Some(placeholder) = self.pending_named.remove(name) {
            self.types[placeholder.0 as usize] = TypeKind::Alias {
                name: name.to_string(),
                target: id,
            };
        }
        Ok(id)
    }

    // =========================================================================
    // Structural interning
    // =========================================================================

    /// Intern an object type by its ordered field structure. Field types
    /// are alias-resolved before keying, so `{n: int}` and `{n: i32}` are
    /// the same object type.
    pub fn intern_object(
        &mut self,
        fields: Vec<(String, TypeId)>,
        decl: Option<NodeId>,
    ) -> TypeId {
        let key: Vec<(String, TypeId)> = fields
            .iter()
            .map(|(n, t)| (n.clone(), self.resolve_alias(*t)))
            .collect();
        if let Some(existing) = self.object_intern.get(&key) {
            return *existing;
        }
        let stored: IndexMap<String, TypeId> = key.iter().cloned().collect();
        let id = self.push(TypeKind::Object {
            fields: stored,
            decl,
        });
        self.object_intern.insert(key, id);
        id
    }

    /// Interned array-of-element type.
    pub fn array_of(&mut self, element: TypeId) -> TypeId {
        let element = self.resolve_alias(element);
        if let Some(existing) = self.array_intern.get(&element) {
            return *existing;
        }
        let id = self.push(TypeKind::Array { element });
        self.array_intern.insert(element, id);
        id
    }

    /// Interned reference type.
    pub fn ref_to(&mut self, target: TypeId, mutable: bool) -> TypeId {
        let target = self.resolve_alias(target);
        if let Some(existing) = self.ref_intern.get(&(target, mutable)) {
            return *existing;
        }
        let id = self.push(TypeKind::Ref { target, mutable });
        self.ref_intern.insert((target, mutable), id);
        id
    }

    // =========================================================================
    // Function types
    // =========================================================================

    /// Function types are keyed by declaration node, never interned.
    pub fn create_function(&mut self, function: FunctionType) -> TypeId {
        self.push(TypeKind::Function(Box::new(function)))
    }

    #[must_use]
    pub fn function(&self, id: TypeId) -> Option<&FunctionType> {
        match self.kind(id) {
            TypeKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn function_mut(&mut self, id: TypeId) -> Option<&mut FunctionType> {
        match &mut self.types[id.0 as usize] {
            TypeKind::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Find a specialization whose parameter types match `args`
    /// element-wise under alias resolution.
    #[must_use]
    pub fn find_specialization(&self, function: TypeId, args: &[TypeId]) -> Option<usize> {
        let f = self.function(function)?;
        f.specializations.iter().position(|s| {
            s.params.len() == args.len()
                && s.params
                    .iter()
                    .zip(args)
                    .all(|(p, a)| self.equal(*p, *a))
        })
    }

    // =========================================================================
    // Methods
    // =========================================================================

    pub fn register_method(
        &mut self,
        receiver: TypeId,
        name: &str,
        function: TypeId,
    ) -> Result<(), TypeRegistryError> {
        let receiver = self.resolve_alias(receiver);
        let type_name = self.display(receiver);
        let table = self.methods.entry(receiver).or_default();
        if table.contains_key(name) {
            return Err(TypeRegistryError::DuplicateMethod {
                type_name,
                method: name.to_string(),
            });
        }
        table.insert(name.to_string(), function);
        Ok(())
    }

    #[must_use]
    pub fn method(&self, receiver: TypeId, name: &str) -> Option<TypeId> {
        let receiver = self.resolve_alias(receiver);
        self.methods.get(&receiver)?.get(name).copied()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Type equality after alias resolution.
    #[must_use]
    pub fn equal(&self, a: TypeId, b: TypeId) -> bool {
        self.resolve_alias(a) == self.resolve_alias(b)
    }

    #[must_use]
    pub fn is_integer(&self, id: TypeId) -> bool {
        matches!(self.kind(self.resolve_alias(id)), TypeKind::Int { .. })
    }

    #[must_use]
    pub fn int_info(&self, id: TypeId) -> Option<(IntWidth, bool)> {
        match self.kind(self.resolve_alias(id)) {
            TypeKind::Int { width, signed } => Some((*width, *signed)),
            _ => None,
        }
    }

    /// The pre-seeded singleton for an integer shape.
    #[must_use]
    pub const fn int_type(&self, width: IntWidth, signed: bool) -> TypeId {
        match (width, signed) {
            (IntWidth::W8, true) => TypeId::I8,
            (IntWidth::W16, true) => TypeId::I16,
            (IntWidth::W32, true) => TypeId::I32,
            (IntWidth::W64, true) => TypeId::I64,
            (IntWidth::W8, false) => TypeId::U8,
            (IntWidth::W16, false) => TypeId::U16,
            (IntWidth::W32, false) => TypeId::U32,
            (IntWidth::W64, false) => TypeId::U64,
        }
    }

    #[must_use]
    pub fn is_float(&self, id: TypeId) -> bool {
        matches!(self.kind(self.resolve_alias(id)), TypeKind::Float { .. })
    }

    /// The element type if `id` is an array or a ref-to-array.
    #[must_use]
    pub fn array_element(&self, id: TypeId) -> Option<TypeId> {
        match self.kind(self.resolve_alias(id)) {
            TypeKind::Array { element } => Some(*element),
            TypeKind::Ref { target, .. } => match self.kind(self.resolve_alias(*target)) {
                TypeKind::Array { element } => Some(*element),
                _ => None,
            },
            _ => None,
        }
    }

    /// The field list if `id` is an object or a ref-to-object.
    #[must_use]
    pub fn object_fields(&self, id: TypeId) -> Option<&IndexMap<String, TypeId>> {
        match self.kind(self.resolve_alias(id)) {
            TypeKind::Object { fields, .. } => Some(fields),
            TypeKind::Ref { target, .. } => match self.kind(self.resolve_alias(*target)) {
                TypeKind::Object { fields, .. } => Some(fields),
                _ => None,
            },
            _ => None,
        }
    }

    /// Render a type name for diagnostics and mangled specialization names.
    #[must_use]
    pub fn display(&self, id: TypeId) -> String {
        match self.kind(id) {
            TypeKind::Unknown => "unknown".to_string(),
            TypeKind::Void => "void".to_string(),
            TypeKind::Bool => "bool".to_string(),
            TypeKind::Float { wide: false } => "f32".to_string(),
            TypeKind::Float { wide: true } => "f64".to_string(),
            TypeKind::Str => "string".to_string(),
            TypeKind::Int { width, signed } => {
                format!("{}{}", if *signed { "i" } else { "u" }, width.bits())
            }
            TypeKind::Alias { name, .. } => name.clone(),
            TypeKind::Array { element } => format!("{}[]", self.display(*element)),
            TypeKind::Ref { target, mutable } => {
                if *mutable {
                    format!("ref mut {}", self.display(*target))
                } else {
                    format!("ref {}", self.display(*target))
                }
            }
            TypeKind::Object { fields, .. } => {
                if let Some(name) = self.object_names.get(&id) {
                    return name.clone();
                }
                let inner: Vec<String> = fields
                    .iter()
                    .map(|(n, t)| format!("{n}: {}", self.display(*t)))
                    .collect();
                format!("{{ {} }}", inner.join(", "))
            }
            TypeKind::Function(f) => {
                let params: Vec<String> = f.params.iter().map(|p| self.display(*p)).collect();
                format!("function({}) -> {}", params.join(", "), self.display(f.ret))
            }
        }
    }

    /// Mangled specialization name: `name$ty1_ty2`.
    #[must_use]
    pub fn mangle(&self, name: &str, params: &[TypeId]) -> String {
        if params.is_empty() {
            return format!("{name}$");
        }
        let parts: Vec<String> = params
            .iter()
            .map(|p| self.display(self.resolve_alias(*p)))
            .collect();
        format!("{name}${}", parts.join("_"))
    }

    /// Number of types in the arena (for diagnostics and tests).
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
#[path = "../tests/table_tests.rs"]
mod tests;
