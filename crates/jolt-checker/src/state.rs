//! The engine's pass structure and specialization bookkeeping.
//!
//! Pass order over a Program with an empty top-level symbol table:
//!
//! 0. Structs, constants, and *all* top-level variable declarations are
//!    collected (this is what lets functions reference module globals).
//! 1. Function signatures are captured from annotations.
//! 2. Literal types are seeded on expressions outside function bodies.
//! 3. Iterative inference runs to a fixed point: bodies of functions
//!    whose parameters are all concrete are checked directly; calls to
//!    functions with untyped parameters mint specializations (a typed
//!    clone of the body per distinct argument-type tuple).
//!
//! Everything reports through the shared `DiagnosticContext` and keeps
//! going; nothing here aborts except inference non-convergence.

use jolt_common::limits::{MAX_FUNCTION_SPECIALIZATIONS, MAX_INFER_ITERATIONS};
use jolt_common::{DiagnosticContext, Span, diagnostic_codes};
use jolt_parser::ast::{NodeArena, NodeKind, NumberValue};
use jolt_types::{FunctionType, NodeId, Specialization, TypeId, TypeTable};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::debug;

use crate::scope::{ScopeArena, ScopeId, Symbol, SymbolId};

pub struct CheckerState<'a> {
    pub arena: &'a mut NodeArena,
    pub types: &'a mut TypeTable,
    pub scopes: &'a mut ScopeArena,
    pub diags: &'a mut DiagnosticContext,
    pub module_scope: ScopeId,
    /// FunctionDecl node -> function type (top-level functions and
    /// struct methods alike).
    pub functions: FxHashMap<NodeId, TypeId>,
    /// Method declaration -> receiver struct type (binds `self`).
    pub(crate) method_receiver: FxHashMap<NodeId, TypeId>,
    /// Direct-checked bodies keep one stable parameter scope.
    pub(crate) body_scopes: FxHashMap<NodeId, ScopeId>,
    /// Specialization body clone -> its parameter scope.
    pub(crate) spec_scopes: FxHashMap<NodeId, ScopeId>,
    /// Specialization bodies whose last inference saw unresolved
    /// returns; re-inferred until the join is complete.
    pub(crate) open_specs: FxHashSet<NodeId>,
    /// Bodies currently being checked (recursion guard).
    pub(crate) checking: FxHashSet<NodeId>,
    pub(crate) checked_bodies: FxHashSet<NodeId>,
    pub(crate) changed: bool,
    pub(crate) changed_functions: Vec<String>,
    /// Return types collected while inside the current body.
    pub(crate) returns: Vec<(TypeId, Span)>,
    pub(crate) in_function: bool,
    pub(crate) loop_depth: u32,
    /// Iterations the fixed point took (exposed for tests).
    pub iterations: u32,
}

impl<'a> CheckerState<'a> {
    pub fn new(
        arena: &'a mut NodeArena,
        types: &'a mut TypeTable,
        scopes: &'a mut ScopeArena,
        diags: &'a mut DiagnosticContext,
    ) -> Self {
        let module_scope = scopes.new_scope(None);
        Self {
            arena,
            types,
            scopes,
            diags,
            module_scope,
            functions: FxHashMap::default(),
            method_receiver: FxHashMap::default(),
            body_scopes: FxHashMap::default(),
            spec_scopes: FxHashMap::default(),
            open_specs: FxHashSet::default(),
            checking: FxHashSet::default(),
            checked_bodies: FxHashSet::default(),
            changed: false,
            changed_functions: Vec::new(),
            returns: Vec::new(),
            in_function: false,
            loop_depth: 0,
            iterations: 0,
        }
    }

    /// Run all passes over `program`.
    pub fn check(&mut self, program: NodeId) {
        let stmts = match &self.arena.get(program).kind {
            NodeKind::Program { stmts, .. } => stmts.clone(),
            _ => return,
        };
        if let NodeKind::Program { scope, .. } = &mut self.arena.get_mut(program).kind {
            *scope = Some(self.module_scope.0);
        }

        self.collect_globals(&stmts);
        self.collect_signatures(&stmts);
        for &stmt in &stmts {
            self.seed_literals(stmt);
        }
        self.run_inference(&stmts);
        self.report_undefined_types();
    }

    // =========================================================================
    // Pass 0 - types, constants, and globals
    // =========================================================================

    fn collect_globals(&mut self, stmts: &[NodeId]) {
        for &stmt in stmts {
            match self.arena.get(stmt).kind.clone() {
                NodeKind::StructDecl {
                    name,
                    name_span,
                    fields,
                    methods,
                    symbol,
                } => {
                    self.declare_struct(stmt, &name, name_span, &fields, &methods, symbol);
                }
                NodeKind::VarDecl {
                    decl_kind,
                    name,
                    name_span,
                    annotation,
                    array_size,
                    init,
                    symbol,
                } => {
                    let is_const = decl_kind == jolt_parser::ast::DeclKind::Const;
                    let mut ty = annotation.unwrap_or(TypeId::UNKNOWN);
                    // Constants with literal initializers are evaluated
                    // now; others are deferred to inference.
                    if ty.is_unknown()
                        && is_const
                        && let Some(init) = init
                        && let Some(lit) = self.literal_type(init)
                    {
                        ty = lit;
                    }
                    self.bind_decl(
                        self.module_scope,
                        stmt,
                        &name,
                        name_span,
                        ty,
                        is_const,
                        array_size,
                        symbol,
                    );
                }
                _ => {}
            }
        }
    }

    fn declare_struct(
        &mut self,
        stmt: NodeId,
        name: &str,
        name_span: Span,
        fields: &[jolt_parser::ast::FieldDef],
        methods: &[NodeId],
        symbol: Option<u32>,
    ) {
        // A previous engine run already registered this struct; reuse its
        // type so the passes stay idempotent.
        let struct_ty = if let Some(sym) = symbol {
            self.scopes.symbol(SymbolId(sym)).ty
        } else {
            let field_list: Vec<(String, TypeId)> =
                fields.iter().map(|f| (f.name.clone(), f.ty)).collect();
            match self.types.register_struct(name, field_list, stmt) {
                Ok(ty) => ty,
                Err(err) => {
                    self.diags.error(
                        name_span,
                        err.to_string(),
                        diagnostic_codes::DUPLICATE_DECLARATION,
                    );
                    return;
                }
            }
        };

        match self.scopes.insert(
            self.module_scope,
            Symbol::new(name, stmt, struct_ty, true).with_name_span(name_span),
        ) {
            Ok(sym) => {
                if let NodeKind::StructDecl { symbol, .. } = &mut self.arena.get_mut(stmt).kind {
                    *symbol = Some(sym.0);
                }
            }
            Err(_) => {
                self.diags.error(
                    name_span,
                    format!("duplicate declaration of '{name}'"),
                    diagnostic_codes::DUPLICATE_DECLARATION,
                );
            }
        }

        for &method in methods {
            let NodeKind::FunctionDecl {
                name: method_name,
                name_span: method_span,
                params,
                return_annotation,
                variadic,
                ..
            } = self.arena.get(method).kind.clone()
            else {
                continue;
            };
            let fn_ty = if let Some(existing) = self.types.method(struct_ty, &method_name) {
                existing
            } else {
                let param_tys: SmallVec<[TypeId; 4]> = params
                    .iter()
                    .map(|p| p.annotation.unwrap_or(TypeId::UNKNOWN))
                    .collect();
                let fn_ty = self.types.create_function(FunctionType {
                    name: format!("{name}.{method_name}"),
                    params: param_tys,
                    ret: return_annotation.unwrap_or(TypeId::UNKNOWN),
                    variadic,
                    decl: method,
                    specializations: Vec::new(),
                });
                if let Err(err) = self.types.register_method(struct_ty, &method_name, fn_ty) {
                    self.diags.error(
                        method_span,
                        err.to_string(),
                        diagnostic_codes::DUPLICATE_DECLARATION,
                    );
                }
                fn_ty
            };
            self.functions.insert(method, fn_ty);
            self.method_receiver.insert(method, struct_ty);
        }
    }

    // =========================================================================
    // Pass 1 - function signatures
    // =========================================================================

    fn collect_signatures(&mut self, stmts: &[NodeId]) {
        for &stmt in stmts {
            let NodeKind::FunctionDecl {
                name,
                name_span,
                params,
                return_annotation,
                variadic,
                external,
                symbol,
                ..
            } = self.arena.get(stmt).kind.clone()
            else {
                continue;
            };

            if external {
                let annotated = params.iter().all(|p| p.annotation.is_some())
                    && return_annotation.is_some();
                if !annotated {
                    self.diags.error(
                        name_span,
                        format!(
                            "external function '{name}' requires fully annotated parameters \
                             and return type"
                        ),
                        diagnostic_codes::EXTERNAL_MISSING_ANNOTATION,
                    );
                }
            }

            let fn_ty = if let Some(sym) = symbol {
                self.scopes.symbol(SymbolId(sym)).ty
            } else {
                let param_tys: SmallVec<[TypeId; 4]> = params
                    .iter()
                    .map(|p| p.annotation.unwrap_or(TypeId::UNKNOWN))
                    .collect();
                self.types.create_function(FunctionType {
                    name: name.clone(),
                    params: param_tys,
                    ret: return_annotation.unwrap_or(TypeId::UNKNOWN),
                    variadic,
                    decl: stmt,
                    specializations: Vec::new(),
                })
            };

            match self.scopes.insert(
                self.module_scope,
                Symbol::new(&name, stmt, fn_ty, true).with_name_span(name_span),
            )
            {
                Ok(sym) => {
                    if let NodeKind::FunctionDecl { symbol, .. } =
                        &mut self.arena.get_mut(stmt).kind
                    {
                        *symbol = Some(sym.0);
                    }
                }
                Err(_) => {
                    self.diags.error(
                        name_span,
                        format!("duplicate declaration of '{name}'"),
                        diagnostic_codes::DUPLICATE_DECLARATION,
                    );
                }
            }
            self.functions.insert(stmt, fn_ty);
        }
    }

    // =========================================================================
    // Pass 2 - literal seeding (outside function bodies)
    // =========================================================================

    fn seed_literals(&mut self, node: NodeId) {
        if matches!(self.arena.get(node).kind, NodeKind::FunctionDecl { .. }) {
            return;
        }
        for child in self.arena.children(node) {
            self.seed_literals(child);
        }
        let ty = match &self.arena.get(node).kind {
            NodeKind::Number { .. } | NodeKind::Str { .. } | NodeKind::Bool { .. } => {
                self.literal_type(node)
            }
            NodeKind::ArrayLit { elements } => {
                let elems: Vec<TypeId> = elements.iter().map(|e| self.arena.ty(*e)).collect();
                match elems.first() {
                    Some(first)
                        if !first.is_unknown()
                            && elems.iter().all(|e| self.types.equal(*e, *first)) =>
                    {
                        Some(self.types.array_of(*first))
                    }
                    _ => None,
                }
            }
            NodeKind::ObjectLit { fields } => {
                let field_tys: Vec<(String, TypeId)> = fields
                    .iter()
                    .map(|(name, _, value)| (name.clone(), self.arena.ty(*value)))
                    .collect();
                if field_tys.iter().all(|(_, t)| !t.is_unknown()) {
                    Some(self.types.intern_object(field_tys, None))
                } else {
                    None
                }
            }
            _ => None,
        };
        if let Some(ty) = ty {
            self.arena.set_ty(node, ty);
        }
    }

    /// The seeded type of a literal node, if it is one.
    pub(crate) fn literal_type(&self, node: NodeId) -> Option<TypeId> {
        match &self.arena.get(node).kind {
            NodeKind::Number { value, suffix } => Some(suffix.unwrap_or(match value {
                NumberValue::Int(_) => TypeId::I32,
                NumberValue::Float(_) => TypeId::F64,
            })),
            NodeKind::Str { .. } => Some(TypeId::STRING),
            NodeKind::Bool { .. } => Some(TypeId::BOOL),
            _ => None,
        }
    }

    // =========================================================================
    // Pass 3+ - iterative specialization
    // =========================================================================

    fn run_inference(&mut self, stmts: &[NodeId]) {
        let mut converged = false;
        for iteration in 0..MAX_INFER_ITERATIONS {
            self.changed = false;
            self.changed_functions.clear();

            self.check_pending_bodies();
            for &stmt in stmts {
                self.infer_stmt(stmt, self.module_scope);
            }
            self.recheck_open_specializations();

            self.iterations = iteration + 1;
            debug!(iteration, changed = self.changed, "inference iteration");
            if !self.changed {
                converged = true;
                break;
            }
        }

        if !converged {
            let mut names = std::mem::take(&mut self.changed_functions);
            names.sort();
            names.dedup();
            self.diags.error(
                Span::dummy(),
                format!(
                    "internal inference error: specialization did not converge for: {}",
                    names.join(", ")
                ),
                diagnostic_codes::INFERENCE_NON_CONVERGENCE,
            );
        }
    }

    /// Body-check every function whose parameters are all concrete. This
    /// covers zero-parameter and fully annotated functions, so they get
    /// inferred return types (and diagnostics) without any call site.
    fn check_pending_bodies(&mut self) {
        let mut entries: Vec<(NodeId, TypeId)> =
            self.functions.iter().map(|(d, t)| (*d, *t)).collect();
        // Deterministic order keeps diagnostics stable across runs.
        entries.sort_by_key(|(d, _)| d.0);
        for (decl, fn_ty) in entries {
            let Some(f) = self.types.function(fn_ty) else {
                continue;
            };
            if !f.params.iter().all(|p| !p.is_unknown()) {
                continue;
            }
            let ret_known = !f.ret.is_unknown();
            if self.checked_bodies.contains(&decl) && ret_known {
                continue;
            }
            self.check_function_body(decl, fn_ty);
        }
    }

    pub(crate) fn check_function_body(&mut self, decl: NodeId, fn_ty: TypeId) {
        if self.checking.contains(&decl) {
            return;
        }
        let NodeKind::FunctionDecl {
            name_span,
            params,
            body: Some(body),
            ..
        } = self.arena.get(decl).kind.clone()
        else {
            return;
        };
        self.checking.insert(decl);

        let scope = if let Some(existing) = self.body_scopes.get(&decl) {
            *existing
        } else {
            let scope = self.scopes.new_scope(Some(self.module_scope));
            for param in &params {
                let ty = param.annotation.unwrap_or(TypeId::UNKNOWN);
                let _ = self.scopes.insert(
                    scope,
                    Symbol::new(&param.name, decl, ty, false).with_name_span(param.name_span),
                );
            }
            if let Some(receiver) = self.method_receiver.get(&decl).copied() {
                let _ = self
                    .scopes
                    .insert(scope, Symbol::new("self", decl, receiver, false));
            }
            self.body_scopes.insert(decl, scope);
            scope
        };

        let (inferred, complete) = self.infer_body(body, scope);

        let Some(f) = self.types.function(fn_ty) else {
            self.checking.remove(&decl);
            return;
        };
        let declared = f.ret;
        let fn_name = f.name.clone();
        if declared.is_unknown() {
            if !inferred.is_unknown() {
                if let Some(f) = self.types.function_mut(fn_ty) {
                    f.ret = inferred;
                }
                self.changed = true;
                self.changed_functions.push(fn_name);
            }
            // An incomplete join (unresolved recursive call) keeps the
            // body on the re-check list for the next iteration.
            if complete && !inferred.is_unknown() {
                self.checked_bodies.insert(decl);
            }
        } else {
            if !inferred.is_unknown() && !self.types.equal(inferred, declared) {
                self.diags.error(
                    name_span,
                    format!(
                        "function '{fn_name}' returns '{}', expected '{}'",
                        self.types.display(self.types.resolve_alias(inferred)),
                        self.types.display(self.types.resolve_alias(declared)),
                    ),
                    diagnostic_codes::TYPE_MISMATCH,
                );
            }
            if complete {
                self.checked_bodies.insert(decl);
            }
        }
        self.checking.remove(&decl);
    }

    /// Infer a function body (a Block) with `scope` holding the
    /// parameter bindings. Returns the join of all return types and
    /// whether every return was resolved (an unresolved recursive call
    /// leaves the join incomplete; the body is re-inferred later).
    pub(crate) fn infer_body(&mut self, body: NodeId, scope: ScopeId) -> (TypeId, bool) {
        let saved_returns = std::mem::take(&mut self.returns);
        let saved_in_function = std::mem::replace(&mut self.in_function, true);
        let saved_loop_depth = std::mem::replace(&mut self.loop_depth, 0);

        self.infer_stmt(body, scope);

        let returns = std::mem::replace(&mut self.returns, saved_returns);
        self.in_function = saved_in_function;
        self.loop_depth = saved_loop_depth;
        self.join_returns(&returns)
    }

    /// The function's return type is the join of all Return types: void
    /// when there are none, the common type of the resolved returns
    /// otherwise, and a Type Mismatch when two resolved returns disagree.
    fn join_returns(&mut self, returns: &[(TypeId, Span)]) -> (TypeId, bool) {
        if returns.is_empty() {
            return (TypeId::VOID, true);
        }
        let complete = returns.iter().all(|(t, _)| !t.is_unknown());
        let Some((first, _)) = returns.iter().find(|(t, _)| !t.is_unknown()) else {
            return (TypeId::UNKNOWN, false);
        };
        for (ty, span) in returns {
            if !ty.is_unknown() && !self.types.equal(*ty, *first) {
                self.diags.error(
                    *span,
                    format!(
                        "return type mismatch: expected '{}', found '{}'",
                        self.types.display(self.types.resolve_alias(*first)),
                        self.types.display(self.types.resolve_alias(*ty)),
                    ),
                    diagnostic_codes::TYPE_MISMATCH,
                );
            }
        }
        (*first, complete)
    }

    /// Mint a new specialization of `fn_ty` for the given argument types:
    /// clone the body, bind parameters in a fresh child of the module
    /// scope, infer, and register.
    pub(crate) fn create_specialization(
        &mut self,
        fn_ty: TypeId,
        args: &[TypeId],
        self_ty: Option<TypeId>,
    ) -> TypeId {
        let Some(f) = self.types.function(fn_ty) else {
            return TypeId::UNKNOWN;
        };
        let decl = f.decl;
        let fn_name = f.name.clone();
        if f.specializations.len() >= MAX_FUNCTION_SPECIALIZATIONS {
            let name_span = match &self.arena.get(decl).kind {
                NodeKind::FunctionDecl { name_span, .. } => *name_span,
                _ => Span::dummy(),
            };
            self.diags.error(
                name_span,
                format!(
                    "internal inference error: function '{fn_name}' exceeded the \
                     specialization limit"
                ),
                diagnostic_codes::INFERENCE_NON_CONVERGENCE,
            );
            return TypeId::UNKNOWN;
        }
        let NodeKind::FunctionDecl {
            params,
            body: Some(body),
            ..
        } = self.arena.get(decl).kind.clone()
        else {
            return TypeId::UNKNOWN;
        };

        let clone = self.arena.clone_subtree(body);
        let scope = self.scopes.new_scope(Some(self.module_scope));
        for (param, arg) in params.iter().zip(args) {
            let _ = self.scopes.insert(
                scope,
                Symbol::new(&param.name, decl, *arg, false).with_name_span(param.name_span),
            );
        }
        if let Some(receiver) = self_ty {
            let _ = self
                .scopes
                .insert(scope, Symbol::new("self", decl, receiver, false));
        }

        let mangled = self.types.mangle(&fn_name, args);
        debug!(function = %fn_name, specialization = %mangled, "new specialization");
        if let Some(f) = self.types.function_mut(fn_ty) {
            f.specializations.push(Specialization {
                mangled,
                params: SmallVec::from_slice(args),
                ret: TypeId::UNKNOWN,
                body: clone,
            });
        }
        self.spec_scopes.insert(clone, scope);
        self.changed = true;
        self.changed_functions.push(fn_name);

        let (ret, complete) = self.infer_body(clone, scope);
        if let Some(f) = self.types.function_mut(fn_ty)
            && let Some(spec) = f.specializations.iter_mut().find(|s| s.body == clone)
        {
            spec.ret = ret;
        }
        if !complete {
            self.open_specs.insert(clone);
        }
        ret
    }

    /// Re-infer specializations whose return join was incomplete; later
    /// iterations may have typed the functions they call.
    fn recheck_open_specializations(&mut self) {
        let fn_types: Vec<TypeId> = self.functions.values().copied().collect();
        for fn_ty in fn_types {
            let Some(f) = self.types.function(fn_ty) else {
                continue;
            };
            let open: Vec<(NodeId, TypeId)> = f
                .specializations
                .iter()
                .filter(|s| s.ret.is_unknown() || self.open_specs.contains(&s.body))
                .map(|s| (s.body, s.ret))
                .collect();
            let fn_name = f.name.clone();
            for (body, previous_ret) in open {
                let Some(scope) = self.spec_scopes.get(&body).copied() else {
                    continue;
                };
                let (ret, complete) = self.infer_body(body, scope);
                if complete {
                    self.open_specs.remove(&body);
                }
                if ret.is_unknown() || !previous_ret.is_unknown() {
                    continue;
                }
                if let Some(f) = self.types.function_mut(fn_ty)
                    && let Some(spec) = f.specializations.iter_mut().find(|s| s.body == body)
                {
                    spec.ret = ret;
                }
                self.changed = true;
                self.changed_functions.push(fn_name.clone());
            }
        }
    }

    // =========================================================================
    // Helpers shared with inference
    // =========================================================================

    /// Insert or update the symbol for a variable declaration. Re-walks
    /// of the same declaration in the same scope update in place; a fresh
    /// scope (or a genuine redeclaration) inserts.
    pub(crate) fn bind_decl(
        &mut self,
        scope: ScopeId,
        stmt: NodeId,
        name: &str,
        name_span: Span,
        ty: TypeId,
        is_const: bool,
        array_size: Option<u32>,
        existing: Option<u32>,
    ) -> Option<SymbolId> {
        if let Some(raw) = existing
            && self.scopes.lookup_local(scope, name) == Some(SymbolId(raw))
        {
            let sym = SymbolId(raw);
            if self.scopes.symbol(sym).ty.is_unknown() && !ty.is_unknown() {
                self.scopes.symbol_mut(sym).ty = ty;
                self.changed = true;
            }
            return Some(sym);
        }
        let mut symbol = Symbol::new(name, stmt, ty, is_const).with_name_span(name_span);
        symbol.array_size = array_size;
        match self.scopes.insert(scope, symbol) {
            Ok(sym) => {
                if let NodeKind::VarDecl { symbol, .. } = &mut self.arena.get_mut(stmt).kind {
                    *symbol = Some(sym.0);
                }
                Some(sym)
            }
            Err(_) => {
                self.diags.error(
                    name_span,
                    format!("duplicate declaration of '{name}'"),
                    diagnostic_codes::DUPLICATE_DECLARATION,
                );
                None
            }
        }
    }

    fn report_undefined_types(&mut self) {
        let undefined = self.types.undefined_named();
        if undefined.is_empty() {
            return;
        }
        let names: Vec<String> = undefined.into_iter().map(|(n, _)| n).collect();
        self.diags.error(
            Span::dummy(),
            format!("unknown type(s): {}", names.join(", ")),
            diagnostic_codes::UNKNOWN_TYPE,
        );
    }
}
