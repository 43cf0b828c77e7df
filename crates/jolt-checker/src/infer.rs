//! Statement and expression inference rules.
//!
//! Every rule that detects a problem emits one diagnostic and continues
//! where semantically possible, assigning Unknown and moving on. Nodes
//! are written with their resolved type as they are visited; re-walks in
//! later fixed-point iterations are safe because diagnostics deduplicate.

use jolt_common::{Span, diagnostic_codes};
use jolt_parser::ast::{BinaryOp, DeclKind, IncDecOp, NodeKind, UnaryOp};
use jolt_types::{NodeId, TypeId, TypeKind};

use crate::scope::{ScopeId, SymbolId};
use crate::state::CheckerState;

impl CheckerState<'_> {
    fn type_name(&self, ty: TypeId) -> String {
        self.types.display(self.types.resolve_alias(ty))
    }

    // =========================================================================
    // Statements
    // =========================================================================

    pub(crate) fn infer_stmt(&mut self, stmt: NodeId, scope: ScopeId) {
        match self.arena.get(stmt).kind.clone() {
            NodeKind::VarDecl {
                decl_kind,
                name,
                name_span,
                annotation,
                array_size,
                init,
                symbol,
            } => {
                let init_ty = init.map(|i| self.infer_expr(i, scope));
                let declared = annotation.unwrap_or(TypeId::UNKNOWN);
                if let (Some(init), Some(init_ty)) = (init, init_ty)
                    && !declared.is_unknown()
                    && !init_ty.is_unknown()
                    && !self.types.equal(declared, init_ty)
                {
                    self.diags.error(
                        self.arena.span(init),
                        format!(
                            "cannot initialize '{name}: {}' with '{}'",
                            self.type_name(declared),
                            self.type_name(init_ty),
                        ),
                        diagnostic_codes::TYPE_MISMATCH,
                    );
                }
                let ty = if declared.is_unknown() {
                    init_ty.unwrap_or(TypeId::UNKNOWN)
                } else {
                    declared
                };
                let is_const = decl_kind == DeclKind::Const;
                self.bind_decl(
                    scope, stmt, &name, name_span, ty, is_const, array_size, symbol,
                );
            }
            NodeKind::StructDecl { fields, .. } => {
                // Field defaults are checked against the field type;
                // registration already happened in the collection pass.
                for field in fields {
                    let Some(default) = field.default else {
                        continue;
                    };
                    let default_ty = self.infer_expr(default, scope);
                    if !default_ty.is_unknown()
                        && !field.ty.is_unknown()
                        && !self.types.equal(default_ty, field.ty)
                    {
                        self.diags.error(
                            self.arena.span(default),
                            format!(
                                "default value of field '{}' has type '{}', expected '{}'",
                                field.name,
                                self.type_name(default_ty),
                                self.type_name(field.ty),
                            ),
                            diagnostic_codes::TYPE_MISMATCH,
                        );
                    }
                }
            }
            // Signatures and bodies are handled by the engine's passes.
            NodeKind::FunctionDecl { .. } => {}
            NodeKind::Return { value } => {
                let span = self.arena.span(stmt);
                let ty = match value {
                    Some(v) => self.infer_expr(v, scope),
                    None => TypeId::VOID,
                };
                if self.in_function {
                    self.returns.push((ty, span));
                } else {
                    self.diags.error(
                        span,
                        "'return' outside of a function",
                        diagnostic_codes::UNEXPECTED_TOKEN,
                    );
                }
            }
            NodeKind::Break | NodeKind::Continue => {
                if self.loop_depth == 0 {
                    let span = self.arena.span(stmt);
                    let what = if matches!(self.arena.get(stmt).kind, NodeKind::Break) {
                        "break"
                    } else {
                        "continue"
                    };
                    self.diags.error(
                        span,
                        format!("'{what}' outside of a loop"),
                        diagnostic_codes::UNEXPECTED_TOKEN,
                    );
                }
            }
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond_ty = self.infer_expr(cond, scope);
                self.expect_bool(cond_ty, self.arena.span(cond), "if condition");
                self.infer_stmt(then_branch, scope);
                if let Some(else_branch) = else_branch {
                    self.infer_stmt(else_branch, scope);
                }
            }
            NodeKind::While { cond, body } => {
                let cond_ty = self.infer_expr(cond, scope);
                self.expect_bool(cond_ty, self.arena.span(cond), "while condition");
                self.loop_depth += 1;
                self.infer_stmt(body, scope);
                self.loop_depth -= 1;
            }
            NodeKind::For {
                init,
                cond,
                update,
                body,
            } => {
                let header = self.scopes.new_scope(Some(scope));
                if let Some(init) = init {
                    self.infer_stmt(init, header);
                }
                if let Some(cond) = cond {
                    let cond_ty = self.infer_expr(cond, header);
                    self.expect_bool(cond_ty, self.arena.span(cond), "for condition");
                }
                if let Some(update) = update {
                    self.infer_expr(update, header);
                }
                self.loop_depth += 1;
                self.infer_stmt(body, header);
                self.loop_depth -= 1;
            }
            NodeKind::Block { stmts, .. } => {
                let child = self.scopes.new_scope(Some(scope));
                if let NodeKind::Block { scope: slot, .. } = &mut self.arena.get_mut(stmt).kind {
                    *slot = Some(child.0);
                }
                for s in stmts {
                    self.infer_stmt(s, child);
                }
            }
            NodeKind::ExprStmt { expr } => {
                self.infer_expr(expr, scope);
            }
            _ => {}
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub(crate) fn infer_expr(&mut self, node: NodeId, scope: ScopeId) -> TypeId {
        let span = self.arena.span(node);
        let ty = match self.arena.get(node).kind.clone() {
            NodeKind::Number { .. } | NodeKind::Str { .. } | NodeKind::Bool { .. } => {
                self.literal_type(node).unwrap_or(TypeId::UNKNOWN)
            }
            NodeKind::Ident { name, .. } => self.infer_ident(node, &name, span, scope),
            NodeKind::Unary { op, operand } => self.infer_unary(op, operand, span, scope),
            NodeKind::Prefix { op, target } | NodeKind::Postfix { op, target } => {
                self.infer_incdec(op, target, span, scope)
            }
            NodeKind::Binary { op, lhs, rhs } => self.infer_binary(op, lhs, rhs, span, scope),
            NodeKind::Assign { target, value } => self.infer_assign(target, value, span, scope),
            NodeKind::CompoundAssign { op, target, value } => {
                self.infer_compound_assign(op, target, value, span, scope)
            }
            NodeKind::Member {
                object,
                field,
                field_span,
            } => {
                let obj_ty = self.infer_expr(object, scope);
                self.member_type(obj_ty, &field, field_span)
                    .unwrap_or(TypeId::UNKNOWN)
            }
            NodeKind::MemberAssign {
                object,
                field,
                field_span,
                value,
            } => {
                let obj_ty = self.infer_expr(object, scope);
                let value_ty = self.infer_expr(value, scope);
                self.check_write_through(object, span);
                match self.member_type(obj_ty, &field, field_span) {
                    Some(field_ty) => {
                        if !value_ty.is_unknown() && !self.types.equal(field_ty, value_ty) {
                            self.diags.error(
                                span,
                                format!(
                                    "cannot assign '{}' to field '{field}' of type '{}'",
                                    self.type_name(value_ty),
                                    self.type_name(field_ty),
                                ),
                                diagnostic_codes::TYPE_MISMATCH,
                            );
                        }
                        field_ty
                    }
                    None => TypeId::UNKNOWN,
                }
            }
            NodeKind::Index { object, index } => self.infer_index(object, index, span, scope),
            NodeKind::IndexAssign {
                object,
                index,
                value,
            } => {
                let element = self.infer_index(object, index, span, scope);
                let value_ty = self.infer_expr(value, scope);
                self.check_write_through(object, span);
                if !element.is_unknown()
                    && !value_ty.is_unknown()
                    && !self.types.equal(element, value_ty)
                {
                    self.diags.error(
                        span,
                        format!(
                            "cannot assign '{}' to array element of type '{}'",
                            self.type_name(value_ty),
                            self.type_name(element),
                        ),
                        diagnostic_codes::TYPE_MISMATCH,
                    );
                }
                element
            }
            NodeKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                let cond_ty = self.infer_expr(cond, scope);
                self.expect_bool(cond_ty, self.arena.span(cond), "ternary condition");
                let then_ty = self.infer_expr(then_expr, scope);
                let else_ty = self.infer_expr(else_expr, scope);
                if then_ty.is_unknown() || else_ty.is_unknown() {
                    TypeId::UNKNOWN
                } else if self.types.equal(then_ty, else_ty) {
                    then_ty
                } else {
                    self.diags.error(
                        span,
                        format!(
                            "ternary branches have different types: '{}' and '{}'",
                            self.type_name(then_ty),
                            self.type_name(else_ty),
                        ),
                        diagnostic_codes::TYPE_MISMATCH,
                    );
                    TypeId::UNKNOWN
                }
            }
            NodeKind::Call { callee, args } => self.infer_call(callee, &args, span, scope),
            NodeKind::MethodCall {
                object,
                method,
                method_span,
                args,
            } => {
                let obj_ty = self.infer_expr(object, scope);
                if obj_ty.is_unknown() {
                    for arg in &args {
                        self.infer_expr(*arg, scope);
                    }
                    TypeId::UNKNOWN
                } else {
                    match self.types.method(obj_ty, &method) {
                        Some(fn_ty) => self.resolve_call(fn_ty, &args, span, scope, Some(obj_ty)),
                        None => {
                            for arg in &args {
                                self.infer_expr(*arg, scope);
                            }
                            self.diags.error(
                                method_span,
                                format!(
                                    "unknown method '{method}' on '{}'",
                                    self.type_name(obj_ty)
                                ),
                                diagnostic_codes::UNKNOWN_MEMBER,
                            );
                            TypeId::UNKNOWN
                        }
                    }
                }
            }
            NodeKind::ArrayLit { elements } => {
                let elem_tys: Vec<TypeId> = elements
                    .iter()
                    .map(|e| self.infer_expr(*e, scope))
                    .collect();
                match elem_tys.first() {
                    None => TypeId::UNKNOWN,
                    Some(first) if first.is_unknown() => TypeId::UNKNOWN,
                    Some(first) => {
                        let mut ok = true;
                        for (ty, element) in elem_tys.iter().zip(&elements) {
                            if ty.is_unknown() {
                                ok = false;
                            } else if !self.types.equal(*ty, *first) {
                                self.diags.error(
                                    self.arena.span(*element),
                                    format!(
                                        "array elements have different types: '{}' and '{}'",
                                        self.type_name(*first),
                                        self.type_name(*ty),
                                    ),
                                    diagnostic_codes::TYPE_MISMATCH,
                                );
                                ok = false;
                            }
                        }
                        if ok {
                            self.types.array_of(*first)
                        } else {
                            TypeId::UNKNOWN
                        }
                    }
                }
            }
            NodeKind::ObjectLit { fields } => {
                let field_tys: Vec<(String, TypeId)> = fields
                    .iter()
                    .map(|(name, _, value)| (name.clone(), self.infer_expr(*value, scope)))
                    .collect();
                if field_tys.iter().all(|(_, t)| !t.is_unknown()) {
                    self.types.intern_object(field_tys, None)
                } else {
                    TypeId::UNKNOWN
                }
            }
            _ => TypeId::UNKNOWN,
        };
        self.arena.set_ty(node, ty);
        ty
    }

    fn infer_ident(&mut self, node: NodeId, name: &str, span: Span, scope: ScopeId) -> TypeId {
        match self.scopes.lookup(scope, name) {
            Some(sym) => {
                if let NodeKind::Ident { symbol, .. } = &mut self.arena.get_mut(node).kind {
                    *symbol = Some(sym.0);
                }
                self.scopes.symbol(sym).ty
            }
            None => {
                self.diags.error(
                    span,
                    format!("undefined variable '{name}'"),
                    diagnostic_codes::UNDEFINED_VARIABLE,
                );
                TypeId::UNKNOWN
            }
        }
    }

    fn infer_unary(&mut self, op: UnaryOp, operand: NodeId, span: Span, scope: ScopeId) -> TypeId {
        let operand_ty = self.infer_expr(operand, scope);
        if operand_ty.is_unknown() {
            return if op == UnaryOp::Not {
                TypeId::BOOL
            } else {
                TypeId::UNKNOWN
            };
        }
        match op {
            UnaryOp::Not => {
                if !self.types.equal(operand_ty, TypeId::BOOL) {
                    self.diags.error(
                        span,
                        format!(
                            "operator '!' requires a 'bool' operand, found '{}'",
                            self.type_name(operand_ty)
                        ),
                        diagnostic_codes::NON_BOOL_OPERAND,
                    );
                }
                TypeId::BOOL
            }
            UnaryOp::Neg => {
                match self.types.int_info(operand_ty) {
                    Some((_, true)) => operand_ty,
                    Some((_, false)) => {
                        self.diags.error(
                            span,
                            "cannot negate an unsigned integer",
                            diagnostic_codes::INVALID_OPERAND,
                        );
                        operand_ty
                    }
                    None if self.types.is_float(operand_ty) => operand_ty,
                    None => {
                        self.diags.error(
                            span,
                            format!(
                                "operator '-' is not defined for '{}'",
                                self.type_name(operand_ty)
                            ),
                            diagnostic_codes::INVALID_OPERAND,
                        );
                        TypeId::UNKNOWN
                    }
                }
            }
            UnaryOp::Pos => {
                if !self.types.is_integer(operand_ty) && !self.types.is_float(operand_ty) {
                    self.diags.error(
                        span,
                        format!(
                            "operator '+' is not defined for '{}'",
                            self.type_name(operand_ty)
                        ),
                        diagnostic_codes::INVALID_OPERAND,
                    );
                }
                operand_ty
            }
        }
    }

    fn infer_incdec(
        &mut self,
        op: IncDecOp,
        target: NodeId,
        span: Span,
        scope: ScopeId,
    ) -> TypeId {
        let target_ty = self.infer_expr(target, scope);
        self.check_mutable(target, span);
        if !target_ty.is_unknown()
            && !self.types.is_integer(target_ty)
            && !self.types.is_float(target_ty)
        {
            let symbol = match op {
                IncDecOp::Increment => "++",
                IncDecOp::Decrement => "--",
            };
            self.diags.error(
                span,
                format!(
                    "operator '{symbol}' requires a numeric operand, found '{}'",
                    self.type_name(target_ty)
                ),
                diagnostic_codes::INVALID_OPERAND,
            );
        }
        target_ty
    }

    fn infer_binary(
        &mut self,
        op: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
        span: Span,
        scope: ScopeId,
    ) -> TypeId {
        let lhs_ty = self.infer_expr(lhs, scope);
        let rhs_ty = self.infer_expr(rhs, scope);

        if op.is_logical() {
            for ty in [lhs_ty, rhs_ty] {
                if !ty.is_unknown() && !self.types.equal(ty, TypeId::BOOL) {
                    self.diags.error(
                        span,
                        format!(
                            "logical operator '{}' requires 'bool' operands, found '{}'",
                            op.symbol(),
                            self.type_name(ty)
                        ),
                        diagnostic_codes::NON_BOOL_OPERAND,
                    );
                }
            }
            return TypeId::BOOL;
        }

        if lhs_ty.is_unknown() || rhs_ty.is_unknown() {
            return if op.is_comparison() {
                TypeId::BOOL
            } else {
                TypeId::UNKNOWN
            };
        }

        if op.is_comparison() {
            self.check_comparison(op, lhs_ty, rhs_ty, span);
            return TypeId::BOOL;
        }

        if op.is_shift() {
            if !self.types.is_integer(lhs_ty) || !self.types.is_integer(rhs_ty) {
                self.diags.error(
                    span,
                    format!(
                        "shift operator '{}' requires integer operands, found '{}' and '{}'",
                        op.symbol(),
                        self.type_name(lhs_ty),
                        self.type_name(rhs_ty),
                    ),
                    diagnostic_codes::INVALID_OPERAND,
                );
                return TypeId::UNKNOWN;
            }
            return self.types.resolve_alias(lhs_ty);
        }

        self.numeric_result(op, lhs_ty, rhs_ty, span)
    }

    fn check_comparison(&mut self, op: BinaryOp, lhs_ty: TypeId, rhs_ty: TypeId, span: Span) {
        let l = self.types.resolve_alias(lhs_ty);
        let r = self.types.resolve_alias(rhs_ty);
        let equality = matches!(op, BinaryOp::Eq | BinaryOp::Ne);

        if let (Some((_, ls)), Some((_, rs))) = (self.types.int_info(l), self.types.int_info(r)) {
            if ls != rs {
                self.diags.error(
                    span,
                    "cannot mix signed and unsigned integers",
                    diagnostic_codes::INTEGER_MIX,
                );
            }
            return;
        }
        if self.types.is_float(l) && self.types.is_float(r) {
            return;
        }
        if (self.types.is_integer(l) && self.types.is_float(r))
            || (self.types.is_float(l) && self.types.is_integer(r))
        {
            self.diags.error(
                span,
                "cannot mix integer and floating-point operands",
                diagnostic_codes::TYPE_MISMATCH,
            );
            return;
        }
        let comparable = l == r
            && match self.types.kind(l) {
                TypeKind::Bool | TypeKind::Str => equality,
                TypeKind::Int { .. } | TypeKind::Float { .. } => true,
                _ => false,
            };
        if !comparable {
            self.diags.error(
                span,
                format!(
                    "operator '{}' is not defined for '{}' and '{}'",
                    op.symbol(),
                    self.type_name(lhs_ty),
                    self.type_name(rhs_ty),
                ),
                diagnostic_codes::INVALID_OPERAND,
            );
        }
    }

    /// Arithmetic and bitwise results: integer width promotion when
    /// signedness agrees, no implicit int/float conversion, string `+`
    /// for two strings only.
    fn numeric_result(&mut self, op: BinaryOp, lhs_ty: TypeId, rhs_ty: TypeId, span: Span) -> TypeId {
        let l = self.types.resolve_alias(lhs_ty);
        let r = self.types.resolve_alias(rhs_ty);

        if let (Some((lw, ls)), Some((rw, rs))) = (self.types.int_info(l), self.types.int_info(r))
        {
            if ls != rs {
                self.diags.error(
                    span,
                    "cannot mix signed and unsigned integers",
                    diagnostic_codes::INTEGER_MIX,
                );
                return TypeId::UNKNOWN;
            }
            return self.types.int_type(lw.max(rw), ls);
        }
        if self.types.is_float(l) && self.types.is_float(r) {
            if op.is_bitwise() {
                self.diags.error(
                    span,
                    format!(
                        "operator '{}' is not defined for '{}' and '{}'",
                        op.symbol(),
                        self.type_name(l),
                        self.type_name(r),
                    ),
                    diagnostic_codes::INVALID_OPERAND,
                );
                return TypeId::UNKNOWN;
            }
            return if l == TypeId::F64 || r == TypeId::F64 {
                TypeId::F64
            } else {
                TypeId::F32
            };
        }
        if (self.types.is_integer(l) && self.types.is_float(r))
            || (self.types.is_float(l) && self.types.is_integer(r))
        {
            self.diags.error(
                span,
                "cannot mix integer and floating-point operands",
                diagnostic_codes::TYPE_MISMATCH,
            );
            return TypeId::UNKNOWN;
        }
        if l == TypeId::STRING && r == TypeId::STRING && op == BinaryOp::Add {
            return TypeId::STRING;
        }
        self.diags.error(
            span,
            format!(
                "operator '{}' is not defined for '{}' and '{}'",
                op.symbol(),
                self.type_name(lhs_ty),
                self.type_name(rhs_ty),
            ),
            diagnostic_codes::INVALID_OPERAND,
        );
        TypeId::UNKNOWN
    }

    fn infer_assign(&mut self, target: NodeId, value: NodeId, span: Span, scope: ScopeId) -> TypeId {
        let value_ty = self.infer_expr(value, scope);
        let target_ty = self.infer_expr(target, scope);
        self.check_mutable(target, span);

        if let NodeKind::Ident {
            symbol: Some(raw), ..
        } = self.arena.get(target).kind
        {
            let sym = SymbolId(raw);
            let sym_ty = self.scopes.symbol(sym).ty;
            if sym_ty.is_unknown() && !value_ty.is_unknown() {
                self.scopes.symbol_mut(sym).ty = value_ty;
                self.arena.set_ty(target, value_ty);
                self.changed = true;
                return value_ty;
            }
            if !sym_ty.is_unknown()
                && !value_ty.is_unknown()
                && !self.types.equal(sym_ty, value_ty)
            {
                self.diags.error(
                    span,
                    format!(
                        "cannot assign '{}' to '{}'",
                        self.type_name(value_ty),
                        self.type_name(sym_ty),
                    ),
                    diagnostic_codes::TYPE_MISMATCH,
                );
            }
            return sym_ty;
        }
        target_ty
    }

    fn infer_compound_assign(
        &mut self,
        op: BinaryOp,
        target: NodeId,
        value: NodeId,
        span: Span,
        scope: ScopeId,
    ) -> TypeId {
        let target_ty = self.infer_expr(target, scope);
        let value_ty = self.infer_expr(value, scope);
        self.check_mutable(target, span);
        if target_ty.is_unknown() || value_ty.is_unknown() {
            return target_ty;
        }
        let result = if op.is_shift() {
            if !self.types.is_integer(target_ty) || !self.types.is_integer(value_ty) {
                self.diags.error(
                    span,
                    format!(
                        "shift operator '{}=' requires integer operands",
                        op.symbol()
                    ),
                    diagnostic_codes::INVALID_OPERAND,
                );
                return target_ty;
            }
            self.types.resolve_alias(target_ty)
        } else {
            self.numeric_result(op, target_ty, value_ty, span)
        };
        if !result.is_unknown() && !self.types.equal(result, target_ty) {
            self.diags.error(
                span,
                format!(
                    "cannot assign '{}' to '{}'",
                    self.type_name(result),
                    self.type_name(target_ty),
                ),
                diagnostic_codes::TYPE_MISMATCH,
            );
        }
        target_ty
    }

    fn infer_index(&mut self, object: NodeId, index: NodeId, span: Span, scope: ScopeId) -> TypeId {
        let obj_ty = self.infer_expr(object, scope);
        let index_ty = self.infer_expr(index, scope);
        if obj_ty.is_unknown() {
            return TypeId::UNKNOWN;
        }
        match self.types.array_element(obj_ty) {
            Some(element) => {
                if !index_ty.is_unknown() && !self.types.is_integer(index_ty) {
                    self.diags.error(
                        self.arena.span(index),
                        format!(
                            "array index must be an integer, found '{}'",
                            self.type_name(index_ty)
                        ),
                        diagnostic_codes::NON_INTEGER_INDEX,
                    );
                }
                element
            }
            None => {
                self.diags.error(
                    span,
                    format!("type '{}' cannot be indexed", self.type_name(obj_ty)),
                    diagnostic_codes::TYPE_MISMATCH,
                );
                TypeId::UNKNOWN
            }
        }
    }

    fn member_type(&mut self, obj_ty: TypeId, field: &str, field_span: Span) -> Option<TypeId> {
        if obj_ty.is_unknown() {
            return None;
        }
        let looked_up = self.types.object_fields(obj_ty).map(|f| f.get(field).copied());
        match looked_up {
            None => {
                self.diags.error(
                    field_span,
                    format!("type '{}' is not an object", self.type_name(obj_ty)),
                    diagnostic_codes::TYPE_MISMATCH,
                );
                None
            }
            Some(None) => {
                self.diags.error(
                    field_span,
                    format!(
                        "unknown member '{field}' on '{}'",
                        self.type_name(obj_ty)
                    ),
                    diagnostic_codes::UNKNOWN_MEMBER,
                );
                None
            }
            Some(Some(ty)) => Some(ty),
        }
    }

    // =========================================================================
    // Calls
    // =========================================================================

    fn infer_call(
        &mut self,
        callee: NodeId,
        args: &[NodeId],
        span: Span,
        scope: ScopeId,
    ) -> TypeId {
        let callee_span = self.arena.span(callee);
        let NodeKind::Ident { name, .. } = self.arena.get(callee).kind.clone() else {
            self.infer_expr(callee, scope);
            for arg in args {
                self.infer_expr(*arg, scope);
            }
            self.diags.error(
                callee_span,
                "expression is not callable",
                diagnostic_codes::INVALID_OPERAND,
            );
            return TypeId::UNKNOWN;
        };

        let Some(sym) = self.scopes.lookup(scope, &name) else {
            for arg in args {
                self.infer_expr(*arg, scope);
            }
            self.diags.error(
                callee_span,
                format!("undefined function '{name}'"),
                diagnostic_codes::UNDEFINED_FUNCTION,
            );
            return TypeId::UNKNOWN;
        };

        if let NodeKind::Ident { symbol, .. } = &mut self.arena.get_mut(callee).kind {
            *symbol = Some(sym.0);
        }
        let sym_ty = self.scopes.symbol(sym).ty;
        self.arena.set_ty(callee, sym_ty);

        if self.types.function(sym_ty).is_none() {
            for arg in args {
                self.infer_expr(*arg, scope);
            }
            if !sym_ty.is_unknown() {
                self.diags.error(
                    callee_span,
                    format!("'{name}' is not a function"),
                    diagnostic_codes::UNDEFINED_FUNCTION,
                );
            }
            return TypeId::UNKNOWN;
        }
        self.resolve_call(sym_ty, args, span, scope, None)
    }

    /// Resolve one call site against a function type: fully typed
    /// functions check arguments against the signature, functions with
    /// untyped parameters find or mint a specialization.
    pub(crate) fn resolve_call(
        &mut self,
        fn_ty: TypeId,
        args: &[NodeId],
        call_span: Span,
        scope: ScopeId,
        self_ty: Option<TypeId>,
    ) -> TypeId {
        let arg_tys: Vec<TypeId> = args.iter().map(|a| self.infer_expr(*a, scope)).collect();

        let Some(f) = self.types.function(fn_ty) else {
            return TypeId::UNKNOWN;
        };
        let fn_name = f.name.clone();
        let params: Vec<TypeId> = f.params.to_vec();
        let variadic = f.variadic;
        let decl = f.decl;
        let declared_ret = f.ret;

        if params.iter().all(|p| !p.is_unknown()) {
            let arity_ok = if variadic {
                arg_tys.len() >= params.len()
            } else {
                arg_tys.len() == params.len()
            };
            if !arity_ok {
                self.diags.error(
                    call_span,
                    format!(
                        "function '{fn_name}' expects {} argument(s), found {}",
                        params.len(),
                        arg_tys.len()
                    ),
                    diagnostic_codes::TYPE_MISMATCH,
                );
                return declared_ret;
            }
            for (i, (param, arg)) in params.iter().zip(&arg_tys).enumerate() {
                if !arg.is_unknown() && !self.types.equal(*param, *arg) {
                    self.diags.error(
                        self.arena.span(args[i]),
                        format!(
                            "argument {} to '{fn_name}': expected '{}', found '{}'",
                            i + 1,
                            self.type_name(*param),
                            self.type_name(*arg),
                        ),
                        diagnostic_codes::TYPE_MISMATCH,
                    );
                }
            }
            if declared_ret.is_unknown() {
                // The body has not produced a return type yet; check it
                // now so this call can resolve in the same iteration.
                self.check_function_body(decl, fn_ty);
                return self
                    .types
                    .function(fn_ty)
                    .map(|f| f.ret)
                    .unwrap_or(TypeId::UNKNOWN);
            }
            return declared_ret;
        }

        // Specialization over untyped parameters.
        if arg_tys.len() != params.len() {
            self.diags.error(
                call_span,
                format!(
                    "function '{fn_name}' expects {} argument(s), found {}",
                    params.len(),
                    arg_tys.len()
                ),
                diagnostic_codes::TYPE_MISMATCH,
            );
            return TypeId::UNKNOWN;
        }
        if arg_tys.iter().any(|t| t.is_unknown()) {
            return TypeId::UNKNOWN;
        }
        if let Some(index) = self.types.find_specialization(fn_ty, &arg_tys) {
            return self
                .types
                .function(fn_ty)
                .map(|f| f.specializations[index].ret)
                .unwrap_or(TypeId::UNKNOWN);
        }
        self.create_specialization(fn_ty, &arg_tys, self_ty)
    }

    // =========================================================================
    // Mutability
    // =========================================================================

    /// Reject writes to const bindings; the write location is reported,
    /// not the declaration.
    pub(crate) fn check_mutable(&mut self, target: NodeId, report_span: Span) {
        match self.arena.get(target).kind.clone() {
            NodeKind::Ident {
                symbol: Some(raw), ..
            } => {
                if self.scopes.symbol(SymbolId(raw)).is_const {
                    self.diags.error(
                        report_span,
                        "Cannot modify const variable",
                        diagnostic_codes::CONST_ASSIGNMENT,
                    );
                }
            }
            NodeKind::Member { object, .. } | NodeKind::Index { object, .. } => {
                self.check_write_through(object, report_span);
            }
            _ => {}
        }
    }

    /// A write through `object` (member or index assignment target).
    /// Immutable references reject the write; otherwise const-ness
    /// follows the base binding, except through a reference, which
    /// decouples the target from the binding that holds it.
    pub(crate) fn check_write_through(&mut self, object: NodeId, report_span: Span) {
        let obj_ty = self.types.resolve_alias(self.arena.ty(object));
        if let TypeKind::Ref { mutable, .. } = self.types.kind(obj_ty) {
            if !*mutable {
                self.diags.error(
                    report_span,
                    "cannot modify through an immutable reference",
                    diagnostic_codes::CONST_ASSIGNMENT,
                );
            }
            return;
        }
        self.check_mutable(object, report_span);
    }

    fn expect_bool(&mut self, ty: TypeId, span: Span, what: &str) {
        if !ty.is_unknown() && !self.types.equal(ty, TypeId::BOOL) {
            self.diags.error(
                span,
                format!("{what} must be 'bool', found '{}'", self.type_name(ty)),
                diagnostic_codes::NON_BOOL_OPERAND,
            );
        }
    }
}

#[cfg(test)]
#[path = "../tests/engine_tests.rs"]
mod tests;
