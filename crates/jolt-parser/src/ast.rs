//! The Jolt syntax tree.
//!
//! Nodes live in a `NodeArena` and refer to each other by `NodeId`, so
//! the ownership graph stays acyclic even though function types point
//! back at declaration bodies. Each node carries its span and, once the
//! type engine has run, its resolved `TypeId`.
//!
//! Symbol and scope links are stored as raw indices into the checker's
//! arenas (`symbol`/`scope` slots); the parser leaves them empty.

use jolt_common::Span;
use jolt_types::{NodeId, TypeId};

/// Declaration kind of a variable statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeclKind {
    Var,
    Let,
    Const,
}

/// Prefix operators that produce a value from one operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Neg,
    /// `+`
    Pos,
}

/// `++` / `--`, in either prefix or postfix position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IncDecOp {
    Increment,
    Decrement,
}

/// Binary operators, including the targets of compound assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
}

impl BinaryOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Comparison operators yield `bool` regardless of operand type.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge
                | BinaryOp::Eq
                | BinaryOp::Ne
        )
    }

    #[must_use]
    pub const fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    #[must_use]
    pub const fn is_shift(self) -> bool {
        matches!(self, BinaryOp::Shl | BinaryOp::Shr)
    }

    #[must_use]
    pub const fn is_bitwise(self) -> bool {
        matches!(self, BinaryOp::BitAnd | BinaryOp::BitXor | BinaryOp::BitOr)
    }
}

/// A numeric literal value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NumberValue {
    Int(i64),
    Float(f64),
}

/// One function parameter.
#[derive(Clone, Debug)]
pub struct Param {
    pub name: String,
    pub name_span: Span,
    /// Annotation type, `None` for untyped parameters awaiting
    /// specialization.
    pub annotation: Option<TypeId>,
}

/// One struct field, with an optional default-value expression.
#[derive(Clone, Debug)]
pub struct FieldDef {
    pub name: String,
    pub name_span: Span,
    pub ty: TypeId,
    pub default: Option<NodeId>,
}

/// One syntax tree node kind. `symbol` and `scope` slots are indices into
/// the checker's arenas, filled in during inference.
#[derive(Clone, Debug)]
pub enum NodeKind {
    Program {
        stmts: Vec<NodeId>,
        scope: Option<u32>,
    },
    Block {
        stmts: Vec<NodeId>,
        scope: Option<u32>,
    },
    VarDecl {
        decl_kind: DeclKind,
        name: String,
        name_span: Span,
        annotation: Option<TypeId>,
        array_size: Option<u32>,
        init: Option<NodeId>,
        symbol: Option<u32>,
    },
    FunctionDecl {
        name: String,
        name_span: Span,
        params: Vec<Param>,
        return_annotation: Option<TypeId>,
        variadic: bool,
        external: bool,
        /// `None` for external prototypes.
        body: Option<NodeId>,
        symbol: Option<u32>,
    },
    StructDecl {
        name: String,
        name_span: Span,
        fields: Vec<FieldDef>,
        /// Method declarations (`FunctionDecl` nodes).
        methods: Vec<NodeId>,
        symbol: Option<u32>,
    },
    Return {
        value: Option<NodeId>,
    },
    Break,
    Continue,
    If {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    While {
        cond: NodeId,
        body: NodeId,
    },
    For {
        init: Option<NodeId>,
        cond: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    },
    ExprStmt {
        expr: NodeId,
    },
    Binary {
        op: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
    },
    Prefix {
        op: IncDecOp,
        target: NodeId,
    },
    Postfix {
        op: IncDecOp,
        target: NodeId,
    },
    Call {
        callee: NodeId,
        args: Vec<NodeId>,
    },
    MethodCall {
        object: NodeId,
        method: String,
        method_span: Span,
        args: Vec<NodeId>,
    },
    Ident {
        name: String,
        symbol: Option<u32>,
    },
    Number {
        value: NumberValue,
        /// Subtype selected by a literal suffix (`7u8`).
        suffix: Option<TypeId>,
    },
    Str {
        value: String,
    },
    Bool {
        value: bool,
    },
    Assign {
        /// An `Ident` node.
        target: NodeId,
        value: NodeId,
    },
    CompoundAssign {
        op: BinaryOp,
        target: NodeId,
        value: NodeId,
    },
    Member {
        object: NodeId,
        field: String,
        field_span: Span,
    },
    MemberAssign {
        object: NodeId,
        field: String,
        field_span: Span,
        value: NodeId,
    },
    Ternary {
        cond: NodeId,
        then_expr: NodeId,
        else_expr: NodeId,
    },
    Index {
        object: NodeId,
        index: NodeId,
    },
    IndexAssign {
        object: NodeId,
        index: NodeId,
        value: NodeId,
    },
    ArrayLit {
        elements: Vec<NodeId>,
    },
    ObjectLit {
        /// Ordered (key, key span, value expression) entries.
        fields: Vec<(String, Span, NodeId)>,
    },
    /// Placeholder kept after error recovery so partial trees survive.
    Error,
}

/// One node: kind, source span, and resolved type (Unknown until the
/// engine has run; statements generally stay Unknown).
#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub ty: TypeId,
}

/// Arena owning every node of one parsed program, including the
/// specialization body clones minted during inference.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            span,
            ty: TypeId::UNKNOWN,
        });
        id
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    #[must_use]
    pub fn ty(&self, id: NodeId) -> TypeId {
        self.nodes[id.0 as usize].ty
    }

    pub fn set_ty(&mut self, id: NodeId, ty: TypeId) {
        self.nodes[id.0 as usize].ty = ty;
    }

    #[must_use]
    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.0 as usize].span
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate all node ids in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// Child node ids of `id`, in source order. Used by generic walks
    /// (literal seeding, index building).
    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        match &self.get(id).kind {
            NodeKind::Program { stmts, .. } | NodeKind::Block { stmts, .. } => {
                out.extend(stmts.iter().copied());
            }
            NodeKind::VarDecl { init, .. } => out.extend(init.iter().copied()),
            NodeKind::FunctionDecl { body, .. } => out.extend(body.iter().copied()),
            NodeKind::StructDecl {
                fields, methods, ..
            } => {
                out.extend(fields.iter().filter_map(|f| f.default));
                out.extend(methods.iter().copied());
            }
            NodeKind::Return { value } => out.extend(value.iter().copied()),
            NodeKind::Break | NodeKind::Continue | NodeKind::Error => {}
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                out.push(*cond);
                out.push(*then_branch);
                out.extend(else_branch.iter().copied());
            }
            NodeKind::While { cond, body } => {
                out.push(*cond);
                out.push(*body);
            }
            NodeKind::For {
                init,
                cond,
                update,
                body,
            } => {
                out.extend(init.iter().copied());
                out.extend(cond.iter().copied());
                out.extend(update.iter().copied());
                out.push(*body);
            }
            NodeKind::ExprStmt { expr } => out.push(*expr),
            NodeKind::Binary { lhs, rhs, .. } => {
                out.push(*lhs);
                out.push(*rhs);
            }
            NodeKind::Unary { operand, .. } => out.push(*operand),
            NodeKind::Prefix { target, .. } | NodeKind::Postfix { target, .. } => {
                out.push(*target);
            }
            NodeKind::Call { callee, args } => {
                out.push(*callee);
                out.extend(args.iter().copied());
            }
            NodeKind::MethodCall { object, args, .. } => {
                out.push(*object);
                out.extend(args.iter().copied());
            }
            NodeKind::Ident { .. }
            | NodeKind::Number { .. }
            | NodeKind::Str { .. }
            | NodeKind::Bool { .. } => {}
            NodeKind::Assign { target, value } => {
                out.push(*target);
                out.push(*value);
            }
            NodeKind::CompoundAssign { target, value, .. } => {
                out.push(*target);
                out.push(*value);
            }
            NodeKind::Member { object, .. } => out.push(*object),
            NodeKind::MemberAssign { object, value, .. } => {
                out.push(*object);
                out.push(*value);
            }
            NodeKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                out.push(*cond);
                out.push(*then_expr);
                out.push(*else_expr);
            }
            NodeKind::Index { object, index } => {
                out.push(*object);
                out.push(*index);
            }
            NodeKind::IndexAssign {
                object,
                index,
                value,
            } => {
                out.push(*object);
                out.push(*index);
                out.push(*value);
            }
            NodeKind::ArrayLit { elements } => out.extend(elements.iter().copied()),
            NodeKind::ObjectLit { fields } => out.extend(fields.iter().map(|(_, _, v)| *v)),
        }
        out
    }

    /// Deep-clone the subtree rooted at `id` into fresh nodes.
    ///
    /// Types are reset to Unknown and symbol/scope links cleared: the
    /// clone is typed independently (this is how function specializations
    /// get their own typed bodies).
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let span = self.span(id);
        let kind = self.get(id).kind.clone();
        let new_kind = match kind {
            NodeKind::Program { stmts, .. } => NodeKind::Program {
                stmts: stmts.iter().map(|s| self.clone_subtree(*s)).collect(),
                scope: None,
            },
            NodeKind::Block { stmts, .. } => NodeKind::Block {
                stmts: stmts.iter().map(|s| self.clone_subtree(*s)).collect(),
                scope: None,
            },
            NodeKind::VarDecl {
                decl_kind,
                name,
                name_span,
                annotation,
                array_size,
                init,
                ..
            } => NodeKind::VarDecl {
                decl_kind,
                name,
                name_span,
                annotation,
                array_size,
                init: init.map(|n| self.clone_subtree(n)),
                symbol: None,
            },
            NodeKind::FunctionDecl {
                name,
                name_span,
                params,
                return_annotation,
                variadic,
                external,
                body,
                ..
            } => NodeKind::FunctionDecl {
                name,
                name_span,
                params,
                return_annotation,
                variadic,
                external,
                body: body.map(|n| self.clone_subtree(n)),
                symbol: None,
            },
            NodeKind::StructDecl {
                name,
                name_span,
                fields,
                methods,
                ..
            } => NodeKind::StructDecl {
                name,
                name_span,
                fields: fields
                    .into_iter()
                    .map(|f| {
                        let default = f.default.map(|n| self.clone_subtree(n));
                        FieldDef {
                            name: f.name,
                            name_span: f.name_span,
                            ty: f.ty,
                            default,
                        }
                    })
                    .collect(),
                methods: methods.iter().map(|m| self.clone_subtree(*m)).collect(),
                symbol: None,
            },
            NodeKind::Return { value } => NodeKind::Return {
                value: value.map(|n| self.clone_subtree(n)),
            },
            NodeKind::Break => NodeKind::Break,
            NodeKind::Continue => NodeKind::Continue,
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => NodeKind::If {
                cond: self.clone_subtree(cond),
                then_branch: self.clone_subtree(then_branch),
                else_branch: else_branch.map(|n| self.clone_subtree(n)),
            },
            NodeKind::While { cond, body } => NodeKind::While {
                cond: self.clone_subtree(cond),
                body: self.clone_subtree(body),
            },
            NodeKind::For {
                init,
                cond,
                update,
                body,
            } => NodeKind::For {
                init: init.map(|n| self.clone_subtree(n)),
                cond: cond.map(|n| self.clone_subtree(n)),
                update: update.map(|n| self.clone_subtree(n)),
                body: self.clone_subtree(body),
            },
            NodeKind::ExprStmt { expr } => NodeKind::ExprStmt {
                expr: self.clone_subtree(expr),
            },
            NodeKind::Binary { op, lhs, rhs } => NodeKind::Binary {
                op,
                lhs: self.clone_subtree(lhs),
                rhs: self.clone_subtree(rhs),
            },
            NodeKind::Unary { op, operand } => NodeKind::Unary {
                op,
                operand: self.clone_subtree(operand),
            },
            NodeKind::Prefix { op, target } => NodeKind::Prefix {
                op,
                target: self.clone_subtree(target),
            },
            NodeKind::Postfix { op, target } => NodeKind::Postfix {
                op,
                target: self.clone_subtree(target),
            },
            NodeKind::Call { callee, args } => NodeKind::Call {
                callee: self.clone_subtree(callee),
                args: args.iter().map(|a| self.clone_subtree(*a)).collect(),
            },
            NodeKind::MethodCall {
                object,
                method,
                method_span,
                args,
            } => NodeKind::MethodCall {
                object: self.clone_subtree(object),
                method,
                method_span,
                args: args.iter().map(|a| self.clone_subtree(*a)).collect(),
            },
            NodeKind::Ident { name, .. } => NodeKind::Ident { name, symbol: None },
            NodeKind::Number { value, suffix } => NodeKind::Number { value, suffix },
            NodeKind::Str { value } => NodeKind::Str { value },
            NodeKind::Bool { value } => NodeKind::Bool { value },
            NodeKind::Assign { target, value } => NodeKind::Assign {
                target: self.clone_subtree(target),
                value: self.clone_subtree(value),
            },
            NodeKind::CompoundAssign { op, target, value } => NodeKind::CompoundAssign {
                op,
                target: self.clone_subtree(target),
                value: self.clone_subtree(value),
            },
            NodeKind::Member {
                object,
                field,
                field_span,
            } => NodeKind::Member {
                object: self.clone_subtree(object),
                field,
                field_span,
            },
            NodeKind::MemberAssign {
                object,
                field,
                field_span,
                value,
            } => NodeKind::MemberAssign {
                object: self.clone_subtree(object),
                field,
                field_span,
                value: self.clone_subtree(value),
            },
            NodeKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => NodeKind::Ternary {
                cond: self.clone_subtree(cond),
                then_expr: self.clone_subtree(then_expr),
                else_expr: self.clone_subtree(else_expr),
            },
            NodeKind::Index { object, index } => NodeKind::Index {
                object: self.clone_subtree(object),
                index: self.clone_subtree(index),
            },
            NodeKind::IndexAssign {
                object,
                index,
                value,
            } => NodeKind::IndexAssign {
                object: self.clone_subtree(object),
                index: self.clone_subtree(index),
                value: self.clone_subtree(value),
            },
            NodeKind::ArrayLit { elements } => NodeKind::ArrayLit {
                elements: elements.iter().map(|e| self.clone_subtree(*e)).collect(),
            },
            NodeKind::ObjectLit { fields } => NodeKind::ObjectLit {
                fields: fields
                    .into_iter()
                    .map(|(k, s, v)| {
                        let v = self.clone_subtree(v);
                        (k, s, v)
                    })
                    .collect(),
            },
            NodeKind::Error => NodeKind::Error,
        };
        self.alloc(new_kind, span)
    }
}
