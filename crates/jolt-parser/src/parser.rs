//! Recursive-descent parser for Jolt.
//!
//! Single-token lookahead, with Pratt-style binding powers for binary
//! expressions. Type annotations are resolved to `TypeId` handles through
//! the registry as they are parsed; anonymous object types are interned
//! structurally.
//!
//! On a parse error the parser emits one diagnostic at the current token
//! and skips to the next statement terminator (`;`, `}` or end of input),
//! keeping partial subtrees as placeholders so later statements still
//! parse.

use jolt_common::limits::MAX_PARSE_DEPTH;
use jolt_common::{DiagnosticContext, Span, diagnostic_codes};
use jolt_scanner::{IntSuffix, Scanner, Token, TokenKind};
use jolt_types::{NodeId, TypeId, TypeTable};

use crate::ast::{
    BinaryOp, DeclKind, FieldDef, IncDecOp, NodeArena, NodeKind, NumberValue, Param, UnaryOp,
};

/// Binding power of a binary operator token; tighter binds higher.
fn binary_bp(kind: TokenKind) -> Option<(BinaryOp, u8)> {
    let entry = match kind {
        TokenKind::Star => (BinaryOp::Mul, 110),
        TokenKind::Slash => (BinaryOp::Div, 110),
        TokenKind::Percent => (BinaryOp::Rem, 110),
        TokenKind::Plus => (BinaryOp::Add, 100),
        TokenKind::Minus => (BinaryOp::Sub, 100),
        TokenKind::LessLess => (BinaryOp::Shl, 90),
        TokenKind::GreaterGreater => (BinaryOp::Shr, 90),
        TokenKind::Less => (BinaryOp::Lt, 80),
        TokenKind::LessEquals => (BinaryOp::Le, 80),
        TokenKind::Greater => (BinaryOp::Gt, 80),
        TokenKind::GreaterEquals => (BinaryOp::Ge, 80),
        TokenKind::EqualsEquals => (BinaryOp::Eq, 70),
        TokenKind::BangEquals => (BinaryOp::Ne, 70),
        TokenKind::Ampersand => (BinaryOp::BitAnd, 60),
        TokenKind::Caret => (BinaryOp::BitXor, 50),
        TokenKind::Pipe => (BinaryOp::BitOr, 40),
        TokenKind::AmpersandAmpersand => (BinaryOp::And, 30),
        TokenKind::PipePipe => (BinaryOp::Or, 20),
        _ => return None,
    };
    Some(entry)
}

/// The compound-assignment operators and their underlying binary op.
fn compound_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::PlusEquals => BinaryOp::Add,
        TokenKind::MinusEquals => BinaryOp::Sub,
        TokenKind::StarEquals => BinaryOp::Mul,
        TokenKind::SlashEquals => BinaryOp::Div,
        TokenKind::PercentEquals => BinaryOp::Rem,
        TokenKind::AmpersandEquals => BinaryOp::BitAnd,
        TokenKind::PipeEquals => BinaryOp::BitOr,
        TokenKind::CaretEquals => BinaryOp::BitXor,
        TokenKind::LessLessEquals => BinaryOp::Shl,
        TokenKind::GreaterGreaterEquals => BinaryOp::Shr,
        _ => return None,
    };
    Some(op)
}

fn suffix_type(suffix: IntSuffix) -> TypeId {
    match suffix {
        IntSuffix::I8 => TypeId::I8,
        IntSuffix::I16 => TypeId::I16,
        IntSuffix::I32 => TypeId::I32,
        IntSuffix::I64 => TypeId::I64,
        IntSuffix::U8 => TypeId::U8,
        IntSuffix::U16 => TypeId::U16,
        IntSuffix::U32 => TypeId::U32,
        IntSuffix::U64 => TypeId::U64,
    }
}

pub struct ParserState<'src> {
    scanner: Scanner<'src>,
    current: Token,
    arena: NodeArena,
    types: TypeTable,
    diags: DiagnosticContext,
    depth: u32,
}

impl<'src> ParserState<'src> {
    #[must_use]
    pub fn new(file_name: impl Into<String>, source: &'src str) -> Self {
        Self::with_context(source, DiagnosticContext::new(file_name))
    }

    /// Parse with a caller-configured diagnostic context (e.g. one
    /// already switched to DIRECT mode).
    #[must_use]
    pub fn with_context(source: &'src str, mut diags: DiagnosticContext) -> Self {
        let mut scanner = Scanner::new(source);
        let current = scanner.next_token(&mut diags);
        Self {
            scanner,
            current,
            arena: NodeArena::new(),
            types: TypeTable::new(),
            diags,
            depth: 0,
        }
    }

    /// Take the parser apart after parsing.
    #[must_use]
    pub fn into_parts(self) -> (NodeArena, TypeTable, DiagnosticContext) {
        (self.arena, self.types, self.diags)
    }

    #[must_use]
    pub fn diagnostics(&self) -> &DiagnosticContext {
        &self.diags
    }

    // =========================================================================
    // Token plumbing
    // =========================================================================

    fn advance(&mut self) -> Token {
        let next = self.scanner.next_token(&mut self.diags);
        std::mem::replace(&mut self.current, next)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn describe_current(&self) -> String {
        if self.current.kind == TokenKind::Eof {
            "end of input".to_string()
        } else {
            format!("'{}'", self.current.text)
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Option<Token> {
        if self.at(kind) {
            Some(self.advance())
        } else {
            self.error_here(format!("expected {what}, found {}", self.describe_current()));
            None
        }
    }

    fn error_here(&mut self, message: String) {
        self.diags.error(
            self.current.span,
            message,
            diagnostic_codes::UNEXPECTED_TOKEN,
        );
    }

    /// Skip ahead to the next statement boundary. A `;` is consumed, a
    /// `}` is left for the enclosing construct.
    fn recover(&mut self) {
        while !self.current.kind.is_statement_terminator() {
            self.advance();
        }
        if self.at(TokenKind::Semicolon) {
            self.advance();
        }
    }

    fn error_node(&mut self) -> NodeId {
        let span = self.current.span;
        self.arena.alloc(NodeKind::Error, span)
    }

    // =========================================================================
    // Program and statements
    // =========================================================================

    /// Parse the whole source into a Program node that owns every
    /// statement.
    pub fn parse_program(&mut self) -> NodeId {
        let start = self.current.span;
        let mut stmts = Vec::new();
        while !self.at(TokenKind::Eof) {
            let before = self.current.span.start;
            stmts.push(self.parse_statement());
            // A statement that consumed nothing would loop forever; skip
            // the offending token.
            if self.current.span.start == before && !self.at(TokenKind::Eof) {
                self.advance();
            }
        }
        let span = start.merge(self.current.span);
        self.arena.alloc(NodeKind::Program { stmts, scope: None }, span)
    }

    fn parse_statement(&mut self) -> NodeId {
        match self.current.kind {
            TokenKind::VarKeyword | TokenKind::LetKeyword | TokenKind::ConstKeyword => {
                self.parse_var_decl()
            }
            TokenKind::FunctionKeyword => self.parse_function_decl(false),
            TokenKind::ExternalKeyword => {
                self.advance();
                if self.at(TokenKind::FunctionKeyword) {
                    self.parse_function_decl(true)
                } else {
                    self.error_here(format!(
                        "expected 'function' after 'external', found {}",
                        self.describe_current()
                    ));
                    self.recover();
                    self.error_node()
                }
            }
            TokenKind::StructKeyword => self.parse_struct_decl(),
            TokenKind::ReturnKeyword => {
                let start = self.advance().span;
                let value = if self.at(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression())
                };
                let end = self.current.span;
                if self.expect(TokenKind::Semicolon, "';'").is_none() {
                    self.recover();
                }
                self.arena
                    .alloc(NodeKind::Return { value }, start.merge(end))
            }
            TokenKind::BreakKeyword => {
                let span = self.advance().span;
                if self.expect(TokenKind::Semicolon, "';'").is_none() {
                    self.recover();
                }
                self.arena.alloc(NodeKind::Break, span)
            }
            TokenKind::ContinueKeyword => {
                let span = self.advance().span;
                if self.expect(TokenKind::Semicolon, "';'").is_none() {
                    self.recover();
                }
                self.arena.alloc(NodeKind::Continue, span)
            }
            TokenKind::IfKeyword => self.parse_if(),
            TokenKind::WhileKeyword => self.parse_while(),
            TokenKind::ForKeyword => self.parse_for(),
            TokenKind::LeftBrace if !self.object_literal_ahead() => self.parse_block(),
            TokenKind::Semicolon => {
                // Empty statement.
                let span = self.advance().span;
                self.arena.alloc(NodeKind::Error, span)
            }
            _ => {
                let expr = self.parse_expression();
                let span = self.arena.span(expr).merge(self.current.span);
                if self.expect(TokenKind::Semicolon, "';'").is_none() {
                    self.recover();
                }
                self.arena.alloc(NodeKind::ExprStmt { expr }, span)
            }
        }
    }

    fn parse_var_decl(&mut self) -> NodeId {
        let decl_kind = match self.current.kind {
            TokenKind::VarKeyword => DeclKind::Var,
            TokenKind::LetKeyword => DeclKind::Let,
            _ => DeclKind::Const,
        };
        let start = self.advance().span;

        let Some(name_tok) = self.expect(TokenKind::Identifier, "variable name") else {
            self.recover();
            return self.error_node();
        };

        let (annotation, array_size) = if self.eat(TokenKind::Colon) {
            let (ty, size) = self.parse_type();
            (Some(ty), size)
        } else {
            (None, None)
        };

        let init = if self.eat(TokenKind::Equals) {
            Some(self.parse_expression())
        } else {
            None
        };

        let end = self.current.span;
        if self.expect(TokenKind::Semicolon, "';'").is_none() {
            self.recover();
        }

        self.arena.alloc(
            NodeKind::VarDecl {
                decl_kind,
                name: name_tok.text,
                name_span: name_tok.span,
                annotation,
                array_size,
                init,
                symbol: None,
            },
            start.merge(end),
        )
    }

    /// Parse a function declaration; `external` prototypes end with `;`
    /// instead of a body.
    fn parse_function_decl(&mut self, external: bool) -> NodeId {
        let start = self.advance().span; // 'function'

        let Some(name_tok) = self.expect(TokenKind::Identifier, "function name") else {
            self.recover();
            return self.error_node();
        };

        let mut params = Vec::new();
        let mut variadic = false;
        if self.expect(TokenKind::LeftParen, "'('").is_some() {
            while !self.at(TokenKind::RightParen) && !self.at(TokenKind::Eof) {
                if self.eat(TokenKind::Ellipsis) {
                    variadic = true;
                    break;
                }
                let Some(param_tok) = self.expect(TokenKind::Identifier, "parameter name")
                else {
                    break;
                };
                let annotation = if self.eat(TokenKind::Colon) {
                    Some(self.parse_type().0)
                } else {
                    None
                };
                params.push(Param {
                    name: param_tok.text,
                    name_span: param_tok.span,
                    annotation,
                });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RightParen, "')'");
        }

        let return_annotation = if self.eat(TokenKind::Colon) {
            Some(self.parse_type().0)
        } else {
            None
        };

        let (body, end) = if external {
            let end = self.current.span;
            if self.expect(TokenKind::Semicolon, "';'").is_none() {
                self.recover();
            }
            (None, end)
        } else {
            let body = self.parse_block();
            (Some(body), self.arena.span(body))
        };

        self.arena.alloc(
            NodeKind::FunctionDecl {
                name: name_tok.text,
                name_span: name_tok.span,
                params,
                return_annotation,
                variadic,
                external,
                body,
                symbol: None,
            },
            start.merge(end),
        )
    }

    fn parse_struct_decl(&mut self) -> NodeId {
        let start = self.advance().span; // 'struct'

        let Some(name_tok) = self.expect(TokenKind::Identifier, "struct name") else {
            self.recover();
            return self.error_node();
        };

        let mut fields = Vec::new();
        let mut methods = Vec::new();
        if self.expect(TokenKind::LeftBrace, "'{'").is_some() {
            while !self.at(TokenKind::RightBrace) && !self.at(TokenKind::Eof) {
                if self.at(TokenKind::FunctionKeyword) {
                    methods.push(self.parse_function_decl(false));
                    continue;
                }
                let Some(field_tok) = self.expect(TokenKind::Identifier, "field name") else {
                    self.recover();
                    continue;
                };
                if self.expect(TokenKind::Colon, "':'").is_none() {
                    self.recover();
                    continue;
                }
                let (ty, _) = self.parse_type();
                let default = if self.eat(TokenKind::Equals) {
                    Some(self.parse_expression())
                } else {
                    None
                };
                if self.expect(TokenKind::Semicolon, "';'").is_none() {
                    self.recover();
                }
                fields.push(FieldDef {
                    name: field_tok.text,
                    name_span: field_tok.span,
                    ty,
                    default,
                });
            }
        }
        let end = self.current.span;
        self.expect(TokenKind::RightBrace, "'}'");

        self.arena.alloc(
            NodeKind::StructDecl {
                name: name_tok.text,
                name_span: name_tok.span,
                fields,
                methods,
                symbol: None,
            },
            start.merge(end),
        )
    }

    fn parse_if(&mut self) -> NodeId {
        let start = self.advance().span; // 'if'
        self.expect(TokenKind::LeftParen, "'('");
        let cond = self.parse_expression();
        self.expect(TokenKind::RightParen, "')'");
        let then_branch = self.parse_statement();
        let else_branch = if self.eat(TokenKind::ElseKeyword) {
            Some(self.parse_statement())
        } else {
            None
        };
        let end = self
            .arena
            .span(else_branch.unwrap_or(then_branch));
        self.arena.alloc(
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            },
            start.merge(end),
        )
    }

    fn parse_while(&mut self) -> NodeId {
        let start = self.advance().span; // 'while'
        self.expect(TokenKind::LeftParen, "'('");
        let cond = self.parse_expression();
        self.expect(TokenKind::RightParen, "')'");
        let body = self.parse_statement();
        let end = self.arena.span(body);
        self.arena
            .alloc(NodeKind::While { cond, body }, start.merge(end))
    }

    fn parse_for(&mut self) -> NodeId {
        let start = self.advance().span; // 'for'
        self.expect(TokenKind::LeftParen, "'('");

        let init = if self.eat(TokenKind::Semicolon) {
            None
        } else if matches!(
            self.current.kind,
            TokenKind::VarKeyword | TokenKind::LetKeyword | TokenKind::ConstKeyword
        ) {
            Some(self.parse_var_decl())
        } else {
            let expr = self.parse_expression();
            let span = self.arena.span(expr);
            self.expect(TokenKind::Semicolon, "';'");
            Some(self.arena.alloc(NodeKind::ExprStmt { expr }, span))
        };

        let cond = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression())
        };
        self.expect(TokenKind::Semicolon, "';'");

        let update = if self.at(TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expression())
        };
        self.expect(TokenKind::RightParen, "')'");

        let body = self.parse_statement();
        let end = self.arena.span(body);
        self.arena.alloc(
            NodeKind::For {
                init,
                cond,
                update,
                body,
            },
            start.merge(end),
        )
    }

    fn parse_block(&mut self) -> NodeId {
        let start = self.current.span;
        self.expect(TokenKind::LeftBrace, "'{'");
        let mut stmts = Vec::new();
        while !self.at(TokenKind::RightBrace) && !self.at(TokenKind::Eof) {
            let before = self.current.span.start;
            stmts.push(self.parse_statement());
            if self.current.span.start == before
                && !self.at(TokenKind::RightBrace)
                && !self.at(TokenKind::Eof)
            {
                self.advance();
            }
        }
        let end = self.current.span;
        self.expect(TokenKind::RightBrace, "'}'");
        self.arena
            .alloc(NodeKind::Block { stmts, scope: None }, start.merge(end))
    }

    /// The `{` tie-break: a `{` followed by an identifier and `:` is an
    /// object literal, otherwise a block.
    fn object_literal_ahead(&self) -> bool {
        let mut scanner = self.scanner.clone();
        let mut scratch = DiagnosticContext::new(self.diags.file_name());
        let first = scanner.next_token(&mut scratch);
        if first.kind != TokenKind::Identifier {
            return false;
        }
        scanner.next_token(&mut scratch).kind == TokenKind::Colon
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn parse_expression(&mut self) -> NodeId {
        if self.depth >= MAX_PARSE_DEPTH {
            self.error_here("expression is nested too deeply".to_string());
            return self.error_node();
        }
        self.depth += 1;
        let expr = self.parse_assignment();
        self.depth -= 1;
        expr
    }

    fn parse_assignment(&mut self) -> NodeId {
        let lhs = self.parse_ternary();
        if self.at(TokenKind::Equals) {
            self.advance();
            let value = self.parse_expression(); // right-associative
            return self.make_assignment(lhs, value);
        }
        if let Some(op) = compound_op(self.current.kind) {
            self.advance();
            let value = self.parse_expression();
            self.check_assign_target(lhs);
            let span = self.arena.span(lhs).merge(self.arena.span(value));
            return self.arena.alloc(
                NodeKind::CompoundAssign {
                    op,
                    target: lhs,
                    value,
                },
                span,
            );
        }
        lhs
    }

    /// Rewrite `target = value` into the assignment node matching the
    /// target shape.
    fn make_assignment(&mut self, target: NodeId, value: NodeId) -> NodeId {
        let span = self.arena.span(target).merge(self.arena.span(value));
        match self.arena.get(target).kind.clone() {
            NodeKind::Ident { .. } => self.arena.alloc(NodeKind::Assign { target, value }, span),
            NodeKind::Member {
                object,
                field,
                field_span,
            } => self.arena.alloc(
                NodeKind::MemberAssign {
                    object,
                    field,
                    field_span,
                    value,
                },
                span,
            ),
            NodeKind::Index { object, index } => self.arena.alloc(
                NodeKind::IndexAssign {
                    object,
                    index,
                    value,
                },
                span,
            ),
            _ => {
                self.diags.error(
                    self.arena.span(target),
                    "invalid assignment target",
                    diagnostic_codes::UNEXPECTED_TOKEN,
                );
                self.arena.alloc(NodeKind::Error, span)
            }
        }
    }

    fn check_assign_target(&mut self, target: NodeId) {
        if !matches!(
            self.arena.get(target).kind,
            NodeKind::Ident { .. } | NodeKind::Member { .. } | NodeKind::Index { .. }
        ) {
            self.diags.error(
                self.arena.span(target),
                "invalid assignment target",
                diagnostic_codes::UNEXPECTED_TOKEN,
            );
        }
    }

    fn parse_ternary(&mut self) -> NodeId {
        let cond = self.parse_binary(0);
        if !self.eat(TokenKind::Question) {
            return cond;
        }
        let then_expr = self.parse_expression();
        self.expect(TokenKind::Colon, "':'");
        let else_expr = self.parse_ternary(); // right-associative
        let span = self.arena.span(cond).merge(self.arena.span(else_expr));
        self.arena.alloc(
            NodeKind::Ternary {
                cond,
                then_expr,
                else_expr,
            },
            span,
        )
    }

    fn parse_binary(&mut self, min_bp: u8) -> NodeId {
        let mut lhs = self.parse_unary();
        while let Some((op, bp)) = binary_bp(self.current.kind) {
            if bp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_binary(bp + 1); // left-associative
            let span = self.arena.span(lhs).merge(self.arena.span(rhs));
            lhs = self.arena.alloc(NodeKind::Binary { op, lhs, rhs }, span);
        }
        lhs
    }

    fn parse_unary(&mut self) -> NodeId {
        if self.depth >= MAX_PARSE_DEPTH {
            self.error_here("expression is nested too deeply".to_string());
            return self.error_node();
        }
        self.depth += 1;
        let expr = match self.current.kind {
            TokenKind::Bang => self.parse_unary_op(UnaryOp::Not),
            TokenKind::Minus => self.parse_unary_op(UnaryOp::Neg),
            TokenKind::Plus => self.parse_unary_op(UnaryOp::Pos),
            TokenKind::PlusPlus => self.parse_prefix_op(IncDecOp::Increment),
            TokenKind::MinusMinus => self.parse_prefix_op(IncDecOp::Decrement),
            _ => self.parse_postfix(),
        };
        self.depth -= 1;
        expr
    }

    fn parse_unary_op(&mut self, op: UnaryOp) -> NodeId {
        let start = self.advance().span;
        let operand = self.parse_unary();
        let span = start.merge(self.arena.span(operand));
        self.arena.alloc(NodeKind::Unary { op, operand }, span)
    }

    fn parse_prefix_op(&mut self, op: IncDecOp) -> NodeId {
        let start = self.advance().span;
        let target = self.parse_unary();
        self.check_assign_target(target);
        let span = start.merge(self.arena.span(target));
        self.arena.alloc(NodeKind::Prefix { op, target }, span)
    }

    fn parse_postfix(&mut self) -> NodeId {
        let mut expr = self.parse_primary();
        loop {
            match self.current.kind {
                TokenKind::LeftParen => {
                    let (args, end) = self.parse_call_args();
                    let span = self.arena.span(expr).merge(end);
                    // `obj.method(...)` is a method call, not a call on a
                    // member value.
                    expr = if let NodeKind::Member {
                        object,
                        field,
                        field_span,
                    } = self.arena.get(expr).kind.clone()
                    {
                        self.arena.alloc(
                            NodeKind::MethodCall {
                                object,
                                method: field,
                                method_span: field_span,
                                args,
                            },
                            span,
                        )
                    } else {
                        self.arena.alloc(NodeKind::Call { callee: expr, args }, span)
                    };
                }
                TokenKind::Dot => {
                    self.advance();
                    let Some(field_tok) = self.expect(TokenKind::Identifier, "member name")
                    else {
                        break;
                    };
                    let span = self.arena.span(expr).merge(field_tok.span);
                    expr = self.arena.alloc(
                        NodeKind::Member {
                            object: expr,
                            field: field_tok.text,
                            field_span: field_tok.span,
                        },
                        span,
                    );
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let index = self.parse_expression();
                    let end = self.current.span;
                    self.expect(TokenKind::RightBracket, "']'");
                    let span = self.arena.span(expr).merge(end);
                    expr = self
                        .arena
                        .alloc(NodeKind::Index { object: expr, index }, span);
                }
                TokenKind::PlusPlus => {
                    let end = self.advance().span;
                    self.check_assign_target(expr);
                    let span = self.arena.span(expr).merge(end);
                    expr = self.arena.alloc(
                        NodeKind::Postfix {
                            op: IncDecOp::Increment,
                            target: expr,
                        },
                        span,
                    );
                }
                TokenKind::MinusMinus => {
                    let end = self.advance().span;
                    self.check_assign_target(expr);
                    let span = self.arena.span(expr).merge(end);
                    expr = self.arena.alloc(
                        NodeKind::Postfix {
                            op: IncDecOp::Decrement,
                            target: expr,
                        },
                        span,
                    );
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_call_args(&mut self) -> (Vec<NodeId>, Span) {
        self.advance(); // '('
        let mut args = Vec::new();
        while !self.at(TokenKind::RightParen) && !self.at(TokenKind::Eof) {
            args.push(self.parse_expression());
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        let end = self.current.span;
        self.expect(TokenKind::RightParen, "')'");
        (args, end)
    }

    fn parse_primary(&mut self) -> NodeId {
        match self.current.kind {
            TokenKind::IntegerLiteral => {
                let tok = self.advance();
                let value = match tok.text.parse::<i64>() {
                    Ok(v) => v,
                    Err(_) => {
                        self.diags.error(
                            tok.span,
                            format!("integer literal '{}' is out of range", tok.text),
                            diagnostic_codes::MALFORMED_NUMBER,
                        );
                        0
                    }
                };
                self.arena.alloc(
                    NodeKind::Number {
                        value: NumberValue::Int(value),
                        suffix: tok.suffix.map(suffix_type),
                    },
                    tok.span,
                )
            }
            TokenKind::FloatLiteral => {
                let tok = self.advance();
                let value = tok.text.parse::<f64>().unwrap_or(0.0);
                self.arena.alloc(
                    NodeKind::Number {
                        value: NumberValue::Float(value),
                        suffix: None,
                    },
                    tok.span,
                )
            }
            TokenKind::StringLiteral => {
                let tok = self.advance();
                self.arena
                    .alloc(NodeKind::Str { value: tok.text }, tok.span)
            }
            TokenKind::TrueKeyword => {
                let span = self.advance().span;
                self.arena.alloc(NodeKind::Bool { value: true }, span)
            }
            TokenKind::FalseKeyword => {
                let span = self.advance().span;
                self.arena.alloc(NodeKind::Bool { value: false }, span)
            }
            TokenKind::Identifier => {
                let tok = self.advance();
                self.arena.alloc(
                    NodeKind::Ident {
                        name: tok.text,
                        symbol: None,
                    },
                    tok.span,
                )
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression();
                self.expect(TokenKind::RightParen, "')'");
                expr
            }
            TokenKind::LeftBracket => self.parse_array_literal(),
            TokenKind::LeftBrace => self.parse_object_literal(),
            _ => {
                self.error_here(format!(
                    "expected expression, found {}",
                    self.describe_current()
                ));
                self.error_node()
            }
        }
    }

    fn parse_array_literal(&mut self) -> NodeId {
        let start = self.advance().span; // '['
        let mut elements = Vec::new();
        while !self.at(TokenKind::RightBracket) && !self.at(TokenKind::Eof) {
            elements.push(self.parse_expression());
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        let end = self.current.span;
        self.expect(TokenKind::RightBracket, "']'");
        self.arena
            .alloc(NodeKind::ArrayLit { elements }, start.merge(end))
    }

    fn parse_object_literal(&mut self) -> NodeId {
        let start = self.advance().span; // '{'
        let mut fields = Vec::new();
        while !self.at(TokenKind::RightBrace) && !self.at(TokenKind::Eof) {
            let Some(key_tok) = self.expect(TokenKind::Identifier, "field name") else {
                break;
            };
            if self.expect(TokenKind::Colon, "':'").is_none() {
                break;
            }
            let value = self.parse_expression();
            fields.push((key_tok.text, key_tok.span, value));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        let end = self.current.span;
        self.expect(TokenKind::RightBrace, "'}'");
        self.arena
            .alloc(NodeKind::ObjectLit { fields }, start.merge(end))
    }

    // =========================================================================
    // Type annotations
    // =========================================================================

    /// Parse a type annotation into a `TypeId` through the registry.
    /// Returns the declared fixed array size, if one was written.
    fn parse_type(&mut self) -> (TypeId, Option<u32>) {
        if self.eat(TokenKind::RefKeyword) {
            let (inner, _) = self.parse_type();
            return (self.types.ref_to(inner, true), None);
        }

        let mut ty = match self.current.kind {
            TokenKind::I8Keyword => {
                self.advance();
                TypeId::I8
            }
            TokenKind::I16Keyword => {
                self.advance();
                TypeId::I16
            }
            TokenKind::I32Keyword => {
                self.advance();
                TypeId::I32
            }
            TokenKind::I64Keyword => {
                self.advance();
                TypeId::I64
            }
            TokenKind::U8Keyword => {
                self.advance();
                TypeId::U8
            }
            TokenKind::U16Keyword => {
                self.advance();
                TypeId::U16
            }
            TokenKind::U32Keyword => {
                self.advance();
                TypeId::U32
            }
            TokenKind::U64Keyword => {
                self.advance();
                TypeId::U64
            }
            TokenKind::IntKeyword => {
                self.advance();
                self.types
                    .lookup_named("int")
                    .expect("builtin alias is always registered")
            }
            TokenKind::Identifier => {
                let tok = self.advance();
                self.types.named_placeholder(&tok.text)
            }
            TokenKind::LeftBrace => self.parse_object_type(),
            _ => {
                self.error_here(format!("expected type, found {}", self.describe_current()));
                TypeId::UNKNOWN
            }
        };

        let mut size = None;
        while self.at(TokenKind::LeftBracket) {
            self.advance();
            if self.at(TokenKind::IntegerLiteral) {
                let tok = self.advance();
                match tok.text.parse::<u32>() {
                    Ok(n) if n > 0 => size = Some(n),
                    _ => {
                        self.diags.error(
                            tok.span,
                            format!("invalid array size '{}'", tok.text),
                            diagnostic_codes::INVALID_ARRAY_SIZE,
                        );
                    }
                }
            }
            self.expect(TokenKind::RightBracket, "']'");
            ty = self.types.array_of(ty);
        }
        (ty, size)
    }

    /// Anonymous object type: `{ name: T, ... }`, structurally interned.
    fn parse_object_type(&mut self) -> TypeId {
        self.advance(); // '{'
        let mut fields = Vec::new();
        while !self.at(TokenKind::RightBrace) && !self.at(TokenKind::Eof) {
            let Some(name_tok) = self.expect(TokenKind::Identifier, "field name") else {
                break;
            };
            if self.expect(TokenKind::Colon, "':'").is_none() {
                break;
            }
            let (field_ty, _) = self.parse_type();
            fields.push((name_tok.text, field_ty));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RightBrace, "'}'");
        self.types.intern_object(fields, None)
    }
}

#[cfg(test)]
#[path = "../tests/parser_tests.rs"]
mod tests;
