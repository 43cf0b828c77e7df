//! Token kinds and token values produced by the scanner.

use jolt_common::Span;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

/// Every token kind the scanner can produce.
///
/// The keyword set is closed: `var let const function external struct ref
/// return break continue if else for while true false i8 i16 i32 i64 u8
/// u16 u32 u64 int`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Punctuation
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,
    Colon,
    Dot,
    Ellipsis,
    Question,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,
    Equals,
    PlusEquals,
    MinusEquals,
    StarEquals,
    SlashEquals,
    PercentEquals,
    AmpersandEquals,
    PipeEquals,
    CaretEquals,
    LessLessEquals,
    GreaterGreaterEquals,
    EqualsEquals,
    BangEquals,
    Less,
    LessEquals,
    Greater,
    GreaterEquals,
    LessLess,
    GreaterGreater,
    Ampersand,
    Pipe,
    Caret,
    AmpersandAmpersand,
    PipePipe,
    Bang,

    // Literals
    IntegerLiteral,
    FloatLiteral,
    StringLiteral,

    // Identifiers and keywords
    Identifier,
    VarKeyword,
    LetKeyword,
    ConstKeyword,
    FunctionKeyword,
    ExternalKeyword,
    StructKeyword,
    RefKeyword,
    ReturnKeyword,
    BreakKeyword,
    ContinueKeyword,
    IfKeyword,
    ElseKeyword,
    ForKeyword,
    WhileKeyword,
    TrueKeyword,
    FalseKeyword,
    I8Keyword,
    I16Keyword,
    I32Keyword,
    I64Keyword,
    U8Keyword,
    U16Keyword,
    U32Keyword,
    U64Keyword,
    IntKeyword,

    Eof,
}

impl TokenKind {
    /// Whether this kind is one of the fixed-width integer keywords or the
    /// platform alias `int`.
    #[must_use]
    pub const fn is_integer_type_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::I8Keyword
                | TokenKind::I16Keyword
                | TokenKind::I32Keyword
                | TokenKind::I64Keyword
                | TokenKind::U8Keyword
                | TokenKind::U16Keyword
                | TokenKind::U32Keyword
                | TokenKind::U64Keyword
                | TokenKind::IntKeyword
        )
    }

    /// Whether this kind starts a statement boundary for error recovery.
    #[must_use]
    pub const fn is_statement_terminator(self) -> bool {
        matches!(
            self,
            TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof
        )
    }
}

/// Integer subtype hint from a numeric literal suffix (`42u8`, `7i64`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntSuffix {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntSuffix {
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "i8" => Some(IntSuffix::I8),
            "i16" => Some(IntSuffix::I16),
            "i32" => Some(IntSuffix::I32),
            "i64" => Some(IntSuffix::I64),
            "u8" => Some(IntSuffix::U8),
            "u16" => Some(IntSuffix::U16),
            "u32" => Some(IntSuffix::U32),
            "u64" => Some(IntSuffix::U64),
            _ => None,
        }
    }
}

/// One lexed token.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The lexeme. For string literals this is the unescaped value.
    pub text: String,
    pub span: Span,
    /// Integer subtype hint, only ever set on `IntegerLiteral`.
    pub suffix: Option<IntSuffix>,
}

impl Token {
    #[must_use]
    pub fn eof(offset: u32) -> Self {
        Self {
            kind: TokenKind::Eof,
            text: String::new(),
            span: Span::at(offset),
            suffix: None,
        }
    }
}

/// Keyword lookup table. Identifiers are matched against this after lexing.
pub static KEYWORDS: Lazy<FxHashMap<&'static str, TokenKind>> = Lazy::new(|| {
    let mut map = FxHashMap::default();
    map.insert("var", TokenKind::VarKeyword);
    map.insert("let", TokenKind::LetKeyword);
    map.insert("const", TokenKind::ConstKeyword);
    map.insert("function", TokenKind::FunctionKeyword);
    map.insert("external", TokenKind::ExternalKeyword);
    map.insert("struct", TokenKind::StructKeyword);
    map.insert("ref", TokenKind::RefKeyword);
    map.insert("return", TokenKind::ReturnKeyword);
    map.insert("break", TokenKind::BreakKeyword);
    map.insert("continue", TokenKind::ContinueKeyword);
    map.insert("if", TokenKind::IfKeyword);
    map.insert("else", TokenKind::ElseKeyword);
    map.insert("for", TokenKind::ForKeyword);
    map.insert("while", TokenKind::WhileKeyword);
    map.insert("true", TokenKind::TrueKeyword);
    map.insert("false", TokenKind::FalseKeyword);
    map.insert("i8", TokenKind::I8Keyword);
    map.insert("i16", TokenKind::I16Keyword);
    map.insert("i32", TokenKind::I32Keyword);
    map.insert("i64", TokenKind::I64Keyword);
    map.insert("u8", TokenKind::U8Keyword);
    map.insert("u16", TokenKind::U16Keyword);
    map.insert("u32", TokenKind::U32Keyword);
    map.insert("u64", TokenKind::U64Keyword);
    map.insert("int", TokenKind::IntKeyword);
    map
});
