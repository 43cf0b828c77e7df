//! On-demand scanner for Jolt source text.
//!
//! The scanner produces one token per call; whitespace and comments are
//! consumed between tokens. Lexical problems are reported through the
//! caller's `DiagnosticContext` and scanning continues. After the end of
//! input every call returns another EOF token.

use jolt_common::{DiagnosticContext, Span, diagnostic_codes};

use crate::token::{IntSuffix, KEYWORDS, Token, TokenKind};

/// Cloning a scanner snapshots its position, which is how the parser
/// implements bounded lookahead.
#[derive(Clone)]
pub struct Scanner<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    /// Byte offset of the next unconsumed character.
    #[must_use]
    pub fn offset(&self) -> u32 {
        self.pos as u32
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.source[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Consume `expected` if it is next; returns whether it was consumed.
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_trivia(&mut self, diags: &mut DiagnosticContext) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_second() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek_second() == Some('*') => {
                    let start = self.pos as u32;
                    self.bump();
                    self.bump();
                    let mut terminated = false;
                    while let Some(c) = self.bump() {
                        if c == '*' && self.eat('/') {
                            terminated = true;
                            break;
                        }
                    }
                    if !terminated {
                        diags.error(
                            Span::new(start, self.pos as u32),
                            "unterminated block comment",
                            diagnostic_codes::UNTERMINATED_COMMENT,
                        );
                    }
                }
                _ => break,
            }
        }
    }

    /// Lex the next token. Repeats EOF once the input is exhausted.
    pub fn next_token(&mut self, diags: &mut DiagnosticContext) -> Token {
        loop {
            self.skip_trivia(diags);
            let start = self.pos as u32;
            let Some(ch) = self.peek() else {
                return Token::eof(self.source.len() as u32);
            };

            if ch.is_ascii_digit() {
                return self.scan_number(diags);
            }
            if ch.is_ascii_alphabetic() || ch == '_' {
                return self.scan_identifier();
            }
            if ch == '"' {
                return self.scan_string(diags);
            }

            self.bump();
            let kind = match ch {
                '(' => TokenKind::LeftParen,
                ')' => TokenKind::RightParen,
                '{' => TokenKind::LeftBrace,
                '}' => TokenKind::RightBrace,
                '[' => TokenKind::LeftBracket,
                ']' => TokenKind::RightBracket,
                ',' => TokenKind::Comma,
                ';' => TokenKind::Semicolon,
                ':' => TokenKind::Colon,
                '.' => {
                    if self.source[self.pos..].starts_with("..") {
                        self.bump();
                        self.bump();
                        TokenKind::Ellipsis
                    } else {
                        TokenKind::Dot
                    }
                }
                '?' => TokenKind::Question,
                '+' => {
                    if self.eat('+') {
                        TokenKind::PlusPlus
                    } else if self.eat('=') {
                        TokenKind::PlusEquals
                    } else {
                        TokenKind::Plus
                    }
                }
                '-' => {
                    if self.eat('-') {
                        TokenKind::MinusMinus
                    } else if self.eat('=') {
                        TokenKind::MinusEquals
                    } else {
                        TokenKind::Minus
                    }
                }
                '*' => {
                    if self.eat('=') {
                        TokenKind::StarEquals
                    } else {
                        TokenKind::Star
                    }
                }
                '/' => {
                    if self.eat('=') {
                        TokenKind::SlashEquals
                    } else {
                        TokenKind::Slash
                    }
                }
                '%' => {
                    if self.eat('=') {
                        TokenKind::PercentEquals
                    } else {
                        TokenKind::Percent
                    }
                }
                '=' => {
                    if self.eat('=') {
                        TokenKind::EqualsEquals
                    } else {
                        TokenKind::Equals
                    }
                }
                '!' => {
                    if self.eat('=') {
                        TokenKind::BangEquals
                    } else {
                        TokenKind::Bang
                    }
                }
                '<' => {
                    if self.eat('<') {
                        if self.eat('=') {
                            TokenKind::LessLessEquals
                        } else {
                            TokenKind::LessLess
                        }
                    } else if self.eat('=') {
                        TokenKind::LessEquals
                    } else {
                        TokenKind::Less
                    }
                }
                '>' => {
                    if self.eat('>') {
                        if self.eat('=') {
                            TokenKind::GreaterGreaterEquals
                        } else {
                            TokenKind::GreaterGreater
                        }
                    } else if self.eat('=') {
                        TokenKind::GreaterEquals
                    } else {
                        TokenKind::Greater
                    }
                }
                '&' => {
                    if self.eat('&') {
                        TokenKind::AmpersandAmpersand
                    } else if self.eat('=') {
                        TokenKind::AmpersandEquals
                    } else {
                        TokenKind::Ampersand
                    }
                }
                '|' => {
                    if self.eat('|') {
                        TokenKind::PipePipe
                    } else if self.eat('=') {
                        TokenKind::PipeEquals
                    } else {
                        TokenKind::Pipe
                    }
                }
                '^' => {
                    if self.eat('=') {
                        TokenKind::CaretEquals
                    } else {
                        TokenKind::Caret
                    }
                }
                _ => {
                    diags.error(
                        Span::new(start, self.pos as u32),
                        format!("unexpected character '{ch}'"),
                        diagnostic_codes::BAD_CHARACTER,
                    );
                    continue;
                }
            };

            let end = self.pos as u32;
            return Token {
                kind,
                text: self.source[start as usize..end as usize].to_string(),
                span: Span::new(start, end),
                suffix: None,
            };
        }
    }

    fn scan_digits(&mut self) -> bool {
        let mut any = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                any = true;
                self.bump();
            } else {
                break;
            }
        }
        any
    }

    fn scan_number(&mut self, diags: &mut DiagnosticContext) -> Token {
        let start = self.pos;
        self.scan_digits();
        let mut is_float = false;

        // A '.' only continues the number when a digit follows; otherwise
        // it belongs to a member access.
        if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.bump();
            self.scan_digits();
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            // Only consume the exponent when it is well-formed enough to
            // belong to the number (otherwise 'e' starts an identifier,
            // which is reported as a malformed literal below).
            let mark = self.pos;
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            if self.scan_digits() {
                is_float = true;
            } else {
                self.pos = mark;
            }
        }

        let digits_end = self.pos;
        let mut suffix = None;

        // Trailing identifier characters are either a subtype suffix or a
        // malformed literal like `12abc`.
        let tail_start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        if self.pos > tail_start {
            let tail = &self.source[tail_start..self.pos];
            match IntSuffix::from_str(tail) {
                Some(s) if !is_float => suffix = Some(s),
                Some(_) => {
                    diags.error(
                        Span::new(start as u32, self.pos as u32),
                        "integer suffix on a floating-point literal",
                        diagnostic_codes::MALFORMED_NUMBER,
                    );
                }
                None => {
                    diags.error(
                        Span::new(start as u32, self.pos as u32),
                        format!("malformed number literal '{}'", &self.source[start..self.pos]),
                        diagnostic_codes::MALFORMED_NUMBER,
                    );
                }
            }
        }

        Token {
            kind: if is_float {
                TokenKind::FloatLiteral
            } else {
                TokenKind::IntegerLiteral
            },
            text: self.source[start..digits_end].to_string(),
            span: Span::new(start as u32, self.pos as u32),
            suffix,
        }
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        let text = &self.source[start..self.pos];
        let kind = KEYWORDS
            .get(text)
            .copied()
            .unwrap_or(TokenKind::Identifier);
        Token {
            kind,
            text: text.to_string(),
            span: Span::new(start as u32, self.pos as u32),
            suffix: None,
        }
    }

    fn scan_string(&mut self, diags: &mut DiagnosticContext) -> Token {
        let start = self.pos;
        self.bump(); // opening quote
        let mut value = String::new();
        let mut terminated = false;

        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
            match c {
                '"' => {
                    terminated = true;
                    break;
                }
                '\\' => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('"') => value.push('"'),
                    Some('\\') => value.push('\\'),
                    Some('/') => value.push('/'),
                    Some('b') => value.push('\u{0008}'),
                    Some('f') => value.push('\u{000C}'),
                    Some('u') => {
                        // Unicode escapes pass through unchanged; the
                        // back end resolves them.
                        value.push('\\');
                        value.push('u');
                        for _ in 0..4 {
                            match self.peek() {
                                Some(h) if h.is_ascii_hexdigit() => {
                                    value.push(h);
                                    self.bump();
                                }
                                _ => break,
                            }
                        }
                    }
                    Some(other) => {
                        diags.error(
                            Span::new((self.pos - other.len_utf8() - 1) as u32, self.pos as u32),
                            format!("unknown escape sequence '\\{other}'"),
                            diagnostic_codes::BAD_CHARACTER,
                        );
                        value.push(other);
                    }
                    None => break,
                },
                _ => value.push(c),
            }
        }

        if !terminated {
            diags.error(
                Span::new(start as u32, self.pos as u32),
                "unterminated string literal",
                diagnostic_codes::UNTERMINATED_STRING,
            );
        }

        Token {
            kind: TokenKind::StringLiteral,
            text: value,
            span: Span::new(start as u32, self.pos as u32),
            suffix: None,
        }
    }
}

#[cfg(test)]
#[path = "../tests/scanner_tests.rs"]
mod tests;
