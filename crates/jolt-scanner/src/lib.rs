//! Scanner/tokenizer for the Jolt compiler.
//!
//! This crate provides:
//! - `TokenKind` - The closed set of token kinds, including the keyword set
//! - `Token` - One lexed token with its text and span
//! - `Scanner` - On-demand tokenizer over a source string

pub mod scanner;
pub mod token;

pub use scanner::Scanner;
pub use token::{IntSuffix, Token, TokenKind};
