//! Common types and utilities for the Jolt compiler.
//!
//! This crate provides foundational types used across all jolt crates:
//! - Source spans (`Span`)
//! - Position/Range types for line/column source locations (`LineMap`)
//! - Mutable document text with range edits (`TextBuffer`)
//! - Diagnostics (`Diagnostic`, `DiagnosticContext`)
//! - Compiler limits and thresholds

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Position/Range types for line/column source locations
pub mod position;
pub use position::{LineMap, Location, Position, Range};

// Mutable document content
pub mod text;
pub use text::TextBuffer;

// Diagnostics
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticContext, Severity, diagnostic_codes};

// Centralized limits and thresholds
pub mod limits;
