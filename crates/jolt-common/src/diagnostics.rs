//! Diagnostics for the Jolt compiler and language server.
//!
//! A `DiagnosticContext` either collects diagnostics into an ordered list
//! (COLLECT mode, the default) or writes each one immediately through an
//! attached byte sink in the fixed textual form (DIRECT mode), keeping
//! only the per-severity counts. The mode and sink can be switched at any
//! time.
//!
//! Diagnostics are deduplicated by `(start offset, code)`: iterative type
//! inference may visit the same node more than once, and each problem must
//! reach the user exactly once.

use std::io::Write;

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::position::{LineMap, Range};
use crate::span::Span;

/// Diagnostic severity, ordered from most to least severe.
/// The numeric values mirror the LSP `DiagnosticSeverity` enum.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    /// LSP wire value: 1=Error, 2=Warning, 3=Information, 4=Hint.
    #[must_use]
    pub const fn lsp_value(self) -> u32 {
        match self {
            Severity::Error => 1,
            Severity::Warning => 2,
            Severity::Info => 3,
            Severity::Hint => 4,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
            Severity::Hint => "HINT",
        }
    }

    const fn index(self) -> usize {
        match self {
            Severity::Error => 0,
            Severity::Warning => 1,
            Severity::Info => 2,
            Severity::Hint => 3,
        }
    }
}

/// Diagnostic codes, grouped by the error taxonomy.
pub mod diagnostic_codes {
    /// No code attached.
    pub const NONE: u32 = 0;

    // Lexical
    pub const BAD_CHARACTER: u32 = 1001;
    pub const UNTERMINATED_STRING: u32 = 1002;
    pub const UNTERMINATED_COMMENT: u32 = 1003;
    pub const MALFORMED_NUMBER: u32 = 1004;

    // Syntactic
    pub const UNEXPECTED_TOKEN: u32 = 1101;
    pub const MISSING_TERMINATOR: u32 = 1102;
    pub const UNBALANCED_BRACKETS: u32 = 1103;

    // Declaration
    pub const DUPLICATE_DECLARATION: u32 = 1201;
    pub const EXTERNAL_MISSING_ANNOTATION: u32 = 1202;
    pub const INVALID_ARRAY_SIZE: u32 = 1203;

    // Resolution
    pub const UNDEFINED_VARIABLE: u32 = 1301;
    pub const UNDEFINED_FUNCTION: u32 = 1302;
    pub const UNKNOWN_MEMBER: u32 = 1303;
    pub const UNKNOWN_TYPE: u32 = 1304;

    // Type
    pub const TYPE_MISMATCH: u32 = 1401;
    pub const INVALID_OPERAND: u32 = 1402;
    pub const NON_BOOL_OPERAND: u32 = 1403;
    pub const INTEGER_MIX: u32 = 1404;
    pub const NON_INTEGER_INDEX: u32 = 1405;
    pub const CONST_ASSIGNMENT: u32 = 1406;

    // Inference
    pub const INFERENCE_NON_CONVERGENCE: u32 = 1501;
    pub const RECURSIVE_ALIAS: u32 = 1502;
}

/// A user-visible message with severity, optional code, and location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Diagnostic code, `diagnostic_codes::NONE` when absent.
    pub code: u32,
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn error(span: Span, message: impl Into<String>, code: u32) -> Self {
        Self {
            severity: Severity::Error,
            code,
            span,
            message: message.into(),
        }
    }

    pub fn warning(span: Span, message: impl Into<String>, code: u32) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            span,
            message: message.into(),
        }
    }
}

/// The LSP wire shape of one diagnostic.
#[derive(Debug, Clone, Serialize)]
pub struct LspDiagnostic {
    pub range: Range,
    pub severity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u32>,
    pub source: &'static str,
    pub message: String,
}

enum Mode {
    Collect,
    Direct(Box<dyn Write + Send>),
}

/// Collects or directly emits diagnostics for one source file.
pub struct DiagnosticContext {
    file_name: String,
    mode: Mode,
    collected: Vec<Diagnostic>,
    counts: [u32; 4],
    seen: FxHashSet<(u32, u32)>,
    /// Source text snapshot for DIRECT-mode line/column rendering.
    source: Option<(String, LineMap)>,
}

impl std::fmt::Debug for DiagnosticContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticContext")
            .field("file_name", &self.file_name)
            .field("collected", &self.collected.len())
            .field("counts", &self.counts)
            .finish()
    }
}

impl DiagnosticContext {
    #[must_use]
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            mode: Mode::Collect,
            collected: Vec::new(),
            counts: [0; 4],
            seen: FxHashSet::default(),
            source: None,
        }
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Attach the source text so DIRECT mode can render line/column.
    pub fn attach_source(&mut self, source: &str) {
        let line_map = LineMap::build(source);
        self.source = Some((source.to_string(), line_map));
    }

    /// Switch to COLLECT mode. Any attached sink is dropped.
    pub fn set_collect(&mut self) {
        self.mode = Mode::Collect;
    }

    /// Switch to DIRECT mode with the given sink. Diagnostics emitted from
    /// now on are written immediately; only counts are retained.
    pub fn set_direct(&mut self, sink: Box<dyn Write + Send>) {
        self.mode = Mode::Direct(sink);
    }

    /// Emit one diagnostic. Duplicates (same start offset and code) are
    /// dropped silently.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if !self.seen.insert((diagnostic.span.start, diagnostic.code)) {
            return;
        }
        self.counts[diagnostic.severity.index()] += 1;
        match &mut self.mode {
            Mode::Collect => self.collected.push(diagnostic),
            Mode::Direct(sink) => {
                let line = match &self.source {
                    Some((source, line_map)) => {
                        format_diagnostic(&diagnostic, &self.file_name, line_map, source)
                    }
                    None => format!(
                        "[{}] {}:0:0: {}",
                        diagnostic.severity.label(),
                        self.file_name,
                        diagnostic.message
                    ),
                };
                // A broken sink must not take the compiler down with it.
                let _ = writeln!(sink, "{line}");
            }
        }
    }

    pub fn error(&mut self, span: Span, message: impl Into<String>, code: u32) {
        self.emit(Diagnostic::error(span, message, code));
    }

    pub fn warning(&mut self, span: Span, message: impl Into<String>, code: u32) {
        self.emit(Diagnostic::warning(span, message, code));
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.counts[Severity::Error.index()] > 0
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> u32 {
        self.counts[severity.index()]
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// The collected list (empty in DIRECT mode).
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.collected
    }

    /// Project the collected list to the LSP diagnostic shape.
    #[must_use]
    pub fn to_lsp(&self, line_map: &LineMap, source: &str) -> Vec<LspDiagnostic> {
        self.collected
            .iter()
            .map(|d| LspDiagnostic {
                range: line_map.span_to_range(d.span, source),
                severity: d.severity.lsp_value(),
                code: (d.code != diagnostic_codes::NONE).then_some(d.code),
                source: "jolt",
                message: d.message.clone(),
            })
            .collect()
    }
}

/// Render one diagnostic in the fixed textual form
/// `[SEVERITY] file:line:col: message` with 1-based line/column.
/// Unknown locations render as `0:0`.
#[must_use]
pub fn format_diagnostic(
    diagnostic: &Diagnostic,
    file_name: &str,
    line_map: &LineMap,
    source: &str,
) -> String {
    let (line, col) = if diagnostic.span.is_dummy() {
        (0, 0)
    } else {
        let pos = line_map.offset_to_position(diagnostic.span.start, source);
        (pos.line + 1, pos.character + 1)
    };
    format!(
        "[{}] {}:{}:{}: {}",
        diagnostic.severity.label(),
        file_name,
        line,
        col,
        diagnostic.message
    )
}

#[cfg(test)]
#[path = "../tests/diagnostics_tests.rs"]
mod tests;
