use super::*;
use crate::position::LineMap;
use crate::span::Span;
use std::sync::{Arc, Mutex};

/// Shared byte sink for exercising DIRECT mode.
#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn collect_mode_keeps_order_and_counts() {
    let mut ctx = DiagnosticContext::new("main.jolt");
    ctx.error(Span::new(0, 1), "first", diagnostic_codes::UNEXPECTED_TOKEN);
    ctx.warning(Span::new(5, 6), "second", diagnostic_codes::NONE);
    ctx.error(Span::new(9, 12), "third", diagnostic_codes::TYPE_MISMATCH);

    assert!(ctx.has_errors());
    assert_eq!(ctx.count(Severity::Error), 2);
    assert_eq!(ctx.count(Severity::Warning), 1);
    let messages: Vec<_> = ctx.diagnostics().iter().map(|d| d.message.as_str()).collect();
    assert_eq!(messages, ["first", "second", "third"]);
}

#[test]
fn duplicates_by_start_and_code_are_dropped() {
    let mut ctx = DiagnosticContext::new("main.jolt");
    ctx.error(Span::new(4, 5), "undefined variable 'z'", diagnostic_codes::UNDEFINED_VARIABLE);
    ctx.error(Span::new(4, 5), "undefined variable 'z'", diagnostic_codes::UNDEFINED_VARIABLE);
    assert_eq!(ctx.count(Severity::Error), 1);
    assert_eq!(ctx.diagnostics().len(), 1);

    // A different code at the same offset is a different problem.
    ctx.error(Span::new(4, 5), "type mismatch", diagnostic_codes::TYPE_MISMATCH);
    assert_eq!(ctx.count(Severity::Error), 2);
}

#[test]
fn direct_mode_writes_fixed_textual_form() {
    let source = "var x = 1;\nbad";
    let sink = SharedSink::default();
    let mut ctx = DiagnosticContext::new("main.jolt");
    ctx.attach_source(source);
    ctx.set_direct(Box::new(sink.clone()));

    ctx.error(Span::new(11, 14), "unexpected token", diagnostic_codes::UNEXPECTED_TOKEN);

    let written = String::from_utf8(sink.0.lock().unwrap().clone()).unwrap();
    assert_eq!(written, "[ERROR] main.jolt:2:1: unexpected token\n");
    // DIRECT mode keeps counts but not the list.
    assert!(ctx.has_errors());
    assert!(ctx.diagnostics().is_empty());
}

#[test]
fn mode_can_switch_mid_stream() {
    let sink = SharedSink::default();
    let mut ctx = DiagnosticContext::new("main.jolt");
    ctx.attach_source("x");

    ctx.error(Span::new(0, 1), "collected", diagnostic_codes::NONE);
    ctx.set_direct(Box::new(sink.clone()));
    ctx.error(Span::at(1), "direct", diagnostic_codes::NONE);
    ctx.set_collect();
    ctx.error(Span::at(2), "collected again", diagnostic_codes::NONE);

    assert_eq!(ctx.diagnostics().len(), 2);
    assert_eq!(ctx.count(Severity::Error), 3);
    let written = String::from_utf8(sink.0.lock().unwrap().clone()).unwrap();
    assert!(written.contains("direct"));
}

#[test]
fn lsp_projection_uses_zero_based_positions() {
    let source = "let a = 1;\nlet b = a;";
    let line_map = LineMap::build(source);
    let mut ctx = DiagnosticContext::new("main.jolt");
    ctx.error(Span::new(19, 20), "type mismatch", diagnostic_codes::TYPE_MISMATCH);

    let lsp = ctx.to_lsp(&line_map, source);
    assert_eq!(lsp.len(), 1);
    assert_eq!(lsp[0].severity, 1);
    assert_eq!(lsp[0].code, Some(diagnostic_codes::TYPE_MISMATCH));
    assert_eq!(lsp[0].source, "jolt");
    assert_eq!(lsp[0].range.start.line, 1);
    assert_eq!(lsp[0].range.start.character, 8);

    let json = serde_json::to_value(&lsp[0]).unwrap();
    assert_eq!(json["range"]["start"]["line"], 1);
    assert_eq!(json["range"]["end"]["character"], 9);
}

#[test]
fn dummy_span_renders_as_unknown_location() {
    let source = "text";
    let line_map = LineMap::build(source);
    let diag = Diagnostic::error(Span::dummy(), "internal", diagnostic_codes::NONE);
    let line = format_diagnostic(&diag, "main.jolt", &line_map, source);
    assert_eq!(line, "[ERROR] main.jolt:0:0: internal");
}
