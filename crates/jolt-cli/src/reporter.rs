//! Human diagnostic output for `joltc`.
//!
//! One line per diagnostic in the fixed form
//! `[SEVERITY] file:line:col: message`, with the severity tag colored
//! when standard error is a terminal.

use colored::Colorize;
use jolt_common::diagnostics::format_diagnostic;
use jolt_common::{DiagnosticContext, LineMap, Severity};

pub fn print_diagnostics(diags: &DiagnosticContext, line_map: &LineMap, source: &str) {
    for diagnostic in diags.diagnostics() {
        let line = format_diagnostic(diagnostic, diags.file_name(), line_map, source);
        let line = match diagnostic.severity {
            Severity::Error => colorize_tag(&line, "[ERROR]", |s| s.red().bold().to_string()),
            Severity::Warning => colorize_tag(&line, "[WARNING]", |s| s.yellow().to_string()),
            Severity::Info => colorize_tag(&line, "[INFO]", |s| s.cyan().to_string()),
            Severity::Hint => colorize_tag(&line, "[HINT]", |s| s.dimmed().to_string()),
        };
        eprintln!("{line}");
    }
}

fn colorize_tag(line: &str, tag: &str, paint: impl Fn(&str) -> String) -> String {
    match line.strip_prefix(tag) {
        Some(rest) => format!("{}{rest}", paint(tag)),
        None => line.to_string(),
    }
}
