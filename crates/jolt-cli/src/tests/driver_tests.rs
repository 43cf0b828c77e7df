use crate::driver::{CompileOptions, compile};
use std::fs;
use std::path::PathBuf;

fn options(dir: &tempfile::TempDir, source: &str) -> CompileOptions {
    let input = dir.path().join("main.jolt");
    fs::write(&input, source).unwrap();
    CompileOptions {
        output: input.with_extension("jir"),
        input,
        opt_level: 0,
        debug_info: false,
        diagnostics_output: None,
    }
}

#[test]
fn successful_compile_writes_the_listing() {
    let dir = tempfile::tempdir().unwrap();
    let opts = options(
        &dir,
        "var G = 1;\nfunction id(x) { return x; }\nid(2); id(\"s\");\n",
    );
    let result = compile(&opts).unwrap();
    assert_eq!(result.error_count, 0);
    assert_eq!(result.emitted, Some(opts.output.clone()));

    let listing = fs::read_to_string(&opts.output).unwrap();
    assert!(listing.contains("global G: i32"));
    assert!(listing.contains("specialization id$i32(i32): i32"));
    assert!(listing.contains("specialization id$string(string): string"));
}

#[test]
fn errors_suppress_the_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let opts = options(&dir, "function f() { return missing; }\n");
    let result = compile(&opts).unwrap();
    assert_eq!(result.error_count, 1);
    assert_eq!(result.emitted, None);
    assert!(!opts.output.exists());
}

#[test]
fn diagnostics_output_streams_the_textual_form() {
    let dir = tempfile::tempdir().unwrap();
    let mut opts = options(&dir, "const a = 1;\na++;\n");
    let diag_path = dir.path().join("diags.txt");
    opts.diagnostics_output = Some(diag_path.clone());

    let result = compile(&opts).unwrap();
    assert_eq!(result.error_count, 1);

    let written = fs::read_to_string(&diag_path).unwrap();
    assert_eq!(
        written.trim_end(),
        format!(
            "[ERROR] {}:2:1: Cannot modify const variable",
            opts.input.display()
        )
    );
}

#[test]
fn debug_info_adds_source_lines() {
    let dir = tempfile::tempdir().unwrap();
    let mut opts = options(&dir, "var n: i64 = 5i64;\n");
    opts.debug_info = true;
    opts.opt_level = 2;

    compile(&opts).unwrap();
    let listing = fs::read_to_string(&opts.output).unwrap();
    assert!(listing.contains("; opt-level 2, debug-info"));
    assert!(listing.contains("global n: i64 ; line 1"));
}

#[test]
fn missing_input_is_a_driver_error() {
    let opts = CompileOptions {
        input: PathBuf::from("/nonexistent/nowhere.jolt"),
        output: PathBuf::from("/nonexistent/nowhere.jir"),
        opt_level: 0,
        debug_info: false,
        diagnostics_output: None,
    };
    assert!(compile(&opts).is_err());
}

#[test]
fn structs_and_externals_appear_in_the_listing() {
    let dir = tempfile::tempdir().unwrap();
    let opts = options(
        &dir,
        "struct Point { x: i32; y: i32; }\nexternal function printf(fmt: string, ...): i32;\n",
    );
    let result = compile(&opts).unwrap();
    assert_eq!(result.error_count, 0);
    let listing = fs::read_to_string(&opts.output).unwrap();
    assert!(listing.contains("struct Point { x: i32, y: i32 }"));
    assert!(listing.contains("external function printf(string, ...): i32"));
}
