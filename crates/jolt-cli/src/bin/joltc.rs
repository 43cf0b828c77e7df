//! joltc: Jolt compiler front end.
//!
//! Reads one source file, runs the type engine, and writes the typed
//! module listing to the output path. Diagnostics are printed to
//! standard error in the form `[SEVERITY] file:line:col: message`
//! (or streamed to `--diagnostics-output`). Exit 0 on success,
//! non-zero when any error diagnostic was produced.

use clap::Parser;

use jolt_cli::args::CompilerArgs;
use jolt_cli::driver;

fn main() {
    jolt_cli::tracing_config::init_tracing();
    let args = CompilerArgs::parse();

    match driver::compile(&args.into_options()) {
        Ok(result) if result.error_count == 0 => {}
        Ok(_) => std::process::exit(1),
        Err(err) => {
            eprintln!("joltc: {err:#}");
            std::process::exit(1);
        }
    }
}
