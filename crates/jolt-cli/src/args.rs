use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for the `joltc` binary.
#[derive(Parser, Debug)]
#[command(name = "joltc", version, about = "Jolt compiler front end")]
pub struct CompilerArgs {
    /// Source file to compile.
    pub input: PathBuf,

    /// Output path for the typed module listing. Defaults to the input
    /// path with a `.jir` extension.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Optimization level recorded for the code generator.
    #[arg(short = 'O', long = "opt-level", default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=3))]
    pub opt_level: u8,

    /// Include debug info (source locations) in the output.
    #[arg(short = 'g', long = "debug-info")]
    pub debug_info: bool,

    /// Stream diagnostics to this file as they are produced, instead of
    /// collecting them and printing to standard error.
    #[arg(long = "diagnostics-output")]
    pub diagnostics_output: Option<PathBuf>,
}

/// CLI arguments for the `jolt-lsp` binary.
#[derive(Parser, Debug)]
#[command(name = "jolt-lsp", version, about = "Jolt language server")]
pub struct LspArgs {
    /// Use stdin/stdout with Content-Length framing (the default and
    /// only transport).
    #[arg(long)]
    pub stdio: bool,
}
