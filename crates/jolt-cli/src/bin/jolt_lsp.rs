//! jolt-lsp: Jolt language server over stdin/stdout.

use clap::Parser;

use jolt_cli::args::LspArgs;
use jolt_lsp::LanguageServer;

fn main() {
    jolt_cli::tracing_config::init_tracing();
    // `--stdio` is the only transport; parsing still validates flags
    // and serves `--help`/`--version`.
    let _args = LspArgs::parse();

    let code = LanguageServer::over_stdio().run();
    std::process::exit(code);
}
