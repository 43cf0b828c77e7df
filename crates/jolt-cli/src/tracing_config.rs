//! Tracing setup shared by the binaries.
//!
//! Logs always go to standard error so they never interfere with the
//! LSP protocol on standard output. Verbosity comes from `JOLT_LOG`
//! (an `EnvFilter` directive, e.g. `JOLT_LOG=jolt_checker=debug`).

use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("JOLT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
