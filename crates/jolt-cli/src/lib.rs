//! Native CLI support for the Jolt compiler.
//!
//! This crate provides the `joltc` and `jolt-lsp` binaries and the
//! CLI-specific modules (argument parsing, the compilation driver, the
//! human diagnostic reporter, tracing setup).

pub mod args;
pub mod driver;
pub mod reporter;
pub mod tracing_config;

#[cfg(test)]
#[path = "tests/driver_tests.rs"]
mod driver_tests;
