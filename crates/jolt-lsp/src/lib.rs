//! Language Server Protocol implementation for Jolt.
//!
//! Two threads: the I/O loop reads framed JSON-RPC messages from a
//! channel-backed reader with a 100 ms poll and dispatches them; one
//! persistent worker runs type inference off the I/O thread and
//! publishes diagnostics. Documents, the pending-work queue, and the
//! completed-work slots tie the two together.

pub mod analysis;
pub mod documents;
pub mod framing;
pub mod protocol;
pub mod server;

pub use analysis::AnalysisWork;
pub use documents::Document;
pub use framing::{MessageReader, MessageWriter, Poll};
pub use server::LanguageServer;
