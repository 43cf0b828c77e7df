//! Open documents, keyed by URI and owned by the I/O thread.

use jolt_common::TextBuffer;
use jolt_index::CodeIndex;

pub struct Document {
    pub uri: String,
    pub language_id: String,
    pub version: i32,
    pub text: TextBuffer,
    /// The current position index. Replaced with an untyped index on
    /// every edit and upgraded when the worker's result is picked up.
    pub index: Option<CodeIndex>,
}

impl Document {
    #[must_use]
    pub fn new(uri: String, language_id: String, version: i32, text: String) -> Self {
        Self {
            uri,
            language_id,
            version,
            text: TextBuffer::from_text(text),
            index: None,
        }
    }
}
