//! Content-Length framing over byte streams.
//!
//! Wire format: `Content-Length: N\r\n\r\n` followed by N bytes of UTF-8
//! JSON. Reading runs on a dedicated thread that feeds an mpsc channel,
//! so the I/O loop can poll with a timeout; writing goes through a
//! mutex-guarded sink so every full message is written under the lock.

use std::io::{BufRead, Read, Write};
use std::sync::Mutex;
use std::sync::mpsc;
use std::time::Duration;

/// Read one framed message. `Ok(None)` means end of input.
pub fn read_message(reader: &mut impl BufRead) -> std::io::Result<Option<String>> {
    loop {
        let mut header_line = String::new();
        let bytes_read = reader.read_line(&mut header_line)?;
        if bytes_read == 0 {
            return Ok(None); // EOF
        }
        let header = header_line.trim();
        if header.is_empty() {
            // Stray blank line between messages.
            continue;
        }

        let Some(len_str) = header.strip_prefix("Content-Length:") else {
            // Unknown headers (e.g. Content-Type) are skipped.
            continue;
        };
        let content_length: usize = len_str.trim().parse().map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid Content-Length: {}", len_str.trim()),
            )
        })?;

        // Consume remaining headers up to the blank separator line.
        loop {
            let mut line = String::new();
            let n = reader.read_line(&mut line)?;
            if n == 0 || line.trim().is_empty() {
                break;
            }
        }

        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body)?;
        return String::from_utf8(body).map(Some).map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "invalid UTF-8 in message body",
            )
        });
    }
}

/// Write one framed message.
pub fn write_message(writer: &mut impl Write, message: &str) -> std::io::Result<()> {
    write!(writer, "Content-Length: {}\r\n\r\n{}", message.len(), message)?;
    writer.flush()
}

/// One poll result from a `MessageReader`.
#[derive(Debug)]
pub enum Poll {
    Message(String),
    Timeout,
    Closed,
}

/// Channel-backed framed reader. A background thread parses frames and
/// sends message bodies; the owner polls with a timeout.
pub struct MessageReader {
    rx: mpsc::Receiver<String>,
}

impl MessageReader {
    /// Spawn a reader thread over standard input.
    #[must_use]
    pub fn stdin() -> Self {
        Self::from_reader(std::io::BufReader::new(std::io::stdin()))
    }

    /// Spawn a reader thread over any buffered byte stream.
    pub fn from_reader(mut reader: impl BufRead + Send + 'static) -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::Builder::new()
            .name("jolt-lsp-reader".to_string())
            .spawn(move || {
                loop {
                    match read_message(&mut reader) {
                        Ok(Some(message)) => {
                            if tx.send(message).is_err() {
                                break; // Receiver gone; stop reading.
                            }
                        }
                        Ok(None) => break,
                        Err(err) => {
                            tracing::warn!(error = %err, "dropping malformed frame");
                            // Framing is lost; there is no safe resync.
                            break;
                        }
                    }
                }
            })
            .expect("failed to spawn reader thread");
        Self { rx }
    }

    /// Wait up to `timeout` for the next message.
    #[must_use]
    pub fn poll(&self, timeout: Duration) -> Poll {
        match self.rx.recv_timeout(timeout) {
            Ok(message) => Poll::Message(message),
            Err(mpsc::RecvTimeoutError::Timeout) => Poll::Timeout,
            Err(mpsc::RecvTimeoutError::Disconnected) => Poll::Closed,
        }
    }
}

/// Mutex-guarded framed writer shared by the I/O loop and the worker.
pub struct MessageWriter {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl MessageWriter {
    #[must_use]
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Write one full message under the lock.
    pub fn write(&self, message: &str) -> std::io::Result<()> {
        let mut sink = self.sink.lock().expect("writer lock poisoned");
        write_message(&mut *sink, message)
    }
}

#[cfg(test)]
#[path = "../tests/framing_tests.rs"]
mod tests;
