use super::*;
use std::io::Cursor;
use std::time::Duration;

#[test]
fn write_then_read_round_trips() {
    let mut buf = Vec::new();
    write_message(&mut buf, r#"{"jsonrpc":"2.0","id":1}"#).unwrap();
    write_message(&mut buf, r#"{"method":"exit"}"#).unwrap();

    let mut reader = Cursor::new(buf);
    assert_eq!(
        read_message(&mut reader).unwrap().as_deref(),
        Some(r#"{"jsonrpc":"2.0","id":1}"#)
    );
    assert_eq!(
        read_message(&mut reader).unwrap().as_deref(),
        Some(r#"{"method":"exit"}"#)
    );
    assert_eq!(read_message(&mut reader).unwrap(), None);
}

#[test]
fn frame_length_counts_bytes() {
    let mut buf = Vec::new();
    write_message(&mut buf, "{}").unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(text, "Content-Length: 2\r\n\r\n{}");
}

#[test]
fn extra_headers_are_skipped() {
    let framed =
        "Content-Length: 2\r\nContent-Type: application/vscode-jsonrpc; charset=utf-8\r\n\r\n{}";
    let mut reader = Cursor::new(framed.as_bytes().to_vec());
    assert_eq!(read_message(&mut reader).unwrap().as_deref(), Some("{}"));
}

#[test]
fn invalid_content_length_is_an_error() {
    let framed = "Content-Length: nope\r\n\r\n{}";
    let mut reader = Cursor::new(framed.as_bytes().to_vec());
    assert!(read_message(&mut reader).is_err());
}

#[test]
fn reader_delivers_messages_then_closes() {
    let mut buf = Vec::new();
    write_message(&mut buf, r#"{"a":1}"#).unwrap();
    write_message(&mut buf, r#"{"b":2}"#).unwrap();

    let reader = MessageReader::from_reader(Cursor::new(buf));
    let timeout = Duration::from_secs(5);
    assert!(matches!(reader.poll(timeout), Poll::Message(m) if m == r#"{"a":1}"#));
    assert!(matches!(reader.poll(timeout), Poll::Message(m) if m == r#"{"b":2}"#));
    assert!(matches!(reader.poll(timeout), Poll::Closed));
}

#[test]
fn writer_produces_parseable_frames() {
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);
    impl std::io::Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let sink = SharedSink(Arc::new(Mutex::new(Vec::new())));
    let writer = MessageWriter::new(Box::new(sink.clone()));
    writer.write(r#"{"x":1}"#).unwrap();
    writer.write(r#"{"y":2}"#).unwrap();

    let bytes = sink.0.lock().unwrap().clone();
    let mut reader = Cursor::new(bytes);
    assert_eq!(read_message(&mut reader).unwrap().as_deref(), Some(r#"{"x":1}"#));
    assert_eq!(read_message(&mut reader).unwrap().as_deref(), Some(r#"{"y":2}"#));
}
