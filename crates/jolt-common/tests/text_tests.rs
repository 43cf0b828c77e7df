use super::*;
use crate::position::{Position, Range};

fn range(sl: u32, sc: u32, el: u32, ec: u32) -> Range {
    Range::new(Position::new(sl, sc), Position::new(el, ec))
}

#[test]
fn append_and_clear() {
    let mut buf = TextBuffer::new();
    buf.append("let x = 1;");
    buf.append("\nx;");
    assert_eq!(buf.as_str(), "let x = 1;\nx;");
    buf.clear();
    assert!(buf.is_empty());
}

#[test]
fn apply_edit_replaces_range() {
    let mut buf = TextBuffer::from_text("let x = 1;\nx;");
    buf.apply_edit(range(0, 8, 0, 9), "42").unwrap();
    assert_eq!(buf.as_str(), "let x = 42;\nx;");
}

#[test]
fn apply_edit_insertion_at_empty_range() {
    let mut buf = TextBuffer::from_text("ab");
    buf.apply_edit(range(0, 1, 0, 1), "X").unwrap();
    assert_eq!(buf.as_str(), "aXb");
}

#[test]
fn apply_edit_across_lines() {
    let mut buf = TextBuffer::from_text("one\ntwo\nthree");
    buf.apply_edit(range(0, 3, 2, 0), " ").unwrap();
    assert_eq!(buf.as_str(), "one three");
}

#[test]
fn out_of_range_edit_leaves_buffer_unchanged() {
    let mut buf = TextBuffer::from_text("short");
    let before = buf.as_str().to_string();
    assert!(buf.apply_edit(range(5, 0, 5, 1), "x").is_err());
    assert_eq!(buf.as_str(), before);
}

#[test]
fn inverted_range_is_rejected() {
    let mut buf = TextBuffer::from_text("abc\ndef");
    assert!(buf.apply_edit(range(1, 1, 0, 0), "x").is_err());
    assert_eq!(buf.as_str(), "abc\ndef");
}

#[test]
fn offsets_and_positions_stay_inverse_after_edit() {
    let mut buf = TextBuffer::from_text("var a = 1;\nvar b = 2;\n");
    buf.apply_edit(range(1, 4, 1, 5), "bee").unwrap();
    assert_eq!(buf.as_str(), "var a = 1;\nvar bee = 2;\n");
    for offset in 0..buf.len() as u32 {
        let pos = buf.offset_to_position(offset);
        assert_eq!(buf.position_to_offset(pos), Some(offset));
    }
}
