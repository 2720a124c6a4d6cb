//! Escaping of text for SQL string literals and JSON strings.
//!
//! Both escapers scan their input once, left to right. Runs of bytes that need no escaping are
//! written to the sink in a single call between escape points, so the cost is proportional to
//! the number of escape points rather than to the number of bytes.
//!
//! Escaping never splits a multi-byte character: every byte that is replaced is ASCII, and the
//! only multi-byte sequence that is touched (U+FFFD in SQL) is removed as a whole. Escaping
//! valid UTF-8 therefore always yields valid UTF-8.

use std::fmt;

use crate::ByteBuffer;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// UTF-8 encoding of U+FFFD REPLACEMENT CHARACTER.
const REPLACEMENT_CHARACTER: [u8; 3] = [0xEF, 0xBF, 0xBD];

/// Destination for escaped output.
pub trait ByteSink {
    /// Appends `bytes` to the sink.
    fn put(&mut self, bytes: &[u8]);
}

impl ByteSink for ByteBuffer {
    fn put(&mut self, bytes: &[u8]) {
        self.append_bytes(bytes);
    }
}

impl ByteSink for Vec<u8> {
    fn put(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

/// Writes `text` into `sink` escaped for use inside a MySQL string literal.
///
/// | Input                  | Output  |
/// |------------------------|---------|
/// | `\`                    | `\\`    |
/// | `'`                    | `\'`    |
/// | NUL                    | `\\0`   |
/// | newline                | `\n`    |
/// | carriage return        | `\r`    |
/// | `"`                    | `\"`    |
/// | U+FFFD                 | removed |
/// | 0x1A (substitute)      | `\Z`    |
///
/// The surrounding quotes are not written.
///
/// # Example
///
/// ```rust
/// use pooled_text::ByteBuffer;
/// use pooled_text::escape::escape_sql_into;
///
/// let mut buffer = ByteBuffer::new();
/// escape_sql_into(&mut buffer, r"O'Brien\");
///
/// assert_eq!(buffer.as_text(), r"O\'Brien\\");
/// ```
#[allow(
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing,
    reason = "run boundaries never exceed the input length"
)]
pub fn escape_sql_into<S: ByteSink + ?Sized>(sink: &mut S, text: &str) {
    let bytes = text.as_bytes();
    let mut run_start = 0;
    let mut index = 0;

    while let Some(&byte) = bytes.get(index) {
        let (replacement, consumed): (&[u8], usize) = match byte {
            b'\\' => (br"\\", 1),
            b'\'' => (br"\'", 1),
            0 => (br"\\0", 1),
            b'\n' => (br"\n", 1),
            b'\r' => (br"\r", 1),
            b'"' => (br#"\""#, 1),
            0x1A => (br"\Z", 1),
            0xEF if bytes[index..].starts_with(&REPLACEMENT_CHARACTER) => {
                (b"", REPLACEMENT_CHARACTER.len())
            }
            _ => {
                index += 1;
                continue;
            }
        };

        sink.put(&bytes[run_start..index]);
        sink.put(replacement);

        index += consumed;
        run_start = index;
    }

    sink.put(&bytes[run_start..]);
}

/// Writes `text` into `sink` escaped for use inside a JSON string.
///
/// `"`, `\`, newline, carriage return and tab use their short escapes. Form feed, backspace,
/// NUL, `<` and `'` are written as `\u00XX` escapes; escaping `<` and `'` keeps the document
/// safe to embed in HTML. Every other byte is copied unchanged.
///
/// The surrounding quotes are not written.
///
/// # Example
///
/// ```rust
/// use pooled_text::ByteBuffer;
/// use pooled_text::escape::escape_json_into;
///
/// let mut buffer = ByteBuffer::new();
/// escape_json_into(&mut buffer, "line\n\"quoted\"");
///
/// assert_eq!(buffer.as_text(), r#"line\n\"quoted\""#);
/// ```
#[allow(
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing,
    reason = "run boundaries never exceed the input length"
)]
pub fn escape_json_into<S: ByteSink + ?Sized>(sink: &mut S, text: &str) {
    let bytes = text.as_bytes();
    let mut run_start = 0;

    for (index, &byte) in bytes.iter().enumerate() {
        let short: Option<&[u8]> = match byte {
            b'"' => Some(br#"\""#),
            b'\\' => Some(br"\\"),
            b'\n' => Some(br"\n"),
            b'\r' => Some(br"\r"),
            b'\t' => Some(br"\t"),
            0x0C | 0x08 | b'<' | b'\'' | 0 => None,
            _ => continue,
        };

        sink.put(&bytes[run_start..index]);

        match short {
            Some(escape) => sink.put(escape),
            None => put_unicode_escape(sink, byte),
        }

        run_start = index + 1;
    }

    sink.put(&bytes[run_start..]);
}

/// Writes a `\u00XX` escape for a single byte.
#[allow(
    clippy::indexing_slicing,
    reason = "a nibble is always a valid index into the 16 hex digits"
)]
fn put_unicode_escape<S: ByteSink + ?Sized>(sink: &mut S, byte: u8) {
    let escape = [
        b'\\',
        b'u',
        b'0',
        b'0',
        HEX_DIGITS[usize::from(byte >> 4)],
        HEX_DIGITS[usize::from(byte & 0x0F)],
    ];

    sink.put(&escape);
}

/// Returns `text` escaped for use inside a MySQL string literal.
///
/// See [`escape_sql_into()`] for the escaping rules. Prefer that function on hot paths, as this
/// one allocates the returned string.
///
/// # Example
///
/// ```rust
/// use pooled_text::escape::escape_sql;
///
/// assert_eq!(escape_sql("it's\n"), r"it\'s\n");
/// ```
#[must_use]
pub fn escape_sql(text: &str) -> String {
    let mut output = Vec::with_capacity(text.len());
    escape_sql_into(&mut output, text);

    String::from_utf8(output).expect("SQL escaping preserves UTF-8 validity")
}

/// Returns `text` escaped for use inside a JSON string.
///
/// See [`escape_json_into()`] for the escaping rules. Prefer that function on hot paths, as this
/// one allocates the returned string.
#[must_use]
pub fn escape_json(text: &str) -> String {
    let mut output = Vec::with_capacity(text.len());
    escape_json_into(&mut output, text);

    String::from_utf8(output).expect("JSON escaping preserves UTF-8 validity")
}

/// Adapts a [`ByteSink`] to [`fmt::Write`], SQL-escaping everything written through it.
///
/// This allows any [`Display`][fmt::Display] value to be escaped while it is being formatted,
/// without first rendering it into a temporary `String`.
///
/// # Example
///
/// ```rust
/// use std::fmt::Write;
///
/// use pooled_text::ByteBuffer;
/// use pooled_text::escape::SqlEscaper;
///
/// let mut buffer = ByteBuffer::new();
/// write!(SqlEscaper::new(&mut buffer), "{}'s {}", "Ann", 3).unwrap();
///
/// assert_eq!(buffer.as_text(), r"Ann\'s 3");
/// ```
#[derive(Debug)]
pub struct SqlEscaper<'a, S: ByteSink + ?Sized> {
    sink: &'a mut S,
}

impl<'a, S: ByteSink + ?Sized> SqlEscaper<'a, S> {
    /// Creates an escaper that writes into `sink`.
    pub fn new(sink: &'a mut S) -> Self {
        Self { sink }
    }
}

impl<S: ByteSink + ?Sized> fmt::Write for SqlEscaper<'_, S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        escape_sql_into(&mut *self.sink, s);
        Ok(())
    }
}

/// Adapts a [`ByteSink`] to [`fmt::Write`], JSON-escaping everything written through it.
#[derive(Debug)]
pub struct JsonEscaper<'a, S: ByteSink + ?Sized> {
    sink: &'a mut S,
}

impl<'a, S: ByteSink + ?Sized> JsonEscaper<'a, S> {
    /// Creates an escaper that writes into `sink`.
    pub fn new(sink: &'a mut S) -> Self {
        Self { sink }
    }
}

impl<S: ByteSink + ?Sized> fmt::Write for JsonEscaper<'_, S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        escape_json_into(&mut *self.sink, s);
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Write;

    use super::*;

    const JSON_LT: &str = concat!(r"\u00", "3c");
    const JSON_APOSTROPHE: &str = concat!(r"\u00", "27");

    /// Records every write so tests can verify that unescaped runs are batched.
    #[derive(Default)]
    struct RecordingSink {
        writes: Vec<Vec<u8>>,
    }

    impl ByteSink for RecordingSink {
        fn put(&mut self, bytes: &[u8]) {
            self.writes.push(bytes.to_vec());
        }
    }

    impl RecordingSink {
        fn joined(&self) -> String {
            String::from_utf8(self.writes.concat()).unwrap()
        }
    }

    #[test]
    fn sql_escapes_quote_and_backslash() {
        assert_eq!(escape_sql(r"O'Brien\"), r"O\'Brien\\");
    }

    #[test]
    fn sql_escapes_every_special_byte() {
        let input = "\\|'|\0|\n|\r|\"|\u{FFFD}|\x1A";
        let expected = r#"\\|\'|\\0|\n|\r|\"||\Z"#;

        assert_eq!(escape_sql(input), expected);
    }

    #[test]
    fn sql_leaves_plain_text_alone() {
        assert_eq!(escape_sql(""), "");
        assert_eq!(escape_sql("plain text"), "plain text");
        assert_eq!(escape_sql("grüße 東京 \t"), "grüße 東京 \t");
    }

    #[test]
    fn sql_keeps_characters_sharing_replacement_lead_byte() {
        // U+FFFC and U+FEFF also start with 0xEF but are not the replacement character.
        assert_eq!(escape_sql("\u{FFFC}\u{FEFF}"), "\u{FFFC}\u{FEFF}");
        assert_eq!(escape_sql("a\u{FFFD}\u{FFFD}b"), "ab");
    }

    #[test]
    fn sql_is_single_pass() {
        // An escaped backslash must not be escaped again, nor combine with the next character.
        assert_eq!(escape_sql(r"\'"), r"\\\'");
        assert_eq!(escape_sql(r"\\"), r"\\\\");
    }

    #[test]
    fn json_escapes_quote_and_angle_bracket() {
        let expected = format!(r#"a\"b{JSON_LT}c"#);

        assert_eq!(escape_json(r#"a"b<c"#), expected);
    }

    #[test]
    fn json_escapes_every_special_byte() {
        let input = "\"\\\n\r\t\x0C\x08<'\0";
        let expected = format!(
            r#"\"\\\n\r\t\u000c\u0008{JSON_LT}{JSON_APOSTROPHE}\u0000"#
        );

        assert_eq!(escape_json(input), expected);
    }

    #[test]
    fn json_leaves_other_bytes_alone() {
        assert_eq!(escape_json(""), "");
        assert_eq!(escape_json("> & / é"), "> & / é");
        assert_eq!(escape_json("\x01\x1F"), "\x01\x1F");
    }

    #[test]
    fn sql_batches_unescaped_runs() {
        let mut sink = RecordingSink::default();
        escape_sql_into(&mut sink, "abc'def");

        assert_eq!(sink.joined(), r"abc\'def");
        assert_eq!(
            sink.writes,
            vec![b"abc".to_vec(), br"\'".to_vec(), b"def".to_vec()]
        );
    }

    #[test]
    fn json_batches_unescaped_runs() {
        let mut sink = RecordingSink::default();
        escape_json_into(&mut sink, "hello \"world\"");

        assert_eq!(sink.joined(), r#"hello \"world\""#);
        assert_eq!(sink.writes.len(), 5);
        assert_eq!(sink.writes.first().unwrap(), b"hello ");
    }

    #[test]
    fn escapers_adapt_fmt_write() {
        let mut buffer = ByteBuffer::new();
        write!(SqlEscaper::new(&mut buffer), "{}|{}", "it's", -1).unwrap();
        assert_eq!(buffer.as_text(), r"it\'s|-1");

        let mut bytes = Vec::new();
        write!(JsonEscaper::new(&mut bytes), "{:?}", "q").unwrap();
        assert_eq!(bytes, br#"\"q\""#);
    }
}
