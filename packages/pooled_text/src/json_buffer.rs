use std::borrow::Cow;

use crate::escape::escape_json_into;
use crate::{Integer, PooledBuffer, TextPool};

/// Decimal places used for floating point values in documents.
const FLOAT_PRECISION: usize = 2;

/// Incrementally writes one JSON document into a pooled buffer.
///
/// This is a writer, not a serializer: structural characters come from the caller, usually
/// through the `prepend` argument of the member methods. Keys are written verbatim and are
/// expected to be valid JSON key text. String values are escaped.
///
/// Getting the document out consumes the buffer and returns it to the pool, exactly as for
/// [`SqlStatement`][crate::SqlStatement].
///
/// # Example
///
/// ```rust
/// use pooled_text::{JsonBuffer, TextPool};
///
/// let pool = TextPool::new();
///
/// let mut json = JsonBuffer::new(&pool);
/// json.member_int("{", "id", 7)
///     .member_str(",", "name", "say \"hi\"")
///     .member_bool(",", "active", true)
///     .member_f64(",", "score", 2.5)
///     .push_str("}");
///
/// assert_eq!(
///     json.snapshot_text(),
///     r#"{"id":7,"name":"say \"hi\"","active":true,"score":2.50}"#
/// );
/// ```
#[derive(Debug)]
pub struct JsonBuffer {
    buffer: PooledBuffer,
}

impl JsonBuffer {
    /// Starts a new document in a buffer acquired from `pool`.
    #[must_use]
    pub fn new(pool: &TextPool) -> Self {
        Self {
            buffer: pool.acquire(),
        }
    }

    /// Appends text without escaping.
    pub fn push_str(&mut self, text: &str) -> &mut Self {
        self.buffer.append_str(text);
        self
    }

    /// Appends each text without escaping.
    pub fn push_strs<I>(&mut self, texts: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for text in texts {
            self.buffer.append_str(text.as_ref());
        }

        self
    }

    /// Appends bytes without escaping or validation.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buffer.append_bytes(bytes);
        self
    }

    /// Appends a line feed.
    pub fn newline(&mut self) -> &mut Self {
        self.buffer.append_byte(b'\n');
        self
    }

    /// Appends a space.
    pub fn space(&mut self) -> &mut Self {
        self.buffer.append_byte(b' ');
        self
    }

    /// Appends an integer in decimal.
    pub fn push_int(&mut self, value: impl Integer) -> &mut Self {
        self.buffer.append_integer(value);
        self
    }

    /// Appends a float with two decimal places.
    pub fn push_f32(&mut self, value: f32) -> &mut Self {
        self.push_f64(f64::from(value))
    }

    /// Appends a float with two decimal places.
    pub fn push_f64(&mut self, value: f64) -> &mut Self {
        self.buffer.append_f64(value, FLOAT_PRECISION);
        self
    }

    /// Appends `text` as a quoted, escaped JSON string.
    pub fn quoted(&mut self, text: &str) -> &mut Self {
        self.buffer.append_byte(b'"');
        escape_json_into(&mut *self.buffer, text);
        self.buffer.append_byte(b'"');
        self
    }

    /// Appends `prepend`, then `"key":` with the key written verbatim.
    fn key(&mut self, prepend: &str, key: &str) {
        self.buffer.append_str(prepend);
        self.buffer.append_byte(b'"');
        self.buffer.append_str(key);
        self.buffer.append_bytes(b"\":");
    }

    /// Appends a member with an escaped string value.
    pub fn member_str(&mut self, prepend: &str, key: &str, value: &str) -> &mut Self {
        self.key(prepend, key);
        self.quoted(value)
    }

    /// Appends a member with a `true` or `false` value.
    pub fn member_bool(&mut self, prepend: &str, key: &str, value: bool) -> &mut Self {
        self.key(prepend, key);
        self.buffer.append_str(if value { "true" } else { "false" });
        self
    }

    /// Appends a member with an integer value.
    pub fn member_int(&mut self, prepend: &str, key: &str, value: impl Integer) -> &mut Self {
        self.key(prepend, key);
        self.push_int(value)
    }

    /// Appends a member with a float value rendered with two decimal places.
    pub fn member_f32(&mut self, prepend: &str, key: &str, value: f32) -> &mut Self {
        self.key(prepend, key);
        self.push_f32(value)
    }

    /// Appends a member with a float value rendered with two decimal places.
    pub fn member_f64(&mut self, prepend: &str, key: &str, value: f64) -> &mut Self {
        self.key(prepend, key);
        self.push_f64(value)
    }

    /// Appends a member whose value is `bytes` between quotes, without escaping.
    ///
    /// For values that are already known to be valid JSON string content, such as preformatted
    /// timestamps or identifiers.
    pub fn member_raw(&mut self, prepend: &str, key: &str, bytes: &[u8]) -> &mut Self {
        self.key(prepend, key);
        self.buffer.append_byte(b'"');
        self.buffer.append_bytes(bytes);
        self.buffer.append_byte(b'"');
        self
    }

    /// The document as written so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    /// The document as written so far, with any invalid UTF-8 from raw bytes replaced.
    #[must_use]
    pub fn as_text(&self) -> Cow<'_, str> {
        self.buffer.as_text()
    }

    /// Length of the document in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns a copy of the document bytes and releases the buffer.
    #[must_use]
    pub fn snapshot_bytes(self) -> Vec<u8> {
        self.buffer.snapshot()
    }

    /// Returns a copy of the document and releases the buffer.
    ///
    /// Invalid UTF-8 written through [`push_bytes()`][Self::push_bytes] or
    /// [`member_raw()`][Self::member_raw] is replaced with U+FFFD.
    #[must_use]
    pub fn snapshot_text(self) -> String {
        match String::from_utf8(self.buffer.snapshot()) {
            Ok(text) => text,
            Err(error) => String::from_utf8_lossy(error.as_bytes()).into_owned(),
        }
    }

    /// Returns the storage holding the document, which leaves the pool for good.
    #[must_use]
    pub fn detach(self) -> Vec<u8> {
        self.buffer.detach()
    }

    /// Discards the document and releases the buffer.
    pub fn release(self) {
        self.buffer.release();
    }
}
