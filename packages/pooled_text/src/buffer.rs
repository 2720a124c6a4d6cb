use std::borrow::Cow;
use std::fmt;

use crate::sealed::Sealed;

/// Number of decimal digits in `u64::MAX`.
const MAX_U64_DIGITS: usize = 20;

/// A resizable byte sequence with append operations for text, raw bytes and numbers.
///
/// The buffer owns its storage exclusively. [`reset()`][Self::reset] discards the content but
/// keeps the allocation, which is what makes pooling worthwhile: a buffer that has been used once
/// usually has enough capacity for the next statement of the same shape.
///
/// None of the append operations can fail. Growth reallocates geometrically (amortized O(1) per
/// append) and copies existing content. Running out of memory aborts the process.
///
/// Numbers are rendered straight into the buffer. No intermediate `String` is created.
///
/// # Example
///
/// ```rust
/// use pooled_text::ByteBuffer;
///
/// let mut buffer = ByteBuffer::new();
/// buffer.append_str("id = ");
/// buffer.append_i64(-42);
///
/// assert_eq!(buffer.as_bytes(), b"id = -42");
///
/// buffer.reset();
/// assert!(buffer.is_empty());
/// ```
#[derive(Clone, Default, Eq, PartialEq)]
pub struct ByteBuffer {
    bytes: Vec<u8>,
}

impl ByteBuffer {
    /// Creates an empty buffer without allocating.
    #[must_use]
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Creates an empty buffer that can hold at least `capacity` bytes without reallocating.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Number of content bytes in the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the buffer has no content. An empty buffer may still hold capacity.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of bytes the buffer can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    /// Appends raw bytes.
    ///
    /// The bytes are not required to be valid UTF-8. Text views of the buffer replace any
    /// invalid sequences (see [`as_text()`][Self::as_text]).
    pub fn append_bytes(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    /// Appends a single byte.
    pub fn append_byte(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    /// Appends UTF-8 text.
    pub fn append_str(&mut self, text: &str) {
        self.bytes.extend_from_slice(text.as_bytes());
    }

    /// Appends the decimal representation of a signed integer.
    ///
    /// The representation is minimal: no leading zeros and a `-` only for negative values.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pooled_text::ByteBuffer;
    ///
    /// let mut buffer = ByteBuffer::new();
    /// buffer.append_i64(i64::MIN);
    ///
    /// assert_eq!(buffer.as_bytes(), b"-9223372036854775808");
    /// ```
    pub fn append_i64(&mut self, value: i64) {
        if value < 0 {
            self.bytes.push(b'-');
        }

        self.append_u64(value.unsigned_abs());
    }

    /// Appends the decimal representation of an unsigned integer.
    #[allow(
        clippy::arithmetic_side_effects,
        clippy::cast_possible_truncation,
        clippy::indexing_slicing,
        clippy::integer_division,
        reason = "digit extraction stays within the scratch array sized for u64::MAX"
    )]
    pub fn append_u64(&mut self, value: u64) {
        let mut scratch = [0_u8; MAX_U64_DIGITS];
        let mut start = MAX_U64_DIGITS;
        let mut remaining = value;

        loop {
            start -= 1;
            scratch[start] = b'0' + (remaining % 10) as u8;
            remaining /= 10;

            if remaining == 0 {
                break;
            }
        }

        self.bytes.extend_from_slice(&scratch[start..]);
    }

    /// Appends the decimal representation of any primitive integer.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pooled_text::ByteBuffer;
    ///
    /// let mut buffer = ByteBuffer::new();
    /// buffer.append_integer(7_u8);
    /// buffer.append_byte(b',');
    /// buffer.append_integer(-7_i16);
    ///
    /// assert_eq!(buffer.as_bytes(), b"7,-7");
    /// ```
    pub fn append_integer<T: Integer>(&mut self, value: T) {
        value.append_decimal(self);
    }

    /// Appends a float with exactly `precision` digits after the decimal point.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pooled_text::ByteBuffer;
    ///
    /// let mut buffer = ByteBuffer::new();
    /// buffer.append_f64(3.14159, 2);
    ///
    /// assert_eq!(buffer.as_bytes(), b"3.14");
    /// ```
    pub fn append_f64(&mut self, value: f64, precision: usize) {
        fmt::Write::write_fmt(self, format_args!("{value:.precision$}"))
            .expect("formatting a float into a ByteBuffer cannot fail");
    }

    /// Appends a float in its shortest representation that parses back to the same value.
    ///
    /// Trailing zeros are never emitted (`2.5`, not `2.50`; `3`, not `3.0`).
    pub fn append_f64_shortest(&mut self, value: f64) {
        fmt::Write::write_fmt(self, format_args!("{value}"))
            .expect("formatting a float into a ByteBuffer cannot fail");
    }

    /// Shortens the buffer to `len` bytes. Does nothing if the buffer is already shorter.
    pub fn truncate(&mut self, len: usize) {
        self.bytes.truncate(len);
    }

    /// Discards all content while keeping the allocated capacity.
    pub fn reset(&mut self) {
        self.bytes.clear();
    }

    /// Whether the content ends with `suffix`.
    #[must_use]
    pub fn ends_with(&self, suffix: &[u8]) -> bool {
        self.bytes.ends_with(suffix)
    }

    /// Borrows the content.
    ///
    /// The borrow ends before the next mutation of the buffer, so a view can never observe
    /// content written afterwards.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Borrows the content as text.
    ///
    /// Content written through the text and number operations is always valid UTF-8 and is
    /// returned without copying. If raw bytes made the content invalid, the invalid sequences
    /// are replaced in an owned copy.
    #[must_use]
    pub fn as_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Copies the content into a new vector that is independent of this buffer.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    /// Consumes the buffer and returns its storage.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl fmt::Write for ByteBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.append_str(s);
        Ok(())
    }
}

impl fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("len", &self.bytes.len())
            .field("capacity", &self.bytes.capacity())
            .field("content", &self.as_text())
            .finish()
    }
}

/// A primitive integer that can be rendered in decimal by a [`ByteBuffer`].
///
/// This trait is sealed. It is implemented for every primitive integer type up to 64 bits.
pub trait Integer: Copy + Sealed {
    /// Appends the decimal representation of `self` to the buffer.
    fn append_decimal(self, buffer: &mut ByteBuffer);
}

macro_rules! impl_integer {
    (signed: $($t:ty),*; unsigned: $($u:ty),*) => {
        $(
            impl Sealed for $t {}

            impl Integer for $t {
                fn append_decimal(self, buffer: &mut ByteBuffer) {
                    buffer.append_i64(i64::from(self));
                }
            }
        )*
        $(
            impl Sealed for $u {}

            impl Integer for $u {
                fn append_decimal(self, buffer: &mut ByteBuffer) {
                    buffer.append_u64(u64::from(self));
                }
            }
        )*
    };
}

impl_integer!(signed: i8, i16, i32, i64; unsigned: u8, u16, u32, u64);

impl Sealed for isize {}

impl Integer for isize {
    fn append_decimal(self, buffer: &mut ByteBuffer) {
        buffer.append_i64(
            i64::try_from(self).expect("isize is at most 64 bits on all supported platforms"),
        );
    }
}

impl Sealed for usize {}

impl Integer for usize {
    fn append_decimal(self, buffer: &mut ByteBuffer) {
        buffer.append_u64(
            u64::try_from(self).expect("usize is at most 64 bits on all supported platforms"),
        );
    }
}
