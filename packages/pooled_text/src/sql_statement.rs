use std::fmt::{self, Display, Write as _};
use std::str;

use crate::escape::{SqlEscaper, escape_sql_into};
use crate::{ByteBuffer, Fragment, Integer, PooledBuffer, TextPool};

/// Incrementally assembles one SQL statement in a pooled buffer.
///
/// Every append method returns `&mut Self` so calls can be chained. The statement is extracted
/// with one of the consuming methods, which also return the buffer to the pool:
///
/// * [`snapshot_text()`][Self::snapshot_text] and [`snapshot_bytes()`][Self::snapshot_bytes]
///   copy the content out.
/// * [`detach()`][Self::detach] hands over the storage itself.
/// * [`release()`][Self::release] discards the content.
///
/// Dropping the statement without calling any of them releases the buffer as well.
///
/// # Spacing
///
/// [`append()`][Self::append] writes a single space after each value, which matches how
/// statements are usually assembled keyword by keyword. [`append_raw()`][Self::append_raw]
/// writes values without any separator.
///
/// # Example
///
/// ```rust
/// use pooled_text::{SqlStatement, TextPool};
///
/// let pool = TextPool::new();
///
/// let mut statement = SqlStatement::new(&pool);
/// statement
///     .append("SELECT")
///     .append_field_list("", &["id", "name"])
///     .append("FROM users WHERE id =")
///     .append(42);
///
/// assert_eq!(statement.snapshot_text(), "SELECT id,name FROM users WHERE id = 42 ");
/// ```
#[derive(Debug)]
pub struct SqlStatement {
    buffer: PooledBuffer,

    /// Position right after the trailing space of the most recent field list, as long as nothing
    /// else has been written since. The next field list continues that one.
    field_list_end: Option<usize>,
}

impl SqlStatement {
    /// Starts a new statement in a buffer acquired from `pool`.
    #[must_use]
    pub fn new(pool: &TextPool) -> Self {
        Self {
            buffer: pool.acquire(),
            field_list_end: None,
        }
    }

    /// Appends a value followed by a single space.
    pub fn append(&mut self, value: impl Fragment) -> &mut Self {
        value.write_to(self.writer());
        self.writer().append_byte(b' ');
        self
    }

    /// Appends each value followed by a single space.
    pub fn append_all<I>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Fragment,
    {
        for value in values {
            self.append(value);
        }

        self
    }

    /// Appends a value with no separator.
    pub fn append_raw(&mut self, value: impl Fragment) -> &mut Self {
        value.write_to(self.writer());
        self
    }

    /// Appends each value with no separators.
    pub fn append_raw_all<I>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Fragment,
    {
        for value in values {
            self.append_raw(value);
        }

        self
    }

    /// Appends integers as a comma-separated decimal list without spaces, as used inside an
    /// `IN (...)` clause. An empty slice appends nothing.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pooled_text::{SqlStatement, TextPool};
    ///
    /// let pool = TextPool::new();
    /// let mut statement = SqlStatement::new(&pool);
    /// statement.append_raw("(").append_int_list(&[3_u64, 1, 2]).append_raw(")");
    ///
    /// assert_eq!(statement.as_text(), "(3,1,2)");
    /// ```
    pub fn append_int_list<T: Integer>(&mut self, values: &[T]) -> &mut Self {
        let buffer = self.writer();

        for (index, value) in values.iter().enumerate() {
            if index > 0 {
                buffer.append_byte(b',');
            }

            buffer.append_integer(*value);
        }

        self
    }

    /// Appends `count` parameter markers between `prefix` and `suffix`.
    ///
    /// The bookends are written even when `count` is zero.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pooled_text::{SqlStatement, TextPool};
    ///
    /// let pool = TextPool::new();
    /// let mut statement = SqlStatement::new(&pool);
    /// statement
    ///     .append_placeholder_block("(", ",", ")", "?", 3)
    ///     .append_placeholder_block("(", ",", ")", "?", 0);
    ///
    /// assert_eq!(statement.as_text(), "(?,?,?)()");
    /// ```
    pub fn append_placeholder_block(
        &mut self,
        prefix: &str,
        separator: &str,
        suffix: &str,
        placeholder: &str,
        count: usize,
    ) -> &mut Self {
        let buffer = self.writer();

        buffer.append_str(prefix);

        for index in 0..count {
            if index > 0 {
                buffer.append_str(separator);
            }

            buffer.append_str(placeholder);
        }

        buffer.append_str(suffix);
        self
    }

    /// Appends column names separated by commas and followed by a single space.
    ///
    /// A non-empty `prefix` qualifies every field as `prefix.field`. When called again with
    /// nothing written in between, the new fields continue the previous list: its trailing space
    /// becomes a comma. An empty `fields` appends nothing.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pooled_text::{SqlStatement, TextPool};
    ///
    /// let pool = TextPool::new();
    /// let mut statement = SqlStatement::new(&pool);
    /// statement
    ///     .append("SELECT")
    ///     .append_field_list("a", &["f1", "f2"])
    ///     .append_field_list("b", &["f1", "f2"]);
    ///
    /// assert_eq!(statement.as_text(), "SELECT a.f1,a.f2,b.f1,b.f2 ");
    /// ```
    pub fn append_field_list<I>(&mut self, prefix: &str, fields: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut fields = fields.into_iter().peekable();

        if fields.peek().is_none() {
            return self;
        }

        if self.field_list_end == Some(self.buffer.len()) {
            // The previous list is still the last thing written. Its trailing space becomes the
            // separator that continues it.
            let len = self.buffer.len().saturating_sub(1);
            self.buffer.truncate(len);
            self.buffer.append_byte(b',');
        }

        for (index, field) in fields.enumerate() {
            if index > 0 {
                self.buffer.append_byte(b',');
            }

            if !prefix.is_empty() {
                self.buffer.append_str(prefix);
                self.buffer.append_byte(b'.');
            }

            self.buffer.append_str(field.as_ref());
        }

        self.buffer.append_byte(b' ');
        self.field_list_end = Some(self.buffer.len());
        self
    }

    /// Appends fields with caller-chosen decoration and no implicit spaces.
    ///
    /// Renders `prepend`, then every field preceded by `prefix` and joined by `separator`, then
    /// `suffix`. With no fields only `prepend` and `suffix` are written.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pooled_text::{SqlStatement, TextPool};
    ///
    /// let pool = TextPool::new();
    /// let mut statement = SqlStatement::new(&pool);
    /// statement.append_joined("ORDER BY ", "t.", ", ", " DESC", &["created", "id"]);
    ///
    /// assert_eq!(statement.as_text(), "ORDER BY t.created, t.id DESC");
    /// ```
    pub fn append_joined<I>(
        &mut self,
        prepend: &str,
        prefix: &str,
        separator: &str,
        suffix: &str,
        fields: I,
    ) -> &mut Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let buffer = self.writer();

        buffer.append_str(prepend);

        for (index, field) in fields.into_iter().enumerate() {
            if index > 0 {
                buffer.append_str(separator);
            }

            buffer.append_str(prefix);
            buffer.append_str(field.as_ref());
        }

        buffer.append_str(suffix);
        self
    }

    /// Appends `value` as a single-quoted SQL string literal.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pooled_text::{SqlStatement, TextPool};
    ///
    /// let pool = TextPool::new();
    /// let mut statement = SqlStatement::new(&pool);
    /// statement.append("WHERE name =").append_escaped(r"O'Brien\");
    ///
    /// assert_eq!(statement.as_text(), r"WHERE name = 'O\'Brien\\'");
    /// ```
    pub fn append_escaped(&mut self, value: &str) -> &mut Self {
        let buffer = self.writer();

        buffer.append_byte(b'\'');
        escape_sql_into(&mut *buffer, value);
        buffer.append_byte(b'\'');
        self
    }

    /// Appends any displayable value as a single-quoted SQL string literal.
    ///
    /// The value is escaped while it is formatted, without an intermediate `String`.
    pub fn append_escaped_display(&mut self, value: &impl Display) -> &mut Self {
        let buffer = self.writer();

        buffer.append_byte(b'\'');
        write!(SqlEscaper::new(&mut *buffer), "{value}")
            .expect("escaping into a pooled buffer never fails");
        buffer.append_byte(b'\'');
        self
    }

    /// Removes `suffix` from the end of the statement if the statement ends with it.
    ///
    /// Useful for dropping a separator written after the last element of a loop.
    pub fn truncate_trailing(&mut self, suffix: &str) -> &mut Self {
        if self.buffer.ends_with(suffix.as_bytes()) {
            let len = self.buffer.len().saturating_sub(suffix.len());
            self.writer().truncate(len);
        }

        self
    }

    /// Access for every write that is not part of a field list, which ends any open field list.
    fn writer(&mut self) -> &mut ByteBuffer {
        self.field_list_end = None;
        &mut self.buffer
    }

    /// The statement as built so far.
    #[must_use]
    pub fn as_text(&self) -> &str {
        str::from_utf8(self.buffer.as_bytes())
            .expect("statements are only ever built from UTF-8 text")
    }

    /// Length of the statement in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns a copy of the statement and releases the buffer.
    #[must_use]
    pub fn snapshot_text(self) -> String {
        String::from_utf8(self.buffer.snapshot())
            .expect("statements are only ever built from UTF-8 text")
    }

    /// Returns a copy of the statement bytes and releases the buffer.
    #[must_use]
    pub fn snapshot_bytes(self) -> Vec<u8> {
        self.buffer.snapshot()
    }

    /// Returns the storage holding the statement, which leaves the pool for good.
    #[must_use]
    pub fn detach(self) -> Vec<u8> {
        self.buffer.detach()
    }

    /// Discards the statement and releases the buffer.
    pub fn release(self) {
        self.buffer.release();
    }
}

impl Display for SqlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_text())
    }
}
