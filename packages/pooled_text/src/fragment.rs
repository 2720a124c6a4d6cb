use std::borrow::Cow;

use crate::ByteBuffer;
use crate::sealed::Sealed;

/// A value that the text builders know how to append: text or a primitive integer.
///
/// Text is written as-is and integers in minimal decimal form. The trait is sealed, so passing
/// any other type to [`SqlStatement::append()`][crate::SqlStatement::append] and its siblings
/// fails to compile instead of silently rendering something unexpected. Arbitrary bytes can still
/// be written through the explicit [`append_bytes()`][ByteBuffer::append_bytes].
///
/// # Example
///
/// ```rust
/// use pooled_text::{SqlStatement, TextPool};
///
/// let pool = TextPool::new();
/// let mut statement = SqlStatement::new(&pool);
/// statement.append("LIMIT").append(10_u32).append_raw('+').append_raw(String::from("5"));
///
/// assert_eq!(statement.as_text(), "LIMIT 10 +5");
/// ```
pub trait Fragment: Sealed + Sized {
    /// Appends the rendered value to the buffer.
    fn write_to(self, buffer: &mut ByteBuffer);
}

macro_rules! impl_text_fragment {
    ($($t:ty),*) => {
        $(
            impl Sealed for $t {}

            impl Fragment for $t {
                fn write_to(self, buffer: &mut ByteBuffer) {
                    buffer.append_str(&self);
                }
            }
        )*
    };
}

impl_text_fragment!(&str, &String, String, Cow<'_, str>, &Cow<'_, str>);

impl Sealed for char {}

impl Fragment for char {
    fn write_to(self, buffer: &mut ByteBuffer) {
        let mut scratch = [0_u8; 4];
        buffer.append_str(self.encode_utf8(&mut scratch));
    }
}

impl Sealed for &char {}

impl Fragment for &char {
    fn write_to(self, buffer: &mut ByteBuffer) {
        (*self).write_to(buffer);
    }
}

macro_rules! impl_integer_fragment {
    ($($t:ty),*) => {
        $(
            impl Fragment for $t {
                fn write_to(self, buffer: &mut ByteBuffer) {
                    buffer.append_integer(self);
                }
            }

            impl Sealed for &$t {}

            impl Fragment for &$t {
                fn write_to(self, buffer: &mut ByteBuffer) {
                    buffer.append_integer(*self);
                }
            }
        )*
    };
}

impl_integer_fragment!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(&str: Fragment);
    assert_impl_all!(&String: Fragment);
    assert_impl_all!(Cow<'static, str>: Fragment);
    assert_impl_all!(u64: Fragment);
    assert_impl_all!(&i8: Fragment);
    assert_not_impl_any!(f64: Fragment);
    assert_not_impl_any!(bool: Fragment);
    assert_not_impl_any!(Vec<u8>: Fragment);
    assert_not_impl_any!(Option<&str>: Fragment);
    assert_not_impl_any!(&&str: Fragment);

    fn render(fragment: impl Fragment) -> String {
        let mut buffer = ByteBuffer::new();
        fragment.write_to(&mut buffer);
        buffer.as_text().into_owned()
    }

    #[test]
    fn text_is_written_verbatim() {
        assert_eq!(render("it's"), "it's");
        assert_eq!(render(String::from("a\\b")), "a\\b");
        assert_eq!(render(&String::from("ref")), "ref");
        assert_eq!(render(Cow::Borrowed("cow")), "cow");
        assert_eq!(render('é'), "é");
        assert_eq!(render(""), "");
    }

    #[test]
    fn integers_are_decimal() {
        assert_eq!(render(-5_i8), "-5");
        assert_eq!(render(255_u8), "255");
        assert_eq!(render(0_usize), "0");
        assert_eq!(render(isize::MIN), isize::MIN.to_string());
        assert_eq!(render(&42_u16), "42");
        assert_eq!(render(&'x'), "x");
    }
}
