use std::any::type_name;
use std::fmt::Display;
use std::str::{self, FromStr};

use tracing::error;

use crate::metrics::PARSE_FAILURES;
use crate::{Error, Result};

/// A type that can be converted from the raw bytes of one column value.
///
/// Implemented for the primitive integers, `f32`, `f64`, `bool` and `String`.
///
/// * Integers accept an optional sign followed by decimal digits, without whitespace. Values out
///   of range for the type are an error, never a wrapped or clamped value.
/// * Floats accept decimal and scientific notation.
/// * `bool` is parsed as an integer and is `true` only for `1`.
/// * `String` copies the bytes, replacing invalid UTF-8. It never fails.
pub trait FromRaw: Sized + Default {
    /// Converts the bytes of a non-NULL column value.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid representation of `Self`.
    fn from_raw(bytes: &[u8]) -> Result<Self>;
}

fn parse_text<T>(bytes: &[u8]) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    if bytes.is_empty() {
        return Err(Error::Empty);
    }

    let text = str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)?;

    text.parse().map_err(|problem: T::Err| Error::InvalidNumber {
        target: type_name::<T>(),
        value: text.to_owned(),
        problem: problem.to_string(),
    })
}

macro_rules! impl_from_raw_parsed {
    ($($t:ty),*) => {
        $(
            impl FromRaw for $t {
                fn from_raw(bytes: &[u8]) -> Result<Self> {
                    parse_text(bytes)
                }
            }
        )*
    };
}

impl_from_raw_parsed!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl FromRaw for bool {
    fn from_raw(bytes: &[u8]) -> Result<Self> {
        i64::from_raw(bytes).map(|value| value == 1)
    }
}

impl FromRaw for String {
    fn from_raw(bytes: &[u8]) -> Result<Self> {
        // The bytes typically belong to a row buffer that is overwritten by the next row.
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// Converts the bytes of a non-NULL column value into `T`.
///
/// # Errors
///
/// Returns an error if the bytes are not a valid representation of `T`.
///
/// # Example
///
/// ```rust
/// use raw_convert::{Error, try_convert};
///
/// assert_eq!(try_convert::<u16>(b"8080"), Ok(8080));
/// assert_eq!(try_convert::<u16>(b""), Err(Error::Empty));
/// assert!(try_convert::<u16>(b"70000").is_err());
/// ```
pub fn try_convert<T: FromRaw>(bytes: &[u8]) -> Result<T> {
    T::from_raw(bytes)
}

/// Converts a column value into `T`, falling back to `T::default()`.
///
/// `None` stands for SQL NULL and silently becomes the default. Bytes that cannot be converted
/// also become the default, and the failure is logged and counted in the
/// `raw_convert_parse_failures` event. A partially parsed value is never returned.
///
/// # Example
///
/// ```rust
/// use raw_convert::convert_or_default;
///
/// assert_eq!(convert_or_default::<i32>(Some(b"-12")), -12);
/// assert_eq!(convert_or_default::<i32>(None), 0);
/// assert_eq!(convert_or_default::<i32>(Some(b"12abc")), 0);
/// ```
#[must_use]
pub fn convert_or_default<T: FromRaw>(raw: Option<&[u8]>) -> T {
    let Some(bytes) = raw else {
        return T::default();
    };

    match T::from_raw(bytes) {
        Ok(value) => value,
        Err(problem) => {
            report_failure(type_name::<T>(), bytes, &problem);
            T::default()
        }
    }
}

#[cfg_attr(test, mutants::skip)] // Only logs and counts, no observable effect on the result.
fn report_failure(target_type: &str, bytes: &[u8], problem: &Error) {
    PARSE_FAILURES.with(|event| event.observe_once());

    error!(
        target_type,
        input = %String::from_utf8_lossy(bytes),
        %problem,
        "raw value conversion failed"
    );
}

/// Converts a column value into an `i64`, or 0 if it is NULL or invalid.
#[must_use]
pub fn to_i64(raw: Option<&[u8]>) -> i64 {
    convert_or_default(raw)
}

/// Converts a column value into a `u64`, or 0 if it is NULL or invalid.
#[must_use]
pub fn to_u64(raw: Option<&[u8]>) -> u64 {
    convert_or_default(raw)
}

/// Converts a column value into an `i32`, or 0 if it is NULL or invalid.
#[must_use]
pub fn to_i32(raw: Option<&[u8]>) -> i32 {
    convert_or_default(raw)
}

/// Converts a column value into a `u32`, or 0 if it is NULL or invalid.
#[must_use]
pub fn to_u32(raw: Option<&[u8]>) -> u32 {
    convert_or_default(raw)
}

/// Converts a column value into an `f32`, or 0 if it is NULL or invalid.
#[must_use]
pub fn to_f32(raw: Option<&[u8]>) -> f32 {
    convert_or_default(raw)
}

/// Converts a column value into an `f64`, or 0 if it is NULL or invalid.
#[must_use]
pub fn to_f64(raw: Option<&[u8]>) -> f64 {
    convert_or_default(raw)
}

/// Converts a column value into a `bool`, which is `true` only if the value is the integer 1.
#[must_use]
pub fn to_bool(raw: Option<&[u8]>) -> bool {
    convert_or_default(raw)
}

/// Copies a column value into a `String`, or an empty string if it is NULL.
#[must_use]
pub fn to_string(raw: Option<&[u8]>) -> String {
    convert_or_default(raw)
}

/// Parses an unsigned decimal number that must consist of digits only.
///
/// Stricter than converting through [`FromRaw`]: no sign is accepted and the error says which
/// byte was wrong.
///
/// # Errors
///
/// Returns [`Error::Empty`] for empty input, [`Error::UnexpectedFirstByte`] or
/// [`Error::UnexpectedTrailingByte`] for a byte that is not a digit and [`Error::Overflow`] if
/// the number does not fit into `usize`.
///
/// # Example
///
/// ```rust
/// use raw_convert::{Error, parse_uint};
///
/// assert_eq!(parse_uint(b"1234"), Ok(1234));
/// assert_eq!(
///     parse_uint(b"12a"),
///     Err(Error::UnexpectedTrailingByte {
///         byte: b'a',
///         position: 2
///     })
/// );
/// ```
pub fn parse_uint(bytes: &[u8]) -> Result<usize> {
    let Some(&first) = bytes.first() else {
        return Err(Error::Empty);
    };

    let mut value = digit_value(first).ok_or(Error::UnexpectedFirstByte { byte: first })?;

    for (position, &byte) in bytes.iter().enumerate().skip(1) {
        let digit = digit_value(byte).ok_or(Error::UnexpectedTrailingByte { byte, position })?;

        value = value
            .checked_mul(10)
            .and_then(|value| value.checked_add(digit))
            .ok_or(Error::Overflow)?;
    }

    Ok(value)
}

fn digit_value(byte: u8) -> Option<usize> {
    byte.is_ascii_digit().then(|| usize::from(byte.wrapping_sub(b'0')))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn integers() {
        assert_eq!(try_convert::<i64>(b"-9223372036854775808"), Ok(i64::MIN));
        assert_eq!(try_convert::<u64>(b"18446744073709551615"), Ok(u64::MAX));
        assert_eq!(try_convert::<i8>(b"+12"), Ok(12));
        assert_eq!(try_convert::<usize>(b"0"), Ok(0));
    }

    #[test]
    fn integer_out_of_range_is_an_error() {
        let error = try_convert::<u8>(b"256").unwrap_err();

        match error {
            Error::InvalidNumber { target, value, .. } => {
                assert_eq!(target, "u8");
                assert_eq!(value, "256");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        try_convert::<u32>(b"-1").unwrap_err();
    }

    #[test]
    fn malformed_integers() {
        assert_eq!(try_convert::<i32>(b""), Err(Error::Empty));
        assert_eq!(try_convert::<i32>(&[0xFF, b'1']), Err(Error::InvalidUtf8));
        try_convert::<i32>(b" 1").unwrap_err();
        try_convert::<i32>(b"1.5").unwrap_err();
    }

    #[test]
    fn floats() {
        assert_eq!(try_convert::<f64>(b"1.5"), Ok(1.5));
        assert_eq!(try_convert::<f64>(b"-2e3"), Ok(-2000.0));
        assert_eq!(try_convert::<f32>(b"0.25"), Ok(0.25));
        try_convert::<f64>(b"one").unwrap_err();
    }

    #[test]
    fn bool_is_true_only_for_one() {
        assert_eq!(try_convert::<bool>(b"1"), Ok(true));
        assert_eq!(try_convert::<bool>(b"0"), Ok(false));
        assert_eq!(try_convert::<bool>(b"2"), Ok(false));
        try_convert::<bool>(b"true").unwrap_err();
    }

    #[test]
    fn strings_are_copied_lossily() {
        assert_eq!(try_convert::<String>(b"abc"), Ok(String::from("abc")));
        assert_eq!(try_convert::<String>(b""), Ok(String::new()));
        assert_eq!(
            try_convert::<String>(&[b'a', 0xFF]),
            Ok(String::from("a\u{FFFD}"))
        );
    }

    #[test]
    fn null_becomes_default() {
        assert_eq!(to_i64(None), 0);
        assert_eq!(to_u64(None), 0);
        assert_eq!(to_i32(None), 0);
        assert_eq!(to_u32(None), 0);
        assert!(!to_bool(None));
        assert_eq!(to_string(None), "");
        assert!(to_f32(None).abs() < f32::EPSILON);
        assert!(to_f64(None).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_becomes_default() {
        assert_eq!(to_i64(Some(b"12x")), 0);
        assert_eq!(to_u32(Some(b"4294967296")), 0);
        assert_eq!(to_i32(Some(b"")), 0);
        assert!(!to_bool(Some(b"yes")));
        assert!(to_f64(Some(b"1,5")).abs() < f64::EPSILON);
    }

    #[test]
    fn valid_values_convert() {
        assert_eq!(to_i64(Some(b"-5")), -5);
        assert_eq!(to_u64(Some(b"5")), 5);
        assert_eq!(to_i32(Some(b"-2147483648")), i32::MIN);
        assert_eq!(to_u32(Some(b"4294967295")), u32::MAX);
        assert!(to_bool(Some(b"1")));
        assert_eq!(to_string(Some(b"text")), "text");
        assert!((to_f32(Some(b"2.5")) - 2.5).abs() < f32::EPSILON);
        assert!((to_f64(Some(b"2.5")) - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_uint_accepts_digits() {
        assert_eq!(parse_uint(b"0"), Ok(0));
        assert_eq!(parse_uint(b"007"), Ok(7));
        assert_eq!(parse_uint(b"1234567890"), Ok(1_234_567_890));
        assert_eq!(parse_uint(usize::MAX.to_string().as_bytes()), Ok(usize::MAX));
    }

    #[test]
    fn parse_uint_errors() {
        assert_eq!(parse_uint(b""), Err(Error::Empty));
        assert_eq!(
            parse_uint(b"-1"),
            Err(Error::UnexpectedFirstByte { byte: b'-' })
        );
        assert_eq!(
            parse_uint(b"1 "),
            Err(Error::UnexpectedTrailingByte {
                byte: b' ',
                position: 1
            })
        );

        let too_long = format!("{}0", usize::MAX);
        assert_eq!(parse_uint(too_long.as_bytes()), Err(Error::Overflow));
    }
}
