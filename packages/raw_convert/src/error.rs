use thiserror::Error;

/// Errors that can occur when converting raw column bytes.
#[derive(Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
#[allow(
    variant_size_differences,
    reason = "errors are created on the failure path only and never stored in bulk"
)]
pub enum Error {
    /// The input contained no bytes.
    #[error("empty input, expecting at least one digit")]
    Empty,

    /// The first byte of the input was not a decimal digit.
    #[error("unexpected first byte 0x{byte:02x}, expecting 0-9")]
    UnexpectedFirstByte {
        /// The offending byte.
        byte: u8,
    },

    /// A byte after the first one was not a decimal digit.
    #[error("unexpected byte 0x{byte:02x} at position {position}, expecting 0-9")]
    UnexpectedTrailingByte {
        /// The offending byte.
        byte: u8,

        /// Zero-based position of the offending byte in the input.
        position: usize,
    },

    /// The number does not fit into the target type.
    #[error("number does not fit into the target type")]
    Overflow,

    /// The input was expected to be UTF-8 text but was not.
    #[error("input is not valid UTF-8")]
    InvalidUtf8,

    /// The input was text but could not be parsed as the target type.
    #[error("cannot convert '{value}' to {target}: {problem}")]
    InvalidNumber {
        /// Name of the type the input was being converted to.
        target: &'static str,

        /// The input, with any invalid UTF-8 replaced.
        value: String,

        /// A human-readable description of the problem.
        problem: String,
    },
}

/// A specialized `Result` type for conversions, returning the crate's [`Error`] type as the
/// error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
