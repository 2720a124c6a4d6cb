#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Conversion of raw database column bytes into Rust primitives.
//!
//! Database drivers commonly hand out each column of a result row as a byte slice holding the
//! textual representation of the value, with `None` for SQL NULL. This crate turns those bytes
//! into integers, floats, booleans and strings.
//!
//! There are two flavors:
//!
//! * [`try_convert()`] returns a [`Result`][std::result::Result] with a precise [`Error`].
//! * [`convert_or_default()`] and the `to_*` shorthands return the default value of the target
//!   type for NULL as well as for invalid input. Invalid input is logged through `tracing` and
//!   counted in the `raw_convert_parse_failures` event.
//!
//! # Example
//!
//! ```rust
//! use raw_convert::{to_bool, to_i64, to_string};
//!
//! let row: [Option<&[u8]>; 3] = [Some(b"42"), Some(b"1"), None];
//!
//! assert_eq!(to_i64(row[0]), 42);
//! assert!(to_bool(row[1]));
//! assert_eq!(to_string(row[2]), "");
//! ```

mod convert;
mod error;
mod metrics;

pub use convert::*;
pub use error::*;
