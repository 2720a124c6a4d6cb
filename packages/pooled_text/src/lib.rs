#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Pooled, append-only text buffers for assembling SQL statements and JSON documents.
//!
//! Hot code paths such as generated data access code or per-request serialization build many
//! short-lived pieces of text. This crate lets them write into buffers taken from a shared
//! [`TextPool`], so that once the pool is warm, building a statement allocates nothing but the
//! final result.
//!
//! # Quick start
//!
//! ```rust
//! use pooled_text::{SqlStatement, TextPool};
//!
//! let pool = TextPool::new();
//!
//! let mut statement = SqlStatement::new(&pool);
//! statement
//!     .append("SELECT")
//!     .append_field_list("u", &["id", "name"])
//!     .append("FROM users u WHERE u.id IN")
//!     .append_raw("(")
//!     .append_int_list(&[1, 2, 3])
//!     .append(") AND u.name =")
//!     .append_escaped("O'Brien");
//!
//! assert_eq!(
//!     statement.snapshot_text(),
//!     r"SELECT u.id,u.name FROM users u WHERE u.id IN (1,2,3) AND u.name = 'O\'Brien'"
//! );
//! ```
//!
//! # Reuse safety
//!
//! A pooled buffer is either leased to exactly one holder or idle in the pool, and an idle
//! buffer is always empty. Every way of getting text out of a builder consumes the builder and
//! produces a value that owns its bytes, either a copy or the storage itself removed from the
//! pool. Nothing obtained from one session can change because a later session reuses the same
//! storage.
//!
//! Releasing happens on drop, so a builder abandoned through an early return or a panic still
//! returns its buffer. Mistakes that can only be detected at runtime, such as releasing a buffer
//! into a pool that did not issue it, panic with a message naming the violation.
//!
//! # Escaping
//!
//! The [`escape`] module holds the SQL literal and JSON string escaping engines. The builders
//! use them for [`SqlStatement::append_escaped()`] and [`JsonBuffer::quoted()`] and they can
//! also write into any [`escape::ByteSink`] directly.

mod buffer;
mod builder;
pub mod escape;
mod fragment;
mod json_buffer;
mod metrics;
mod pool;
mod pooled_buffer;
mod sql_statement;
mod upsert;

pub use buffer::*;
pub use builder::*;
pub use fragment::*;
pub use json_buffer::*;
pub use pool::*;
pub use pooled_buffer::*;
pub use sql_statement::*;
pub use upsert::*;

pub(crate) mod sealed {
    #[allow(
        unnameable_types,
        unreachable_pub,
        reason = "sealed traits are public by necessity but not nameable outside the crate"
    )]
    pub trait Sealed {}
}
