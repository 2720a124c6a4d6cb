use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::ByteBuffer;
use crate::pool::{Lease, PoolInner};

/// A [`ByteBuffer`] leased from a [`TextPool`][crate::TextPool].
///
/// The handle dereferences to the buffer for reading and writing. Dropping the handle returns the
/// buffer to the pool it came from, which happens on every exit path, including early returns
/// and unwinding.
///
/// Extracting content is only possible through operations that consume the handle:
///
/// * [`snapshot()`][Self::snapshot] copies the content and releases the buffer.
/// * [`detach()`][Self::detach] hands the storage itself to the caller and removes it from the
///   pool.
///
/// Each of these produces a value that does not borrow from the pool, so content obtained from
/// one lease can never change because a later lease reuses the same storage.
///
/// # Thread safety
///
/// The handle can be sent to another thread. All mutation requires `&mut self`, so a single lease
/// is never written by two threads at once.
pub struct PooledBuffer {
    buffer: ByteBuffer,

    /// `None` once the lease has ended, which only happens while the handle is being consumed.
    lease: Option<Lease>,

    pool: Arc<PoolInner>,
}

impl PooledBuffer {
    pub(crate) fn new(buffer: ByteBuffer, lease: Lease, pool: Arc<PoolInner>) -> Self {
        Self {
            buffer,
            lease: Some(lease),
            pool,
        }
    }

    /// Copies the content out and returns the buffer to the pool, as one step.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pooled_text::TextPool;
    ///
    /// let pool = TextPool::new();
    ///
    /// let mut buffer = pool.acquire();
    /// buffer.append_str("first");
    /// let first = buffer.snapshot();
    ///
    /// // The next lease reuses the same storage without affecting the snapshot.
    /// let mut buffer = pool.acquire();
    /// buffer.append_str("second");
    ///
    /// assert_eq!(first, b"first");
    /// ```
    #[must_use]
    pub fn snapshot(self) -> Vec<u8> {
        self.buffer.to_vec()
    }

    /// Takes the storage out of the pool and returns it without copying.
    ///
    /// The pool does not get the storage back. Its slot is left vacant and will receive a newly
    /// allocated buffer the next time the pool runs out of idle buffers.
    ///
    /// Use this when the content is large or long-lived enough that copying it would cost more
    /// than a fresh allocation for the pool.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pooled_text::TextPool;
    ///
    /// let pool = TextPool::new();
    ///
    /// let mut buffer = pool.acquire();
    /// buffer.append_str("a large document");
    /// let document = buffer.detach();
    ///
    /// assert_eq!(document, b"a large document");
    /// assert_eq!(pool.idle_len(), 0);
    /// ```
    #[must_use]
    pub fn detach(mut self) -> Vec<u8> {
        let buffer = mem::take(&mut self.buffer);

        if let Some(lease) = self.lease.take() {
            self.pool.retire(lease);
        }

        buffer.into_vec()
    }

    /// Discards the content and returns the buffer to the pool.
    ///
    /// Same as dropping the handle.
    pub fn release(self) {
        drop(self);
    }

    pub(crate) fn is_from(&self, pool: &Arc<PoolInner>) -> bool {
        Arc::ptr_eq(&self.pool, pool)
    }

    pub(crate) fn lease_pool_id(&self) -> u64 {
        self.pool.id()
    }

    #[cfg(test)]
    pub(crate) fn slot_index(&self) -> usize {
        self.current_lease().slot_index
    }

    #[cfg(test)]
    pub(crate) fn generation(&self) -> u64 {
        self.current_lease().generation
    }

    #[cfg(test)]
    fn current_lease(&self) -> Lease {
        self.lease.expect("a live handle always holds its lease")
    }
}

impl Deref for PooledBuffer {
    type Target = ByteBuffer;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(lease) = self.lease.take() {
            self.pool.check_in(lease, mem::take(&mut self.buffer));
        }
    }
}

impl fmt::Debug for PooledBuffer {
    #[cfg_attr(test, mutants::skip)] // No API contract.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("buffer", &self.buffer)
            .field("lease", &self.lease)
            .field("pool_id", &self.pool.id())
            .finish()
    }
}
