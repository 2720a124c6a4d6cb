use crate::TextPool;

/// Capacity of freshly allocated buffers, in bytes.
const DEFAULT_INITIAL_CAPACITY: usize = 256;

/// Maximum number of idle buffers the pool keeps around.
const DEFAULT_MAX_IDLE: usize = 1024;

/// Buffers that grew beyond this many bytes are dropped on release instead of being kept.
const DEFAULT_MAX_RETAINED_CAPACITY: usize = 64 * 1024;

/// Builder for creating an instance of [`TextPool`].
///
/// You only need to use this builder if you want to customize the pool configuration.
/// The default configuration used by [`TextPool::new()`][1] is sufficient for most use cases.
///
/// # Examples
///
/// ```
/// use pooled_text::TextPool;
///
/// let pool = TextPool::builder()
///     .initial_capacity(1024)
///     .max_idle(16)
///     .max_retained_capacity(16 * 1024)
///     .build();
/// ```
///
/// [1]: TextPool::new
#[derive(Debug)]
#[must_use]
pub struct TextPoolBuilder {
    initial_capacity: usize,
    max_idle: usize,
    max_retained_capacity: usize,
}

impl TextPoolBuilder {
    pub(crate) fn new() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_idle: DEFAULT_MAX_IDLE,
            max_retained_capacity: DEFAULT_MAX_RETAINED_CAPACITY,
        }
    }

    /// Sets the capacity, in bytes, of buffers the pool allocates when it has no idle buffer
    /// to hand out.
    ///
    /// # Examples
    ///
    /// ```
    /// use pooled_text::TextPool;
    ///
    /// let pool = TextPool::builder().initial_capacity(4096).build();
    /// let buffer = pool.acquire();
    ///
    /// assert!(buffer.capacity() >= 4096);
    /// ```
    pub fn initial_capacity(mut self, bytes: usize) -> Self {
        self.initial_capacity = bytes;
        self
    }

    /// Sets how many idle buffers the pool keeps. Buffers released while this many are already
    /// idle are dropped.
    ///
    /// Zero is allowed and turns the pool into a plain allocator, which is occasionally useful
    /// for isolating pooling effects in tests.
    pub fn max_idle(mut self, count: usize) -> Self {
        self.max_idle = count;
        self
    }

    /// Sets the largest capacity, in bytes, that a released buffer may have and still be kept.
    ///
    /// A single oversized statement would otherwise pin its memory for the lifetime of the pool.
    pub fn max_retained_capacity(mut self, bytes: usize) -> Self {
        self.max_retained_capacity = bytes;
        self
    }

    /// Builds the pool with the specified configuration.
    ///
    /// # Panics
    ///
    /// Panics if the initial capacity exceeds the maximum retained capacity, as no buffer could
    /// then ever be reused.
    #[must_use]
    pub fn build(self) -> TextPool {
        assert!(
            self.initial_capacity <= self.max_retained_capacity,
            "initial capacity {} exceeds the maximum retained capacity {}",
            self.initial_capacity,
            self.max_retained_capacity
        );

        TextPool::new_inner(
            self.initial_capacity,
            self.max_idle,
            self.max_retained_capacity,
        )
    }
}
