use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::metrics::{BUFFERS_ACQUIRED, BUFFERS_DETACHED, BUFFERS_RETIRED, BUFFERS_REUSED};
use crate::{ByteBuffer, PooledBuffer, TextPoolBuilder};

/// Source of pool identities, used to detect buffers released into a pool that did not
/// issue them.
static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(0);

static GLOBAL_POOL: LazyLock<TextPool> = LazyLock::new(TextPool::new);

/// A thread-safe pool of reusable [`ByteBuffer`]s.
///
/// This type acts as a cloneable handle to a shared pool instance. Multiple handles can exist
/// simultaneously, and the underlying pool remains alive as long as at least one handle (or one
/// outstanding [`PooledBuffer`]) exists.
///
/// # Lifecycle of a buffer
///
/// A buffer is either leased to exactly one [`PooledBuffer`] or idle in the pool. An idle buffer
/// always has zero length. [`acquire()`][Self::acquire] clears the buffer again before handing it
/// out, so even a buffer that reached the pool through an unusual path can never leak content
/// from a previous use.
///
/// Releasing happens when the [`PooledBuffer`] is dropped, which covers every exit path including
/// early returns and panics. [`release()`][Self::release] is the explicit spelling.
///
/// # Generations
///
/// Each buffer occupies a slot in the pool. The slot carries a generation number that advances
/// every time a lease on it ends. A lease remembers the generation it was issued under and the
/// pool checks it on release. A release that does not match the current lease of its slot is a
/// contract violation and panics before the pool state is touched, rather than letting two users
/// share one buffer.
///
/// # Process-scoped pool
///
/// Code that does not need an isolated pool can use [`TextPool::global()`], which is created on
/// first use and lives for the remainder of the process.
///
/// # Example
///
/// ```rust
/// use pooled_text::TextPool;
///
/// let pool = TextPool::new();
///
/// let mut buffer = pool.acquire();
/// buffer.append_str("SELECT 1");
/// assert_eq!(buffer.as_text(), "SELECT 1");
///
/// pool.release(buffer);
/// assert_eq!(pool.idle_len(), 1);
///
/// // The storage is reused, but the content is gone.
/// let buffer = pool.acquire();
/// assert!(buffer.is_empty());
/// ```
#[derive(Clone)]
pub struct TextPool {
    inner: Arc<PoolInner>,
}

pub(crate) struct PoolInner {
    id: u64,
    initial_capacity: usize,
    max_idle: usize,
    max_retained_capacity: usize,
    state: Mutex<PoolState>,
}

#[derive(Debug, Default)]
struct PoolState {
    /// Every slot the pool has ever created. A slot index is stable for the lifetime of the pool.
    slots: Vec<Slot>,

    /// Buffers ready to be handed out, each with the slot it occupies.
    idle: Vec<IdleBuffer>,

    /// Slots that currently have no storage, either because their buffer was dropped by policy
    /// or because it was detached. Reused before new slots are created.
    vacant: Vec<usize>,
}

#[derive(Clone, Copy, Debug, Default)]
struct Slot {
    generation: u64,
    leased: bool,
}

#[derive(Debug)]
struct IdleBuffer {
    slot_index: usize,
    buffer: ByteBuffer,
}

/// Identifies one lease of one pool slot.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Lease {
    pub(crate) pool_id: u64,
    pub(crate) slot_index: usize,
    pub(crate) generation: u64,
}

impl TextPool {
    /// Creates a new [`TextPool`] with the default configuration.
    ///
    /// The pool starts empty and allocates buffers on demand.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pooled_text::TextPool;
    ///
    /// let pool = TextPool::new();
    ///
    /// assert_eq!(pool.idle_len(), 0);
    /// assert_eq!(pool.leased_len(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts building a new [`TextPool`].
    ///
    /// Use this when you want to customize the pool configuration beyond the defaults.
    pub fn builder() -> TextPoolBuilder {
        TextPoolBuilder::new()
    }

    /// The process-scoped pool.
    ///
    /// It is created on first use with the default configuration and is never dropped.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL_POOL
    }

    pub(crate) fn new_inner(
        initial_capacity: usize,
        max_idle: usize,
        max_retained_capacity: usize,
    ) -> Self {
        let id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);

        debug!(
            pool_id = id,
            initial_capacity, max_idle, max_retained_capacity, "text pool created"
        );

        Self {
            inner: Arc::new(PoolInner {
                id,
                initial_capacity,
                max_idle,
                max_retained_capacity,
                state: Mutex::new(PoolState::default()),
            }),
        }
    }

    /// Acquires an empty buffer, reusing an idle one when available.
    ///
    /// The buffer is returned to the pool when the returned [`PooledBuffer`] is dropped.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pooled_text::TextPool;
    ///
    /// let pool = TextPool::new();
    ///
    /// let first = pool.acquire();
    /// let second = pool.acquire();
    /// assert_eq!(pool.leased_len(), 2);
    ///
    /// drop(first);
    /// drop(second);
    /// assert_eq!(pool.leased_len(), 0);
    /// assert_eq!(pool.idle_len(), 2);
    /// ```
    #[must_use]
    pub fn acquire(&self) -> PooledBuffer {
        let (lease, buffer) = self.inner.check_out();

        PooledBuffer::new(buffer, lease, Arc::clone(&self.inner))
    }

    /// Returns a buffer to the pool, discarding its content.
    ///
    /// This is equivalent to dropping the buffer, with the added check that the buffer belongs
    /// to this pool.
    ///
    /// # Panics
    ///
    /// Panics if the buffer was acquired from a different pool.
    pub fn release(&self, buffer: PooledBuffer) {
        assert!(
            buffer.is_from(&self.inner),
            "pool contract violation: buffer released into pool {} was acquired from pool {}",
            self.inner.id,
            buffer.lease_pool_id()
        );

        drop(buffer);
    }

    /// The number of idle buffers ready to be handed out.
    ///
    /// This operation may block if another thread is currently accessing the pool.
    #[must_use]
    pub fn idle_len(&self) -> usize {
        self.inner.state.lock().idle.len()
    }

    /// The number of buffers that are currently leased.
    ///
    /// This operation may block if another thread is currently accessing the pool.
    #[must_use]
    pub fn leased_len(&self) -> usize {
        self.inner
            .state
            .lock()
            .slots
            .iter()
            .filter(|slot| slot.leased)
            .count()
    }
}

impl Default for TextPool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TextPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextPool")
            .field("inner", &self.inner)
            .finish()
    }
}

impl PoolInner {
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    fn check_out(&self) -> (Lease, ByteBuffer) {
        let (slot_index, generation, idle_buffer) = {
            let mut state = self.state.lock();

            let (slot_index, idle_buffer) = match state.idle.pop() {
                Some(idle) => (idle.slot_index, Some(idle.buffer)),
                None => (state.vacant_slot(), None),
            };

            let slot = state.slot_mut(slot_index);
            assert!(
                !slot.leased,
                "pool state corrupted: slot {slot_index} handed out while already leased"
            );
            slot.leased = true;

            (slot_index, slot.generation, idle_buffer)
        };

        let reused = idle_buffer.is_some();

        // Allocation of fresh storage happens outside the lock.
        let mut buffer =
            idle_buffer.unwrap_or_else(|| ByteBuffer::with_capacity(self.initial_capacity));

        // The previous lease cleared the buffer on release. Clearing again here means a buffer
        // can never carry content into a new lease, whatever path it took into the pool.
        buffer.reset();

        BUFFERS_ACQUIRED.with(|e| e.observe_once());
        if reused {
            BUFFERS_REUSED.with(|e| e.observe_once());
        }

        trace!(
            pool_id = self.id,
            slot_index, generation, reused, "buffer acquired"
        );

        (
            Lease {
                pool_id: self.id,
                slot_index,
                generation,
            },
            buffer,
        )
    }

    /// Ends a lease and keeps the buffer for reuse if the pool policy allows it.
    ///
    /// # Panics
    ///
    /// Panics if the lease is not the current lease of its slot in this pool.
    pub(crate) fn check_in(&self, lease: Lease, mut buffer: ByteBuffer) {
        self.assert_issued_here(lease);

        buffer.reset();
        let retainable = buffer.capacity() <= self.max_retained_capacity;

        let dropped = {
            let mut state = self.state.lock();
            state.end_lease(lease);

            if retainable && state.idle.len() < self.max_idle {
                state.idle.push(IdleBuffer {
                    slot_index: lease.slot_index,
                    buffer,
                });
                None
            } else {
                state.vacant.push(lease.slot_index);
                Some(buffer)
            }
        };

        // Deallocation of dropped storage happens outside the lock.
        match dropped {
            Some(buffer) => {
                let capacity = buffer.capacity();
                drop(buffer);

                BUFFERS_RETIRED.with(|e| e.observe(capacity));

                trace!(
                    pool_id = self.id,
                    slot_index = lease.slot_index,
                    capacity,
                    "buffer dropped on release"
                );
            }
            None => {
                trace!(
                    pool_id = self.id,
                    slot_index = lease.slot_index,
                    "buffer returned to pool"
                );
            }
        }
    }

    /// Ends a lease whose storage the caller keeps. The slot stays vacant until the pool needs
    /// a new buffer.
    ///
    /// # Panics
    ///
    /// Panics if the lease is not the current lease of its slot in this pool.
    pub(crate) fn retire(&self, lease: Lease) {
        self.assert_issued_here(lease);

        {
            let mut state = self.state.lock();
            state.end_lease(lease);
            state.vacant.push(lease.slot_index);
        }

        BUFFERS_DETACHED.with(|e| e.observe_once());

        trace!(
            pool_id = self.id,
            slot_index = lease.slot_index,
            "buffer detached from pool"
        );
    }

    fn assert_issued_here(&self, lease: Lease) {
        assert_eq!(
            lease.pool_id, self.id,
            "pool contract violation: lease {lease:?} does not belong to pool {}",
            self.id
        );
    }
}

impl fmt::Debug for PoolInner {
    #[cfg_attr(test, mutants::skip)] // No API contract.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();

        f.debug_struct("PoolInner")
            .field("id", &self.id)
            .field("initial_capacity", &self.initial_capacity)
            .field("max_idle", &self.max_idle)
            .field("max_retained_capacity", &self.max_retained_capacity)
            .field("slots", &state.slots.len())
            .field("idle", &state.idle.len())
            .field("vacant", &state.vacant.len())
            .finish()
    }
}

impl PoolState {
    /// Returns a slot without storage, creating one if none is vacant.
    fn vacant_slot(&mut self) -> usize {
        if let Some(slot_index) = self.vacant.pop() {
            return slot_index;
        }

        self.slots.push(Slot::default());

        self.slots
            .len()
            .checked_sub(1)
            .expect("we just pushed a slot so the length is at least 1")
    }

    fn slot_mut(&mut self, slot_index: usize) -> &mut Slot {
        self.slots
            .get_mut(slot_index)
            .expect("slot indexes only come from the pool's own bookkeeping")
    }

    /// Verifies that `lease` is the current lease of its slot and ends it.
    ///
    /// Nothing is modified if verification fails.
    fn end_lease(&mut self, lease: Lease) {
        let Some(slot) = self.slots.get_mut(lease.slot_index) else {
            panic!("pool contract violation: lease {lease:?} refers to a slot that does not exist");
        };

        assert!(
            slot.leased,
            "pool contract violation: lease {lease:?} released but its slot is not leased (double release?)"
        );

        assert_eq!(
            slot.generation, lease.generation,
            "pool contract violation: lease {lease:?} is stale, its slot has moved on to another generation"
        );

        slot.generation = slot.generation.wrapping_add(1);
        slot.leased = false;
    }
}
