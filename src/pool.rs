//! Pooled output buffers.
//!
//! Encoding writes into a [`PooledBuffer`], a growable byte buffer whose
//! backing `Vec<u8>` is leased from a [`BufferPool`]. The default pool is a
//! process-wide [`SharedPool`] that keeps a bounded free list, so steady-state
//! encoding allocates nothing: a buffer is acquired, filled, read, and its
//! storage goes back to the pool when the buffer is released or dropped.
//!
//! Pools are injectable. Anything implementing [`BufferPool`] can back a
//! buffer, e.g. [`HeapPool`], which never retains storage.
//!
//! ```rust
//! use toon_codec::pool::PooledBuffer;
//! use toon_codec::{encode_value, Value};
//!
//! let mut buffer = PooledBuffer::new();
//! let first = encode_value(&Value::from(7), &mut buffer).unwrap();
//! assert_eq!(buffer.as_bytes(), b"7\n");
//!
//! buffer.clear();
//! let second = encode_value(&Value::from(7), &mut buffer).unwrap();
//! assert_eq!(first, second);
//! assert_eq!(buffer.written_count(), second);
//! buffer.release();
//! ```

use parking_lot::Mutex;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, trace};

/// Default capacity of a freshly allocated buffer.
pub const DEFAULT_BUFFER_CAPACITY: usize = 256;

/// Source of backing storage for [`PooledBuffer`]s.
///
/// Implementations must hand out empty vectors from `acquire` and accept any
/// vector previously acquired from them in `release`.
pub trait BufferPool: Send + Sync + fmt::Debug {
    /// Leases an empty vector with at least `min_capacity` bytes of capacity.
    fn acquire(&self, min_capacity: usize) -> Vec<u8>;

    /// Returns a leased vector. The pool may keep or drop it.
    fn release(&self, buffer: Vec<u8>);

    /// Snapshot of pool counters.
    fn stats(&self) -> PoolStats;
}

/// Counters reported by a [`BufferPool`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Total leases handed out.
    pub acquired: u64,
    /// Leases served from retained storage.
    pub reused: u64,
    /// Leases that needed a fresh allocation.
    pub allocated: u64,
    /// Buffers given back.
    pub released: u64,
    /// Returned buffers dropped instead of retained.
    pub discarded: u64,
    /// Buffers currently held by the pool.
    pub idle_buffers: usize,
    /// Capacity in bytes currently held by the pool.
    pub idle_bytes: usize,
    /// Leases not yet returned.
    pub outstanding: usize,
}

/// Limits for a [`SharedPool`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum number of idle buffers kept for reuse.
    pub max_idle_buffers: usize,
    /// Buffers that grew beyond this capacity are dropped on release.
    pub max_buffer_capacity: usize,
    /// Capacity of freshly allocated buffers.
    pub initial_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            max_idle_buffers: 64,
            max_buffer_capacity: 1024 * 1024,
            initial_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_idle_buffers(mut self, max_idle_buffers: usize) -> Self {
        self.max_idle_buffers = max_idle_buffers;
        self
    }

    #[must_use]
    pub fn with_max_buffer_capacity(mut self, max_buffer_capacity: usize) -> Self {
        self.max_buffer_capacity = max_buffer_capacity;
        self
    }

    #[must_use]
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }
}

/// A thread-safe pool with a bounded free list.
#[derive(Debug)]
pub struct SharedPool {
    config: PoolConfig,
    state: Mutex<PoolState>,
}

#[derive(Debug, Default)]
struct PoolState {
    idle: Vec<Vec<u8>>,
    stats: PoolStats,
}

impl SharedPool {
    #[must_use]
    pub fn new(config: PoolConfig) -> Self {
        SharedPool {
            config,
            state: Mutex::new(PoolState::default()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Drops every idle buffer.
    pub fn shrink(&self) {
        let mut state = self.state.lock();
        state.idle.clear();
        state.stats.idle_buffers = 0;
        state.stats.idle_bytes = 0;
    }
}

impl Default for SharedPool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl BufferPool for SharedPool {
    fn acquire(&self, min_capacity: usize) -> Vec<u8> {
        let mut state = self.state.lock();
        state.stats.acquired += 1;
        state.stats.outstanding += 1;

        let slot = state
            .idle
            .iter()
            .rposition(|buf| buf.capacity() >= min_capacity);
        let reused = match slot {
            Some(index) => Some(state.idle.swap_remove(index)),
            None => state.idle.pop(),
        };

        match reused {
            Some(mut buffer) => {
                state.stats.reused += 1;
                state.stats.idle_buffers = state.idle.len();
                state.stats.idle_bytes = state.stats.idle_bytes.saturating_sub(buffer.capacity());
                drop(state);
                buffer.reserve(min_capacity);
                trace!(capacity = buffer.capacity(), "reused pooled buffer");
                buffer
            }
            None => {
                state.stats.allocated += 1;
                drop(state);
                let capacity = min_capacity.max(self.config.initial_capacity);
                trace!(capacity, "allocated pooled buffer");
                Vec::with_capacity(capacity)
            }
        }
    }

    fn release(&self, mut buffer: Vec<u8>) {
        buffer.clear();
        let capacity = buffer.capacity();

        let mut state = self.state.lock();
        debug_assert!(
            state.stats.outstanding > 0,
            "buffer released to a pool it was not acquired from"
        );
        state.stats.outstanding = state.stats.outstanding.saturating_sub(1);
        state.stats.released += 1;

        if capacity > self.config.max_buffer_capacity
            || state.idle.len() >= self.config.max_idle_buffers
        {
            state.stats.discarded += 1;
            drop(state);
            debug!(capacity, "discarding buffer instead of pooling it");
            return;
        }

        state.idle.push(buffer);
        state.stats.idle_buffers = state.idle.len();
        state.stats.idle_bytes += capacity;
    }

    fn stats(&self) -> PoolStats {
        self.state.lock().stats
    }
}

/// A pool that allocates on every lease and retains nothing.
#[derive(Debug, Default)]
pub struct HeapPool {
    acquired: AtomicU64,
    released: AtomicU64,
    outstanding: AtomicUsize,
}

impl HeapPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BufferPool for HeapPool {
    fn acquire(&self, min_capacity: usize) -> Vec<u8> {
        self.acquired.fetch_add(1, Ordering::Relaxed);
        self.outstanding.fetch_add(1, Ordering::Relaxed);
        Vec::with_capacity(min_capacity)
    }

    fn release(&self, _buffer: Vec<u8>) {
        let previous = self.outstanding.fetch_sub(1, Ordering::Relaxed);
        debug_assert!(
            previous > 0,
            "buffer released to a pool it was not acquired from"
        );
        self.released.fetch_add(1, Ordering::Relaxed);
    }

    fn stats(&self) -> PoolStats {
        let acquired = self.acquired.load(Ordering::Relaxed);
        let released = self.released.load(Ordering::Relaxed);
        PoolStats {
            acquired,
            allocated: acquired,
            released,
            discarded: released,
            outstanding: self.outstanding.load(Ordering::Relaxed),
            ..PoolStats::default()
        }
    }
}

static GLOBAL_POOL: OnceLock<Arc<SharedPool>> = OnceLock::new();

/// The process-wide pool used by [`PooledBuffer::new`] and [`crate::to_vec`].
pub fn global() -> Arc<SharedPool> {
    GLOBAL_POOL
        .get_or_init(|| Arc::new(SharedPool::default()))
        .clone()
}

/// A growable byte buffer whose storage is leased from a [`BufferPool`].
///
/// The buffer owns its storage exclusively: mutation needs `&mut`, so one
/// buffer serves one encode at a time. [`clear`](Self::clear) empties it while
/// keeping the capacity. The storage goes back to the pool exactly once, on
/// [`release`](Self::release) or on drop; `release` consumes the buffer, so it
/// cannot be used or released again afterwards.
pub struct PooledBuffer {
    buf: Option<Vec<u8>>,
    pool: Arc<dyn BufferPool>,
}

impl PooledBuffer {
    /// Acquires a buffer from the process-wide pool.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
    }

    /// Acquires a buffer with at least `capacity` bytes from the process-wide pool.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_pool(global(), capacity)
    }

    /// Acquires a buffer from an injected pool.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use toon_codec::pool::{BufferPool, HeapPool, PooledBuffer};
    ///
    /// let pool = Arc::new(HeapPool::new());
    /// let buffer = PooledBuffer::from_pool(pool.clone(), 64);
    /// assert_eq!(pool.stats().outstanding, 1);
    /// drop(buffer);
    /// assert_eq!(pool.stats().outstanding, 0);
    /// ```
    pub fn from_pool(pool: Arc<dyn BufferPool>, min_capacity: usize) -> Self {
        let buf = pool.acquire(min_capacity);
        PooledBuffer {
            buf: Some(buf),
            pool,
        }
    }

    /// Resets the length to zero, keeping the capacity.
    pub fn clear(&mut self) {
        self.vec_mut().clear();
    }

    /// Number of bytes currently in the buffer.
    #[must_use]
    pub fn written_count(&self) -> usize {
        self.as_bytes().len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.written_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.written_count() == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.as_ref().map_or(0, Vec::capacity)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_deref().unwrap_or(&[])
    }

    /// Copies the contents into a vector sized exactly to the written length.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    /// Appends raw bytes.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.vec_mut().extend_from_slice(bytes);
    }

    /// Returns the storage to its pool.
    pub fn release(mut self) {
        self.return_to_pool();
    }

    pub(crate) fn vec_mut(&mut self) -> &mut Vec<u8> {
        self.buf.get_or_insert_with(Vec::new)
    }

    fn return_to_pool(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.release(buf);
        }
    }
}

impl Default for PooledBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        self.return_to_pool();
    }
}

impl fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

impl AsRef<[u8]> for PooledBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl io::Write for PooledBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
