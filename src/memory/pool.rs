//! Scratch buffer pools
//!
//! Design: Requests are bucketed by the next power of two at or above the
//! requested size. Each bucket keeps a LIFO free list capped at a configured
//! number of buffers; everything else falls through to a parent allocator.
//! Buckets above the configured ceiling bypass pooling entirely.
//!
//! Pools are single-threaded (`&mut self`). Share one across threads through
//! `SynchronizedPool`.

use super::NativeBuffer;
use crate::error::Result;
use parking_lot::Mutex;
use tracing::trace;

/// Pool usage counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Requests served from a free list
    pub hits: u64,
    /// Requests that had to allocate a bucket-sized buffer
    pub misses: u64,
    /// Requests above the pooling ceiling
    pub direct: u64,
    /// Buffers currently held in free lists
    pub cached: usize,
}

impl PoolStats {
    fn merge(self, other: PoolStats) -> PoolStats {
        PoolStats {
            hits: self.hits + other.hits,
            misses: self.misses + other.misses,
            direct: self.direct + other.direct,
            cached: self.cached + other.cached,
        }
    }
}

/// Source of scratch native memory
pub trait BufferPool {
    /// A buffer windowed to exactly `size` bytes, zeroed
    fn get(&mut self, size: usize) -> Result<NativeBuffer>;

    /// Return a buffer obtained from `get`
    fn put(&mut self, buffer: NativeBuffer);

    fn put_all(&mut self, buffers: Vec<NativeBuffer>) {
        for buffer in buffers {
            self.put(buffer);
        }
    }

    fn stats(&self) -> PoolStats {
        PoolStats::default()
    }
}

/// Bucket index for a request: `ceil(log2(size))`, 0 for sizes up to 1
#[inline]
pub const fn size_index(size: usize) -> usize {
    if size <= 1 {
        0
    } else {
        (usize::BITS - (size - 1).leading_zeros()) as usize
    }
}

/// Allocates a fresh buffer per request and frees on return
#[derive(Debug, Default)]
pub struct DirectAllocator {
    allocated: u64,
}

impl DirectAllocator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BufferPool for DirectAllocator {
    fn get(&mut self, size: usize) -> Result<NativeBuffer> {
        self.allocated += 1;
        NativeBuffer::new(size)
    }

    fn put(&mut self, buffer: NativeBuffer) {
        drop(buffer);
    }

    fn stats(&self) -> PoolStats {
        PoolStats {
            direct: self.allocated,
            ..PoolStats::default()
        }
    }
}

/// Free list for a single buffer size
#[derive(Debug)]
pub struct SimpleBufferPool<P: BufferPool = DirectAllocator> {
    buffer_size: usize,
    pool_size: usize,
    free: Vec<NativeBuffer>,
    parent: P,
    hits: u64,
    misses: u64,
}

impl SimpleBufferPool<DirectAllocator> {
    pub fn new(buffer_size: usize, pool_size: usize) -> Self {
        Self::with_parent(buffer_size, pool_size, DirectAllocator::new())
    }
}

impl<P: BufferPool> SimpleBufferPool<P> {
    pub fn with_parent(buffer_size: usize, pool_size: usize, parent: P) -> Self {
        Self {
            buffer_size,
            pool_size,
            free: Vec::with_capacity(pool_size),
            parent,
            hits: 0,
            misses: 0,
        }
    }

    #[inline]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Buffers waiting on the free list
    #[inline]
    pub fn cached(&self) -> usize {
        self.free.len()
    }
}

impl<P: BufferPool> BufferPool for SimpleBufferPool<P> {
    fn get(&mut self, size: usize) -> Result<NativeBuffer> {
        if size > self.buffer_size {
            return self.parent.get(size);
        }

        if let Some(mut buffer) = self.free.pop() {
            self.hits += 1;
            buffer.window(size);
            return Ok(buffer);
        }

        self.misses += 1;
        trace!(
            event = "pool_miss",
            bucket = self.buffer_size,
            size,
            "allocating pooled buffer"
        );
        let mut buffer = self.parent.get(self.buffer_size)?;
        buffer.window(size);
        Ok(buffer)
    }

    fn put(&mut self, buffer: NativeBuffer) {
        if buffer.capacity() == self.buffer_size && self.free.len() < self.pool_size {
            self.free.push(buffer);
        } else {
            self.parent.put(buffer);
        }
    }

    fn stats(&self) -> PoolStats {
        PoolStats {
            hits: self.hits,
            misses: self.misses,
            direct: 0,
            cached: self.free.len(),
        }
    }
}

/// Power-of-two bucketed pool
#[derive(Debug)]
pub struct MultiBufferPool {
    max_buffer_size: usize,
    buckets: Vec<SimpleBufferPool>,
    direct: DirectAllocator,
}

impl MultiBufferPool {
    /// Pool buckets up to `max_buffer_size`, keeping at most
    /// `max_items_per_size` buffers per bucket
    pub fn new(max_buffer_size: usize, max_items_per_size: usize) -> Self {
        let max_index = size_index(max_buffer_size);
        let buckets = (0..=max_index)
            .map(|index| SimpleBufferPool::new(1usize << index, max_items_per_size))
            .collect();

        Self {
            max_buffer_size,
            buckets,
            direct: DirectAllocator::new(),
        }
    }

    #[inline]
    pub fn max_buffer_size(&self) -> usize {
        self.max_buffer_size
    }

    fn bucket(&mut self, size: usize) -> Option<&mut SimpleBufferPool> {
        self.buckets.get_mut(size_index(size))
    }
}

impl Default for MultiBufferPool {
    fn default() -> Self {
        Self::new(8192, 16)
    }
}

impl BufferPool for MultiBufferPool {
    fn get(&mut self, size: usize) -> Result<NativeBuffer> {
        match self.bucket(size) {
            Some(bucket) => bucket.get(size),
            None => {
                trace!(event = "direct_allocation", size, "request above pool ceiling");
                self.direct.get(size)
            }
        }
    }

    fn put(&mut self, buffer: NativeBuffer) {
        let capacity = buffer.capacity();
        match self.bucket(capacity) {
            Some(bucket) => bucket.put(buffer),
            None => self.direct.put(buffer),
        }
    }

    fn stats(&self) -> PoolStats {
        self.buckets
            .iter()
            .map(|bucket| bucket.stats())
            .fold(self.direct.stats(), PoolStats::merge)
    }
}

/// Mutex-guarded pool for sharing across threads
#[derive(Debug, Default)]
pub struct SynchronizedPool<P> {
    inner: Mutex<P>,
}

impl<P: BufferPool> SynchronizedPool<P> {
    pub fn new(pool: P) -> Self {
        Self {
            inner: Mutex::new(pool),
        }
    }

    pub fn get(&self, size: usize) -> Result<NativeBuffer> {
        self.inner.lock().get(size)
    }

    pub fn put(&self, buffer: NativeBuffer) {
        self.inner.lock().put(buffer);
    }

    pub fn put_all(&self, buffers: Vec<NativeBuffer>) {
        self.inner.lock().put_all(buffers);
    }

    pub fn stats(&self) -> PoolStats {
        self.inner.lock().stats()
    }

    pub fn into_inner(self) -> P {
        self.inner.into_inner()
    }
}

impl<P: BufferPool> BufferPool for SynchronizedPool<P> {
    fn get(&mut self, size: usize) -> Result<NativeBuffer> {
        self.inner.get_mut().get(size)
    }

    fn put(&mut self, buffer: NativeBuffer) {
        self.inner.get_mut().put(buffer);
    }

    fn put_all(&mut self, buffers: Vec<NativeBuffer>) {
        self.inner.get_mut().put_all(buffers);
    }

    fn stats(&self) -> PoolStats {
        self.inner.lock().stats()
    }
}

/// Shared handle: `let mut handle = &*shared;` then use it as any pool
impl<P: BufferPool> BufferPool for &SynchronizedPool<P> {
    fn get(&mut self, size: usize) -> Result<NativeBuffer> {
        SynchronizedPool::get(self, size)
    }

    fn put(&mut self, buffer: NativeBuffer) {
        SynchronizedPool::put(self, buffer);
    }

    fn put_all(&mut self, buffers: Vec<NativeBuffer>) {
        SynchronizedPool::put_all(self, buffers);
    }

    fn stats(&self) -> PoolStats {
        SynchronizedPool::stats(self)
    }
}

impl<P: BufferPool + ?Sized> BufferPool for Box<P> {
    fn get(&mut self, size: usize) -> Result<NativeBuffer> {
        (**self).get(size)
    }

    fn put(&mut self, buffer: NativeBuffer) {
        (**self).put(buffer);
    }

    fn put_all(&mut self, buffers: Vec<NativeBuffer>) {
        (**self).put_all(buffers);
    }

    fn stats(&self) -> PoolStats {
        (**self).stats()
    }
}
