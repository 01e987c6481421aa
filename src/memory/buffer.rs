//! Owned native buffers
//!
//! Design: A buffer owns one allocation from the global allocator with a
//! fixed capacity and a movable visible window starting at byte 0. Pools
//! recycle the allocation and re-window it per request.

use super::NativeMemory;
use crate::error::{MarshalError, Result};
use crate::logging::{log_allocation, log_deallocation};
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::fmt;
use std::ptr::NonNull;

/// Alignment of every buffer, enough for any native scalar
pub const BUFFER_ALIGN: usize = 16;

/// Native scratch buffer
pub struct NativeBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
    capacity: usize,
    limit: usize,
}

// SAFETY: the allocation is uniquely owned and only reachable through
// `&self`/`&mut self`
unsafe impl Send for NativeBuffer {}
unsafe impl Sync for NativeBuffer {}

impl NativeBuffer {
    /// Allocate a zeroed buffer of `capacity` bytes, windowed to the whole capacity
    pub fn new(capacity: usize) -> Result<Self> {
        // Zero-sized requests still get a unique, valid address
        let layout = Layout::from_size_align(capacity.max(1), BUFFER_ALIGN)
            .map_err(|_| MarshalError::Alloc { size: capacity })?;

        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or(MarshalError::Alloc { size: capacity })?;
        log_allocation(capacity, raw);

        Ok(Self {
            ptr,
            layout,
            capacity,
            limit: capacity,
        })
    }

    /// Allocate `capacity` bytes and window the result to `len`
    pub fn with_window(capacity: usize, len: usize) -> Result<Self> {
        let mut buffer = Self::new(capacity)?;
        buffer.window(len);
        Ok(buffer)
    }

    /// Total bytes owned
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Visible bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.limit
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.limit == 0
    }

    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Resize the visible window to `len` bytes and zero it
    ///
    /// `len` is clamped to the capacity.
    pub fn window(&mut self, len: usize) {
        self.limit = len.min(self.capacity);
        self.as_bytes_mut().fill(0);
    }
}

impl NativeMemory for NativeBuffer {
    #[inline]
    fn as_bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.limit) }
    }

    #[inline]
    fn as_bytes_mut(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.limit) }
    }

    #[inline]
    fn address(&self) -> usize {
        self.ptr.as_ptr() as usize
    }
}

impl fmt::Debug for NativeBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeBuffer")
            .field("address", &format_args!("{:#x}", self.address()))
            .field("capacity", &self.capacity)
            .field("len", &self.limit)
            .finish()
    }
}

impl Drop for NativeBuffer {
    fn drop(&mut self) {
        log_deallocation(self.ptr.as_ptr());
        unsafe {
            dealloc(self.ptr.as_ptr(), self.layout);
        }
    }
}
