//! SIMD-aligned buffers for transform execution.
//!
//! Every buffer a plan is bound to comes from here. Buffers are
//! zero-initialised, aligned to a cache line, and carry a process-unique
//! [`BufferId`] so a plan can tell its own buffer apart from any other
//! same-shaped slice without comparing raw addresses.

use crate::error::{FctError, Result};
use crate::scalar::FctScalar;
use std::alloc::{Layout, alloc_zeroed, dealloc};
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};

/// Alignment of every [`AlignedBuffer`] allocation, in bytes.
pub const SIMD_ALIGN: usize = 64;

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of an [`AlignedBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(u64);

impl BufferId {
    fn next() -> Self {
        BufferId(NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Owning, zero-initialised, 64-byte aligned buffer.
pub struct AlignedBuffer<T: FctScalar> {
    ptr: NonNull<T>,
    len: usize,
    id: BufferId,
}

// Safety: AlignedBuffer owns its allocation exclusively
unsafe impl<T: FctScalar> Send for AlignedBuffer<T> {}
unsafe impl<T: FctScalar> Sync for AlignedBuffer<T> {}

impl<T: FctScalar> AlignedBuffer<T> {
    /// Allocates `len` zeroed elements.
    ///
    /// Fails with [`FctError::Allocation`] when the size overflows or the
    /// allocator returns null. No retry is attempted.
    pub fn zeroed(len: usize) -> Result<Self> {
        let id = BufferId::next();
        if len == 0 {
            return Ok(Self {
                ptr: NonNull::dangling(),
                len: 0,
                id,
            });
        }

        let layout = Self::layout(len)?;
        // SAFETY: layout is valid and non-zero sized; all-zero bits are 0.0
        // for both f32 and f64
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(raw as *mut T).ok_or(FctError::Allocation {
            elements: len,
            bytes: layout.size(),
        })?;

        Ok(Self { ptr, len, id })
    }

    /// Allocates a buffer holding a copy of `values`.
    pub fn from_slice(values: &[T]) -> Result<Self> {
        let mut buffer = Self::zeroed(values.len())?;
        buffer.copy_from_slice(values);
        Ok(buffer)
    }

    fn layout(len: usize) -> Result<Layout> {
        let overflow = FctError::Allocation {
            elements: len,
            bytes: usize::MAX,
        };
        let bytes = len.checked_mul(size_of::<T>()).ok_or(overflow)?;
        Layout::from_size_align(bytes, SIMD_ALIGN.max(align_of::<T>())).map_err(|_| {
            FctError::Allocation {
                elements: len,
                bytes,
            }
        })
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[T] {
        // SAFETY: ptr is valid for len elements (dangling but aligned when len == 0)
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as above, and &mut self guarantees exclusive access
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: FctScalar> Drop for AlignedBuffer<T> {
    fn drop(&mut self) {
        if self.len == 0 {
            return;
        }
        // The layout was valid at allocation time, so it is valid now
        if let Ok(layout) = Self::layout(self.len) {
            // SAFETY: ptr came from alloc_zeroed with this exact layout
            unsafe { dealloc(self.ptr.as_ptr() as *mut u8, layout) };
        }
    }
}

impl<T: FctScalar> Deref for AlignedBuffer<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: FctScalar> DerefMut for AlignedBuffer<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: FctScalar> std::fmt::Debug for AlignedBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("id", &self.id)
            .field("len", &self.len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_is_aligned_and_zeroed() {
        let buffer = AlignedBuffer::<f64>::zeroed(1000).unwrap();
        assert_eq!(buffer.len(), 1000);
        assert_eq!(buffer.as_ptr() as usize % SIMD_ALIGN, 0);
        assert!(buffer.iter().all(|&x| x == 0.0));

        let single = AlignedBuffer::<f32>::zeroed(3).unwrap();
        assert_eq!(single.as_ptr() as usize % SIMD_ALIGN, 0);
    }

    #[test]
    fn every_buffer_gets_a_fresh_identity() {
        let a = AlignedBuffer::<f64>::zeroed(8).unwrap();
        let b = AlignedBuffer::<f64>::zeroed(8).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), a.id());
    }

    #[test]
    fn empty_buffer_never_allocates() {
        let buffer = AlignedBuffer::<f32>::zeroed(0).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.as_slice(), &[] as &[f32]);
    }

    #[test]
    fn from_slice_copies_values() {
        let mut buffer = AlignedBuffer::from_slice(&[1.0f64, 2.0, 3.0]).unwrap();
        assert_eq!(buffer.as_slice(), &[1.0, 2.0, 3.0]);
        buffer[1] = 5.0;
        assert_eq!(buffer.as_slice(), &[1.0, 5.0, 3.0]);
    }

    #[test]
    fn oversized_request_reports_allocation_error() {
        let result = AlignedBuffer::<f64>::zeroed(usize::MAX / 4);
        assert!(matches!(result, Err(FctError::Allocation { .. })));
    }
}
