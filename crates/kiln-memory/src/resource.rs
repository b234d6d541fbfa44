//! The [`MemoryResource`] capability.

#![allow(unsafe_code)]

use std::ptr::{self, NonNull};

use crate::error::AllocError;

/// A source of raw, aligned memory.
///
/// This is the whole contract every allocator-aware type in kiln is written
/// against: allocate, deallocate, and compare for interchangeability.
/// Implementations take `&self` so that many [`TypedAllocator`]s and
/// containers can share one resource; resources that mutate internal state
/// (like [`ArenaResource`]) use interior mutability and are not `Sync`.
///
/// [`TypedAllocator`]: crate::TypedAllocator
/// [`ArenaResource`]: crate::ArenaResource
pub trait MemoryResource {
    /// Allocate `bytes` bytes aligned to `align`.
    ///
    /// `align` must be a power of two; otherwise the request is rejected with
    /// [`AllocError::InvalidLayout`]. A returned pointer is always aligned to
    /// `align`. Failure is reported, never papered over with an invalid
    /// pointer.
    fn allocate(&self, bytes: usize, align: usize) -> Result<NonNull<u8>, AllocError>;

    /// Return memory obtained from [`allocate`](Self::allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate` on this resource (or one
    /// that [`is_equal`](Self::is_equal) to it) with exactly the same `bytes`
    /// and `align`, and must not have been deallocated since.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, bytes: usize, align: usize);

    /// Whether memory allocated from `self` may be deallocated through
    /// `other` and vice versa.
    ///
    /// The default is identity: only the same instance compares equal.
    fn is_equal(&self, other: &dyn MemoryResource) -> bool {
        ptr::addr_eq(self as *const Self, other as *const dyn MemoryResource)
    }
}

impl PartialEq for dyn MemoryResource + '_ {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}
