//! Process-wide leaf resources: the platform allocator and the null resource.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::error::AllocError;
use crate::raw::{checked_layout, dangling};
use crate::resource::MemoryResource;

/// [`MemoryResource`] backed by the global Rust allocator.
///
/// There is exactly one instance, reached through [`system_resource`].
/// Zero-byte requests are answered with a dangling aligned pointer and never
/// reach the platform allocator.
#[derive(Debug)]
pub struct SystemResource {
    _singleton: u8,
}

static SYSTEM: SystemResource = SystemResource { _singleton: 0 };

/// The process-wide [`SystemResource`].
pub fn system_resource() -> &'static SystemResource {
    &SYSTEM
}

impl MemoryResource for SystemResource {
    fn allocate(&self, bytes: usize, align: usize) -> Result<NonNull<u8>, AllocError> {
        let layout = checked_layout(bytes, align)?;
        if layout.size() == 0 {
            return Ok(dangling(layout.align()));
        }
        // SAFETY: layout has non-zero size.
        let ptr = unsafe { alloc::alloc(layout) };
        NonNull::new(ptr).ok_or(AllocError::OutOfMemory { bytes, align })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, bytes: usize, align: usize) {
        if bytes == 0 {
            return;
        }
        // SAFETY: the caller passes the (bytes, align) pair that `allocate`
        // accepted, so it is a valid layout and `ptr` came from `alloc` with it.
        unsafe {
            let layout = Layout::from_size_align_unchecked(bytes, align);
            alloc::dealloc(ptr.as_ptr(), layout);
        }
    }
}

/// [`MemoryResource`] that refuses every request.
///
/// Useful as the upstream of an arena that must never grow, and for
/// exercising allocation-failure paths.
#[derive(Debug)]
pub struct NullResource {
    _singleton: u8,
}

static NULL: NullResource = NullResource { _singleton: 0 };

/// The process-wide [`NullResource`].
pub fn null_resource() -> &'static NullResource {
    &NULL
}

impl MemoryResource for NullResource {
    fn allocate(&self, bytes: usize, align: usize) -> Result<NonNull<u8>, AllocError> {
        checked_layout(bytes, align)?;
        Err(AllocError::OutOfMemory { bytes, align })
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _bytes: usize, _align: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_allocations_are_aligned_and_writable() {
        let sys = system_resource();
        for align in [1, 8, 16, 64, 4096] {
            let p = sys.allocate(100, align).unwrap();
            assert_eq!(p.as_ptr() as usize % align, 0);
            unsafe {
                p.as_ptr().write_bytes(0xAB, 100);
                assert_eq!(*p.as_ptr().add(99), 0xAB);
                sys.deallocate(p, 100, align);
            }
        }
    }

    #[test]
    fn zero_byte_request_does_not_touch_allocator() {
        let sys = system_resource();
        let p = sys.allocate(0, 32).unwrap();
        assert_eq!(p.as_ptr() as usize % 32, 0);
        unsafe { sys.deallocate(p, 0, 32) };
    }

    #[test]
    fn bad_alignment_is_rejected() {
        assert_eq!(
            system_resource().allocate(8, 12),
            Err(AllocError::InvalidLayout { bytes: 8, align: 12 })
        );
    }

    #[test]
    fn null_resource_refuses() {
        assert_eq!(
            null_resource().allocate(8, 8),
            Err(AllocError::OutOfMemory { bytes: 8, align: 8 })
        );
        assert!(matches!(
            null_resource().allocate(8, 5),
            Err(AllocError::InvalidLayout { .. })
        ));
    }
}
