//! Low-level primitives shared by the resource implementations.
//!
//! Address arithmetic only. Nothing here dereferences a pointer.

use std::alloc::Layout;
use std::ptr::{self, NonNull};

use crate::error::AllocError;

/// Strictest fundamental alignment assumed for blocks and default requests.
pub const MAX_ALIGN: usize = 16;

/// Validate a `(bytes, align)` request and turn it into a [`Layout`].
pub fn checked_layout(bytes: usize, align: usize) -> Result<Layout, AllocError> {
    Layout::from_size_align(bytes, align).map_err(|_| AllocError::InvalidLayout { bytes, align })
}

/// Round `addr` up to the next multiple of `align` (a power of two).
///
/// Returns `None` on overflow.
#[inline]
pub fn align_up(addr: usize, align: usize) -> Option<usize> {
    debug_assert!(align.is_power_of_two());
    let mask = align - 1;
    addr.checked_add(mask).map(|a| a & !mask)
}

/// A non-null pointer carrying no provenance, aligned to `align`.
///
/// Handed out for zero-sized requests; never dereferenced and never
/// passed back to an allocator.
#[inline]
pub fn dangling(align: usize) -> NonNull<u8> {
    NonNull::new(ptr::without_provenance_mut::<u8>(align)).unwrap_or(NonNull::dangling())
}

/// Pointer `offset` bytes past `base`, keeping `base`'s provenance.
#[inline]
pub fn offset_ptr(base: NonNull<u8>, offset: usize) -> NonNull<u8> {
    NonNull::new(base.as_ptr().wrapping_add(offset)).unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_rounds_to_multiple() {
        assert_eq!(align_up(0, 8), Some(0));
        assert_eq!(align_up(1, 8), Some(8));
        assert_eq!(align_up(8, 8), Some(8));
        assert_eq!(align_up(17, 16), Some(32));
        assert_eq!(align_up(usize::MAX, 16), None);
    }

    #[test]
    fn dangling_is_aligned() {
        for align in [1, 2, 8, 64, 4096] {
            assert_eq!(dangling(align).as_ptr() as usize % align, 0);
        }
    }

    #[test]
    fn checked_layout_rejects_bad_alignment() {
        assert!(checked_layout(16, 8).is_ok());
        assert_eq!(
            checked_layout(16, 3),
            Err(AllocError::InvalidLayout { bytes: 16, align: 3 })
        );
        assert!(checked_layout(16, 0).is_err());
        assert!(checked_layout(usize::MAX, 8).is_err());
    }
}
