//! Raw extents obtained from an upstream resource.
//!
//! A [`MemoryBlock`] is the unit an [`ArenaResource`](crate::ArenaResource)
//! requests from, and eventually returns to, its upstream. The block remembers
//! the exact `(size, align)` it was obtained with so that it can be handed
//! back with the same triple.

#![allow(unsafe_code)]

use std::ptr::NonNull;

use crate::error::AllocError;
use crate::raw::{align_up, offset_ptr};
use crate::resource::MemoryResource;

/// A contiguous extent owned by an arena until released.
#[derive(Debug)]
pub(crate) struct MemoryBlock {
    ptr: NonNull<u8>,
    size: usize,
    align: usize,
}

impl MemoryBlock {
    /// Request a fresh block of `size` bytes aligned to `align`.
    pub(crate) fn obtain(
        upstream: &dyn MemoryResource,
        size: usize,
        align: usize,
    ) -> Result<Self, AllocError> {
        let ptr = upstream.allocate(size, align)?;
        Ok(Self { ptr, size, align })
    }

    /// Hand the block back to `upstream`.
    ///
    /// # Safety
    ///
    /// `upstream` must be the resource this block was obtained from, and no
    /// pointer into the block may be used afterwards.
    pub(crate) unsafe fn give_back(self, upstream: &dyn MemoryResource) {
        // SAFETY: same triple as `obtain`, per the caller's contract.
        unsafe { upstream.deallocate(self.ptr, self.size, self.align) }
    }

    /// Offset of the first `align`-aligned address at or after `cursor` at
    /// which `bytes` bytes still fit, or `None` if they do not.
    pub(crate) fn fit(&self, cursor: usize, bytes: usize, align: usize) -> Option<usize> {
        let base = self.ptr.as_ptr().addr();
        let aligned = align_up(base.checked_add(cursor)?, align)?;
        let offset = aligned - base;
        let end = offset.checked_add(bytes)?;
        (end <= self.size).then_some(offset)
    }

    /// Pointer `offset` bytes into the block.
    pub(crate) fn at(&self, offset: usize) -> NonNull<u8> {
        debug_assert!(offset <= self.size);
        offset_ptr(self.ptr, offset)
    }

    pub(crate) fn ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    pub(crate) fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn align(&self) -> usize {
        self.align
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::{null_resource, system_resource};

    #[test]
    fn obtain_and_give_back() {
        let block = MemoryBlock::obtain(system_resource(), 256, 16).unwrap();
        assert_eq!(block.size(), 256);
        assert_eq!(block.align(), 16);
        assert_eq!(block.ptr().as_ptr() as usize % 16, 0);
        unsafe { block.give_back(system_resource()) };
    }

    #[test]
    fn obtain_propagates_upstream_failure() {
        let err = MemoryBlock::obtain(null_resource(), 256, 16).unwrap_err();
        assert_eq!(err, AllocError::OutOfMemory { bytes: 256, align: 16 });
    }

    #[test]
    fn fit_respects_alignment_and_bounds() {
        let block = MemoryBlock::obtain(system_resource(), 128, 16).unwrap();
        assert_eq!(block.fit(0, 128, 16), Some(0));
        assert_eq!(block.fit(0, 129, 1), None);
        assert_eq!(block.fit(1, 8, 8), Some(8));
        assert_eq!(block.fit(9, 16, 16), Some(16));
        assert_eq!(block.fit(120, 8, 8), Some(120));
        assert_eq!(block.fit(121, 8, 8), None);
        assert_eq!(block.fit(128, 0, 1), Some(128));
        unsafe { block.give_back(system_resource()) };
    }

    #[test]
    fn at_points_into_block() {
        let block = MemoryBlock::obtain(system_resource(), 64, 16).unwrap();
        let p = block.at(40);
        assert_eq!(p.as_ptr() as usize - block.ptr().as_ptr() as usize, 40);
        unsafe { block.give_back(system_resource()) };
    }
}
