//! Typed view over a [`MemoryResource`].

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};

use crate::default::default_resource;
use crate::error::AllocError;
use crate::resource::MemoryResource;

/// A copyable, non-owning allocator for values of type `T`, bound to a
/// [`MemoryResource`].
///
/// The `'r` lifetime ties the allocator to its resource: the resource
/// outlives every allocator (and every container) built on it. All
/// operations delegate to the resource and propagate its failures without
/// retrying.
///
/// Zero-sized requests (`n == 0` or a zero-sized `T`) never reach the
/// resource: they yield a dangling, well-aligned pointer, and deallocating
/// such a pointer is a no-op.
pub struct TypedAllocator<'r, T> {
    resource: &'r dyn MemoryResource,
    _marker: PhantomData<fn() -> T>,
}

impl<'r, T> TypedAllocator<'r, T> {
    /// Bind an allocator to `resource`.
    pub fn new(resource: &'r dyn MemoryResource) -> Self {
        Self {
            resource,
            _marker: PhantomData,
        }
    }

    /// The same resource, viewed as an allocator for `U`.
    pub fn rebind<U>(self) -> TypedAllocator<'r, U> {
        TypedAllocator::new(self.resource)
    }

    /// The underlying resource.
    pub fn resource(&self) -> &'r dyn MemoryResource {
        self.resource
    }

    /// Allocate uninitialised storage for `n` values of `T`.
    pub fn allocate(&self, n: usize) -> Result<NonNull<T>, AllocError> {
        self.allocate_object::<T>(n)
    }

    /// Return storage obtained from [`allocate`](Self::allocate).
    ///
    /// # Safety
    ///
    /// `p` must come from `allocate(n)` on an allocator whose resource is
    /// equal to this one, with the same `n`. Any values stored there must
    /// already have been dropped or moved out.
    pub unsafe fn deallocate(&self, p: NonNull<T>, n: usize) {
        // SAFETY: forwarded caller contract.
        unsafe { self.deallocate_object::<T>(p, n) }
    }

    /// Allocate `bytes` raw bytes aligned to `align`.
    pub fn allocate_bytes(&self, bytes: usize, align: usize) -> Result<NonNull<u8>, AllocError> {
        self.resource.allocate(bytes, align)
    }

    /// Return raw bytes obtained from [`allocate_bytes`](Self::allocate_bytes).
    ///
    /// # Safety
    ///
    /// Same contract as [`MemoryResource::deallocate`].
    pub unsafe fn deallocate_bytes(&self, p: NonNull<u8>, bytes: usize, align: usize) {
        // SAFETY: forwarded caller contract.
        unsafe { self.resource.deallocate(p, bytes, align) }
    }

    /// Allocate uninitialised storage for `n` values of any type `U`.
    pub fn allocate_object<U>(&self, n: usize) -> Result<NonNull<U>, AllocError> {
        let layout = Layout::array::<U>(n).map_err(|_| AllocError::InvalidLayout {
            bytes: mem::size_of::<U>().saturating_mul(n),
            align: mem::align_of::<U>(),
        })?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }
        self.resource
            .allocate(layout.size(), layout.align())
            .map(NonNull::cast)
    }

    /// Return storage obtained from [`allocate_object`](Self::allocate_object).
    ///
    /// # Safety
    ///
    /// `p` must come from `allocate_object::<U>(n)` on an allocator whose
    /// resource is equal to this one, with the same `n`.
    pub unsafe fn deallocate_object<U>(&self, p: NonNull<U>, n: usize) {
        let bytes = mem::size_of::<U>() * n;
        if bytes == 0 {
            return;
        }
        // SAFETY: same (bytes, align) the matching allocation used.
        unsafe {
            self.resource
                .deallocate(p.cast(), bytes, mem::align_of::<U>())
        }
    }

    /// Move `value` into the uninitialised slot at `p`.
    ///
    /// # Safety
    ///
    /// `p` must be valid for writes and aligned for `U`. Whatever `p` held
    /// before is overwritten without being dropped.
    pub unsafe fn construct<U>(&self, p: NonNull<U>, value: U) {
        // SAFETY: forwarded caller contract.
        unsafe { p.as_ptr().write(value) }
    }

    /// Drop the value at `p` in place, leaving the slot uninitialised.
    ///
    /// # Safety
    ///
    /// `p` must point to a live, initialised `U` that is not used again.
    pub unsafe fn destroy<U>(&self, p: NonNull<U>) {
        // SAFETY: forwarded caller contract.
        unsafe { ptr::drop_in_place(p.as_ptr()) }
    }

    /// Allocate storage for one `U` and move `value` into it.
    ///
    /// On allocation failure `value` is dropped and the error returned.
    pub fn new_object<U>(&self, value: U) -> Result<NonNull<U>, AllocError> {
        let p = self.allocate_object::<U>(1)?;
        // SAFETY: `p` is freshly allocated storage for exactly one `U`.
        unsafe { self.construct(p, value) };
        Ok(p)
    }

    /// Drop the value at `p` and return its storage.
    ///
    /// # Safety
    ///
    /// `p` must come from [`new_object`](Self::new_object) on an allocator
    /// whose resource is equal to this one, and must not be used afterwards.
    pub unsafe fn delete_object<U>(&self, p: NonNull<U>) {
        // SAFETY: forwarded caller contract.
        unsafe {
            self.destroy(p);
            self.deallocate_object(p, 1);
        }
    }
}

impl<T> Default for TypedAllocator<'static, T> {
    /// An allocator over the current thread's default resource.
    fn default() -> Self {
        Self::new(default_resource())
    }
}

impl<T> Clone for TypedAllocator<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedAllocator<'_, T> {}

impl<T, U> PartialEq<TypedAllocator<'_, U>> for TypedAllocator<'_, T> {
    fn eq(&self, other: &TypedAllocator<'_, U>) -> bool {
        self.resource.is_equal(other.resource)
    }
}

impl<T> Eq for TypedAllocator<'_, T> {}

impl<T> fmt::Debug for TypedAllocator<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedAllocator")
            .field("element", &std::any::type_name::<T>())
            .field("resource", &(self.resource as *const dyn MemoryResource).cast::<()>())
            .finish()
    }
}
