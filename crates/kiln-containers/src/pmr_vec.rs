//! A heap-only vector over a [`TypedAllocator`].

#![allow(unsafe_code)]

use std::fmt;
use std::iter::FusedIterator;
use std::mem;
use std::ops::{Deref, DerefMut, RangeBounds};
use std::ptr::{self, NonNull};
use std::slice;

use kiln_memory::{AllocError, TypedAllocator};
use tracing::trace;

use crate::raw;

/// Capacity of the first heap buffer.
const FIRST_CAPACITY: usize = 4;

/// A growable sequence of `T` whose buffer always comes from its
/// allocator.
///
/// Starts without a buffer, allocates room for four elements on the first
/// push and doubles whenever it is full.
pub struct PmrVec<'r, T> {
    ptr: NonNull<T>,
    capacity: usize,
    len: usize,
    alloc: TypedAllocator<'r, T>,
}

impl<T> PmrVec<'static, T> {
    /// An empty vector over the current thread's default resource.
    pub fn new() -> Self {
        Self::new_in(TypedAllocator::default())
    }
}

impl<T> Default for PmrVec<'static, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r, T> PmrVec<'r, T> {
    /// An empty vector; nothing is allocated until the first push.
    pub fn new_in(alloc: TypedAllocator<'r, T>) -> Self {
        Self {
            ptr: NonNull::dangling(),
            capacity: 0,
            len: 0,
            alloc,
        }
    }

    /// An empty vector with room for exactly `n` elements.
    pub fn with_capacity_in(n: usize, alloc: TypedAllocator<'r, T>) -> Self {
        let mut v = Self::new_in(alloc);
        v.reserve(n);
        v
    }

    /// `n` copies of `value`.
    pub fn from_elem_in(n: usize, value: T, alloc: TypedAllocator<'r, T>) -> Self
    where
        T: Clone,
    {
        let mut v = Self::with_capacity_in(n, alloc);
        v.resize_with_value(n, value);
        v
    }

    /// The elements of `iter`, in order.
    pub fn from_iter_in<I: IntoIterator<Item = T>>(iter: I, alloc: TypedAllocator<'r, T>) -> Self {
        let mut v = Self::new_in(alloc);
        v.extend(iter);
        v
    }

    /// A copy of `self` whose buffer comes from `alloc`.
    pub fn clone_in<'s>(&self, alloc: TypedAllocator<'s, T>) -> PmrVec<'s, T>
    where
        T: Clone,
    {
        let mut out = PmrVec::with_capacity_in(self.len, alloc);
        out.extend(self.iter().cloned());
        out
    }

    /// Move `self` into a vector bound to `alloc`, handing the buffer over
    /// when the resources are equal and relocating the elements otherwise.
    pub fn moved_into<'s>(mut self, alloc: TypedAllocator<'s, T>) -> PmrVec<'s, T> {
        let mut out = PmrVec::new_in(alloc);
        out.take_from(&mut self);
        out
    }

    /// The allocator this vector draws its buffer from.
    pub fn allocator(&self) -> TypedAllocator<'r, T> {
        self.alloc
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether there are no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements the current buffer holds.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pointer to the buffer; dangling while nothing is allocated.
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// The elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: the first `len` slots are initialised.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// The elements as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: the first `len` slots are initialised.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Make the capacity at least `n` in total, allocating exactly `n` if
    /// it is not.
    ///
    /// # Errors
    ///
    /// The allocator's error, with the vector unchanged.
    pub fn try_reserve(&mut self, n: usize) -> Result<(), AllocError> {
        if n <= self.capacity {
            return Ok(());
        }
        self.grow_to(n)
    }

    /// Infallible [`try_reserve`](Self::try_reserve).
    pub fn reserve(&mut self, n: usize) {
        raw::infallible(self.try_reserve(n));
    }

    /// Append `value`.
    ///
    /// # Errors
    ///
    /// The allocator's error; `value` is dropped.
    pub fn try_push(&mut self, value: T) -> Result<(), AllocError> {
        self.reserve_amortized(1)?;
        // SAFETY: a free slot exists at `len`.
        unsafe { self.ptr.as_ptr().add(self.len).write(value) };
        self.len += 1;
        Ok(())
    }

    /// Infallible [`try_push`](Self::try_push).
    pub fn push(&mut self, value: T) {
        raw::infallible(self.try_push(value));
    }

    /// Remove and return the last element.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: slot `len` was initialised and is no longer covered.
        Some(unsafe { self.ptr.as_ptr().add(self.len).read() })
    }

    /// Insert `value` at `index`, shifting later elements up.
    ///
    /// # Panics
    ///
    /// If `index > len`.
    #[track_caller]
    pub fn insert(&mut self, index: usize, value: T) {
        let len = self.len;
        assert!(index <= len, "insertion index (is {index}) should be <= len (is {len})");
        raw::infallible(self.reserve_amortized(1));
        // SAFETY: room for one more, `index <= len`.
        unsafe { raw::insert(self.ptr.as_ptr(), &mut self.len, index, value) }
    }

    /// Insert `value` at `index` and return a reference to it.
    #[track_caller]
    pub fn emplace(&mut self, index: usize, value: T) -> &mut T {
        self.insert(index, value);
        &mut self.as_mut_slice()[index]
    }

    /// Insert every item of `iter` at `index`, in order.
    ///
    /// # Panics
    ///
    /// If `index > len`.
    #[track_caller]
    pub fn insert_iter<I: IntoIterator<Item = T>>(&mut self, index: usize, iter: I) {
        let len = self.len;
        assert!(index <= len, "insertion index (is {index}) should be <= len (is {len})");
        self.extend(iter);
        self.as_mut_slice()[index..].rotate_left(len - index);
    }

    /// Remove and return the element at `index`.
    ///
    /// # Panics
    ///
    /// If `index >= len`.
    #[track_caller]
    pub fn erase(&mut self, index: usize) -> T {
        let len = self.len;
        assert!(index < len, "removal index (is {index}) should be < len (is {len})");
        // SAFETY: `index` is in bounds.
        unsafe { raw::remove(self.ptr.as_ptr(), &mut self.len, index) }
    }

    /// Drop the elements in `range` and close the gap.
    #[track_caller]
    pub fn erase_range<R: RangeBounds<usize>>(&mut self, range: R) {
        let (start, end) = raw::bounds(range, self.len);
        // SAFETY: `start <= end <= len`.
        unsafe { raw::remove_range(self.ptr.as_ptr(), &mut self.len, start, end) }
    }

    /// Keep the first `n` elements.
    pub fn truncate(&mut self, n: usize) {
        // SAFETY: first `len` slots initialised.
        unsafe { raw::truncate(self.ptr.as_ptr(), &mut self.len, n) }
    }

    /// Drop every element, keeping the buffer.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Grow with default values or shrink to `n` elements.
    pub fn resize(&mut self, n: usize)
    where
        T: Default,
    {
        if n <= self.len {
            self.truncate(n);
            return;
        }
        self.reserve(n);
        let extra = n - self.len;
        // SAFETY: capacity is at least `n`.
        unsafe { raw::fill_with(self.ptr.as_ptr(), &mut self.len, extra, T::default) }
    }

    /// Grow with copies of `value` or shrink to `n` elements.
    pub fn resize_with_value(&mut self, n: usize, value: T)
    where
        T: Clone,
    {
        if n <= self.len {
            self.truncate(n);
            return;
        }
        self.reserve(n);
        let extra = n - self.len;
        // SAFETY: capacity is at least `n`.
        unsafe { raw::fill(self.ptr.as_ptr(), &mut self.len, extra, value) }
    }

    /// Replace the contents with `count` copies of `value`.
    pub fn assign(&mut self, count: usize, value: T)
    where
        T: Clone,
    {
        self.clear();
        self.resize_with_value(count, value);
    }

    /// Replace the contents with those of `other`, leaving it empty.
    ///
    /// Keeps this vector's allocator. With equal resources the buffer
    /// changes hands; otherwise the elements are relocated into ours.
    pub fn take_from<'o>(&mut self, other: &mut PmrVec<'o, T>) {
        self.clear();
        if other.capacity > 0 && self.alloc == other.alloc {
            self.release();
            self.ptr = mem::replace(&mut other.ptr, NonNull::dangling());
            self.capacity = mem::take(&mut other.capacity);
            self.len = mem::take(&mut other.len);
            trace!(capacity = self.capacity, len = self.len, "heap buffer transferred");
            return;
        }
        self.reserve(other.len);
        let n = mem::take(&mut other.len);
        // SAFETY: `other` no longer owns its first `n` elements; we have room.
        unsafe { ptr::copy_nonoverlapping(other.ptr.as_ptr(), self.ptr.as_ptr(), n) };
        self.len = n;
    }

    /// Exchange contents and allocators with `other`.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    fn reserve_amortized(&mut self, additional: usize) -> Result<(), AllocError> {
        let needed = raw::add::<T>(self.len, additional)?;
        if needed <= self.capacity {
            return Ok(());
        }
        let cap = raw::grown::<T>(self.capacity, needed, FIRST_CAPACITY)?;
        self.grow_to(cap)
    }

    fn grow_to(&mut self, new_cap: usize) -> Result<(), AllocError> {
        // SAFETY: the first `len` slots are initialised and treated as moved
        // once the new buffer replaces the old one.
        let ptr = unsafe { raw::relocate(self.alloc, self.ptr.as_ptr(), self.len, new_cap)? };
        trace!(from = self.capacity, to = new_cap, "pmr vec grew");
        self.release();
        self.ptr = ptr;
        self.capacity = new_cap;
        Ok(())
    }

    /// Return the buffer. Its elements must already be gone.
    fn release(&mut self) {
        if self.capacity > 0 {
            // SAFETY: `ptr` came from `alloc.allocate(capacity)`.
            unsafe { self.alloc.deallocate(self.ptr, self.capacity) };
            self.ptr = NonNull::dangling();
            self.capacity = 0;
        }
    }
}

impl<T> Drop for PmrVec<'_, T> {
    fn drop(&mut self) {
        self.clear();
        self.release();
    }
}

impl<T> Deref for PmrVec<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for PmrVec<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T> Extend<T> for PmrVec<'_, T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        raw::infallible(self.reserve_amortized(iter.size_hint().0));
        for item in iter {
            self.push(item);
        }
    }
}

impl<T: Clone> Clone for PmrVec<'_, T> {
    fn clone(&self) -> Self {
        self.clone_in(self.alloc)
    }
}

impl<T: fmt::Debug> fmt::Debug for PmrVec<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq<U>, U> PartialEq<PmrVec<'_, U>> for PmrVec<'_, T> {
    fn eq(&self, other: &PmrVec<'_, U>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: PartialEq<U>, U, const K: usize> PartialEq<[U; K]> for PmrVec<'_, T> {
    fn eq(&self, other: &[U; K]) -> bool {
        self.as_slice() == other
    }
}

impl<T: Eq> Eq for PmrVec<'_, T> {}

impl<'a, T> IntoIterator for &'a PmrVec<'_, T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut PmrVec<'_, T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<'r, T> IntoIterator for PmrVec<'r, T> {
    type Item = T;
    type IntoIter = IntoIter<'r, T>;

    fn into_iter(mut self) -> Self::IntoIter {
        let end = mem::take(&mut self.len);
        IntoIter {
            vec: self,
            start: 0,
            end,
        }
    }
}

/// Owning iterator over a [`PmrVec`]. The buffer goes back to the
/// allocator when the iterator is dropped.
pub struct IntoIter<'r, T> {
    // `vec.len` is zero; the live elements are `start..end`.
    vec: PmrVec<'r, T>,
    start: usize,
    end: usize,
}

impl<T> IntoIter<'_, T> {
    /// The elements not yet yielded.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `start..end` are initialised and not yet moved out.
        unsafe { slice::from_raw_parts(self.vec.as_ptr().add(self.start), self.end - self.start) }
    }
}

impl<T> Iterator for IntoIter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        // SAFETY: slot `start` is initialised and read exactly once.
        let item = unsafe { self.vec.as_ptr().add(self.start).read() };
        self.start += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end - self.start;
        (n, Some(n))
    }
}

impl<T> DoubleEndedIterator for IntoIter<'_, T> {
    fn next_back(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        self.end -= 1;
        // SAFETY: slot `end` is initialised and read exactly once.
        Some(unsafe { self.vec.as_ptr().add(self.end).read() })
    }
}

impl<T> ExactSizeIterator for IntoIter<'_, T> {}

impl<T> FusedIterator for IntoIter<'_, T> {}

impl<T> Drop for IntoIter<'_, T> {
    fn drop(&mut self) {
        let remaining = ptr::slice_from_raw_parts_mut(
            self.vec.ptr.as_ptr().wrapping_add(self.start),
            self.end - self.start,
        );
        // SAFETY: `start..end` are initialised and owned by the iterator;
        // the vector drops nothing further since its length is zero.
        unsafe { ptr::drop_in_place(remaining) }
    }
}

impl<T: fmt::Debug> fmt::Debug for IntoIter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}
