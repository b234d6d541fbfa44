//! A vector that stores its first `N` elements inline.

#![allow(unsafe_code)]

use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FusedIterator;
use std::mem::{self, MaybeUninit};
use std::ops::{Deref, DerefMut, RangeBounds};
use std::ptr::{self, NonNull};
use std::slice;

use kiln_memory::{AllocError, TypedAllocator};
use tracing::trace;

use crate::raw;

enum Storage<T, const N: usize> {
    Inline([MaybeUninit<T>; N]),
    Heap { ptr: NonNull<T>, capacity: usize },
}

impl<T, const N: usize> Storage<T, N> {
    fn inline() -> Self {
        Self::Inline([const { MaybeUninit::uninit() }; N])
    }
}

/// A growable sequence of `T` with room for `N` elements inside the value.
///
/// Up to `N` elements never touch the allocator. The first push past `N`
/// moves everything into a heap buffer of twice the capacity drawn from
/// the vector's [`TypedAllocator`]; from then on the vector stays on the
/// heap and capacity only grows (doubling, minimum 1).
///
/// Indexing past [`len`](Self::len) panics, as with slices.
pub struct InlinedVec<'r, T, const N: usize> {
    len: usize,
    storage: Storage<T, N>,
    alloc: TypedAllocator<'r, T>,
}

impl<T, const N: usize> InlinedVec<'static, T, N> {
    /// An empty vector over the current thread's default resource.
    pub fn new() -> Self {
        Self::new_in(TypedAllocator::default())
    }
}

impl<T, const N: usize> Default for InlinedVec<'static, T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r, T, const N: usize> InlinedVec<'r, T, N> {
    /// An empty vector allocating through `alloc`.
    pub fn new_in(alloc: TypedAllocator<'r, T>) -> Self {
        Self {
            len: 0,
            storage: Storage::inline(),
            alloc,
        }
    }

    /// `n` copies of `value`.
    pub fn from_elem_in(n: usize, value: T, alloc: TypedAllocator<'r, T>) -> Self
    where
        T: Clone,
    {
        let mut v = Self::new_in(alloc);
        v.resize_with_value(n, value);
        v
    }

    /// `n` default values.
    pub fn with_len_in(n: usize, alloc: TypedAllocator<'r, T>) -> Self
    where
        T: Default,
    {
        let mut v = Self::new_in(alloc);
        v.resize(n);
        v
    }

    /// The elements of `iter`, in order.
    pub fn from_iter_in<I: IntoIterator<Item = T>>(iter: I, alloc: TypedAllocator<'r, T>) -> Self {
        let mut v = Self::new_in(alloc);
        v.extend(iter);
        v
    }

    /// A copy of `self` whose storage comes from `alloc`.
    pub fn clone_in<'s>(&self, alloc: TypedAllocator<'s, T>) -> InlinedVec<'s, T, N>
    where
        T: Clone,
    {
        let mut out = InlinedVec::new_in(alloc);
        out.assign_from(self);
        out
    }

    /// Move `self` into a vector bound to `alloc`.
    ///
    /// When `alloc`'s resource equals this vector's, a heap buffer changes
    /// hands as-is. Otherwise (or while the elements are inline) each
    /// element is relocated into storage belonging to `alloc`.
    pub fn moved_into<'s>(mut self, alloc: TypedAllocator<'s, T>) -> InlinedVec<'s, T, N> {
        let mut out = InlinedVec::new_in(alloc);
        out.take_from(&mut self);
        out
    }

    /// The allocator this vector draws heap storage from.
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

    /// Number of elements that fit without reallocating.
    pub fn capacity(&self) -> usize {
        match self.storage {
            Storage::Inline(_) => N,
            Storage::Heap { capacity, .. } => capacity,
        }
    }

    /// Whether the elements still live inside the vector value.
    pub fn is_inline(&self) -> bool {
        matches!(self.storage, Storage::Inline(_))
    }

    /// Pointer to the first element slot.
    pub fn as_ptr(&self) -> *const T {
        match &self.storage {
            Storage::Inline(buf) => buf.as_ptr().cast(),
            Storage::Heap { ptr, .. } => ptr.as_ptr(),
        }
    }

    /// Mutable pointer to the first element slot.
    pub fn as_mut_ptr(&mut self) -> *mut T {
        match &mut self.storage {
            Storage::Inline(buf) => buf.as_mut_ptr().cast(),
            Storage::Heap { ptr, .. } => ptr.as_ptr(),
        }
    }

    /// The elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: the first `len` slots are initialised.
        unsafe { slice::from_raw_parts(self.as_ptr(), self.len) }
    }

    /// The elements as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        let len = self.len;
        // SAFETY: the first `len` slots are initialised.
        unsafe { slice::from_raw_parts_mut(self.as_mut_ptr(), len) }
    }

    /// Make the capacity at least `n` elements in total.
    ///
    /// Does nothing if it already is; otherwise allocates room for exactly
    /// `n`, moves the elements over and returns any previous heap buffer.
    ///
    /// # Errors
    ///
    /// The allocator's error, with the vector unchanged.
    pub fn try_reserve(&mut self, n: usize) -> Result<(), AllocError> {
        if n <= self.capacity() {
            return Ok(());
        }
        self.grow_to(n)
    }

    /// Infallible [`try_reserve`](Self::try_reserve); exhaustion aborts
    /// through [`std::alloc::handle_alloc_error`].
    pub fn reserve(&mut self, n: usize) {
        raw::infallible(self.try_reserve(n));
    }

    /// Append `value`, doubling the capacity first if the vector is full.
    ///
    /// # Errors
    ///
    /// The allocator's error; `value` is dropped and the vector unchanged.
    pub fn try_push(&mut self, value: T) -> Result<(), AllocError> {
        self.reserve_amortized(1)?;
        let len = self.len;
        // SAFETY: `reserve_amortized` guarantees a free slot at `len`.
        unsafe { self.as_mut_ptr().add(len).write(value) };
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
        Some(unsafe { self.as_ptr().add(self.len).read() })
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
        let base = self.as_mut_ptr();
        // SAFETY: room for one more, `index <= len`.
        unsafe { raw::insert(base, &mut self.len, index, value) }
    }

    /// Insert `value` at `index` and return a reference to it.
    #[track_caller]
    pub fn emplace(&mut self, index: usize, value: T) -> &mut T {
        self.insert(index, value);
        &mut self.as_mut_slice()[index]
    }

    /// Insert `count` copies of `value` at `index`.
    ///
    /// # Panics
    ///
    /// If `index > len`.
    #[track_caller]
    pub fn insert_n(&mut self, index: usize, count: usize, value: T)
    where
        T: Clone,
    {
        let len = self.len;
        assert!(index <= len, "insertion index (is {index}) should be <= len (is {len})");
        raw::infallible(raw::add::<T>(len, count).and_then(|n| self.try_reserve(n)));
        let base = self.as_mut_ptr();
        // Elements past `index` sit outside `len` while the gap is filled,
        // so a panicking `clone` leaks them instead of dropping twice.
        self.len = index;
        let mut filled = index;
        // SAFETY: capacity covers `len + count`; the tail is moved up first.
        unsafe {
            ptr::copy(base.add(index), base.add(index + count), len - index);
            raw::fill(base, &mut filled, count, value);
        }
        self.len = len + count;
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

    /// Remove and return the element at `index`, shifting later elements
    /// down.
    ///
    /// # Panics
    ///
    /// If `index >= len`.
    #[track_caller]
    pub fn erase(&mut self, index: usize) -> T {
        let len = self.len;
        assert!(index < len, "removal index (is {index}) should be < len (is {len})");
        let base = self.as_mut_ptr();
        // SAFETY: `index` is in bounds.
        unsafe { raw::remove(base, &mut self.len, index) }
    }

    /// Same as [`erase`](Self::erase).
    #[track_caller]
    pub fn remove(&mut self, index: usize) -> T {
        self.erase(index)
    }

    /// Drop the elements in `range` and close the gap.
    ///
    /// # Panics
    ///
    /// If the range is decreasing or ends past `len`.
    #[track_caller]
    pub fn erase_range<R: RangeBounds<usize>>(&mut self, range: R) {
        let (start, end) = raw::bounds(range, self.len);
        let base = self.as_mut_ptr();
        // SAFETY: `start <= end <= len`.
        unsafe { raw::remove_range(base, &mut self.len, start, end) }
    }

    /// Keep the first `n` elements and drop the rest.
    pub fn truncate(&mut self, n: usize) {
        let base = self.as_mut_ptr();
        // SAFETY: first `len` slots initialised.
        unsafe { raw::truncate(base, &mut self.len, n) }
    }

    /// Drop every element. Capacity is kept.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Grow with default values or shrink to `n` elements.
    pub fn resize(&mut self, n: usize)
    where
        T: Default,
    {
        self.resize_with(n, T::default);
    }

    /// Grow with values from `f` or shrink to `n` elements.
    pub fn resize_with(&mut self, n: usize, f: impl FnMut() -> T) {
        if n <= self.len {
            self.truncate(n);
            return;
        }
        self.reserve(n);
        let extra = n - self.len;
        let base = self.as_mut_ptr();
        // SAFETY: capacity is at least `n`.
        unsafe { raw::fill_with(base, &mut self.len, extra, f) }
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
        let base = self.as_mut_ptr();
        // SAFETY: capacity is at least `n`.
        unsafe { raw::fill(base, &mut self.len, extra, value) }
    }

    /// Replace the contents with `count` copies of `value`.
    pub fn assign(&mut self, count: usize, value: T)
    where
        T: Clone,
    {
        self.clear();
        self.resize_with_value(count, value);
    }

    /// Replace the contents with clones of `other`, keeping this vector's
    /// allocator.
    pub fn assign_from(&mut self, other: &[T])
    where
        T: Clone,
    {
        self.clear();
        self.reserve(other.len());
        self.extend(other.iter().cloned());
    }

    /// Replace the contents with those of `other`, leaving `other` empty.
    ///
    /// This vector keeps its allocator. If `other` is heap-backed and its
    /// resource equals ours, we take its buffer without touching any
    /// element. Otherwise the elements are relocated into our own storage
    /// and `other` keeps its (now empty) buffer.
    pub fn take_from<'o>(&mut self, other: &mut InlinedVec<'o, T, N>) {
        self.clear();
        if let Storage::Heap { ptr, capacity } = other.storage {
            if self.alloc == other.alloc {
                self.release_heap();
                self.storage = Storage::Heap { ptr, capacity };
                self.len = mem::take(&mut other.len);
                other.storage = Storage::inline();
                trace!(capacity, len = self.len, "heap buffer transferred");
                return;
            }
        }
        self.reserve(other.len);
        let n = mem::take(&mut other.len);
        // SAFETY: `other`'s first `n` slots are initialised and, with its
        // length now zero, no longer owned by it; we have room for `n`.
        unsafe { ptr::copy_nonoverlapping(other.as_ptr(), self.as_mut_ptr(), n) };
        self.len = n;
    }

    /// Exchange contents and allocators with `other`.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Make room for `additional` more elements, doubling past the current
    /// capacity rather than growing to the exact size.
    fn reserve_amortized(&mut self, additional: usize) -> Result<(), AllocError> {
        let needed = raw::add::<T>(self.len, additional)?;
        if needed <= self.capacity() {
            return Ok(());
        }
        let cap = raw::grown::<T>(self.capacity(), needed, 1)?;
        self.grow_to(cap)
    }

    fn grow_to(&mut self, new_cap: usize) -> Result<(), AllocError> {
        // SAFETY: the first `len` slots are initialised; they are treated as
        // moved once the new buffer is installed below.
        let ptr = unsafe { raw::relocate(self.alloc, self.as_ptr(), self.len, new_cap)? };
        trace!(
            from = self.capacity(),
            to = new_cap,
            inline = self.is_inline(),
            "inlined vec grew"
        );
        self.release_heap();
        self.storage = Storage::Heap {
            ptr,
            capacity: new_cap,
        };
        Ok(())
    }

    /// Return the heap buffer, if any, and fall back to inline storage.
    /// Elements in the buffer must already be dropped or moved out.
    fn release_heap(&mut self) {
        if let Storage::Heap { ptr, capacity } = mem::replace(&mut self.storage, Storage::inline()) {
            // SAFETY: buffer came from `self.alloc.allocate(capacity)`.
            unsafe { self.alloc.deallocate(ptr, capacity) }
        }
    }
}

impl<T, const N: usize> Drop for InlinedVec<'_, T, N> {
    fn drop(&mut self) {
        self.clear();
        self.release_heap();
    }
}

impl<T, const N: usize> Deref for InlinedVec<'_, T, N> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, const N: usize> DerefMut for InlinedVec<'_, T, N> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, const N: usize> AsRef<[T]> for InlinedVec<'_, T, N> {
    fn as_ref(&self) -> &[T] {
        self
    }
}

impl<T, const N: usize> Extend<T> for InlinedVec<'_, T, N> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        raw::infallible(self.reserve_amortized(lower));
        for item in iter {
            self.push(item);
        }
    }
}

impl<T, const N: usize> FromIterator<T> for InlinedVec<'static, T, N> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_iter_in(iter, TypedAllocator::default())
    }
}

impl<T: Clone, const N: usize> Clone for InlinedVec<'_, T, N> {
    fn clone(&self) -> Self {
        self.clone_in(self.alloc)
    }

    fn clone_from(&mut self, source: &Self) {
        self.assign_from(source);
    }
}

impl<T: fmt::Debug, const N: usize> fmt::Debug for InlinedVec<'_, T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, U, const N: usize, const M: usize> PartialEq<InlinedVec<'_, U, M>> for InlinedVec<'_, T, N>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &InlinedVec<'_, U, M>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T, U, const N: usize, const K: usize> PartialEq<[U; K]> for InlinedVec<'_, T, N>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U; K]) -> bool {
        self.as_slice() == other
    }
}

impl<T, U, const N: usize> PartialEq<[U]> for InlinedVec<'_, T, N>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U]) -> bool {
        self.as_slice() == other
    }
}

impl<T: Eq, const N: usize> Eq for InlinedVec<'_, T, N> {}

impl<T: Hash, const N: usize> Hash for InlinedVec<'_, T, N> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl<'a, T, const N: usize> IntoIterator for &'a InlinedVec<'_, T, N> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, const N: usize> IntoIterator for &'a mut InlinedVec<'_, T, N> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<'r, T, const N: usize> IntoIterator for InlinedVec<'r, T, N> {
    type Item = T;
    type IntoIter = IntoIter<'r, T, N>;

    fn into_iter(mut self) -> Self::IntoIter {
        let end = mem::take(&mut self.len);
        IntoIter {
            vec: self,
            start: 0,
            end,
        }
    }
}

/// Owning iterator over an [`InlinedVec`].
pub struct IntoIter<'r, T, const N: usize> {
    // `vec.len` is zero; the live elements are `start..end`.
    vec: InlinedVec<'r, T, N>,
    start: usize,
    end: usize,
}

impl<T, const N: usize> IntoIter<'_, T, N> {
    /// The elements not yet yielded.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `start..end` are initialised and not yet moved out.
        unsafe { slice::from_raw_parts(self.vec.as_ptr().add(self.start), self.end - self.start) }
    }
}

impl<T, const N: usize> Iterator for IntoIter<'_, T, N> {
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

impl<T, const N: usize> DoubleEndedIterator for IntoIter<'_, T, N> {
    fn next_back(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        self.end -= 1;
        // SAFETY: slot `end` is initialised and read exactly once.
        Some(unsafe { self.vec.as_ptr().add(self.end).read() })
    }
}

impl<T, const N: usize> ExactSizeIterator for IntoIter<'_, T, N> {}

impl<T, const N: usize> FusedIterator for IntoIter<'_, T, N> {}

impl<T, const N: usize> Drop for IntoIter<'_, T, N> {
    fn drop(&mut self) {
        let remaining = ptr::slice_from_raw_parts_mut(
            self.vec.as_mut_ptr().wrapping_add(self.start),
            self.end - self.start,
        );
        // SAFETY: `start..end` are initialised and owned by the iterator;
        // the vector itself drops nothing further since its length is zero.
        unsafe { ptr::drop_in_place(remaining) }
    }
}

impl<T: fmt::Debug, const N: usize> fmt::Debug for IntoIter<'_, T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_memory::{null_resource, system_resource, ArenaResource};
    use kiln_test_utils::{track, CountingResource, Tally};

    fn alloc<'r, T>(counting: &'r CountingResource<'_>) -> TypedAllocator<'r, T> {
        TypedAllocator::new(counting)
    }

    #[test]
    fn stays_inline_up_to_n() {
        let counting = CountingResource::new();
        let mut v = InlinedVec::<u32, 4>::new_in(alloc(&counting));
        for i in 0..4 {
            v.push(i);
        }
        assert!(v.is_inline());
        assert_eq!(v.capacity(), 4);
        assert_eq!(counting.allocations(), 0);
        v.push(4);
        assert!(!v.is_inline());
        assert_eq!(v.capacity(), 8);
        assert_eq!(counting.allocations(), 1);
        assert_eq!(v, [0, 1, 2, 3, 4]);
    }

    #[test]
    fn zero_inline_capacity_spills_on_first_push() {
        let counting = CountingResource::new();
        let mut v = InlinedVec::<u8, 0>::new_in(alloc(&counting));
        assert_eq!(v.capacity(), 0);
        v.push(1);
        assert_eq!(v.capacity(), 1);
        v.push(2);
        v.push(3);
        assert_eq!(v.capacity(), 4);
        assert_eq!(counting.allocations(), 3);
        assert_eq!(counting.live_blocks(), 1);
    }

    #[test]
    fn reserve_is_exact_and_never_shrinks() {
        let counting = CountingResource::new();
        let mut v = InlinedVec::<u64, 2>::new_in(alloc(&counting));
        v.reserve(2);
        assert!(v.is_inline());
        v.reserve(11);
        assert_eq!(v.capacity(), 11);
        v.reserve(5);
        assert_eq!(v.capacity(), 11);
        assert_eq!(counting.allocations(), 1);
        drop(v);
        counting.assert_all_released();
    }

    #[test]
    fn try_reserve_reports_failure_and_keeps_contents() {
        let mut v = InlinedVec::<u32, 2>::new_in(TypedAllocator::new(null_resource()));
        v.push(1);
        v.push(2);
        assert_eq!(
            v.try_reserve(3),
            Err(AllocError::OutOfMemory { bytes: 12, align: 4 })
        );
        assert_eq!(v.try_push(3), Err(AllocError::OutOfMemory { bytes: 16, align: 4 }));
        assert_eq!(v, [1, 2]);
        assert!(v.is_inline());
    }

    #[test]
    fn capacity_overflow_is_a_layout_error() {
        let mut v = InlinedVec::<u64, 1>::new();
        assert!(matches!(
            v.try_reserve(usize::MAX),
            Err(AllocError::InvalidLayout { .. })
        ));
    }

    #[test]
    fn insert_and_erase_keep_order() {
        let mut v: InlinedVec<_, 3> = (0..6).collect();
        v.insert(0, 100);
        v.insert(7, 200);
        v.insert(3, 300);
        assert_eq!(v, [100, 0, 1, 300, 2, 3, 4, 5, 200]);
        assert_eq!(v.erase(3), 300);
        assert_eq!(v.remove(0), 100);
        assert_eq!(v, [0, 1, 2, 3, 4, 5, 200]);
        *v.emplace(1, 7) += 1;
        assert_eq!(v[1], 8);
    }

    #[test]
    #[should_panic(expected = "removal index (is 3) should be < len (is 3)")]
    fn erase_out_of_bounds_panics() {
        let mut v: InlinedVec<_, 4> = [1, 2, 3].into_iter().collect();
        v.erase(3);
    }

    #[test]
    #[should_panic(expected = "insertion index (is 2) should be <= len (is 1)")]
    fn insert_out_of_bounds_panics() {
        let mut v = InlinedVec::<i32, 4>::new();
        v.push(1);
        v.insert(2, 0);
    }

    #[test]
    #[should_panic]
    fn index_out_of_bounds_panics() {
        let v = InlinedVec::<i32, 4>::new();
        let _first = v[0];
    }

    #[test]
    fn insert_n_and_insert_iter() {
        let mut v: InlinedVec<_, 4> = ["a", "d"].into_iter().collect();
        v.insert_n(1, 2, "x");
        assert_eq!(v, ["a", "x", "x", "d"]);
        v.insert_n(4, 0, "never");
        v.insert_iter(1, ["b", "c"]);
        assert_eq!(v, ["a", "b", "c", "x", "x", "d"]);
        v.insert_iter(6, ["e"]);
        assert_eq!(v.last(), Some(&"e"));
    }

    #[test]
    fn erase_range_drops_exactly_the_range() {
        let tally = Tally::new();
        let mut v = InlinedVec::<_, 2>::new();
        for i in 0..6 {
            v.push(track(&tally, i));
        }
        v.erase_range(1..4);
        assert_eq!(tally.drops(), 3);
        assert_eq!(v, [0, 4, 5]);
        v.erase_range(..);
        assert!(v.is_empty());
        assert_eq!(tally.drops(), 6);
    }

    #[test]
    fn resize_fills_and_trims() {
        let mut v = InlinedVec::<String, 2>::new();
        v.resize(3);
        assert_eq!(v, ["", "", ""]);
        v.resize_with_value(5, "z".to_string());
        assert_eq!(v, ["", "", "", "z", "z"]);
        v.resize_with_value(1, "unused".to_string());
        assert_eq!(v.len(), 1);
        let mut n = 0;
        v.resize_with(3, || {
            n += 1;
            n.to_string()
        });
        assert_eq!(v, ["", "1", "2"]);
    }

    #[test]
    fn resize_clones_all_but_one() {
        let tally = Tally::new();
        let mut v = InlinedVec::<_, 8>::new();
        v.resize_with_value(4, track(&tally, 9));
        assert_eq!(tally.clones(), 3);
        assert_eq!(tally.drops(), 0);
        v.truncate(1);
        assert_eq!(tally.drops(), 3);
    }

    #[test]
    fn assign_and_pop() {
        let mut v = InlinedVec::<u8, 4>::from_elem_in(6, 1, TypedAllocator::default());
        v.assign(2, 7);
        assert_eq!(v, [7, 7]);
        assert_eq!(v.capacity(), 6);
        assert_eq!(v.pop(), Some(7));
        assert_eq!(v.pop(), Some(7));
        assert_eq!(v.pop(), None);
    }

    #[test]
    fn with_len_uses_default() {
        let v = InlinedVec::<Option<u8>, 2>::with_len_in(3, TypedAllocator::default());
        assert_eq!(v, [None, None, None]);
    }

    #[test]
    fn clone_keeps_allocator_and_clone_in_switches() {
        let arena = ArenaResource::with_block_size(system_resource(), 4096).unwrap();
        let v = InlinedVec::<u16, 2>::from_iter_in(0..10, TypedAllocator::new(&arena));
        let same = v.clone();
        assert_eq!(same, v);
        assert_eq!(same.allocator(), v.allocator());
        let elsewhere = v.clone_in(TypedAllocator::new(system_resource()));
        assert_eq!(elsewhere, v);
        assert_ne!(elsewhere.allocator(), v.allocator());
    }

    #[test]
    fn swap_exchanges_allocators() {
        let a = CountingResource::new();
        let b = CountingResource::new();
        let mut x = InlinedVec::<u8, 2>::from_iter_in([1, 2, 3], alloc(&a));
        let mut y = InlinedVec::<u8, 2>::from_iter_in([9], alloc(&b));
        x.swap(&mut y);
        assert_eq!(x, [9]);
        assert_eq!(y, [1, 2, 3]);
        assert_eq!(y.allocator(), TypedAllocator::<u8>::new(&a));
        assert_eq!(y.capacity(), 4);
        y.push(4);
        assert_eq!(a.allocations(), 1);
        assert_eq!(b.allocations(), 0);
    }

    #[test]
    fn drop_releases_heap_and_elements() {
        let counting = CountingResource::new();
        let tally = Tally::new();
        {
            let mut v = InlinedVec::<_, 1>::new_in(alloc(&counting));
            for i in 0..5 {
                v.push(track(&tally, i));
            }
            assert_eq!(counting.live_blocks(), 1);
        }
        assert_eq!(tally.drops(), 5);
        assert_eq!(tally.clones(), 0);
        counting.assert_all_released();
    }

    #[test]
    fn owning_iterator_drops_leftovers() {
        let tally = Tally::new();
        let counting = CountingResource::new();
        let mut v = InlinedVec::<_, 2>::new_in(alloc(&counting));
        for i in 0..5 {
            v.push(track(&tally, i));
        }
        let mut it = v.into_iter();
        assert_eq!(it.len(), 5);
        assert_eq!(it.next().map(|t| t.value), Some(0));
        assert_eq!(it.next_back().map(|t| t.value), Some(4));
        assert_eq!(it.as_slice(), [1, 2, 3]);
        drop(it);
        assert_eq!(tally.drops(), 5);
        counting.assert_all_released();
    }

    #[test]
    fn iteration_by_reference() {
        let mut v: InlinedVec<i32, 3> = (1..=4).collect();
        for x in &mut v {
            *x *= 10;
        }
        let sum: i32 = (&v).into_iter().sum();
        assert_eq!(sum, 100);
        assert_eq!(format!("{v:?}"), "[10, 20, 30, 40]");
    }

    #[test]
    fn zero_sized_elements() {
        let counting = CountingResource::new();
        let mut v = InlinedVec::<(), 2>::new_in(alloc(&counting));
        for _ in 0..10 {
            v.push(());
        }
        assert_eq!(v.len(), 10);
        assert_eq!(counting.live_blocks(), 0);
        assert_eq!(v.pop(), Some(()));
    }
}
