//! Growth policy and element shuffling over an initialised `(base, len)`
//! prefix, shared by both vectors.
//!
//! Every function that moves elements keeps `len` covering exactly the
//! initialised slots at each step, so a panicking destructor or `clone`
//! can leak elements but never double-drop them.

#![allow(unsafe_code)]

use std::alloc::{handle_alloc_error, Layout};
use std::mem;
use std::ops::{Bound, RangeBounds};
use std::ptr::{self, NonNull};

use kiln_memory::{AllocError, TypedAllocator};

/// Unwrap a growth result the way `Vec` does: abort through
/// [`handle_alloc_error`] on exhaustion, panic on arithmetic overflow.
pub(crate) fn infallible<R>(result: Result<R, AllocError>) -> R {
    match result {
        Ok(value) => value,
        Err(AllocError::OutOfMemory { bytes, align }) => {
            match Layout::from_size_align(bytes, align) {
                Ok(layout) => handle_alloc_error(layout),
                Err(_) => capacity_overflow(),
            }
        }
        Err(AllocError::InvalidLayout { .. }) => capacity_overflow(),
    }
}

#[cold]
fn capacity_overflow() -> ! {
    panic!("capacity overflow")
}

fn overflow<T>() -> AllocError {
    AllocError::InvalidLayout {
        bytes: usize::MAX,
        align: mem::align_of::<T>(),
    }
}

/// `a + b`, reported as a layout error on overflow.
pub(crate) fn add<T>(a: usize, b: usize) -> Result<usize, AllocError> {
    a.checked_add(b).ok_or_else(overflow::<T>)
}

/// Next capacity when `cap` is too small for `needed`: `first` if nothing
/// was allocated yet, otherwise double, but never less than `needed`.
pub(crate) fn grown<T>(cap: usize, needed: usize, first: usize) -> Result<usize, AllocError> {
    let next = if cap == 0 {
        first
    } else {
        cap.checked_mul(2).ok_or_else(overflow::<T>)?
    };
    Ok(next.max(needed))
}

/// Allocate room for `new_cap` elements and move `len` elements from `src`
/// into it.
///
/// # Safety
///
/// `src` must be valid for reading `len` initialised elements, which the
/// caller treats as moved out afterwards. `new_cap >= len`.
pub(crate) unsafe fn relocate<T>(
    alloc: TypedAllocator<'_, T>,
    src: *const T,
    len: usize,
    new_cap: usize,
) -> Result<NonNull<T>, AllocError> {
    debug_assert!(new_cap >= len);
    let dst = alloc.allocate(new_cap)?;
    // SAFETY: fresh allocation cannot overlap `src`.
    unsafe { ptr::copy_nonoverlapping(src, dst.as_ptr(), len) };
    Ok(dst)
}

/// Resolve `range` against `len`, panicking like slice indexing does.
#[track_caller]
pub(crate) fn bounds<R: RangeBounds<usize>>(range: R, len: usize) -> (usize, usize) {
    let start = match range.start_bound() {
        Bound::Included(&s) => s,
        Bound::Excluded(&s) => s.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&e) => e.saturating_add(1),
        Bound::Excluded(&e) => e,
        Bound::Unbounded => len,
    };
    assert!(start <= end, "range starts at {start} but ends at {end}");
    assert!(end <= len, "range end {end} out of bounds for length {len}");
    (start, end)
}

/// Shift `[index, len)` up one slot and write `value` at `index`.
///
/// # Safety
///
/// `base` must be valid for `*len + 1` slots with the first `*len`
/// initialised, and `index <= *len`.
pub(crate) unsafe fn insert<T>(base: *mut T, len: &mut usize, index: usize, value: T) {
    // SAFETY: caller guarantees room for one more element.
    unsafe {
        let at = base.add(index);
        ptr::copy(at, at.add(1), *len - index);
        at.write(value);
    }
    *len += 1;
}

/// Move the element at `index` out and close the gap.
///
/// # Safety
///
/// The first `*len` slots at `base` must be initialised and `index < *len`.
pub(crate) unsafe fn remove<T>(base: *mut T, len: &mut usize, index: usize) -> T {
    // SAFETY: `index` is in bounds; the tail is shifted over the hole.
    unsafe {
        let at = base.add(index);
        let value = at.read();
        ptr::copy(at.add(1), at, *len - index - 1);
        *len -= 1;
        value
    }
}

/// Drop `[start, end)` and shift the tail down over it.
///
/// # Safety
///
/// The first `*len` slots at `base` must be initialised and
/// `start <= end <= *len`.
pub(crate) unsafe fn remove_range<T>(base: *mut T, len: &mut usize, start: usize, end: usize) {
    let old = *len;
    *len = start;
    // SAFETY: `[start, end)` is initialised and no longer covered by `len`;
    // the tail `[end, old)` is still initialised.
    unsafe {
        ptr::drop_in_place(ptr::slice_from_raw_parts_mut(base.add(start), end - start));
        ptr::copy(base.add(end), base.add(start), old - end);
    }
    *len = old - (end - start);
}

/// Drop every element past `new_len`.
///
/// # Safety
///
/// The first `*len` slots at `base` must be initialised.
pub(crate) unsafe fn truncate<T>(base: *mut T, len: &mut usize, new_len: usize) {
    if new_len >= *len {
        return;
    }
    let tail = *len - new_len;
    *len = new_len;
    // SAFETY: the tail is initialised and no longer covered by `len`.
    unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(base.add(new_len), tail)) }
}

/// Append `n` elements: `n - 1` clones of `value`, then `value` itself.
///
/// # Safety
///
/// `base` must be valid for `*len + n` slots with the first `*len`
/// initialised.
pub(crate) unsafe fn fill<T: Clone>(base: *mut T, len: &mut usize, n: usize, value: T) {
    if n == 0 {
        return;
    }
    for _ in 1..n {
        // SAFETY: room reserved by the caller.
        unsafe { base.add(*len).write(value.clone()) };
        *len += 1;
    }
    // SAFETY: as above.
    unsafe { base.add(*len).write(value) };
    *len += 1;
}

/// Append `n` elements produced by `f`.
///
/// # Safety
///
/// Same as [`fill`].
pub(crate) unsafe fn fill_with<T>(base: *mut T, len: &mut usize, n: usize, mut f: impl FnMut() -> T) {
    for _ in 0..n {
        // SAFETY: room reserved by the caller.
        unsafe { base.add(*len).write(f()) };
        *len += 1;
    }
}
