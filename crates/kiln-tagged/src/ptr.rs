//! The [`TaggedPtr`] word.

#![allow(unsafe_code)]

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ptr;

use crate::set::{Dispatch, DispatchRef, Member, TypeSet};
use crate::visit::{RefVisitor, Visitor};

const TAG_SHIFT: u32 = 48;
const ADDR_MASK: usize = (1 << TAG_SHIFT) - 1;

/// A non-owning reference to a value of one of the types in `S`, packed
/// with its type tag into a single pointer-sized word.
///
/// The low 48 bits hold the address, the high 16 bits the tag. A null
/// pointer has address 0 and tag 0. Copying, comparing and hashing all act
/// on the packed word, so two pointers are equal exactly when they
/// reference the same address with the same tag.
///
/// `TaggedPtr` borrows for `'a` like `&'a T` does, but unlike `&'a T` it is
/// neither `Send` nor `Sync`.
pub struct TaggedPtr<'a, S: TypeSet> {
    bits: *const (),
    _marker: PhantomData<(&'a (), fn() -> S)>,
}

impl<'a, S: TypeSet> TaggedPtr<'a, S> {
    /// The null pointer: address 0, tag 0.
    pub const fn null() -> Self {
        Self {
            bits: ptr::null(),
            _marker: PhantomData,
        }
    }

    /// Point at `value`, tagged with its position in `S`.
    ///
    /// # Panics
    ///
    /// If the address of `value` does not fit in 48 bits.
    pub fn new<T: Member<S>>(value: &'a T) -> Self {
        let raw = ptr::from_ref(value).cast::<()>();
        assert!(
            raw.addr() & !ADDR_MASK == 0,
            "address {raw:p} does not fit in {TAG_SHIFT} bits"
        );
        Self {
            bits: raw.map_addr(|addr| addr | (usize::from(T::TAG) << TAG_SHIFT)),
            _marker: PhantomData,
        }
    }

    /// Tag of the referenced type; 0 when null.
    pub fn tag(&self) -> u16 {
        // Truncation is exact: the shifted word has only 16 significant bits.
        (self.bits.addr() >> TAG_SHIFT) as u16
    }

    /// Largest valid tag, i.e. the number of types in `S`.
    pub const fn max_tag() -> u16 {
        S::COUNT
    }

    /// Number of distinct tags including the null tag.
    pub const fn num_tags() -> u32 {
        S::COUNT as u32 + 1
    }

    /// Tag that `T` receives in `S`.
    pub const fn type_index<T: Member<S>>() -> u16 {
        T::TAG
    }

    /// The address without the tag, with provenance intact.
    pub fn ptr(&self) -> *const () {
        self.bits.map_addr(|addr| addr & ADDR_MASK)
    }

    /// Whether this is the null pointer.
    pub fn is_null(&self) -> bool {
        self.ptr().is_null()
    }

    /// Whether the pointee is a `T`.
    pub fn is<T: Member<S>>(&self) -> bool {
        self.tag() == T::TAG
    }

    /// The pointee as a `T`, or `None` if it holds another type or is null.
    pub fn cast_or_none<T: Member<S>>(&self) -> Option<&'a T> {
        if !self.is::<T>() {
            return None;
        }
        // SAFETY: the tag says the pointee is a `T`, and only `new` stores a
        // non-zero tag, from a `&'a T`.
        Some(unsafe { &*self.ptr().cast::<T>() })
    }

    /// The pointee as a `T`.
    ///
    /// # Panics
    ///
    /// If the pointer is null or holds a different type.
    #[track_caller]
    pub fn cast<T: Member<S>>(&self) -> &'a T {
        match self.cast_or_none() {
            Some(value) => value,
            None => panic!(
                "cannot cast {self} holding {} to {}",
                S::type_name(self.tag()).unwrap_or("null"),
                std::any::type_name::<T>()
            ),
        }
    }

    /// Call the `visitor` method matching the pointee's type.
    ///
    /// Compiles to a chain of tag comparisons, one per member, so the depth
    /// is linear in the size of the set unless the optimiser turns the chain
    /// into a jump table.
    ///
    /// # Panics
    ///
    /// If the pointer is null.
    #[track_caller]
    pub fn dispatch<V>(&self, visitor: V) -> V::Output
    where
        V: Visitor,
        S: Dispatch<'a, V>,
    {
        self.expect_non_null("dispatch");
        // SAFETY: non-null, so the tag is in range and names the pointee type.
        unsafe { S::dispatch(self.tag(), self.ptr(), visitor) }
    }

    /// Like [`dispatch`](Self::dispatch), but returns a reference that lives
    /// as long as the pointee.
    ///
    /// # Panics
    ///
    /// If the pointer is null.
    #[track_caller]
    pub fn dispatch_ref<V>(&self, visitor: V) -> &'a V::Target
    where
        V: RefVisitor<'a>,
        S: DispatchRef<'a, V>,
    {
        self.expect_non_null("dispatch_ref");
        // SAFETY: as in `dispatch`.
        unsafe { S::dispatch_ref(self.tag(), self.ptr(), visitor) }
    }

    /// Like [`dispatch`](Self::dispatch), through a per-set table of
    /// function pointers indexed by tag.
    ///
    /// # Panics
    ///
    /// If the pointer is null.
    #[track_caller]
    pub fn dispatch_cpu<V>(&self, visitor: V) -> V::Output
    where
        V: Visitor,
        S: Dispatch<'a, V>,
    {
        self.expect_non_null("dispatch_cpu");
        // SAFETY: as in `dispatch`.
        unsafe { S::dispatch_table(self.tag(), self.ptr(), visitor) }
    }

    #[track_caller]
    fn expect_non_null(&self, op: &str) {
        assert!(!self.is_null(), "{op} on a null TaggedPtr");
    }
}

impl<S: TypeSet> Default for TaggedPtr<'_, S> {
    fn default() -> Self {
        Self::null()
    }
}

impl<'a, S: TypeSet, T: Member<S>> From<&'a T> for TaggedPtr<'a, S> {
    fn from(value: &'a T) -> Self {
        Self::new(value)
    }
}

impl<S: TypeSet> Clone for TaggedPtr<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: TypeSet> Copy for TaggedPtr<'_, S> {}

impl<S: TypeSet> PartialEq for TaggedPtr<'_, S> {
    fn eq(&self, other: &Self) -> bool {
        self.bits.addr() == other.bits.addr()
    }
}

impl<S: TypeSet> Eq for TaggedPtr<'_, S> {}

impl<S: TypeSet> PartialOrd for TaggedPtr<'_, S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S: TypeSet> Ord for TaggedPtr<'_, S> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bits.addr().cmp(&other.bits.addr())
    }
}

impl<S: TypeSet> Hash for TaggedPtr<'_, S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits.addr().hash(state);
    }
}

impl<S: TypeSet> fmt::Display for TaggedPtr<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ TaggedPtr ptr: {:p} tag: {} ]", self.ptr(), self.tag())
    }
}

impl<S: TypeSet> fmt::Debug for TaggedPtr<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaggedPtr")
            .field("ptr", &self.ptr())
            .field("tag", &self.tag())
            .field("type", &S::type_name(self.tag()).unwrap_or("null"))
            .finish()
    }
}
