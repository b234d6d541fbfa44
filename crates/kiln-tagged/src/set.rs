//! Closed type sets, membership, and the dispatch glue [`type_set!`]
//! generates for them.

#![allow(unsafe_code)]

use crate::visit::{RefVisitor, Visitor};

/// A closed, ordered set of types a [`TaggedPtr`](crate::TaggedPtr) may
/// reference.
///
/// Sets are usually uninhabited marker enums declared with [`type_set!`].
///
/// # Safety
///
/// `COUNT` must equal the number of members, every member's
/// [`Member::TAG`] must be distinct and lie in `1..=COUNT`, and
/// `type_name` must agree with those tags.
pub unsafe trait TypeSet: 'static {
    /// Number of member types, which is also the largest valid tag.
    const COUNT: u16;

    /// Name of the member with `tag`, or `None` for `0` and out-of-range
    /// tags.
    fn type_name(tag: u16) -> Option<&'static str>;
}

/// Membership of `Self` in the set `S`.
///
/// # Safety
///
/// `TAG` identifies `Self` uniquely within `S`: a pointer carrying `TAG`
/// is dereferenced as `Self`.
pub unsafe trait Member<S: TypeSet>: Sized {
    /// Position of `Self` in `S`, counting from 1.
    const TAG: u16;
}

/// Dispatch of a visitor `V` to the member type selected by a tag.
///
/// # Safety
///
/// Implementations must hand the visitor a reference of exactly the member
/// type whose tag was passed.
pub unsafe trait Dispatch<'a, V: Visitor>: TypeSet {
    /// Branch on `tag` and visit the pointee.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for `'a` as a reference to the member whose tag is
    /// `tag`, and `tag` must lie in `1..=COUNT`.
    unsafe fn dispatch(tag: u16, ptr: *const (), visitor: V) -> V::Output;

    /// Like [`dispatch`](Self::dispatch), through a table of function
    /// pointers indexed by tag instead of a branch per member.
    ///
    /// # Safety
    ///
    /// Same as [`dispatch`](Self::dispatch).
    unsafe fn dispatch_table(tag: u16, ptr: *const (), visitor: V) -> V::Output;
}

/// Dispatch of a reference-returning visitor `V`.
///
/// # Safety
///
/// Same obligation as [`Dispatch`].
pub unsafe trait DispatchRef<'a, V: RefVisitor<'a>>: TypeSet {
    /// Branch on `tag` and visit the pointee.
    ///
    /// # Safety
    ///
    /// Same as [`Dispatch::dispatch`].
    unsafe fn dispatch_ref(tag: u16, ptr: *const (), visitor: V) -> &'a V::Target;
}

/// Declare a closed type set.
///
/// ```
/// # struct Sphere; struct Disk; struct Triangle;
/// kiln_tagged::type_set! {
///     /// Primitives a ray can hit.
///     pub enum Primitive { Sphere, Disk, Triangle }
/// }
/// ```
///
/// This declares the uninhabited marker `enum Primitive {}`, implements
/// [`TypeSet`] for it, makes `Sphere`, `Disk` and `Triangle` members with
/// tags 1, 2 and 3, and implements [`Dispatch`] / [`DispatchRef`] for every
/// visitor that handles all three. Listing a type twice is a compile error.
#[macro_export]
macro_rules! type_set {
    ($(#[$meta:meta])* $vis:vis enum $set:ident { $($ty:ty),+ $(,)? }) => {
        $(#[$meta])*
        $vis enum $set {}

        // SAFETY: tags are assigned 1..=COUNT in declaration order below.
        unsafe impl $crate::TypeSet for $set {
            const COUNT: u16 = $crate::__count!($($ty),+);

            fn type_name(tag: u16) -> ::core::option::Option<&'static str> {
                $(
                    if tag == <$ty as $crate::Member<$set>>::TAG {
                        return ::core::option::Option::Some(::core::stringify!($ty));
                    }
                )+
                ::core::option::Option::None
            }
        }

        $crate::__members!($set, 1u16; $($ty),+);

        // SAFETY: each branch casts to the member owning the matched tag.
        unsafe impl<'a, V> $crate::Dispatch<'a, V> for $set
        where
            V: $crate::Visitor $(+ $crate::Visit<'a, $ty>)+,
        {
            unsafe fn dispatch(
                tag: u16,
                ptr: *const (),
                visitor: V,
            ) -> <V as $crate::Visitor>::Output {
                $(
                    if tag == <$ty as $crate::Member<$set>>::TAG {
                        // SAFETY: caller guarantees `ptr` refers to the member with `tag`.
                        return unsafe { $crate::set::__private::visit::<$ty, V>(ptr, visitor) };
                    }
                )+
                $crate::set::__private::bad_tag::<$set>(tag)
            }

            unsafe fn dispatch_table(
                tag: u16,
                ptr: *const (),
                visitor: V,
            ) -> <V as $crate::Visitor>::Output {
                let table: &[unsafe fn(*const (), V) -> <V as $crate::Visitor>::Output] =
                    &[$($crate::set::__private::visit::<$ty, V>),+];
                match table.get(usize::from(tag).wrapping_sub(1)) {
                    // SAFETY: table order is tag order; caller guarantees the pointee.
                    ::core::option::Option::Some(f) => unsafe { f(ptr, visitor) },
                    ::core::option::Option::None => $crate::set::__private::bad_tag::<$set>(tag),
                }
            }
        }

        // SAFETY: each branch casts to the member owning the matched tag.
        unsafe impl<'a, V> $crate::DispatchRef<'a, V> for $set
        where
            V: $crate::RefVisitor<'a> $(+ $crate::VisitRef<'a, $ty>)+,
        {
            unsafe fn dispatch_ref(
                tag: u16,
                ptr: *const (),
                visitor: V,
            ) -> &'a <V as $crate::RefVisitor<'a>>::Target {
                $(
                    if tag == <$ty as $crate::Member<$set>>::TAG {
                        // SAFETY: caller guarantees `ptr` refers to the member with `tag`.
                        return unsafe { $crate::set::__private::visit_ref::<$ty, V>(ptr, visitor) };
                    }
                )+
                $crate::set::__private::bad_tag::<$set>(tag)
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __members {
    ($set:ident, $tag:expr; ) => {};
    ($set:ident, $tag:expr; $head:ty $(, $rest:ty)*) => {
        // SAFETY: `$tag` is this member's position; positions never repeat.
        unsafe impl $crate::Member<$set> for $head {
            const TAG: u16 = $tag;
        }
        $crate::__members!($set, $tag + 1u16; $($rest),*);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __count {
    () => { 0u16 };
    ($head:ty $(, $rest:ty)*) => { 1u16 + $crate::__count!($($rest),*) };
}

#[doc(hidden)]
pub mod __private {
    use crate::visit::{Visit, VisitRef};

    /// # Safety
    ///
    /// `ptr` must be valid for `'a` as a `&T`.
    pub unsafe fn visit<'a, T: 'a, V: Visit<'a, T>>(ptr: *const (), visitor: V) -> V::Output {
        // SAFETY: forwarded caller contract.
        visitor.visit(unsafe { &*ptr.cast::<T>() })
    }

    /// # Safety
    ///
    /// `ptr` must be valid for `'a` as a `&T`.
    pub unsafe fn visit_ref<'a, T: 'a, V: VisitRef<'a, T>>(
        ptr: *const (),
        visitor: V,
    ) -> &'a V::Target {
        // SAFETY: forwarded caller contract.
        visitor.visit_ref(unsafe { &*ptr.cast::<T>() })
    }

    #[cold]
    pub fn bad_tag<S: super::TypeSet>(tag: u16) -> ! {
        panic!(
            "tag {tag} does not name a member of {}",
            core::any::type_name::<S>()
        )
    }
}
