//! Visitor traits consumed by [`TaggedPtr::dispatch`](crate::TaggedPtr::dispatch).
//!
//! A visitor is an ordinary value implementing [`Visit`] once per member of
//! the set. Dispatch consumes the visitor, so per-call state travels in its
//! fields; pass `&mut` state in a field when results must outlive the call.

/// Common result type of a visitor across all member types.
pub trait Visitor {
    /// What every [`Visit::visit`] call returns.
    type Output;
}

/// Handling of one member type `T`.
pub trait Visit<'a, T: 'a>: Visitor {
    /// Visit the referenced value.
    fn visit(self, value: &'a T) -> Self::Output;
}

/// Common target of a reference-returning visitor.
///
/// Kept separate from [`Visitor`] so the returned reference can borrow from
/// the visited value for the pointer's full lifetime `'a`.
pub trait RefVisitor<'a> {
    /// The referent every [`VisitRef::visit_ref`] call yields.
    type Target: ?Sized + 'a;
}

/// Reference-returning handling of one member type `T`.
pub trait VisitRef<'a, T: 'a>: RefVisitor<'a> {
    /// Visit the referenced value and return a reference into it (or into
    /// anything else living for `'a`).
    fn visit_ref(self, value: &'a T) -> &'a Self::Target;
}
