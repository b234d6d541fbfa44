//! Closed-set polymorphism packed into a single machine word.
//!
//! A [`TaggedPtr`] is a non-owning reference to a value whose type is one
//! of a fixed, ordered set of types. The set is declared once with
//! [`type_set!`], which assigns every member a tag (`1..=COUNT`, in
//! declaration order) and generates the dispatch glue. Tag `0` is reserved
//! for the null pointer.
//!
//! ```
//! use kiln_tagged::{type_set, TaggedPtr, Visit, Visitor};
//!
//! struct Circle { r: f64 }
//! struct Square { side: f64 }
//!
//! type_set! {
//!     /// Everything a scene can draw.
//!     pub enum Shape { Circle, Square }
//! }
//!
//! struct Area;
//! impl Visitor for Area { type Output = f64; }
//! impl<'a> Visit<'a, Circle> for Area {
//!     fn visit(self, c: &'a Circle) -> f64 { std::f64::consts::PI * c.r * c.r }
//! }
//! impl<'a> Visit<'a, Square> for Area {
//!     fn visit(self, s: &'a Square) -> f64 { s.side * s.side }
//! }
//!
//! let square = Square { side: 3.0 };
//! let shape = TaggedPtr::<Shape>::new(&square);
//! assert_eq!(shape.tag(), 2);
//! assert_eq!(shape.dispatch(Area), 9.0);
//! assert!(shape.cast_or_none::<Circle>().is_none());
//! ```
//!
//! # Representation
//!
//! The address occupies the low 48 bits and the tag the high 16 bits of one
//! pointer-sized word. Only 64-bit targets are supported.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]

#[cfg(not(target_pointer_width = "64"))]
compile_error!("kiln-tagged packs a 16-bit tag above a 48-bit address and needs 64-bit pointers");

pub mod ptr;
pub mod set;
pub mod visit;

pub use ptr::TaggedPtr;
pub use set::{Dispatch, DispatchRef, Member, TypeSet};
pub use visit::{RefVisitor, Visit, VisitRef, Visitor};
