//! Allocator-aware vectors for kiln.
//!
//! Both containers take a [`TypedAllocator`](kiln_memory::TypedAllocator)
//! at construction and route every heap allocation through its
//! [`MemoryResource`](kiln_memory::MemoryResource):
//!
//! - [`InlinedVec`] keeps up to `N` elements inside the value itself and
//!   only touches the resource once it outgrows them.
//! - [`PmrVec`] is always heap-backed.
//!
//! Moving a container into another allocator transfers the heap buffer
//! when the two resources compare equal, and relocates the elements into
//! fresh storage otherwise.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod inlined_vec;
pub mod pmr_vec;
mod raw;

pub use inlined_vec::InlinedVec;
pub use pmr_vec::PmrVec;
