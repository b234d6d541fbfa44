//! Kiln: pluggable memory resources and the containers built on them.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all kiln sub-crates. For most users, adding `kiln` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use kiln::prelude::*;
//!
//! // One arena per request; everything allocated from it goes away at once.
//! let arena = ArenaResource::with_block_size(system_resource(), 4096).unwrap();
//! let alloc = TypedAllocator::new(&arena);
//!
//! // Up to eight tokens live inline; more spill into the arena.
//! let mut tokens = InlinedVec::<&str, 8>::new_in(alloc);
//! for word in "the quick brown fox jumps over the lazy dog".split(' ') {
//!     tokens.push(word);
//! }
//! assert_eq!(tokens.len(), 9);
//! assert!(!tokens.is_inline());
//! assert_eq!(arena.stats().blocks, 1);
//!
//! // Moving into another resource relocates the elements.
//! let kept = tokens.moved_into(TypedAllocator::new(system_resource()));
//! assert_eq!(kept[2], "brown");
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`memory`] | `kiln-memory` | `MemoryResource`, system/null resources, `ArenaResource`, `TypedAllocator`, default resource |
//! | [`tagged`] | `kiln-tagged` | `TaggedPtr`, `type_set!`, visitor traits |
//! | [`containers`] | `kiln-containers` | `InlinedVec`, `PmrVec` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Memory resources, the monotonic arena and typed allocators
/// (`kiln-memory`).
///
/// Everything allocator-aware in kiln is written against
/// [`memory::MemoryResource`].
pub use kiln_memory as memory;

/// Closed-set tagged pointers (`kiln-tagged`).
///
/// Declare a set with [`tagged::type_set!`] and point into it with
/// [`tagged::TaggedPtr`].
pub use kiln_tagged as tagged;

/// Allocator-aware vectors (`kiln-containers`).
pub use kiln_containers as containers;

pub use kiln_tagged::type_set;

/// Common imports for typical kiln usage.
///
/// ```rust
/// use kiln::prelude::*;
/// ```
pub mod prelude {
    // Resources
    pub use kiln_memory::{
        default_resource, null_resource, set_default_resource, system_resource, AllocError,
        ArenaConfig, ArenaResource, DefaultResourceGuard, MemoryResource, TypedAllocator,
    };

    // Tagged pointers
    pub use kiln_tagged::{RefVisitor, TaggedPtr, Visit, VisitRef, Visitor};

    // Containers
    pub use kiln_containers::{InlinedVec, PmrVec};
}
