//! Pluggable memory resources for kiln.
//!
//! Every allocator-aware type in the workspace is written against the
//! [`MemoryResource`] capability: allocate, deallocate, compare. This crate
//! provides the capability, its leaf implementations, a monotonic arena
//! built on top of any of them, and a typed allocator view for containers.
//! Along with `kiln-tagged` and `kiln-containers`, it is one of three crates
//! that may contain `unsafe` code.
//!
//! # Architecture
//!
//! ```text
//! TypedAllocator<'r, T>  (Copy, non-owning)
//! └── &'r dyn MemoryResource
//!     ├── SystemResource   (global allocator, process-wide singleton)
//!     ├── NullResource     (refuses everything)
//!     └── ArenaResource<'u>
//!         └── &'u dyn MemoryResource  (upstream; blocks drawn in bulk)
//! ```
//!
//! Lifetimes encode ownership: a resource always outlives the allocators and
//! containers that reference it, and an arena's upstream outlives the arena.
//!
//! # Default resource
//!
//! [`default_resource`] / [`set_default_resource`] give each thread an
//! explicit fallback used only when a caller does not pass a resource.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod arena;
mod block;
pub mod config;
pub mod default;
pub mod error;
mod raw;
pub mod resource;
pub mod system;
pub mod typed;

// Public re-exports for the primary API surface.
pub use arena::{ArenaResource, ArenaStats};
pub use config::ArenaConfig;
pub use default::{default_resource, set_default_resource, DefaultResourceGuard};
pub use error::{AllocError, ConfigError};
pub use raw::MAX_ALIGN;
pub use resource::MemoryResource;
pub use system::{null_resource, system_resource, NullResource, SystemResource};
pub use typed::TypedAllocator;
