//! Per-thread default resource.
//!
//! Code that does not pass a resource explicitly falls back to the value
//! stored here. The slot is thread-local, so setting it never races with
//! another thread; it starts out as [`system_resource`].

use std::cell::Cell;

use crate::resource::MemoryResource;
use crate::system::system_resource;

thread_local! {
    static DEFAULT_RESOURCE: Cell<&'static dyn MemoryResource> =
        Cell::new(system_resource() as &'static dyn MemoryResource);
}

/// The current thread's default resource.
pub fn default_resource() -> &'static dyn MemoryResource {
    DEFAULT_RESOURCE.with(Cell::get)
}

/// Replace the current thread's default resource, returning the previous one.
pub fn set_default_resource(resource: &'static dyn MemoryResource) -> &'static dyn MemoryResource {
    DEFAULT_RESOURCE.with(|slot| slot.replace(resource))
}

/// Install `resource` as the default for the lifetime of the guard.
///
/// The previous default is restored on drop.
#[must_use = "the previous default is restored as soon as the guard is dropped"]
pub struct DefaultResourceGuard {
    previous: &'static dyn MemoryResource,
}

impl DefaultResourceGuard {
    /// Swap in `resource` until the guard is dropped.
    pub fn new(resource: &'static dyn MemoryResource) -> Self {
        Self {
            previous: set_default_resource(resource),
        }
    }
}

impl Drop for DefaultResourceGuard {
    fn drop(&mut self) {
        set_default_resource(self.previous);
    }
}
