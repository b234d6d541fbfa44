//! Monotonic (bump) memory resource.
//!
//! [`ArenaResource`] draws fixed-size blocks from an upstream
//! [`MemoryResource`] and satisfies requests by advancing a cursor through
//! the current block. Individual deallocations are ignored; memory comes
//! back only in bulk, through [`ArenaResource::reset`] (blocks kept for
//! reuse) or [`ArenaResource::release`] (blocks returned upstream).
//!
//! ```text
//! ArenaResource
//! ├── current: MemoryBlock + cursor      (bump allocation happens here)
//! ├── used: Vec<MemoryBlock>             (retired blocks, oversized requests)
//! └── available: Vec<MemoryBlock>        (recycled by reset(), first-fit)
//! ```

#![allow(unsafe_code)]

use std::cell::RefCell;
use std::fmt;
use std::ptr::NonNull;

use tracing::{debug, trace, warn};

use crate::block::MemoryBlock;
use crate::config::ArenaConfig;
use crate::default::default_resource;
use crate::error::{AllocError, ConfigError};
use crate::raw::checked_layout;
use crate::resource::MemoryResource;

/// Point-in-time usage figures for an [`ArenaResource`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Blocks currently owned: current + used + available.
    pub blocks: usize,
    /// Of those, blocks waiting in the recycle list.
    pub available_blocks: usize,
    /// Total bytes held across all owned blocks.
    pub bytes_reserved: usize,
    /// Bytes handed out since construction or the last reset/release,
    /// excluding alignment padding.
    pub bytes_allocated: usize,
    /// Number of successful upstream requests since construction.
    pub upstream_allocations: u64,
}

#[derive(Default)]
struct ArenaState {
    /// Block currently being bump-allocated from.
    current: Option<MemoryBlock>,
    /// Next free offset within `current`.
    cursor: usize,
    /// Retired blocks and dedicated oversized blocks.
    used: Vec<MemoryBlock>,
    /// Blocks recycled by `reset()`, searched first-fit before going upstream.
    available: Vec<MemoryBlock>,
    bytes_allocated: usize,
    upstream_allocations: u64,
}

impl ArenaState {
    fn blocks(&self) -> impl Iterator<Item = &MemoryBlock> {
        self.current
            .iter()
            .chain(self.used.iter())
            .chain(self.available.iter())
    }

    /// Remove the first recycled block that can hold `bytes` at `align`,
    /// along with the offset the request lands at.
    fn take_recycled(&mut self, bytes: usize, align: usize) -> Option<(MemoryBlock, usize)> {
        let (index, offset) = self
            .available
            .iter()
            .enumerate()
            .find_map(|(index, block)| block.fit(0, bytes, align).map(|offset| (index, offset)))?;
        let block = self.available.remove(index);
        trace!(size = block.size(), "arena recycled available block");
        Some((block, offset))
    }
}

/// A monotonic, bulk-release memory resource.
///
/// The arena borrows its upstream for `'u`, so the upstream is guaranteed to
/// outlive it. Allocation goes through `&self` (state lives in a `RefCell`),
/// which lets any number of [`TypedAllocator`](crate::TypedAllocator)s share
/// one arena. The arena is not `Sync`: use one arena per task or worker.
///
/// Dropping the arena returns every block to the upstream.
pub struct ArenaResource<'u> {
    upstream: &'u dyn MemoryResource,
    config: ArenaConfig,
    state: RefCell<ArenaState>,
}

impl<'u> ArenaResource<'u> {
    /// Create an arena drawing blocks from `upstream`.
    ///
    /// No memory is requested until the first allocation.
    pub fn new(upstream: &'u dyn MemoryResource, config: ArenaConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            upstream,
            config,
            state: RefCell::new(ArenaState::default()),
        })
    }

    /// Create an arena with the given block size and default alignment.
    pub fn with_block_size(
        upstream: &'u dyn MemoryResource,
        block_size: usize,
    ) -> Result<Self, ConfigError> {
        Self::new(upstream, ArenaConfig::new(block_size))
    }

    /// The resource blocks are drawn from.
    pub fn upstream_resource(&self) -> &'u dyn MemoryResource {
        self.upstream
    }

    /// The configuration this arena was built with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Current usage figures.
    pub fn stats(&self) -> ArenaStats {
        let state = self.state.borrow();
        ArenaStats {
            blocks: state.blocks().count(),
            available_blocks: state.available.len(),
            bytes_reserved: state.blocks().map(MemoryBlock::size).sum(),
            bytes_allocated: state.bytes_allocated,
            upstream_allocations: state.upstream_allocations,
        }
    }

    /// Recycle every block without returning it upstream.
    ///
    /// All blocks move to the recycle list and the cursor restarts, so later
    /// allocations reuse the memory before asking upstream for more. Taking
    /// `&mut self` guarantees no allocator or container still borrows the
    /// arena.
    pub fn reset(&mut self) {
        let state = self.state.get_mut();
        if let Some(block) = state.current.take() {
            state.available.push(block);
        }
        let used = std::mem::take(&mut state.used);
        state.available.extend(used);
        state.cursor = 0;
        state.bytes_allocated = 0;
        debug!(
            available = state.available.len(),
            "arena reset, blocks kept for reuse"
        );
    }

    /// Return every owned block to the upstream and clear all state.
    ///
    /// Safe to call repeatedly; the arena stays usable and grows again on
    /// demand.
    pub fn release(&mut self) {
        let state = self.state.get_mut();
        let mut returned = 0usize;
        let mut bytes = 0usize;
        let blocks = state
            .current
            .take()
            .into_iter()
            .chain(state.used.drain(..))
            .chain(state.available.drain(..));
        for block in blocks {
            returned += 1;
            bytes += block.size();
            // SAFETY: every block was obtained from `self.upstream`, and
            // `&mut self` means no allocation from this arena is reachable.
            unsafe { block.give_back(self.upstream) };
        }
        state.cursor = 0;
        state.bytes_allocated = 0;
        if returned > 0 {
            debug!(blocks = returned, bytes, "arena released blocks upstream");
        }
    }

    fn obtain(&self, state: &mut ArenaState, size: usize, align: usize) -> Result<MemoryBlock, AllocError> {
        let block = MemoryBlock::obtain(self.upstream, size, align.max(self.config.block_align))
            .inspect_err(|err| warn!(size, align, %err, "upstream refused arena block"))?;
        state.upstream_allocations += 1;
        trace!(size, align = block.align(), "arena acquired block from upstream");
        Ok(block)
    }

    /// Obtain a `size`-byte block and locate `bytes` at `align` inside it.
    ///
    /// An upstream that hands back a block too misaligned to hold the request
    /// gets the request refused; the block itself is kept for recycling.
    fn obtain_fitting(
        &self,
        state: &mut ArenaState,
        size: usize,
        bytes: usize,
        align: usize,
    ) -> Result<(MemoryBlock, usize), AllocError> {
        let block = self.obtain(state, size, align)?;
        match block.fit(0, bytes, align) {
            Some(offset) => Ok((block, offset)),
            None => {
                warn!(size, bytes, align, "upstream block too misaligned for request");
                state.available.push(block);
                Err(AllocError::InvalidLayout { bytes, align })
            }
        }
    }
}

impl ArenaResource<'static> {
    /// Create an arena whose upstream is the current thread's
    /// [`default_resource`].
    pub fn with_default_upstream(config: ArenaConfig) -> Result<Self, ConfigError> {
        Self::new(default_resource(), config)
    }
}

impl Default for ArenaResource<'static> {
    fn default() -> Self {
        Self {
            upstream: default_resource(),
            config: ArenaConfig::default(),
            state: RefCell::new(ArenaState::default()),
        }
    }
}

impl MemoryResource for ArenaResource<'_> {
    fn allocate(&self, bytes: usize, align: usize) -> Result<NonNull<u8>, AllocError> {
        checked_layout(bytes, align)?;
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;

        if bytes > self.config.block_size {
            // Dedicated block; the current block stays available for
            // smaller requests.
            let (block, offset) = match state.take_recycled(bytes, align) {
                Some(found) => found,
                None => self.obtain_fitting(state, bytes, bytes, align)?,
            };
            trace!(bytes, "arena served oversized request from dedicated block");
            let ptr = block.at(offset);
            state.used.push(block);
            state.bytes_allocated += bytes;
            return Ok(ptr);
        }

        if let Some(block) = &state.current {
            if let Some(offset) = block.fit(state.cursor, bytes, align) {
                state.cursor = offset + bytes;
                state.bytes_allocated += bytes;
                return Ok(block.at(offset));
            }
        }

        if let Some(retired) = state.current.take() {
            state.used.push(retired);
        }
        state.cursor = 0;

        let (block, offset) = match state.take_recycled(bytes, align) {
            Some(found) => found,
            None => self.obtain_fitting(state, self.config.block_size, bytes, align)?,
        };
        let ptr = block.at(offset);
        state.cursor = offset + bytes;
        state.bytes_allocated += bytes;
        state.current = Some(block);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _bytes: usize, _align: usize) {}
}

impl Drop for ArenaResource<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for ArenaResource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaResource")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
