//! Arena configuration parameters.

use crate::error::ConfigError;
use crate::raw::MAX_ALIGN;

/// Configuration for an [`ArenaResource`](crate::ArenaResource).
///
/// Controls how much memory the arena requests from its upstream resource
/// at a time. Validated at construction; immutable afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Size of each shared block in bytes.
    ///
    /// Default: 262_144 (256KiB). Requests larger than this bypass the bump
    /// cursor and receive a dedicated upstream block of exactly their size.
    /// Must be non-zero.
    pub block_size: usize,

    /// Minimum alignment requested from upstream for every block.
    ///
    /// Default: 16, the strictest fundamental alignment on mainstream
    /// 64-bit targets. Must be a power of two.
    pub block_align: usize,
}

impl ArenaConfig {
    /// Default block size: 256KiB.
    pub const DEFAULT_BLOCK_SIZE: usize = 256 * 1024;

    /// Default block alignment.
    pub const DEFAULT_BLOCK_ALIGN: usize = MAX_ALIGN;

    /// Create a config with the given block size and the default alignment.
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size,
            block_align: Self::DEFAULT_BLOCK_ALIGN,
        }
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_size == 0 {
            return Err(ConfigError::ZeroBlockSize);
        }
        if !self.block_align.is_power_of_two() {
            return Err(ConfigError::InvalidBlockAlign {
                align: self.block_align,
            });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BLOCK_SIZE)
    }
}
