//! Allocation and configuration error types.

use std::error::Error;
use std::fmt;

/// Errors returned by [`MemoryResource::allocate`](crate::MemoryResource::allocate)
/// and everything layered on top of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// The resource (or its upstream) could not satisfy the request.
    OutOfMemory {
        /// Number of bytes requested.
        bytes: usize,
        /// Requested alignment in bytes.
        align: usize,
    },
    /// The request does not describe a valid layout: the alignment is not a
    /// power of two, or the size overflows when rounded up to it.
    InvalidLayout {
        /// Number of bytes requested.
        bytes: usize,
        /// Requested alignment in bytes.
        align: usize,
    },
}

impl AllocError {
    /// Number of bytes in the failed request.
    pub fn bytes(&self) -> usize {
        match *self {
            Self::OutOfMemory { bytes, .. } | Self::InvalidLayout { bytes, .. } => bytes,
        }
    }

    /// Alignment of the failed request.
    pub fn align(&self) -> usize {
        match *self {
            Self::OutOfMemory { align, .. } | Self::InvalidLayout { align, .. } => align,
        }
    }
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { bytes, align } => {
                write!(
                    f,
                    "out of memory: requested {bytes} bytes aligned to {align}"
                )
            }
            Self::InvalidLayout { bytes, align } => {
                write!(f, "invalid layout: {bytes} bytes aligned to {align}")
            }
        }
    }
}

impl Error for AllocError {}

/// Errors detected when validating an [`ArenaConfig`](crate::ArenaConfig).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `block_size` was zero.
    ZeroBlockSize,
    /// `block_align` was zero or not a power of two.
    InvalidBlockAlign {
        /// The rejected alignment.
        align: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroBlockSize => write!(f, "arena block size must be non-zero"),
            Self::InvalidBlockAlign { align } => {
                write!(f, "arena block alignment {align} is not a power of two")
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_cover_both_variants() {
        let oom = AllocError::OutOfMemory { bytes: 64, align: 8 };
        let bad = AllocError::InvalidLayout { bytes: 3, align: 3 };
        assert_eq!((oom.bytes(), oom.align()), (64, 8));
        assert_eq!((bad.bytes(), bad.align()), (3, 3));
    }

    #[test]
    fn display_mentions_request() {
        let msg = AllocError::OutOfMemory {
            bytes: 4096,
            align: 16,
        }
        .to_string();
        assert!(msg.contains("4096"));
        assert!(msg.contains("16"));
        assert_eq!(
            ConfigError::InvalidBlockAlign { align: 12 }.to_string(),
            "arena block alignment 12 is not a power of two"
        );
    }
}
