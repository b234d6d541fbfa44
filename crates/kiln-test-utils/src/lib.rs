//! Test utilities and instrumented types for kiln development.
//!
//! Provides [`CountingResource`], a [`MemoryResource`] wrapper that records
//! every live allocation and panics on mismatched or repeated frees, the
//! [`Tracked`]/[`Tally`] pair for observing clones and drops inside
//! containers, and [`init_tracing`] for seeing the crates' log output from
//! a test.

#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod counting;
pub mod fixtures;

pub use counting::{CountingResource, LiveBlock};
pub use fixtures::{track, Tally, Tracked};

use tracing_subscriber::EnvFilter;

/// Route `tracing` output to the test harness.
///
/// Honours `RUST_LOG`, defaulting to `kiln_memory=debug,kiln_containers=debug`.
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("kiln_memory=debug,kiln_containers=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .compact()
        .try_init()
        .ok();
}
