#![allow(unsafe_code)]

use std::cell::RefCell;
use std::fmt;
use std::ptr::NonNull;

use indexmap::IndexMap;
use kiln_memory::{system_resource, AllocError, MemoryResource};

/// Size and alignment of an allocation that has not been returned yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiveBlock {
    pub bytes: usize,
    pub align: usize,
}

#[derive(Default)]
struct Ledger {
    /// Live allocations by address, in allocation order.
    live: IndexMap<usize, LiveBlock>,
    allocations: u64,
    deallocations: u64,
    live_bytes: usize,
    peak_bytes: usize,
    remaining: Option<u64>,
}

/// A [`MemoryResource`] that forwards to an upstream and keeps books.
///
/// Every successful allocation is recorded until it is deallocated.
/// Deallocating a pointer that is not live, or with a different size or
/// alignment than it was allocated with, panics. Zero-byte requests are
/// counted but not tracked, since their pointers are not unique.
pub struct CountingResource<'u> {
    upstream: &'u dyn MemoryResource,
    ledger: RefCell<Ledger>,
}

impl CountingResource<'static> {
    /// Count allocations served by the system resource.
    pub fn new() -> Self {
        Self::over(system_resource())
    }
}

impl Default for CountingResource<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'u> CountingResource<'u> {
    /// Count allocations served by `upstream`.
    pub fn over(upstream: &'u dyn MemoryResource) -> Self {
        Self {
            upstream,
            ledger: RefCell::default(),
        }
    }

    /// Succeed `n` more times, then report out-of-memory for every later
    /// request.
    pub fn fail_after(&self, n: u64) {
        self.ledger.borrow_mut().remaining = Some(n);
    }

    /// Stop injecting failures.
    pub fn never_fail(&self) {
        self.ledger.borrow_mut().remaining = None;
    }

    /// Successful allocations so far.
    pub fn allocations(&self) -> u64 {
        self.ledger.borrow().allocations
    }

    /// Deallocations so far.
    pub fn deallocations(&self) -> u64 {
        self.ledger.borrow().deallocations
    }

    /// Number of tracked allocations not yet returned.
    pub fn live_blocks(&self) -> usize {
        self.ledger.borrow().live.len()
    }

    /// Bytes currently out on loan.
    pub fn live_bytes(&self) -> usize {
        self.ledger.borrow().live_bytes
    }

    /// High-water mark of [`live_bytes`](Self::live_bytes).
    pub fn peak_bytes(&self) -> usize {
        self.ledger.borrow().peak_bytes
    }

    /// Live allocations in the order they were made.
    pub fn live(&self) -> Vec<LiveBlock> {
        self.ledger.borrow().live.values().copied().collect()
    }

    /// Whether `ptr` is a live allocation of this resource.
    pub fn owns(&self, ptr: *const u8) -> bool {
        self.ledger.borrow().live.contains_key(&ptr.addr())
    }

    /// Panic unless every allocation has been returned.
    #[track_caller]
    pub fn assert_all_released(&self) {
        let ledger = self.ledger.borrow();
        assert!(
            ledger.live.is_empty(),
            "{} allocation(s) still live: {:?}",
            ledger.live.len(),
            ledger.live.values().collect::<Vec<_>>()
        );
    }
}

impl MemoryResource for CountingResource<'_> {
    fn allocate(&self, bytes: usize, align: usize) -> Result<NonNull<u8>, AllocError> {
        let mut ledger = self.ledger.borrow_mut();
        if let Some(remaining) = ledger.remaining.as_mut() {
            if *remaining == 0 {
                return Err(AllocError::OutOfMemory { bytes, align });
            }
            *remaining -= 1;
        }
        let ptr = self.upstream.allocate(bytes, align)?;
        ledger.allocations += 1;
        if bytes > 0 {
            let previous = ledger
                .live
                .insert(ptr.as_ptr().addr(), LiveBlock { bytes, align });
            assert!(previous.is_none(), "upstream handed out {ptr:p} twice");
            ledger.live_bytes += bytes;
            ledger.peak_bytes = ledger.peak_bytes.max(ledger.live_bytes);
        }
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, bytes: usize, align: usize) {
        {
            let mut ledger = self.ledger.borrow_mut();
            ledger.deallocations += 1;
            if bytes > 0 {
                match ledger.live.shift_remove(&ptr.as_ptr().addr()) {
                    Some(block) => assert_eq!(
                        block,
                        LiveBlock { bytes, align },
                        "{ptr:p} freed with a different layout than it was allocated with"
                    ),
                    None => panic!("{ptr:p} is not a live allocation (double free?)"),
                }
                ledger.live_bytes -= bytes;
            }
        }
        // SAFETY: the ledger confirmed the triple matches a live allocation
        // made through `upstream`.
        unsafe { self.upstream.deallocate(ptr, bytes, align) }
    }
}

impl fmt::Debug for CountingResource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ledger = self.ledger.borrow();
        f.debug_struct("CountingResource")
            .field("allocations", &ledger.allocations)
            .field("deallocations", &ledger.deallocations)
            .field("live_blocks", &ledger.live.len())
            .field("live_bytes", &ledger.live_bytes)
            .finish()
    }
}
