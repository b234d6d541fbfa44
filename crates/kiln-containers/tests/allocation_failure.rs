//! Containers keep their contents when the resource refuses to grow them.

use kiln_containers::{InlinedVec, PmrVec};
use kiln_memory::{AllocError, TypedAllocator};
use kiln_test_utils::{init_tracing, CountingResource};

#[test]
fn failed_spill_leaves_inlined_vec_inline() {
    init_tracing();
    let counting = CountingResource::new();
    let mut v = InlinedVec::<u32, 2>::new_in(TypedAllocator::new(&counting));
    v.push(1);
    v.push(2);

    counting.fail_after(0);
    assert!(matches!(v.try_push(3), Err(AllocError::OutOfMemory { .. })));
    assert!(matches!(v.try_reserve(10), Err(AllocError::OutOfMemory { .. })));
    assert!(v.is_inline());
    assert_eq!(v.capacity(), 2);
    assert_eq!(v, [1, 2]);
    assert_eq!(counting.allocations(), 0);

    counting.never_fail();
    v.push(3);
    assert!(!v.is_inline());
    assert_eq!(v, [1, 2, 3]);
    drop(v);
    counting.assert_all_released();
}

#[test]
fn failed_regrowth_keeps_the_old_heap_buffer() {
    let counting = CountingResource::new();
    let mut v = PmrVec::<u64>::new_in(TypedAllocator::new(&counting));
    v.extend([10, 20, 30, 40]);
    let buffer = v.as_ptr();
    assert_eq!(counting.allocations(), 1);

    counting.fail_after(0);
    assert!(v.try_push(50).is_err());
    assert_eq!(v.as_ptr(), buffer);
    assert_eq!(v.capacity(), 4);
    assert_eq!(v.as_slice(), [10, 20, 30, 40]);
    assert_eq!(counting.live_blocks(), 1);

    counting.never_fail();
    v.push(50);
    assert_eq!(v.as_slice(), [10, 20, 30, 40, 50]);
    drop(v);
    counting.assert_all_released();
}

#[test]
fn raw_bytes_round_trip_through_typed_allocator() {
    let counting = CountingResource::new();
    let alloc = TypedAllocator::<u8>::new(&counting);
    let p = alloc.allocate_bytes(24, 8).unwrap();
    assert_eq!(p.as_ptr() as usize % 8, 0);
    assert!(counting.owns(p.as_ptr()));
    unsafe {
        for i in 0..24u8 {
            p.as_ptr().add(usize::from(i)).write(i);
        }
        assert_eq!(p.as_ptr().add(23).read(), 23);
        alloc.deallocate_bytes(p, 24, 8);
    }
    assert_eq!(counting.deallocations(), 1);
    counting.assert_all_released();
}
