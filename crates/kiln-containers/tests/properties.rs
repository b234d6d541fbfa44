//! `InlinedVec` behaves like `Vec` under arbitrary edit sequences.

use kiln_containers::InlinedVec;
use kiln_memory::TypedAllocator;
use kiln_test_utils::CountingResource;
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Push(i32),
    Pop,
    Insert(usize, i32),
    Erase(usize),
    EraseRange(usize, usize),
    Resize(usize, i32),
    Truncate(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<i32>().prop_map(Op::Push),
        1 => Just(Op::Pop),
        2 => (any::<usize>(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
        2 => any::<usize>().prop_map(Op::Erase),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::EraseRange(a, b)),
        1 => (0usize..40, any::<i32>()).prop_map(|(n, v)| Op::Resize(n, v)),
        1 => (0usize..40).prop_map(Op::Truncate),
    ]
}

proptest! {
    #[test]
    fn matches_vec(ops in prop::collection::vec(op(), 0..200)) {
        let counting = CountingResource::new();
        let mut model: Vec<i32> = Vec::new();
        let mut v = InlinedVec::<i32, 5>::new_in(TypedAllocator::new(&counting));
        for op in ops {
            match op {
                Op::Push(x) => {
                    model.push(x);
                    v.push(x);
                }
                Op::Pop => {
                    prop_assert_eq!(v.pop(), model.pop());
                }
                Op::Insert(i, x) => {
                    let i = i % (model.len() + 1);
                    model.insert(i, x);
                    v.insert(i, x);
                }
                Op::Erase(i) => {
                    if !model.is_empty() {
                        let i = i % model.len();
                        prop_assert_eq!(v.erase(i), model.remove(i));
                    }
                }
                Op::EraseRange(a, b) => {
                    let len = model.len() + 1;
                    let (a, b) = (a % len, b % len);
                    let (start, end) = (a.min(b), a.max(b));
                    let _ = model.drain(start..end);
                    v.erase_range(start..end);
                }
                Op::Resize(n, x) => {
                    model.resize(n, x);
                    v.resize_with_value(n, x);
                }
                Op::Truncate(n) => {
                    model.truncate(n);
                    v.truncate(n);
                }
            }
            prop_assert_eq!(v.as_slice(), model.as_slice());
            prop_assert!(v.capacity() >= v.len());
            prop_assert_eq!(v.is_inline(), counting.live_blocks() == 0);
        }
        drop(v);
        counting.assert_all_released();
    }

    #[test]
    fn no_allocation_until_inline_capacity_is_exceeded(n in 0usize..=16) {
        let counting = CountingResource::new();
        let mut v = InlinedVec::<u8, 8>::new_in(TypedAllocator::new(&counting));
        for i in 0..n {
            v.push(i as u8);
        }
        prop_assert_eq!(counting.allocations(), u64::from(n > 8));
        prop_assert!(v.iter().copied().eq(0..n as u8));
    }
}
