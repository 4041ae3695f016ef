//! Property tests for the container layer.

use proptest::prelude::*;

use dictionary_rs::{DynList, LinkedList, PtrDynList};

/// One step of a random container workout.
#[derive(Clone, Debug)]
enum Op {
    Push(i32),
    Pop,
    Reserve(usize),
    Resize(usize),
    RemoveOrdered(usize),
    RemoveFast(usize),
    Shrink,
    Clear,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<i32>().prop_map(Op::Push),
        2 => Just(Op::Pop),
        1 => (0usize..200).prop_map(Op::Reserve),
        1 => (0usize..200).prop_map(Op::Resize),
        1 => (0usize..200).prop_map(Op::RemoveOrdered),
        1 => (0usize..200).prop_map(Op::RemoveFast),
        1 => Just(Op::Shrink),
        1 => Just(Op::Clear),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// `len <= capacity` after every operation, against a Vec oracle for
    /// content; `shrink_to_fit` re-establishes `capacity == len` exactly.
    #[test]
    fn dyn_list_capacity_invariant(ops in proptest::collection::vec(op_strategy(), 0..120)) {
        let mut list: DynList<i32> = DynList::new();
        let mut oracle: Vec<i32> = Vec::new();

        for op in ops {
            match op {
                Op::Push(v) => {
                    list.push(v);
                    oracle.push(v);
                }
                Op::Pop => {
                    if !oracle.is_empty() {
                        prop_assert_eq!(Some(list.pop()), oracle.pop());
                    }
                }
                Op::Reserve(n) => {
                    list.reserve(n);
                    prop_assert!(list.capacity() >= n);
                }
                Op::Resize(n) => {
                    list.resize(n);
                    oracle.resize(n, 0);
                }
                Op::RemoveOrdered(i) => {
                    if i < oracle.len() {
                        prop_assert_eq!(list.remove(i), oracle.remove(i));
                    }
                }
                Op::RemoveFast(i) => {
                    if i < oracle.len() {
                        prop_assert_eq!(list.swap_remove(i), oracle.swap_remove(i));
                    }
                }
                Op::Shrink => {
                    list.shrink_to_fit();
                    prop_assert_eq!(list.capacity(), list.len());
                }
                Op::Clear => {
                    list.clear();
                    oracle.clear();
                }
            }
            prop_assert!(list.len() <= list.capacity());
            prop_assert_eq!(list.as_slice(), oracle.as_slice());
        }
    }

    /// Doubling growth: capacity changes are logarithmic in element count.
    #[test]
    fn dyn_list_growth_is_logarithmic(n in 1usize..5000) {
        let mut list: DynList<usize> = DynList::new();
        let mut reallocs = 0usize;
        let mut last = 0usize;
        for i in 0..n {
            list.push(i);
            if list.capacity() != last {
                reallocs += 1;
                last = list.capacity();
            }
        }
        prop_assert!(reallocs <= 2 + n.ilog2() as usize);
    }

    /// squeeze_null keeps survivors in relative order and reports their
    /// count; the growable variant truncates to that count.
    #[test]
    fn squeeze_null_is_stable(mask in proptest::collection::vec(any::<bool>(), 0..64)) {
        let mut list: PtrDynList<usize> = PtrDynList::new();
        list.resize(mask.len());
        let mut expected = Vec::new();
        for (i, &occupied) in mask.iter().enumerate() {
            if occupied {
                list.set(i, Box::new(i));
                expected.push(i);
            }
        }

        let kept = list.squeeze_null();
        prop_assert_eq!(kept, expected.len());
        prop_assert_eq!(list.len(), expected.len());
        for (slot, want) in expected.iter().enumerate() {
            prop_assert_eq!(list.get(slot), Some(want));
        }
    }

    /// Append-all then iterate yields the input; insert-all yields its
    /// reverse; clear leaves an empty, reusable list.
    #[test]
    fn linked_list_round_trip(values in proptest::collection::vec(any::<i32>(), 0..64)) {
        let mut appended = LinkedList::new();
        let mut inserted = LinkedList::new();
        for &v in &values {
            appended.push_back(v);
            inserted.push_front(v);
        }

        let forward: Vec<i32> = appended.iter().copied().collect();
        prop_assert_eq!(&forward, &values);

        let mut reversed: Vec<i32> = inserted.iter().copied().collect();
        reversed.reverse();
        prop_assert_eq!(&reversed, &values);

        appended.clear();
        prop_assert_eq!(appended.len(), 0);
        appended.push_back(1);
        prop_assert_eq!(appended.len(), 1);
    }
}
