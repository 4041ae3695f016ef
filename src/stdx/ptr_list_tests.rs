//! Unit tests for the pointer-array family: ownership transfer, null-slot
//! compaction, permutations, and the growable variant's capacity duality.

use super::{PtrDynList, PtrList, RefList};

#[test]
fn set_returns_previous_occupant() {
    let mut list: PtrList<String> = PtrList::with_len(3);
    assert!(list.set(0, Box::new("a".to_string())).is_none());

    let old = list.set(0, Box::new("b".to_string()));
    assert_eq!(old.as_deref().map(String::as_str), Some("a"));
    assert_eq!(list[0], "b");
}

#[test]
fn take_leaves_slot_null() {
    let mut list: PtrList<i32> = PtrList::with_len(2);
    list.set(1, Box::new(42));

    let taken = list.take(1);
    assert_eq!(taken.as_deref(), Some(&42));
    assert!(!list.is_set(1));
    assert!(list.take(1).is_none());
}

#[test]
fn get_is_null_safe_index_is_not() {
    let mut list: PtrList<i32> = PtrList::with_len(2);
    list.set(0, Box::new(1));
    assert_eq!(list.get(0), Some(&1));
    assert_eq!(list.get(1), None);
    assert_eq!(list.get(7), None);
}

#[test]
#[should_panic(expected = "null or out-of-range slot at index 1")]
fn index_null_slot_panics_with_index() {
    let mut list: PtrList<i32> = PtrList::with_len(2);
    list.set(0, Box::new(1));
    let _ = list[1];
}

#[test]
fn squeeze_null_preserves_relative_order() {
    let mut list: PtrList<i32> = PtrList::with_len(6);
    list.set(1, Box::new(10));
    list.set(3, Box::new(20));
    list.set(4, Box::new(30));

    let kept = list.squeeze_null();
    assert_eq!(kept, 3);
    assert_eq!(list.len(), 6); // fixed-length variant keeps its length
    assert_eq!(list.get(0), Some(&10));
    assert_eq!(list.get(1), Some(&20));
    assert_eq!(list.get(2), Some(&30));
    assert!(!list.is_set(3));
}

#[test]
fn reorder_applies_old_to_new_mapping() {
    let mut list: PtrList<i32> = (0..4).collect();
    // Element at i moves to position old_to_new[i].
    list.reorder(&[2, 0, 3, 1]);
    assert_eq!(list[2], 0);
    assert_eq!(list[0], 1);
    assert_eq!(list[3], 2);
    assert_eq!(list[1], 3);
}

#[test]
fn sort_order_applies_new_to_old_mapping() {
    let mut list: PtrList<i32> = vec![10, 20, 30].into_iter().collect();
    // Slot i receives the element previously at new_to_old[i].
    list.sort_order(&[2, 0, 1]);
    assert_eq!(list[0], 30);
    assert_eq!(list[1], 10);
    assert_eq!(list[2], 20);
}

#[test]
#[should_panic(expected = "permutation length")]
fn reorder_length_mismatch_panics() {
    let mut list: PtrList<i32> = (0..3).collect();
    list.reorder(&[0, 1]);
}

#[test]
#[should_panic(expected = "check_nonnull: null slot at index 1")]
fn check_nonnull_names_first_hole() {
    let mut list: PtrList<i32> = PtrList::with_len(3);
    list.set(0, Box::new(1));
    list.set(2, Box::new(3));
    list.check_nonnull();
}

#[test]
fn clone_deep_copies_occupied_slots() {
    let mut list: PtrList<Vec<i32>> = PtrList::with_len(2);
    list.set(0, Box::new(vec![1, 2]));

    let mut copy = list.clone();
    copy.get_mut(0).unwrap().push(3);

    assert_eq!(list[0], vec![1, 2]);
    assert_eq!(copy[0], vec![1, 2, 3]);
}

#[test]
fn dyn_variant_tracks_capacity_like_dyn_list() {
    let mut list: PtrDynList<i32> = PtrDynList::new();
    assert_eq!(list.capacity(), 0);

    for i in 0..20 {
        list.push(Box::new(i));
        assert!(list.len() <= list.capacity());
    }
    assert_eq!(list.len(), 20);

    list.resize(5);
    assert_eq!(list.len(), 5);
    assert!(list.capacity() >= 20);

    list.shrink_to_fit();
    assert_eq!(list.capacity(), 5);
}

#[test]
fn dyn_variant_expand_storage_exposes_null_slots() {
    let mut list: PtrDynList<i32> = PtrDynList::with_capacity(8);
    list.push(Box::new(1));
    list.expand_storage();
    assert_eq!(list.len(), 8);
    assert_eq!(list.get(0), Some(&1));
    assert!(!list.is_set(7));
}

#[test]
fn dyn_variant_pop_returns_slot_content() {
    let mut list: PtrDynList<i32> = PtrDynList::new();
    list.push(Box::new(1));
    list.resize(2); // trailing null slot

    assert!(list.pop().is_none());
    assert_eq!(list.pop().as_deref(), Some(&1));
    assert!(list.is_empty());
}

#[test]
#[should_panic(expected = "pop: list is empty")]
fn dyn_variant_pop_empty_panics() {
    let mut list: PtrDynList<i32> = PtrDynList::new();
    let _ = list.pop();
}

#[test]
fn dyn_variant_squeeze_null_truncates() {
    let mut list: PtrDynList<i32> = PtrDynList::new();
    list.resize(5);
    list.set(1, Box::new(10));
    list.set(4, Box::new(20));

    let kept = list.squeeze_null();
    assert_eq!(kept, 2);
    assert_eq!(list.len(), 2); // growable variant truncates
    assert_eq!(list[0], 10);
    assert_eq!(list[1], 20);
}

#[test]
fn dyn_variant_emplace_returns_borrow() {
    let mut list: PtrDynList<String> = PtrDynList::new();
    list.emplace("hi".to_string()).push('!');
    assert_eq!(list[0], "hi!");
}

#[test]
fn ref_list_views_do_not_own() {
    let owned = [1, 2, 3];
    let mut views: RefList<'_, i32> = owned.iter().collect();
    assert_eq!(views.len(), 3);
    assert_eq!(views[1], 2);

    views.sort_order(&[2, 1, 0]);
    assert_eq!(views[0], 3);
    assert_eq!(views[2], 1);

    let prev = views.set(0, &owned[0]);
    assert_eq!(prev, Some(&3));
}

#[test]
fn ref_list_squeeze_null() {
    let owned = [7, 8];
    let mut views: RefList<'_, i32> = RefList::with_len(4);
    views.set(1, &owned[0]);
    views.set(3, &owned[1]);

    assert_eq!(views.squeeze_null(), 2);
    assert_eq!(views.get(0), Some(&7));
    assert_eq!(views.get(1), Some(&8));
}
