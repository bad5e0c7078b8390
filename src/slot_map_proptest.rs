#![cfg(test)]

// Property tests for SlotMap kept inside the crate so they can check the
// private slot-table invariants after every operation.

use crate::key::{DefaultKey, Key};
use crate::slot_map::SlotMap;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

// Operations refer to live entries by an index into the list of live keys
// (taken modulo its length), which keeps shrinking effective.
#[derive(Clone, Debug)]
enum Op {
    Insert(i32),
    Emplace(i32),
    Erase(usize),
    TryErase(usize),
    Pop(usize),
    TryPopStale(usize),
    EraseAt(usize),
    Find(usize),
    Mutate(usize, i32),
    Retain(i32),
    Clear,
    Iterate,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<i32>().prop_map(Op::Insert),
        1 => any::<i32>().prop_map(Op::Emplace),
        2 => any::<usize>().prop_map(Op::Erase),
        1 => any::<usize>().prop_map(Op::TryErase),
        2 => any::<usize>().prop_map(Op::Pop),
        1 => any::<usize>().prop_map(Op::TryPopStale),
        1 => any::<usize>().prop_map(Op::EraseAt),
        2 => any::<usize>().prop_map(Op::Find),
        1 => (any::<usize>(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
        1 => (2..5i32).prop_map(Op::Retain),
        1 => Just(Op::Clear),
        1 => Just(Op::Iterate),
    ]
}

fn pick(live: &[DefaultKey], i: usize) -> Option<DefaultKey> {
    if live.is_empty() {
        None
    } else {
        Some(live[i % live.len()])
    }
}

// Property: state-machine equivalence against a BTreeMap keyed by the
// issued keys. Invariants exercised across random operation sequences:
// - Every issued key is fresh: it never equals any key issued before.
// - Live keys resolve to the model's value; stale keys never resolve.
// - `len` equals the number of keys not yet removed.
// - keys()/values() are permutations of the live key/value sets with
//   positional correspondence.
// - The slot table, free list and dense arrays stay mutually consistent.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(ops in proptest::collection::vec(arb_op(), 1..120)) {
        let mut sut: SlotMap<i32> = SlotMap::new();
        let mut model: BTreeMap<DefaultKey, i32> = BTreeMap::new();
        let mut issued: BTreeSet<DefaultKey> = BTreeSet::new();
        let mut stale: Vec<DefaultKey> = Vec::new();

        for op in ops {
            let live: Vec<DefaultKey> = model.keys().copied().collect();
            match op {
                Op::Insert(v) => {
                    let k = sut.insert(v);
                    prop_assert!(issued.insert(k), "key {:?} issued twice", k);
                    model.insert(k, v);
                }
                Op::Emplace(v) => {
                    let (k, r) = sut.emplace(v);
                    prop_assert_eq!(*r, v);
                    prop_assert!(issued.insert(k));
                    model.insert(k, v);
                }
                Op::Erase(i) => {
                    if let Some(k) = pick(&live, i) {
                        sut.erase(k);
                        model.remove(&k);
                        stale.push(k);
                    }
                }
                Op::TryErase(i) => {
                    match pick(&live, i) {
                        Some(k) => {
                            prop_assert!(sut.try_erase(k));
                            prop_assert!(!sut.try_erase(k));
                            model.remove(&k);
                            stale.push(k);
                        }
                        None => {
                            if let Some(&s) = stale.last() {
                                prop_assert!(!sut.try_erase(s));
                            }
                        }
                    }
                }
                Op::Pop(i) => {
                    if let Some(k) = pick(&live, i) {
                        let expected = sut.get(k).copied();
                        let v = sut.pop(k);
                        prop_assert_eq!(Some(v), expected);
                        prop_assert_eq!(model.remove(&k), Some(v));
                        stale.push(k);
                    }
                }
                Op::TryPopStale(i) => {
                    if !stale.is_empty() {
                        let s = stale[i % stale.len()];
                        prop_assert_eq!(sut.try_pop(s), None);
                    }
                }
                Op::EraseAt(i) => {
                    if !sut.is_empty() {
                        let p = i % sut.len();
                        let (k, _) = sut.get_at(p).unwrap();
                        let next = sut.erase_at(p);
                        prop_assert_eq!(next, p);
                        model.remove(&k);
                        stale.push(k);
                    }
                }
                Op::Find(i) => {
                    if let Some(k) = pick(&live, i) {
                        let p = sut.find(k);
                        prop_assert!(p.is_some());
                        let (pk, pv) = sut.get_at(p.unwrap()).unwrap();
                        prop_assert_eq!(pk, k);
                        prop_assert_eq!(Some(pv), model.get(&k));
                    }
                }
                Op::Mutate(i, d) => {
                    if let Some(k) = pick(&live, i) {
                        let v = sut.get_mut(k).expect("live key resolves");
                        *v = v.wrapping_add(d);
                        let mv = model.get_mut(&k).unwrap();
                        *mv = mv.wrapping_add(d);
                    }
                }
                Op::Retain(m) => {
                    sut.retain(|_, v| *v % m != 0);
                    let dropped: Vec<DefaultKey> = model
                        .iter()
                        .filter(|(_, v)| **v % m == 0)
                        .map(|(k, _)| *k)
                        .collect();
                    for k in dropped {
                        model.remove(&k);
                        stale.push(k);
                    }
                }
                Op::Clear => {
                    stale.extend(model.keys().copied());
                    model.clear();
                    sut.clear();
                }
                Op::Iterate => {
                    let pairs: BTreeMap<DefaultKey, i32> =
                        sut.iter().map(|(k, v)| (k, *v)).collect();
                    prop_assert_eq!(&pairs, &model);
                    prop_assert_eq!(sut.iter().len(), sut.len());
                    let rev: Vec<DefaultKey> = sut.iter().rev().map(|(k, _)| k).collect();
                    let mut fwd: Vec<DefaultKey> = sut.keys().to_vec();
                    fwd.reverse();
                    prop_assert_eq!(rev, fwd);
                }
            }

            // Post-conditions after each op
            // 1) Stale keys never resolve, null included.
            for &s in &stale {
                prop_assert!(sut.get(s).is_none());
                prop_assert!(!sut.contains_key(s));
            }
            prop_assert!(sut.find(DefaultKey::null()).is_none());
            // 2) Size parity.
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
            // 3) Dense views match the model positionally.
            for (k, v) in sut.keys().iter().zip(sut.values()) {
                prop_assert_eq!(model.get(k), Some(v));
            }
            // 4) Structural invariants.
            sut.assert_consistent();
        }
    }
}

// Property: erasing through positions visits each entry exactly once, both
// forward (re-using the returned position) and backward from the end.
proptest! {
    #[test]
    fn prop_positional_erase_visits_all(
        values in proptest::collection::vec(any::<u16>(), 0..64),
        churn in proptest::collection::vec(any::<usize>(), 0..16),
        backward in any::<bool>(),
    ) {
        let mut sut: SlotMap<u16> = SlotMap::new();
        let mut keys: Vec<DefaultKey> = values.iter().map(|&v| sut.insert(v)).collect();
        // Shuffle dense order with some erase/reinsert churn first.
        for c in churn {
            if keys.is_empty() {
                break;
            }
            let k = keys.swap_remove(c % keys.len());
            let v = sut.pop(k);
            keys.push(sut.insert(v));
        }

        let expected: BTreeSet<DefaultKey> = keys.iter().copied().collect();
        let mut visited: BTreeSet<DefaultKey> = BTreeSet::new();
        if backward {
            while !sut.is_empty() {
                let p = sut.len() - 1;
                let (k, _) = sut.pop_at(p);
                prop_assert!(visited.insert(k));
            }
        } else {
            let mut p = 0;
            while p < sut.len() {
                let (k, _) = sut.get_at(p).unwrap();
                prop_assert!(visited.insert(k));
                p = sut.erase_at(p);
            }
        }
        prop_assert!(sut.is_empty());
        prop_assert_eq!(visited, expected);
        sut.assert_consistent();
    }
}
