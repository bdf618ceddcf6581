#![cfg(test)]

// Property tests for CachedContainmentMap, checked step by step against the
// uncached ContainmentHashMap.

use crate::cached_map::CachedContainmentMap;
use crate::config::CacheConfig;
use crate::map::{ContainmentHashMap, ContainmentMap};
use crate::relation::{upward_fn, FnUpward};
use crate::upward::{MissStrategy, Rescan, Upward};
use proptest::prelude::*;

// (mask, tag): a contains b when a's mask bits are a subset of b's. The tag is
// ignored, so (m, 0) and (m, 1) are mutual peers.
type Key = (u8, u8);
type Contains = fn(&Key, &Key) -> bool;
type Immediate = fn(&Key) -> Vec<Key>;
type Rel = FnUpward<Contains, Immediate>;

const BITS: u8 = 4;

fn contains(a: &Key, b: &Key) -> bool {
    a.0 & b.0 == a.0
}

fn immediate(x: &Key) -> Vec<Key> {
    let mut up: Vec<Key> = (0..BITS)
        .filter(|i| x.0 & (1 << i) != 0)
        .flat_map(|i| [(x.0 & !(1 << i), 0), (x.0 & !(1 << i), 1)])
        .collect();
    up.push((x.0, 1 - x.1));
    up
}

fn rel() -> Rel {
    upward_fn(contains as Contains, immediate as Immediate)
}

#[derive(Clone, Debug)]
enum Op {
    Put(Key, u8),
    PutIfNotAmbiguous(Key, u8),
    Remove(Key),
    RemoveLiteral(Key),
    Resolve(Key),
    ResolveWithin(Key, Key),
    Forget(Key),
    ClearCache,
}

fn arb_key() -> impl Strategy<Value = Key> {
    (0u8..(1 << BITS), 0u8..2)
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    // Few distinct values so that equal-valued peers show up often.
    let op = prop_oneof![
        3 => (arb_key(), 0u8..3).prop_map(|(k, v)| Op::Put(k, v)),
        2 => (arb_key(), 0u8..3).prop_map(|(k, v)| Op::PutIfNotAmbiguous(k, v)),
        1 => arb_key().prop_map(Op::Remove),
        1 => arb_key().prop_map(Op::RemoveLiteral),
        5 => arb_key().prop_map(Op::Resolve),
        2 => (arb_key(), arb_key()).prop_map(|(s, q)| Op::ResolveWithin(s, q)),
        1 => arb_key().prop_map(Op::Forget),
        1 => Just(Op::ClearCache),
    ];
    proptest::collection::vec(op, 1..80)
}

fn check<P>(
    mut sut: CachedContainmentMap<Key, u8, Rel, P>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError>
where
    P: MissStrategy<Key, Rel>,
{
    let mut model: ContainmentHashMap<Key, u8, Contains> =
        ContainmentHashMap::new(contains as Contains);
    let capacity = sut.config().capacity;
    for op in ops {
        match op {
            Op::Put(k, v) => {
                prop_assert_eq!(sut.put(k, v), model.put(k, v));
            }
            Op::PutIfNotAmbiguous(k, v) => {
                prop_assert_eq!(
                    sut.put_if_not_ambiguous(k, v),
                    model.put_if_not_ambiguous(k, v)
                );
            }
            Op::Remove(k) => {
                prop_assert_eq!(sut.remove(&k), model.remove(&k));
            }
            Op::RemoveLiteral(k) => {
                prop_assert_eq!(sut.remove_literal(&k), model.remove_literal(&k));
            }
            Op::Resolve(q) => {
                prop_assert_eq!(sut.resolve(&q), model.resolve(&q), "query {:?}", q);
            }
            Op::ResolveWithin(s, q) => {
                prop_assert_eq!(
                    sut.resolve_within(Some(&s), &q),
                    model.resolve_within(Some(&s), &q),
                    "query {:?} within {:?}",
                    q,
                    s
                );
            }
            Op::Forget(q) => {
                sut.forget(&q);
            }
            Op::ClearCache => sut.clear_cache(),
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert!(sut.cache_len() <= capacity);
    }
    // Every query key agrees at the end, cached or not.
    for m in 0..(1u8 << BITS) {
        for t in 0..2 {
            let q = (m, t);
            prop_assert_eq!(sut.resolve(&q), model.resolve(&q), "final query {:?}", q);
        }
    }
    Ok(())
}

// Property: the cached map answers exactly like the uncached one under any
// interleaving of inserts, guarded inserts, removals, scoped and unscoped
// lookups, and cache eviction. Capacities are tiny so CLOCK eviction
// runs constantly.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn prop_rescan_matches_uncached(cap in 0usize..6, ops in arb_ops()) {
        let config = CacheConfig::default().with_capacity(cap);
        let sut: CachedContainmentMap<Key, u8, Rel, Rescan> =
            CachedContainmentMap::with_config(rel(), config);
        check(sut, ops)?;
    }

    #[test]
    fn prop_upward_matches_uncached(cap in 0usize..6, ops in arb_ops()) {
        let config = CacheConfig::default().with_capacity(cap);
        let sut: CachedContainmentMap<Key, u8, Rel, Upward> =
            CachedContainmentMap::upward_with_config(rel(), config);
        check(sut, ops)?;
    }

    #[test]
    fn prop_upward_with_large_cache_matches_uncached(ops in arb_ops()) {
        check(CachedContainmentMap::upward(rel()), ops)?;
    }
}
