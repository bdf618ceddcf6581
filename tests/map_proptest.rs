use containment_map::{
    CacheConfig, CachedContainmentMap, ContainmentHashMap, ContainmentMap, ContainmentRelation,
    Resolution, UpwardRelation,
};
use proptest::prelude::*;
use std::collections::BTreeMap;

// Letter-set containment over strings of distinct letters from "abcd".
#[derive(Clone, Copy, Debug, Default)]
struct Letters;

impl ContainmentRelation<String> for Letters {
    fn contains(&self, container: &String, item: &String) -> bool {
        container.chars().all(|c| item.contains(c))
    }
}

impl UpwardRelation<String> for Letters {
    fn immediate_containers(&self, item: &String) -> Vec<String> {
        let chars: Vec<char> = item.chars().collect();
        let mut up = Vec::new();
        for i in 0..chars.len() {
            let mut fewer = chars.clone();
            fewer.remove(i);
            up.push(fewer.into_iter().collect());
        }
        for i in 1..chars.len() {
            let mut swapped = chars.clone();
            swapped.swap(i - 1, i);
            up.push(swapped.into_iter().collect());
        }
        up
    }
}

const ALPHABET: [char; 4] = ['a', 'b', 'c', 'd'];

// Every arrangement of every subset of the alphabet.
fn universe() -> Vec<String> {
    fn grow(prefix: &mut Vec<char>, out: &mut Vec<String>) {
        out.push(prefix.iter().collect());
        for c in ALPHABET {
            if !prefix.contains(&c) {
                prefix.push(c);
                grow(prefix, out);
                prefix.pop();
            }
        }
    }
    let mut out = Vec::new();
    grow(&mut Vec::new(), &mut out);
    out
}

fn arb_key() -> impl Strategy<Value = String> {
    proptest::sample::subsequence(ALPHABET.to_vec(), 0..=3)
        .prop_shuffle()
        .prop_map(|cs| cs.into_iter().collect())
}

// Distinct literal keys with small values, plus the same entries shuffled.
fn arb_entries() -> impl Strategy<Value = (Vec<(String, u8)>, Vec<(String, u8)>)> {
    proptest::collection::vec((arb_key(), 0u8..3), 0..8)
        .prop_map(|v| {
            let unique: BTreeMap<String, u8> = v.into_iter().collect();
            unique.into_iter().collect::<Vec<_>>()
        })
        .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
}

fn answers<M: ContainmentMap<String, u8>>(m: &M, keys: &[String]) -> Vec<Resolution<u8>> {
    keys.iter().map(|q| m.resolve(q).cloned()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    // Property: resolution depends only on the literal entries, not on the
    // order they were inserted in, and not on whether the cache is warm.
    #[test]
    fn prop_insertion_order_does_not_matter((forward, shuffled) in arb_entries()) {
        let keys = universe();
        let mut plain = ContainmentHashMap::new(Letters);
        plain.extend(forward);
        let mut cached = CachedContainmentMap::upward(Letters);
        cached.extend(shuffled);
        let expected = answers(&plain, &keys);
        prop_assert_eq!(answers(&cached, &keys), expected.clone());
        prop_assert_eq!(answers(&cached, &keys), expected);
    }

    // Property: after a warm-up over every key, inserting one more literal
    // never leaves a stale answer behind.
    #[test]
    fn prop_sound_under_insertion(
        (entries, _) in arb_entries(),
        extra in arb_key(),
        value in 0u8..3,
        cap in 1usize..40,
    ) {
        let keys = universe();
        let mut plain = ContainmentHashMap::new(Letters);
        let config = CacheConfig::default().with_capacity(cap);
        let mut rescan = CachedContainmentMap::with_config(Letters, config);
        let mut upward = CachedContainmentMap::upward_with_config(Letters, config);
        for (k, v) in entries {
            plain.put(k.clone(), v);
            rescan.put(k.clone(), v);
            upward.put(k, v);
        }
        answers(&rescan, &keys);
        answers(&upward, &keys);

        plain.put(extra.clone(), value);
        rescan.put(extra.clone(), value);
        upward.put(extra, value);
        let expected = answers(&plain, &keys);
        prop_assert_eq!(answers(&rescan, &keys), expected.clone());
        prop_assert_eq!(answers(&upward, &keys), expected);
    }

    // Property: two arrangements of the same letters are mutual peers; with
    // different values, both and everything below both are ambiguous.
    #[test]
    fn prop_peers_are_ambiguous(
        letters in proptest::sample::subsequence(ALPHABET.to_vec(), 2..=3),
    ) {
        let a: String = letters.iter().collect();
        let b: String = letters.iter().rev().collect();
        let missing = ALPHABET.iter().find(|c| !letters.contains(c)).unwrap();
        let below = format!("{}{}", b, missing);
        let mut m = CachedContainmentMap::upward(Letters);
        m.put(letters[..1].iter().collect::<String>(), 0u8);
        m.put(a.clone(), 1);
        m.put(b.clone(), 2);
        for q in [&a, &b, &below] {
            prop_assert_eq!(m.resolve(q), Resolution::Ambiguous);
        }
        m.put(b.clone(), 1);
        for q in [&a, &b, &below] {
            prop_assert_eq!(m.resolve(q), Resolution::Found(&1));
        }
    }
}
