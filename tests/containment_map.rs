// Containment map integration suite.
//
// Every scenario runs against the uncached map, the cached map with both
// miss strategies, and a cached map small enough to evict constantly. The
// invariants exercised:
// - Nearest cover: a query resolves to the most specific literal covering it.
// - Peers: mutually containing literals with different values are ambiguous
//   for themselves and for everything below both.
// - Soundness: a warm cache never hides a newly inserted, more specific
//   literal, and never serves an answer naming a removed literal.
// - Rollback: a rejected `put_if_not_ambiguous` leaves no trace.
use containment_map::{
    CacheConfig, CachedContainmentMap, ContainmentHashMap, ContainmentMap, ContainmentRelation,
    PathPrefix, Resolution, UpwardRelation,
};

/// `a` contains `b` when every letter of `a` occurs in `b`. Keys are strings
/// of distinct letters, so "mab" and "mba" contain each other and each string
/// has finitely many containers.
#[derive(Clone, Copy, Debug, Default)]
struct Letters;

impl ContainmentRelation<String> for Letters {
    fn contains(&self, container: &String, item: &String) -> bool {
        container.chars().all(|c| item.contains(c))
    }
}

impl UpwardRelation<String> for Letters {
    // Drop one letter, or swap two neighbors; together these reach every
    // arrangement of every subset of the letters.
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

fn s(x: &str) -> String {
    x.to_string()
}

type Val = &'static str;

// Runs `check` once per map flavor. The tests resolve twice where it matters
// so the second pass answers from a warm cache.
fn for_each_map(check: impl Fn(&mut dyn FnMut() -> Box<dyn Probe>)) {
    let mut plain = || -> Box<dyn Probe> {
        Box::new(ContainmentHashMap::<String, Val, _>::new(Letters))
    };
    check(&mut plain);
    let mut rescan = || -> Box<dyn Probe> {
        Box::new(CachedContainmentMap::<String, Val, _>::new(Letters))
    };
    check(&mut rescan);
    let mut upward = || -> Box<dyn Probe> {
        Box::new(CachedContainmentMap::<String, Val, _, _>::upward(Letters))
    };
    check(&mut upward);
    let mut tiny = || -> Box<dyn Probe> {
        let config = CacheConfig::default().with_capacity(1);
        Box::new(CachedContainmentMap::<String, Val, _, _>::upward_with_config(
            Letters, config,
        ))
    };
    check(&mut tiny);
}

// Object-safe slice of `ContainmentMap` so the flavors can share one test
// body.
trait Probe {
    fn put(&mut self, key: &str, value: Val) -> Option<Val>;
    fn resolve(&self, key: &str) -> Resolution<Val>;
    fn remove(&mut self, key: &str) -> bool;
    fn remove_literal(&mut self, key: &str) -> Option<Val>;
    fn put_if_not_ambiguous(&mut self, key: &str, value: Val) -> Result<Option<Val>, Val>;
    fn len(&self) -> usize;
}

impl<M: ContainmentMap<String, Val>> Probe for M {
    fn put(&mut self, key: &str, value: Val) -> Option<Val> {
        ContainmentMap::put(self, s(key), value)
    }
    fn resolve(&self, key: &str) -> Resolution<Val> {
        ContainmentMap::resolve(self, &s(key)).cloned()
    }
    fn remove(&mut self, key: &str) -> bool {
        ContainmentMap::remove(self, &s(key))
    }
    fn remove_literal(&mut self, key: &str) -> Option<Val> {
        ContainmentMap::remove_literal(self, &s(key))
    }
    fn put_if_not_ambiguous(&mut self, key: &str, value: Val) -> Result<Option<Val>, Val> {
        ContainmentMap::put_if_not_ambiguous(self, s(key), value).map_err(|e| e.value)
    }
    fn len(&self) -> usize {
        ContainmentMap::len(self)
    }
}

// Test: a single literal answers for itself and for everything it strictly
// contains.
#[test]
fn scenario_single_literal() {
    for_each_map(|new| {
        let mut m = new();
        m.put("a", "va");
        for _ in 0..2 {
            assert_eq!(m.resolve("a"), Resolution::Found("va"));
            assert_eq!(m.resolve("ab"), Resolution::Found("va"));
            assert_eq!(m.resolve("ba"), Resolution::Found("va"));
            assert_eq!(m.resolve("b"), Resolution::NotFound);
        }
    });
}

// Test: the nearest literal wins over a shallower one.
#[test]
fn scenario_nearest_literal() {
    for_each_map(|new| {
        let mut m = new();
        m.put("a", "va");
        m.put("ab", "vab");
        for _ in 0..2 {
            assert_eq!(m.resolve("abc"), Resolution::Found("vab"));
            assert_eq!(m.resolve("ac"), Resolution::Found("va"));
        }
    });
}

// Test: mutual peers with different values.
// Verifies: both peers and anything below both are ambiguous; dropping one
// peer's literal entry hands everything to the other; the cascading remove
// takes both peers out since each contains the other.
#[test]
fn scenario_mutual_peers() {
    for_each_map(|new| {
        let mut m = new();
        m.put("m", "vm");
        m.put("mab", "vmab");
        m.put("mba", "vmba");
        for _ in 0..2 {
            assert_eq!(m.resolve("mba"), Resolution::Ambiguous);
            assert_eq!(m.resolve("mab"), Resolution::Ambiguous);
            assert_eq!(m.resolve("cmab"), Resolution::Ambiguous);
            assert_eq!(m.resolve("mc"), Resolution::Found("vm"));
        }

        assert_eq!(m.remove_literal("mba"), Some("vmba"));
        for _ in 0..2 {
            assert_eq!(m.resolve("mba"), Resolution::Found("vmab"));
            assert_eq!(m.resolve("mab"), Resolution::Found("vmab"));
            assert_eq!(m.resolve("cmab"), Resolution::Found("vmab"));
        }

        m.put("mba", "vmba");
        assert!(m.remove("mba"));
        assert_eq!(m.len(), 1);
        assert_eq!(m.resolve("cmab"), Resolution::Found("vm"));
    });
}

// Test: peers holding equal values are not ambiguous.
#[test]
fn equal_peers_resolve() {
    for_each_map(|new| {
        let mut m = new();
        m.put("ab", "same");
        m.put("ba", "same");
        assert_eq!(m.resolve("abc"), Resolution::Found("same"));
        m.put("ba", "other");
        assert_eq!(m.resolve("abc"), Resolution::Ambiguous);
    });
}

// Test: incomparable literals covering one query.
#[test]
fn incomparable_literals_are_ambiguous_until_a_deeper_one_appears() {
    for_each_map(|new| {
        let mut m = new();
        m.put("a", "va");
        m.put("b", "vb");
        assert_eq!(m.resolve("abc"), Resolution::Ambiguous);
        m.put("ab", "vab");
        assert_eq!(m.resolve("abc"), Resolution::Found("vab"));
        assert_eq!(m.resolve("ac"), Resolution::Found("va"));
    });
}

// Test: soundness under insertion with a warm cache.
// Assumes: "abcd" was answered by "a" before "abc" is inserted.
// Verifies: the new, nearer literal wins immediately.
#[test]
fn warm_cache_sees_nearer_literals() {
    for_each_map(|new| {
        let mut m = new();
        m.put("a", "va");
        for q in ["abcd", "abc", "acb", "abd"] {
            assert_eq!(m.resolve(q), Resolution::Found("va"));
        }
        m.put("abc", "vabc");
        assert_eq!(m.resolve("abcd"), Resolution::Found("vabc"));
        assert_eq!(m.resolve("acb"), Resolution::Found("vabc"));
        assert_eq!(m.resolve("abd"), Resolution::Found("va"));
        // A peer of the answer with another value makes it ambiguous.
        m.put("cba", "other");
        assert_eq!(m.resolve("abcd"), Resolution::Ambiguous);
    });
}

// Test: removal cascades to the next-best surviving answer.
#[test]
fn removal_falls_back_to_the_next_best_answer() {
    for_each_map(|new| {
        let mut m = new();
        m.put("a", "va");
        m.put("ab", "vab");
        m.put("abc", "vabc");
        assert_eq!(m.resolve("abcd"), Resolution::Found("vabc"));
        assert!(m.remove("ab"));
        assert_eq!(m.len(), 1);
        assert_eq!(m.resolve("abcd"), Resolution::Found("va"));
        assert!(m.remove("a"));
        assert_eq!(m.resolve("abcd"), Resolution::NotFound);
    });
}

// Test: rejected guarded insert.
// Verifies: the rejected value comes back, and resolution is unchanged.
#[test]
fn guarded_insert_rolls_back() {
    for_each_map(|new| {
        let mut m = new();
        m.put("mab", "x");
        assert_eq!(m.resolve("mabc"), Resolution::Found("x"));
        assert_eq!(m.put_if_not_ambiguous("bam", "y"), Err("y"));
        assert_eq!(m.len(), 1);
        assert_eq!(m.resolve("mabc"), Resolution::Found("x"));
        assert_eq!(m.resolve("bam"), Resolution::Found("x"));
        assert_eq!(m.put_if_not_ambiguous("bam", "x"), Ok(None));
        assert_eq!(m.put_if_not_ambiguous("mabc", "z"), Ok(None));
        assert_eq!(m.put_if_not_ambiguous("mabc", "w"), Ok(Some("z")));
    });
}

// Test: path hierarchies through the ready-made relation.
#[test]
fn path_prefix_maps() {
    let mut plain = ContainmentHashMap::new(PathPrefix);
    let mut cached = CachedContainmentMap::upward(PathPrefix);
    for (k, v) in [("", 0), ("usr", 1), ("usr/lib", 2), ("usr/local/lib", 3)] {
        ContainmentMap::put(&mut plain, s(k), v);
        ContainmentMap::put(&mut cached, s(k), v);
    }
    for (q, expected) in [
        ("usr/lib/x.so", 2),
        ("usr/local/bin/tool", 1),
        ("usr/local/lib/y", 3),
        ("usrx", 0),
        ("etc/hosts", 0),
    ] {
        assert_eq!(plain.get(&s(q)), Some(&expected), "{q}");
        assert_eq!(cached.get(&s(q)), Some(&expected), "{q}");
    }
    assert_eq!(
        cached.resolve_within(Some(&s("usr/local")), &s("usr/local/bin/tool")),
        Resolution::NotFound
    );
    assert_eq!(
        cached.resolve_within(Some(&s("usr")), &s("usr/local/bin/tool")),
        Resolution::Found(&1)
    );
}
