//! Miss strategies for `CachedContainmentMap`.
//!
//! A strategy computes the maximal capsule set for a query that missed the
//! cache, and names the keys that may be cached with that same answer.
//!
//! `Rescan` checks every literal key. `Upward` walks up from the query
//! through `UpwardRelation::immediate_containers` with an explicit worklist:
//!
//! - a literal node contributes its capsule and is only expanded into its
//!   mutual-containment peers (anything else above it is strictly less
//!   specific than it);
//! - a node with a live cache entry contributes the cached maximal set and is
//!   not expanded (everything above it is either in that set or dominated by
//!   it);
//! - any other node is expanded into all of its immediate containers.
//!
//! The contributions are reduced to their maximal subset, which equals the
//! maximal subset of all literal keys covering the query provided the
//! relation honors the `UpwardRelation` reachability contract.
//!
//! Every expanded node `x` with `contains(m, x)` for each maximal `m` has
//! exactly the same maximal set as the query (its candidates are a subset of
//! the query's that still includes every maximal key), so it is cached along
//! with the query.

use crate::literal_store::{Capsule, LiteralStore};
use crate::query_cache::QueryCache;
use crate::relation::{ContainmentRelation, UpwardRelation};
use crate::resolution::{most_specific, scan_candidates};
use core::hash::{BuildHasher, Hash};
use hashbrown::HashSet;
use tracing::trace;

/// Answer for one cache miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Search<K> {
    /// Most specific literal capsules covering the query.
    pub maximal: Vec<Capsule>,
    /// Non-literal keys whose answer is exactly `maximal`.
    pub cacheable: Vec<K>,
}

/// How a cache miss is answered.
pub trait MissStrategy<K, R> {
    fn search<V, S>(
        relation: &R,
        store: &LiteralStore<K, V, S>,
        cache: &QueryCache<K, S>,
        query: &K,
    ) -> Search<K>
    where
        K: Eq + Hash + Clone,
        S: BuildHasher;
}

/// Scan every literal key on each miss. Works with any relation.
#[derive(Clone, Copy, Debug, Default)]
pub struct Rescan;

/// Climb from the query through immediate containers, reusing cached
/// answers of nodes on the way. Requires an [`UpwardRelation`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Upward;

impl<K, R> MissStrategy<K, R> for Rescan
where
    R: ContainmentRelation<K>,
{
    fn search<V, S>(
        relation: &R,
        store: &LiteralStore<K, V, S>,
        _cache: &QueryCache<K, S>,
        query: &K,
    ) -> Search<K>
    where
        K: Eq + Hash + Clone,
        S: BuildHasher,
    {
        let candidates = scan_candidates(relation, store, None, query);
        let maximal = most_specific(relation, store, candidates);
        let cacheable = if store.contains_key(query) {
            Vec::new()
        } else {
            vec![query.clone()]
        };
        Search { maximal, cacheable }
    }
}

enum Kind {
    Literal(Capsule),
    Cached(Vec<Capsule>),
    Open,
}

struct Node<K> {
    key: K,
    peers_only: bool,
}

fn classify<K, V, S>(store: &LiteralStore<K, V, S>, cache: &QueryCache<K, S>, key: &K) -> Kind
where
    K: Eq + Hash,
    S: BuildHasher,
{
    if let Some(c) = store.find(key) {
        return Kind::Literal(c);
    }
    match cache.peek(key) {
        Some(answer) if answer.iter().all(|&c| store.is_live(c)) => {
            Kind::Cached(answer.to_vec())
        }
        _ => Kind::Open,
    }
}

impl<K, R> MissStrategy<K, R> for Upward
where
    R: UpwardRelation<K>,
{
    fn search<V, S>(
        relation: &R,
        store: &LiteralStore<K, V, S>,
        cache: &QueryCache<K, S>,
        query: &K,
    ) -> Search<K>
    where
        K: Eq + Hash + Clone,
        S: BuildHasher,
    {
        let mut visited: HashSet<K> = HashSet::new();
        visited.insert(query.clone());
        let mut work = vec![Node {
            key: query.clone(),
            peers_only: false,
        }];
        let mut found: Vec<Capsule> = Vec::new();
        let mut open: Vec<K> = Vec::new();
        let mut reused = 0usize;

        while let Some(node) = work.pop() {
            let peers_only = match classify(store, cache, &node.key) {
                Kind::Literal(c) => {
                    found.push(c);
                    true
                }
                Kind::Cached(answer) => {
                    reused += 1;
                    found.extend(answer);
                    continue;
                }
                Kind::Open => node.peers_only,
            };
            for next in relation.immediate_containers(&node.key) {
                if peers_only && !relation.contains(&node.key, &next) {
                    continue;
                }
                if visited.insert(next.clone()) {
                    work.push(Node {
                        key: next,
                        peers_only,
                    });
                }
            }
            if !store.contains_key(&node.key) {
                open.push(node.key);
            }
        }

        let maximal = most_specific(relation, store, found);
        let maximal_keys: Vec<&K> = maximal.iter().filter_map(|&c| store.key(c)).collect();
        let cacheable: Vec<K> = open
            .into_iter()
            .filter(|x| maximal_keys.iter().all(|m| relation.contains(m, x)))
            .collect();
        trace!(
            visited = visited.len(),
            reused,
            cacheable = cacheable.len(),
            "upward search finished"
        );
        Search { maximal, cacheable }
    }
}
