//! The containment map contract and its uncached implementation.

use crate::error::AmbiguousInsert;
use crate::literal_store::{LiteralStore, Upsert};
use crate::reentrancy::DebugReentrancy;
use crate::relation::ContainmentRelation;
use crate::resolution::{most_specific, outcome, scan_candidates, Resolution};
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;
use tracing::debug;

/// A map from literal keys to values that answers queries with the value of
/// the most specific literal key covering the query.
///
/// Resolution of `query` (optionally within `scope`):
/// 1. candidates are literal keys `k` with `contains(k, query)`, and
///    `contains(scope, k)` when a scope is given;
/// 2. a candidate is dropped when another candidate is strictly more
///    specific (`contains(k, k') && !contains(k', k)`);
/// 3. no survivors is [`Resolution::NotFound`]; survivors that all hold equal
///    values give [`Resolution::Found`]; anything else is
///    [`Resolution::Ambiguous`].
///
/// Inserting a key can change the resolved answer of many keys that were
/// never touched literally, since a deeper key shadows shallower ones.
pub trait ContainmentMap<K, V> {
    fn resolve_within(&self, scope: Option<&K>, query: &K) -> Resolution<&V>;

    fn resolve(&self, query: &K) -> Resolution<&V> {
        self.resolve_within(None, query)
    }

    /// Resolved value, with `Ambiguous` and `NotFound` both mapped to `None`.
    fn get(&self, query: &K) -> Option<&V> {
        self.resolve(query).found()
    }

    fn ambiguous_key(&self, query: &K) -> bool {
        self.resolve(query).is_ambiguous()
    }

    /// Exact literal lookup; no resolution.
    fn literal(&self, key: &K) -> Option<&V>;

    /// Literal upsert. Returns the previous literal value for `key`.
    fn put(&mut self, key: K, value: V) -> Option<V>;

    /// Like [`put`](Self::put), but undone when `key` would then resolve
    /// ambiguously. On rejection the map is exactly as before the call.
    fn put_if_not_ambiguous(&mut self, key: K, value: V)
        -> Result<Option<V>, AmbiguousInsert<K, V>>;

    /// Remove the literal entry for `container` and every literal key it
    /// contains. Returns whether anything was removed.
    fn remove(&mut self, container: &K) -> bool;

    /// Remove only the literal entry for `key`, leaving the keys it contains
    /// (mutual peers included) in place.
    fn remove_literal(&mut self, key: &K) -> Option<V>;

    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Literal entries in unspecified order.
    fn iter<'a>(&'a self) -> impl Iterator<Item = (&'a K, &'a V)>
    where
        K: 'a,
        V: 'a;

    fn keys<'a>(&'a self) -> impl Iterator<Item = &'a K>
    where
        K: 'a,
        V: 'a,
    {
        self.iter().map(|(k, _)| k)
    }

    fn values<'a>(&'a self) -> impl Iterator<Item = &'a V>
    where
        K: 'a,
        V: 'a,
    {
        self.iter().map(|(_, v)| v)
    }
}

/// Uncached [`ContainmentMap`]: every resolution scans all literal keys.
pub struct ContainmentHashMap<K, V, R, S = RandomState> {
    relation: R,
    store: LiteralStore<K, V, S>,
    reentrancy: DebugReentrancy,
}

impl<K, V, R> ContainmentHashMap<K, V, R>
where
    K: Eq + Hash,
    R: ContainmentRelation<K>,
{
    pub fn new(relation: R) -> Self {
        Self::with_hasher(relation, Default::default())
    }
}

impl<K, V, R, S> ContainmentHashMap<K, V, R, S>
where
    K: Eq + Hash,
    R: ContainmentRelation<K>,
    S: BuildHasher,
{
    pub fn with_hasher(relation: R, hasher: S) -> Self {
        Self {
            relation,
            store: LiteralStore::with_hasher(hasher),
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub fn relation(&self) -> &R {
        &self.relation
    }
}

impl<K, V, R, S> ContainmentMap<K, V> for ContainmentHashMap<K, V, R, S>
where
    K: Eq + Hash,
    V: PartialEq,
    R: ContainmentRelation<K>,
    S: BuildHasher,
{
    fn resolve_within(&self, scope: Option<&K>, query: &K) -> Resolution<&V> {
        let _g = self.reentrancy.enter("resolve");
        let candidates = scan_candidates(&self.relation, &self.store, scope, query);
        let maximal = most_specific(&self.relation, &self.store, candidates);
        outcome(&self.store, &maximal)
    }

    fn literal(&self, key: &K) -> Option<&V> {
        self.store.find(key).and_then(|c| self.store.value(c))
    }

    fn put(&mut self, key: K, value: V) -> Option<V> {
        let _g = self.reentrancy.enter("put");
        self.store.upsert(key, value).into_old()
    }

    fn put_if_not_ambiguous(
        &mut self,
        key: K,
        value: V,
    ) -> Result<Option<V>, AmbiguousInsert<K, V>> {
        let _g = self.reentrancy.enter("put_if_not_ambiguous");
        let upsert = self.store.upsert(key, value);
        let capsule = upsert.capsule();
        let ambiguous = {
            let key = self
                .store
                .key(capsule)
                .expect("freshly upserted capsule is live");
            let candidates = scan_candidates(&self.relation, &self.store, None, key);
            let maximal = most_specific(&self.relation, &self.store, candidates);
            outcome(&self.store, &maximal).is_ambiguous()
        };
        if !ambiguous {
            return Ok(upsert.into_old());
        }
        debug!("rejecting ambiguous literal insert");
        match upsert {
            Upsert::Inserted(c) => {
                let (key, value) = self
                    .store
                    .remove(c)
                    .expect("freshly inserted capsule is live");
                Err(AmbiguousInsert { key, value })
            }
            Upsert::Replaced { capsule, key, old } => {
                let slot = self
                    .store
                    .value_mut(capsule)
                    .expect("replaced capsule is live");
                let value = core::mem::replace(slot, old);
                Err(AmbiguousInsert { key, value })
            }
        }
    }

    fn remove(&mut self, container: &K) -> bool {
        let _g = self.reentrancy.enter("remove");
        let relation = &self.relation;
        let removed = self.store.remove_where(|k| relation.contains(container, k));
        if removed.len() > 1 {
            debug!(removed = removed.len(), "cascading literal removal");
        }
        !removed.is_empty()
    }

    fn remove_literal(&mut self, key: &K) -> Option<V> {
        let _g = self.reentrancy.enter("remove_literal");
        let c = self.store.find(key)?;
        self.store.remove(c).map(|(_, v)| v)
    }

    fn clear(&mut self) {
        let _g = self.reentrancy.enter("clear");
        self.store.clear();
    }

    fn len(&self) -> usize {
        self.store.len()
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = (&'a K, &'a V)>
    where
        K: 'a,
        V: 'a,
    {
        self.store.iter().map(|(_, k, v)| (k, v))
    }
}

impl<K, V, R, S> Extend<(K, V)> for ContainmentHashMap<K, V, R, S>
where
    K: Eq + Hash,
    V: PartialEq,
    R: ContainmentRelation<K>,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}
