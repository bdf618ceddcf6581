//! CachedContainmentMap: a containment map that memoizes resolutions.
//!
//! The cache maps a query key to the maximal set of literal capsules that
//! covered it when it was resolved, never to a value. Values are looked up
//! through the capsules on every hit, so in-place value updates are visible
//! immediately and a removed literal turns every answer mentioning it into a
//! miss.
//!
//! Inserting a new literal `n` drops a cached entry `q -> M` when
//! `contains(n, q)` holds and no `m` in `M` is strictly more specific than
//! `n`. Every other entry keeps exactly the same maximal set. Entries that
//! already reference removed literals are dropped by the same sweep.
//!
//! Interior mutability: `resolve` takes `&self` and populates the cache
//! through a `RefCell`, so the map is not `Sync`. The relation must not call
//! back into the map; debug builds panic if it does.

use crate::config::CacheConfig;
use crate::error::AmbiguousInsert;
use crate::literal_store::{Capsule, LiteralStore, Upsert};
use crate::map::ContainmentMap;
use crate::query_cache::{QueryCache, Stored};
use crate::reentrancy::DebugReentrancy;
use crate::relation::{ContainmentRelation, UpwardRelation};
use crate::resolution::{most_specific, outcome, scan_candidates, Resolution};
use crate::upward::{MissStrategy, Rescan, Search, Upward};
use core::cell::{Cell, RefCell};
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use std::collections::hash_map::RandomState;
use tracing::{debug, trace};

/// Counters describing cache behavior since construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Cached answers discarded on lookup because a literal they named was
    /// removed.
    pub stale: u64,
    /// Entries dropped because a newly inserted literal may change them.
    pub invalidated: u64,
    pub evicted: u64,
}

fn bump(stats: &Cell<CacheStats>, f: impl FnOnce(&mut CacheStats)) {
    let mut s = stats.get();
    f(&mut s);
    stats.set(s);
}

/// [`ContainmentMap`] with a bounded resolution cache.
///
/// `P` selects how a cache miss is answered: [`Rescan`] (any relation) or
/// [`Upward`] (relations that can enumerate immediate containers).
pub struct CachedContainmentMap<K, V, R, P = Rescan, S = RandomState> {
    relation: R,
    store: LiteralStore<K, V, S>,
    cache: RefCell<QueryCache<K, S>>,
    config: CacheConfig,
    stats: Cell<CacheStats>,
    reentrancy: DebugReentrancy,
    _strategy: PhantomData<fn() -> P>,
}

impl<K, V, R> CachedContainmentMap<K, V, R, Rescan>
where
    K: Eq + Hash,
    R: ContainmentRelation<K>,
{
    pub fn new(relation: R) -> Self {
        Self::with_config(relation, CacheConfig::default())
    }

    pub fn with_config(relation: R, config: CacheConfig) -> Self {
        Self::with_config_and_hasher(relation, config, RandomState::new())
    }
}

impl<K, V, R> CachedContainmentMap<K, V, R, Upward>
where
    K: Eq + Hash,
    R: UpwardRelation<K>,
{
    pub fn upward(relation: R) -> Self {
        Self::upward_with_config(relation, CacheConfig::default())
    }

    pub fn upward_with_config(relation: R, config: CacheConfig) -> Self {
        Self::with_config_and_hasher(relation, config, RandomState::new())
    }
}

impl<K, V, R, P, S> CachedContainmentMap<K, V, R, P, S>
where
    K: Eq + Hash,
    S: BuildHasher + Clone,
{
    pub fn with_config_and_hasher(relation: R, config: CacheConfig, hasher: S) -> Self {
        Self {
            relation,
            store: LiteralStore::with_hasher(hasher.clone()),
            cache: RefCell::new(QueryCache::with_hasher(config.capacity, hasher)),
            config,
            stats: Cell::new(CacheStats::default()),
            reentrancy: DebugReentrancy::new(),
            _strategy: PhantomData,
        }
    }
}

impl<K, V, R, P, S> CachedContainmentMap<K, V, R, P, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn relation(&self) -> &R {
        &self.relation
    }

    pub fn config(&self) -> CacheConfig {
        self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.stats.get()
    }

    /// Number of cached query keys.
    pub fn cache_len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn cache_is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }

    /// Drop every cached answer. Literal entries are untouched.
    pub fn clear_cache(&mut self) {
        self.cache.get_mut().clear();
    }

    /// Drop the cached answer for `query`, if any.
    pub fn forget(&mut self, query: &K) -> bool {
        self.cache.get_mut().remove(query).is_some()
    }
}

/// Drop cached entries whose answer may change now that `inserted` is a
/// literal, along with entries that reference removed literals. Returns the
/// dropped entries; only the former count as invalidated.
fn invalidate_for<K, V, R, S>(
    relation: &R,
    store: &LiteralStore<K, V, S>,
    cache: &mut QueryCache<K, S>,
    stats: &Cell<CacheStats>,
    inserted: Capsule,
) -> Vec<(K, Vec<Capsule>)>
where
    K: Eq + Hash,
    R: ContainmentRelation<K>,
    S: BuildHasher,
{
    let Some(new_key) = store.key(inserted) else {
        return Vec::new();
    };
    let mut stale = 0usize;
    let dropped = cache.retain(|q, answer| {
        if !answer.iter().all(|&c| store.is_live(c)) {
            stale += 1;
            return false;
        }
        if !relation.contains(new_key, q) {
            return true;
        }
        answer
            .iter()
            .filter_map(|&c| store.key(c))
            .any(|m| relation.contains(new_key, m) && !relation.contains(m, new_key))
    });
    let invalidated = dropped.len() - stale;
    if stale > 0 {
        bump(stats, |s| s.stale += stale as u64);
        trace!(stale, "purged stale cached answers");
    }
    if invalidated > 0 {
        bump(stats, |s| s.invalidated += invalidated as u64);
        debug!(invalidated, "new literal invalidated cached answers");
    }
    dropped
}

impl<K, V, R, P, S> CachedContainmentMap<K, V, R, P, S>
where
    K: Eq + Hash + Clone,
    R: ContainmentRelation<K>,
    P: MissStrategy<K, R>,
    S: BuildHasher,
{
    /// Maximal capsule set for `query`, from the cache when it holds a live
    /// answer and from the miss strategy otherwise.
    fn maximal_for(&self, query: &K) -> Vec<Capsule> {
        let mut cache = self.cache.borrow_mut();
        let cached = cache
            .get(query)
            .map(|answer| (answer.iter().all(|&c| self.store.is_live(c)), answer.to_vec()));
        match cached {
            Some((true, answer)) => {
                bump(&self.stats, |s| s.hits += 1);
                trace!("cache hit");
                return answer;
            }
            Some((false, _)) => {
                cache.remove(query);
                bump(&self.stats, |s| s.stale += 1);
                trace!("discarded stale cached answer");
            }
            None => {}
        }
        bump(&self.stats, |s| s.misses += 1);
        trace!("cache miss");

        let Search { maximal, cacheable } =
            P::search(&self.relation, &self.store, &*cache, query);
        if self.config.is_enabled() {
            for key in cacheable {
                if let Stored::Evicted(_) = cache.insert(key, maximal.clone()) {
                    bump(&self.stats, |s| s.evicted += 1);
                    debug!(capacity = self.config.capacity, "cache full, evicted an answer");
                }
            }
        }
        maximal
    }

    fn all_within(&self, scope: &K, maximal: &[Capsule]) -> bool {
        maximal
            .iter()
            .filter_map(|&c| self.store.key(c))
            .all(|k| self.relation.contains(scope, k))
    }
}

impl<K, V, R, P, S> ContainmentMap<K, V> for CachedContainmentMap<K, V, R, P, S>
where
    K: Eq + Hash + Clone,
    V: PartialEq,
    R: ContainmentRelation<K>,
    P: MissStrategy<K, R>,
    S: BuildHasher,
{
    fn resolve_within(&self, scope: Option<&K>, query: &K) -> Resolution<&V> {
        let _g = self.reentrancy.enter("resolve");
        let maximal = self.maximal_for(query);
        match scope {
            // The unscoped maximal set is also the scoped one when it lies
            // entirely inside the scope.
            Some(scope) if !self.all_within(scope, &maximal) => {
                trace!("scoped resolution falls back to a scan");
                let candidates = scan_candidates(&self.relation, &self.store, Some(scope), query);
                outcome(
                    &self.store,
                    &most_specific(&self.relation, &self.store, candidates),
                )
            }
            _ => outcome(&self.store, &maximal),
        }
    }

    fn literal(&self, key: &K) -> Option<&V> {
        self.store.find(key).and_then(|c| self.store.value(c))
    }

    fn put(&mut self, key: K, value: V) -> Option<V> {
        let _g = self.reentrancy.enter("put");
        let upsert = self.store.upsert(key, value);
        if let Upsert::Inserted(c) = upsert {
            invalidate_for(
                &self.relation,
                &self.store,
                self.cache.get_mut(),
                &self.stats,
                c,
            );
        }
        upsert.into_old()
    }

    fn put_if_not_ambiguous(
        &mut self,
        key: K,
        value: V,
    ) -> Result<Option<V>, AmbiguousInsert<K, V>> {
        let _g = self.reentrancy.enter("put_if_not_ambiguous");
        let upsert = self.store.upsert(key, value);
        let capsule = upsert.capsule();
        let dropped = if let Upsert::Inserted(c) = upsert {
            invalidate_for(
                &self.relation,
                &self.store,
                self.cache.get_mut(),
                &self.stats,
                c,
            )
        } else {
            Vec::new()
        };
        // Checked without populating the cache, so a rollback only has to
        // put back what the invalidation dropped.
        let ambiguous = {
            let key = self
                .store
                .key(capsule)
                .expect("freshly upserted capsule is live");
            let search = P::search(&self.relation, &self.store, self.cache.get_mut(), key);
            outcome(&self.store, &search.maximal).is_ambiguous()
        };
        if !ambiguous {
            return Ok(upsert.into_old());
        }
        debug!(restored = dropped.len(), "rejecting ambiguous literal insert");
        match upsert {
            Upsert::Inserted(c) => {
                let (key, value) = self
                    .store
                    .remove(c)
                    .expect("freshly inserted capsule is live");
                let cache = self.cache.get_mut();
                for (q, answer) in dropped {
                    if answer.iter().all(|&live| self.store.is_live(live)) {
                        cache.insert(q, answer);
                    }
                }
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

    /// Cached answers naming a removed literal go stale and are discarded
    /// when next looked up; no sweep happens here.
    fn remove(&mut self, container: &K) -> bool {
        let _g = self.reentrancy.enter("remove");
        let relation = &self.relation;
        let removed = self.store.remove_where(|k| relation.contains(container, k));
        if !removed.is_empty() {
            debug!(removed = removed.len(), "removed literal entries");
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
        self.cache.get_mut().clear();
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

impl<K, V, R, P, S> Extend<(K, V)> for CachedContainmentMap<K, V, R, P, S>
where
    K: Eq + Hash + Clone,
    V: PartialEq,
    R: ContainmentRelation<K>,
    P: MissStrategy<K, R>,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}
