//! Resolution outcomes and the "most specific candidates" computation shared
//! by every map implementation.

use crate::literal_store::{Capsule, LiteralStore};
use crate::relation::ContainmentRelation;
use core::hash::{BuildHasher, Hash};

/// Outcome of resolving a query key.
///
/// `Ambiguous` is a regular outcome, not an error: at least two most specific
/// literal keys cover the query and they hold different values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resolution<V> {
    Found(V),
    Ambiguous,
    NotFound,
}

impl<V> Resolution<V> {
    /// The found value; `Ambiguous` and `NotFound` both collapse to `None`.
    pub fn found(self) -> Option<V> {
        match self {
            Resolution::Found(v) => Some(v),
            Resolution::Ambiguous | Resolution::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Resolution::Ambiguous)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Resolution::NotFound)
    }

    pub fn as_ref(&self) -> Resolution<&V> {
        match self {
            Resolution::Found(v) => Resolution::Found(v),
            Resolution::Ambiguous => Resolution::Ambiguous,
            Resolution::NotFound => Resolution::NotFound,
        }
    }

    pub fn map<U, F: FnOnce(V) -> U>(self, f: F) -> Resolution<U> {
        match self {
            Resolution::Found(v) => Resolution::Found(f(v)),
            Resolution::Ambiguous => Resolution::Ambiguous,
            Resolution::NotFound => Resolution::NotFound,
        }
    }
}

impl<V: Clone> Resolution<&V> {
    pub fn cloned(self) -> Resolution<V> {
        self.map(V::clone)
    }
}

/// Reduce `candidates` to the ones no other candidate is strictly more
/// specific than.
///
/// `k` is dropped when some `k'` satisfies `contains(k, k') && !contains(k', k)`.
/// Mutual-containment peers never eliminate each other. Duplicates in the
/// input are collapsed.
pub(crate) fn most_specific<K, V, R, S>(
    relation: &R,
    store: &LiteralStore<K, V, S>,
    mut candidates: Vec<Capsule>,
) -> Vec<Capsule>
where
    K: Eq + Hash,
    R: ContainmentRelation<K> + ?Sized,
    S: BuildHasher,
{
    candidates.sort_unstable();
    candidates.dedup();
    let keyed: Vec<(Capsule, &K)> = candidates
        .iter()
        .filter_map(|&c| store.key(c).map(|k| (c, k)))
        .collect();
    keyed
        .iter()
        .filter(|(c, k)| {
            !keyed.iter().any(|(other, o)| {
                other != c && relation.contains(k, o) && !relation.contains(o, k)
            })
        })
        .map(|(c, _)| *c)
        .collect()
}

/// Every literal key covering `query`, optionally restricted to keys inside
/// `scope`.
pub(crate) fn scan_candidates<K, V, R, S>(
    relation: &R,
    store: &LiteralStore<K, V, S>,
    scope: Option<&K>,
    query: &K,
) -> Vec<Capsule>
where
    K: Eq + Hash,
    R: ContainmentRelation<K> + ?Sized,
    S: BuildHasher,
{
    store
        .iter()
        .filter(|(_, k, _)| relation.contains(k, query))
        .filter(|(_, k, _)| scope.map_or(true, |s| relation.contains(s, k)))
        .map(|(c, _, _)| c)
        .collect()
}

/// Turn a maximal capsule set into an outcome using the capsules' current
/// values. Stale capsules are ignored.
pub(crate) fn outcome<'a, K, V, S>(
    store: &'a LiteralStore<K, V, S>,
    maximal: &[Capsule],
) -> Resolution<&'a V>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    let mut values = maximal.iter().filter_map(|&c| store.value(c));
    let Some(first) = values.next() else {
        return Resolution::NotFound;
    };
    if values.all(|v| v == first) {
        Resolution::Found(first)
    } else {
        Resolution::Ambiguous
    }
}
