//! LiteralStore: literal key -> value association with stable capsule handles.
//!
//! Each literal entry lives in a generational slot. A [`Capsule`] addresses
//! that slot: it survives value updates and rehashing, and it goes stale the
//! moment the entry is removed. A later entry that reuses the physical slot
//! gets a new generation, so a stale capsule never aliases it. The cache
//! relies on exactly this to make removal invalidate cached answers without a
//! sweep.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_table::Entry as TableEntry;
use hashbrown::HashTable;
use slotmap::{new_key_type, SlotMap};
use std::collections::hash_map::RandomState;

new_key_type! {
    /// Generational handle to one literal entry.
    pub struct Capsule;
}

#[derive(Debug)]
struct Slot<K, V> {
    key: K,
    value: V,
    hash: u64,
}

pub struct LiteralStore<K, V, S = RandomState> {
    hasher: S,
    index: HashTable<Capsule>,
    slots: SlotMap<Capsule, Slot<K, V>>,
}

/// What an upsert did.
#[derive(Debug, PartialEq, Eq)]
pub enum Upsert<K, V> {
    /// The key was new; a fresh capsule was minted.
    Inserted(Capsule),
    /// The key existed; its value was replaced in place. The stored key is
    /// kept, so the key passed in is handed back along with the old value.
    Replaced { capsule: Capsule, key: K, old: V },
}

impl<K, V> Upsert<K, V> {
    pub fn capsule(&self) -> Capsule {
        match self {
            Upsert::Inserted(c) | Upsert::Replaced { capsule: c, .. } => *c,
        }
    }

    /// The value that was overwritten, if any.
    pub fn into_old(self) -> Option<V> {
        match self {
            Upsert::Inserted(_) => None,
            Upsert::Replaced { old, .. } => Some(old),
        }
    }
}

impl<K, V> LiteralStore<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<K, V> Default for LiteralStore<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> LiteralStore<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::new(),
            slots: SlotMap::with_key(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn find<Q>(&self, q: &Q) -> Option<Capsule>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hasher.hash_one(q);
        self.index
            .find(hash, |&c| {
                self.slots
                    .get(c)
                    .map(|s| s.key.borrow() == q)
                    .unwrap_or(false)
            })
            .copied()
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    /// Insert `key` or overwrite its value. Overwriting keeps the capsule.
    pub fn upsert(&mut self, key: K, value: V) -> Upsert<K, V> {
        let hash = self.hasher.hash_one(&key);
        let slots = &mut self.slots;
        match self.index.entry(
            hash,
            |&c| slots.get(c).map(|s| s.key == key).unwrap_or(false),
            |&c| slots.get(c).map(|s| s.hash).unwrap_or(0),
        ) {
            TableEntry::Occupied(o) => {
                let c = *o.get();
                let slot = slots
                    .get_mut(c)
                    .expect("indexed capsule must have a live slot");
                Upsert::Replaced {
                    capsule: c,
                    key,
                    old: core::mem::replace(&mut slot.value, value),
                }
            }
            TableEntry::Vacant(v) => {
                let c = slots.insert(Slot { key, value, hash });
                v.insert(c);
                Upsert::Inserted(c)
            }
        }
    }

    /// Remove the entry behind `capsule`; the capsule is stale afterwards.
    pub fn remove(&mut self, capsule: Capsule) -> Option<(K, V)> {
        let slot = self.slots.remove(capsule)?;
        self.index
            .find_entry(slot.hash, |&c| c == capsule)
            .expect("live slot must be indexed")
            .remove();
        Some((slot.key, slot.value))
    }

    /// Remove every entry whose key matches `pred`, returning what was removed.
    pub fn remove_where<F>(&mut self, mut pred: F) -> Vec<(K, V)>
    where
        F: FnMut(&K) -> bool,
    {
        let doomed: Vec<Capsule> = self
            .slots
            .iter()
            .filter(|(_, s)| pred(&s.key))
            .map(|(c, _)| c)
            .collect();
        doomed.into_iter().filter_map(|c| self.remove(c)).collect()
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
    }

    #[inline]
    pub fn is_live(&self, capsule: Capsule) -> bool {
        self.slots.contains_key(capsule)
    }

    pub fn key(&self, capsule: Capsule) -> Option<&K> {
        self.slots.get(capsule).map(|s| &s.key)
    }

    pub fn value(&self, capsule: Capsule) -> Option<&V> {
        self.slots.get(capsule).map(|s| &s.value)
    }

    pub fn value_mut(&mut self, capsule: Capsule) -> Option<&mut V> {
        self.slots.get_mut(capsule).map(|s| &mut s.value)
    }

    pub fn entry(&self, capsule: Capsule) -> Option<(&K, &V)> {
        self.slots.get(capsule).map(|s| (&s.key, &s.value))
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.slots.iter(),
        }
    }
}

/// Iterator over `(capsule, key, value)` for every literal entry.
pub struct Iter<'a, K, V> {
    it: slotmap::basic::Iter<'a, Capsule, Slot<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (Capsule, &'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(c, s)| (c, &s.key, &s.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}
