//! QueryCache: bounded memo of query key -> maximal capsule set.
//!
//! Entries are indexed the same way as the literal store (hash table of
//! generational slot keys) and evicted with the CLOCK policy: a hit sets the
//! entry's referenced bit, and when the cache is full the hand sweeps the
//! ring clearing bits until it finds an unreferenced entry to replace.
//!
//! The cache stores capsules, never values. Whether a capsule is still live
//! is the caller's concern (see `CachedContainmentMap`).

use crate::literal_store::Capsule;
use core::borrow::Borrow;
use core::cell::Cell;
use core::hash::{BuildHasher, Hash};
use hashbrown::HashTable;
use slotmap::{new_key_type, SlotMap};
use std::collections::hash_map::RandomState;

new_key_type! {
    struct EntryKey;
}

struct Slot<K> {
    key: K,
    answer: Vec<Capsule>,
    hash: u64,
    referenced: Cell<bool>,
    ring_pos: usize,
}

pub struct QueryCache<K, S = RandomState> {
    hasher: S,
    index: HashTable<EntryKey>,
    slots: SlotMap<EntryKey, Slot<K>>,
    ring: Vec<EntryKey>,
    hand: usize,
    capacity: usize,
}

/// Result of [`QueryCache::insert`].
#[derive(Debug, PartialEq, Eq)]
pub enum Stored<K> {
    /// Caching is disabled (capacity 0); nothing was stored.
    Skipped,
    Fresh,
    Updated,
    /// Stored after evicting the returned key.
    Evicted(K),
}

impl<K> QueryCache<K>
where
    K: Eq + Hash,
{
    pub fn new(capacity: usize) -> Self {
        Self::with_hasher(capacity, Default::default())
    }
}

impl<K, S> QueryCache<K, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::new(),
            slots: SlotMap::with_key(),
            ring: Vec::new(),
            hand: 0,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn find<Q>(&self, q: &Q) -> Option<EntryKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hasher.hash_one(q);
        self.index
            .find(hash, |&e| {
                self.slots
                    .get(e)
                    .map(|s| s.key.borrow() == q)
                    .unwrap_or(false)
            })
            .copied()
    }

    /// Cached answer for `q`. Marks the entry as recently used.
    pub fn get<Q>(&self, q: &Q) -> Option<&[Capsule]>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let slot = &self.slots[self.find(q)?];
        slot.referenced.set(true);
        Some(slot.answer.as_slice())
    }

    /// Cached answer for `q` without touching the referenced bit.
    pub fn peek<Q>(&self, q: &Q) -> Option<&[Capsule]>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).map(|e| self.slots[e].answer.as_slice())
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    /// Store `answer` for `key`, replacing any previous answer.
    pub fn insert(&mut self, key: K, answer: Vec<Capsule>) -> Stored<K> {
        if self.capacity == 0 {
            return Stored::Skipped;
        }
        if let Some(e) = self.find(&key) {
            let slot = &mut self.slots[e];
            slot.answer = answer;
            slot.referenced.set(true);
            return Stored::Updated;
        }

        let hash = self.hasher.hash_one(&key);

        let evicted = if self.slots.len() >= self.capacity {
            self.evict_one()
        } else {
            None
        };
        let ring_pos = self.ring.len();
        let e = self.slots.insert(Slot {
            key,
            answer,
            hash,
            referenced: Cell::new(false),
            ring_pos,
        });
        self.ring.push(e);
        let slots = &self.slots;
        self.index
            .insert_unique(hash, e, |&k| slots.get(k).map(|s| s.hash).unwrap_or(0));
        match evicted {
            Some(k) => Stored::Evicted(k),
            None => Stored::Fresh,
        }
    }

    /// Sweep the CLOCK hand until an unreferenced entry is found and drop it.
    fn evict_one(&mut self) -> Option<K> {
        if self.ring.is_empty() {
            return None;
        }
        loop {
            if self.hand >= self.ring.len() {
                self.hand = 0;
            }
            let e = self.ring[self.hand];
            let slot = &self.slots[e];
            if slot.referenced.replace(false) {
                self.hand += 1;
                continue;
            }
            return self.unlink(e).map(|(k, _)| k);
        }
    }

    fn unlink(&mut self, e: EntryKey) -> Option<(K, Vec<Capsule>)> {
        let slot = self.slots.remove(e)?;
        self.index
            .find_entry(slot.hash, |&k| k == e)
            .expect("live cache slot must be indexed")
            .remove();
        let pos = slot.ring_pos;
        self.ring.swap_remove(pos);
        if let Some(&moved) = self.ring.get(pos) {
            self.slots[moved].ring_pos = pos;
        }
        Some((slot.key, slot.answer))
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<(K, Vec<Capsule>)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let e = self.find(q)?;
        self.unlink(e)
    }

    /// Keep only entries for which `keep` returns true; the rest are
    /// returned to the caller.
    pub fn retain<F>(&mut self, mut keep: F) -> Vec<(K, Vec<Capsule>)>
    where
        F: FnMut(&K, &[Capsule]) -> bool,
    {
        let doomed: Vec<EntryKey> = self
            .slots
            .iter()
            .filter(|(_, s)| !keep(&s.key, &s.answer))
            .map(|(e, _)| e)
            .collect();
        doomed.into_iter().filter_map(|e| self.unlink(e)).collect()
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.ring.clear();
        self.hand = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &[Capsule])> {
        self.slots.values().map(|s| (&s.key, s.answer.as_slice()))
    }
}
