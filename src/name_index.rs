//! The concurrent name directory. Names are sharded by hash into buckets; each bucket owns both
//! the name-to-slot table and the storage for the slots it created, behind one RwLock. A
//! `SymbolId` packs the bucket number and the slot's offset within it, so ids stay valid for the
//! whole link while variants are overwritten in place.
//!
//! Merge callbacks run under the bucket's write lock, which is what serializes competing updates
//! to a slot. The lock is never held across an external hook call; entry points that may fetch
//! return the decision out of the callback and invoke the hook afterwards, so hooks are free to
//! re-enter the table.

use crate::name::SymbolName;
use crate::symbol::Symbol;
use crate::symbol::SymbolKind;
use hashbrown::hash_table::Entry;
use hashbrown::HashTable;
use std::fmt::Display;
use std::num::NonZeroUsize;
use std::sync::RwLock;

/// Stable identity of a symbol slot. Downstream holders (relocations, boundary lists) keep the id
/// and re-read the slot before each use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(u32);

pub(crate) struct NameIndex<'data> {
    buckets: Vec<RwLock<Bucket<'data>>>,
}

#[derive(Default)]
struct Bucket<'data> {
    /// Keyed by the name's cached hash; collisions resolve by comparing the stored name.
    name_to_slot: HashTable<BucketEntry<'data>>,
    slots: Vec<Symbol<'data>>,
}

#[derive(Clone, Copy)]
struct BucketEntry<'data> {
    name: SymbolName<'data>,
    offset: u32,
}

fn default_bucket_count() -> usize {
    std::thread::available_parallelism().map_or(16, NonZeroUsize::get)
}

impl<'data> NameIndex<'data> {
    pub(crate) fn new() -> Self {
        Self::with_buckets(default_bucket_count())
    }

    pub(crate) fn with_buckets(num_buckets: usize) -> Self {
        let mut buckets = Vec::new();
        buckets.resize_with(num_buckets.max(1), RwLock::default);
        NameIndex { buckets }
    }

    fn bucket_of(&self, hash: u64) -> usize {
        hash as usize % self.buckets.len()
    }

    fn pack(&self, bucket: usize, offset: usize) -> SymbolId {
        let raw = offset * self.buckets.len() + bucket;
        SymbolId(u32::try_from(raw).expect("Symbols overflowed 32 bits"))
    }

    fn unpack(&self, id: SymbolId) -> (usize, usize) {
        let raw = id.0 as usize;
        (raw % self.buckets.len(), raw / self.buckets.len())
    }

    /// Atomic get-or-create. A first insertion installs `vacant()` as the slot's variant and
    /// returns `(id, None)`; a hit runs `occupied` on the live slot under the bucket lock and
    /// returns its result. Either way the sticky regular-object bit is OR'd in.
    pub(crate) fn resolve<R>(
        &self,
        name: SymbolName<'data>,
        used_in_regular_obj: bool,
        vacant: impl FnOnce() -> SymbolKind,
        occupied: impl FnOnce(SymbolId, &mut Symbol<'data>) -> R,
    ) -> (SymbolId, Option<R>) {
        let bucket_index = self.bucket_of(name.hash());
        let mut guard = self.buckets[bucket_index].write().unwrap();
        let Bucket {
            name_to_slot,
            slots,
        } = &mut *guard;

        let entry = name_to_slot.entry(
            name.hash(),
            |entry| entry.name == name,
            |entry| entry.name.hash(),
        );
        match entry {
            Entry::Occupied(entry) => {
                let offset = entry.get().offset as usize;
                let id = self.pack(bucket_index, offset);
                let slot = &mut slots[offset];
                slot.used_in_regular_obj |= used_in_regular_obj;
                let result = occupied(id, slot);
                (id, Some(result))
            }
            Entry::Vacant(entry) => {
                let offset = slots.len();
                slots.push(Symbol::new(name, used_in_regular_obj, vacant()));
                entry.insert(BucketEntry {
                    name,
                    offset: offset as u32,
                });
                (self.pack(bucket_index, offset), None)
            }
        }
    }

    /// Insert without merge rules. Used when the caller has already proven the name cannot
    /// collide; if it does anyway, the existing slot is returned untouched.
    pub(crate) fn insert_fresh(
        &self,
        name: SymbolName<'data>,
        used_in_regular_obj: bool,
        kind: SymbolKind,
    ) -> (SymbolId, bool) {
        let (id, hit) = self.resolve(name, used_in_regular_obj, || kind, |_, _| ());
        (id, hit.is_none())
    }

    pub(crate) fn find(&self, name: &SymbolName<'_>) -> Option<SymbolId> {
        let bucket_index = self.bucket_of(name.hash());
        let guard = self.buckets[bucket_index].read().unwrap();
        guard
            .name_to_slot
            .find(name.hash(), |entry| {
                entry.name.bytes() == name.bytes()
            })
            .map(|entry| self.pack(bucket_index, entry.offset as usize))
    }

    /// Snapshot of the slot's current contents.
    pub(crate) fn get(&self, id: SymbolId) -> Symbol<'data> {
        let (bucket_index, offset) = self.unpack(id);
        let guard = self.buckets[bucket_index].read().unwrap();
        guard.slots[offset]
    }

    pub(crate) fn update<R>(&self, id: SymbolId, f: impl FnOnce(&mut Symbol<'data>) -> R) -> R {
        let (bucket_index, offset) = self.unpack(id);
        let mut guard = self.buckets[bucket_index].write().unwrap();
        f(&mut guard.slots[offset])
    }

    /// Visits every slot; stops early when the callback returns true. Takes each bucket's read
    /// lock in turn, so this belongs in the single-threaded reporting phase.
    pub(crate) fn scan(&self, mut f: impl FnMut(SymbolId, &Symbol<'data>) -> bool) {
        for (bucket_index, lock) in self.buckets.iter().enumerate() {
            let guard = lock.read().unwrap();
            for (offset, slot) in guard.slots.iter().enumerate() {
                if f(self.pack(bucket_index, offset), slot) {
                    return;
                }
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.buckets
            .iter()
            .map(|bucket| bucket.read().unwrap().slots.len())
            .sum()
    }
}

impl Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::RefState;
    use crate::symbol::Undefined;
    use rayon::iter::IntoParallelRefIterator;
    use rayon::iter::ParallelIterator;

    fn undefined() -> SymbolKind {
        SymbolKind::Undefined(Undefined {
            file: None,
            ref_state: RefState::Strong,
            was_bitcode_symbol: false,
        })
    }

    #[test]
    fn test_resolve_returns_same_id() {
        let index = NameIndex::with_buckets(3);
        let (first, hit) = index.resolve(SymbolName::new(b"_a"), false, undefined, |_, _| ());
        assert!(hit.is_none());
        let (second, hit) = index.resolve(SymbolName::new(b"_a"), false, undefined, |_, _| ());
        assert!(hit.is_some());
        assert_eq!(first, second);
        assert_eq!(index.find(&SymbolName::new(b"_a")), Some(first));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_find_with_short_lived_key() {
        let index = NameIndex::with_buckets(2);
        let (id, _) = index.resolve(SymbolName::new(b"_zzz"), false, undefined, |_, _| ());
        let lookup = String::from("_zzz");
        assert_eq!(index.find(&SymbolName::new(lookup.as_bytes())), Some(id));
    }

    #[test]
    fn test_concurrent_insertion() {
        let names: Vec<String> = (0..512).map(|i| format!("_sym{i}")).collect();
        let index = NameIndex::new();

        // Each name is inserted repeatedly from parallel callers; exactly one insertion must win
        // and every caller must observe the same id.
        let ids: Vec<Vec<SymbolId>> = (0..4u32)
            .map(|_| {
                names
                    .par_iter()
                    .map(|name| {
                        index
                            .resolve(SymbolName::new(name.as_bytes()), false, undefined, |_, _| ())
                            .0
                    })
                    .collect()
            })
            .collect();

        assert_eq!(index.len(), names.len());
        for round in &ids[1..] {
            assert_eq!(round, &ids[0]);
        }
        for (name, &id) in names.iter().zip(&ids[0]) {
            assert_eq!(index.find(&SymbolName::new(name.as_bytes())), Some(id));
        }
    }
}
