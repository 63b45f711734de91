//! Concurrent ordered multi-version index.
//!
//! Nodes live in an append-only arena (`Inner::nodes`, a `Vec<Node>`) and
//! forward pointers are arena indices rather than owned pointers: node
//! lifetime is tied to the enclosing memtable, lookups are O(1) index
//! derefs, and no unsafe code is needed. The whole arena sits behind a
//! single reader-writer lock: `put_or_update` takes the writer side,
//! `get` and the iterator take the reader side.
//!
//! # Thread Safety
//!
//! A `SkipList` is safe to share across threads: reads ([`SkipList::get`],
//! [`SkipListIterator`]) take the reader side of the arena's lock and can
//! run concurrently with each other; [`SkipList::put_or_update`] takes the
//! writer side and is exclusive with everything else. An iterator started
//! after a completed insert is guaranteed to observe it; one racing an
//! in-progress insert may or may not, but never panics or returns a
//! corrupted node.
//!
//! # Example
//!
//! ```ignore
//! use ferrisdb_storage::memtable::{SkipList, Value, VersionedKey};
//!
//! let skiplist = SkipList::new();
//! skiplist.put_or_update(VersionedKey::new(b"HDD".to_vec(), 1), Value::new(b"Hard disk".to_vec()));
//! let (value, version) = skiplist.get(b"HDD", 5).unwrap();
//! assert_eq!(value.bytes(), b"Hard disk");
//! ```

use super::level_generator::LevelGenerator;
use super::value::Value;
use super::versioned_key::VersionedKey;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

/// Maximum skip list height; forward arrays never exceed this length.
pub const MAX_HEIGHT: usize = 20;

/// Index of the sentinel head node inside the arena.
const HEAD: usize = 0;

struct Node {
    key: VersionedKey,
    value: Value,
    forwards: Vec<Option<usize>>,
}

struct Inner {
    nodes: Vec<Node>,
    height: usize,
}

impl Inner {
    /// Walks every level looking for the predecessor of `target` — the
    /// last node whose key compares strictly less than `target` — and
    /// returns the predecessor index at each level (levels above the
    /// current max height default to `HEAD`) plus whether a node with
    /// exactly `target`'s key already exists.
    fn find(&self, target: &VersionedKey) -> ([usize; MAX_HEIGHT], bool) {
        let mut preds = [HEAD; MAX_HEIGHT];
        let mut current = HEAD;

        for level in (0..self.height).rev() {
            while let Some(next) = self.nodes[current].forwards[level] {
                if self.nodes[next].key.compare(target) == Ordering::Less {
                    current = next;
                } else {
                    break;
                }
            }
            preds[level] = current;
        }

        let exists = self.nodes[current].forwards[0]
            .map(|succ| self.nodes[succ].key.compare(target) == Ordering::Equal)
            .unwrap_or(false);

        (preds, exists)
    }

    /// Walks every level forwarding while the next node's key compares
    /// `<= target`, landing on the greatest node whose key is `<= target`
    /// (possibly `HEAD` itself, if nothing in the list qualifies).
    fn floor(&self, target: &VersionedKey) -> usize {
        let mut current = HEAD;
        for level in (0..self.height).rev() {
            while let Some(next) = self.nodes[current].forwards[level] {
                if self.nodes[next].key.compare(target) != Ordering::Greater {
                    current = next;
                } else {
                    break;
                }
            }
        }
        current
    }

    /// Walks forward while the next node's key compares `<= target`, then
    /// steps once more, landing on the first node strictly greater than
    /// `target` (or `None` at the end of the list).
    fn seek(&self, target: &VersionedKey) -> Option<usize> {
        self.nodes[self.floor(target)].forwards[0]
    }
}

pub struct SkipList {
    inner: RwLock<Inner>,
    level_generator: LevelGenerator,
    size: AtomicUsize,
}

impl SkipList {
    /// Creates an empty skip list with just the sentinel head node.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use ferrisdb_storage::memtable::SkipList;
    ///
    /// let skiplist = SkipList::new();
    /// assert_eq!(skiplist.size(), 0);
    /// ```
    pub fn new() -> Self {
        let head = Node {
            key: VersionedKey::sentinel(),
            value: Value::tombstone(),
            forwards: vec![None; MAX_HEIGHT],
        };
        Self {
            inner: RwLock::new(Inner {
                nodes: vec![head],
                height: 1,
            }),
            level_generator: LevelGenerator::new(MAX_HEIGHT),
            size: AtomicUsize::new(0),
        }
    }

    /// Inserts `(key, value)`. A no-op if a node with an identical
    /// `VersionedKey` (same raw key and same version) already exists.
    /// Takes exclusive access on the skip list.
    pub fn put_or_update(&self, key: VersionedKey, value: Value) {
        let level = self.level_generator.generate();
        let mut inner = self.inner.write();

        if level > inner.height {
            inner.height = level;
        }

        let (preds, exists) = inner.find(&key);
        if exists {
            return;
        }

        let added_size = key.size() + value.size();
        let mut forwards = vec![None; level];
        for (l, forward) in forwards.iter_mut().enumerate() {
            *forward = inner.nodes[preds[l]].forwards[l];
        }
        let new_index = inner.nodes.len();
        inner.nodes.push(Node {
            key,
            value,
            forwards,
        });
        for (l, pred) in preds.iter().enumerate().take(level) {
            inner.nodes[*pred].forwards[l] = Some(new_index);
        }

        self.size.fetch_add(added_size, AtomicOrdering::Relaxed);
    }

    /// Returns the value for the node whose raw key matches `raw_key` and
    /// whose version is the largest value `<= version`, together with that
    /// version. Tombstones and raw-key misses both report `None`. Takes
    /// shared access on the skip list.
    ///
    /// # Arguments
    ///
    /// * `raw_key` - the user key to look up, ignoring version.
    /// * `version` - the snapshot timestamp; the returned entry's version
    ///   is the largest one `<= version`, not necessarily an exact match.
    ///
    /// # Example
    ///
    /// ```ignore
    /// skiplist.put_or_update(VersionedKey::new(b"HDD".to_vec(), 1), Value::new(b"Hard disk".to_vec()));
    /// assert_eq!(skiplist.get(b"HDD", 5).unwrap().0.bytes(), b"Hard disk");
    /// ```
    pub fn get(&self, raw_key: &[u8], version: u64) -> Option<(Value, u64)> {
        let inner = self.inner.read();
        let target = VersionedKey::new(raw_key.to_vec(), version);
        // `floor` lands on the greatest node whose key is `<= target`,
        // which is the candidate itself when an exact `(key, version)`
        // match exists — unlike `find`'s predecessor, which stops one node
        // short of an exact match (that's what `find` needs for insertion
        // and duplicate detection, not for lookup).
        let candidate = &inner.nodes[inner.floor(&target)];

        if !candidate.key.matches_key_prefix(raw_key) {
            return None;
        }
        if candidate.value.is_deleted() {
            return None;
        }
        Some((candidate.value.clone(), candidate.key.version()))
    }

    pub fn size(&self) -> usize {
        self.size.load(AtomicOrdering::Relaxed)
    }

    pub fn iter(&self) -> SkipListIterator<'_> {
        SkipListIterator {
            skiplist: self,
            current: None,
        }
    }
}

impl Default for SkipList {
    fn default() -> Self {
        Self::new()
    }
}

/// Forward-only cursor over a [`SkipList`]'s entries in ascending
/// `VersionedKey` order. Every method takes shared access on the skip list
/// for the duration of the call only.
pub struct SkipListIterator<'a> {
    skiplist: &'a SkipList,
    current: Option<usize>,
}

impl<'a> SkipListIterator<'a> {
    /// Positions at the smallest `VersionedKey` strictly greater than
    /// `target`.
    pub fn seek(&mut self, target: &VersionedKey) {
        let inner = self.skiplist.inner.read();
        self.current = inner.seek(target);
    }

    pub fn is_valid(&self) -> bool {
        self.current.is_some()
    }

    pub fn key(&self) -> VersionedKey {
        let inner = self.skiplist.inner.read();
        let idx = self.current.expect("key() called on an invalid iterator");
        inner.nodes[idx].key.clone()
    }

    pub fn value(&self) -> Value {
        let inner = self.skiplist.inner.read();
        let idx = self.current.expect("value() called on an invalid iterator");
        inner.nodes[idx].value.clone()
    }

    /// Advances to the next entry. It is the caller's responsibility to
    /// check [`Self::is_valid`] first.
    pub fn next(&mut self) {
        let inner = self.skiplist.inner.read();
        let idx = self.current.expect("next() called on an invalid iterator");
        self.current = inner.nodes[idx].forwards[0];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_value_for_a_version_strictly_after_the_stored_one() {
        let sl = SkipList::new();
        sl.put_or_update(
            VersionedKey::new(b"HDD".to_vec(), 1),
            Value::new(b"Hard disk".to_vec()),
        );

        let (value, version) = sl.get(b"HDD", 2).unwrap();
        assert_eq!(value.bytes(), b"Hard disk");
        assert_eq!(version, 1);
    }

    #[test]
    fn returns_value_when_the_requested_version_exactly_matches_the_stored_one() {
        let sl = SkipList::new();
        sl.put_or_update(
            VersionedKey::new(b"HDD".to_vec(), 1),
            Value::new(b"Hard disk".to_vec()),
        );

        let (value, version) = sl.get(b"HDD", 1).unwrap();
        assert_eq!(value.bytes(), b"Hard disk");
        assert_eq!(version, 1);
    }

    #[test]
    fn missing_key_reports_not_found() {
        let sl = SkipList::new();
        sl.put_or_update(
            VersionedKey::new(b"HDD".to_vec(), 1),
            Value::new(b"Hard disk".to_vec()),
        );
        assert!(sl.get(b"Storage", 1).is_none());
    }

    #[test]
    fn tracks_latest_version_at_or_before_snapshot() {
        let sl = SkipList::new();
        sl.put_or_update(
            VersionedKey::new(b"HDD".to_vec(), 1),
            Value::new(b"Hard disk".to_vec()),
        );
        sl.put_or_update(
            VersionedKey::new(b"HDD".to_vec(), 2),
            Value::new(b"Hard disk drive".to_vec()),
        );

        let (value, _) = sl.get(b"HDD", 8).unwrap();
        assert_eq!(value.bytes(), b"Hard disk drive");
    }

    #[test]
    fn tombstone_masks_only_at_or_after_its_version() {
        let sl = SkipList::new();
        sl.put_or_update(
            VersionedKey::new(b"HDD".to_vec(), 1),
            Value::new(b"Hard disk".to_vec()),
        );
        sl.put_or_update(
            VersionedKey::new(b"HDD".to_vec(), 2),
            Value::new(b"Hard disk drive".to_vec()),
        );
        sl.put_or_update(VersionedKey::new(b"HDD".to_vec(), 3), Value::tombstone());

        assert!(sl.get(b"HDD", 4).is_none());
        let (value, _) = sl.get(b"HDD", 2).unwrap();
        assert_eq!(value.bytes(), b"Hard disk drive");
    }

    #[test]
    fn duplicate_version_insert_is_a_no_op() {
        let sl = SkipList::new();
        sl.put_or_update(
            VersionedKey::new(b"HDD".to_vec(), 1),
            Value::new(b"first".to_vec()),
        );
        sl.put_or_update(
            VersionedKey::new(b"HDD".to_vec(), 1),
            Value::new(b"second".to_vec()),
        );

        let expected_size =
            VersionedKey::new(b"HDD".to_vec(), 1).size() + Value::new(b"first".to_vec()).size();
        assert_eq!(sl.size(), expected_size);
        let (value, _) = sl.get(b"HDD", 1).unwrap();
        assert_eq!(value.bytes(), b"first");
    }

    #[test]
    fn iterator_seek_and_next_visit_entries_in_order() {
        let sl = SkipList::new();
        sl.put_or_update(VersionedKey::new(b"HDD".to_vec(), 1), Value::new(b"a".to_vec()));
        sl.put_or_update(VersionedKey::new(b"HDD".to_vec(), 3), Value::new(b"b".to_vec()));
        sl.put_or_update(VersionedKey::new(b"SSD".to_vec(), 1), Value::new(b"c".to_vec()));

        let mut iter = sl.iter();
        iter.seek(&VersionedKey::new(b"HDD".to_vec(), 0));
        assert!(iter.is_valid());
        assert_eq!(iter.key().version(), 1);

        iter.next();
        assert!(iter.is_valid());
        assert_eq!(iter.key().version(), 3);

        iter.next();
        assert!(iter.is_valid());
        assert_eq!(iter.key().key(), b"SSD");

        iter.next();
        assert!(!iter.is_valid());
    }

    #[test]
    fn seek_past_every_entry_is_invalid() {
        let sl = SkipList::new();
        sl.put_or_update(VersionedKey::new(b"HDD".to_vec(), 1), Value::new(b"a".to_vec()));

        let mut iter = sl.iter();
        iter.seek(&VersionedKey::new(b"ZZZ".to_vec(), 0));
        assert!(!iter.is_valid());
    }
}
