//! Recency List Module
//!
//! Doubly linked MRU→LRU ordering of cache entries.
//!
//! Entries live in an arena of slots and link to each other by `EntryId`,
//! so the list is the single owner of every entry and no reference cycles
//! exist. Freed slots are reused by later insertions.
//!
//! ```text
//!   head ─► [id_2] ◄──► [id_0] ◄──► [id_1] ◄── tail
//!           (MRU)                    (LRU)
//! ```

use crate::cache::entry::{Entry, EntryId};
use crate::error::{CacheError, Result};

// == Recency List ==
/// Arena-backed doubly linked list, head = most recently used.
#[derive(Debug)]
pub(crate) struct RecencyList<K, V> {
    /// Entry slots, `None` when free
    slots: Vec<Option<Entry<K, V>>>,
    /// Indices of free slots
    free: Vec<usize>,
    head: Option<EntryId>,
    tail: Option<EntryId>,
    /// Number of live entries
    len: usize,
}

impl<K, V> RecencyList<K, V> {
    // == Constructor ==
    /// Creates an empty list with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry<K, V>> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut Entry<K, V>> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    // == Push Front ==
    /// Stores a new entry and links it as the most recently used.
    pub fn push_front(&mut self, mut entry: Entry<K, V>) -> EntryId {
        entry.prev = None;
        entry.next = None;

        let id = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(entry);
                EntryId(slot)
            }
            None => {
                self.slots.push(Some(entry));
                EntryId(self.slots.len() - 1)
            }
        };

        self.len += 1;
        self.move_to_front(id);
        id
    }

    // == Unlink ==
    /// Splices an entry out of the ordering by joining its neighbours.
    ///
    /// The entry stays in its slot, detached, until it is either moved to
    /// the front again or freed.
    pub fn unlink(&mut self, id: EntryId) {
        let (prev, next) = match self.get_mut(id) {
            Some(entry) => (entry.prev.take(), entry.next.take()),
            None => return,
        };

        match prev {
            Some(prev_id) => {
                if let Some(prev_entry) = self.get_mut(prev_id) {
                    prev_entry.next = next;
                }
            }
            None => self.head = next,
        }

        match next {
            Some(next_id) => {
                if let Some(next_entry) = self.get_mut(next_id) {
                    next_entry.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    // == Move To Front ==
    /// Links a detached entry in as the new head.
    pub fn move_to_front(&mut self, id: EntryId) {
        let old_head = self.head;

        match old_head {
            Some(head_id) => {
                if let Some(head_entry) = self.get_mut(head_id) {
                    head_entry.prev = Some(id);
                }
            }
            None => self.tail = Some(id),
        }

        if let Some(entry) = self.get_mut(id) {
            entry.prev = None;
            entry.next = old_head;
        }
        self.head = Some(id);
    }

    // == Promote ==
    /// Marks an entry as most recently used.
    pub fn promote(&mut self, id: EntryId) {
        if self.head == Some(id) {
            return;
        }
        self.unlink(id);
        self.move_to_front(id);
    }

    // == Remove ==
    /// Unlinks an entry and frees its slot, returning the entry.
    pub fn remove(&mut self, id: EntryId) -> Option<Entry<K, V>> {
        self.get(id)?;
        self.unlink(id);

        let entry = self.slots[id.0].take()?;
        self.free.push(id.0);
        self.len -= 1;
        Some(entry)
    }

    // == Evict Tail ==
    /// Removes and returns the least recently used entry.
    pub fn evict_tail(&mut self) -> Result<Entry<K, V>> {
        let tail = self.tail.ok_or(CacheError::EmptyList)?;
        self.remove(tail).ok_or(CacheError::EmptyList)
    }

    /// Consumes the list, returning the values of all live entries.
    pub fn into_values(self) -> Vec<V> {
        self.slots.into_iter().flatten().map(|entry| entry.value).collect()
    }

    /// Iterates entries from most to least recently used.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            current: self.head,
        }
    }

    /// Panics if the links disagree with `len` in either direction.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let mut forward = 0;
        let mut current = self.head;
        let mut last = None;
        while let Some(id) = current {
            let entry = self.get(id).expect("head chain points at a free slot");
            assert_eq!(entry.prev, last, "prev link out of sync");
            forward += 1;
            assert!(forward <= self.len, "forward walk exceeds len");
            last = Some(id);
            current = entry.next;
        }
        assert_eq!(forward, self.len);
        assert_eq!(last, self.tail);

        let mut backward = 0;
        let mut current = self.tail;
        while let Some(id) = current {
            backward += 1;
            assert!(backward <= self.len, "backward walk exceeds len");
            current = self.get(id).and_then(|entry| entry.prev);
        }
        assert_eq!(backward, self.len);

        if let Some(head) = self.head {
            assert!(self.get(head).unwrap().prev.is_none());
        }
        if let Some(tail) = self.tail {
            assert!(self.get(tail).unwrap().next.is_none());
        }
    }
}

// == Iterator ==
/// MRU→LRU iterator over the list.
pub(crate) struct Iter<'a, K, V> {
    list: &'a RecencyList<K, V>,
    current: Option<EntryId>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = &'a Entry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.list.get(self.current?)?;
        self.current = entry.next;
        Some(entry)
    }
}
