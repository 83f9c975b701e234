//! LRU/LRA order table: a safe, arena-backed doubly linked list.
//!
//! A `Vec<Node>` slab addressed by index, rather than raw or tagged
//! pointers, gives push-to-mru, move-to-mru, and unlink at the same
//! amortized cost as an intrusive linked list with no `unsafe`.

use std::collections::HashMap;
use std::sync::Arc;

struct Node {
    id: Arc<str>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Doubly linked list ordered from `mru` (most-recently-touched end) to
/// `lru` (the victim end). The table itself is policy-agnostic — it is used
/// for both LRU (every `get`/`put`/`update` touches) and LRA (only
/// `put`/`update` touches); the caller decides when to call
/// [`OrderTable::touch`].
#[derive(Default)]
pub(crate) struct OrderTable {
    nodes: Vec<Node>,
    free: Vec<usize>,
    index: HashMap<Arc<str>, usize>,
    mru: Option<usize>,
    lru: Option<usize>,
}

impl OrderTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Inserts a fresh id at the most-recently-used end. The id must not
    /// already be present.
    pub(crate) fn insert_mru(&mut self, id: Arc<str>) {
        debug_assert!(!self.index.contains_key(id.as_ref()));
        let slot = self.alloc(id.clone());
        self.link_at_mru(slot);
        self.index.insert(id, slot);
    }

    /// Moves an existing id to the most-recently-used end.
    pub(crate) fn touch(&mut self, id: &str) {
        if let Some(&slot) = self.index.get(id) {
            self.unlink(slot);
            self.link_at_mru(slot);
        }
    }

    /// Removes an id from the table, wherever it currently sits.
    pub(crate) fn remove(&mut self, id: &str) {
        if let Some(slot) = self.index.remove(id) {
            self.unlink(slot);
            self.free.push(slot);
        }
    }

    /// Returns the id at the victim (least-recently-used/added) end without
    /// removing it.
    pub(crate) fn peek_victim(&self) -> Option<Arc<str>> {
        self.lru.map(|slot| self.nodes[slot].id.clone())
    }

    /// Removes and returns the id at the victim end.
    pub(crate) fn pop_victim(&mut self) -> Option<Arc<str>> {
        let id = self.peek_victim()?;
        self.remove(&id);
        Some(id)
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.index.clear();
        self.mru = None;
        self.lru = None;
    }

    fn alloc(&mut self, id: Arc<str>) -> usize {
        let node = Node {
            id,
            prev: None,
            next: None,
        };
        if let Some(slot) = self.free.pop() {
            self.nodes[slot] = node;
            slot
        } else {
            self.nodes.push(node);
            self.nodes.len() - 1
        }
    }

    fn link_at_mru(&mut self, slot: usize) {
        self.nodes[slot].prev = None;
        self.nodes[slot].next = self.mru;
        if let Some(old_mru) = self.mru {
            self.nodes[old_mru].prev = Some(slot);
        }
        self.mru = Some(slot);
        if self.lru.is_none() {
            self.lru = Some(slot);
        }
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = (self.nodes[slot].prev, self.nodes[slot].next);
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.mru = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.lru = prev,
        }
    }
}
