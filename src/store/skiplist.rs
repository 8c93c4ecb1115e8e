//! Skip list
//!
//! An ordered map from byte keys to values. Every node is linked on level
//! 0; a node reaches level `i + 1` from level `i` on a fair coin flip,
//! capped at `max_level`. Lookups start on the highest level and drop one
//! level whenever the next key would overshoot, so they take `O(log n)`
//! expected steps.
//!
//! Nodes live in an arena and link to each other by index. Slots freed by
//! [`SkipList::remove`] are reused by later inserts.
//!
//! Not thread-safe on its own; [`super::SkipListStore`] puts it behind locks.

use bytes::Bytes;
use rand::Rng;
use std::cmp::Ordering;

/// Height cap used by [`SkipList::new`]
pub const DEFAULT_MAX_LEVEL: usize = 12;

/// Largest accepted `max_level`
pub const MAX_LEVEL_LIMIT: usize = 32;

/// Arena index of the next node; `None` is the end of the level.
type Link = Option<usize>;

#[derive(Debug)]
struct Node {
    key: Bytes,
    value: Bytes,
    /// One forward link per level this node is on
    next: Vec<Link>,
}

#[derive(Debug)]
pub struct SkipList {
    head: Vec<Link>,
    nodes: Vec<Node>,
    free: Vec<usize>,
    len: usize,
    max_level: usize,
}

impl SkipList {
    pub fn new() -> Self {
        Self::with_max_level(DEFAULT_MAX_LEVEL)
    }

    /// `max_level` is clamped to `1..=MAX_LEVEL_LIMIT`.
    pub fn with_max_level(max_level: usize) -> Self {
        let max_level = max_level.clamp(1, MAX_LEVEL_LIMIT);
        Self {
            head: vec![None; max_level],
            nodes: Vec::new(),
            free: Vec::new(),
            len: 0,
            max_level,
        }
    }

    pub fn max_level(&self) -> usize {
        self.max_level
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // `at == None` is the head.
    fn next(&self, at: Link, level: usize) -> Link {
        match at {
            None => self.head[level],
            Some(idx) => self.nodes[idx].next[level],
        }
    }

    fn set_next(&mut self, at: Link, level: usize, to: Link) {
        match at {
            None => self.head[level] = to,
            Some(idx) => self.nodes[idx].next[level] = to,
        }
    }

    /// Last node below `key` on every level
    fn predecessors(&self, key: &[u8]) -> Vec<Link> {
        let mut update = vec![None; self.max_level];
        let mut at = None;
        for level in (0..self.max_level).rev() {
            while let Some(idx) = self.next(at, level) {
                if self.nodes[idx].key.as_ref() >= key {
                    break;
                }
                at = Some(idx);
            }
            update[level] = at;
        }
        update
    }

    fn find(&self, key: &[u8]) -> Link {
        let mut at = None;
        for level in (0..self.max_level).rev() {
            while let Some(idx) = self.next(at, level) {
                match self.nodes[idx].key.as_ref().cmp(key) {
                    Ordering::Less => at = Some(idx),
                    Ordering::Equal => return Some(idx),
                    Ordering::Greater => break,
                }
            }
        }
        None
    }

    fn random_height(&self) -> usize {
        let mut rng = rand::thread_rng();
        let mut height = 1;
        while height < self.max_level && rng.gen_bool(0.5) {
            height += 1;
        }
        height
    }

    pub fn get(&self, key: &[u8]) -> Option<&Bytes> {
        self.find(key).map(|idx| &self.nodes[idx].value)
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.find(key).is_some()
    }

    /// Insert or overwrite `key`, returning the previous value.
    pub fn insert(&mut self, key: Bytes, value: Bytes) -> Option<Bytes> {
        let update = self.predecessors(&key);
        if let Some(idx) = self.next(update[0], 0) {
            if self.nodes[idx].key == key {
                return Some(std::mem::replace(&mut self.nodes[idx].value, value));
            }
        }

        let height = self.random_height();
        let next = (0..height)
            .map(|level| self.next(update[level], level))
            .collect();
        let node = Node { key, value, next };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };

        for (level, &pred) in update.iter().enumerate().take(height) {
            self.set_next(pred, level, Some(idx));
        }
        self.len += 1;
        None
    }

    /// Remove `key`, returning its value if it was present.
    pub fn remove(&mut self, key: &[u8]) -> Option<Bytes> {
        let update = self.predecessors(key);
        let idx = self
            .next(update[0], 0)
            .filter(|&idx| self.nodes[idx].key.as_ref() == key)?;

        // Every predecessor on the node's levels links straight to it.
        for level in 0..self.nodes[idx].next.len() {
            let after = self.nodes[idx].next[level];
            self.set_next(update[level], level, after);
        }

        let node = &mut self.nodes[idx];
        node.next.clear();
        node.key = Bytes::new();
        let value = std::mem::take(&mut node.value);
        self.free.push(idx);
        self.len -= 1;
        Some(value)
    }

    /// Entries in ascending key order
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            at: self.head[0],
        }
    }

    #[cfg(test)]
    fn level_len(&self, level: usize) -> usize {
        let mut count = 0;
        let mut at = self.head[level];
        while let Some(idx) = at {
            count += 1;
            at = self.nodes[idx].next[level];
        }
        count
    }
}

impl Default for SkipList {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Iter<'a> {
    list: &'a SkipList,
    at: Link,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a Bytes, &'a Bytes);

    fn next(&mut self) -> Option<Self::Item> {
        let node = &self.list.nodes[self.at?];
        self.at = node.next[0];
        Some((&node.key, &node.value))
    }
}
