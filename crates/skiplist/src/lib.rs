//! # SkipList - Probabilistic Ordered Index
//!
//! The in-memory index behind SkipDB. Entries are keyed by a unique,
//! non-negative `i32` and kept in ascending key order across a stack of
//! singly-linked "express lanes".
//!
//! ## Layout
//!
//! ```text
//! Level 2: HEAD ----------------> [5] -----------------------> NIL
//! Level 1: HEAD ------> [3] ----> [5] ------------> [9] -----> NIL
//! Level 0: HEAD -> [1] -> [3] -> [5] -> [7] -> [8] -> [9] ---> NIL
//! ```
//!
//! Level 0 is the complete sorted chain. A node that appears at level `i`
//! also appears at every level below it. Node heights are drawn from a
//! geometric distribution (`P = 0.5`), capped at [`MAX_LEVEL`].
//!
//! ## Storage
//!
//! Nodes live in an arena (`Vec<Option<Node>>`) and link to each other by
//! slot index. Removing a node frees its slot for reuse; forward links are
//! plain indices, so there is no manual allocation bookkeeping and no
//! pointer can outlive the node it refers to.
//!
//! ## Example
//!
//! ```rust
//! use skiplist::SkipList;
//!
//! let mut list = SkipList::with_seed(7);
//! list.insert(5, "five").unwrap();
//! list.insert(1, "one").unwrap();
//! assert_eq!(list.get(5), Some(&"five"));
//! assert_eq!(list.keys().collect::<Vec<_>>(), vec![1, 5]);
//! assert!(list.delete(1));
//! ```

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::iter::FusedIterator;
use thiserror::Error;

/// Maximum number of levels any node (and the header) can occupy.
pub const MAX_LEVEL: usize = 32;

/// Probability that a node is promoted one more level.
pub const P: f64 = 0.5;

/// Errors raised while constructing a [`SkipList`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SkipListError {
    /// The header's link table could not be allocated.
    #[error("failed to allocate skip list header")]
    Alloc,
}

/// Reason an [`insert`](SkipList::insert) was refused.
///
/// Every variant hands the rejected value back to the caller.
#[derive(Debug, PartialEq, Eq)]
pub enum InsertError<V> {
    /// The key is negative.
    InvalidKey { key: i32, value: V },
    /// The key is already present. The existing entry is untouched.
    Duplicate { key: i32, value: V },
    /// Memory for the node could not be reserved.
    Alloc { key: i32, value: V },
}

impl<V> InsertError<V> {
    /// The key the failed insert was attempted with.
    pub fn key(&self) -> i32 {
        match self {
            InsertError::InvalidKey { key, .. }
            | InsertError::Duplicate { key, .. }
            | InsertError::Alloc { key, .. } => *key,
        }
    }

    /// Returns ownership of the rejected value.
    pub fn into_value(self) -> V {
        match self {
            InsertError::InvalidKey { value, .. }
            | InsertError::Duplicate { value, .. }
            | InsertError::Alloc { value, .. } => value,
        }
    }
}

impl<V> fmt::Display for InsertError<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertError::InvalidKey { key, .. } => {
                write!(f, "invalid key {}: keys must be non-negative", key)
            }
            InsertError::Duplicate { key, .. } => write!(f, "duplicate key {}", key),
            InsertError::Alloc { key, .. } => {
                write!(f, "out of memory while inserting key {}", key)
            }
        }
    }
}

impl<V: fmt::Debug> std::error::Error for InsertError<V> {}

struct Node<V> {
    key: i32,
    value: V,
    /// One link per level the node occupies; `forward.len()` is its height.
    forward: Vec<Option<usize>>,
}

/// A position during descent: the header or an arena slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Head,
    Node(usize),
}

/// An ordered map from non-negative `i32` keys to owned values.
///
/// Not synchronized: wrap the whole list in a `Mutex` if it must be shared.
pub struct SkipList<V> {
    /// Header links, one per possible level.
    head: Vec<Option<usize>>,
    nodes: Vec<Option<Node<V>>>,
    /// Arena slots vacated by removals.
    free: Vec<usize>,
    /// Highest level holding a real node; 0 when empty.
    top_level: usize,
    len: usize,
    rng: SmallRng,
}

impl<V> SkipList<V> {
    /// Creates an empty list with an entropy-seeded level generator.
    ///
    /// # Panics
    ///
    /// Aborts like any other allocation if the header cannot be allocated.
    /// Use [`try_new`](SkipList::try_new) to observe that failure.
    pub fn new() -> Self {
        Self::from_rng(SmallRng::from_entropy())
    }

    /// Creates an empty list whose level draws are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(SmallRng::seed_from_u64(seed))
    }

    /// Fallible form of [`new`](SkipList::new).
    pub fn try_new() -> Result<Self, SkipListError> {
        Self::try_from_rng(SmallRng::from_entropy())
    }

    /// Fallible form of [`with_seed`](SkipList::with_seed).
    pub fn try_with_seed(seed: u64) -> Result<Self, SkipListError> {
        Self::try_from_rng(SmallRng::seed_from_u64(seed))
    }

    fn from_rng(rng: SmallRng) -> Self {
        Self {
            head: vec![None; MAX_LEVEL],
            nodes: Vec::new(),
            free: Vec::new(),
            top_level: 0,
            len: 0,
            rng,
        }
    }

    fn try_from_rng(rng: SmallRng) -> Result<Self, SkipListError> {
        let mut head: Vec<Option<usize>> = Vec::new();
        head.try_reserve_exact(MAX_LEVEL)
            .map_err(|_| SkipListError::Alloc)?;
        head.resize(MAX_LEVEL, None);
        Ok(Self {
            head,
            nodes: Vec::new(),
            free: Vec::new(),
            top_level: 0,
            len: 0,
            rng,
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Highest level index (0-based) that currently holds a node.
    pub fn top_level(&self) -> usize {
        self.top_level
    }

    /// Number of levels in use, i.e. `top_level() + 1`.
    pub fn height(&self) -> usize {
        self.top_level + 1
    }

    /// Looks up `key`. Read-only; never mutates the structure.
    pub fn get(&self, key: i32) -> Option<&V> {
        self.find(key).map(|idx| &self.node(idx).value)
    }

    pub fn contains_key(&self, key: i32) -> bool {
        self.find(key).is_some()
    }

    /// Inserts a new entry.
    ///
    /// Fails without touching the structure if `key` is negative, already
    /// present, or the node cannot be allocated. The value is returned inside
    /// the error in every case.
    pub fn insert(&mut self, key: i32, value: V) -> Result<(), InsertError<V>> {
        if key < 0 {
            return Err(InsertError::InvalidKey { key, value });
        }

        let update = self.find_update(key);
        if let Some(idx) = self.next(update[0], 0) {
            if self.node(idx).key == key {
                return Err(InsertError::Duplicate { key, value });
            }
        }

        let height = self.random_height();

        // Reserve everything up front so that a failure leaves no partial splice.
        let mut forward: Vec<Option<usize>> = Vec::new();
        if forward.try_reserve_exact(height).is_err() {
            return Err(InsertError::Alloc { key, value });
        }
        if self.free.is_empty() && self.nodes.try_reserve(1).is_err() {
            return Err(InsertError::Alloc { key, value });
        }

        // Levels above the old top_level keep `Cursor::Head` as predecessor.
        for (level, pred) in update.iter().enumerate().take(height) {
            forward.push(self.next(*pred, level));
        }

        let node = Node {
            key,
            value,
            forward,
        };
        let idx = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                slot
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };

        for (level, pred) in update.iter().enumerate().take(height) {
            self.set_next(*pred, level, Some(idx));
        }

        self.top_level = self.top_level.max(height - 1);
        self.len += 1;
        Ok(())
    }

    /// Removes `key` and returns its value, or `None` if it was absent.
    pub fn remove(&mut self, key: i32) -> Option<V> {
        if key < 0 {
            return None;
        }

        let update = self.find_update(key);
        let target = self
            .next(update[0], 0)
            .filter(|&idx| self.node(idx).key == key)?;

        let height = self.node(target).forward.len();
        for (level, pred) in update.iter().enumerate().take(height) {
            if self.next(*pred, level) == Some(target) {
                let succ = self.node(target).forward[level];
                self.set_next(*pred, level, succ);
            }
        }

        let node = self.nodes[target].take()?;
        self.free.push(target);

        while self.top_level > 0 && self.head[self.top_level].is_none() {
            self.top_level -= 1;
        }
        self.len -= 1;

        if self.len == 0 {
            self.nodes.clear();
            self.free.clear();
        }

        Some(node.value)
    }

    /// Removes `key`, dropping its value. Returns whether it was present.
    pub fn delete(&mut self, key: i32) -> bool {
        self.remove(key).is_some()
    }

    /// Swaps the value stored under an existing `key` without relinking.
    ///
    /// Returns the previous value, or gives `value` back if `key` is absent.
    pub fn replace(&mut self, key: i32, value: V) -> Result<V, V> {
        match self.find(key) {
            Some(idx) => Ok(std::mem::replace(&mut self.node_mut(idx).value, value)),
            None => Err(value),
        }
    }

    /// Drops every entry and resets the list to its freshly created state.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.head.iter_mut().for_each(|link| *link = None);
        self.top_level = 0;
        self.len = 0;
    }

    /// Ascending `(key, &value)` walk along level 0.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            list: self,
            next: self.head[0],
            remaining: self.len,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = i32> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Keys linked at a single level, left to right. Empty above `top_level`.
    pub fn level_keys(&self, level: usize) -> LevelKeys<'_, V> {
        LevelKeys {
            list: self,
            level,
            next: self.head.get(level).copied().flatten(),
        }
    }

    // -------------------- internals --------------------

    fn node(&self, idx: usize) -> &Node<V> {
        match self.nodes[idx].as_ref() {
            Some(node) => node,
            None => unreachable!("link to vacant arena slot {}", idx),
        }
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node<V> {
        match self.nodes[idx].as_mut() {
            Some(node) => node,
            None => unreachable!("link to vacant arena slot {}", idx),
        }
    }

    fn next(&self, at: Cursor, level: usize) -> Option<usize> {
        match at {
            Cursor::Head => self.head[level],
            Cursor::Node(idx) => self.node(idx).forward[level],
        }
    }

    fn set_next(&mut self, at: Cursor, level: usize, to: Option<usize>) {
        match at {
            Cursor::Head => self.head[level] = to,
            Cursor::Node(idx) => self.node_mut(idx).forward[level] = to,
        }
    }

    /// Advances along `level` while the successor's key is below `key`.
    fn advance(&self, mut cur: Cursor, level: usize, key: i32) -> Cursor {
        while let Some(idx) = self.next(cur, level) {
            if self.node(idx).key >= key {
                break;
            }
            cur = Cursor::Node(idx);
        }
        cur
    }

    fn find(&self, key: i32) -> Option<usize> {
        let mut cur = Cursor::Head;
        for level in (0..=self.top_level).rev() {
            cur = self.advance(cur, level, key);
        }
        self.next(cur, 0).filter(|&idx| self.node(idx).key == key)
    }

    /// Last node before `key` at each level. Slots above `top_level` stay `Head`.
    fn find_update(&self, key: i32) -> [Cursor; MAX_LEVEL] {
        let mut update = [Cursor::Head; MAX_LEVEL];
        let mut cur = Cursor::Head;
        for level in (0..=self.top_level).rev() {
            cur = self.advance(cur, level, key);
            update[level] = cur;
        }
        update
    }

    fn random_height(&mut self) -> usize {
        let mut height = 1;
        while height < MAX_LEVEL && self.rng.gen_bool(P) {
            height += 1;
        }
        height
    }
}

impl<V> Default for SkipList<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for SkipList<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkipList")
            .field("len", &self.len)
            .field("top_level", &self.top_level)
            .field("arena_slots", &self.nodes.len())
            .field("free_slots", &self.free.len())
            .finish()
    }
}

/// Renders every level from the top down, e.g. `Level 0: HEAD -> [1] -> NIL`.
impl<V> fmt::Display for SkipList<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for level in (0..=self.top_level).rev() {
            write!(f, "Level {}: HEAD -> ", level)?;
            for key in self.level_keys(level) {
                write!(f, "[{}] -> ", key)?;
            }
            writeln!(f, "NIL")?;
        }
        Ok(())
    }
}

impl<V> FromIterator<(i32, V)> for SkipList<V> {
    /// Builds a list, silently skipping negative and repeated keys.
    fn from_iter<I: IntoIterator<Item = (i32, V)>>(iter: I) -> Self {
        let mut list = SkipList::new();
        list.extend(iter);
        list
    }
}

impl<V> Extend<(i32, V)> for SkipList<V> {
    fn extend<I: IntoIterator<Item = (i32, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            let _ = self.insert(key, value);
        }
    }
}

impl<'a, V> IntoIterator for &'a SkipList<V> {
    type Item = (i32, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over entries in ascending key order. See [`SkipList::iter`].
pub struct Iter<'a, V> {
    list: &'a SkipList<V>,
    next: Option<usize>,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (i32, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.next?;
        let node = self.list.node(idx);
        self.next = node.forward[0];
        self.remaining = self.remaining.saturating_sub(1);
        Some((node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}
impl<V> FusedIterator for Iter<'_, V> {}

impl<V> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        Iter {
            list: self.list,
            next: self.next,
            remaining: self.remaining,
        }
    }
}

/// Keys along one level. See [`SkipList::level_keys`].
pub struct LevelKeys<'a, V> {
    list: &'a SkipList<V>,
    level: usize,
    next: Option<usize>,
}

impl<V> Iterator for LevelKeys<'_, V> {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        let idx = self.next?;
        let node = self.list.node(idx);
        self.next = node.forward[self.level];
        Some(node.key)
    }
}
