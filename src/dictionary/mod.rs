//! Ordered dictionary over a red-black tree, with a single built-in cursor.

use std::borrow::Borrow;
use std::fmt::{self, Debug, Display};

use log::debug;

use crate::error::{DictionaryError, Result};

mod rbtree;
mod validate;

use rbtree::{Color, NodeId, RBTree};

pub use validate::InvariantViolation;

/// A map from unique, totally ordered keys to values.
///
/// Lookups, insertions and removals are `O(log n)` in the worst case. Ordered
/// traversal goes through the dictionary's cursor: [`begin`](Self::begin) or
/// [`end`](Self::end) place it, [`next`](Self::next) and [`prev`](Self::prev)
/// move it, and it becomes undefined when it walks off either end or its
/// entry is removed.
pub struct Dictionary<K, V> {
    tree: RBTree<K, V>,
    current: NodeId,
}

impl<K, V> Dictionary<K, V> {
    pub fn new() -> Self {
        Self { tree: RBTree::new(), current: NodeId::NIL }
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every pair and leaves the cursor undefined.
    pub fn clear(&mut self) {
        debug!("clearing dictionary of {} entries", self.len());
        self.tree.clear();
        self.current = NodeId::NIL;
    }

    /// Places the cursor on the smallest key. Does nothing when empty.
    pub fn begin(&mut self) {
        if !self.is_empty() {
            self.current = self.tree.minimum(self.tree.root());
        }
    }

    /// Places the cursor on the largest key. Does nothing when empty.
    pub fn end(&mut self) {
        if !self.is_empty() {
            self.current = self.tree.maximum(self.tree.root());
        }
    }

    pub fn has_current(&self) -> bool {
        !self.current.is_nil()
    }

    pub fn current_key(&self) -> Result<&K> {
        match self.tree.entry(self.current) {
            Some((key, _)) => Ok(key),
            None => Err(DictionaryError::NoCurrent { op: "current_key" }),
        }
    }

    pub fn current_val(&self) -> Result<&V> {
        match self.tree.entry(self.current) {
            Some((_, value)) => Ok(value),
            None => Err(DictionaryError::NoCurrent { op: "current_val" }),
        }
    }

    pub fn current_val_mut(&mut self) -> Result<&mut V> {
        match self.tree.entry_mut(self.current) {
            Some((_, value)) => Ok(value),
            None => Err(DictionaryError::NoCurrent { op: "current_val" }),
        }
    }

    /// Moves the cursor to the next key, leaving it undefined past the last.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<()> {
        if !self.has_current() {
            return Err(DictionaryError::NoCurrent { op: "next" });
        }
        self.current = self.tree.successor(self.current);
        Ok(())
    }

    /// Moves the cursor to the previous key, leaving it undefined before the
    /// first.
    pub fn prev(&mut self) -> Result<()> {
        if !self.has_current() {
            return Err(DictionaryError::NoCurrent { op: "prev" });
        }
        self.current = self.tree.predecessor(self.current);
        Ok(())
    }

    /// Keys in pre-order, one per line, with red nodes marked ` (RED)`.
    ///
    /// This shows the shape of the tree and is meant for inspection only.
    pub fn pre_string(&self) -> String
    where
        K: Display,
    {
        let mut out = String::new();
        self.tree.walk_pre_order(|node| {
            let key = self.tree.key(node);
            let line = match self.tree.color(node) {
                Color::Red => format!("{key} (RED)\n"),
                Color::Black => format!("{key}\n"),
            };
            out.push_str(&line);
        });
        out
    }
}

impl<K: Ord, V> Dictionary<K, V> {
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        !self.tree.search(key).is_nil()
    }

    pub fn get_value<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.tree.entry(self.tree.search(key)) {
            Some((_, value)) => Ok(value),
            None => Err(DictionaryError::MissingKey { op: "get_value" }),
        }
    }

    /// Mutable access to the value stored under `key`.
    ///
    /// The borrow ends before any further mutation of the dictionary, so a
    /// handle can never outlive a structural change.
    pub fn get_value_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.tree.search(key);
        match self.tree.entry_mut(node) {
            Some((_, value)) => Ok(value),
            None => Err(DictionaryError::MissingKey { op: "get_value" }),
        }
    }

    /// Stores `value` under `key`, returning the value it overwrote.
    ///
    /// Overwriting never changes the shape of the tree.
    pub fn set_value(&mut self, key: K, value: V) -> Option<V> {
        self.tree.insert(key, value).1
    }

    /// Removes `key` and returns its value. If its pair was under the cursor,
    /// the cursor becomes undefined; otherwise it stays on the same pair.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.tree.search(key);
        if node.is_nil() {
            return Err(DictionaryError::MissingKey { op: "remove" });
        }
        if node == self.current {
            debug!("removing the entry under the cursor");
            self.current = NodeId::NIL;
        }
        let (_, value) = self.tree.delete(node);
        Ok(value)
    }

    /// Checks every red-black and ordering invariant, returning the black
    /// height of the tree.
    pub fn validate(&self) -> std::result::Result<usize, InvariantViolation> {
        self.tree.validate()
    }
}

impl<K, V> Default for Dictionary<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies by re-inserting the pairs in pre-order. The copy holds the same
/// pairs but derives its own colouring, and its cursor is undefined.
impl<K: Ord + Clone, V: Clone> Clone for Dictionary<K, V> {
    fn clone(&self) -> Self {
        let mut copy = Self::new();
        self.tree.walk_pre_order(|node| {
            if let Some((key, value)) = self.tree.entry(node) {
                copy.set_value(key.clone(), value.clone());
            }
        });
        debug!("copied dictionary of {} entries", copy.len());
        copy
    }
}

/// Two dictionaries are equal when they hold the same pairs, whatever the
/// shape of their trees.
impl<K: PartialEq, V: PartialEq> PartialEq for Dictionary<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.tree.in_order().eq(other.tree.in_order())
    }
}

impl<K: Eq, V: Eq> Eq for Dictionary<K, V> {}

/// One `key : value` line per pair, in key order.
impl<K: Display, V: Display> Display for Dictionary<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.tree.in_order() {
            writeln!(f, "{key} : {value}")?;
        }
        Ok(())
    }
}

impl<K: Debug, V: Debug> Debug for Dictionary<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.tree.in_order().map(|(k, v)| (k, v))).finish()
    }
}

impl<K: Ord, V> Extend<(K, V)> for Dictionary<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set_value(key, value);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for Dictionary<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = Self::new();
        dict.extend(iter);
        dict
    }
}
