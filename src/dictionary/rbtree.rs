use std::borrow::Borrow;
use std::cmp::Ordering;
use std::mem;

use log::trace;

// any node with height `h` has black height at least `h/2`, and the subtree
// at `x` holds at least `2^bh(x) - 1` nodes, so a tree with `n` nodes has
// height at most `2*log₂(n+1)`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

/// Index of a node slot in the tree's arena.
///
/// Slot 0 is the sentinel: it stands in for every missing child and for the
/// root's parent, and is always black.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

impl NodeId {
    pub(crate) const NIL: NodeId = NodeId(0);

    pub(crate) fn is_nil(self) -> bool {
        self == Self::NIL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    pub(crate) fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Links {
    color: Color,
    parent: NodeId,
    left: NodeId,
    right: NodeId,
}

impl Links {
    const SENTINEL: Links = Links {
        color: Color::Black,
        parent: NodeId::NIL,
        left: NodeId::NIL,
        right: NodeId::NIL,
    };
}

/// Arena-backed red-black tree.
///
/// Child links own their subtree; `parent` is a plain index used for walking
/// upwards and for rotations. Entries are stored apart from the links so the
/// sentinel can carry links without a key or value.
pub(crate) struct RBTree<K, V> {
    links: Vec<Links>,
    entries: Vec<Option<(K, V)>>,
    vacant: Vec<NodeId>,
    root: NodeId,
    len: usize,
}

impl<K, V> RBTree<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            links: vec![Links::SENTINEL],
            entries: vec![None],
            vacant: Vec::new(),
            root: NodeId::NIL,
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn color(&self, node: NodeId) -> Color {
        self.links[node.0].color
    }

    pub(crate) fn parent(&self, node: NodeId) -> NodeId {
        self.links[node.0].parent
    }

    pub(crate) fn left(&self, node: NodeId) -> NodeId {
        self.links[node.0].left
    }

    pub(crate) fn right(&self, node: NodeId) -> NodeId {
        self.links[node.0].right
    }

    pub(crate) fn child(&self, node: NodeId, side: Side) -> NodeId {
        match side {
            Side::Left => self.left(node),
            Side::Right => self.right(node),
        }
    }

    fn set_color(&mut self, node: NodeId, color: Color) {
        // the sentinel stays black no matter what the fix-ups ask for
        if !node.is_nil() {
            self.links[node.0].color = color;
        }
    }

    fn set_parent(&mut self, node: NodeId, parent: NodeId) {
        self.links[node.0].parent = parent;
    }

    fn set_child(&mut self, node: NodeId, side: Side, child: NodeId) {
        debug_assert!(!node.is_nil(), "the sentinel has no children to set");
        match side {
            Side::Left => self.links[node.0].left = child,
            Side::Right => self.links[node.0].right = child,
        }
    }

    /// Which child of its parent `node` is.
    ///
    /// For the sentinel this relies on its parent link having been set by the
    /// deletion that put it in place.
    fn side_of(&self, node: NodeId) -> Side {
        if node == self.left(self.parent(node)) {
            Side::Left
        } else {
            Side::Right
        }
    }

    pub(crate) fn entry(&self, node: NodeId) -> Option<&(K, V)> {
        self.entries[node.0].as_ref()
    }

    pub(crate) fn entry_mut(&mut self, node: NodeId) -> Option<&mut (K, V)> {
        self.entries[node.0].as_mut()
    }

    pub(crate) fn key(&self, node: NodeId) -> &K {
        match self.entry(node) {
            Some((key, _)) => key,
            None => unreachable!("node {node:?} has no entry"),
        }
    }

    fn value_mut(&mut self, node: NodeId) -> &mut V {
        match self.entry_mut(node) {
            Some((_, value)) => value,
            None => unreachable!("node {node:?} has no entry"),
        }
    }

    /// Leftmost node of the subtree at `node`, or the sentinel if it is empty.
    pub(crate) fn minimum(&self, mut node: NodeId) -> NodeId {
        if node.is_nil() {
            return node;
        }
        while !self.left(node).is_nil() {
            node = self.left(node);
        }
        node
    }

    /// Rightmost node of the subtree at `node`, or the sentinel if it is empty.
    pub(crate) fn maximum(&self, mut node: NodeId) -> NodeId {
        if node.is_nil() {
            return node;
        }
        while !self.right(node).is_nil() {
            node = self.right(node);
        }
        node
    }

    /// In-order successor, or the sentinel past the last node.
    pub(crate) fn successor(&self, mut node: NodeId) -> NodeId {
        if node.is_nil() {
            return node;
        }
        if !self.right(node).is_nil() {
            return self.minimum(self.right(node));
        }
        let mut parent = self.parent(node);
        while !parent.is_nil() && node == self.right(parent) {
            node = parent;
            parent = self.parent(parent);
        }
        parent
    }

    /// In-order predecessor, or the sentinel before the first node.
    pub(crate) fn predecessor(&self, mut node: NodeId) -> NodeId {
        if node.is_nil() {
            return node;
        }
        if !self.left(node).is_nil() {
            return self.maximum(self.left(node));
        }
        let mut parent = self.parent(node);
        while !parent.is_nil() && node == self.left(parent) {
            node = parent;
            parent = self.parent(parent);
        }
        parent
    }

    /// Entries in key order.
    pub(crate) fn in_order(&self) -> InOrder<'_, K, V> {
        InOrder { tree: self, node: self.minimum(self.root) }
    }

    /// Visits every node parent-first, left subtree before right.
    pub(crate) fn walk_pre_order(&self, mut f: impl FnMut(NodeId)) {
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if node.is_nil() {
                continue;
            }
            f(node);
            stack.push(self.right(node));
            stack.push(self.left(node));
        }
    }

    fn allocate(&mut self, key: K, value: V, parent: NodeId) -> NodeId {
        let links = Links {
            color: Color::Red,
            parent,
            left: NodeId::NIL,
            right: NodeId::NIL,
        };
        match self.vacant.pop() {
            Some(node) => {
                self.links[node.0] = links;
                self.entries[node.0] = Some((key, value));
                node
            }
            None => {
                let node = NodeId(self.links.len());
                self.links.push(links);
                self.entries.push(Some((key, value)));
                node
            }
        }
    }

    fn release(&mut self, node: NodeId) -> (K, V) {
        self.links[node.0] = Links::SENTINEL;
        self.vacant.push(node);
        match self.entries[node.0].take() {
            Some(entry) => entry,
            None => unreachable!("released node {node:?} twice"),
        }
    }

    /// Drops every node, children before their parent.
    pub(crate) fn clear(&mut self) {
        self.drop_subtree(self.root);
        self.links.truncate(1);
        self.entries.truncate(1);
        self.links[0] = Links::SENTINEL;
        self.vacant.clear();
        self.root = NodeId::NIL;
        self.len = 0;
    }

    fn drop_subtree(&mut self, node: NodeId) {
        if node.is_nil() {
            return;
        }
        let (left, right) = (self.left(node), self.right(node));
        self.drop_subtree(left);
        self.drop_subtree(right);
        self.entries[node.0] = None;
    }

    /// Replaces the subtree at `old` with the one at `new` in `old`'s parent.
    ///
    /// `new` may be the sentinel, whose parent link is still written.
    fn transplant(&mut self, old: NodeId, new: NodeId) {
        let parent = self.parent(old);
        if parent.is_nil() {
            self.root = new;
        } else {
            let side = self.side_of(old);
            self.set_child(parent, side, new);
        }
        self.set_parent(new, parent);
    }

    /// Rotates `node` down towards `dir`; its child on the other side takes
    /// its place. `rotate(x, Side::Left)` is the usual left rotation.
    fn rotate(&mut self, node: NodeId, dir: Side) {
        let riser = self.child(node, dir.opposite());
        if riser.is_nil() {
            return;
        }
        trace!("rotating {node:?} {dir:?} (riser {riser:?})");

        let inner = self.child(riser, dir);
        self.set_child(node, dir.opposite(), inner);
        if !inner.is_nil() {
            self.set_parent(inner, node);
        }
        self.transplant(node, riser);
        self.set_child(riser, dir, node);
        self.set_parent(node, riser);
    }

    /// Removes `node` from the tree, returning its entry.
    pub(crate) fn delete(&mut self, node: NodeId) -> (K, V) {
        debug_assert!(!node.is_nil(), "cannot delete the sentinel");

        let mut removed_color = self.color(node);
        let replacement;

        if self.left(node).is_nil() {
            replacement = self.right(node);
            self.transplant(node, replacement);
        } else if self.right(node).is_nil() {
            replacement = self.left(node);
            self.transplant(node, replacement);
        } else {
            // the successor moves into `node`'s position, keeping its identity
            let successor = self.minimum(self.right(node));
            removed_color = self.color(successor);
            replacement = self.right(successor);

            if self.parent(successor) == node {
                self.set_parent(replacement, successor);
            } else {
                self.transplant(successor, replacement);
                let right = self.right(node);
                self.set_child(successor, Side::Right, right);
                self.set_parent(right, successor);
            }

            self.transplant(node, successor);
            let left = self.left(node);
            self.set_child(successor, Side::Left, left);
            self.set_parent(left, successor);
            self.set_color(successor, self.color(node));
        }

        if removed_color == Color::Black {
            self.delete_fixup(replacement);
        }
        self.links[NodeId::NIL.0].parent = NodeId::NIL;

        self.len -= 1;
        self.release(node)
    }

    fn delete_fixup(&mut self, mut node: NodeId) {
        while node != self.root && self.color(node) == Color::Black {
            let parent = self.parent(node);
            let near = self.side_of(node);
            let far = near.opposite();
            let mut sibling = self.child(parent, far);

            if self.color(sibling) == Color::Red {
                trace!("delete fix-up at {node:?}: red sibling");
                self.set_color(sibling, Color::Black);
                self.set_color(parent, Color::Red);
                self.rotate(parent, near);
                sibling = self.child(parent, far);
            }

            if self.color(self.child(sibling, near)) == Color::Black
                && self.color(self.child(sibling, far)) == Color::Black
            {
                trace!("delete fix-up at {node:?}: black sibling with black children");
                self.set_color(sibling, Color::Red);
                node = parent;
            } else {
                if self.color(self.child(sibling, far)) == Color::Black {
                    trace!("delete fix-up at {node:?}: red near nephew");
                    let nephew = self.child(sibling, near);
                    self.set_color(nephew, Color::Black);
                    self.set_color(sibling, Color::Red);
                    self.rotate(sibling, far);
                    sibling = self.child(parent, far);
                }

                trace!("delete fix-up at {node:?}: red far nephew");
                self.set_color(sibling, self.color(parent));
                self.set_color(parent, Color::Black);
                let nephew = self.child(sibling, far);
                self.set_color(nephew, Color::Black);
                self.rotate(parent, near);
                node = self.root;
            }
        }
        self.set_color(node, Color::Black);
    }

    fn insert_fixup(&mut self, mut node: NodeId) {
        while self.color(self.parent(node)) == Color::Red {
            // a red parent is never the root, so the grandparent is real
            let parent = self.parent(node);
            let grandparent = self.parent(parent);
            let side = self.side_of(parent);
            let uncle = self.child(grandparent, side.opposite());

            if self.color(uncle) == Color::Red {
                trace!("insert fix-up at {node:?}: red uncle");
                self.set_color(parent, Color::Black);
                self.set_color(uncle, Color::Black);
                self.set_color(grandparent, Color::Red);
                node = grandparent;
                continue;
            }

            if node == self.child(parent, side.opposite()) {
                trace!("insert fix-up at {node:?}: inner child");
                node = parent;
                self.rotate(node, side);
            }

            trace!("insert fix-up at {node:?}: outer child");
            let parent = self.parent(node);
            let grandparent = self.parent(parent);
            self.set_color(parent, Color::Black);
            self.set_color(grandparent, Color::Red);
            self.rotate(grandparent, side.opposite());
        }
        self.set_color(self.root, Color::Black);
    }
}

pub(crate) struct InOrder<'a, K, V> {
    tree: &'a RBTree<K, V>,
    node: NodeId,
}

impl<'a, K, V> Iterator for InOrder<'a, K, V> {
    type Item = &'a (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.tree.entry(self.node)?;
        self.node = self.tree.successor(self.node);
        Some(entry)
    }
}

impl<K: Ord, V> RBTree<K, V> {
    pub(crate) fn search<Q>(&self, key: &Q) -> NodeId
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut node = self.root;
        while !node.is_nil() {
            node = match key.cmp(self.key(node).borrow()) {
                Ordering::Less => self.left(node),
                Ordering::Greater => self.right(node),
                Ordering::Equal => return node,
            };
        }
        node
    }

    /// Inserts `key`, or overwrites its value if it is already present.
    ///
    /// Returns the node now holding `key` and the value it replaced, if any.
    pub(crate) fn insert(&mut self, key: K, value: V) -> (NodeId, Option<V>) {
        let mut parent = NodeId::NIL;
        let mut side = Side::Left;
        let mut node = self.root;

        while !node.is_nil() {
            parent = node;
            side = match key.cmp(self.key(node)) {
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
                Ordering::Equal => {
                    let old = mem::replace(self.value_mut(node), value);
                    return (node, Some(old));
                }
            };
            node = self.child(node, side);
        }

        let node = self.allocate(key, value, parent);
        self.len += 1;
        if parent.is_nil() {
            self.root = node;
            self.set_color(node, Color::Black);
        } else {
            self.set_child(parent, side, node);
            self.insert_fixup(node);
        }
        (node, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::InvariantViolation;

    fn tree_of(keys: &[i32]) -> RBTree<i32, i32> {
        let mut tree = RBTree::new();
        for &k in keys {
            tree.insert(k, k * 10);
        }
        tree
    }

    fn in_order(tree: &RBTree<i32, i32>) -> Vec<i32> {
        tree.in_order().map(|&(k, _)| k).collect()
    }

    #[test]
    fn sentinel_is_black_and_empty() {
        let tree = RBTree::<i32, i32>::new();
        assert_eq!(tree.color(NodeId::NIL), Color::Black);
        assert!(tree.entry(NodeId::NIL).is_none());
        assert!(tree.root().is_nil());
        assert!(tree.minimum(tree.root()).is_nil());
    }

    #[test]
    fn ascending_inserts_rebalance() {
        let tree = tree_of(&[1, 2, 3]);
        // a line of three reds gets rotated into a balanced triple
        assert_eq!(*tree.key(tree.root()), 2);
        assert_eq!(tree.color(tree.root()), Color::Black);
        assert_eq!(tree.color(tree.left(tree.root())), Color::Red);
        assert_eq!(tree.color(tree.right(tree.root())), Color::Red);
    }

    #[test]
    fn inner_child_insert_rebalances() {
        let tree = tree_of(&[3, 1, 2]);
        assert_eq!(*tree.key(tree.root()), 2);
        assert_eq!(*tree.key(tree.left(tree.root())), 1);
        assert_eq!(*tree.key(tree.right(tree.root())), 3);
    }

    #[test]
    fn rotate_roundtrip_restores_shape() {
        let mut tree = tree_of(&[4, 2, 6, 1, 3, 5, 7]);
        let root = tree.root();
        tree.rotate(root, Side::Left);
        assert_eq!(*tree.key(tree.root()), 6);
        assert_eq!(tree.parent(root), tree.root());
        assert_eq!(in_order(&tree), [1, 2, 3, 4, 5, 6, 7]);

        let top = tree.root();
        tree.rotate(top, Side::Right);
        assert_eq!(tree.root(), root);
        assert_eq!(*tree.key(tree.right(root)), 6);
        assert_eq!(*tree.key(tree.left(tree.right(root))), 5);
        assert!(tree.parent(root).is_nil());
    }

    #[test]
    fn rotate_without_riser_is_noop() {
        let mut tree = tree_of(&[1]);
        let root = tree.root();
        tree.rotate(root, Side::Left);
        tree.rotate(root, Side::Right);
        assert_eq!(tree.root(), root);
    }

    #[test]
    fn successor_and_predecessor_walk() {
        let tree = tree_of(&[5, 3, 8, 1, 4, 7, 9]);
        let mut node = tree.maximum(tree.root());
        let mut seen = vec![];
        while !node.is_nil() {
            seen.push(*tree.key(node));
            node = tree.predecessor(node);
        }
        assert_eq!(seen, [9, 8, 7, 5, 4, 3, 1]);
        assert!(tree.successor(tree.maximum(tree.root())).is_nil());
    }

    #[test]
    fn insert_overwrites_existing() {
        let mut tree = tree_of(&[2, 1, 3]);
        let (node, old) = tree.insert(1, 99);
        assert_eq!(old, Some(10));
        assert_eq!(tree.entry(node), Some(&(1, 99)));
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn delete_two_child_node_keeps_successor_identity() {
        let mut tree = tree_of(&[4, 2, 6, 1, 3, 5, 7]);
        let successor = tree.search(&5);
        let target = tree.search(&4);
        assert_eq!(tree.delete(target), (4, 40));
        assert_eq!(tree.search(&5), successor);
        assert_eq!(in_order(&tree), [1, 2, 3, 5, 6, 7]);
        assert_eq!(tree.len(), 6);
    }

    #[test]
    fn vacant_slots_are_reused() {
        let mut tree = tree_of(&[1, 2, 3]);
        let slot = tree.search(&3);
        tree.delete(slot);
        let (node, _) = tree.insert(10, 100);
        assert_eq!(node, slot);
        assert_eq!(tree.links.len(), 4);
    }

    #[test]
    fn delete_down_to_empty() {
        let mut tree = tree_of(&[3, 1, 2]);
        for k in [2, 3, 1] {
            let node = tree.search(&k);
            tree.delete(node);
        }
        assert!(tree.root().is_nil());
        assert_eq!(tree.len(), 0);
        assert!(tree.parent(NodeId::NIL).is_nil());
    }

    #[test]
    fn clear_resets_arena() {
        let mut tree = tree_of(&[5, 2, 8, 1]);
        tree.clear();
        assert_eq!(tree.len(), 0);
        assert!(tree.root().is_nil());
        assert_eq!(tree.links.len(), 1);
        assert_eq!(tree.entries.len(), 1);
        tree.insert(1, 1);
        assert_eq!(in_order(&tree), [1]);
    }

    #[test]
    fn validate_reports_broken_invariants() {
        let mut tree = tree_of(&[2, 1, 3]);
        assert_eq!(tree.validate(), Ok(1));
        let left = tree.left(tree.root());
        tree.links[left.0].color = Color::Black;
        assert_eq!(tree.validate(), Err(InvariantViolation::BlackHeight { left: 1, right: 0 }));
        let root = tree.root();
        tree.links[root.0].color = Color::Red;
        assert_eq!(tree.validate(), Err(InvariantViolation::RedRoot));

        let mut tree = tree_of(&[2, 1, 3, 0]);
        let one = tree.search(&1);
        tree.links[one.0].color = Color::Red;
        assert_eq!(tree.validate(), Err(InvariantViolation::RedRed));

        let mut tree = tree_of(&[2, 1, 3]);
        let left = tree.left(tree.root());
        tree.entries[left.0] = Some((5, 0));
        assert_eq!(tree.validate(), Err(InvariantViolation::OutOfOrder));

        let mut tree = tree_of(&[2, 1, 3]);
        tree.len = 7;
        assert_eq!(tree.validate(), Err(InvariantViolation::SizeMismatch { recorded: 7, counted: 3 }));
    }

    #[test]
    fn pre_order_visits_parent_first() {
        let tree = tree_of(&[2, 1, 3]);
        let mut keys = vec![];
        tree.walk_pre_order(|n| keys.push(*tree.key(n)));
        assert_eq!(keys, [2, 1, 3]);
    }
}
