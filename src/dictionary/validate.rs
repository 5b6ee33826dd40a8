use thiserror::Error;

use super::rbtree::{Color, NodeId, RBTree};

/// A broken red-black or search-tree property, as found by
/// [`Dictionary::validate`](super::Dictionary::validate).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("the sentinel is not black")]
    RedSentinel,
    #[error("the root is not black")]
    RedRoot,
    #[error("the root has a parent")]
    RootHasParent,
    #[error("a red node has a red child")]
    RedRed,
    #[error("black heights differ below a node (left {left}, right {right})")]
    BlackHeight { left: usize, right: usize },
    #[error("keys are not strictly increasing in order")]
    OutOfOrder,
    #[error("a child does not point back at its parent")]
    BrokenParentLink,
    #[error("recorded size {recorded} but {counted} nodes are reachable")]
    SizeMismatch { recorded: usize, counted: usize },
}

impl<K: Ord, V> RBTree<K, V> {
    /// Checks every tree invariant, returning the root's black height.
    pub(crate) fn validate(&self) -> Result<usize, InvariantViolation> {
        if self.color(NodeId::NIL) != Color::Black {
            return Err(InvariantViolation::RedSentinel);
        }
        let root = self.root();
        if self.color(root) != Color::Black {
            return Err(InvariantViolation::RedRoot);
        }
        if !root.is_nil() && !self.parent(root).is_nil() {
            return Err(InvariantViolation::RootHasParent);
        }

        let (counted, black_height) = self.validate_subtree(root, None, None)?;
        if counted != self.len() {
            return Err(InvariantViolation::SizeMismatch { recorded: self.len(), counted });
        }
        Ok(black_height)
    }

    /// Returns the node count and black height of the subtree at `node`,
    /// whose keys must lie strictly between `lower` and `upper`.
    fn validate_subtree(
        &self,
        node: NodeId,
        lower: Option<&K>,
        upper: Option<&K>,
    ) -> Result<(usize, usize), InvariantViolation> {
        if node.is_nil() {
            return Ok((0, 0));
        }

        let key = self.key(node);
        if lower.is_some_and(|lower| lower >= key) || upper.is_some_and(|upper| upper <= key) {
            return Err(InvariantViolation::OutOfOrder);
        }

        let (left, right) = (self.left(node), self.right(node));
        for child in [left, right] {
            if !child.is_nil() && self.parent(child) != node {
                return Err(InvariantViolation::BrokenParentLink);
            }
        }
        if self.color(node) == Color::Red
            && (self.color(left) == Color::Red || self.color(right) == Color::Red)
        {
            return Err(InvariantViolation::RedRed);
        }

        let (left_count, left_height) = self.validate_subtree(left, lower, Some(key))?;
        let (right_count, right_height) = self.validate_subtree(right, Some(key), upper)?;
        if left_height != right_height {
            return Err(InvariantViolation::BlackHeight { left: left_height, right: right_height });
        }

        let own = usize::from(self.color(node) == Color::Black);
        Ok((left_count + right_count + 1, left_height + own))
    }
}
