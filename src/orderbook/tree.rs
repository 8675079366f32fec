//! Tree node classification.
//!
//! The book-side slab is a flat array of tagged slots, not a linked tree.
//! Only leaf slots hold resting orders; inner slots route the tree and free
//! slots are unused capacity.

use tracing::trace;

use crate::error::UnknownTag;
use crate::layout::{AnyNode, BookSideAccount};

/// Discriminant of a node slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeTag {
    /// Never written
    Uninitialized = 0,
    /// Internal routing node
    Inner = 1,
    /// Resting order
    Leaf = 2,
    /// Released slot on the free list
    Free = 3,
    /// Tail of the free list
    LastFree = 4,
}

impl TryFrom<u8> for NodeTag {
    type Error = UnknownTag;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(NodeTag::Uninitialized),
            1 => Ok(NodeTag::Inner),
            2 => Ok(NodeTag::Leaf),
            3 => Ok(NodeTag::Free),
            4 => Ok(NodeTag::LastFree),
            other => Err(UnknownTag(other)),
        }
    }
}

/// Payload of a leaf slot, without its tag byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafPayload<'a> {
    /// Slot index within the slab
    pub index: usize,
    /// Bytes following the tag
    pub bytes: &'a [u8],
}

/// A node slot, interpreted by tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeNode<'a> {
    /// Routing node
    Inner,
    /// Resting order
    Leaf(LeafPayload<'a>),
    /// Unused slot (uninitialized or on the free list)
    Free,
}

impl<'a> TreeNode<'a> {
    /// Interpret the slot at `index`
    pub fn from_slot(index: usize, node: &'a AnyNode) -> Result<Self, UnknownTag> {
        Ok(match NodeTag::try_from(node.tag)? {
            NodeTag::Inner => TreeNode::Inner,
            NodeTag::Leaf => TreeNode::Leaf(LeafPayload {
                index,
                bytes: &node.data,
            }),
            NodeTag::Uninitialized | NodeTag::Free | NodeTag::LastFree => TreeNode::Free,
        })
    }
}

/// Collect the leaf payloads of a book side, in slab order
///
/// Inner and free slots are dropped. Slots with an unknown tag are skipped.
pub fn classify<'a>(book: &BookSideAccount<'a>) -> Vec<LeafPayload<'a>> {
    let nodes: &'a [AnyNode] = book.nodes;
    nodes
        .iter()
        .enumerate()
        .filter_map(|(index, node)| match TreeNode::from_slot(index, node) {
            Ok(TreeNode::Leaf(payload)) => Some(payload),
            Ok(TreeNode::Inner | TreeNode::Free) => None,
            Err(UnknownTag(tag)) => {
                trace!(index, tag, "skipping node with unknown tag");
                None
            }
        })
        .collect()
}
