//! `BookSide` account layout.
//!
//! One side of an OpenBook v2 market stores its orders as a binary tree, but
//! on chain the tree is a flat slab of 1024 fixed-size node slots. Each slot
//! is a tag byte followed by 87 bytes whose meaning depends on the tag.
//! This module only decodes the slab; interpreting the tags is the
//! classifier's job.
//!
//! ```text
//! offset  size
//!      0     8  discriminator
//!      8    16  roots [OrderTreeRoot; 2]
//!     24    32  reserved roots [OrderTreeRoot; 4]
//!     56   256  reserved
//!    312     1  order_tree_type, then 3 bytes padding
//!    316    12  bump_index, free_list_len, free_list_head
//!    328   512  reserved
//!    840 90112  nodes [AnyNode; 1024], 88 bytes each
//! ```

use bytemuck::{Pod, Zeroable};

use super::{cast_slice, check_discriminator, read_pod, Layout};
use crate::error::DecodeError;

/// Node slots in a book side
pub const MAX_ORDERTREE_NODES: usize = 1024;

/// Bytes per node slot (tag + payload)
pub const NODE_SIZE: usize = 88;

/// Bytes of a node slot after the tag
pub const NODE_DATA_SIZE: usize = NODE_SIZE - 1;

/// Offset of the first node slot within the account
pub const NODES_OFFSET: usize = std::mem::size_of::<BookSideHeader>();

/// Root of one of the order trees sharing the slab
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct OrderTreeRoot {
    /// Index of the root node (meaningless when `leaf_count` is 0)
    pub maybe_node: u32,
    /// Number of leaves in this tree
    pub leaf_count: u32,
}

/// One raw node slot: tag plus untyped payload
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct AnyNode {
    /// Node discriminant
    pub tag: u8,
    /// Tag-specific payload
    pub data: [u8; NODE_DATA_SIZE],
}

impl std::fmt::Debug for AnyNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnyNode").field("tag", &self.tag).finish_non_exhaustive()
    }
}

/// Everything in a `BookSide` account before the node slab
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct BookSideHeader {
    /// Anchor discriminator of `BookSide`
    pub discriminator: [u8; 8],
    /// Fixed-price and oracle-pegged tree roots
    pub roots: [OrderTreeRoot; 2],
    /// Unused roots
    pub reserved_roots: [OrderTreeRoot; 4],
    /// Unused
    pub reserved: [u8; 256],
    /// Which side this slab belongs to (0 = bids, 1 = asks)
    pub order_tree_type: u8,
    /// Alignment padding
    pub padding: [u8; 3],
    /// Next never-used slot
    pub bump_index: u32,
    /// Length of the free list
    pub free_list_len: u32,
    /// Head of the free list
    pub free_list_head: u32,
    /// Unused
    pub reserved_nodes: [u8; 512],
}

const _: () = assert!(std::mem::size_of::<OrderTreeRoot>() == 8);
const _: () = assert!(std::mem::size_of::<AnyNode>() == NODE_SIZE);
const _: () = assert!(std::mem::size_of::<BookSideHeader>() == 840);

/// Decoded `BookSide` account
///
/// The header is copied out; the node slab borrows the account buffer.
#[derive(Debug, Clone, Copy)]
pub struct BookSideAccount<'a> {
    /// Roots, free list and tree type
    pub header: BookSideHeader,
    /// Node slab in storage order
    pub nodes: &'a [AnyNode],
}

impl BookSideAccount<'_> {
    /// Tree roots
    pub fn roots(&self) -> &[OrderTreeRoot; 2] {
        &self.header.roots
    }

    /// Total leaves according to the tree roots
    pub fn leaf_count(&self) -> u32 {
        self.header.roots.iter().map(|r| r.leaf_count).sum()
    }
}

impl<'a> Layout<'a> for BookSideAccount<'a> {
    const NAME: &'static str = "BookSide";
    const LEN: usize = NODES_OFFSET + MAX_ORDERTREE_NODES * NODE_SIZE;
    const ALLOWS_TRAILING_BYTES: bool = true;

    fn from_bytes(bytes: &'a [u8]) -> Result<Self, DecodeError> {
        if bytes.len() != Self::LEN {
            return Err(DecodeError::schema(
                Self::NAME,
                format!("layout needs {} bytes, got {}", Self::LEN, bytes.len()),
            ));
        }
        let (head, slab) = bytes.split_at(NODES_OFFSET);

        let header: BookSideHeader = read_pod(Self::NAME, head)?;
        check_discriminator(Self::NAME, &header.discriminator)?;
        let nodes = cast_slice(Self::NAME, slab)?;

        Ok(Self { header, nodes })
    }
}
