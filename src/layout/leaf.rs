//! Standalone `LeafNode` layout.

use bytemuck::{Pod, Zeroable};

use super::{read_pod, Layout};
use crate::error::DecodeError;

/// A resting order, as stored in a book-side node slot (88 bytes)
///
/// | offset | field |
/// |---|---|
/// | 0 | tag `u8` |
/// | 1 | owner_slot `u8` |
/// | 2 | time_in_force `u16` |
/// | 4 | padding (4) |
/// | 8 | key `u128` |
/// | 24 | owner `[u8; 32]` |
/// | 56 | quantity `i64` |
/// | 64 | timestamp `u64` |
/// | 72 | peg_limit `i64` |
/// | 80 | client_order_id `u64` |
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct LeafNode {
    /// Node tag byte
    pub tag: u8,
    /// Index into the owner's open-orders slots
    pub owner_slot: u8,
    /// Seconds after `timestamp` the order expires (0 = never)
    pub time_in_force: u16,
    /// Alignment padding
    pub padding: [u8; 4],
    /// Little-endian `u128` sort key; kept as bytes so the struct has the
    /// program's 8-byte alignment. Read it with [`LeafNode::key`].
    pub key_bytes: [u8; 16],
    /// Open-orders account holding the order
    pub owner: [u8; 32],
    /// Remaining quantity in base lots
    pub quantity: i64,
    /// Unix time the order was placed
    pub timestamp: u64,
    /// Price limit for oracle-pegged orders (-1 = none)
    pub peg_limit: i64,
    /// Client-assigned order ID
    pub client_order_id: u64,
}

/// Encoded size of a leaf node
pub const LEAF_NODE_SIZE: usize = 88;

const _: () = assert!(std::mem::size_of::<LeafNode>() == LEAF_NODE_SIZE);

impl LeafNode {
    /// Price lots in the high 64 bits, sequence number in the low 64
    pub fn key(&self) -> u128 {
        u128::from_le_bytes(self.key_bytes)
    }
}

impl Layout<'_> for LeafNode {
    const NAME: &'static str = "LeafNode";
    const LEN: usize = LEAF_NODE_SIZE;

    fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        read_pod(Self::NAME, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::decode_layout;

    #[test]
    fn test_decode_leaf_fields() {
        let mut buf = [0u8; 88];
        buf[0] = 2;
        buf[1] = 5;
        buf[2..4].copy_from_slice(&30u16.to_le_bytes());
        let key = (1_234_500u128 << 64) | 99;
        buf[8..24].copy_from_slice(&key.to_le_bytes());
        buf[24..56].copy_from_slice(&[7u8; 32]);
        buf[56..64].copy_from_slice(&42i64.to_le_bytes());
        buf[64..72].copy_from_slice(&1_700_000_000u64.to_le_bytes());
        buf[72..80].copy_from_slice(&(-1i64).to_le_bytes());
        buf[80..88].copy_from_slice(&77u64.to_le_bytes());

        let leaf: LeafNode = decode_layout(&buf).unwrap();
        assert_eq!(leaf.tag, 2);
        assert_eq!(leaf.owner_slot, 5);
        assert_eq!(leaf.time_in_force, 30);
        assert_eq!(leaf.key(), key);
        assert_eq!(leaf.owner, [7u8; 32]);
        assert_eq!(leaf.quantity, 42);
        assert_eq!(leaf.timestamp, 1_700_000_000);
        assert_eq!(leaf.peg_limit, -1);
        assert_eq!(leaf.client_order_id, 77);
    }

    #[test]
    fn test_leaf_requires_exact_length() {
        assert_eq!(LeafNode::LEN, 88);
        assert!(decode_layout::<LeafNode>(&[0u8; 87]).is_err());
        assert!(decode_layout::<LeafNode>(&[0u8; 89]).is_err());
    }
}
