//! Leaf record extraction.
//!
//! The node slab stores a leaf as `tag + 87 payload bytes`, and the
//! classifier hands out only the payload. The standalone `LeafNode` layout
//! starts with the tag byte, so [`extract`] prepends a synthetic leaf tag
//! before decoding. The slab layout owns the tag and the leaf layout
//! repeats it.

use super::tree::{LeafPayload, NodeTag};
use crate::error::DecodeError;
use crate::layout::leaf::LEAF_NODE_SIZE;
use crate::layout::{decode_layout, LeafNode};
use crate::types::{AccountAddress, Quantity};

/// A resting order pulled out of the book side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafRecord {
    /// Open-orders account that owns the order
    pub owner: AccountAddress,
    /// Remaining quantity in base lots
    pub quantity: Quantity,
    /// Price lots (high 64 bits) and sequence number (low 64 bits)
    pub sort_key: u128,
    /// Slot in the owner's open-orders account
    pub owner_slot: u8,
    /// Seconds until expiry after `timestamp` (0 = good till cancelled)
    pub time_in_force: u16,
    /// Unix time the order was placed
    pub timestamp: u64,
    /// Limit for oracle-pegged orders (-1 = none)
    pub peg_limit: i64,
    /// Client-assigned order ID
    pub client_order_id: u64,
}

/// Decode one leaf payload into a record
///
/// # Errors
///
/// [`DecodeError::MalformedLeaf`] if the payload length does not match the
/// leaf layout or the quantity is negative.
pub fn extract(payload: LeafPayload<'_>) -> Result<LeafRecord, DecodeError> {
    let expected = LEAF_NODE_SIZE - 1;
    if payload.bytes.len() != expected {
        return Err(DecodeError::malformed_leaf(
            payload.index,
            format!(
                "payload is {} bytes, expected {}",
                payload.bytes.len(),
                expected
            ),
        ));
    }

    let mut prefixed = [0u8; LEAF_NODE_SIZE];
    prefixed[0] = NodeTag::Leaf as u8;
    prefixed[1..].copy_from_slice(payload.bytes);

    let leaf: LeafNode = decode_layout(&prefixed)
        .map_err(|e| DecodeError::malformed_leaf(payload.index, e.to_string()))?;

    let quantity = Quantity::try_from(leaf.quantity).map_err(|_| {
        DecodeError::malformed_leaf(
            payload.index,
            format!("negative quantity {}", leaf.quantity),
        )
    })?;

    Ok(LeafRecord {
        owner: AccountAddress::new(leaf.owner),
        quantity,
        sort_key: leaf.key(),
        owner_slot: leaf.owner_slot,
        time_in_force: leaf.time_in_force,
        timestamp: leaf.timestamp,
        peg_limit: leaf.peg_limit,
        client_order_id: leaf.client_order_id,
    })
}
