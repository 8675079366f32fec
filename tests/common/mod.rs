//! Shared builders for synthetic `BookSide` buffers.

#![allow(dead_code)]

use futarchy_ladder::types::{AccountAddress, Branch, RawUpdate, Side, WatchKey, WatchTarget};
use sha2::{Digest, Sha256};

// OpenBook v2 IDL offsets, not taken from the crate's layout constants.

/// Size of a `BookSide` account
pub const BOOK_SIDE_LEN: usize = 90_952;
/// Offset of the first node slot
pub const NODES_OFFSET: usize = 840;
/// Bytes per node slot
pub const NODE_SIZE: usize = 88;
/// Offset of the first root's leaf count
const ROOT_LEAF_COUNT_OFFSET: usize = 12;

/// `sha256("account:BookSide")[..8]`
pub fn book_side_discriminator() -> [u8; 8] {
    let digest = Sha256::digest(b"account:BookSide");
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

/// Builder for a book-side account buffer
#[derive(Debug, Clone)]
pub struct BookBuilder {
    buf: Vec<u8>,
    next_slot: usize,
    leaves: u32,
}

impl Default for BookBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BookBuilder {
    pub fn new() -> Self {
        let mut buf = vec![0u8; BOOK_SIDE_LEN];
        buf[..8].copy_from_slice(&book_side_discriminator());
        Self {
            buf,
            next_slot: 0,
            leaves: 0,
        }
    }

    /// Add a leaf at the next free slot; `price_lots` is price * 10^4
    pub fn leaf(mut self, price_lots: u64, quantity: i64) -> Self {
        let slot = self.next_slot;
        self.write_leaf(slot, price_lots, quantity);
        self.next_slot += 1;
        self
    }

    /// Add a leaf at a specific node slot
    pub fn leaf_at(mut self, slot: usize, price_lots: u64, quantity: i64) -> Self {
        self.write_leaf(slot, price_lots, quantity);
        self.next_slot = self.next_slot.max(slot + 1);
        self
    }

    /// Mark a slot with an arbitrary tag byte
    pub fn tag_at(mut self, slot: usize, tag: u8) -> Self {
        self.buf[NODES_OFFSET + slot * NODE_SIZE] = tag;
        self.next_slot = self.next_slot.max(slot + 1);
        self
    }

    /// Append bytes past the fixed layout
    pub fn trailing(mut self, extra: usize) -> Self {
        self.buf.resize(self.buf.len() + extra, 0xAB);
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        self.buf[ROOT_LEAF_COUNT_OFFSET..ROOT_LEAF_COUNT_OFFSET + 4]
            .copy_from_slice(&self.leaves.to_le_bytes());
        self.buf
    }

    fn write_leaf(&mut self, slot: usize, price_lots: u64, quantity: i64) {
        let at = NODES_OFFSET + slot * NODE_SIZE;
        let key = (u128::from(price_lots) << 64) | slot as u128;
        self.buf[at] = 2;
        self.buf[at + 8..at + 24].copy_from_slice(&key.to_le_bytes());
        self.buf[at + 24..at + 56].copy_from_slice(&[slot as u8; 32]);
        self.buf[at + 56..at + 64].copy_from_slice(&quantity.to_le_bytes());
        self.leaves += 1;
    }
}

pub fn address(n: u8) -> AccountAddress {
    AccountAddress::new([n; 32])
}

pub fn target(proposal_id: u64, branch: Branch, side: Side, account: u8) -> WatchTarget {
    WatchTarget::new(WatchKey::new(proposal_id, branch, side), address(account))
}

pub fn update(target: &WatchTarget, data: Vec<u8>, slot: u64) -> RawUpdate {
    RawUpdate::new(target.account, data, slot)
}
