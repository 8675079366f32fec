//! Per-update pipeline: raw book-side bytes to an [`OrderBookSnapshot`].
//!
//! ```text
//! RawUpdate bytes
//!   -> decode_layout::<BookSideAccount>   (SchemaMismatch)
//!   -> classify                           (unknown tags skipped)
//!   -> extract per leaf                   (MalformedLeaf)
//!   -> aggregate by derived price         (QuantityOverflow)
//!   -> assemble ladder for the side
//! ```
//!
//! The pipeline is pure: the same bytes always produce the same snapshot,
//! and a failure leaves nothing behind. One bad leaf drops the whole update
//! so a partially decoded book is never published.

use serde::Serialize;
use tracing::debug;

use super::aggregate::aggregate;
use super::ladder::Ladder;
use super::leaf::{extract, LeafRecord};
use super::tree::classify;
use crate::error::Error;
use crate::layout::{decode_layout, BookSideAccount};
use crate::types::{AccountAddress, RawUpdate, Slot, WatchKey, WatchTarget};

/// Fully assembled ladder for one `(proposal, branch, side)` at one slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBookSnapshot {
    key: WatchKey,
    account: AccountAddress,
    slot: Slot,
    leaf_count: usize,
    ladder: Ladder,
}

impl OrderBookSnapshot {
    /// Ladder identity
    pub fn key(&self) -> WatchKey {
        self.key
    }

    /// Book-side account the snapshot was decoded from
    pub fn account(&self) -> AccountAddress {
        self.account
    }

    /// Slot the account state was observed at
    pub fn slot(&self) -> Slot {
        self.slot
    }

    /// Number of resting orders that went into the ladder
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// The ladder itself
    pub fn ladder(&self) -> &Ladder {
        &self.ladder
    }
}

/// Decode every leaf of a book-side buffer
///
/// # Errors
///
/// [`Error::Decode`] on a schema mismatch or the first malformed leaf.
pub fn decode_leaves(data: &[u8]) -> Result<Vec<LeafRecord>, Error> {
    let book: BookSideAccount = decode_layout(data)?;
    let records = classify(&book)
        .into_iter()
        .map(extract)
        .collect::<Result<Vec<_>, _>>()?;

    let expected = book.leaf_count() as usize;
    if records.len() != expected {
        debug!(
            found = records.len(),
            expected, "leaf count differs from tree roots"
        );
    }

    Ok(records)
}

/// Run the full pipeline for one update
///
/// # Errors
///
/// - [`Error::AccountMismatch`] if the update is not from `target.account`
/// - [`Error::Decode`] if the bytes are not a valid book side
/// - [`Error::QuantityOverflow`] if a level's total overflows
pub fn process_update(target: &WatchTarget, update: &RawUpdate) -> Result<OrderBookSnapshot, Error> {
    if update.account != target.account {
        return Err(Error::AccountMismatch {
            expected: target.account,
            got: update.account,
        });
    }

    let records = decode_leaves(&update.data)?;
    let levels = aggregate(&records)?;
    let ladder = Ladder::assemble(&levels, target.key.side);

    debug!(
        proposal = target.key.proposal_id,
        branch = %target.key.branch,
        side = %target.key.side,
        slot = update.slot,
        leaves = records.len(),
        levels = ladder.len(),
        "assembled ladder"
    );

    Ok(OrderBookSnapshot {
        key: target.key,
        account: update.account,
        slot: update.slot,
        leaf_count: records.len(),
        ladder,
    })
}
