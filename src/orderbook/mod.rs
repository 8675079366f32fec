//! Book-side decoding and ladder assembly.
//!
//! Turns a raw `BookSide` account into a sorted, aggregated price ladder:
//!
//! - [`tree`] - Split the node slab into inner, leaf and free slots
//! - [`leaf`] - Decode leaf payloads into [`LeafRecord`]s
//! - [`price`] - Derive a fixed-point price from a leaf's sort key
//! - [`aggregate`] - Sum quantities per price
//! - [`ladder`] - Sort levels best-first into an immutable [`Ladder`]
//! - [`pipeline`] - Run all of the above for one update
//! - [`manager`] - Per-account tasks and the latest snapshot per key
//!
//! # Example
//!
//! ```rust
//! use futarchy_ladder::orderbook::process_update;
//! use futarchy_ladder::types::{RawUpdate, WatchTarget};
//!
//! # fn example(target: WatchTarget, update: RawUpdate) -> futarchy_ladder::Result<()> {
//! let snapshot = process_update(&target, &update)?;
//!
//! for level in snapshot.ladder().top(5) {
//!     println!("{} @ {}", level.quantity, level.price);
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod ladder;
pub mod leaf;
pub mod manager;
pub mod pipeline;
pub mod price;
pub mod tree;

pub use aggregate::aggregate;
pub use ladder::{assemble, Ladder, PriceLevel};
pub use leaf::{extract, LeafRecord};
pub use manager::{LadderEvent, LadderManager, UpdateFailure, WatchHandle};
pub use pipeline::{decode_leaves, process_update, OrderBookSnapshot};
pub use price::derive_price;
pub use tree::{classify, LeafPayload, NodeTag, TreeNode};
