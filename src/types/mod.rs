//! Shared domain types.
//!
//! - [`order`] - Book side (bid / ask)
//! - [`market`] - Account addresses, proposal branches and watch targets
//! - [`messages`] - Raw updates and JSON-RPC wire messages

pub mod market;
pub mod messages;
pub mod order;

pub use market::{AccountAddress, Branch, WatchKey, WatchTarget};
pub use messages::RawUpdate;
pub use order::Side;

/// Price in quote units with four fractional digits
///
/// Derived from the price lots stored in the high 64 bits of a leaf's sort
/// key, divided by [`PRICE_SCALE`]. A fixed-point decimal keeps equal
/// prices equal when used as an aggregation key, which a float would not.
pub type Price = rust_decimal::Decimal;

/// Number of fractional digits carried by [`Price`]
pub const PRICE_DECIMALS: u32 = 4;

/// Price lots per whole quote unit (`10^PRICE_DECIMALS`)
pub const PRICE_SCALE: u64 = 10_000;

/// Quantity in base lots
pub type Quantity = u64;

/// Ledger slot at which an account state was observed
pub type Slot = u64;

/// Sequential proposal number assigned by the governance program
pub type ProposalId = u64;
