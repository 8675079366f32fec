//! Price derivation from leaf sort keys.

use crate::types::{Price, PRICE_DECIMALS};

/// Bits of the sort key below the price: the order sequence number
pub const SEQUENCE_BITS: u32 = 64;

/// Price lots encoded in a sort key
pub fn price_lots(sort_key: u128) -> u64 {
    // the shifted value always fits in 64 bits
    (sort_key >> SEQUENCE_BITS) as u64
}

/// Derive the price of a sort key: `(sort_key >> 64) / 10_000`, exactly
///
/// Keys that differ only in their sequence bits map to the same price.
pub fn derive_price(sort_key: u128) -> Price {
    Price::from_i128_with_scale(i128::from(price_lots(sort_key)), PRICE_DECIMALS)
}
