//! Binary layouts of the on-chain accounts the ladder is built from.
//!
//! Fixed-size OpenBook v2 records are `#[repr(C)]` [`bytemuck::Pod`]
//! structs with the same field order and padding as the program, so decoding
//! is a length check plus a cast. Sizes are asserted at compile time. The
//! book-side node slab is borrowed straight from the account buffer.
//!
//! Anchor accounts with variable-length fields (autocrat proposals) are
//! borsh-encoded instead and live in [`autocrat`].
//!
//! - [`book_side`] - The `BookSide` account: tree roots plus a fixed slab of
//!   tagged nodes
//! - [`leaf`] - The standalone `LeafNode` record
//! - [`market`] - Prefix of the OpenBook v2 `Market` account
//! - [`autocrat`] - Autocrat `Proposal` and `TWAPMarket` accounts

pub mod autocrat;
// `derive(Pod)` expands to `unsafe impl`
#[allow(unsafe_code)]
pub mod book_side;
#[allow(unsafe_code)]
pub mod leaf;
#[allow(unsafe_code)]
pub mod market;

pub use autocrat::{decode_anchor_account, Proposal, ProposalState, TwapMarket};
pub use book_side::{AnyNode, BookSideAccount, BookSideHeader, OrderTreeRoot};
pub use leaf::LeafNode;
pub use market::MarketAccount;

use bytemuck::Pod;
use sha2::{Digest, Sha256};

use crate::error::DecodeError;

/// A fixed-size binary record, possibly borrowing from the buffer
pub trait Layout<'a>: Sized {
    /// Layout name, reported in decode errors
    const NAME: &'static str;

    /// Encoded size in bytes
    const LEN: usize;

    /// Whether a buffer longer than [`Self::LEN`] is accepted
    const ALLOWS_TRAILING_BYTES: bool = false;

    /// Build the record from exactly [`Self::LEN`] bytes
    fn from_bytes(bytes: &'a [u8]) -> Result<Self, DecodeError>;
}

/// Decode `bytes` as layout `L`
///
/// # Errors
///
/// [`DecodeError::SchemaMismatch`] if the length does not fit the layout or
/// the layout's own checks (e.g. discriminator) fail.
pub fn decode_layout<'a, L: Layout<'a>>(bytes: &'a [u8]) -> Result<L, DecodeError> {
    let len = bytes.len();
    if len < L::LEN {
        return Err(DecodeError::schema(
            L::NAME,
            format!("buffer is {} bytes, expected at least {}", len, L::LEN),
        ));
    }
    if len > L::LEN && !L::ALLOWS_TRAILING_BYTES {
        return Err(DecodeError::schema(
            L::NAME,
            format!("buffer is {} bytes, expected exactly {}", len, L::LEN),
        ));
    }

    L::from_bytes(&bytes[..L::LEN])
}

/// Copy a `Pod` value out of an unaligned buffer of exactly its size
pub fn read_pod<T: Pod>(layout: &'static str, bytes: &[u8]) -> Result<T, DecodeError> {
    bytemuck::try_pod_read_unaligned(bytes)
        .map_err(|e| DecodeError::schema(layout, format!("{:?} reading {} bytes", e, bytes.len())))
}

/// Borrow a buffer as a slice of `Pod` values
pub fn cast_slice<'a, T: Pod>(layout: &'static str, bytes: &'a [u8]) -> Result<&'a [T], DecodeError> {
    bytemuck::try_cast_slice(bytes)
        .map_err(|e| DecodeError::schema(layout, format!("{:?} casting {} bytes", e, bytes.len())))
}

/// Anchor account discriminator: first 8 bytes of `sha256("account:<Name>")`
pub fn account_discriminator(name: &str) -> [u8; 8] {
    let digest = Sha256::digest(format!("account:{}", name).as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

/// Fail unless `found` is the discriminator of account type `layout`
pub fn check_discriminator(layout: &'static str, found: &[u8]) -> Result<(), DecodeError> {
    if found != account_discriminator(layout).as_slice() {
        return Err(DecodeError::schema(
            layout,
            "account discriminator does not match",
        ));
    }
    Ok(())
}
