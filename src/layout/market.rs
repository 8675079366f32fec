//! Prefix of the OpenBook v2 `Market` account.
//!
//! Only the fields up to the event heap are declared; discovery needs the
//! `bids` and `asks` book-side addresses and nothing after them.

use bytemuck::{Pod, Zeroable};

use super::{check_discriminator, read_pod, Layout};
use crate::error::DecodeError;
use crate::types::AccountAddress;

/// Leading fields of an OpenBook v2 market
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MarketAccount {
    /// Anchor discriminator of `Market`
    pub discriminator: [u8; 8],
    /// PDA bump
    pub bump: u8,
    /// Base mint decimals
    pub base_decimals: u8,
    /// Quote mint decimals
    pub quote_decimals: u8,
    /// Alignment padding
    pub padding: [u8; 5],
    /// Market PDA authority
    pub market_authority: [u8; 32],
    /// Unix time after which the market can be closed (0 = never)
    pub time_expiry: i64,
    /// Admin allowed to collect fees
    pub collect_fee_admin: [u8; 32],
    /// Optional open-orders admin (zero = none)
    pub open_orders_admin: [u8; 32],
    /// Optional consume-events admin (zero = none)
    pub consume_events_admin: [u8; 32],
    /// Optional close-market admin (zero = none)
    pub close_market_admin: [u8; 32],
    /// Zero-padded market name
    pub name: [u8; 16],
    /// Bids book side
    pub bids: [u8; 32],
    /// Asks book side
    pub asks: [u8; 32],
    /// Event heap
    pub event_heap: [u8; 32],
}

const _: () = assert!(std::mem::size_of::<MarketAccount>() == 296);

impl MarketAccount {
    /// Bids book-side address
    pub fn bids(&self) -> AccountAddress {
        AccountAddress::new(self.bids)
    }

    /// Asks book-side address
    pub fn asks(&self) -> AccountAddress {
        AccountAddress::new(self.asks)
    }

    /// Market name with padding stripped
    pub fn name(&self) -> String {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(self.name.len());
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }
}

impl Layout<'_> for MarketAccount {
    const NAME: &'static str = "Market";
    const LEN: usize = std::mem::size_of::<MarketAccount>();
    const ALLOWS_TRAILING_BYTES: bool = true;

    fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let market: MarketAccount = read_pod(Self::NAME, bytes)?;
        check_discriminator(Self::NAME, &market.discriminator)?;
        Ok(market)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{account_discriminator, decode_layout};

    #[test]
    fn test_decode_book_side_addresses() {
        let mut buf = vec![0u8; 848];
        buf[..8].copy_from_slice(&account_discriminator("Market"));
        buf[184..191].copy_from_slice(b"META-Y\0");
        buf[200..232].copy_from_slice(&[1u8; 32]);
        buf[232..264].copy_from_slice(&[2u8; 32]);

        let market: MarketAccount = decode_layout(&buf).unwrap();
        assert_eq!(market.bids(), AccountAddress::new([1u8; 32]));
        assert_eq!(market.asks(), AccountAddress::new([2u8; 32]));
        assert_eq!(market.name(), "META-Y");
    }

    #[test]
    fn test_rejects_other_accounts() {
        let mut buf = vec![0u8; 296];
        buf[..8].copy_from_slice(&account_discriminator("BookSide"));
        assert!(decode_layout::<MarketAccount>(&buf).is_err());
    }
}
