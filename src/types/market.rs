//! Market identity types.
//!
//! A proposal spawns two conditional markets, one per [`Branch`], and each
//! market has one book-side account per [`Side`]. A [`WatchTarget`] pins
//! one such account to the `(proposal, branch, side)` key it feeds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::order::Side;
use super::ProposalId;
use crate::error::Error;

/// 32-byte on-chain account address, displayed as base58
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AccountAddress([u8; 32]);

impl AccountAddress {
    /// Length of an address in bytes
    pub const LEN: usize = 32;

    /// Wrap raw address bytes
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw address bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for AccountAddress {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountAddress({})", self)
    }
}

impl FromStr for AccountAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        let written = bs58::decode(s)
            .onto(&mut bytes)
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", s, e)))?;
        if written != Self::LEN {
            return Err(Error::InvalidAddress(format!(
                "{}: decodes to {} bytes, expected {}",
                s,
                written,
                Self::LEN
            )));
        }
        Ok(Self(bytes))
    }
}

impl Serialize for AccountAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AccountAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Conditional outcome a market trades on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Branch {
    /// Market settles if the proposal passes
    Pass,
    /// Market settles if the proposal fails
    Fail,
}

impl Branch {
    /// Lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            Branch::Pass => "pass",
            Branch::Fail => "fail",
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Branch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pass" => Ok(Branch::Pass),
            "fail" => Ok(Branch::Fail),
            other => Err(Error::Config(format!("unknown branch: {}", other))),
        }
    }
}

/// Identity of one ladder: a side of a branch market of a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WatchKey {
    /// Proposal number
    pub proposal_id: ProposalId,
    /// Pass or fail market
    pub branch: Branch,
    /// Bid or ask book
    pub side: Side,
}

impl WatchKey {
    /// Create a new key
    pub fn new(proposal_id: ProposalId, branch: Branch, side: Side) -> Self {
        Self {
            proposal_id,
            branch,
            side,
        }
    }
}

impl fmt::Display for WatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.proposal_id, self.branch, self.side)
    }
}

/// A book-side account to watch and the ladder it feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WatchTarget {
    /// Ladder identity
    pub key: WatchKey,
    /// Book-side account address
    pub account: AccountAddress,
}

impl WatchTarget {
    /// Create a new watch target
    pub fn new(key: WatchKey, account: AccountAddress) -> Self {
        Self { key, account }
    }
}

impl fmt::Display for WatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.account)
    }
}

/// Parses `proposal:branch:side:address`, e.g. `12:pass:bid:8BnEg...`
impl FromStr for WatchTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        let [proposal, branch, side, account] = parts.as_slice() else {
            return Err(Error::Config(format!(
                "watch target must be proposal:branch:side:address, got {:?}",
                s
            )));
        };

        let proposal_id = proposal
            .parse()
            .map_err(|e| Error::Config(format!("bad proposal id {:?}: {}", proposal, e)))?;

        Ok(Self {
            key: WatchKey::new(proposal_id, branch.parse()?, side.parse()?),
            account: account.parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "opnb2LAfJYbRMAHHvqjCwQxanZn7ReEHp1k81EohpZb";

    #[test]
    fn test_address_base58_roundtrip() {
        let addr: AccountAddress = SAMPLE.parse().unwrap();
        assert_eq!(addr.to_string(), SAMPLE);
    }

    #[test]
    fn test_address_rejects_short_input() {
        assert!(matches!(
            "abc".parse::<AccountAddress>(),
            Err(Error::InvalidAddress(_))
        ));
        assert!("not-base58!".parse::<AccountAddress>().is_err());
    }

    #[test]
    fn test_address_serializes_as_string() {
        let addr: AccountAddress = SAMPLE.parse().unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", SAMPLE));
        let back: AccountAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn test_parse_watch_target() {
        let target: WatchTarget = format!("7:fail:ask:{}", SAMPLE).parse().unwrap();
        assert_eq!(target.key, WatchKey::new(7, Branch::Fail, Side::Ask));
        assert_eq!(target.account.to_string(), SAMPLE);
        assert_eq!(target.to_string(), format!("7:fail:ask:{}", SAMPLE));
    }

    #[test]
    fn test_parse_watch_target_errors() {
        assert!("7:fail:ask".parse::<WatchTarget>().is_err());
        assert!(format!("x:fail:ask:{}", SAMPLE).parse::<WatchTarget>().is_err());
        assert!(format!("7:maybe:ask:{}", SAMPLE).parse::<WatchTarget>().is_err());
    }
}
