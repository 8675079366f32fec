//! Book side.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One half of a market's resting orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy orders - best price is the highest
    Bid,
    /// Sell orders - best price is the lowest
    Ask,
}

impl Side {
    /// Lowercase name, as used in configuration and serialized output
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Bid => "bid",
            Side::Ask => "ask",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bid" | "bids" => Ok(Side::Bid),
            "ask" | "asks" => Ok(Side::Ask),
            other => Err(Error::Config(format!("unknown side: {}", other))),
        }
    }
}
