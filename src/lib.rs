//! # futarchy-ladder
//!
//! Live price ladders for futarchy proposal markets, decoded straight from
//! OpenBook v2 `BookSide` accounts.
//!
//! ## Features
//!
//! - **Borrowed node slab** - The 1024 book-side node slots are cast in
//!   place from the account buffer with `bytemuck`; the header and each
//!   88-byte leaf are copied out as `Pod` structs
//! - **Exact prices** - Sort keys become `rust_decimal` prices at four
//!   decimal places, never floats
//! - **Per-account tasks** - Each watched book side is processed strictly in
//!   order while different books run concurrently
//! - **Feed glue** - JSON-RPC seeding, proposal discovery, and pubsub
//!   streaming with reconnects
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use futarchy_ladder::client::{FeedMessage, ReconnectingSubscriber, RpcClient};
//! use futarchy_ladder::orderbook::LadderManager;
//! use futarchy_ladder::Config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), futarchy_ladder::Error> {
//!     let config = Config::from_env()?;
//!     let manager = Arc::new(LadderManager::new(config.event_capacity()));
//!     let rpc = RpcClient::new(&config)?;
//!     let mut feed = ReconnectingSubscriber::connect(config.clone()).await?;
//!
//!     for target in config.watches() {
//!         let seed = rpc.get_account_info(&target.account).await?;
//!         let _ = manager.handle_update(target, &seed);
//!         feed.account_subscribe(target.account).await?;
//!     }
//!
//!     while let Some(msg) = feed.next().await {
//!         if let FeedMessage::AccountUpdate(update) = msg? {
//!             for target in config.watches().iter().filter(|t| t.account == update.account) {
//!                 let _ = manager.handle_update(target, &update);
//!             }
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Price Representation
//!
//! The upper 64 bits of a leaf's sort key are the price in lots. Prices are
//! that integer scaled down by 10^4:
//! - key `1_000_000 << 64` = price `100.0000`
//! - key `5_000 << 64` = price `0.5000`
//!
//! ## Architecture
//!
//! - [`layout`] - Byte layouts of `BookSide`, leaf, market and proposal
//!   accounts
//! - [`orderbook`] - Classify, extract, price, aggregate and assemble
//! - [`client`] - RPC and pubsub clients, proposal discovery
//! - [`types`] - Addresses, watch keys and wire messages
//! - [`config`] - Endpoints, commitment, reconnection and watch list
//! - [`error`] - Error types for the crate

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod layout;
pub mod orderbook;
pub mod types;

// Re-export main types at crate root for convenience
pub use config::Config;
pub use error::Error;

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.environment(), Environment::Mainnet);
        assert!(config.watches().is_empty());
    }
}
