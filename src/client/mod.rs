//! Solana RPC clients feeding the ladder pipeline.
//!
//! This module contains:
//!
//! - [`rest`] - HTTP JSON-RPC client for one-shot account reads
//! - [`websocket`] - Pubsub client streaming account changes
//! - [`discovery`] - Book sides of pending proposals, found through the
//!   autocrat program

pub mod discovery;
pub mod rest;
pub mod websocket;

pub use discovery::discover_watches;
pub use rest::RpcClient;
pub use websocket::{AccountSubscriber, FeedMessage, ReconnectingSubscriber};
