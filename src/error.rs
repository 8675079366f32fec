//! Error types for the futarchy-ladder crate.
//!
//! Two layers live here:
//!
//! - [`DecodeError`] covers everything that can go wrong while turning raw
//!   account bytes into leaf records. It is scoped to a single update.
//! - [`Error`] is the crate-wide error, wrapping decode failures together
//!   with transport, RPC, and configuration errors.

use thiserror::Error;

use crate::types::{AccountAddress, Price};

/// Failure while decoding a binary layout or one of its leaf payloads
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Buffer does not match the expected layout (length or discriminator)
    #[error("schema mismatch decoding {layout}: {reason}")]
    SchemaMismatch {
        /// Name of the layout being decoded
        layout: &'static str,
        /// What did not match
        reason: String,
    },

    /// A leaf payload could not be turned into a leaf record
    #[error("malformed leaf at node {index}: {reason}")]
    MalformedLeaf {
        /// Position of the node within the book-side slab
        index: usize,
        /// What was wrong with it
        reason: String,
    },
}

impl DecodeError {
    /// Create a schema mismatch error
    pub fn schema(layout: &'static str, reason: impl Into<String>) -> Self {
        DecodeError::SchemaMismatch {
            layout,
            reason: reason.into(),
        }
    }

    /// Create a malformed leaf error
    pub fn malformed_leaf(index: usize, reason: impl Into<String>) -> Self {
        DecodeError::MalformedLeaf {
            index,
            reason: reason.into(),
        }
    }
}

/// Node tag outside the known set.
///
/// Never propagated out of the classifier: nodes carrying it are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown node tag: {0}")]
pub struct UnknownTag(pub u8);

/// The main error type for this crate
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Account data could not be decoded
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Invalid configuration (missing fields, bad format)
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON-RPC endpoint returned an error object
    #[error("RPC error {0}")]
    Rpc(RpcError),

    /// Rate limit exceeded
    #[error("Rate limited{}", retry_suffix(.retry_after_ms))]
    RateLimited {
        /// Retry after this many milliseconds
        retry_after_ms: Option<u64>,
    },

    /// WebSocket connection closed unexpectedly
    #[error("WebSocket connection closed")]
    ConnectionClosed,

    /// Requested account does not exist
    #[error("Account not found: {0}")]
    AccountNotFound(AccountAddress),

    /// Update was routed to a watch for a different account
    #[error("Account mismatch: expected {expected}, got {got}")]
    AccountMismatch {
        /// Account the watch was registered for
        expected: AccountAddress,
        /// Account the update came from
        got: AccountAddress,
    },

    /// String is not a valid base58 account address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Account data was not valid base64
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Summing a price level would overflow the quantity type
    #[error("Quantity overflow at price {price}")]
    QuantityOverflow {
        /// Price level whose total overflowed
        price: Price,
    },
}

fn retry_suffix(retry_after_ms: &Option<u64>) -> String {
    match retry_after_ms {
        Some(ms) => format!(", retry after {}ms", ms),
        None => String::new(),
    }
}

/// Error object returned in a JSON-RPC response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("({code}): {message}")]
pub struct RpcError {
    /// JSON-RPC error code
    pub code: i64,
    /// Error message
    pub message: String,
}

impl RpcError {
    /// Create a new RPC error
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Check if this is a node-side failure (-32000..=-32099 range)
    pub fn is_server_error(&self) -> bool {
        (-32099..=-32000).contains(&self.code)
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::Encoding(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::http::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::http::Error) -> Self {
        Error::Config(format!("HTTP error building WebSocket request: {}", err))
    }
}
