//! Raw updates and JSON-RPC wire messages.
//!
//! [`RawUpdate`] is what the ladder pipeline consumes. The remaining types
//! mirror the Solana JSON-RPC request/response bodies used by the HTTP and
//! pubsub clients to produce it.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

use super::market::AccountAddress;
use super::Slot;
use crate::config::Commitment;
use crate::error::{Error, RpcError};

/// A complete book-side account state observed at one slot
///
/// Produced by the feed, consumed once by the pipeline. The byte buffer is
/// owned, so the pipeline run that consumes it has exclusive access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawUpdate {
    /// Account the bytes were read from
    pub account: AccountAddress,
    /// Raw account data
    pub data: Vec<u8>,
    /// Slot at which the data was observed
    pub slot: Slot,
}

impl RawUpdate {
    /// Create a new raw update
    pub fn new(account: AccountAddress, data: Vec<u8>, slot: Slot) -> Self {
        Self {
            account,
            data,
            slot,
        }
    }
}

/// JSON-RPC 2.0 request envelope
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a, P> {
    /// Always "2.0"
    pub jsonrpc: &'static str,
    /// Request ID, echoed back in the response
    pub id: u64,
    /// Method name
    pub method: &'a str,
    /// Positional parameters
    pub params: P,
}

impl<'a, P: Serialize> RpcRequest<'a, P> {
    /// Create a new request
    pub fn new(id: u64, method: &'a str, params: P) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// Options object for `getAccountInfo` / `accountSubscribe`
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AccountInfoConfig {
    /// Data encoding; always base64 so binary layouts survive transport
    pub encoding: &'static str,
    /// Commitment level
    pub commitment: Commitment,
}

impl AccountInfoConfig {
    /// Base64 encoding at the given commitment
    pub fn base64(commitment: Commitment) -> Self {
        Self {
            encoding: "base64",
            commitment,
        }
    }
}

/// Options object for `getProgramAccounts`
#[derive(Debug, Clone, Serialize)]
pub struct ProgramAccountsConfig {
    /// Data encoding; always base64
    pub encoding: &'static str,
    /// Commitment level
    pub commitment: Commitment,
    /// Server-side filters, all of which must match
    pub filters: Vec<RpcFilter>,
}

impl ProgramAccountsConfig {
    /// Base64 encoding at the given commitment
    pub fn base64(commitment: Commitment, filters: Vec<RpcFilter>) -> Self {
        Self {
            encoding: "base64",
            commitment,
            filters,
        }
    }
}

/// Account filter for `getProgramAccounts`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RpcFilter {
    /// Exact data length
    DataSize(u64),
    /// Bytes at an offset
    Memcmp(Memcmp),
}

impl RpcFilter {
    /// Match `bytes` at `offset` within the account data
    pub fn memcmp(offset: usize, bytes: &[u8]) -> Self {
        RpcFilter::Memcmp(Memcmp {
            offset,
            bytes: bs58::encode(bytes).into_string(),
            encoding: "base58",
        })
    }
}

/// Byte comparison filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Memcmp {
    /// Offset into the account data
    pub offset: usize,
    /// Expected bytes, encoded
    pub bytes: String,
    /// Encoding of `bytes`
    pub encoding: &'static str,
}

/// Program account with its address
#[derive(Debug, Clone, Deserialize)]
pub struct KeyedAccount {
    /// Account address (base58)
    pub pubkey: String,
    /// Account contents
    pub account: UiAccount,
}

/// JSON-RPC error object
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    /// Error code
    pub code: i64,
    /// Error message
    pub message: String,
}

impl From<RpcErrorObject> for RpcError {
    fn from(obj: RpcErrorObject) -> Self {
        RpcError::new(obj.code, obj.message)
    }
}

/// JSON-RPC response envelope (HTTP transport)
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse<T> {
    /// Request ID
    pub id: Option<u64>,
    /// Result, if the call succeeded
    pub result: Option<T>,
    /// Error, if the call failed
    pub error: Option<RpcErrorObject>,
}

/// Context attached to account responses
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RpcContext {
    /// Slot at which the value was read
    pub slot: Slot,
}

/// Value wrapped with the slot it was read at
#[derive(Debug, Clone, Deserialize)]
pub struct ContextValue<T> {
    /// Read context
    pub context: RpcContext,
    /// The value itself
    pub value: T,
}

/// Account as returned by RPC with base64 data
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiAccount {
    /// `[payload, encoding]`
    pub data: (String, String),
    /// Balance in lamports
    pub lamports: u64,
    /// Owning program (base58)
    pub owner: String,
    /// Whether the account holds a program
    #[serde(default)]
    pub executable: bool,
    /// Data length in bytes
    #[serde(default)]
    pub space: Option<u64>,
}

impl UiAccount {
    /// Decode the account data from its transport encoding
    pub fn decode_data(&self) -> Result<Vec<u8>, Error> {
        let (payload, encoding) = &self.data;
        if encoding != "base64" {
            return Err(Error::Encoding(format!(
                "unsupported account encoding: {}",
                encoding
            )));
        }
        Ok(BASE64.decode(payload)?)
    }

    /// Turn this account into a raw update for the pipeline
    pub fn into_update(self, account: AccountAddress, slot: Slot) -> Result<RawUpdate, Error> {
        let data = self.decode_data()?;
        Ok(RawUpdate::new(account, data, slot))
    }
}

/// Message received on the pubsub websocket
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PubsubMessage {
    /// Server-pushed notification for a subscription
    Notification(PubsubNotification),
    /// Reply to a request we sent
    Response(PubsubResponse),
}

/// Reply to a subscribe/unsubscribe request
#[derive(Debug, Clone, Deserialize)]
pub struct PubsubResponse {
    /// Request ID
    pub id: u64,
    /// Subscription ID for subscribe, `true` for unsubscribe
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    /// Error, if the request failed
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

/// Subscription notification envelope
#[derive(Debug, Clone, Deserialize)]
pub struct PubsubNotification {
    /// Notification method, e.g. `accountNotification`
    pub method: String,
    /// Payload
    pub params: NotificationParams,
}

/// Notification payload
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationParams {
    /// Subscription the notification belongs to
    pub subscription: u64,
    /// Account state with its context slot
    pub result: ContextValue<UiAccount>,
}
