//! HTTP JSON-RPC client.
//!
//! This module provides the [`RpcClient`] for one-shot reads, mainly used to
//! seed a ladder with the current book state before the first change
//! notification arrives.
//!
//! # Example
//!
//! ```rust,no_run
//! use futarchy_ladder::client::RpcClient;
//! use futarchy_ladder::Config;
//!
//! # async fn example() -> futarchy_ladder::Result<()> {
//! let config = Config::from_env()?;
//! let rpc = RpcClient::new(&config)?;
//!
//! for watch in config.watches() {
//!     let update = rpc.get_account_info(&watch.account).await?;
//!     println!("{} bytes at slot {}", update.data.len(), update.slot);
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::{Commitment, Config};
use crate::error::{Error, RpcError};
use crate::types::messages::{
    AccountInfoConfig, ContextValue, KeyedAccount, ProgramAccountsConfig, RpcFilter, RpcRequest,
    RpcResponse, UiAccount,
};
use crate::types::{AccountAddress, RawUpdate, Slot};

/// HTTP client for Solana JSON-RPC
#[derive(Debug)]
pub struct RpcClient {
    client: Client,
    url: String,
    commitment: Commitment,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Create a new RPC client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            url: config.rpc_url().to_string(),
            commitment: config.commitment(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Make a JSON-RPC call
    ///
    /// # Returns
    ///
    /// The `result` member of the response, deserialized
    pub async fn call<P, T>(&self, method: &str, params: P) -> Result<T, Error>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, method, params);
        debug!(method, id, "rpc call");

        let response = self.client.post(&self.url).json(&request).send().await?;

        self.handle_response(response).await
    }

    /// Fetch a book-side account as a raw update
    ///
    /// # Errors
    ///
    /// [`Error::AccountNotFound`] if the account does not exist.
    pub async fn get_account_info(&self, address: &AccountAddress) -> Result<RawUpdate, Error> {
        let result: ContextValue<Option<UiAccount>> = self
            .call(
                "getAccountInfo",
                (address.to_string(), AccountInfoConfig::base64(self.commitment)),
            )
            .await?;

        let account = result.value.ok_or(Error::AccountNotFound(*address))?;
        account.into_update(*address, result.context.slot)
    }

    /// All accounts owned by `program` that match every filter
    pub async fn get_program_accounts(
        &self,
        program: &AccountAddress,
        filters: Vec<RpcFilter>,
    ) -> Result<Vec<KeyedAccount>, Error> {
        let accounts: Vec<KeyedAccount> = self
            .call(
                "getProgramAccounts",
                (
                    program.to_string(),
                    ProgramAccountsConfig::base64(self.commitment, filters),
                ),
            )
            .await?;
        debug!(%program, count = accounts.len(), "program accounts fetched");
        Ok(accounts)
    }

    /// Current slot at the configured commitment
    pub async fn get_slot(&self) -> Result<Slot, Error> {
        #[derive(Serialize)]
        struct SlotConfig {
            commitment: Commitment,
        }

        self.call(
            "getSlot",
            [SlotConfig {
                commitment: self.commitment,
            }],
        )
        .await
    }

    /// Handle the HTTP response, checking for errors
    async fn handle_response<T>(&self, response: reqwest::Response) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let status = response.status();

        // Check for rate limiting
        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(|secs| secs * 1000);

            return Err(Error::RateLimited {
                retry_after_ms: retry_after,
            });
        }

        let body = response.text().await?;

        if !status.is_success() {
            // Nodes usually still send a JSON-RPC error body
            if let Ok(parsed) = serde_json::from_str::<RpcResponse<serde_json::Value>>(&body) {
                if let Some(error) = parsed.error {
                    return Err(Error::Rpc(error.into()));
                }
            }
            return Err(Error::Rpc(RpcError::new(i64::from(status.as_u16()), body)));
        }

        parse_rpc_body(&body)
    }

    /// Get the endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Unwrap a JSON-RPC response body into its result
fn parse_rpc_body<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    let parsed: RpcResponse<T> = serde_json::from_str(body)?;
    if let Some(error) = parsed.error {
        return Err(Error::Rpc(error.into()));
    }
    parsed
        .result
        .ok_or_else(|| Error::Rpc(RpcError::new(0, "response has neither result nor error")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_account_info_body() {
        let body = r#"{
            "jsonrpc": "2.0",
            "result": {
                "context": { "slot": 341197053 },
                "value": {
                    "data": ["AAEC", "base64"],
                    "executable": false,
                    "lamports": 88849814690,
                    "owner": "opnb2LAfJYbRMAHHvqjCwQxanZn7ReEHp1k81EohpZb",
                    "rentEpoch": 18446744073709551615,
                    "space": 3
                }
            },
            "id": 1
        }"#;

        let result: ContextValue<Option<UiAccount>> = parse_rpc_body(body).unwrap();
        assert_eq!(result.context.slot, 341197053);
        let update = result
            .value
            .unwrap()
            .into_update(AccountAddress::default(), result.context.slot)
            .unwrap();
        assert_eq!(update.data, vec![0, 1, 2]);
    }

    #[test]
    fn test_parse_missing_account() {
        let body = r#"{"jsonrpc":"2.0","result":{"context":{"slot":5},"value":null},"id":1}"#;
        let result: ContextValue<Option<UiAccount>> = parse_rpc_body(body).unwrap();
        assert!(result.value.is_none());
    }

    #[test]
    fn test_parse_error_body() {
        let body = r#"{"jsonrpc":"2.0","error":{"code":-32602,"message":"Invalid param: WrongSize"},"id":1}"#;
        let err = parse_rpc_body::<u64>(body).unwrap_err();
        match err {
            Error::Rpc(rpc) => {
                assert_eq!(rpc.code, -32602);
                assert!(rpc.message.contains("WrongSize"));
            }
            other => panic!("expected rpc error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_program_accounts_body() {
        let body = r#"{
            "jsonrpc": "2.0",
            "result": [
                {
                    "pubkey": "opnb2LAfJYbRMAHHvqjCwQxanZn7ReEHp1k81EohpZb",
                    "account": {
                        "data": ["AAEC", "base64"],
                        "executable": false,
                        "lamports": 5,
                        "owner": "metaX99LHn3A7Gr7VAcCfXhpfocvpMpqQ3eyp3PGUUq",
                        "rentEpoch": 361,
                        "space": 3
                    }
                }
            ],
            "id": 4
        }"#;

        let accounts: Vec<KeyedAccount> = parse_rpc_body(body).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].account.decode_data().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_parse_slot_body() {
        let slot: Slot = parse_rpc_body(r#"{"jsonrpc":"2.0","result":1234,"id":7}"#).unwrap();
        assert_eq!(slot, 1234);
    }
}
