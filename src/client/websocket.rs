//! Pubsub WebSocket client for streaming account changes.
//!
//! This module provides the [`AccountSubscriber`], which subscribes to
//! book-side accounts and turns each `accountNotification` into a
//! [`RawUpdate`] for the ladder pipeline, and [`ReconnectingSubscriber`],
//! which wraps it with backoff and subscription replay.
//!
//! # Example
//!
//! ```rust,no_run
//! use futarchy_ladder::client::websocket::{AccountSubscriber, FeedMessage};
//! use futarchy_ladder::Config;
//!
//! # async fn example() -> futarchy_ladder::Result<()> {
//! let config = Config::from_env()?;
//! let mut feed = AccountSubscriber::connect(&config).await?;
//!
//! for watch in config.watches() {
//!     feed.account_subscribe(watch.account).await?;
//! }
//!
//! while let Some(msg) = feed.next().await {
//!     if let FeedMessage::AccountUpdate(update) = msg? {
//!         println!("{} changed at slot {}", update.account, update.slot);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::config::{Commitment, Config, ReconnectPolicy};
use crate::error::{Error, RpcError};
use crate::types::messages::{AccountInfoConfig, PubsubMessage, PubsubResponse, RpcRequest};
use crate::types::{AccountAddress, RawUpdate};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Message yielded by the subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedMessage {
    /// Subscription confirmed by the node
    Subscribed {
        /// Subscribed account
        account: AccountAddress,
        /// Node-assigned subscription ID
        subscription: u64,
    },
    /// Unsubscription confirmed
    Unsubscribed {
        /// Subscription that was removed
        subscription: u64,
    },
    /// New account state
    AccountUpdate(RawUpdate),
    /// The node rejected a request
    RpcError {
        /// Request ID the error answers
        request_id: u64,
        /// Error details
        error: RpcError,
    },
}

/// What a pending request was for
#[derive(Debug, Clone, Copy)]
enum PendingRequest {
    Subscribe(AccountAddress),
    Unsubscribe(u64),
}

/// WebSocket client for Solana account subscriptions
///
/// Tracks request IDs until the node confirms them and maps subscription
/// IDs back to account addresses, so callers only ever see addresses.
///
/// # Thread Safety
///
/// This client is NOT thread-safe. Run it in one task and fan updates out
/// through channels.
#[derive(Debug)]
pub struct AccountSubscriber {
    write: SplitSink<WsStream, Message>,
    read: SplitStream<WsStream>,
    commitment: Commitment,
    request_id: u64,
    /// Active subscriptions by subscription id
    subscriptions: HashMap<u64, AccountAddress>,
    /// Requests awaiting a reply, by request id
    pending: HashMap<u64, PendingRequest>,
}

impl AccountSubscriber {
    /// Connect to the pubsub endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the WebSocket handshake fails.
    pub async fn connect(config: &Config) -> Result<Self, Error> {
        let (ws_stream, _response) = tokio_tungstenite::connect_async(config.websocket_url()).await?;
        let (write, read) = ws_stream.split();
        info!(url = config.websocket_url(), "pubsub connected");

        Ok(Self {
            write,
            read,
            commitment: config.commitment(),
            request_id: 1,
            subscriptions: HashMap::new(),
            pending: HashMap::new(),
        })
    }

    /// Send a request and remember what it was for
    async fn send_request<P: serde::Serialize>(
        &mut self,
        method: &str,
        params: P,
        pending: PendingRequest,
    ) -> Result<u64, Error> {
        let id = self.request_id;
        let json = serde_json::to_string(&RpcRequest::new(id, method, params))?;
        self.write.send(Message::Text(json)).await?;
        self.pending.insert(id, pending);
        self.request_id += 1;
        Ok(id)
    }

    /// Subscribe to changes of an account
    ///
    /// # Returns
    ///
    /// The request ID; the subscription becomes active once a
    /// [`FeedMessage::Subscribed`] for the account arrives.
    pub async fn account_subscribe(&mut self, account: AccountAddress) -> Result<u64, Error> {
        let params = (account.to_string(), AccountInfoConfig::base64(self.commitment));
        self.send_request("accountSubscribe", params, PendingRequest::Subscribe(account))
            .await
    }

    /// Cancel a subscription
    pub async fn account_unsubscribe(&mut self, subscription: u64) -> Result<u64, Error> {
        self.send_request(
            "accountUnsubscribe",
            [subscription],
            PendingRequest::Unsubscribe(subscription),
        )
        .await
    }

    /// Active subscriptions: subscription id -> account
    pub fn subscriptions(&self) -> &HashMap<u64, AccountAddress> {
        &self.subscriptions
    }

    /// Subscription id for an account, if confirmed
    pub fn subscription_for(&self, account: &AccountAddress) -> Option<u64> {
        self.subscriptions
            .iter()
            .find(|(_, a)| *a == account)
            .map(|(&sid, _)| sid)
    }

    /// Receive the next feed message
    ///
    /// Pings are answered. Frames that do not parse, notifications whose data
    /// cannot be decoded, and anything else irrelevant are logged and skipped,
    /// so one bad frame never ends the stream.
    ///
    /// # Returns
    ///
    /// The next message, or `None` if the stream has ended.
    pub async fn next(&mut self) -> Option<Result<FeedMessage, Error>> {
        loop {
            match self.read.next().await? {
                Ok(Message::Text(text)) => {
                    let msg: PubsubMessage = match serde_json::from_str(&text) {
                        Ok(msg) => msg,
                        Err(e) => {
                            warn!(error = %e, len = text.len(), "skipping unparseable pubsub frame");
                            continue;
                        }
                    };
                    if let Some(feed) = self.handle_message(msg) {
                        return Some(Ok(feed));
                    }
                }
                Ok(Message::Ping(data)) => {
                    // Respond to pings automatically
                    if let Err(e) = self.write.send(Message::Pong(data)).await {
                        return Some(Err(e.into()));
                    }
                }
                Ok(Message::Close(_)) => {
                    return Some(Err(Error::ConnectionClosed));
                }
                Ok(_) => {
                    // Ignore other message types (Binary, Pong, Frame)
                    continue;
                }
                Err(e) => {
                    return Some(Err(e.into()));
                }
            }
        }
    }

    /// Translate a parsed pubsub message, updating subscription state
    fn handle_message(&mut self, msg: PubsubMessage) -> Option<FeedMessage> {
        match msg {
            PubsubMessage::Response(response) => self.handle_response(response),
            PubsubMessage::Notification(n) if n.method == "accountNotification" => {
                let subscription = n.params.subscription;
                let Some(&account) = self.subscriptions.get(&subscription) else {
                    debug!(subscription, "notification for unknown subscription");
                    return None;
                };
                let slot = n.params.result.context.slot;
                match n.params.result.value.into_update(account, slot) {
                    Ok(update) => Some(FeedMessage::AccountUpdate(update)),
                    Err(e) => {
                        warn!(%account, subscription, slot, error = %e, "dropping undecodable notification");
                        None
                    }
                }
            }
            PubsubMessage::Notification(n) => {
                debug!(method = %n.method, "ignoring notification");
                None
            }
        }
    }

    fn handle_response(&mut self, response: PubsubResponse) -> Option<FeedMessage> {
        let pending = self.pending.remove(&response.id);

        if let Some(error) = response.error {
            warn!(id = response.id, code = error.code, message = %error.message, "pubsub request failed");
            return Some(FeedMessage::RpcError {
                request_id: response.id,
                error: error.into(),
            });
        }

        match pending? {
            PendingRequest::Subscribe(account) => {
                let subscription = response.result.as_ref().and_then(|v| v.as_u64())?;
                self.subscriptions.insert(subscription, account);
                info!(%account, subscription, "account subscribed");
                Some(FeedMessage::Subscribed {
                    account,
                    subscription,
                })
            }
            PendingRequest::Unsubscribe(subscription) => {
                self.subscriptions.remove(&subscription);
                Some(FeedMessage::Unsubscribed { subscription })
            }
        }
    }

    /// Close the WebSocket connection
    pub async fn close(&mut self) -> Result<(), Error> {
        self.write.close().await?;
        Ok(())
    }
}

/// Account subscriber with automatic reconnection.
///
/// Remembers every subscribed account and re-subscribes after reconnecting.
/// Subscription IDs change across connections; callers only see addresses.
pub struct ReconnectingSubscriber {
    /// The underlying subscriber
    client: Option<AccountSubscriber>,
    /// Endpoint configuration
    config: Config,
    /// Backoff between attempts
    policy: ReconnectPolicy,
    /// Accounts to replay after reconnection
    accounts: Vec<AccountAddress>,
    /// Current reconnection attempt
    reconnect_attempt: u32,
    /// Whether we're currently trying to reconnect
    is_reconnecting: bool,
}

impl std::fmt::Debug for ReconnectingSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconnectingSubscriber")
            .field("connected", &self.client.is_some())
            .field("reconnect_attempt", &self.reconnect_attempt)
            .field("is_reconnecting", &self.is_reconnecting)
            .field("account_count", &self.accounts.len())
            .finish()
    }
}

impl ReconnectingSubscriber {
    /// Connect, reconnecting later according to [`Config::reconnect`]
    pub async fn connect(config: Config) -> Result<Self, Error> {
        let client = AccountSubscriber::connect(&config).await?;

        Ok(Self {
            client: Some(client),
            policy: config.reconnect(),
            config,
            accounts: Vec::new(),
            reconnect_attempt: 0,
            is_reconnecting: false,
        })
    }

    /// Check if currently connected
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Check if currently reconnecting
    pub fn is_reconnecting(&self) -> bool {
        self.is_reconnecting
    }

    /// Get the current reconnection attempt number
    pub fn reconnect_attempt(&self) -> u32 {
        self.reconnect_attempt
    }

    /// Accounts that will be replayed on reconnection
    pub fn accounts(&self) -> &[AccountAddress] {
        &self.accounts
    }

    /// Subscribe to an account; replayed on every reconnection
    pub async fn account_subscribe(&mut self, account: AccountAddress) -> Result<u64, Error> {
        if !self.accounts.contains(&account) {
            self.accounts.push(account);
        }

        if let Some(ref mut client) = self.client {
            client.account_subscribe(account).await
        } else {
            Err(Error::ConnectionClosed)
        }
    }

    /// Stop watching an account, now and after reconnection
    pub async fn account_unsubscribe(&mut self, account: &AccountAddress) -> Result<(), Error> {
        self.accounts.retain(|a| a != account);

        if let Some(ref mut client) = self.client {
            if let Some(sid) = client.subscription_for(account) {
                client.account_unsubscribe(sid).await?;
            }
        }
        Ok(())
    }

    /// Receive the next message, reconnecting if necessary
    pub async fn next(&mut self) -> Option<Result<FeedMessage, Error>> {
        loop {
            if let Some(ref mut client) = self.client {
                match client.next().await {
                    Some(Ok(msg)) => {
                        self.reconnect_attempt = 0; // Reset on successful message
                        return Some(Ok(msg));
                    }
                    Some(Err(Error::ConnectionClosed | Error::WebSocket(_))) | None => {
                        warn!("pubsub connection lost, reconnecting");
                        self.client = None;
                        if let Err(e) = self.attempt_reconnect().await {
                            return Some(Err(e));
                        }
                        continue;
                    }
                    Some(Err(e)) => {
                        return Some(Err(e));
                    }
                }
            } else if let Err(e) = self.attempt_reconnect().await {
                return Some(Err(e));
            }
        }
    }

    /// Reconnect, backing off per the policy until it gives up
    async fn attempt_reconnect(&mut self) -> Result<(), Error> {
        self.is_reconnecting = true;

        loop {
            if !self.policy.allows_attempt(self.reconnect_attempt) {
                self.is_reconnecting = false;
                warn!(attempts = self.reconnect_attempt, "giving up on pubsub reconnection");
                return Err(Error::ConnectionClosed);
            }

            let delay = self.policy.delay_for_attempt(self.reconnect_attempt);
            debug!(attempt = self.reconnect_attempt, ?delay, "waiting to reconnect");
            tokio::time::sleep(delay).await;

            self.reconnect_attempt += 1;

            match AccountSubscriber::connect(&self.config).await {
                Ok(mut client) => {
                    if let Err(e) = self.replay_subscriptions(&mut client).await {
                        warn!(attempt = self.reconnect_attempt, error = %e, "subscription replay failed");
                        continue;
                    }

                    info!(attempt = self.reconnect_attempt, accounts = self.accounts.len(), "pubsub reconnected");
                    self.client = Some(client);
                    self.is_reconnecting = false;
                    return Ok(());
                }
                Err(e) => {
                    warn!(attempt = self.reconnect_attempt, error = %e, "reconnect failed");
                    continue;
                }
            }
        }
    }

    /// Replay all saved subscriptions on a new connection
    async fn replay_subscriptions(&self, client: &mut AccountSubscriber) -> Result<(), Error> {
        for &account in &self.accounts {
            client.account_subscribe(account).await?;
        }
        Ok(())
    }

    /// Manually trigger a reconnection
    pub async fn reconnect(&mut self) -> Result<(), Error> {
        if let Some(ref mut client) = self.client {
            let _ = client.close().await;
        }
        self.client = None;
        self.reconnect_attempt = 0;
        self.attempt_reconnect().await
    }

    /// Close the WebSocket connection
    pub async fn close(&mut self) -> Result<(), Error> {
        if let Some(ref mut client) = self.client {
            client.close().await?;
        }
        self.client = None;
        Ok(())
    }
}
