//! Configuration for the RPC clients and ladder watches.
//!
//! This module provides the [`Config`] struct: cluster endpoints, commitment,
//! channel sizing, pubsub reconnection, proposal discovery, and the list of
//! book-side accounts to watch.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Error;
use crate::types::{AccountAddress, WatchTarget};

/// Autocrat v0.1 program, owner of the futarchy `Proposal` accounts
pub const DEFAULT_AUTOCRAT_PROGRAM: &str = "metaX99LHn3A7Gr7VAcCfXhpfocvpMpqQ3eyp3PGUUq";

/// Solana cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Mainnet beta
    #[default]
    Mainnet,
    /// Devnet
    Devnet,
}

impl Environment {
    /// Get the JSON-RPC HTTP URL
    pub fn rpc_url(&self) -> &'static str {
        match self {
            Environment::Mainnet => "https://api.mainnet-beta.solana.com",
            Environment::Devnet => "https://api.devnet.solana.com",
        }
    }

    /// Get the pubsub WebSocket URL
    pub fn websocket_url(&self) -> &'static str {
        match self {
            Environment::Mainnet => "wss://api.mainnet-beta.solana.com",
            Environment::Devnet => "wss://api.devnet.solana.com",
        }
    }
}

/// How settled a ledger state must be before the node reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    /// Most recent block seen by the node
    #[default]
    Processed,
    /// Voted on by a supermajority
    Confirmed,
    /// Rooted
    Finalized,
}

impl FromStr for Commitment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "processed" => Ok(Commitment::Processed),
            "confirmed" => Ok(Commitment::Confirmed),
            "finalized" => Ok(Commitment::Finalized),
            other => Err(Error::Config(format!("unknown commitment: {}", other))),
        }
    }
}

/// Backoff between pubsub reconnection attempts
///
/// The delay doubles on every failed attempt, starting at `initial_delay` and
/// capped at `max_delay`. The attempt counter resets once the new connection
/// delivers a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before the first attempt
    pub initial_delay: Duration,
    /// Upper bound on a single delay
    pub max_delay: Duration,
    /// Attempts before giving up (`None` = never give up)
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Set the delay before the first attempt
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the delay cap
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Give up after `attempts` consecutive failures
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Delay before attempt number `attempt` (0-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay)
    }

    /// Check if attempt number `attempt` (0-based) may still be made
    pub fn allows_attempt(&self, attempt: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempt < max)
    }
}

/// Configuration for the ladder watcher
///
/// # Example
///
/// ```rust
/// use futarchy_ladder::Config;
/// use futarchy_ladder::config::{Commitment, Environment};
///
/// let config = Config::new(Environment::Devnet)
///     .with_commitment(Commitment::Confirmed)
///     .with_timeout(std::time::Duration::from_secs(30));
///
/// assert!(config.websocket_url().starts_with("wss://"));
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Cluster the default endpoints come from
    environment: Environment,

    /// JSON-RPC HTTP endpoint
    rpc_url: String,

    /// Pubsub WebSocket endpoint
    ws_url: String,

    /// Commitment for reads and subscriptions
    commitment: Commitment,

    /// HTTP request timeout
    timeout: Duration,

    /// Pending updates buffered per watch before the feed waits
    channel_capacity: usize,

    /// Ladder events buffered for slow consumers
    event_capacity: usize,

    /// Pubsub reconnection backoff
    reconnect: ReconnectPolicy,

    /// Autocrat program whose pending proposals are watched, if any
    autocrat_program: Option<AccountAddress>,

    /// Book-side accounts to watch
    watches: Vec<WatchTarget>,
}

impl Config {
    /// Create a configuration using the cluster's public endpoints
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            rpc_url: environment.rpc_url().to_string(),
            ws_url: environment.websocket_url().to_string(),
            commitment: Commitment::default(),
            timeout: Duration::from_secs(10),
            channel_capacity: 64,
            event_capacity: 1024,
            reconnect: ReconnectPolicy::default(),
            autocrat_program: None,
            watches: Vec::new(),
        }
    }

    /// Read configuration from the process environment
    ///
    /// - `RPC_URL`: JSON-RPC HTTP endpoint (default: mainnet-beta)
    /// - `WS_URL`: pubsub endpoint, derived from `RPC_URL` when unset
    /// - `COMMITMENT`: `processed` (default), `confirmed` or `finalized`
    /// - `WATCHES`: comma-separated `proposal:branch:side:address` entries
    /// - `DISCOVER`: watch every pending proposal (default: on when
    ///   `WATCHES` is empty)
    /// - `AUTOCRAT_PROGRAM`: program to discover proposals from
    ///   (default: [`DEFAULT_AUTOCRAT_PROGRAM`])
    /// - `RECONNECT_MAX_ATTEMPTS`: give up after this many failed reconnects
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is malformed.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from any variable source
    ///
    /// Same variables as [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::new(Environment::default());

        if let Some(rpc_url) = lookup("RPC_URL") {
            config = config.with_rpc_url(&rpc_url)?;
        }
        if let Some(ws_url) = lookup("WS_URL") {
            config = config.with_ws_url(ws_url);
        }
        if let Some(commitment) = lookup("COMMITMENT") {
            config = config.with_commitment(commitment.parse()?);
        }
        if let Some(watches) = lookup("WATCHES") {
            config = config.with_watches(parse_watches(&watches)?);
        }
        if let Some(attempts) = lookup("RECONNECT_MAX_ATTEMPTS") {
            let attempts = attempts.trim().parse().map_err(|_| {
                Error::Config(format!("RECONNECT_MAX_ATTEMPTS is not a number: {}", attempts))
            })?;
            config.reconnect = config.reconnect.with_max_attempts(attempts);
        }

        let discover = match lookup("DISCOVER") {
            Some(flag) => parse_flag("DISCOVER", &flag)?,
            None => config.watches.is_empty(),
        };
        if discover {
            let program = lookup("AUTOCRAT_PROGRAM")
                .unwrap_or_else(|| DEFAULT_AUTOCRAT_PROGRAM.to_string());
            config = config.with_discovery(program.trim().parse()?);
        }

        Ok(config)
    }

    /// Set the JSON-RPC endpoint and derive the matching WebSocket endpoint
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL does not parse or is not http(s).
    pub fn with_rpc_url(mut self, rpc_url: &str) -> Result<Self, Error> {
        self.ws_url = websocket_url_for(rpc_url)?;
        self.rpc_url = rpc_url.to_string();
        Ok(self)
    }

    /// Override the WebSocket endpoint
    #[must_use]
    pub fn with_ws_url(mut self, ws_url: impl Into<String>) -> Self {
        self.ws_url = ws_url.into();
        self
    }

    /// Set the commitment level
    #[must_use]
    pub fn with_commitment(mut self, commitment: Commitment) -> Self {
        self.commitment = commitment;
        self
    }

    /// Set the HTTP request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the per-watch update buffer size
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Set the ladder event buffer size
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Replace the watch list
    #[must_use]
    pub fn with_watches(mut self, watches: Vec<WatchTarget>) -> Self {
        self.watches = watches;
        self
    }

    /// Add a single watch
    #[must_use]
    pub fn with_watch(mut self, watch: WatchTarget) -> Self {
        self.watches.push(watch);
        self
    }

    /// Set the pubsub reconnection backoff
    #[must_use]
    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Also watch the markets of every pending proposal of `program`
    #[must_use]
    pub fn with_discovery(mut self, program: AccountAddress) -> Self {
        self.autocrat_program = Some(program);
        self
    }

    /// Get the environment
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Get the JSON-RPC URL
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Get the WebSocket URL
    pub fn websocket_url(&self) -> &str {
        &self.ws_url
    }

    /// Get the commitment level
    pub fn commitment(&self) -> Commitment {
        self.commitment
    }

    /// Get the timeout duration
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the per-watch update buffer size
    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity
    }

    /// Get the ladder event buffer size
    pub fn event_capacity(&self) -> usize {
        self.event_capacity
    }

    /// Get the pubsub reconnection backoff
    pub fn reconnect(&self) -> ReconnectPolicy {
        self.reconnect
    }

    /// Get the autocrat program used for discovery, if enabled
    pub fn autocrat_program(&self) -> Option<&AccountAddress> {
        self.autocrat_program.as_ref()
    }

    /// Get the watch list
    pub fn watches(&self) -> &[WatchTarget] {
        &self.watches
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Environment::default())
    }
}

/// Parse a comma-separated list of watch targets, ignoring empty entries
pub fn parse_watches(s: &str) -> Result<Vec<WatchTarget>, Error> {
    s.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::parse)
        .collect()
}

fn parse_flag(name: &str, value: &str) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("{} must be a boolean, got {}", name, other))),
    }
}

/// Solana convention: pubsub lives on the same host with a ws(s) scheme
fn websocket_url_for(rpc_url: &str) -> Result<String, Error> {
    let mut url =
        Url::parse(rpc_url).map_err(|e| Error::Config(format!("bad RPC URL {}: {}", rpc_url, e)))?;

    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => {
            return Err(Error::Config(format!(
                "RPC URL must be http or https, got {}",
                other
            )))
        }
    };

    url.set_scheme(scheme)
        .map_err(|_| Error::Config(format!("cannot derive WebSocket URL from {}", rpc_url)))?;
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Branch, Side};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.environment(), Environment::Mainnet);
        assert_eq!(config.commitment(), Commitment::Processed);
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.channel_capacity(), 64);
        assert!(config.watches().is_empty());
    }

    #[test]
    fn test_devnet_environment() {
        let config = Config::new(Environment::Devnet);
        assert!(config.rpc_url().contains("devnet"));
        assert!(config.websocket_url().contains("devnet"));
    }

    #[test]
    fn test_rpc_url_derives_websocket_url() {
        let config = Config::default()
            .with_rpc_url("https://rpc.example.com/?api-key=abc")
            .unwrap();
        assert_eq!(config.rpc_url(), "https://rpc.example.com/?api-key=abc");
        assert_eq!(config.websocket_url(), "wss://rpc.example.com/?api-key=abc");

        let config = Config::default()
            .with_rpc_url("http://127.0.0.1:8899")
            .unwrap();
        assert_eq!(config.websocket_url(), "ws://127.0.0.1:8899/");
    }

    #[test]
    fn test_rpc_url_rejects_other_schemes() {
        assert!(Config::default().with_rpc_url("ftp://example.com").is_err());
        assert!(Config::default().with_rpc_url("not a url").is_err());
    }

    #[test]
    fn test_builder_pattern() {
        let config = Config::new(Environment::Devnet)
            .with_commitment(Commitment::Finalized)
            .with_timeout(Duration::from_secs(30))
            .with_channel_capacity(0)
            .with_ws_url("wss://custom");

        assert_eq!(config.commitment(), Commitment::Finalized);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.channel_capacity(), 1);
        assert_eq!(config.websocket_url(), "wss://custom");
    }

    #[test]
    fn test_parse_watches() {
        let addr = "opnb2LAfJYbRMAHHvqjCwQxanZn7ReEHp1k81EohpZb";
        let watches = parse_watches(&format!("3:pass:bid:{addr}, 3:fail:ask:{addr},")).unwrap();
        assert_eq!(watches.len(), 2);
        assert_eq!(watches[0].key.branch, Branch::Pass);
        assert_eq!(watches[1].key.side, Side::Ask);

        assert!(parse_watches("3:pass:bid").is_err());
        assert!(parse_watches("").unwrap().is_empty());
    }

    fn vars<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_from_lookup_defaults_to_mainnet() {
        let config = Config::from_lookup(vars(&[])).unwrap();
        assert_eq!(config.rpc_url(), Environment::Mainnet.rpc_url());
        assert_eq!(config.websocket_url(), Environment::Mainnet.websocket_url());
        assert!(config.watches().is_empty());
        assert_eq!(
            config.autocrat_program().map(ToString::to_string).as_deref(),
            Some(DEFAULT_AUTOCRAT_PROGRAM)
        );
    }

    #[test]
    fn test_from_lookup_with_watches() {
        let addr = "opnb2LAfJYbRMAHHvqjCwQxanZn7ReEHp1k81EohpZb";
        let watches = format!("4:pass:ask:{addr}");
        let config = Config::from_lookup(vars(&[
            ("RPC_URL", "http://127.0.0.1:8899"),
            ("COMMITMENT", "finalized"),
            ("WATCHES", watches.as_str()),
            ("RECONNECT_MAX_ATTEMPTS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.websocket_url(), "ws://127.0.0.1:8899/");
        assert_eq!(config.commitment(), Commitment::Finalized);
        assert_eq!(config.watches().len(), 1);
        assert!(config.autocrat_program().is_none());
        assert_eq!(config.reconnect().max_attempts, Some(3));
    }

    #[test]
    fn test_from_lookup_discovery_flag() {
        let addr = "opnb2LAfJYbRMAHHvqjCwQxanZn7ReEHp1k81EohpZb";
        let watches = format!("4:pass:ask:{addr}");
        let config = Config::from_lookup(vars(&[
            ("WATCHES", watches.as_str()),
            ("DISCOVER", "yes"),
            ("AUTOCRAT_PROGRAM", addr),
        ]))
        .unwrap();
        assert_eq!(config.autocrat_program().map(ToString::to_string).as_deref(), Some(addr));

        let config = Config::from_lookup(vars(&[("DISCOVER", "off")])).unwrap();
        assert!(config.autocrat_program().is_none());

        assert!(Config::from_lookup(vars(&[("DISCOVER", "maybe")])).is_err());
        assert!(Config::from_lookup(vars(&[("RECONNECT_MAX_ATTEMPTS", "x")])).is_err());
    }

    #[test]
    fn test_reconnect_backoff_doubles_until_capped() {
        let policy = ReconnectPolicy::default()
            .with_initial_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_secs(1));

        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(800));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(u32::MAX), Duration::from_secs(1));
    }

    #[test]
    fn test_reconnect_attempt_limit() {
        let forever = ReconnectPolicy::default();
        assert!(forever.allows_attempt(u32::MAX));

        let limited = forever.with_max_attempts(2);
        assert!(limited.allows_attempt(1));
        assert!(!limited.allows_attempt(2));
    }

    #[test]
    fn test_parse_commitment() {
        assert_eq!("Confirmed".parse::<Commitment>().unwrap(), Commitment::Confirmed);
        assert!("recent".parse::<Commitment>().is_err());
    }
}
