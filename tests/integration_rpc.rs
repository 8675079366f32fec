//! Integration tests against a live Solana RPC node.
//!
//! # Setup
//!
//! Set environment variables:
//! - RPC_URL: JSON-RPC endpoint (the pubsub URL is derived from it)
//! - TEST_BOOKSIDE: address of an OpenBook v2 `BookSide` account
//!
//! # Running
//!
//! ```bash
//! RPC_URL=https://api.mainnet-beta.solana.com TEST_BOOKSIDE=<address> cargo test --test integration_rpc
//! ```

use std::time::Duration;

use futarchy_ladder::client::{discover_watches, AccountSubscriber, FeedMessage, RpcClient};
use futarchy_ladder::config::DEFAULT_AUTOCRAT_PROGRAM;
use futarchy_ladder::orderbook::process_update;
use futarchy_ladder::types::{AccountAddress, Branch, Side, WatchKey, WatchTarget};
use futarchy_ladder::{Config, Error};

/// Helper to build a config and book-side address from environment variables
fn load_config() -> Option<(Config, AccountAddress)> {
    let rpc_url = std::env::var("RPC_URL").ok()?;
    let book_side = std::env::var("TEST_BOOKSIDE").ok()?.parse().ok()?;
    let config = Config::default().with_rpc_url(&rpc_url).ok()?;
    Some((config, book_side))
}

/// Skip test if the endpoint is not configured
macro_rules! require_config {
    () => {
        match load_config() {
            Some(c) => c,
            None => {
                eprintln!("Skipping test: RPC_URL and TEST_BOOKSIDE not set");
                return;
            }
        }
    };
}

#[tokio::test]
async fn test_get_slot() {
    let (config, _) = require_config!();
    let rpc = RpcClient::new(&config).unwrap();

    let slot = rpc.get_slot().await;
    assert!(slot.is_ok(), "Failed to get slot: {:?}", slot);
    assert!(slot.unwrap() > 0);
}

#[tokio::test]
async fn test_fetch_and_decode_book_side() {
    let (config, book_side) = require_config!();
    let rpc = RpcClient::new(&config).unwrap();

    let update = rpc.get_account_info(&book_side).await.unwrap();
    println!("Fetched {} bytes at slot {}", update.data.len(), update.slot);
    assert_eq!(update.data.len(), 90_952, "BookSide accounts are 90,952 bytes");

    let target = WatchTarget::new(WatchKey::new(0, Branch::Pass, Side::Bid), book_side);
    let snapshot = process_update(&target, &update).unwrap();
    println!(
        "{} orders in {} levels, best: {:?}",
        snapshot.leaf_count(),
        snapshot.ladder().len(),
        snapshot.ladder().best()
    );
}

#[tokio::test]
async fn test_discover_pending_proposals() {
    let (config, _) = require_config!();
    let rpc = RpcClient::new(&config).unwrap();
    let program: AccountAddress = DEFAULT_AUTOCRAT_PROGRAM.parse().unwrap();

    let targets = discover_watches(&rpc, &program).await.unwrap();
    println!("{} book sides across pending proposals", targets.len());

    // four book sides per proposal, each a decodable BookSide
    assert_eq!(targets.len() % 4, 0);
    for target in targets.iter().take(4) {
        let update = rpc.get_account_info(&target.account).await.unwrap();
        process_update(target, &update).unwrap();
    }
}

#[tokio::test]
async fn test_missing_account() {
    let (config, _) = require_config!();
    let rpc = RpcClient::new(&config).unwrap();

    // all-zero is the system program, so pick a key nobody funds
    let missing = AccountAddress::new([0x5A; 32]);
    match rpc.get_account_info(&missing).await {
        Err(Error::AccountNotFound(addr)) => assert_eq!(addr, missing),
        other => panic!("expected AccountNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_subscribe_confirms() {
    let (config, book_side) = require_config!();
    let mut feed = AccountSubscriber::connect(&config).await.unwrap();

    feed.account_subscribe(book_side).await.unwrap();

    let confirmed = tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(msg) = feed.next().await {
            if let FeedMessage::Subscribed { account, .. } = msg.unwrap() {
                return Some(account);
            }
        }
        None
    })
    .await
    .expect("no subscription confirmation within 10s");

    assert_eq!(confirmed, Some(book_side));
    assert!(feed.subscription_for(&book_side).is_some());
    feed.close().await.unwrap();
}
