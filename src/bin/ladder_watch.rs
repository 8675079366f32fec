//! Stream live price ladders for futarchy book sides.
//!
//! Usage:
//!   cargo run --bin ladder-watch        # every pending proposal on mainnet
//!   WATCHES=7:pass:bid:<address>,7:fail:ask:<address> cargo run --bin ladder-watch
//!
//! Optional:
//!   RPC_URL=https://...      # JSON-RPC endpoint (default: mainnet-beta)
//!   WS_URL=wss://...         # pubsub endpoint (default: derived from RPC_URL)
//!   COMMITMENT=confirmed     # processed | confirmed | finalized
//!   DISCOVER=true            # add pending proposals (default: when WATCHES is unset)
//!   AUTOCRAT_PROGRAM=<addr>  # program to discover from (default: autocrat v0.1)
//!   RECONNECT_MAX_ATTEMPTS=20
//!   RUST_LOG=futarchy_ladder=debug

use std::collections::HashMap;
use std::sync::Arc;

use futarchy_ladder::client::{discover_watches, FeedMessage, ReconnectingSubscriber, RpcClient};
use futarchy_ladder::orderbook::{LadderEvent, LadderManager, OrderBookSnapshot};
use futarchy_ladder::types::{AccountAddress, RawUpdate, WatchTarget};
use futarchy_ladder::{Config, Error};
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("futarchy_ladder=info,ladder_watch=info")),
        )
        .init();

    let config = Config::from_env()?;
    let rpc = RpcClient::new(&config)?;

    let mut watches: Vec<WatchTarget> = config.watches().to_vec();
    if let Some(program) = config.autocrat_program() {
        let discovered = discover_watches(&rpc, program).await?;
        info!(%program, count = discovered.len(), "discovered book sides");
        for target in discovered {
            if !watches.contains(&target) {
                watches.push(target);
            }
        }
    }
    if watches.is_empty() {
        return Err("nothing to watch: no pending proposals found and WATCHES is empty".into());
    }

    let manager = Arc::new(LadderManager::new(config.event_capacity()));
    tokio::spawn(print_events(manager.subscribe()));

    let mut routes: HashMap<AccountAddress, Vec<mpsc::Sender<RawUpdate>>> = HashMap::new();
    let mut handles = Vec::with_capacity(watches.len());
    for &target in &watches {
        info!(%target, "watching");
        let handle = manager.watch(target, config.channel_capacity());
        routes.entry(target.account).or_default().push(handle.sender());
        handles.push(handle);
    }

    // Seed every ladder before the first change notification arrives
    for account in routes.keys() {
        match rpc.get_account_info(account).await {
            Ok(update) => route(&routes, update).await,
            Err(e) => warn!(%account, error = %e, "initial fetch failed"),
        }
    }

    let mut feed = ReconnectingSubscriber::connect(config.clone()).await?;
    for &account in routes.keys() {
        feed.account_subscribe(account).await?;
    }
    info!(watches = handles.len(), accounts = routes.len(), "streaming");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
            msg = feed.next() => match msg {
                Some(Ok(FeedMessage::AccountUpdate(update))) => route(&routes, update).await,
                Some(Ok(FeedMessage::RpcError { request_id, error })) => {
                    warn!(request_id, %error, "subscription rejected");
                }
                Some(Ok(_)) => {}
                Some(Err(Error::ConnectionClosed)) => {
                    error!("pubsub reconnection gave up");
                    break;
                }
                Some(Err(e)) => warn!(error = %e, "feed error"),
                None => break,
            },
        }
    }

    let _ = feed.close().await;
    drop(routes);
    for handle in handles {
        handle.shutdown().await;
    }
    Ok(())
}

/// Hand an update to every watch on its account
async fn route(routes: &HashMap<AccountAddress, Vec<mpsc::Sender<RawUpdate>>>, update: RawUpdate) {
    let Some(senders) = routes.get(&update.account) else {
        return;
    };
    for sender in senders {
        if sender.send(update.clone()).await.is_err() {
            warn!(account = %update.account, "watch task has exited");
        }
    }
}

async fn print_events(mut events: broadcast::Receiver<LadderEvent>) {
    loop {
        match events.recv().await {
            Ok(LadderEvent::Snapshot(snapshot)) => print_snapshot(&snapshot),
            Ok(LadderEvent::Failed(failure)) => {
                println!("[DROPPED] {} @ slot {} | {}", failure.key, failure.slot, failure.reason);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => warn!(skipped = n, "event consumer lagging"),
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_snapshot(snapshot: &OrderBookSnapshot) {
    let ladder = snapshot.ladder();
    println!(
        "[LADDER] {} @ slot {} | {} orders, {} levels, {} total",
        snapshot.key(),
        snapshot.slot(),
        snapshot.leaf_count(),
        ladder.len(),
        ladder.total_quantity()
    );
    for level in ladder.top(5) {
        println!("         {:>14} | {}", level.price, level.quantity);
    }
}
