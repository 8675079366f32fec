//! Ladder manager: one task per watched account, latest snapshot per key.
//!
//! This module provides [`LadderManager`], which runs the pipeline for every
//! incoming [`RawUpdate`] and publishes the resulting snapshots.
//!
//! # Design
//!
//! Each watched account gets its own tokio task fed by a bounded channel.
//! The task handles updates strictly one after another, so a snapshot is
//! never built from two interleaved buffers, while tasks for different keys
//! run independently.
//!
//! Published snapshots are kept per key behind a `parking_lot::RwLock` and
//! replaced wholesale. A failed update leaves the previous snapshot in place
//! and is reported as a [`LadderEvent::Failed`]; it never stops other watches.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::pipeline::{process_update, OrderBookSnapshot};
use crate::error::Error;
use crate::types::{AccountAddress, RawUpdate, Slot, WatchKey, WatchTarget};

/// Why an update did not produce a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateFailure {
    /// Ladder the update was for
    pub key: WatchKey,
    /// Account the update came from
    pub account: AccountAddress,
    /// Slot of the rejected update
    pub slot: Slot,
    /// Error message
    pub reason: String,
}

/// Event published for every processed update
#[derive(Debug, Clone)]
pub enum LadderEvent {
    /// A new snapshot replaced the previous one for its key
    Snapshot(Arc<OrderBookSnapshot>),
    /// An update was rejected; the previous snapshot stays current
    Failed(UpdateFailure),
}

/// Handle to a running watch task
///
/// Dropping the handle does not stop the task; it ends once every sender is
/// gone or [`WatchHandle::abort`] is called.
#[derive(Debug)]
pub struct WatchHandle {
    target: WatchTarget,
    sender: mpsc::Sender<RawUpdate>,
    task: JoinHandle<()>,
}

impl WatchHandle {
    /// The watched target
    pub fn target(&self) -> WatchTarget {
        self.target
    }

    /// Ladder key of the watch
    pub fn key(&self) -> WatchKey {
        self.target.key
    }

    /// Sender feeding this watch, in feed order
    pub fn sender(&self) -> mpsc::Sender<RawUpdate> {
        self.sender.clone()
    }

    /// Stop the task, abandoning any queued updates
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Check if the task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Close the channel and wait for queued updates to drain
    pub async fn shutdown(self) {
        drop(self.sender);
        let _ = self.task.await;
    }
}

/// Manager for the ladders of many watched book sides
///
/// # Thread Safety
///
/// The manager is shared across tasks via `Arc<LadderManager>`. Readers get
/// `Arc` snapshots and never hold the lock while using them.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use futarchy_ladder::orderbook::{LadderEvent, LadderManager};
/// use futarchy_ladder::types::WatchTarget;
///
/// # async fn example(target: WatchTarget) {
/// let manager = Arc::new(LadderManager::new(1024));
/// let mut events = manager.subscribe();
/// let watch = manager.watch(target, 64);
///
/// // Feed raw updates through `watch.sender()`, then:
/// while let Ok(LadderEvent::Snapshot(snapshot)) = events.recv().await {
///     println!("best: {:?}", snapshot.ladder().best());
/// }
/// # }
/// ```
#[derive(Debug)]
pub struct LadderManager {
    /// Latest snapshot by ladder key
    snapshots: RwLock<FxHashMap<WatchKey, Arc<OrderBookSnapshot>>>,
    /// Snapshot and failure notifications
    events: broadcast::Sender<LadderEvent>,
}

impl Default for LadderManager {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl LadderManager {
    /// Create a manager buffering up to `event_capacity` events per subscriber
    pub fn new(event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            snapshots: RwLock::new(FxHashMap::default()),
            events,
        }
    }

    /// Subscribe to ladder events
    pub fn subscribe(&self) -> broadcast::Receiver<LadderEvent> {
        self.events.subscribe()
    }

    /// Spawn a task processing updates for `target`, one at a time
    ///
    /// Must be called from within a tokio runtime.
    pub fn watch(self: &Arc<Self>, target: WatchTarget, capacity: usize) -> WatchHandle {
        let (sender, mut receiver) = mpsc::channel::<RawUpdate>(capacity.max(1));
        let manager = Arc::clone(self);

        let task = tokio::spawn(async move {
            while let Some(update) = receiver.recv().await {
                // result is already published as an event
                let _ = manager.handle_update(&target, &update);
            }
            debug!(watch = %target, "watch channel closed");
        });

        WatchHandle {
            target,
            sender,
            task,
        }
    }

    /// Run the pipeline for one update and publish the outcome
    ///
    /// On success the snapshot replaces the previous one for the key. On
    /// failure the previous snapshot is kept and a failure event is sent.
    pub fn handle_update(
        &self,
        target: &WatchTarget,
        update: &RawUpdate,
    ) -> Result<Arc<OrderBookSnapshot>, Error> {
        match process_update(target, update) {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.snapshots
                    .write()
                    .insert(target.key, Arc::clone(&snapshot));
                // no subscribers is fine
                let _ = self.events.send(LadderEvent::Snapshot(Arc::clone(&snapshot)));
                Ok(snapshot)
            }
            Err(err) => {
                warn!(
                    proposal = target.key.proposal_id,
                    branch = %target.key.branch,
                    side = %target.key.side,
                    account = %update.account,
                    slot = update.slot,
                    error = %err,
                    "dropping book-side update"
                );
                let _ = self.events.send(LadderEvent::Failed(UpdateFailure {
                    key: target.key,
                    account: update.account,
                    slot: update.slot,
                    reason: err.to_string(),
                }));
                Err(err)
            }
        }
    }

    /// Latest snapshot for a key
    pub fn latest(&self, key: &WatchKey) -> Option<Arc<OrderBookSnapshot>> {
        self.snapshots.read().get(key).cloned()
    }

    /// Keys with a published snapshot
    pub fn keys(&self) -> Vec<WatchKey> {
        self.snapshots.read().keys().copied().collect()
    }

    /// Forget the snapshot for a key
    pub fn remove(&self, key: &WatchKey) -> Option<Arc<OrderBookSnapshot>> {
        self.snapshots.write().remove(key)
    }

    /// Forget all snapshots
    pub fn clear(&self) {
        self.snapshots.write().clear();
    }

    /// Number of keys with a published snapshot
    pub fn len(&self) -> usize {
        self.snapshots.read().len()
    }

    /// Check if no snapshot has been published
    pub fn is_empty(&self) -> bool {
        self.snapshots.read().is_empty()
    }
}
