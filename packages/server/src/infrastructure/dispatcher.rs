//! Broadcast dispatcher: the only writer to client connections.
//!
//! ## 責務
//!
//! - 送信キュー（FIFO, 有界）への投入 (`Dispatcher::submit`)
//! - キューを唯一のコンシューマ (`DispatchLoop::run`) が順に取り出し、
//!   Registry の snapshot 全員へ配信する
//!
//! `DispatchLoop` は `Clone` を実装せず、`run` が `self` を消費するため
//! プロセス内でドレインするループは常に 1 つだけになる。これにより全クライアントが
//! 同じ相対順序で配信を観測する。

use std::sync::Arc;

use agora_shared::time::Clock;
use clap::ValueEnum;
use tokio::sync::mpsc;

use crate::domain::{BroadcastItem, ConnectionId, SubmitError, Timestamp};

use super::registry::ConnectionRegistry;

/// What `submit` does when the queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackpressurePolicy {
    /// The submitter waits until a slot frees up.
    Block,
    /// The new item is dropped and `SubmitError::QueueFull` is returned.
    DropNewest,
}

/// Producer handle for the dispatch queue. Cheap to clone.
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::Sender<BroadcastItem>,
    policy: BackpressurePolicy,
    clock: Arc<dyn Clock>,
}

/// The single draining actor of the dispatch queue.
pub struct DispatchLoop {
    rx: mpsc::Receiver<BroadcastItem>,
    registry: Arc<ConnectionRegistry>,
    clock: Arc<dyn Clock>,
}

/// Outcome of delivering one item to a registry snapshot.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub evicted: Vec<ConnectionId>,
}

/// Create a dispatch queue of `capacity` items.
///
/// # Panics
///
/// Panics if `capacity` is zero; configuration validation rejects that
/// before the queue is built.
pub fn dispatch_channel(
    registry: Arc<ConnectionRegistry>,
    capacity: usize,
    policy: BackpressurePolicy,
    clock: Arc<dyn Clock>,
) -> (Dispatcher, DispatchLoop) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        Dispatcher {
            tx,
            policy,
            clock: clock.clone(),
        },
        DispatchLoop {
            rx,
            registry,
            clock,
        },
    )
}

impl Dispatcher {
    /// Enqueue an already-formatted frame for delivery to every member.
    pub async fn submit(&self, payload: impl Into<String>) -> Result<(), SubmitError> {
        let item = BroadcastItem::new(payload.into(), Timestamp::new(self.clock.now_millis()));

        match self.policy {
            BackpressurePolicy::Block => self.tx.send(item).await.map_err(|_| SubmitError::Closed),
            BackpressurePolicy::DropNewest => match self.tx.try_send(item) {
                Ok(()) => Ok(()),
                Err(mpsc::error::TrySendError::Full(item)) => {
                    tracing::warn!(
                        payload_len = item.payload.len(),
                        "dispatch queue full, dropping newest item"
                    );
                    Err(SubmitError::QueueFull)
                }
                Err(mpsc::error::TrySendError::Closed(_)) => Err(SubmitError::Closed),
            },
        }
    }
}

impl DispatchLoop {
    /// Drain the queue until every `Dispatcher` handle has been dropped.
    pub async fn run(mut self) {
        tracing::info!("dispatch loop started");
        while let Some(item) = self.rx.recv().await {
            let report = self.deliver(&item).await;
            tracing::debug!(
                queued_ms = self.clock.now_millis() - item.submitted_at.value(),
                delivered = report.delivered,
                evicted = report.evicted.len(),
                "dispatched item"
            );
        }
        tracing::info!("dispatch loop stopped");
    }

    /// Write one item to every member of a fresh registry snapshot.
    ///
    /// A failed write evicts that member and delivery continues with the rest.
    pub async fn deliver(&self, item: &BroadcastItem) -> DeliveryReport {
        let members = self.registry.snapshot().await;
        let mut report = DeliveryReport::default();

        for member in members {
            match member.sender.try_send(item.payload.clone()) {
                Ok(()) => {
                    report.delivered += 1;
                    continue;
                }
                Err(mpsc::error::TrySendError::Full(_)) => tracing::warn!(
                    connection = %member.id,
                    name = %member.identity.name,
                    "client buffer full during broadcast, evicting connection"
                ),
                Err(mpsc::error::TrySendError::Closed(_)) => tracing::warn!(
                    connection = %member.id,
                    name = %member.identity.name,
                    "write failed during broadcast, evicting connection"
                ),
            }
            self.registry.unregister(&member.id).await;
            report.evicted.push(member.id);
        }

        report
    }
}
