//! Per-connection outbound queue and its delivery loop.
//!
//! ## 責務
//!
//! - 接続ごとに容量固定のキューを 1 つ持つ
//! - キューを順番に取り出して接続へ書き込む専用タスクを 1 つ起動する
//! - 書き込み失敗は接続にとって致命的: 接続を閉じ、Hub から登録解除する
//!
//! Producers never block: [`OutboundQueue::try_enqueue`] either queues the
//! payload or drops it when the queue is full.

use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use tokio::{
    sync::{
        mpsc::{self, error::TrySendError},
        watch,
    },
    task::JoinHandle,
};

use crate::domain::ConnectionId;

/// Serialized outbound envelope, shared between all recipients of a broadcast.
pub type Payload = Arc<str>;

/// Default bound of every outbound queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Errors raised by the underlying connection while delivering.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection closed")]
    Closed,

    #[error("Write failed: {0}")]
    WriteFailed(String),
}

/// Write half of a live connection.
///
/// The delivery loop is its only user, so writes are strictly sequential.
#[async_trait]
pub trait ConnectionWriter: Send {
    async fn write(&mut self, payload: &str) -> Result<(), TransportError>;

    /// Close the connection after a fatal write failure.
    async fn close(&mut self);
}

/// Result of a non-blocking enqueue attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued,
    /// The queue was full; the payload was dropped for this client only.
    Dropped,
    /// The queue was closed by unregister or its delivery loop is gone.
    Closed,
}

/// Producer side of a bounded outbound queue.
#[derive(Debug)]
pub struct OutboundQueue {
    sender: mpsc::Sender<Payload>,
    closed: watch::Sender<bool>,
}

/// Consumer side, owned by the delivery loop.
#[derive(Debug)]
pub struct OutboundReceiver {
    receiver: mpsc::Receiver<Payload>,
    closed: watch::Receiver<bool>,
}

impl OutboundQueue {
    /// Create a queue holding at most `capacity` payloads (at least one).
    pub fn bounded(capacity: usize) -> (Self, OutboundReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let (closed_tx, closed_rx) = watch::channel(false);
        (
            Self {
                sender,
                closed: closed_tx,
            },
            OutboundReceiver {
                receiver,
                closed: closed_rx,
            },
        )
    }

    /// Queue `payload` without waiting. A full queue drops the payload.
    pub fn try_enqueue(&self, payload: Payload) -> EnqueueOutcome {
        if self.is_closed() {
            return EnqueueOutcome::Closed;
        }
        match self.sender.try_send(payload) {
            Ok(()) => EnqueueOutcome::Queued,
            Err(TrySendError::Full(_)) => EnqueueOutcome::Dropped,
            Err(TrySendError::Closed(_)) => EnqueueOutcome::Closed,
        }
    }

    /// Stop accepting payloads and stop the delivery loop.
    ///
    /// Payloads still sitting in the queue are discarded, not delivered.
    pub fn close(&self) {
        self.closed.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Resolves once the queue has been closed.
    pub fn closed(&self) -> impl Future<Output = ()> + Send + 'static {
        wait_closed(self.closed.subscribe())
    }

    /// Number of payloads currently waiting for delivery.
    pub fn len(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

async fn wait_closed(mut closed: watch::Receiver<bool>) {
    loop {
        if *closed.borrow_and_update() {
            return;
        }
        if closed.changed().await.is_err() {
            return;
        }
    }
}

/// Spawn the single delivery loop of one connection.
///
/// Payloads are written in enqueue order, one at a time, without retries.
/// The loop ends when the queue is closed, or after a write failure, in which
/// case the connection is closed and `on_failure` runs the teardown.
pub fn spawn_delivery_loop<F, Fut>(
    connection_id: ConnectionId,
    outbound: OutboundReceiver,
    mut writer: Box<dyn ConnectionWriter>,
    on_failure: F,
) -> JoinHandle<()>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let OutboundReceiver {
        mut receiver,
        closed,
    } = outbound;

    tokio::spawn(async move {
        let shutdown = wait_closed(closed.clone());
        tokio::pin!(shutdown);

        loop {
            let payload = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                next = receiver.recv() => match next {
                    Some(payload) => payload,
                    None => break,
                },
            };

            // close() may have raced with the recv above
            if *closed.borrow() {
                break;
            }

            if let Err(e) = writer.write(&payload).await {
                tracing::warn!("Failed to deliver to '{}': {}", connection_id, e);
                writer.close().await;
                on_failure().await;
                return;
            }
        }

        tracing::debug!("Delivery loop for '{}' stopped", connection_id);
    })
}
