//! Outbound message queue.

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use crate::error::{ApiError, ApiResult};

#[async_trait]
pub trait MessageProducer: Send + Sync {
    /// Publish `payload` to `queue`.
    async fn send_message(&self, queue: &str, payload: String) -> ApiResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    pub queue: String,
    pub payload: String,
}

/// Hands messages to a consumer task over a bounded channel.
///
/// Publishing waits while the channel is full.
#[derive(Debug, Clone)]
pub struct ChannelQueue {
    tx: mpsc::Sender<QueuedMessage>,
}

impl ChannelQueue {
    /// Create a queue holding at most `capacity` undelivered messages, and
    /// the receiving end its consumer reads from.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<QueuedMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl MessageProducer for ChannelQueue {
    async fn send_message(&self, queue: &str, payload: String) -> ApiResult<()> {
        let bytes = payload.len();
        self.tx
            .send(QueuedMessage {
                queue: queue.to_string(),
                payload,
            })
            .await
            .map_err(|_| ApiError::Internal(format!("queue {queue} has no consumer")))?;
        tracing::debug!(queue, bytes, "message published");
        Ok(())
    }
}

/// Consume `outbox` until every sender is gone, logging each message.
///
/// Stands in for a broker connection; delivered messages are not retained.
pub async fn log_outbox(mut outbox: mpsc::Receiver<QueuedMessage>) {
    while let Some(message) = outbox.recv().await {
        tracing::info!(
            queue = %message.queue,
            bytes = message.payload.len(),
            "message handed off"
        );
    }
    tracing::debug!("outbox closed");
}

/// Keeps every published message in memory, in publish order, for
/// inspection. Nothing drains it.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    messages: Mutex<Vec<QueuedMessage>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn messages(&self) -> Vec<QueuedMessage> {
        self.messages.lock().await.clone()
    }
}

#[async_trait]
impl MessageProducer for MemoryQueue {
    async fn send_message(&self, queue: &str, payload: String) -> ApiResult<()> {
        self.messages.lock().await.push(QueuedMessage {
            queue: queue.to_string(),
            payload,
        });
        Ok(())
    }
}
