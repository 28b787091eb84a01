/*!
 * # Notification Broadcast
 *
 * Fire-and-forget publish primitive used to push transfer workflow events to
 * connected clients. The workflow treats delivery as at-most-once: a failed
 * publish is logged by the caller and never fails the request that caused it.
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

/// Broadcast errors
#[derive(Error, Debug)]
pub enum BroadcastError {
    #[error("No subscribers on channel")]
    NoSubscribers,
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

/// Envelope published to a channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastMessage {
    pub channel: String,
    pub event: String,
    pub payload: serde_json::Value,
}

/// Publish primitive for real-time notifications
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn publish(
        &self,
        channel: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), BroadcastError>;
}

/// In-process broadcaster backed by a tokio broadcast channel. Default
/// backend; also what the test harness subscribes to.
#[derive(Debug)]
pub struct InMemoryBroadcaster {
    sender: broadcast::Sender<BroadcastMessage>,
}

impl InMemoryBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastMessage> {
        self.sender.subscribe()
    }
}

impl Default for InMemoryBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl Broadcaster for InMemoryBroadcaster {
    async fn publish(
        &self,
        channel: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), BroadcastError> {
        let message = BroadcastMessage {
            channel: channel.to_string(),
            event: event.to_string(),
            payload,
        };

        // A send with zero receivers is not a failure for fire-and-forget
        // delivery; nobody was listening.
        let _ = self.sender.send(message);
        Ok(())
    }
}

/// Redis-backed broadcaster: PUBLISHes the envelope the SPA's websocket
/// bridge relays to browsers.
pub struct RedisBroadcaster {
    client: Arc<redis::Client>,
}

impl RedisBroadcaster {
    pub fn new(client: Arc<redis::Client>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Broadcaster for RedisBroadcaster {
    async fn publish(
        &self,
        channel: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), BroadcastError> {
        let body = serde_json::to_string(&serde_json::json!({
            "event": event,
            "data": payload,
        }))
        .map_err(|e| BroadcastError::SerializationError(e.to_string()))?;

        let mut conn = self
            .client
            .get_async_connection()
            .await
            .map_err(|e| BroadcastError::ConnectionError(e.to_string()))?;

        redis::cmd("PUBLISH")
            .arg(channel)
            .arg(body)
            .query_async::<_, i64>(&mut conn)
            .await
            .map_err(|e| BroadcastError::ConnectionError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_broadcaster_delivers_to_subscribers() {
        let broadcaster = InMemoryBroadcaster::default();
        let mut rx = broadcaster.subscribe();

        broadcaster
            .publish(
                "traspasos",
                "TraspasoActualizado",
                serde_json::json!({"id": 3, "estado": "Aprobado"}),
            )
            .await
            .unwrap();

        let message = rx.recv().await.unwrap();
        assert_eq!(message.channel, "traspasos");
        assert_eq!(message.event, "TraspasoActualizado");
        assert_eq!(message.payload["estado"], "Aprobado");
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_not_an_error() {
        let broadcaster = InMemoryBroadcaster::default();
        let result = broadcaster
            .publish("traspasos", "TraspasoCreado", serde_json::json!({"id": 1}))
            .await;
        assert!(result.is_ok());
    }
}
