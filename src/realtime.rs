// ============================================================================
// Realtime Broadcast
// ============================================================================
//
// Events for connected group members are published on one Redis channel per
// group. The transport that relays them to sockets subscribes to those
// channels; it is not part of this service.
//
// Envelope: {"type": "newMessage" | "hateUpdate", "payload": ...}
//
// ============================================================================

use anyhow::{Context, Result};
use redis::AsyncCommands;
use serde::Serialize;
use std::time::Duration;

use crate::message::Message;
use crate::pipeline::RealtimeBroadcaster;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum RealtimeEvent {
    /// Full message, published once after it was persisted
    #[serde(rename = "newMessage")]
    NewMessage(Message),
    /// Published once when a message is classified as hate speech
    #[serde(rename = "hateUpdate")]
    HateUpdate { message_id: i64 },
}

impl RealtimeEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            RealtimeEvent::NewMessage(_) => "newMessage",
            RealtimeEvent::HateUpdate { .. } => "hateUpdate",
        }
    }
}

/// Channel name for a group, e.g. `group:7`
pub fn group_channel(prefix: &str, group_id: i64) -> String {
    format!("{}{}", prefix, group_id)
}

/// Publishes realtime events with Redis PUBLISH
#[derive(Clone)]
pub struct RedisBroadcaster {
    conn: redis::aio::ConnectionManager,
    channel_prefix: String,
}

impl RedisBroadcaster {
    pub async fn connect(url: &str, channel_prefix: &str, connect_timeout: Duration) -> Result<Self> {
        if url.starts_with("rediss://") {
            tracing::info!("Redis TLS enabled (rediss://)");
        }

        let client = redis::Client::open(url).context("Failed to parse Redis URL")?;
        let conn = tokio::time::timeout(connect_timeout, client.get_connection_manager())
            .await
            .context("Timed out connecting to Redis")?
            .context("Failed to connect to Redis")?;

        Ok(Self::new(conn, channel_prefix))
    }

    pub fn new(conn: redis::aio::ConnectionManager, channel_prefix: &str) -> Self {
        Self {
            conn,
            channel_prefix: channel_prefix.to_string(),
        }
    }

    /// Connection handle shared with the health probe
    pub fn connection(&self) -> redis::aio::ConnectionManager {
        self.conn.clone()
    }
}

#[async_trait::async_trait]
impl RealtimeBroadcaster for RedisBroadcaster {
    async fn publish(&self, group_id: i64, event: &RealtimeEvent) -> Result<()> {
        let channel = group_channel(&self.channel_prefix, group_id);
        let payload = serde_json::to_string(event).context("Failed to serialize realtime event")?;

        let mut conn = self.conn.clone();
        let receivers: i64 = conn
            .publish(&channel, payload)
            .await
            .with_context(|| format!("Failed to publish to {}", channel))?;

        tracing::debug!(
            channel = %channel,
            event = event.kind(),
            receivers = receivers,
            "Published realtime event"
        );
        Ok(())
    }
}
