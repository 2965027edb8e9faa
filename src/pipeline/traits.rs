// ============================================================================
// Pipeline Collaborators
// ============================================================================
//
// Narrow interfaces the message pipeline depends on. Production
// implementations live next to their infrastructure (db.rs, media/, kafka/,
// realtime.rs); tests plug in in-memory doubles.
//
// ============================================================================

use anyhow::Result;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::time::Duration;

use super::error::ConsumerError;
use crate::kafka::types::{ModerationRequest, Notification};
use crate::message::{Attachment, Message, MessageStatus, NewMessage};
use crate::realtime::RealtimeEvent;

/// Durable message storage
#[async_trait::async_trait]
pub trait MessageStore: Send + Sync {
    /// Insert a message (status `pending`) and its attachments in one transaction
    async fn create(&self, message: NewMessage) -> Result<Message>;

    /// All messages of a group, oldest first (created_at, then id)
    async fn list_by_group(&self, group_id: i64) -> Result<Vec<Message>>;

    /// Move a `pending` message to `status`
    ///
    /// Returns the message's group when this call moved it out of `pending`,
    /// `None` when the message is unknown or already carries a verdict.
    async fn update_status(&self, message_id: i64, status: MessageStatus) -> Result<Option<i64>>;

    /// Messages still `pending` that were created before `older_than`, oldest first
    async fn list_stale_pending(
        &self,
        older_than: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Message>>;

    /// Attachment metadata by storage object name
    async fn find_attachment(&self, object_name: &str) -> Result<Option<Attachment>>;
}

/// Binary storage for attachment objects
#[async_trait::async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn upload(&self, object_name: &str, content_type: &str, data: Bytes) -> Result<()>;

    /// Time-limited presentation URL for an object
    ///
    /// Pure for a given `(object_name, expires_at)`; never touches storage.
    fn presigned_url(&self, object_name: &str, expires_at: DateTime<Utc>) -> String;
}

/// Read-only group roster
#[async_trait::async_trait]
pub trait GroupDirectory: Send + Sync {
    async fn member_ids(&self, group_id: i64) -> Result<Vec<i64>>;
}

#[async_trait::async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<()>;
}

/// Fire-and-forget request channel to the classifier
#[async_trait::async_trait]
pub trait ModerationRequester: Send + Sync {
    async fn request(&self, request: &ModerationRequest) -> Result<()>;
}

#[async_trait::async_trait]
pub trait RealtimeBroadcaster: Send + Sync {
    async fn publish(&self, group_id: i64, event: &RealtimeEvent) -> Result<()>;
}

/// Source of raw verdict payloads
#[async_trait::async_trait]
pub trait VerdictSource: Send + Sync {
    /// Wait at most `timeout` for the next payload.
    ///
    /// `Ok(None)` means the source had nothing to deliver (end of partition).
    async fn poll(&self, timeout: Duration) -> Result<Option<Vec<u8>>, ConsumerError>;

    /// Acknowledge the payload last returned by `poll` and everything before it
    fn commit(&self) -> Result<(), ConsumerError>;
}
