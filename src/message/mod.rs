// ============================================================================
// Message Model
// ============================================================================
//
// A message is created once and afterwards only its status moves (see
// status.rs). Attachments are written together with their message and never
// change, except for the presentation URL which is regenerated on every read.
//
// ============================================================================

pub mod status;

pub use status::{MessageStatus, Transition};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Persisted group message, hydrated with its attachments
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: i64,
    pub user_id: i64,
    pub group_id: i64,
    pub status: MessageStatus,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub files: Vec<Attachment>,
}

/// File attached to a message
///
/// Serialized as `{name, url, type, size}`; the storage object name stays internal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    #[serde(skip)]
    pub id: i64,
    #[serde(skip)]
    pub object_name: String,
    #[serde(rename = "name")]
    pub original_name: String,
    /// Presentation URL, only valid for a limited time
    pub url: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub size: i64,
}

/// Attachment payload as received from the client
#[derive(Debug, Clone)]
pub struct RawAttachment {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Input of `MessagePipeline::create`
#[derive(Debug, Clone)]
pub struct CreateMessage {
    pub user_id: i64,
    pub group_id: i64,
    pub content: String,
    pub attachments: Vec<RawAttachment>,
}

/// Row set written by the message store in one transaction
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub user_id: i64,
    pub group_id: i64,
    pub content: String,
    pub attachments: Vec<NewAttachment>,
}

/// Attachment that was uploaded and is about to be persisted
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub object_name: String,
    pub original_name: String,
    pub content_type: String,
    pub size: i64,
    pub url: String,
}
