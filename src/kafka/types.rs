use serde::{Deserialize, Serialize};

/// Moderation request sent to the classifier
///
/// Wire format: `{"id": 42, "group_id": 7, "content": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationRequest {
    /// Message id
    pub id: i64,
    pub group_id: i64,
    pub content: String,
}

/// Verdict produced by the classifier for one message
///
/// Delivered at least once and in no particular order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationVerdict {
    /// Message id
    pub id: i64,
    pub group_id: i64,
    pub is_hate_speech: bool,
}

impl ModerationVerdict {
    /// Decode and validate a raw verdict payload
    pub fn decode(payload: &[u8]) -> Result<Self, String> {
        let verdict: Self = serde_json::from_slice(payload)
            .map_err(|e| format!("invalid verdict payload: {}", e))?;
        verdict.validate()?;
        Ok(verdict)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id <= 0 {
            return Err(format!("message id must be positive, got {}", self.id));
        }
        if self.group_id <= 0 {
            return Err(format!("group id must be positive, got {}", self.group_id));
        }
        Ok(())
    }
}

/// Per-recipient notification about a new group message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub room_id: i64,
    pub content: String,
}

/// Wire envelope of a notification
///
/// The notification service expects identifiers as decimal strings:
/// `{"type": "incomingMessage", "payload": {"from_user_id": "1", ...}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNotification {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: IncomingMessagePayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessagePayload {
    pub from_user_id: String,
    pub to_user_id: String,
    pub room_id: String,
    pub content: String,
}

pub const INCOMING_MESSAGE_TYPE: &str = "incomingMessage";

impl From<&Notification> for RawNotification {
    fn from(n: &Notification) -> Self {
        Self {
            kind: INCOMING_MESSAGE_TYPE.to_string(),
            payload: IncomingMessagePayload {
                from_user_id: n.from_user_id.to_string(),
                to_user_id: n.to_user_id.to_string(),
                room_id: n.room_id.to_string(),
                content: n.content.clone(),
            },
        }
    }
}
