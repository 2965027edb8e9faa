//! Moderation status state machine.
//!
//! `pending` is the only non-terminal state. The first verdict moves a message
//! into `neutral` or `hate`; every later verdict is a no-op, so redelivered or
//! conflicting verdicts converge on whatever the first one decided.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Neutral,
    Hate,
}

/// Outcome of applying a verdict to a status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Changed {
        from: MessageStatus,
        to: MessageStatus,
    },
    Unchanged,
}

impl MessageStatus {
    /// Row id in the `message_statuses` lookup table
    pub const fn id(self) -> i16 {
        match self {
            MessageStatus::Pending => 1,
            MessageStatus::Neutral => 2,
            MessageStatus::Hate => 3,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            MessageStatus::Pending => "pending",
            MessageStatus::Neutral => "neutral",
            MessageStatus::Hate => "hate",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, MessageStatus::Pending)
    }

    /// Status a verdict asks for
    pub const fn from_verdict(is_hate_speech: bool) -> Self {
        if is_hate_speech {
            MessageStatus::Hate
        } else {
            MessageStatus::Neutral
        }
    }

    /// Apply a verdict. Only `pending` moves; terminal states never change.
    pub fn apply_verdict(self, is_hate_speech: bool) -> Transition {
        if self.is_terminal() {
            return Transition::Unchanged;
        }
        Transition::Changed {
            from: self,
            to: Self::from_verdict(is_hate_speech),
        }
    }
}

impl Transition {
    /// Status after the transition, given the status before it
    pub fn resulting_status(self, before: MessageStatus) -> MessageStatus {
        match self {
            Transition::Changed { to, .. } => to,
            Transition::Unchanged => before,
        }
    }

    /// True only when this transition moved a message into `hate`
    pub fn entered_hate(self) -> bool {
        matches!(
            self,
            Transition::Changed {
                to: MessageStatus::Hate,
                ..
            }
        )
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "pending" => Ok(MessageStatus::Pending),
            "neutral" => Ok(MessageStatus::Neutral),
            "hate" => Ok(MessageStatus::Hate),
            _ => anyhow::bail!("Unknown message status: {}", s),
        }
    }
}
