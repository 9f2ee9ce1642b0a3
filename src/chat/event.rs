//! Chat event types and wire text formatting.
//!
//! Every registry-visible event (message, join, leave, rename) is rendered
//! to a single line which is appended to the history log and broadcast to
//! the other sessions.

use chrono::{DateTime, Local};

/// Timestamp format used in message lines and prompts.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time rendered in the wire format.
pub fn timestamp_now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// The recurring prompt sent to a client to indicate it is their turn to
/// type: `[<timestamp>][<name>]:`.
pub fn prompt_for(name: &str) -> String {
    format!("[{}][{}]:", timestamp_now(), name)
}

/// A registry-visible chat event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A user message.
    Message {
        /// Sender's display name.
        sender: String,
        /// Message body as typed.
        body: String,
        /// When the message arrived.
        sent_at: DateTime<Local>,
    },
    /// A user joined the chat.
    Joined {
        /// The new user's name.
        name: String,
    },
    /// A user left the chat.
    Left {
        /// The departing user's name.
        name: String,
    },
    /// A user changed their display name.
    Renamed {
        /// Previous name.
        old: String,
        /// New name.
        new: String,
    },
}

impl ChatEvent {
    /// Create a message event stamped with the current time.
    pub fn message(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Message {
            sender: sender.into(),
            body: body.into(),
            sent_at: Local::now(),
        }
    }

    /// Create a join notice.
    pub fn joined(name: impl Into<String>) -> Self {
        Self::Joined { name: name.into() }
    }

    /// Create a leave notice.
    pub fn left(name: impl Into<String>) -> Self {
        Self::Left { name: name.into() }
    }

    /// Create a rename notice.
    pub fn renamed(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self::Renamed {
            old: old.into(),
            new: new.into(),
        }
    }

    /// Render the event as the line stored in history and broadcast to
    /// other sessions.
    pub fn line(&self) -> String {
        match self {
            ChatEvent::Message {
                sender,
                body,
                sent_at,
            } => format!("[{}][{}]:{}", sent_at.format(TIMESTAMP_FORMAT), sender, body),
            ChatEvent::Joined { name } => format!("{name} has joined our chat..."),
            ChatEvent::Left { name } => format!("{name} has left our chat..."),
            ChatEvent::Renamed { old, new } => format!("{old} has changed name to {new}"),
        }
    }

    /// The name the broadcaster should skip when delivering this event.
    ///
    /// The sender of a message, the joiner, and the leaver do not receive
    /// their own notice; a renamed user is registered under the new name by
    /// the time the notice goes out.
    pub fn originator(&self) -> &str {
        match self {
            ChatEvent::Message { sender, .. } => sender,
            ChatEvent::Joined { name } => name,
            ChatEvent::Left { name } => name,
            ChatEvent::Renamed { new, .. } => new,
        }
    }
}
