//! Rendering of a single chat message.

use std::fmt;

use chrono::{DateTime, Local, Utc};

use huddle_shared::{Message, MessageId, User};

/// Which side of the conversation a message is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStyle {
    Sent,
    Received,
}

impl MessageStyle {
    pub fn class(&self) -> &'static str {
        match self {
            MessageStyle::Sent => "message-sent",
            MessageStyle::Received => "message-received",
        }
    }
}

/// Display-ready form of a [`Message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub id: MessageId,
    pub author: String,
    pub time: String,
    pub content: String,
    pub style: MessageStyle,
}

impl MessageView {
    /// Render `message` for `current_user`.
    ///
    /// Returns `None` when either the author or the current user is unknown.
    pub fn render(message: &Message, current_user: Option<&User>) -> Option<Self> {
        let author = message.user.as_ref()?;
        let current_user = current_user?;

        let style = if author.id == current_user.id {
            MessageStyle::Sent
        } else {
            MessageStyle::Received
        };

        Some(Self {
            id: message.id,
            author: author.username.clone(),
            time: local_time(message.timestamp),
            content: message.content.clone(),
            style,
        })
    }
}

impl fmt::Display for MessageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.style {
            MessageStyle::Sent => ">",
            MessageStyle::Received => "<",
        };
        write!(f, "{marker} [{}] {}: {}", self.time, self.author, self.content)
    }
}

/// Wall-clock time in the local timezone, e.g. `3:04:05 PM`.
pub fn local_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%-I:%M:%S %p").to_string()
}

/// Date and time in the local timezone, e.g. `10/18/2026, 3:04:05 PM`.
pub fn local_datetime(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local)
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}
