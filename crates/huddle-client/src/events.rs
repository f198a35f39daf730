use tokio::sync::mpsc;

use huddle_shared::{Meeting, MeetingId, MessageId};

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Failure,
}

/// A blocking notice the front end must show to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Failure,
            text: text.into(),
        }
    }
}

/// State changes published by the chat interface. Front ends re-render on
/// each one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    GroupLoaded,
    MessagesUpdated { count: usize },
    MessageSent { id: MessageId },
    SendStateChanged { sending: bool },
    MeetingProposed(Meeting),
    SchedulerChanged,
    SchedulerClosed { meeting_id: MeetingId },
    Notice(Notice),
}

pub type EventSender = mpsc::UnboundedSender<ChatEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<ChatEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

pub fn emit_event(tx: &EventSender, event: ChatEvent) {
    if let Err(e) = tx.send(event) {
        tracing::debug!(event = ?e.0, "No event listener, dropping event");
    }
}
