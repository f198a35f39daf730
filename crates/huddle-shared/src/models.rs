//! Domain records exchanged with the chat backend.
//!
//! Every struct derives `Serialize` and `Deserialize` so the same types are
//! used by the client to decode responses and by the server to produce them.
//! Unknown fields are ignored on decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{GroupId, MeetingId, MessageId, UserId};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A group member, and also the shape of the authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

impl User {
    pub fn new(id: i64, username: impl Into<String>) -> Self {
        Self {
            id: UserId(id),
            username: username.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat message as stored by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Author. Older rows can come back without one.
    #[serde(default)]
    pub user: Option<User>,
}

// ---------------------------------------------------------------------------
// Group
// ---------------------------------------------------------------------------

/// The chat group the current user belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    #[serde(default)]
    pub id: Option<GroupId>,
    pub name: String,
    #[serde(default)]
    pub members: Vec<User>,
}

impl Group {
    /// Usernames joined for the header line, `None` when nobody is listed.
    pub fn member_names(&self) -> String {
        if self.members.is_empty() {
            return "None".to_string();
        }
        self.members
            .iter()
            .map(|m| m.username.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ---------------------------------------------------------------------------
// Meeting
// ---------------------------------------------------------------------------

/// A meeting proposal created by the backend when a message reads like a
/// request to meet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Meeting {
    pub id: MeetingId,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_meet_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<User>,
}

impl Meeting {
    pub fn new(id: i64, description: impl Into<String>) -> Self {
        Self {
            id: MeetingId(id),
            description: description.into(),
            title: None,
            scheduled_time: None,
            google_meet_link: None,
            creator: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_without_user_decodes() {
        let json = r#"{"id":3,"content":"hey","timestamp":"2026-01-05T10:00:00Z","group":1}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id, MessageId(3));
        assert!(msg.user.is_none());
    }

    #[test]
    fn test_member_names() {
        let mut group = Group {
            id: None,
            name: "Team".into(),
            members: vec![User::new(1, "a"), User::new(2, "b")],
        };
        assert_eq!(group.member_names(), "a, b");

        group.members.clear();
        assert_eq!(group.member_names(), "None");
    }

    #[test]
    fn test_meeting_ignores_backend_extras() {
        let json = r#"{"id":9,"description":"sync","group":1,"title":"Meeting initiated by a"}"#;
        let meeting: Meeting = serde_json::from_str(json).unwrap();
        assert_eq!(meeting.id, MeetingId(9));
        assert_eq!(meeting.title.as_deref(), Some("Meeting initiated by a"));
        assert!(meeting.google_meet_link.is_none());
    }
}
