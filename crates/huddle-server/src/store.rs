//! In-memory chat state: one group, its messages, meetings, and each
//! member's availability for those meetings.
//!
//! Everything lives behind a single tokio mutex; handlers hold it only for
//! the duration of one operation.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use huddle_shared::{Group, GroupId, Meeting, MeetingId, Message, MessageId, User, UserId};

use crate::error::ServerError;

/// Length of the random room code in generated meet links.
const MEET_CODE_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    pub user_id: UserId,
    pub is_available: bool,
}

struct Inner {
    group: Group,
    messages: Vec<Message>,
    meetings: HashMap<MeetingId, Meeting>,
    availability: HashMap<MeetingId, Vec<Availability>>,
    next_message_id: i64,
    next_meeting_id: i64,
}

pub struct ChatStore {
    inner: Mutex<Inner>,
}

impl ChatStore {
    pub fn new(group_name: impl Into<String>, members: Vec<User>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                group: Group {
                    id: Some(GroupId(1)),
                    name: group_name.into(),
                    members,
                },
                messages: Vec::new(),
                meetings: HashMap::new(),
                availability: HashMap::new(),
                next_message_id: 1,
                next_meeting_id: 1,
            }),
        }
    }

    pub async fn group(&self) -> Group {
        self.inner.lock().await.group.clone()
    }

    /// The newest `limit` messages, oldest first.
    pub async fn list_messages(&self, limit: usize) -> Vec<Message> {
        let inner = self.inner.lock().await;
        let skip = inner.messages.len().saturating_sub(limit);
        inner.messages[skip..].to_vec()
    }

    pub async fn create_message(&self, user: &User, content: &str) -> Message {
        let mut inner = self.inner.lock().await;
        let id = MessageId(inner.next_message_id);
        inner.next_message_id += 1;

        let message = Message {
            id,
            content: content.to_string(),
            timestamp: Utc::now(),
            user: Some(user.clone()),
        };
        inner.messages.push(message.clone());

        debug!(id = %id, user = %user.username, "Message stored");
        message
    }

    /// Open a meeting proposal for `content`, due an hour from `now`, with an
    /// unanswered availability row for every group member.
    pub async fn create_meeting(&self, creator: &User, content: &str, now: DateTime<Utc>) -> Meeting {
        let mut inner = self.inner.lock().await;
        let id = MeetingId(inner.next_meeting_id);
        inner.next_meeting_id += 1;

        let meeting = Meeting {
            id,
            description: content.to_string(),
            title: Some(format!("Meeting initiated by {}", creator.username)),
            scheduled_time: Some(now + Duration::hours(1)),
            google_meet_link: Some(meet_link()),
            creator: Some(creator.clone()),
        };

        let rows = inner
            .group
            .members
            .iter()
            .map(|m| Availability {
                user_id: m.id,
                is_available: false,
            })
            .collect();
        inner.availability.insert(id, rows);
        inner.meetings.insert(id, meeting.clone());

        info!(id = %id, creator = %creator.username, "Meeting proposed");
        meeting
    }

    pub async fn meeting(&self, id: MeetingId) -> Option<Meeting> {
        self.inner.lock().await.meetings.get(&id).cloned()
    }

    pub async fn schedule(&self, id: MeetingId, time: DateTime<Utc>) -> Result<Meeting, ServerError> {
        let mut inner = self.inner.lock().await;
        let meeting = inner
            .meetings
            .get_mut(&id)
            .ok_or(ServerError::MeetingNotFound(id))?;
        meeting.scheduled_time = Some(time);

        info!(id = %id, time = %time, "Meeting scheduled");
        Ok(meeting.clone())
    }

    pub async fn update_availability(
        &self,
        id: MeetingId,
        user_id: UserId,
        is_available: bool,
    ) -> Result<(), ServerError> {
        let mut inner = self.inner.lock().await;
        let row = inner
            .availability
            .get_mut(&id)
            .and_then(|rows| rows.iter_mut().find(|r| r.user_id == user_id))
            .ok_or(ServerError::AvailabilityNotFound(id))?;
        row.is_available = is_available;

        debug!(meeting = %id, user = %user_id, is_available, "Availability updated");
        Ok(())
    }

    pub async fn availability(&self, id: MeetingId) -> Vec<Availability> {
        self.inner
            .lock()
            .await
            .availability
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }
}

fn meet_link() -> String {
    let code = Uuid::new_v4().simple().to_string();
    format!("https://meet.google.com/{}", &code[..MEET_CODE_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ChatStore {
        ChatStore::new("Team", vec![User::new(1, "alice"), User::new(2, "bob")])
    }

    #[tokio::test]
    async fn test_messages_are_capped_and_oldest_first() {
        let store = store();
        let alice = User::new(1, "alice");
        for i in 0..5 {
            store.create_message(&alice, &format!("m{i}")).await;
        }

        let latest = store.list_messages(3).await;
        let contents: Vec<_> = latest.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);
        assert_eq!(latest[0].id, MessageId(3));
        assert_eq!(store.list_messages(50).await.len(), 5);
    }

    #[tokio::test]
    async fn test_meeting_gets_link_and_availability_rows() {
        let store = store();
        let now = Utc::now();
        let meeting = store.create_meeting(&User::new(2, "bob"), "let's meet", now).await;

        assert_eq!(meeting.title.as_deref(), Some("Meeting initiated by bob"));
        assert_eq!(meeting.scheduled_time, Some(now + Duration::hours(1)));
        let link = meeting.google_meet_link.unwrap();
        assert_eq!(link.len(), "https://meet.google.com/".len() + MEET_CODE_LEN);

        let rows = store.availability(meeting.id).await;
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| !r.is_available));
    }

    #[tokio::test]
    async fn test_schedule_unknown_meeting() {
        let store = store();
        let err = store.schedule(MeetingId(42), Utc::now()).await.unwrap_err();
        assert!(matches!(err, ServerError::MeetingNotFound(MeetingId(42))));
    }

    #[tokio::test]
    async fn test_availability_requires_membership_row() {
        let store = store();
        let meeting = store.create_meeting(&User::new(1, "alice"), "sync", Utc::now()).await;

        store.update_availability(meeting.id, UserId(2), true).await.unwrap();
        let rows = store.availability(meeting.id).await;
        assert!(rows.iter().any(|r| r.user_id == UserId(2) && r.is_available));

        let err = store
            .update_availability(meeting.id, UserId(7), true)
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::AvailabilityNotFound(_)));
    }
}
