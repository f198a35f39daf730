//! Local state of one chat view session.
//!
//! [`ChatState`] is wrapped in `Arc<Mutex<>>` and shared between the chat
//! interface handle and its background tasks (group load, poller). It never
//! crosses an `.await` while locked.

use huddle_shared::{Group, Meeting, Message};

use crate::scheduler::{MeetingScheduler, SchedulerOptions};

#[derive(Debug, Default)]
pub struct ChatState {
    /// Group metadata. `None` until the initial fetch succeeds; the view shows
    /// a loading placeholder meanwhile.
    pub group: Option<Group>,

    /// Messages in server order.
    pub messages: Vec<Message>,

    /// Text typed into the input, kept intact across failed sends.
    pub draft: String,

    /// A send is in flight; the input is disabled.
    pub sending: bool,

    /// The single mounted scheduler, tied to the pending meeting proposal.
    pub scheduler: Option<MeetingScheduler>,

    /// Cleared on unmount. Late completions check it before touching state.
    pub mounted: bool,

    /// Bumped whenever the poller is restarted or torn down; poll results
    /// tagged with an older generation are dropped.
    pub poll_generation: u64,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the server's echo of a sent message.
    ///
    /// Unlike a plain push, a message whose id is already listed (a poll raced
    /// ahead of the send response) is skipped, so the list never shows the
    /// same message twice until the next poll replaces it.
    pub fn append_message(&mut self, message: Message) -> bool {
        if self.messages.iter().any(|m| m.id == message.id) {
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Replace the list wholesale with a fresh poll result.
    pub fn replace_messages(&mut self, messages: Vec<Message>) -> usize {
        self.messages = messages;
        self.messages.len()
    }

    /// Mount a scheduler for a new proposal, replacing any previous one.
    pub fn propose_meeting(&mut self, meeting: Meeting, options: SchedulerOptions) {
        self.scheduler = Some(MeetingScheduler::mount(meeting, options));
    }

    pub fn pending_meeting(&self) -> Option<&Meeting> {
        self.scheduler.as_ref().map(|s| s.meeting())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use huddle_shared::{MessageId, User};

    fn message(id: i64) -> Message {
        Message {
            id: MessageId(id),
            content: format!("m{id}"),
            timestamp: Utc::now(),
            user: Some(User::new(1, "a")),
        }
    }

    #[test]
    fn test_append_skips_known_ids() {
        let mut state = ChatState::new();
        state.replace_messages(vec![message(1), message(2)]);

        assert!(state.append_message(message(3)));
        assert!(!state.append_message(message(2)));
        let ids: Vec<i64> = state.messages.iter().map(|m| m.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_new_proposal_replaces_scheduler() {
        let mut state = ChatState::new();
        state.propose_meeting(Meeting::new(1, "first"), SchedulerOptions::default());
        state.propose_meeting(Meeting::new(2, "second"), SchedulerOptions::default());
        assert_eq!(state.pending_meeting().map(|m| m.id.0), Some(2));
    }
}
