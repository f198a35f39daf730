//! The chat view: group header, polled message list, message input and the
//! meeting scheduler hand-off.
//!
//! [`ChatInterface`] is a cheap-to-clone handle. `mount` starts the group load
//! in the background; once the group arrives a poller re-fetches the full
//! message list every [`ChatConfig::poll_interval`] until `unmount` (or the
//! last handle is dropped). Every state change is published as a
//! [`ChatEvent`].

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use huddle_shared::constants::POLL_INTERVAL;
use huddle_shared::{Group, Meeting, MeetingId, Message, SendMessageResult};

use crate::api::ChatApi;
use crate::auth::AuthContext;
use crate::config::ClientConfig;
use crate::error::{Result, SchedulerError};
use crate::events::{emit_event, ChatEvent, EventSender, Notice};
use crate::message_view::MessageView;
use crate::scheduler::{self, SchedulerOptions, SchedulerView, FAILED_NOTICE, SCHEDULED_NOTICE};
use crate::state::ChatState;

pub const SEND_FAILED_NOTICE: &str = "Failed to send message";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatConfig {
    pub poll_interval: Duration,
    pub scheduler: SchedulerOptions,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            scheduler: SchedulerOptions::default(),
        }
    }
}

impl From<&ClientConfig> for ChatConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            scheduler: SchedulerOptions {
                post_confirmation_message: config.post_confirmation_message,
            },
        }
    }
}

#[derive(Clone)]
pub struct ChatInterface {
    inner: Arc<Inner>,
}

struct Inner {
    api: Arc<dyn ChatApi>,
    auth: AuthContext,
    config: ChatConfig,
    state: Arc<Mutex<ChatState>>,
    events: EventSender,
    tasks: Mutex<Tasks>,
}

#[derive(Default)]
struct Tasks {
    group_load: Option<JoinHandle<()>>,
    poller: Option<JoinHandle<()>>,
}

impl Tasks {
    fn abort_all(&mut self) {
        if let Some(handle) = self.group_load.take() {
            handle.abort();
        }
        if let Some(handle) = self.poller.take() {
            handle.abort();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        lock_tasks(&self.tasks).abort_all();
    }
}

impl ChatInterface {
    pub fn new(
        api: Arc<dyn ChatApi>,
        auth: AuthContext,
        config: ChatConfig,
        events: EventSender,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                auth,
                config,
                state: Arc::new(Mutex::new(ChatState::new())),
                events,
                tasks: Mutex::new(Tasks::default()),
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Start the view: fetch the group in the background, then poll.
    /// Calling it on a mounted view does nothing. Must run inside a tokio
    /// runtime.
    pub fn mount(&self) {
        {
            let mut state = lock_state(&self.inner.state);
            if state.mounted {
                return;
            }
            state.mounted = true;
        }
        info!("Chat view mounted");
        self.spawn_group_load();
    }

    /// Fetch the group again. The poller restarts if the group changed.
    pub fn reload_group(&self) {
        if !lock_state(&self.inner.state).mounted {
            return;
        }
        self.spawn_group_load();
    }

    /// Stop the group load and the poller. Requests already in flight may
    /// still complete but no longer touch the view's state.
    pub fn unmount(&self) {
        {
            let mut state = lock_state(&self.inner.state);
            state.mounted = false;
            state.poll_generation += 1;
        }
        lock_tasks(&self.inner.tasks).abort_all();
        info!("Chat view unmounted");
    }

    fn spawn_group_load(&self) {
        let api = self.inner.api.clone();
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);

        let handle = tokio::spawn(async move {
            match api.fetch_group().await {
                Ok(group) => {
                    if let Some(inner) = weak.upgrade() {
                        inner.set_group(group);
                    }
                }
                // No retry and no error UI: the view keeps showing the
                // loading placeholder.
                Err(e) => error!(error = %e, "Group fetch error"),
            }
        });

        let mut tasks = lock_tasks(&self.inner.tasks);
        if let Some(old) = tasks.group_load.replace(handle) {
            old.abort();
        }
    }

    // -----------------------------------------------------------------------
    // Sending
    // -----------------------------------------------------------------------

    /// Replace the input text. Rejected while a send is in flight.
    pub fn set_draft(&self, text: impl Into<String>) -> bool {
        let mut state = lock_state(&self.inner.state);
        if state.sending {
            return false;
        }
        state.draft = text.into();
        true
    }

    /// Type `text` and submit it.
    pub async fn send_text(&self, text: impl Into<String>) -> Result<Option<SendMessageResult>> {
        if !self.set_draft(text) {
            return Ok(None);
        }
        self.send_message().await
    }

    /// Submit the current draft.
    ///
    /// Returns `Ok(None)` without any request when the draft is blank, a send
    /// is already in flight, or the group has not loaded yet. On success the
    /// echoed message is appended and a meeting proposal, if any, mounts the
    /// scheduler. On failure the draft is kept for resubmission.
    pub async fn send_message(&self) -> Result<Option<SendMessageResult>> {
        let content = {
            let mut state = lock_state(&self.inner.state);
            if !state.mounted || state.group.is_none() || state.sending {
                return Ok(None);
            }
            if state.draft.trim().is_empty() {
                return Ok(None);
            }
            state.sending = true;
            state.draft.clone()
        };
        self.emit(ChatEvent::SendStateChanged { sending: true });

        let outcome = self.inner.api.send_message(&content).await;

        let mut state = lock_state(&self.inner.state);
        state.sending = false;
        if !state.mounted {
            // Only the busy flag is released so a remounted view can send again.
            debug!("Send completed after unmount, ignoring");
            return outcome.map(Some);
        }

        match outcome {
            Ok(result) => {
                state.append_message(result.message.clone());
                state.draft.clear();
                if let Some(ref meeting) = result.proposed_meeting {
                    state.propose_meeting(meeting.clone(), self.inner.config.scheduler);
                }
                drop(state);

                info!(id = %result.message.id, "Message sent");
                self.emit(ChatEvent::SendStateChanged { sending: false });
                self.emit(ChatEvent::MessageSent {
                    id: result.message.id,
                });
                if let Some(ref meeting) = result.proposed_meeting {
                    info!(meeting = %meeting.id, "Meeting proposed");
                    self.emit(ChatEvent::MeetingProposed(meeting.clone()));
                }
                Ok(Some(result))
            }
            Err(e) => {
                drop(state);
                error!(error = %e, "Error sending message");
                self.emit(ChatEvent::SendStateChanged { sending: false });
                self.emit(ChatEvent::Notice(Notice::failure(SEND_FAILED_NOTICE)));
                Err(e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Meeting scheduler
    // -----------------------------------------------------------------------

    pub fn select_slot(&self, time: DateTime<Utc>) -> std::result::Result<(), SchedulerError> {
        self.with_scheduler(|s| s.select_slot(time))
    }

    /// Select by zero-based position among the offered slots.
    pub fn select_slot_index(&self, index: usize) -> std::result::Result<(), SchedulerError> {
        self.with_scheduler(|s| s.select_index(index))
    }

    /// Persist the selected slot.
    ///
    /// `Ok(false)` means nothing was sent (no scheduler, no selection, or a
    /// confirm already in flight). On failure the scheduler stays open with
    /// its selection and a failure notice is published.
    pub async fn confirm_meeting(&self) -> Result<bool> {
        let plan = {
            let mut state = lock_state(&self.inner.state);
            let Some(scheduler) = state.scheduler.as_mut() else {
                return Ok(false);
            };
            match scheduler.begin_confirm() {
                Ok(plan) => plan,
                Err(reason) => {
                    debug!(%reason, "Confirm ignored");
                    return Ok(false);
                }
            }
        };
        self.emit(ChatEvent::SchedulerChanged);

        let outcome = scheduler::submit(self.inner.api.as_ref(), &plan).await;

        let meeting_id = plan.request.meeting_id;
        let mut state = lock_state(&self.inner.state);
        let still_pending = state
            .scheduler
            .as_ref()
            .is_some_and(|s| s.meeting().id == meeting_id);

        // The scheduler leaves `Submitting` even when unmounted; a remounted
        // view must not find it stuck.
        if still_pending {
            match outcome {
                Ok(()) => {
                    if let Some(ref mut s) = state.scheduler {
                        s.complete();
                    }
                    state.scheduler = None;
                }
                Err(_) => {
                    if let Some(ref mut s) = state.scheduler {
                        s.fail();
                    }
                }
            }
        }
        if !state.mounted {
            debug!(meeting = %meeting_id, "Schedule completed after unmount, ignoring");
            return outcome.map(|_| true);
        }

        match outcome {
            Ok(()) => {
                drop(state);

                self.emit(ChatEvent::Notice(Notice::info(SCHEDULED_NOTICE)));
                if still_pending {
                    self.emit(ChatEvent::SchedulerClosed { meeting_id });
                }
                Ok(true)
            }
            Err(e) => {
                drop(state);

                error!(meeting = %meeting_id, error = %e, "Failed to schedule meeting");
                self.emit(ChatEvent::Notice(Notice::failure(FAILED_NOTICE)));
                self.emit(ChatEvent::SchedulerChanged);
                Err(e)
            }
        }
    }

    /// Close the scheduler without contacting the server.
    pub fn cancel_meeting(&self) -> std::result::Result<(), SchedulerError> {
        let meeting_id = {
            let mut state = lock_state(&self.inner.state);
            let scheduler = state.scheduler.as_mut().ok_or(SchedulerError::Closed)?;
            scheduler.cancel()?;
            let id = scheduler.meeting().id;
            state.scheduler = None;
            id
        };
        info!(meeting = %meeting_id, "Meeting scheduling cancelled");
        self.emit(ChatEvent::SchedulerClosed { meeting_id });
        Ok(())
    }

    /// Tell the backend whether the current user can attend `meeting_id`.
    pub async fn update_availability(&self, meeting_id: MeetingId, is_available: bool) -> Result<()> {
        match self
            .inner
            .api
            .update_availability(meeting_id, is_available)
            .await
        {
            Ok(()) => {
                info!(meeting = %meeting_id, is_available, "Availability updated");
                Ok(())
            }
            Err(e) => {
                warn!(meeting = %meeting_id, error = %e, "Failed to update availability");
                Err(e)
            }
        }
    }

    fn with_scheduler<F>(&self, f: F) -> std::result::Result<(), SchedulerError>
    where
        F: FnOnce(&mut scheduler::MeetingScheduler) -> std::result::Result<(), SchedulerError>,
    {
        {
            let mut state = lock_state(&self.inner.state);
            let scheduler = state.scheduler.as_mut().ok_or(SchedulerError::Closed)?;
            f(scheduler)?;
        }
        self.emit(ChatEvent::SchedulerChanged);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Read side
    // -----------------------------------------------------------------------

    pub fn group(&self) -> Option<Group> {
        lock_state(&self.inner.state).group.clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        lock_state(&self.inner.state).messages.clone()
    }

    pub fn draft(&self) -> String {
        lock_state(&self.inner.state).draft.clone()
    }

    pub fn is_sending(&self) -> bool {
        lock_state(&self.inner.state).sending
    }

    pub fn is_mounted(&self) -> bool {
        lock_state(&self.inner.state).mounted
    }

    pub fn pending_meeting(&self) -> Option<Meeting> {
        lock_state(&self.inner.state).pending_meeting().cloned()
    }

    pub fn scheduler_view(&self) -> Option<SchedulerView> {
        lock_state(&self.inner.state)
            .scheduler
            .as_ref()
            .map(|s| s.view())
    }

    /// Snapshot of everything the view shows.
    pub fn render(&self) -> ChatView {
        let current_user = self.inner.auth.current_user();
        let state = lock_state(&self.inner.state);

        let Some(ref group) = state.group else {
            return ChatView::Loading;
        };

        let messages = state
            .messages
            .iter()
            .filter_map(|m| MessageView::render(m, current_user.as_ref()))
            .collect();

        ChatView::Ready(ReadyView {
            header: format!("Group: {}", group.name),
            members: format!("Members: {}", group.member_names()),
            messages,
            scheduler: state.scheduler.as_ref().map(|s| s.view()),
            input: InputView {
                draft: state.draft.clone(),
                disabled: state.sending,
                button_label: if state.sending { "Sending…" } else { "Send" },
            },
        })
    }

    fn emit(&self, event: ChatEvent) {
        emit_event(&self.inner.events, event);
    }
}

impl Inner {
    fn set_group(&self, group: Group) {
        let generation = {
            let mut state = lock_state(&self.state);
            if !state.mounted {
                return;
            }
            let unchanged = state.group.as_ref() == Some(&group);
            let polling = lock_tasks(&self.tasks).poller.is_some();
            if unchanged && polling {
                debug!("Group unchanged, poller kept");
                return;
            }
            info!(group = %group.name, members = %group.member_names(), "Group loaded");
            state.group = Some(group);
            state.poll_generation += 1;
            state.poll_generation
        };

        emit_event(&self.events, ChatEvent::GroupLoaded);
        self.start_polling(generation);
    }

    fn start_polling(&self, generation: u64) {
        let handle = tokio::spawn(poll_messages(
            self.api.clone(),
            self.state.clone(),
            self.events.clone(),
            self.config.poll_interval,
            generation,
        ));

        let mut tasks = lock_tasks(&self.tasks);
        if let Some(old) = tasks.poller.replace(handle) {
            old.abort();
        }
        debug!(generation, "Poller started");
    }
}

/// Fetch immediately, then once per `period`. A fetch always completes
/// before the next tick is awaited, so fetches never overlap; ticks missed
/// while a slow fetch was pending are delayed rather than bunched.
async fn poll_messages(
    api: Arc<dyn ChatApi>,
    state: Arc<Mutex<ChatState>>,
    events: EventSender,
    period: Duration,
    generation: u64,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        match api.fetch_messages().await {
            Ok(messages) => {
                let count = {
                    let mut guard = lock_state(&state);
                    if !guard.mounted || guard.poll_generation != generation {
                        debug!(generation, "Discarding stale poll result");
                        return;
                    }
                    guard.replace_messages(messages)
                };
                emit_event(&events, ChatEvent::MessagesUpdated { count });
            }
            Err(e) => error!(error = %e, "Error fetching messages"),
        }
    }
}

fn lock_state(state: &Mutex<ChatState>) -> MutexGuard<'_, ChatState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn lock_tasks(tasks: &Mutex<Tasks>) -> MutexGuard<'_, Tasks> {
    tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// View model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatView {
    /// The group has not loaded (or failed to load).
    Loading,
    Ready(ReadyView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyView {
    pub header: String,
    pub members: String,
    pub messages: Vec<MessageView>,
    pub scheduler: Option<SchedulerView>,
    pub input: InputView,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputView {
    pub draft: String,
    pub disabled: bool,
    pub button_label: &'static str,
}

impl fmt::Display for ChatView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = match self {
            ChatView::Loading => return write!(f, "Loading group…"),
            ChatView::Ready(view) => view,
        };

        writeln!(f, "{}", view.header)?;
        writeln!(f, "{}", view.members)?;
        writeln!(f, "{}", "-".repeat(40))?;
        for message in &view.messages {
            writeln!(f, "{message}")?;
        }
        writeln!(f, "{}", "-".repeat(40))?;
        if let Some(ref scheduler) = view.scheduler {
            writeln!(f, "{scheduler}")?;
        }
        write!(f, "[{}] {}", view.input.button_label, view.input.draft)
    }
}
