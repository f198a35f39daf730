//! Meeting-slot picker shown when a sent message comes back with a meeting
//! proposal.
//!
//! The scheduler is a small synchronous state machine
//! (`Idle` -> `Submitting` -> `Closed`, with `Submitting` -> `Idle` on failure).
//! The network half lives in [`submit`] so the owner can release its lock on
//! the scheduler while the requests are in flight.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use huddle_shared::constants::SLOT_OFFSETS_HOURS;
use huddle_shared::protocol::{iso_timestamp, ScheduleRequest};
use huddle_shared::Meeting;

use crate::api::ChatApi;
use crate::error::{Result, SchedulerError};
use crate::message_view::local_datetime;

pub const SCHEDULED_NOTICE: &str = "Meeting scheduled!";
pub const FAILED_NOTICE: &str = "Failed to schedule";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Post a "Meeting scheduled at ..." chat message once the slot is saved.
    pub post_confirmation_message: bool,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            post_confirmation_message: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    Idle,
    Submitting,
    Closed,
}

/// Requests to issue for a confirmed slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPlan {
    pub request: ScheduleRequest,
    /// Chat message to post after the schedule call succeeds.
    pub confirmation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MeetingScheduler {
    meeting: Meeting,
    slots: [DateTime<Utc>; 3],
    selected: Option<DateTime<Utc>>,
    phase: SchedulerPhase,
    options: SchedulerOptions,
}

impl MeetingScheduler {
    /// Mount a scheduler for `meeting` with slots relative to the current time.
    pub fn mount(meeting: Meeting, options: SchedulerOptions) -> Self {
        Self::mount_at(meeting, options, Utc::now())
    }

    /// Mount with an explicit "now". Slots are derived from this instant, so
    /// remounting the same proposal later offers different absolute times.
    pub fn mount_at(meeting: Meeting, options: SchedulerOptions, now: DateTime<Utc>) -> Self {
        let slots = candidate_slots(now);
        debug!(meeting = %meeting.id, first_slot = %iso_timestamp(slots[0]), "Scheduler mounted");
        Self {
            meeting,
            slots,
            selected: None,
            phase: SchedulerPhase::Idle,
            options,
        }
    }

    pub fn meeting(&self) -> &Meeting {
        &self.meeting
    }

    pub fn slots(&self) -> &[DateTime<Utc>; 3] {
        &self.slots
    }

    pub fn selected(&self) -> Option<DateTime<Utc>> {
        self.selected
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    pub fn options(&self) -> SchedulerOptions {
        self.options
    }

    pub fn can_confirm(&self) -> bool {
        self.phase == SchedulerPhase::Idle && self.selected.is_some()
    }

    pub fn can_cancel(&self) -> bool {
        self.phase == SchedulerPhase::Idle
    }

    /// Record the chosen slot. Only offered slots are accepted, and only
    /// while idle.
    pub fn select_slot(&mut self, time: DateTime<Utc>) -> std::result::Result<(), SchedulerError> {
        self.ensure_idle()?;
        if !self.slots.contains(&time) {
            return Err(SchedulerError::UnknownSlot);
        }
        self.selected = Some(time);
        Ok(())
    }

    /// Select by zero-based position in [`MeetingScheduler::slots`].
    pub fn select_index(&mut self, index: usize) -> std::result::Result<(), SchedulerError> {
        let time = *self.slots.get(index).ok_or(SchedulerError::UnknownSlot)?;
        self.select_slot(time)
    }

    /// Move to `Submitting` and return the requests to send.
    pub fn begin_confirm(&mut self) -> std::result::Result<ConfirmPlan, SchedulerError> {
        self.ensure_idle()?;
        let chosen = self.selected.ok_or(SchedulerError::NoSlotSelected)?;

        self.phase = SchedulerPhase::Submitting;

        let confirmation = self
            .options
            .post_confirmation_message
            .then(|| confirmation_text(chosen));

        Ok(ConfirmPlan {
            request: ScheduleRequest::new(self.meeting.id, chosen),
            confirmation,
        })
    }

    /// The submission succeeded: the scheduler is done.
    pub fn complete(&mut self) {
        self.phase = SchedulerPhase::Closed;
    }

    /// The submission failed: back to idle, selection kept for a retry.
    pub fn fail(&mut self) {
        if self.phase == SchedulerPhase::Submitting {
            self.phase = SchedulerPhase::Idle;
        }
    }

    /// Close without contacting the server.
    pub fn cancel(&mut self) -> std::result::Result<(), SchedulerError> {
        self.ensure_idle()?;
        self.phase = SchedulerPhase::Closed;
        Ok(())
    }

    pub fn view(&self) -> SchedulerView {
        let options = self
            .slots
            .iter()
            .map(|slot| SlotOption {
                value: iso_timestamp(*slot),
                label: local_datetime(*slot),
                selected: self.selected == Some(*slot),
            })
            .collect();

        SchedulerView {
            title: "Choose the best time for the meeting".to_string(),
            description: self.meeting.description.clone(),
            options,
            confirm_label: match self.phase {
                SchedulerPhase::Submitting => "Scheduling…",
                _ => "Confirm",
            },
            confirm_enabled: self.can_confirm(),
            cancel_enabled: self.can_cancel(),
        }
    }

    fn ensure_idle(&self) -> std::result::Result<(), SchedulerError> {
        match self.phase {
            SchedulerPhase::Idle => Ok(()),
            SchedulerPhase::Submitting => Err(SchedulerError::Busy),
            SchedulerPhase::Closed => Err(SchedulerError::Closed),
        }
    }
}

/// `now + 1h`, `now + 2h`, `now + 3h`, truncated to whole milliseconds so the
/// ISO form round-trips.
pub fn candidate_slots(now: DateTime<Utc>) -> [DateTime<Utc>; 3] {
    let sub_milli = i64::from(now.timestamp_subsec_nanos() % 1_000_000);
    let base = now - Duration::nanoseconds(sub_milli);
    SLOT_OFFSETS_HOURS.map(|h| base + Duration::hours(h))
}

fn confirmation_text(chosen: DateTime<Utc>) -> String {
    format!("Meeting scheduled at {}", local_datetime(chosen))
}

/// Persist the chosen slot, then post the confirmation message if the plan
/// has one. Stops at the first failure.
pub async fn submit<A: ChatApi + ?Sized>(api: &A, plan: &ConfirmPlan) -> Result<()> {
    api.schedule_meeting(&plan.request).await?;

    if let Some(ref text) = plan.confirmation {
        api.send_message(text).await?;
    }

    info!(meeting = %plan.request.meeting_id, time = %plan.request.time, "Meeting scheduled");
    Ok(())
}

/// One entry of the slot picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotOption {
    /// ISO-8601 value sent to the backend.
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Display-ready form of the scheduler modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerView {
    pub title: String,
    pub description: String,
    pub options: Vec<SlotOption>,
    pub confirm_label: &'static str,
    pub confirm_enabled: bool,
    pub cancel_enabled: bool,
}

impl fmt::Display for SchedulerView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.title)?;
        writeln!(f, "{}", self.description)?;
        for (i, option) in self.options.iter().enumerate() {
            let mark = if option.selected { "*" } else { " " };
            writeln!(f, " {mark} {}) {}", i + 1, option.label)?;
        }
        let confirm = if self.confirm_enabled { "/confirm" } else { "(confirm disabled)" };
        let cancel = if self.cancel_enabled { "/cancel" } else { "(cancel disabled)" };
        write!(f, "[{}] {confirm} {cancel}", self.confirm_label)
    }
}
