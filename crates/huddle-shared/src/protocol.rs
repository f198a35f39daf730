use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::HuddleError;
use crate::models::{Meeting, Message};
use crate::types::MeetingId;

/// Body of `POST /chat/messages/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendMessageRequest {
    pub content: String,
}

/// Raw body returned by `POST /chat/messages/`.
///
/// `meeting` is only present when the backend detected a meeting intent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendMessageResponse {
    pub message: Message,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting: Option<Meeting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nlp_analysis: Option<IntentAnalysis>,
}

/// Outcome of the backend's meeting-intent analysis of a posted message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct IntentAnalysis {
    pub has_meeting_intent: bool,
    #[serde(default)]
    pub time_info: Vec<String>,
    #[serde(default)]
    pub suggested_times: Vec<String>,
}

/// Typed result of sending a message: the server's echoed copy plus an
/// optional meeting proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageResult {
    pub message: Message,
    pub proposed_meeting: Option<Meeting>,
}

impl From<SendMessageResponse> for SendMessageResult {
    fn from(resp: SendMessageResponse) -> Self {
        Self {
            message: resp.message,
            proposed_meeting: resp.meeting,
        }
    }
}

/// Body of `POST /chat/schedule/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleRequest {
    pub meeting_id: MeetingId,
    /// ISO-8601 timestamp of the chosen slot.
    pub time: String,
}

impl ScheduleRequest {
    pub fn new(meeting_id: MeetingId, time: DateTime<Utc>) -> Self {
        Self {
            meeting_id,
            time: iso_timestamp(time),
        }
    }
}

/// Body of `POST /chat/availability/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilityRequest {
    pub meeting_id: MeetingId,
    pub is_available: bool,
}

/// Generic `{ "status": ... }` acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    pub status: String,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

/// Millisecond-precision UTC timestamp with a `Z` suffix,
/// e.g. `2026-10-18T15:04:05.123Z`.
pub fn iso_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an ISO-8601 / RFC 3339 timestamp into UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, HuddleError> {
    let parsed = DateTime::parse_from_rfc3339(value.trim())?;
    Ok(parsed.with_timezone(&Utc))
}
