use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use huddle_shared::protocol::ErrorResponse;
use huddle_shared::{HuddleError, MeetingId};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Meeting not found")]
    MeetingNotFound(MeetingId),

    #[error("Availability not found")]
    AvailabilityNotFound(MeetingId),

    #[error("Authentication credentials were not provided")]
    Unauthenticated,

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl From<HuddleError> for ServerError {
    fn from(e: HuddleError) -> Self {
        ServerError::BadRequest(e.to_string())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::MeetingNotFound(_) | ServerError::AvailabilityNotFound(_) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            ServerError::Unauthenticated => (StatusCode::UNAUTHORIZED, self.to_string()),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
        };

        (status, axum::Json(ErrorResponse { error: message })).into_response()
    }
}
