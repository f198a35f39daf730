use thiserror::Error;

/// Errors produced while talking to the chat backend.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Connection refused, timeout, TLS failure, undecodable body, ...
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("Server responded {status}: {message}")]
    Server { status: u16, message: String },

    /// The configured base URL cannot be joined with an endpoint path.
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),
}

/// Local validation failures of the meeting scheduler.
///
/// The front end disables the controls that would trigger these, so they only
/// surface when an action is forced through anyway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("No slot selected")]
    NoSlotSelected,

    #[error("A scheduling request is already in flight")]
    Busy,

    #[error("Time is not one of the offered slots")]
    UnknownSlot,

    #[error("Scheduler is closed")]
    Closed,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;
