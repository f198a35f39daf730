//! Wire models and request/response contracts shared by the huddle client
//! and the reference server.

pub mod constants;
pub mod error;
pub mod models;
pub mod protocol;
pub mod types;

pub use error::HuddleError;
pub use models::{Group, Meeting, Message, User};
pub use protocol::SendMessageResult;
pub use types::{GroupId, MeetingId, MessageId, UserId};
