use std::time::Duration;

/// Interval between two full message-list fetches
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Offsets (in hours from mount time) of the candidate meeting slots
pub const SLOT_OFFSETS_HOURS: [i64; 3] = [1, 2, 3];

/// Number of messages returned by `GET /chat/messages/`
pub const MESSAGE_HISTORY_LIMIT: usize = 50;

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// REST endpoints, relative to the server base URL
pub const GROUP_PATH: &str = "/chat/group/";
pub const MESSAGES_PATH: &str = "/chat/messages/";
pub const SCHEDULE_PATH: &str = "/chat/schedule/";
pub const AVAILABILITY_PATH: &str = "/chat/availability/";
