use thiserror::Error;

#[derive(Error, Debug)]
pub enum HuddleError {
    #[error("Invalid timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),
}
