//! Error types for lectio-sync.

use thiserror::Error;

/// Errors raised by a calendar store, either while listing or for a single write.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Calendar store returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Event not found: {0}")]
    NotFound(String),

    #[error("Event already exists: {0}")]
    Conflict(String),

    #[error("Rate limited by calendar store")]
    RateLimited,

    #[error("Calendar request timed out after {0}s")]
    Timeout(u64),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation aborted before reporting a result")]
    Aborted,

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Result type alias for calendar store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a schedule source.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not parse schedule: {0}")]
    Parse(String),

    #[error("Invalid module '{id}': {reason}")]
    InvalidModule { id: String, reason: String },
}

/// Errors that abort a whole sync run.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not fetch schedule: {0}")]
    Source(#[from] SourceError),

    #[error("Could not list calendar events: {0}")]
    Store(#[from] StoreError),

    #[error("Sync cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for sync runs.
pub type SyncResult<T> = Result<T, SyncError>;
