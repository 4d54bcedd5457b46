//! Error types for the shared feed.

use thiserror::Error;

/// Errors surfaced by the access point to the caller that issued a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// A fetch asked for a negative number of messages.
    #[error("invalid argument: count must be non-negative, got {count}")]
    InvalidArgument { count: i64 },

    /// The access point has stopped and accepts no further requests.
    #[error("feed is closed")]
    Closed,
}
