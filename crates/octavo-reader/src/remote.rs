//! The daemon as the reader sees it.

use octavo_types::update::PageUpdate;
use octavo_types::{Book, BookId};

/// Errors from talking to the daemon.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The request never completed (socket gone, daemon down, write failed).
    /// The session treats this as transient: it still closes and the local
    /// cache still holds the position for the next attempt.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The daemon answered with an error (not found, forbidden, bad params).
    #[error("server rejected request: {message} ({code})")]
    Rejected { code: i32, message: String },

    /// The daemon answered with something unparsable.
    #[error("malformed server response: {0}")]
    Protocol(String),
}

/// Book operations the session controller needs from the server.
///
/// Injected as a trait so tests can run a session against an in-memory
/// double instead of a live socket.
#[async_trait::async_trait]
pub trait BookRemote: Send + Sync {
    /// Fetch the current server record.
    async fn fetch_book(&self, book_id: &BookId) -> Result<Book, RemoteError>;

    /// Push a consolidated page observation; returns the updated record.
    async fn reconcile(&self, book_id: &BookId, update: &PageUpdate) -> Result<Book, RemoteError>;
}
