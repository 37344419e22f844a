//! The book record and its reading status.

use serde::{Deserialize, Serialize};

use crate::{BookId, UserId};

/// Reading status of a book.
///
/// `Completed` holds if and only if `progress == 100`; the reconciler
/// enforces this at every mutation path, so the two never drift apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadingStatus {
    Unread,
    Reading,
    Completed,
}

impl ReadingStatus {
    /// Wire and database representation ("Unread" | "Reading" | "Completed").
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::Unread => "Unread",
            ReadingStatus::Reading => "Reading",
            ReadingStatus::Completed => "Completed",
        }
    }
}

impl std::str::FromStr for ReadingStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unread" => Ok(ReadingStatus::Unread),
            "Reading" => Ok(ReadingStatus::Reading),
            "Completed" => Ok(ReadingStatus::Completed),
            other => Err(InvalidStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized status string.
#[derive(Debug, thiserror::Error)]
#[error("unrecognized reading status: {0:?}")]
pub struct InvalidStatus(pub String);

/// A persisted book record.
///
/// `progress` is derived from `last_read_page` / `total_pages` and is never
/// set directly by a client; `total_pages == 0` means the page count is not
/// yet known.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Book {
    pub book_id: BookId,
    pub owner_id: UserId,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub description: String,
    /// Blob store reference for the cover image. `None` = not uploaded.
    pub cover_url: Option<String>,
    /// Blob store reference for the document. `None` = not uploaded.
    pub document_url: Option<String>,
    pub status: ReadingStatus,
    /// Last page position acknowledged by the reconciler.
    pub last_read_page: u32,
    /// 0 = unknown, populated once a renderer reports a page count.
    pub total_pages: u32,
    /// Derived percentage in `[0, 100]`.
    pub progress: u8,
    pub favourite: bool,
    /// Unix seconds.
    pub created_at: u64,
    /// Unix seconds.
    pub updated_at: u64,
}

impl Book {
    /// True once the book has ever been opened in a reader.
    ///
    /// The record keeps no separate flag for this: a book that has left
    /// `Unread` has been opened, and a reconciled page position implies the
    /// same.
    pub fn has_been_opened(&self) -> bool {
        self.status != ReadingStatus::Unread || self.last_read_page > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            ReadingStatus::Unread,
            ReadingStatus::Reading,
            ReadingStatus::Completed,
        ] {
            let parsed: ReadingStatus = status.as_str().parse().expect("parse");
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_status_rejects_unknown() {
        assert!("reading".parse::<ReadingStatus>().is_err());
        assert!("".parse::<ReadingStatus>().is_err());
    }

    #[test]
    fn test_status_json_uses_original_casing() {
        let json = serde_json::to_string(&ReadingStatus::Completed).expect("serialize");
        assert_eq!(json, "\"Completed\"");
    }
}
