//! Typed update payloads.
//!
//! Each mutation endpoint accepts exactly one of these shapes instead of a
//! single optional-everything body, so the reconciler's precedence rules are
//! enforced by the type system rather than by handler-local conditionals.

use serde::{Deserialize, Serialize};

use crate::book::ReadingStatus;

/// Consolidated page observation pushed by a reader session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PageUpdate {
    /// Current page position. 0 is legal: the book was opened but no page
    /// has been read yet.
    pub observed_page: u32,
    /// Page count reported by the renderer, if it reported one.
    pub observed_total_pages: Option<u32>,
    /// Advisory status, used for the Unread -> Reading flip on first open.
    /// Never overrides the progress-derived value for `Completed`.
    pub explicit_status: Option<ReadingStatus>,
}

/// A bare status flip, with no page data attached.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusOnlyUpdate {
    pub status: ReadingStatus,
}

/// Descriptive-metadata edit. Absent fields are left untouched; this payload
/// deliberately has no page/progress/status fields, so a metadata edit can
/// never clobber reconciler-owned state.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MetadataUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub document_url: Option<String>,
}

impl MetadataUpdate {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.genre.is_none()
            && self.description.is_none()
            && self.cover_url.is_none()
            && self.document_url.is_none()
    }
}
