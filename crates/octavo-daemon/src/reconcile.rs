//! The status reconciler.
//!
//! Single entry point for every reading-state mutation: it loads the book
//! through the ownership guard, folds an observed page position and page
//! count into the record, recomputes progress, derives the status, and
//! persists the whole `{last_read_page, total_pages, progress, status}`
//! tuple in one statement. Callers hold the connection lock for the full
//! call, so concurrent reconciliations for the same book never interleave.

use rusqlite::Connection;
use tracing::debug;

use octavo_db::queries::books;
use octavo_db::DbError;
use octavo_types::progress::{effective_status, progress_of};
use octavo_types::update::{PageUpdate, StatusOnlyUpdate};
use octavo_types::{Book, BookId, UserId};

/// Reconciliation failure.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("book not found")]
    NotFound,

    #[error("book belongs to another user")]
    Forbidden,

    #[error("invalid update: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Db(DbError),
}

pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Apply a consolidated page observation to a book owned by `caller`.
///
/// A renderer-reported page count replaces the stored one (later reports
/// may correct an earlier reading); the page position is clamped to the
/// known total; progress is recomputed; an explicit status is honored only
/// where it cannot contradict the progress-derived value. Returns the
/// updated record.
pub fn reconcile(
    conn: &Connection,
    book_id: &BookId,
    caller: &UserId,
    update: &PageUpdate,
    now: u64,
) -> Result<Book> {
    let book = load_owned(conn, book_id, caller)?;

    let total_pages = match update.observed_total_pages {
        Some(t) if t > 0 => t,
        Some(_) => {
            return Err(ReconcileError::InvalidInput(
                "total_pages must be positive".to_string(),
            ))
        }
        None => book.total_pages,
    };

    let last_read_page = if total_pages > 0 {
        update.observed_page.min(total_pages)
    } else {
        update.observed_page
    };

    let progress = progress_of(last_read_page, total_pages);
    // A reconciliation only ever originates from a reader session, so the
    // book counts as opened from here on.
    let status = effective_status(update.explicit_status, progress, true);

    books::update_reading_state(
        conn,
        book_id,
        caller,
        last_read_page,
        total_pages,
        progress,
        status,
        now,
    )
    .map_err(from_db)?;

    debug!(
        book_id = %hex::encode(book_id),
        page = last_read_page,
        total = total_pages,
        progress,
        status = %status,
        "reconciled reading state"
    );

    books::get(conn, book_id, caller).map_err(from_db)
}

/// Apply a bare status flip with no page data.
///
/// Progress is not recomputed, but the `Completed ⇔ progress == 100`
/// invariant still holds: a `Completed` request for an unfinished book
/// keeps the progress-derived status instead.
pub fn apply_status_only(
    conn: &Connection,
    book_id: &BookId,
    caller: &UserId,
    update: &StatusOnlyUpdate,
    now: u64,
) -> Result<Book> {
    let book = load_owned(conn, book_id, caller)?;

    let status = effective_status(Some(update.status), book.progress, book.has_been_opened());

    books::update_status(conn, book_id, caller, status, now).map_err(from_db)?;
    books::get(conn, book_id, caller).map_err(from_db)
}

/// Ownership-guarded load for a write path: a missing record is `NotFound`,
/// an existing record with a different owner is `Forbidden`.
pub fn load_owned(conn: &Connection, book_id: &BookId, caller: &UserId) -> Result<Book> {
    match books::get(conn, book_id, caller) {
        Ok(book) => Ok(book),
        Err(DbError::NotFound(_)) => {
            if books::exists(conn, book_id).map_err(from_db)? {
                Err(ReconcileError::Forbidden)
            } else {
                Err(ReconcileError::NotFound)
            }
        }
        Err(e) => Err(from_db(e)),
    }
}

fn from_db(e: DbError) -> ReconcileError {
    match e {
        DbError::NotFound(_) => ReconcileError::NotFound,
        DbError::Forbidden(_) => ReconcileError::Forbidden,
        other => ReconcileError::Db(other),
    }
}
