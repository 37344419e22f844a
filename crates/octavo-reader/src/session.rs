//! Reader session controller.
//!
//! One [`ReaderSession`] covers a single open-to-close lifecycle of a book
//! in the reader. The session seeds its page from the local cache (falling
//! back to the server record, then to page 1), flips a never-opened book to
//! `Reading` as soon as the renderer confirms the document, keeps page
//! navigation purely in memory, and pushes exactly one consolidated update
//! when it closes — writing the local cache first, so a failed or offline
//! sync still preserves the resume position.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use octavo_types::update::PageUpdate;
use octavo_types::{Book, BookId, ReadingStatus, FIRST_PAGE};

use crate::cache::{CachedPosition, ProgressCache};
use crate::remote::BookRemote;
use crate::renderer::{DocumentHandle, DocumentRenderer, RendererError};

const ZOOM_STEP: f32 = 0.1;
const ZOOM_MIN: f32 = 0.5;

/// Lifecycle state of a reading session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the renderer to confirm the document.
    Opening,
    /// Document confirmed; pages turn in memory only.
    Active,
    /// Close in progress.
    Closing,
    /// Terminal. A closed session never syncs again.
    Closed,
}

/// Session failure.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("book has no document to read")]
    NoDocument,

    #[error(transparent)]
    Renderer(#[from] RendererError),
}

/// A single open-to-close reading session for one book.
pub struct ReaderSession {
    book: Book,
    state: SessionState,
    current_page: u32,
    total_pages: Option<u32>,
    zoom: f32,
    handle: Option<Box<dyn DocumentHandle>>,
    opening_flip_sent: bool,
    remote: Arc<dyn BookRemote>,
    cache: Arc<dyn ProgressCache>,
}

impl ReaderSession {
    /// Seed a session from the cache, the server record, or page 1 —
    /// in that order.
    pub fn new(book: Book, remote: Arc<dyn BookRemote>, cache: Arc<dyn ProgressCache>) -> Self {
        let cached = cache.read(&book.book_id);

        let current_page = cached
            .map(|position| position.page)
            .filter(|&page| page > 0)
            .or_else(|| (book.last_read_page > 0).then_some(book.last_read_page))
            .unwrap_or(FIRST_PAGE);

        // The server total wins once known; the cached one is only a hint.
        let total_pages = if book.total_pages > 0 {
            Some(book.total_pages)
        } else {
            cached.and_then(|position| position.total_pages)
        };

        debug!(
            book_id = %hex::encode(book.book_id),
            seed_page = current_page,
            "opening reading session"
        );

        Self {
            book,
            state: SessionState::Opening,
            current_page,
            total_pages,
            zoom: 1.0,
            handle: None,
            opening_flip_sent: false,
            remote,
            cache,
        }
    }

    /// Hand the document to the renderer. If the page count is already
    /// known the session activates immediately; otherwise it stays in
    /// `Opening` until [`page_count_reported`](Self::page_count_reported).
    pub async fn start(&mut self, renderer: &dyn DocumentRenderer) -> Result<(), SessionError> {
        let url = self
            .book
            .document_url
            .clone()
            .ok_or(SessionError::NoDocument)?;

        let handle = renderer.open(&url).await?;
        let count = handle.page_count();
        self.handle = Some(handle);

        if let Some(count) = count {
            self.activate(count).await;
        }
        Ok(())
    }

    /// Late page-count report from the renderer.
    pub async fn page_count_reported(&mut self, count: u32) {
        match self.state {
            SessionState::Opening => self.activate(count).await,
            SessionState::Active => {
                self.total_pages = Some(count);
                self.current_page = self.current_page.min(count);
            }
            _ => {}
        }
    }

    async fn activate(&mut self, count: u32) {
        self.total_pages = Some(count);
        self.current_page = self.current_page.min(count);
        self.state = SessionState::Active;

        // First open of a never-read book: flip it to Reading right away,
        // so a crash mid-session still reflects "started reading".
        if self.book.status == ReadingStatus::Unread && !self.opening_flip_sent {
            self.opening_flip_sent = true;
            let update = PageUpdate {
                observed_page: self.current_page,
                observed_total_pages: Some(count),
                explicit_status: Some(ReadingStatus::Reading),
            };
            match self.remote.reconcile(&self.book.book_id, &update).await {
                Ok(book) => self.book = book,
                Err(e) => {
                    warn!(
                        book_id = %hex::encode(self.book.book_id),
                        "could not mark book as Reading on open: {e}"
                    );
                }
            }
        }
    }

    /// Close the session: cache the final position unconditionally, then
    /// push one consolidated update to the server. A sync failure is logged
    /// and swallowed — the cache already holds the position, and the next
    /// session's close will carry it forward.
    ///
    /// Idempotent: a second close does nothing and returns `None`.
    pub async fn close(&mut self) -> Option<Book> {
        if matches!(self.state, SessionState::Closing | SessionState::Closed) {
            return None;
        }
        self.state = SessionState::Closing;

        self.cache.write(
            &self.book.book_id,
            CachedPosition {
                page: self.current_page,
                total_pages: self.total_pages,
            },
        );

        let update = PageUpdate {
            observed_page: self.current_page,
            observed_total_pages: self.total_pages,
            explicit_status: None,
        };
        let acknowledged = match self.remote.reconcile(&self.book.book_id, &update).await {
            Ok(book) => {
                self.book = book.clone();
                Some(book)
            }
            Err(e) => {
                warn!(
                    book_id = %hex::encode(self.book.book_id),
                    "progress sync failed on close, cache holds the position: {e}"
                );
                None
            }
        };

        // Release the renderer's document.
        self.handle = None;
        self.state = SessionState::Closed;
        acknowledged
    }

    // Navigation: in-memory only, no network or cache traffic.

    pub fn next_page(&mut self) {
        if self.state != SessionState::Active {
            return;
        }
        if let Some(total) = self.total_pages {
            self.current_page = (self.current_page + 1).min(total);
        }
    }

    pub fn prev_page(&mut self) {
        if self.state != SessionState::Active {
            return;
        }
        self.current_page = self.current_page.saturating_sub(1).max(FIRST_PAGE);
    }

    pub fn jump_to_page(&mut self, page: u32) {
        if self.state != SessionState::Active {
            return;
        }
        let page = page.max(FIRST_PAGE);
        self.current_page = match self.total_pages {
            Some(total) => page.min(total),
            None => page,
        };
    }

    pub fn zoom_in(&mut self) {
        if self.state == SessionState::Active {
            self.zoom += ZOOM_STEP;
        }
    }

    pub fn zoom_out(&mut self) {
        if self.state == SessionState::Active {
            self.zoom = (self.zoom - ZOOM_STEP).max(ZOOM_MIN);
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> Option<u32> {
        self.total_pages
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// The session's view of the record (updated by acknowledged syncs).
    pub fn book(&self) -> &Book {
        &self.book
    }
}

/// Owns the open sessions on this device: at most one per book, so two
/// views of the same book share a session instead of racing two closers.
pub struct Reader {
    remote: Arc<dyn BookRemote>,
    renderer: Arc<dyn DocumentRenderer>,
    cache: Arc<dyn ProgressCache>,
    sessions: HashMap<BookId, ReaderSession>,
}

impl Reader {
    pub fn new(
        remote: Arc<dyn BookRemote>,
        renderer: Arc<dyn DocumentRenderer>,
        cache: Arc<dyn ProgressCache>,
    ) -> Self {
        Self {
            remote,
            renderer,
            cache,
            sessions: HashMap::new(),
        }
    }

    /// Open a reading session for a book, or return the one already in
    /// flight for it.
    pub async fn open_book(&mut self, book: Book) -> Result<&mut ReaderSession, SessionError> {
        let remote = self.remote.clone();
        let renderer = self.renderer.clone();
        let cache = self.cache.clone();

        match self.sessions.entry(book.book_id) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let mut session = ReaderSession::new(book, remote, cache);
                session.start(renderer.as_ref()).await?;
                Ok(entry.insert(session))
            }
        }
    }

    /// The in-flight session for a book, if any.
    pub fn session(&mut self, book_id: &BookId) -> Option<&mut ReaderSession> {
        self.sessions.get_mut(book_id)
    }

    /// Close and drop the session for a book. Returns the server-acknowledged
    /// record when the close-time sync succeeded.
    pub async fn close_book(&mut self, book_id: &BookId) -> Option<Book> {
        let mut session = self.sessions.remove(book_id)?;
        session.close().await
    }
}
