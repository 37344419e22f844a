//! Local progress cache.
//!
//! A per-device, durable key-value mirror of the last known reading
//! position for each book. It exists so a reader can resume instantly
//! without a round trip, and so a failed close-time sync loses nothing:
//! the cache is written on every close regardless of the server outcome.
//! It is never authoritative — once a server record is in hand, the server
//! wins on conflict.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::warn;

use octavo_types::BookId;

/// Last known position for one book on this device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CachedPosition {
    pub page: u32,
    /// `None` while no renderer has reported a count.
    pub total_pages: Option<u32>,
}

/// Key-value store of reading positions. Last write wins, no expiry.
pub trait ProgressCache: Send + Sync {
    fn read(&self, book_id: &BookId) -> Option<CachedPosition>;
    /// Best effort: a cache that cannot persist logs and moves on, it never
    /// fails the session.
    fn write(&self, book_id: &BookId, position: CachedPosition);
}

fn page_key(book_id: &BookId) -> String {
    format!("book-{}-page", hex::encode(book_id))
}

fn total_pages_key(book_id: &BookId) -> String {
    format!("book-{}-total-pages", hex::encode(book_id))
}

/// Durable cache backed by a single JSON file under the app data dir.
pub struct FileProgressCache {
    path: PathBuf,
    entries: Mutex<HashMap<String, u32>>,
}

impl FileProgressCache {
    /// Open the cache file, tolerating a missing or corrupt one.
    pub fn open(path: PathBuf) -> Self {
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<HashMap<String, u32>>(&content) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), "progress cache unreadable, starting empty: {e}");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn persist(&self, entries: &HashMap<String, u32>) {
        let serialized = match serde_json::to_string(entries) {
            Ok(s) => s,
            Err(e) => {
                warn!("progress cache serialization failed: {e}");
                return;
            }
        };
        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = std::fs::write(&self.path, serialized) {
            warn!(path = %self.path.display(), "progress cache write failed: {e}");
        }
    }
}

impl ProgressCache for FileProgressCache {
    fn read(&self, book_id: &BookId) -> Option<CachedPosition> {
        let entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let page = *entries.get(&page_key(book_id))?;
        let total_pages = entries.get(&total_pages_key(book_id)).copied();
        Some(CachedPosition { page, total_pages })
    }

    fn write(&self, book_id: &BookId, position: CachedPosition) {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.insert(page_key(book_id), position.page);
        match position.total_pages {
            Some(total) => entries.insert(total_pages_key(book_id), total),
            None => entries.remove(&total_pages_key(book_id)),
        };
        self.persist(&entries);
    }
}

/// In-memory cache for tests.
#[derive(Default)]
pub struct MemoryProgressCache {
    entries: Mutex<HashMap<BookId, CachedPosition>>,
    writes: std::sync::atomic::AtomicUsize,
}

impl MemoryProgressCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes so far. Lets tests assert that page turns do not
    /// touch the cache.
    pub fn write_count(&self) -> usize {
        self.writes.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl ProgressCache for MemoryProgressCache {
    fn read(&self, book_id: &BookId) -> Option<CachedPosition> {
        let entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.get(book_id).copied()
    }

    fn write(&self, book_id: &BookId, position: CachedPosition) {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.insert(*book_id, position);
        self.writes
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}
