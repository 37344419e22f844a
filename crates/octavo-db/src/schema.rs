//! SQL schema definitions.

/// Complete schema for Octavo v1 database.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Users & Sessions
-- ============================================================

CREATE TABLE IF NOT EXISTS users (
    user_id BLOB PRIMARY KEY,
    display_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    profile_image_url TEXT,
    created_at INTEGER NOT NULL
);

-- Bearer tokens issued by the external authenticator. The daemon only
-- resolves them back to a user id; it never mints credentials itself.
CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY,
    user_id BLOB NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);

-- ============================================================
-- Books
-- ============================================================

CREATE TABLE IF NOT EXISTS books (
    book_id BLOB PRIMARY KEY,
    owner_id BLOB NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    genre TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    cover_url TEXT,
    document_url TEXT,
    status TEXT NOT NULL DEFAULT 'Unread'
        CHECK (status IN ('Unread', 'Reading', 'Completed')),
    last_read_page INTEGER NOT NULL DEFAULT 0 CHECK (last_read_page >= 0),
    total_pages INTEGER NOT NULL DEFAULT 0 CHECK (total_pages >= 0),
    progress INTEGER NOT NULL DEFAULT 0 CHECK (progress BETWEEN 0 AND 100),
    favourite INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_books_owner ON books(owner_id);
CREATE INDEX IF NOT EXISTS idx_books_owner_status ON books(owner_id, status);
"#;
