//! Book record queries.
//!
//! All functions take the caller's verified identity and filter on it. Reads
//! collapse "missing" and "owned by someone else" into `NotFound`; writes
//! probe the record separately so they can answer `Forbidden` for a
//! foreign-owned book.

use rusqlite::Connection;

use octavo_types::update::MetadataUpdate;
use octavo_types::{Book, BookId, ReadingStatus, UserId};

use crate::{DbError, Result};

const BOOK_COLUMNS: &str = "book_id, owner_id, title, author, genre, description, \
     cover_url, document_url, status, last_read_page, total_pages, progress, \
     favourite, created_at, updated_at";

/// Insert a new book record.
pub fn insert(conn: &Connection, book: &Book) -> Result<()> {
    conn.execute(
        "INSERT INTO books (book_id, owner_id, title, author, genre, description,
             cover_url, document_url, status, last_read_page, total_pages, progress,
             favourite, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        rusqlite::params![
            book.book_id.as_slice(),
            book.owner_id.as_slice(),
            book.title,
            book.author,
            book.genre,
            book.description,
            book.cover_url,
            book.document_url,
            book.status.as_str(),
            i64::from(book.last_read_page),
            i64::from(book.total_pages),
            i64::from(book.progress),
            book.favourite,
            book.created_at as i64,
            book.updated_at as i64,
        ],
    )?;
    Ok(())
}

/// Get a book owned by the caller.
///
/// A book owned by another user yields the same `NotFound` as a missing one.
pub fn get(conn: &Connection, book_id: &BookId, owner_id: &UserId) -> Result<Book> {
    conn.query_row(
        &format!("SELECT {BOOK_COLUMNS} FROM books WHERE book_id = ?1 AND owner_id = ?2"),
        rusqlite::params![book_id.as_slice(), owner_id.as_slice()],
        book_from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound("book".into()),
        other => DbError::Sqlite(other),
    })
}

/// List all books owned by the caller, newest first.
pub fn list_by_owner(conn: &Connection, owner_id: &UserId) -> Result<Vec<Book>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOK_COLUMNS} FROM books WHERE owner_id = ?1
         ORDER BY created_at DESC, book_id"
    ))?;

    let rows = stmt
        .query_map([owner_id.as_slice()], book_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Persist the reconciled reading-state tuple in one statement.
///
/// `last_read_page`, `total_pages`, `progress`, and `status` always land
/// together; concurrent readers never observe a partial write.
#[allow(clippy::too_many_arguments)]
pub fn update_reading_state(
    conn: &Connection,
    book_id: &BookId,
    owner_id: &UserId,
    last_read_page: u32,
    total_pages: u32,
    progress: u8,
    status: ReadingStatus,
    now: u64,
) -> Result<()> {
    let affected = conn.execute(
        "UPDATE books
         SET last_read_page = ?3, total_pages = ?4, progress = ?5, status = ?6,
             updated_at = ?7
         WHERE book_id = ?1 AND owner_id = ?2",
        rusqlite::params![
            book_id.as_slice(),
            owner_id.as_slice(),
            i64::from(last_read_page),
            i64::from(total_pages),
            i64::from(progress),
            status.as_str(),
            now as i64,
        ],
    )?;

    if affected == 0 {
        return Err(write_denied(conn, book_id));
    }
    Ok(())
}

/// Persist a status value on its own, leaving the page fields untouched.
pub fn update_status(
    conn: &Connection,
    book_id: &BookId,
    owner_id: &UserId,
    status: ReadingStatus,
    now: u64,
) -> Result<()> {
    let affected = conn.execute(
        "UPDATE books SET status = ?3, updated_at = ?4
         WHERE book_id = ?1 AND owner_id = ?2",
        rusqlite::params![
            book_id.as_slice(),
            owner_id.as_slice(),
            status.as_str(),
            now as i64,
        ],
    )?;

    if affected == 0 {
        return Err(write_denied(conn, book_id));
    }
    Ok(())
}

/// Apply a metadata edit. Absent fields keep their stored value; the
/// reconciler-owned columns are not named here at all.
pub fn update_metadata(
    conn: &Connection,
    book_id: &BookId,
    owner_id: &UserId,
    update: &MetadataUpdate,
    now: u64,
) -> Result<()> {
    let affected = conn.execute(
        "UPDATE books
         SET title = COALESCE(?3, title),
             author = COALESCE(?4, author),
             genre = COALESCE(?5, genre),
             description = COALESCE(?6, description),
             cover_url = COALESCE(?7, cover_url),
             document_url = COALESCE(?8, document_url),
             updated_at = ?9
         WHERE book_id = ?1 AND owner_id = ?2",
        rusqlite::params![
            book_id.as_slice(),
            owner_id.as_slice(),
            update.title,
            update.author,
            update.genre,
            update.description,
            update.cover_url,
            update.document_url,
            now as i64,
        ],
    )?;

    if affected == 0 {
        return Err(write_denied(conn, book_id));
    }
    Ok(())
}

/// Set the favourite flag, independent of reading state.
pub fn set_favourite(
    conn: &Connection,
    book_id: &BookId,
    owner_id: &UserId,
    favourite: bool,
    now: u64,
) -> Result<()> {
    let affected = conn.execute(
        "UPDATE books SET favourite = ?3, updated_at = ?4
         WHERE book_id = ?1 AND owner_id = ?2",
        rusqlite::params![
            book_id.as_slice(),
            owner_id.as_slice(),
            favourite,
            now as i64,
        ],
    )?;

    if affected == 0 {
        return Err(write_denied(conn, book_id));
    }
    Ok(())
}

/// Hard-delete a book.
pub fn delete(conn: &Connection, book_id: &BookId, owner_id: &UserId) -> Result<()> {
    let affected = conn.execute(
        "DELETE FROM books WHERE book_id = ?1 AND owner_id = ?2",
        rusqlite::params![book_id.as_slice(), owner_id.as_slice()],
    )?;

    if affected == 0 {
        return Err(write_denied(conn, book_id));
    }
    Ok(())
}

/// True if a record with this id exists, regardless of owner. Used by write
/// paths to tell `Forbidden` apart from `NotFound`.
pub fn exists(conn: &Connection, book_id: &BookId) -> Result<bool> {
    match conn.query_row(
        "SELECT 1 FROM books WHERE book_id = ?1",
        [book_id.as_slice()],
        |_| Ok(()),
    ) {
        Ok(()) => Ok(true),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
        Err(e) => Err(DbError::Sqlite(e)),
    }
}

/// Classify a zero-row write: the book either does not exist (`NotFound`)
/// or belongs to someone else (`Forbidden`).
fn write_denied(conn: &Connection, book_id: &BookId) -> DbError {
    match conn.query_row(
        "SELECT 1 FROM books WHERE book_id = ?1",
        [book_id.as_slice()],
        |_| Ok(()),
    ) {
        Ok(()) => DbError::Forbidden("book belongs to another user".into()),
        Err(rusqlite::Error::QueryReturnedNoRows) => DbError::NotFound("book".into()),
        Err(e) => DbError::Sqlite(e),
    }
}

fn book_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Book> {
    let status_str: String = row.get(8)?;
    let status = status_str.parse::<ReadingStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Book {
        book_id: id_from_blob(row, 0)?,
        owner_id: id_from_blob(row, 1)?,
        title: row.get(2)?,
        author: row.get(3)?,
        genre: row.get(4)?,
        description: row.get(5)?,
        cover_url: row.get(6)?,
        document_url: row.get(7)?,
        status,
        last_read_page: row.get::<_, i64>(9)? as u32,
        total_pages: row.get::<_, i64>(10)? as u32,
        progress: row.get::<_, i64>(11)? as u8,
        favourite: row.get(12)?,
        created_at: row.get::<_, i64>(13)? as u64,
        updated_at: row.get::<_, i64>(14)? as u64,
    })
}

fn id_from_blob(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<[u8; 16]> {
    let blob: Vec<u8> = row.get(idx)?;
    blob.try_into().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Blob,
            "id must be 16 bytes".into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::users;

    const OWNER: UserId = [1u8; 16];
    const INTRUDER: UserId = [2u8; 16];

    fn test_db() -> Connection {
        let conn = crate::open_memory().expect("open test db");
        users::insert(&conn, &OWNER, "Ada", "ada@example.com", 1000).expect("insert owner");
        users::insert(&conn, &INTRUDER, "Eve", "eve@example.com", 1000).expect("insert intruder");
        conn
    }

    fn sample_book(book_id: BookId) -> Book {
        Book {
            book_id,
            owner_id: OWNER,
            title: "The Left Hand of Darkness".to_string(),
            author: "Ursula K. Le Guin".to_string(),
            genre: "Science Fiction".to_string(),
            description: "Winter on Gethen.".to_string(),
            cover_url: None,
            document_url: Some("file:///blobs/documents/abc".to_string()),
            status: ReadingStatus::Unread,
            last_read_page: 0,
            total_pages: 0,
            progress: 0,
            favourite: false,
            created_at: 1000,
            updated_at: 1000,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let conn = test_db();
        insert(&conn, &sample_book([10u8; 16])).expect("insert");

        let book = get(&conn, &[10u8; 16], &OWNER).expect("get");
        assert_eq!(book.title, "The Left Hand of Darkness");
        assert_eq!(book.status, ReadingStatus::Unread);
        assert_eq!(book.total_pages, 0);
        assert!(!book.favourite);
    }

    #[test]
    fn test_get_foreign_book_reads_as_not_found() {
        let conn = test_db();
        insert(&conn, &sample_book([10u8; 16])).expect("insert");

        let result = get(&conn, &[10u8; 16], &INTRUDER);
        assert!(matches!(result, Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_list_by_owner_is_isolated() {
        let conn = test_db();
        let mut mine = sample_book([10u8; 16]);
        mine.created_at = 2000;
        insert(&conn, &mine).expect("insert");

        let mut theirs = sample_book([11u8; 16]);
        theirs.owner_id = INTRUDER;
        insert(&conn, &theirs).expect("insert");

        let books = list_by_owner(&conn, &OWNER).expect("list");
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].book_id, [10u8; 16]);
    }

    #[test]
    fn test_update_reading_state_writes_whole_tuple() {
        let conn = test_db();
        insert(&conn, &sample_book([10u8; 16])).expect("insert");

        update_reading_state(
            &conn,
            &[10u8; 16],
            &OWNER,
            50,
            200,
            25,
            ReadingStatus::Reading,
            2000,
        )
        .expect("update");

        let book = get(&conn, &[10u8; 16], &OWNER).expect("get");
        assert_eq!(book.last_read_page, 50);
        assert_eq!(book.total_pages, 200);
        assert_eq!(book.progress, 25);
        assert_eq!(book.status, ReadingStatus::Reading);
        assert_eq!(book.updated_at, 2000);
    }

    #[test]
    fn test_write_paths_distinguish_forbidden_from_missing() {
        let conn = test_db();
        insert(&conn, &sample_book([10u8; 16])).expect("insert");

        let foreign = update_reading_state(
            &conn,
            &[10u8; 16],
            &INTRUDER,
            1,
            10,
            10,
            ReadingStatus::Reading,
            2000,
        );
        assert!(matches!(foreign, Err(DbError::Forbidden(_))));

        let missing = delete(&conn, &[99u8; 16], &OWNER);
        assert!(matches!(missing, Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_metadata_update_leaves_reading_state_alone() {
        let conn = test_db();
        insert(&conn, &sample_book([10u8; 16])).expect("insert");
        update_reading_state(
            &conn,
            &[10u8; 16],
            &OWNER,
            50,
            200,
            25,
            ReadingStatus::Reading,
            2000,
        )
        .expect("update reading state");

        let update = MetadataUpdate {
            title: Some("The Dispossessed".to_string()),
            genre: Some("Utopian Fiction".to_string()),
            ..Default::default()
        };
        update_metadata(&conn, &[10u8; 16], &OWNER, &update, 3000).expect("update metadata");

        let book = get(&conn, &[10u8; 16], &OWNER).expect("get");
        assert_eq!(book.title, "The Dispossessed");
        assert_eq!(book.genre, "Utopian Fiction");
        // untouched fields keep their values
        assert_eq!(book.author, "Ursula K. Le Guin");
        assert_eq!(book.last_read_page, 50);
        assert_eq!(book.progress, 25);
        assert_eq!(book.status, ReadingStatus::Reading);
    }

    #[test]
    fn test_set_favourite_independent_of_status() {
        let conn = test_db();
        insert(&conn, &sample_book([10u8; 16])).expect("insert");

        set_favourite(&conn, &[10u8; 16], &OWNER, true, 2000).expect("set");
        let book = get(&conn, &[10u8; 16], &OWNER).expect("get");
        assert!(book.favourite);
        assert_eq!(book.status, ReadingStatus::Unread);
    }

    #[test]
    fn test_delete() {
        let conn = test_db();
        insert(&conn, &sample_book([10u8; 16])).expect("insert");

        delete(&conn, &[10u8; 16], &OWNER).expect("delete");
        assert!(matches!(
            get(&conn, &[10u8; 16], &OWNER),
            Err(DbError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_foreign_is_forbidden_and_keeps_record() {
        let conn = test_db();
        insert(&conn, &sample_book([10u8; 16])).expect("insert");

        let result = delete(&conn, &[10u8; 16], &INTRUDER);
        assert!(matches!(result, Err(DbError::Forbidden(_))));
        get(&conn, &[10u8; 16], &OWNER).expect("record still present");
    }
}
