//! Session-token queries.
//!
//! Tokens are minted by the external authenticator (login / OTP flow); the
//! daemon only resolves them back to a verified user id.

use rusqlite::Connection;

use octavo_types::UserId;

use crate::{DbError, Result};

/// Record a bearer token for a user.
pub fn insert(conn: &Connection, token: &str, user_id: &UserId, created_at: u64) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO sessions (token, user_id, created_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![token, user_id.as_slice(), created_at as i64],
    )?;
    Ok(())
}

/// Resolve a bearer token to its user id.
pub fn lookup_user(conn: &Connection, token: &str) -> Result<UserId> {
    conn.query_row(
        "SELECT user_id FROM sessions WHERE token = ?1",
        [token],
        |row| {
            let blob: Vec<u8> = row.get(0)?;
            blob.try_into().map_err(|_| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Blob,
                    "user id must be 16 bytes".into(),
                )
            })
        },
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound("session".into()),
        other => DbError::Sqlite(other),
    })
}

/// Revoke a token.
pub fn revoke(conn: &Connection, token: &str) -> Result<()> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", [token])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::users;

    fn test_db() -> Connection {
        let conn = crate::open_memory().expect("open test db");
        users::insert(&conn, &[1u8; 16], "Ada", "ada@example.com", 1000).expect("insert user");
        conn
    }

    #[test]
    fn test_insert_and_lookup() {
        let conn = test_db();
        insert(&conn, "tok-abc", &[1u8; 16], 1000).expect("insert");

        let user = lookup_user(&conn, "tok-abc").expect("lookup");
        assert_eq!(user, [1u8; 16]);
    }

    #[test]
    fn test_unknown_token() {
        let conn = test_db();
        assert!(matches!(
            lookup_user(&conn, "tok-unknown"),
            Err(DbError::NotFound(_))
        ));
    }

    #[test]
    fn test_revoke() {
        let conn = test_db();
        insert(&conn, "tok-abc", &[1u8; 16], 1000).expect("insert");
        revoke(&conn, "tok-abc").expect("revoke");
        assert!(matches!(
            lookup_user(&conn, "tok-abc"),
            Err(DbError::NotFound(_))
        ));
    }
}
