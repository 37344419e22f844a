//! User profile queries.

use rusqlite::Connection;

use octavo_types::profile::UserProfile;
use octavo_types::UserId;

use crate::{DbError, Result};

/// Insert a new user.
pub fn insert(
    conn: &Connection,
    user_id: &UserId,
    display_name: &str,
    email: &str,
    created_at: u64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO users (user_id, display_name, email, profile_image_url, created_at)
         VALUES (?1, ?2, ?3, NULL, ?4)",
        rusqlite::params![user_id.as_slice(), display_name, email, created_at as i64],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DbError::Constraint(format!("email '{email}' already registered"))
        }
        other => DbError::Sqlite(other),
    })?;
    Ok(())
}

/// Get a user by id.
pub fn get(conn: &Connection, user_id: &UserId) -> Result<UserProfile> {
    conn.query_row(
        "SELECT user_id, display_name, email, profile_image_url, created_at
         FROM users WHERE user_id = ?1",
        [user_id.as_slice()],
        |row| {
            let blob: Vec<u8> = row.get(0)?;
            let user_id: UserId = blob.try_into().map_err(|_| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Blob,
                    "user id must be 16 bytes".into(),
                )
            })?;
            Ok(UserProfile {
                user_id,
                display_name: row.get(1)?,
                email: row.get(2)?,
                profile_image_url: row.get(3)?,
                created_at: row.get::<_, i64>(4)? as u64,
            })
        },
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound("user".into()),
        other => DbError::Sqlite(other),
    })
}

/// Update the display name.
pub fn update_display_name(conn: &Connection, user_id: &UserId, display_name: &str) -> Result<()> {
    let affected = conn.execute(
        "UPDATE users SET display_name = ?2 WHERE user_id = ?1",
        rusqlite::params![user_id.as_slice(), display_name],
    )?;
    if affected == 0 {
        return Err(DbError::NotFound("user".into()));
    }
    Ok(())
}

/// Set the profile image URL.
pub fn set_profile_image(conn: &Connection, user_id: &UserId, image_url: &str) -> Result<()> {
    let affected = conn.execute(
        "UPDATE users SET profile_image_url = ?2 WHERE user_id = ?1",
        rusqlite::params![user_id.as_slice(), image_url],
    )?;
    if affected == 0 {
        return Err(DbError::NotFound("user".into()));
    }
    Ok(())
}
