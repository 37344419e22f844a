//! # octavo-types
//!
//! Shared domain types used across the Octavo workspace: the book record,
//! reading status, update payloads, and the pure progress computation that
//! both the daemon and the reader client must agree on.

pub mod book;
pub mod profile;
pub mod progress;
pub mod update;

pub use book::{Book, ReadingStatus};

/// Unique identifier of a book record. Assigned at creation, immutable.
pub type BookId = [u8; 16];

/// Verified identity of a user. Books are owned by exactly one user.
pub type UserId = [u8; 16];

/// Progress percentage at which a book counts as completed.
pub const PROGRESS_COMPLETE: u8 = 100;

/// The page a reading session starts on when neither the local cache nor
/// the server record has a position.
pub const FIRST_PAGE: u32 = 1;
