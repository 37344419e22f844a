//! # octavo-reader
//!
//! Client-side reading machinery: the reader session controller, the local
//! progress cache it seeds from, the RPC bridge to the daemon, and the
//! document-renderer seam.
//!
//! A session's network traffic is deliberately minimal: at most one
//! reconciliation on open (the Unread -> Reading flip) and exactly one on
//! close. Page turns never leave the process.

pub mod bridge;
pub mod cache;
pub mod remote;
pub mod renderer;
pub mod session;

pub use cache::{CachedPosition, ProgressCache};
pub use remote::{BookRemote, RemoteError};
pub use session::{Reader, ReaderSession, SessionState};
