//! # octavo-daemon
//!
//! The Octavo book-tracking service: a single OS process running a Tokio
//! async runtime, owning the SQLite book records and exposing them to
//! clients via JSON-RPC over a Unix socket.
//!
//! Every mutation of a book's reading state goes through the
//! [`reconcile`] module, so the `Completed ⇔ progress == 100` invariant
//! cannot be bypassed by a new call site.

pub mod auth;
pub mod commands;
pub mod config;
pub mod events;
pub mod reconcile;
pub mod rpc;
pub mod storage;

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::auth::Authenticator;
use crate::config::DaemonConfig;
use crate::events::EventBus;
use crate::storage::BlobStore;

/// Daemon-wide shared state.
pub struct DaemonState {
    /// Database connection.
    pub db: Arc<tokio::sync::Mutex<rusqlite::Connection>>,
    /// Configuration.
    pub config: DaemonConfig,
    /// Bearer-token resolution (the external authenticator's verification half).
    pub auth: Arc<dyn Authenticator>,
    /// Cover / document / profile-image storage.
    pub blobs: Arc<dyn BlobStore>,
    /// Event bus for pushing events to subscribers.
    pub event_bus: EventBus,
    /// Shutdown signal sender.
    pub shutdown_tx: broadcast::Sender<()>,
}

/// Current time as Unix seconds.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
