//! Bearer-token verification.
//!
//! Token issuance (registration, password check, OTP email) lives in the
//! external authenticator; this module only resolves an already-issued
//! token back to a verified user id. Every RPC request passes through
//! [`Authenticator::verify`] before it reaches a command handler.

use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::Mutex;

use octavo_db::queries::sessions;
use octavo_types::UserId;

/// Resolves a bearer token to a verified identity.
#[async_trait::async_trait]
pub trait Authenticator: Send + Sync {
    /// `None` means the token is unknown, expired, or revoked.
    async fn verify(&self, token: &str) -> Option<UserId>;
}

/// Authenticator backed by the `sessions` table.
pub struct SessionAuthenticator {
    db: Arc<Mutex<Connection>>,
}

impl SessionAuthenticator {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl Authenticator for SessionAuthenticator {
    async fn verify(&self, token: &str) -> Option<UserId> {
        let db = self.db.lock().await;
        sessions::lookup_user(&db, token).ok()
    }
}

/// Mint an opaque token value. Only the external authenticator calls this
/// in production; tests use it to seed the sessions table.
pub fn generate_token() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}
