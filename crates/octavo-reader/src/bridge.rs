//! JSON-RPC client that connects to the Octavo daemon over a Unix domain
//! socket and forwards requests from the reader.
//!
//! The daemon speaks newline-delimited JSON-RPC 2.0 (one request per line,
//! one response per line). This module handles the connection lifecycle,
//! serialization, and deserialization.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tracing::{debug, error};

use octavo_types::update::PageUpdate;
use octavo_types::{Book, BookId, ReadingStatus};

use crate::remote::{BookRemote, RemoteError};

/// Send a single JSON-RPC request to the daemon and return the parsed
/// response.
///
/// # Errors
///
/// Returns an error if the connection fails, the write fails, or the
/// response cannot be parsed.
pub async fn send_rpc_request(
    socket_path: &str,
    request: &serde_json::Value,
) -> Result<serde_json::Value, BridgeError> {
    // Connect to the daemon socket.
    let stream = UnixStream::connect(socket_path).await.map_err(|e| {
        error!(
            "Failed to connect to daemon socket at {}: {}",
            socket_path, e
        );
        BridgeError::ConnectionFailed {
            path: socket_path.to_string(),
            reason: e.to_string(),
        }
    })?;

    debug!("Connected to daemon socket at {}", socket_path);

    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    // Serialize the request to a single line of JSON, terminated by newline.
    let mut request_json = serde_json::to_string(request)
        .map_err(|e| BridgeError::SerializationFailed(e.to_string()))?;
    request_json.push('\n');

    // Send the request.
    writer
        .write_all(request_json.as_bytes())
        .await
        .map_err(|e| {
            error!("Failed to write request to daemon: {}", e);
            BridgeError::WriteFailed(e.to_string())
        })?;
    writer
        .flush()
        .await
        .map_err(|e| BridgeError::WriteFailed(e.to_string()))?;

    // Read the response (one line).
    let mut response_line = String::new();
    let bytes_read = reader.read_line(&mut response_line).await.map_err(|e| {
        error!("Failed to read response from daemon: {}", e);
        BridgeError::ReadFailed(e.to_string())
    })?;

    if bytes_read == 0 {
        return Err(BridgeError::DaemonDisconnected);
    }

    // Parse the JSON response.
    let response: serde_json::Value = serde_json::from_str(&response_line).map_err(|e| {
        error!("Failed to parse daemon response: {}", e);
        BridgeError::ParseFailed {
            reason: e.to_string(),
            raw: response_line.clone(),
        }
    })?;

    debug!("Received RPC response from daemon");

    Ok(response)
}

/// Errors that can occur during IPC communication with the daemon.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Failed to connect to the daemon socket.
    #[error("Failed to connect to daemon at '{path}': {reason}")]
    ConnectionFailed { path: String, reason: String },

    /// Failed to serialize the request.
    #[error("Failed to serialize RPC request: {0}")]
    SerializationFailed(String),

    /// Failed to write to the socket.
    #[error("Failed to write to daemon socket: {0}")]
    WriteFailed(String),

    /// Failed to read from the socket.
    #[error("Failed to read from daemon socket: {0}")]
    ReadFailed(String),

    /// The daemon closed the connection unexpectedly.
    #[error("Daemon disconnected unexpectedly (EOF)")]
    DaemonDisconnected,

    /// Failed to parse the daemon's response as JSON.
    #[error("Failed to parse daemon response: {reason} (raw: {raw})")]
    ParseFailed { reason: String, raw: String },
}

/// [`BookRemote`] over the daemon socket, authenticated with a bearer token.
pub struct RpcBookRemote {
    socket_path: String,
    token: String,
    next_id: AtomicU64,
}

impl RpcBookRemote {
    pub fn new(socket_path: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            socket_path: socket_path.into(),
            token: token.into(),
            next_id: AtomicU64::new(1),
        }
    }

    async fn call(
        &self,
        method: &str,
        mut params: serde_json::Map<String, serde_json::Value>,
    ) -> Result<serde_json::Value, RemoteError> {
        params.insert(
            "token".to_string(),
            serde_json::Value::String(self.token.clone()),
        );
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": serde_json::Value::Object(params),
        });

        let response = send_rpc_request(&self.socket_path, &request)
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        if let Some(err) = response.get("error") {
            let code = err.get("code").and_then(|v| v.as_i64()).unwrap_or(0) as i32;
            let message = err
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error")
                .to_string();
            return Err(RemoteError::Rejected { code, message });
        }

        response
            .get("result")
            .cloned()
            .ok_or_else(|| RemoteError::Protocol("response has neither result nor error".into()))
    }
}

#[async_trait::async_trait]
impl BookRemote for RpcBookRemote {
    async fn fetch_book(&self, book_id: &BookId) -> Result<Book, RemoteError> {
        let mut params = serde_json::Map::new();
        params.insert(
            "book_id".to_string(),
            serde_json::Value::String(hex::encode(book_id)),
        );
        let result = self.call("get_book", params).await?;
        book_from_json(&result)
    }

    async fn reconcile(&self, book_id: &BookId, update: &PageUpdate) -> Result<Book, RemoteError> {
        let mut params = serde_json::Map::new();
        params.insert(
            "book_id".to_string(),
            serde_json::Value::String(hex::encode(book_id)),
        );
        params.insert("page".to_string(), update.observed_page.into());
        if let Some(total) = update.observed_total_pages {
            params.insert("total_pages".to_string(), total.into());
        }
        if let Some(status) = update.explicit_status {
            params.insert(
                "status".to_string(),
                serde_json::Value::String(status.as_str().to_string()),
            );
        }
        let result = self.call("update_reading_progress", params).await?;
        book_from_json(&result)
    }
}

/// Parse a wire book object back into a [`Book`].
pub fn book_from_json(value: &serde_json::Value) -> Result<Book, RemoteError> {
    let status: ReadingStatus = str_field(value, "status")?
        .parse()
        .map_err(|_| RemoteError::Protocol("unrecognized status".into()))?;

    Ok(Book {
        book_id: id_field(value, "book_id")?,
        owner_id: id_field(value, "owner_id")?,
        title: str_field(value, "title")?,
        author: str_field(value, "author")?,
        genre: str_field(value, "genre")?,
        description: str_field(value, "description")?,
        cover_url: opt_str_field(value, "cover_url"),
        document_url: opt_str_field(value, "document_url"),
        status,
        last_read_page: u64_field(value, "last_read_page")? as u32,
        total_pages: u64_field(value, "total_pages")? as u32,
        progress: u64_field(value, "progress")? as u8,
        favourite: value
            .get("favourite")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        created_at: u64_field(value, "created_at")?,
        updated_at: u64_field(value, "updated_at")?,
    })
}

fn str_field(value: &serde_json::Value, key: &str) -> Result<String, RemoteError> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| RemoteError::Protocol(format!("missing string field '{key}'")))
}

fn opt_str_field(value: &serde_json::Value, key: &str) -> Option<String> {
    value.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

fn u64_field(value: &serde_json::Value, key: &str) -> Result<u64, RemoteError> {
    value
        .get(key)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| RemoteError::Protocol(format!("missing integer field '{key}'")))
}

fn id_field(value: &serde_json::Value, key: &str) -> Result<[u8; 16], RemoteError> {
    let raw = str_field(value, key)?;
    let bytes =
        hex::decode(&raw).map_err(|_| RemoteError::Protocol(format!("field '{key}' is not hex")))?;
    bytes
        .try_into()
        .map_err(|_| RemoteError::Protocol(format!("field '{key}' is not 16 bytes")))
}
