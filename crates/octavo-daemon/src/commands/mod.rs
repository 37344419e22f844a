//! RPC command handlers.
//!
//! Each submodule implements the commands for one category. Shared here:
//! parameter extraction helpers and the error mappings from the database
//! and reconciler layers onto RPC error codes.

pub mod books;
pub mod profile;

use base64::Engine;
use serde_json::Value;

use octavo_db::DbError;
use octavo_types::{Book, BookId, ReadingStatus};

use crate::events::Event;
use crate::reconcile::ReconcileError;
use crate::rpc::RpcError;
use crate::DaemonState;

pub(crate) fn rpc_from_db(e: DbError) -> RpcError {
    match e {
        DbError::NotFound(_) => RpcError::not_found(),
        DbError::Forbidden(_) => RpcError::forbidden(),
        DbError::Constraint(detail) => RpcError::invalid_params(&detail),
        other => RpcError::internal_error(&format!("db error: {other}")),
    }
}

pub(crate) fn rpc_from_reconcile(e: ReconcileError) -> RpcError {
    match e {
        ReconcileError::NotFound => RpcError::not_found(),
        ReconcileError::Forbidden => RpcError::forbidden(),
        ReconcileError::InvalidInput(detail) => RpcError::invalid_params(&detail),
        ReconcileError::Db(e) => rpc_from_db(e),
    }
}

/// Extract the `book_id` parameter (32 hex chars).
pub(crate) fn require_book_id(params: &Value) -> Result<BookId, RpcError> {
    let hex_str = params
        .get("book_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("book_id required"))?;
    let bytes =
        hex::decode(hex_str).map_err(|_| RpcError::invalid_params("invalid hex for book_id"))?;
    bytes
        .try_into()
        .map_err(|_| RpcError::invalid_params("book_id must be 16 bytes"))
}

/// Extract a required, non-empty string parameter.
pub(crate) fn require_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, RpcError> {
    let s = params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params(&format!("{key} required")))?;
    if s.trim().is_empty() {
        return Err(RpcError::invalid_params(&format!("{key} must not be empty")));
    }
    Ok(s)
}

/// Extract an optional string parameter.
pub(crate) fn opt_str(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

/// Extract an optional non-negative integer parameter. A negative or
/// fractional number is rejected rather than coerced.
pub(crate) fn opt_u32(params: &Value, key: &str) -> Result<Option<u32>, RpcError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => {
            let n = v.as_u64().ok_or_else(|| {
                RpcError::invalid_params(&format!("{key} must be a non-negative integer"))
            })?;
            u32::try_from(n)
                .map(Some)
                .map_err(|_| RpcError::invalid_params(&format!("{key} out of range")))
        }
    }
}

/// Extract an optional reading-status parameter. An unrecognized value is
/// an error, not a silent default.
pub(crate) fn opt_status(params: &Value, key: &str) -> Result<Option<ReadingStatus>, RpcError> {
    match params.get(key).and_then(|v| v.as_str()) {
        None => Ok(None),
        Some(s) => s.parse().map(Some).map_err(|_| {
            RpcError::invalid_params(&format!(
                "{key} must be one of Unread, Reading, Completed"
            ))
        }),
    }
}

/// Extract an optional base64-encoded blob parameter.
pub(crate) fn opt_blob(params: &Value, key: &str) -> Result<Option<Vec<u8>>, RpcError> {
    match params.get(key).and_then(|v| v.as_str()) {
        None => Ok(None),
        Some(s) => base64::engine::general_purpose::STANDARD
            .decode(s)
            .map(Some)
            .map_err(|_| RpcError::invalid_params(&format!("{key} must be base64"))),
    }
}

/// Render a book record for the wire, ids hex-encoded.
pub(crate) fn book_to_json(book: &Book) -> Value {
    serde_json::json!({
        "book_id": hex::encode(book.book_id),
        "owner_id": hex::encode(book.owner_id),
        "title": book.title,
        "author": book.author,
        "genre": book.genre,
        "description": book.description,
        "cover_url": book.cover_url,
        "document_url": book.document_url,
        "status": book.status.as_str(),
        "last_read_page": book.last_read_page,
        "total_pages": book.total_pages,
        "progress": book.progress,
        "favourite": book.favourite,
        "created_at": book.created_at,
        "updated_at": book.updated_at,
    })
}

pub(crate) fn emit(state: &DaemonState, event_type: &str, payload: Value) {
    state.event_bus.emit(Event {
        event_type: event_type.to_string(),
        timestamp: crate::unix_now(),
        payload,
    });
}
