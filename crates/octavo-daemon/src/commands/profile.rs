//! Profile command handlers.

use std::sync::Arc;

use serde_json::Value;

use octavo_db::queries::users;
use octavo_types::UserId;

use super::{opt_blob, require_str, rpc_from_db};
use crate::rpc::RpcError;
use crate::storage::BlobFolder;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Fetch the caller's profile.
pub async fn get_profile(state: &Arc<DaemonState>, caller: &UserId) -> Result {
    let db = state.db.lock().await;
    let user = users::get(&db, caller).map_err(rpc_from_db)?;
    Ok(serde_json::json!({
        "name": user.display_name,
        "email": user.email,
        "profile_image_url": user.profile_image_url,
    }))
}

/// Update the caller's display name.
pub async fn update_profile(state: &Arc<DaemonState>, caller: &UserId, params: &Value) -> Result {
    let display_name = require_str(params, "display_name")?;

    {
        let db = state.db.lock().await;
        users::update_display_name(&db, caller, display_name).map_err(rpc_from_db)?;
    }

    Ok(serde_json::json!({
        "message": "Profile updated",
        "name": display_name,
    }))
}

/// Replace the caller's profile picture.
pub async fn change_profile_image(
    state: &Arc<DaemonState>,
    caller: &UserId,
    params: &Value,
) -> Result {
    let bytes = opt_blob(params, "image_base64")?
        .ok_or_else(|| RpcError::invalid_params("image_base64 required"))?;

    let image_url = state
        .blobs
        .store(BlobFolder::ProfileImages, &bytes)
        .await
        .map_err(|e| RpcError::upstream_unavailable(&e.to_string()))?;

    {
        let db = state.db.lock().await;
        users::set_profile_image(&db, caller, &image_url).map_err(rpc_from_db)?;
    }

    Ok(serde_json::json!({
        "message": "Profile image updated",
        "image_url": image_url,
    }))
}
