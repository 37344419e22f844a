//! User profile record.

use serde::{Deserialize, Serialize};

use crate::UserId;

/// A user as the profile endpoints see them. Credentials and OTP state are
/// owned by the external authenticator and never appear here.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub display_name: String,
    pub email: String,
    /// Blob store reference. `None` = no picture uploaded.
    pub profile_image_url: Option<String>,
    /// Unix seconds.
    pub created_at: u64,
}
