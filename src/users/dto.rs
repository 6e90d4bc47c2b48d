use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::repo_types::{PreferencesPatch, PublicUser, Role, UserPatch};
use crate::extract::{email, trimmed, trimmed_opt};

/// Request body for admin user creation.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 2))]
    pub name: String,
    #[serde(deserialize_with = "email")]
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    pub role: Role,
    #[validate(length(max = 300))]
    pub bio: Option<String>,
    #[validate(url)]
    pub avatar_url: Option<String>,
}

/// Request body for `PATCH /users/:id`. Non-admins only get the profile fields applied.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 2))]
    pub name: Option<String>,
    pub role: Option<Role>,
    #[validate(length(max = 300))]
    pub bio: Option<String>,
    #[validate(url)]
    pub avatar_url: Option<String>,
    pub disabled: Option<bool>,
    pub preferences: Option<PreferencesPatch>,
}

impl From<UpdateUserRequest> for UserPatch {
    fn from(r: UpdateUserRequest) -> Self {
        Self {
            name: r.name,
            bio: r.bio,
            avatar_url: r.avatar_url,
            preferences: r.preferences,
            role: r.role,
            disabled: r.disabled,
        }
    }
}

/// Ids that do not exist (or do not parse) are simply not matched.
#[derive(Debug, Deserialize, Validate)]
pub struct BulkUpdateRequest {
    #[serde(default)]
    pub ids: Vec<String>,
    pub disabled: Option<bool>,
    pub role: Option<Role>,
}

#[derive(Debug, Serialize)]
pub struct BulkUpdateResponse {
    pub ids: Vec<String>,
    pub matched: u64,
    pub modified: u64,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub data: Vec<PublicUser>,
    pub page: i64,
    pub total: u64,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub ok: bool,
}

/// Path ids that do not parse as UUIDs cannot name a user.
pub fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}
