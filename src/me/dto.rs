use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    extract::trimmed_opt,
    users::repo_types::{PreferencesPatch, UserPatch},
};

/// Profile fields a user may change on their own account.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeRequest {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 2))]
    pub name: Option<String>,
    #[validate(length(max = 300))]
    pub bio: Option<String>,
    #[validate(url)]
    pub avatar_url: Option<String>,
    pub preferences: Option<PreferencesPatch>,
}

impl From<UpdateMeRequest> for UserPatch {
    fn from(r: UpdateMeRequest) -> Self {
        Self {
            name: r.name,
            bio: r.bio,
            avatar_url: r.avatar_url,
            preferences: r.preferences,
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub current: String,
    #[validate(length(min = 6))]
    pub next: String,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}
