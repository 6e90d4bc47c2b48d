use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    #[default]
    Student,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    #[default]
    Comfortable,
    Compact,
}

/// UI preferences embedded in each user. Missing keys in stored JSON fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub theme: Theme,
    pub density: Density,
    pub language: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            density: Density::default(),
            language: "en".into(),
        }
    }
}

impl Preferences {
    /// Overlay the keys present in `patch`, keeping the rest.
    pub fn merge(self, patch: &PreferencesPatch) -> Self {
        Self {
            theme: patch.theme.unwrap_or(self.theme),
            density: patch.density.unwrap_or(self.density),
            language: patch.language.clone().unwrap_or(self.language),
        }
    }
}

/// Partial preferences update. Serializes only the keys that are set,
/// so it can be concatenated onto the stored JSONB document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<Density>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// User record as held by the directory. Carries the password digest, so it is
/// never serialized; responses go through [`PublicUser`].
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub disabled: bool,
    pub preferences: Preferences,
    pub last_login_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl User {
    /// Apply every field present in `patch`. Returns whether anything changed.
    pub fn apply(&mut self, patch: &UserPatch) -> bool {
        let before = self.clone();
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(bio) = &patch.bio {
            self.bio = Some(bio.clone());
        }
        if let Some(url) = &patch.avatar_url {
            self.avatar_url = Some(url.clone());
        }
        if let Some(prefs) = &patch.preferences {
            self.preferences = self.preferences.clone().merge(prefs);
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(disabled) = patch.disabled {
            self.disabled = disabled;
        }
        *self != before
    }
}

/// Row shape of the `users` table.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub disabled: bool,
    pub preferences: Json<Preferences>,
    pub last_login_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            email: r.email,
            password_hash: r.password_hash,
            role: r.role,
            bio: r.bio,
            avatar_url: r.avatar_url,
            disabled: r.disabled,
            preferences: r.preferences.0,
            last_login_at: r.last_login_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Public part of the user returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub disabled: bool,
    pub preferences: Preferences,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            bio: u.bio,
            avatar_url: u.avatar_url,
            disabled: u.disabled,
            preferences: u.preferences,
            last_login_at: u.last_login_at,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Fields required to insert a user. `email` must already be normalized.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

/// Partial update of a single user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub preferences: Option<PreferencesPatch>,
    pub role: Option<Role>,
    pub disabled: Option<bool>,
}

impl UserPatch {
    /// Restrict to the fields a user may change on their own account.
    pub fn self_service(self) -> Self {
        Self {
            role: None,
            disabled: None,
            ..self
        }
    }
}

/// Changes applied by an admin across a set of users.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkPatch {
    pub disabled: Option<bool>,
    pub role: Option<Role>,
}

impl BulkPatch {
    pub fn is_empty(&self) -> bool {
        self.disabled.is_none() && self.role.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub matched: u64,
    pub modified: u64,
}

/// Signups on one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct DailyCount {
    pub date: String,
    pub count: i64,
}

/// Lightweight projection used by search suggestions.
#[derive(Debug, Clone, Serialize)]
pub struct UserSuggestion {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for UserSuggestion {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_user(name: &str, email: &str, role: Role) -> User {
    let now = OffsetDateTime::now_utc();
    User {
        id: Uuid::new_v4(),
        name: name.into(),
        email: email.into(),
        password_hash: "$argon2id$v=19$m=16,t=2,p=1$c2FsdHNhbHQ$aGFzaA".into(),
        role,
        bio: None,
        avatar_url: None,
        disabled: false,
        preferences: Preferences::default(),
        last_login_at: None,
        created_at: now,
        updated_at: now,
    }
}
