use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::query::{KeywordMatch, SortSpec, UserFilter};
use super::repo_types::{BulkOutcome, BulkPatch, DailyCount, NewUser, User, UserPatch};
use crate::dates::DateRange;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Other(e.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The user directory. Emails passed in must already be trimmed and lowercased.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Fails with [`StoreError::DuplicateEmail`] if the email is taken.
    async fn create(&self, user: NewUser) -> StoreResult<User>;

    async fn update_by_id(&self, id: Uuid, patch: &UserPatch) -> StoreResult<Option<User>>;
    async fn set_password(&self, id: Uuid, password_hash: &str) -> StoreResult<bool>;
    async fn touch_last_login(&self, id: Uuid, at: OffsetDateTime) -> StoreResult<()>;
    async fn delete_by_id(&self, id: Uuid) -> StoreResult<bool>;

    /// Applies `patch` to each existing id. Unknown ids are skipped, not errors.
    async fn update_many(&self, ids: &[Uuid], patch: BulkPatch) -> StoreResult<BulkOutcome>;

    async fn count(&self, filter: &UserFilter) -> StoreResult<u64>;
    async fn list(
        &self,
        filter: &UserFilter,
        sort: SortSpec,
        skip: i64,
        limit: i64,
    ) -> StoreResult<Vec<User>>;

    /// Newest first.
    async fn suggest(&self, keyword: &KeywordMatch, limit: i64) -> StoreResult<Vec<User>>;

    /// Signups per UTC day within `range`, ascending, days with no signups omitted.
    async fn daily_counts(&self, range: DateRange) -> StoreResult<Vec<DailyCount>>;

    async fn ping(&self) -> bool;
}
