//! In-process directory for tests. Mirrors the Postgres semantics closely
//! enough that handlers can be exercised end to end without a database.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::query::{KeywordMatch, SortField, SortSpec, UserFilter};
use super::repo_types::{
    BulkOutcome, BulkPatch, DailyCount, NewUser, Preferences, User, UserPatch,
};
use super::store::{StoreError, StoreResult, UserStore};
use crate::dates::DateRange;

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed user, bypassing the uniqueness check. Used to seed
    /// users with back-dated `created_at`.
    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn get(&self, id: Uuid) -> Option<User> {
        self.users.read().await.get(&id).cloned()
    }
}

fn compare(a: &User, b: &User, field: SortField) -> Ordering {
    match field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Name => a.name.cmp(&b.name),
        SortField::Email => a.email.cmp(&b.email),
        SortField::Role => (a.role as u8).cmp(&(b.role as u8)),
        SortField::LastLoginAt => a.last_login_at.cmp(&b.last_login_at),
    }
}

fn sorted(mut users: Vec<User>, sort: SortSpec) -> Vec<User> {
    users.sort_by(|a, b| {
        let ord = compare(a, b, sort.field);
        let ord = if sort.ascending { ord } else { ord.reverse() };
        ord.then_with(|| a.id.cmp(&b.id))
    });
    users
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.get(id).await)
    }

    async fn create(&self, new: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            bio: new.bio,
            avatar_url: new.avatar_url,
            disabled: false,
            preferences: Preferences::default(),
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_by_id(&self, id: Uuid, patch: &UserPatch) -> StoreResult<Option<User>> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|u| {
            u.apply(patch);
            u.updated_at = OffsetDateTime::now_utc();
            u.clone()
        }))
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> StoreResult<bool> {
        let mut users = self.users.write().await;
        Ok(users
            .get_mut(&id)
            .map(|u| {
                u.password_hash = password_hash.to_string();
                u.updated_at = OffsetDateTime::now_utc();
            })
            .is_some())
    }

    async fn touch_last_login(&self, id: Uuid, at: OffsetDateTime) -> StoreResult<()> {
        if let Some(u) = self.users.write().await.get_mut(&id) {
            u.last_login_at = Some(at);
            u.updated_at = OffsetDateTime::now_utc();
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.users.write().await.remove(&id).is_some())
    }

    async fn update_many(&self, ids: &[Uuid], patch: BulkPatch) -> StoreResult<BulkOutcome> {
        let unique: HashSet<Uuid> = ids.iter().copied().collect();
        let as_patch = UserPatch {
            disabled: patch.disabled,
            role: patch.role,
            ..Default::default()
        };
        let mut users = self.users.write().await;
        let mut outcome = BulkOutcome::default();
        for id in unique {
            if let Some(u) = users.get_mut(&id) {
                outcome.matched += 1;
                if u.apply(&as_patch) {
                    u.updated_at = OffsetDateTime::now_utc();
                    outcome.modified += 1;
                }
            }
        }
        Ok(outcome)
    }

    async fn count(&self, filter: &UserFilter) -> StoreResult<u64> {
        let users = self.users.read().await;
        Ok(users.values().filter(|u| filter.matches(u)).count() as u64)
    }

    async fn list(
        &self,
        filter: &UserFilter,
        sort: SortSpec,
        skip: i64,
        limit: i64,
    ) -> StoreResult<Vec<User>> {
        let matching: Vec<User> = {
            let users = self.users.read().await;
            users.values().filter(|u| filter.matches(u)).cloned().collect()
        };
        Ok(sorted(matching, sort)
            .into_iter()
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn suggest(&self, keyword: &KeywordMatch, limit: i64) -> StoreResult<Vec<User>> {
        let filter = UserFilter {
            keyword: Some(keyword.clone()),
            ..Default::default()
        };
        self.list(&filter, SortSpec::newest_first(), 0, limit).await
    }

    async fn daily_counts(&self, range: DateRange) -> StoreResult<Vec<DailyCount>> {
        let users = self.users.read().await;
        let mut days: BTreeMap<time::Date, i64> = BTreeMap::new();
        for u in users.values().filter(|u| range.contains(u.created_at)) {
            let day = u.created_at.to_offset(time::UtcOffset::UTC).date();
            *days.entry(day).or_default() += 1;
        }
        Ok(days
            .into_iter()
            .map(|(day, count)| DailyCount {
                date: day.to_string(),
                count,
            })
            .collect())
    }

    async fn ping(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::query::{MatchMode, SearchScope};
    use crate::users::repo_types::{sample_user, Role};
    use time::macros::datetime;

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            name: name.into(),
            email: email.into(),
            password_hash: "h".into(),
            role: Role::Student,
            bio: None,
            avatar_url: None,
        }
    }

    #[tokio::test]
    async fn login_stamp_bumps_updated_at() {
        let store = MemoryUserStore::new();
        let mut user = sample_user("Ann", "ann@s.t", Role::Student);
        user.updated_at = datetime!(2020-01-01 0:00 UTC);
        store.insert(user.clone()).await;

        let at = datetime!(2024-05-01 9:00 UTC);
        store.touch_last_login(user.id, at).await.unwrap();
        let stored = store.get(user.id).await.unwrap();
        assert_eq!(stored.last_login_at, Some(at));
        assert!(stored.updated_at > datetime!(2020-01-01 0:00 UTC));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryUserStore::new();
        store.create(new_user("Ann", "ann@s.t")).await.unwrap();
        let err = store.create(new_user("Ann B", "ann@s.t")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn bulk_update_skips_missing_ids() {
        let store = MemoryUserStore::new();
        let a = store.create(new_user("A", "a@s.t")).await.unwrap();
        let c = store.create(new_user("C", "c@s.t")).await.unwrap();
        let missing = Uuid::new_v4();

        let outcome = store
            .update_many(
                &[a.id, missing, c.id],
                BulkPatch {
                    disabled: Some(true),
                    role: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome, BulkOutcome { matched: 2, modified: 2 });
        assert!(store.get(a.id).await.unwrap().disabled);
        assert!(store.get(c.id).await.unwrap().disabled);

        // Second run changes nothing.
        let again = store
            .update_many(
                &[a.id, c.id],
                BulkPatch {
                    disabled: Some(true),
                    role: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(again, BulkOutcome { matched: 2, modified: 0 });
    }

    #[tokio::test]
    async fn daily_counts_group_by_utc_day() {
        let store = MemoryUserStore::new();
        for at in [
            datetime!(2024-05-01 09:00 UTC),
            datetime!(2024-05-01 23:59 UTC),
            datetime!(2024-05-03 00:00 UTC),
            datetime!(2024-06-01 00:00 UTC),
        ] {
            let mut u = sample_user("X", &format!("{}@s.t", Uuid::new_v4()), Role::Student);
            u.created_at = at;
            store.insert(u).await;
        }
        let days = store
            .daily_counts(DateRange::between(
                datetime!(2024-05-01 0:00 UTC),
                datetime!(2024-05-31 0:00 UTC),
            ))
            .await
            .unwrap();
        assert_eq!(
            days,
            vec![
                DailyCount {
                    date: "2024-05-01".into(),
                    count: 2
                },
                DailyCount {
                    date: "2024-05-03".into(),
                    count: 1
                },
            ]
        );
    }

    #[tokio::test]
    async fn list_sorts_and_pages() {
        let store = MemoryUserStore::new();
        for (i, name) in ["Cara", "Abe", "Bea"].iter().enumerate() {
            let mut u = sample_user(name, &format!("{}@s.t", name), Role::Student);
            u.created_at = datetime!(2024-01-01 0:00 UTC) + time::Duration::days(i as i64);
            store.insert(u).await;
        }
        let by_name = store
            .list(&UserFilter::default(), SortSpec::parse("name:asc"), 0, 10)
            .await
            .unwrap();
        let names: Vec<_> = by_name.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["Abe", "Bea", "Cara"]);

        let page_two = store
            .list(&UserFilter::default(), SortSpec::newest_first(), 1, 1)
            .await
            .unwrap();
        assert_eq!(page_two[0].name, "Abe");

        let k = KeywordMatch::new("b", SearchScope::Name, MatchMode::StartsWith).unwrap();
        let hits = store.suggest(&k, 8).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Bea");
    }
}
