use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use super::query::{KeywordMatch, SearchScope, SortSpec, UserFilter};
use super::repo_types::{BulkOutcome, BulkPatch, DailyCount, NewUser, User, UserPatch, UserRow};
use super::store::{StoreError, StoreResult, UserStore};
use crate::dates::DateRange;

const COLUMNS: &str = "id, name, email, password_hash, role, bio, avatar_url, disabled, \
                       preferences, last_login_at, created_at, updated_at";

/// Postgres-backed user directory.
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Appends `WHERE ...` for every condition set on `filter`.
fn push_filter<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a UserFilter) {
    qb.push(" WHERE TRUE");
    if let Some(role) = filter.role {
        qb.push(" AND role = ").push_bind(role);
    }
    if let Some(keyword) = &filter.keyword {
        push_keyword(qb, keyword);
    }
    if let Some(start) = filter.created.start {
        qb.push(" AND created_at >= ").push_bind(start);
    }
    if let Some(end) = filter.created.end {
        qb.push(" AND created_at <= ").push_bind(end);
    }
}

fn push_keyword<'a>(qb: &mut QueryBuilder<'a, Postgres>, keyword: &'a KeywordMatch) {
    let pattern = keyword.pattern();
    match keyword.scope() {
        SearchScope::Name => {
            qb.push(" AND name ~* ").push_bind(pattern);
        }
        SearchScope::Email => {
            qb.push(" AND email ~* ").push_bind(pattern);
        }
        SearchScope::Any => {
            qb.push(" AND (name ~* ")
                .push_bind(pattern)
                .push(" OR email ~* ")
                .push_bind(pattern)
                .push(")");
        }
    }
}

fn push_order(qb: &mut QueryBuilder<'_, Postgres>, sort: SortSpec) {
    qb.push(" ORDER BY ")
        .push(sort.field.column())
        .push(if sort.ascending { " ASC" } else { " DESC" })
        .push(", id");
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, role, bio, avatar_url, disabled,
                   preferences, last_login_at, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(row.map(User::from))
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, role, bio, avatar_url, disabled,
                   preferences, last_login_at, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(row.map(User::from))
    }

    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (name, email, password_hash, role, bio, avatar_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, email, password_hash, role, bio, avatar_url, disabled,
                      preferences, last_login_at, created_at, updated_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.bio)
        .bind(&user.avatar_url)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail,
            _ => StoreError::from(e),
        })?;
        Ok(row.into())
    }

    async fn update_by_id(&self, id: Uuid, patch: &UserPatch) -> StoreResult<Option<User>> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET updated_at = now()");
        if let Some(name) = &patch.name {
            qb.push(", name = ").push_bind(name);
        }
        if let Some(bio) = &patch.bio {
            qb.push(", bio = ").push_bind(bio);
        }
        if let Some(url) = &patch.avatar_url {
            qb.push(", avatar_url = ").push_bind(url);
        }
        if let Some(prefs) = &patch.preferences {
            qb.push(", preferences = preferences || ")
                .push_bind(Json(prefs))
                .push("::jsonb");
        }
        if let Some(role) = patch.role {
            qb.push(", role = ").push_bind(role);
        }
        if let Some(disabled) = patch.disabled {
            qb.push(", disabled = ").push_bind(disabled);
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(COLUMNS);

        let row = qb
            .build_query_as::<UserRow>()
            .fetch_optional(&self.db)
            .await
            .context("update user")?;
        Ok(row.map(User::from))
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> StoreResult<bool> {
        let res = sqlx::query(
            r#"UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2"#,
        )
        .bind(password_hash)
        .bind(id)
        .execute(&self.db)
        .await
        .context("set password")?;
        Ok(res.rows_affected() > 0)
    }

    async fn touch_last_login(&self, id: Uuid, at: OffsetDateTime) -> StoreResult<()> {
        sqlx::query(r#"UPDATE users SET last_login_at = $1, updated_at = now() WHERE id = $2"#)
            .bind(at)
            .bind(id)
            .execute(&self.db)
            .await
            .context("stamp last login")?;
        Ok(())
    }

    async fn delete_by_id(&self, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete user")?;
        Ok(res.rows_affected() > 0)
    }

    async fn update_many(&self, ids: &[Uuid], patch: BulkPatch) -> StoreResult<BulkOutcome> {
        // modified only counts rows whose stored values actually change
        let (matched, modified) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            WITH target AS (
                SELECT id FROM users WHERE id = ANY($1)
            ),
            changed AS (
                UPDATE users
                   SET disabled = COALESCE($2::boolean, disabled),
                       role = COALESCE($3::user_role, role),
                       updated_at = now()
                 WHERE id IN (SELECT id FROM target)
                   AND (($2::boolean IS NOT NULL AND disabled IS DISTINCT FROM $2::boolean)
                     OR ($3::user_role IS NOT NULL AND role IS DISTINCT FROM $3::user_role))
                RETURNING id
            )
            SELECT (SELECT COUNT(*) FROM target), (SELECT COUNT(*) FROM changed)
            "#,
        )
        .bind(ids.to_vec())
        .bind(patch.disabled)
        .bind(patch.role)
        .fetch_one(&self.db)
        .await
        .context("bulk update users")?;

        Ok(BulkOutcome {
            matched: matched as u64,
            modified: modified as u64,
        })
    }

    async fn count(&self, filter: &UserFilter) -> StoreResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_filter(&mut qb, filter);
        let n: i64 = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.db)
            .await
            .context("count users")?;
        Ok(n as u64)
    }

    async fn list(
        &self,
        filter: &UserFilter,
        sort: SortSpec,
        skip: i64,
        limit: i64,
    ) -> StoreResult<Vec<User>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(COLUMNS).push(" FROM users");
        push_filter(&mut qb, filter);
        push_order(&mut qb, sort);
        qb.push(" LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(skip);

        let rows = qb
            .build_query_as::<UserRow>()
            .fetch_all(&self.db)
            .await
            .context("list users")?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn suggest(&self, keyword: &KeywordMatch, limit: i64) -> StoreResult<Vec<User>> {
        let filter = UserFilter {
            keyword: Some(keyword.clone()),
            ..Default::default()
        };
        self.list(&filter, SortSpec::newest_first(), 0, limit).await
    }

    async fn daily_counts(&self, range: DateRange) -> StoreResult<Vec<DailyCount>> {
        let filter = UserFilter::default().created_within(range);
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD') AS date, \
             COUNT(*) AS count FROM users",
        );
        push_filter(&mut qb, &filter);
        qb.push(" GROUP BY 1 ORDER BY 1");

        let rows = qb
            .build_query_as::<DailyCount>()
            .fetch_all(&self.db)
            .await
            .context("daily signup counts")?;
        Ok(rows)
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.db).await.is_ok()
    }
}
