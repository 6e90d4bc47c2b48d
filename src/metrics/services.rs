use time::OffsetDateTime;
use tracing::debug;

use super::{
    dto::{Deltas, SummaryResponse},
    window::{pct, previous_window},
};
use crate::{
    dates::DateRange,
    users::{
        query::UserFilter,
        repo_types::DailyCount,
        store::{StoreResult, UserStore},
        Role,
    },
};

/// Only daily bucketing is supported.
pub const DAY_INTERVAL: &str = "day";

pub async fn summary(
    store: &dyn UserStore,
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> StoreResult<SummaryResponse> {
    let window = DateRange::between(start, end);

    let all = UserFilter::default();
    let teachers = UserFilter::role(Role::Teacher);
    let students = UserFilter::role(Role::Student);
    let by_role = [all.clone(), teachers.clone(), students.clone()];
    let curr = by_role.clone().map(|f| f.created_within(window));

    let (total_users, total_teachers, total_students) = tokio::try_join!(
        store.count(&all),
        store.count(&teachers),
        store.count(&students),
    )?;
    let (curr_all, curr_teachers, curr_students) = tokio::try_join!(
        store.count(&curr[0]),
        store.count(&curr[1]),
        store.count(&curr[2]),
    )?;
    // nothing can precede a window that starts at the earliest instant
    let (prev_all, prev_teachers, prev_students) = match previous_window(start, end) {
        Some((prev_start, prev_end)) => {
            let prev_window = DateRange::between(prev_start, prev_end);
            let prev = by_role.map(|f| f.created_within(prev_window));
            tokio::try_join!(
                store.count(&prev[0]),
                store.count(&prev[1]),
                store.count(&prev[2]),
            )?
        }
        None => (0, 0, 0),
    };

    debug!(curr_all, prev_all, "signup window counts");

    let aggregate = pct(curr_all, prev_all);
    Ok(SummaryResponse {
        total_users,
        total_teachers,
        total_students,
        weekly_signups: curr_all,
        deltas: Deltas {
            users: aggregate,
            teachers: pct(curr_teachers, prev_teachers),
            students: pct(curr_students, prev_students),
            weekly_signups: aggregate,
        },
    })
}

pub async fn daily_signups(
    store: &dyn UserStore,
    window: DateRange,
    interval: &str,
) -> StoreResult<Vec<DailyCount>> {
    if interval != DAY_INTERVAL {
        return Ok(Vec::new());
    }
    store.daily_counts(window).await
}
