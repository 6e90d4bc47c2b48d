use time::{Duration, OffsetDateTime};

use crate::dates::parse_date;

pub const DEFAULT_WINDOW: Duration = Duration::days(7);

/// Percent change from `prev` to `curr`, rounded to two decimals with halves
/// going up (so `-12.345` becomes `-12.34`).
/// An empty previous window counts as 100% growth when anything arrived.
pub fn pct(curr: u64, prev: u64) -> f64 {
    if prev == 0 {
        return if curr > 0 { 100.0 } else { 0.0 };
    }
    round2((curr as f64 - prev as f64) / prev as f64 * 100.0)
}

fn round2(x: f64) -> f64 {
    (x * 100.0 + 0.5).floor() / 100.0
}

/// Window of the same length ending 1ms before `start`. `None` when it
/// would reach before the earliest representable instant.
pub fn previous_window(
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> Option<(OffsetDateTime, OffsetDateTime)> {
    let prev_end = start.checked_sub(Duration::milliseconds(1))?;
    let prev_start = prev_end.checked_sub(end - start)?;
    Some((prev_start, prev_end))
}

/// Current window from optional query bounds: `end` defaults to `now`,
/// `start` to seven days before `end`. An `end` too early to have a
/// default window before it is ignored.
pub fn resolve(
    start: Option<&str>,
    end: Option<&str>,
    now: OffsetDateTime,
) -> (OffsetDateTime, OffsetDateTime) {
    let end = parse_date(end)
        .filter(|e| e.checked_sub(DEFAULT_WINDOW).is_some())
        .unwrap_or(now);
    let start = parse_date(start)
        .or_else(|| end.checked_sub(DEFAULT_WINDOW))
        .unwrap_or(end);
    (start, end)
}
