use time::{
    format_description::{well_known::Rfc3339, FormatItem},
    macros::format_description,
    Date, OffsetDateTime, PrimitiveDateTime,
};

const DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
const DATE_TIME: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]");

/// Earliest year a Postgres `timestamptz` can hold (4713 BC).
const MIN_STORABLE_YEAR: i32 = -4712;

/// Lenient ISO parsing: RFC 3339, an offset-less date-time (taken as UTC), or a
/// bare date (UTC midnight). Anything else, including instants too far in the
/// past to store, is `None`.
pub fn parse_date(s: Option<&str>) -> Option<OffsetDateTime> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    parse_iso(s).filter(|t| t.year() >= MIN_STORABLE_YEAR)
}

fn parse_iso(s: &str) -> Option<OffsetDateTime> {
    if let Ok(t) = OffsetDateTime::parse(s, &Rfc3339) {
        return Some(t);
    }
    if let Ok(t) = PrimitiveDateTime::parse(s, DATE_TIME) {
        return Some(t.assume_utc());
    }
    Date::parse(s, DATE).ok().map(|d| d.midnight().assume_utc())
}

/// Inclusive `createdAt` bounds; a missing side is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<OffsetDateTime>,
    pub end: Option<OffsetDateTime>,
}

impl DateRange {
    pub fn between(start: OffsetDateTime, end: OffsetDateTime) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn contains(&self, t: OffsetDateTime) -> bool {
        self.start.map_or(true, |s| t >= s) && self.end.map_or(true, |e| t <= e)
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}
