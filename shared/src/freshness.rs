//! "New" badge classification and posted-date handling.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

use crate::{FRESHNESS_WINDOW_MS, INVALID_DATE_LABEL};

/// Whether a record posted at `posted_at` counts as new at `now`.
///
/// The distance is absolute, so a post dated slightly in the future is new
/// as well. Records without a usable date are never new.
#[must_use]
pub fn is_new(posted_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    is_new_within(posted_at, now, FRESHNESS_WINDOW_MS)
}

#[must_use]
pub fn is_new_within(posted_at: Option<DateTime<Utc>>, now: DateTime<Utc>, window_ms: i64) -> bool {
    let Some(posted_at) = posted_at else {
        return false;
    };
    now.signed_duration_since(posted_at)
        .num_milliseconds()
        .checked_abs()
        .is_some_and(|distance| distance <= window_ms)
}

/// Parses RFC 3339 timestamps, offset-less date-times and plain dates.
/// Offset-less values are read as UTC.
#[must_use]
pub fn parse_posted_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// German short date (`d.m.yyyy`), shifted into the display offset.
#[must_use]
pub fn format_posted_date(posted_at: Option<DateTime<Utc>>, offset: FixedOffset) -> String {
    posted_at.map_or_else(
        || INVALID_DATE_LABEL.to_string(),
        |posted_at| posted_at.with_timezone(&offset).format("%-d.%-m.%Y").to_string(),
    )
}
