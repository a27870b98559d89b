// src/feed/time.rs
//! Lenient timestamp normalization for feed dates.
//!
//! Feeds carry dates in whatever shape their generator felt like emitting.
//! `parse_time` walks a fixed list of layouts and returns the first one that
//! parses, converted to UTC. Anything unparseable yields `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

type Layout = fn(&str) -> Option<DateTime<Utc>>;

/// Tried in order; first success wins.
const LAYOUTS: &[Layout] = &[
    rfc2822,
    rfc3339,
    iso_local,
    sql_local,
    rfc2822_any_zone,
    date_only,
];

/// Parse a published/updated timestamp into a UTC instant.
///
/// Empty or unrecognized input yields `None`; callers keep the entry and treat
/// it as undated.
pub fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    LAYOUTS.iter().find_map(|layout| layout(s))
}

fn rfc2822(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn iso_local(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|n| n.and_utc())
}

fn sql_local(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|n| n.and_utc())
}

/// RFC 2822 shape whose zone is an abbreviation chrono does not know
/// (`CEST`, `IST`, ...). The zone is read as a zero offset.
fn rfc2822_any_zone(s: &str) -> Option<DateTime<Utc>> {
    let (head, zone) = s.rsplit_once(char::is_whitespace)?;
    if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let head = head.trim_end();
    ["%a, %d %b %Y %H:%M:%S", "%d %b %Y %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(head, fmt).ok())
        .map(|n| n.and_utc())
}

fn date_only(s: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|n| n.and_utc())
}
