use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a heartbeat timestamp string into UTC.
///
/// Workers are not consistent about how they format timestamps, so three
/// formats are accepted, tried in order:
/// 1. RFC 3339 (`2024-01-15T10:30:00+00:00`)
/// 2. Naive with fractional seconds (`2024-01-15T10:30:00.123456`)
/// 3. The first 19 characters as `%Y-%m-%dT%H:%M:%S`, ignoring any trailing
///    fraction or offset the other formats could not digest
///
/// Naive timestamps are taken as UTC. Returns `None` when no format matches.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }

    // Truncated fallback. `get` keeps this total on multi-byte input.
    let head = raw.get(..19)?;
    NaiveDateTime::parse_from_str(head, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
