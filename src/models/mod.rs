pub mod lead;
pub mod support_request;
pub mod stats;
pub mod page;

pub use lead::*;
pub use support_request::*;
pub use stats::*;
pub use page::*;

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a server timestamp. The API emits either RFC 3339 or a naive
/// ISO-8601 datetime, which is taken to be UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
