use crate::error::{normalize_error, SyncResult};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};

/// Self-attendee response on the calendar side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Accepted,
    Declined,
    Tentative,
    NeedsAction,
    None,
}

impl ResponseStatus {
    /// Map a provider response string. Unknown values carry no signal.
    pub fn from_provider(value: &str) -> Self {
        match value {
            "accepted" => ResponseStatus::Accepted,
            "declined" => ResponseStatus::Declined,
            "tentative" => ResponseStatus::Tentative,
            "needsAction" => ResponseStatus::NeedsAction,
            _ => ResponseStatus::None,
        }
    }
}

/// Normalized, provider-agnostic calendar event. Rebuilt from the live
/// calendar listing every run; `external_id` is the only persistent identity.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalEvent {
    pub external_id: String,
    pub title: String,
    pub start: DateTime<FixedOffset>,
    /// Inclusive end. For all-day events the provider's exclusive boundary
    /// has already been pulled back by one second.
    pub end: DateTime<FixedOffset>,
    pub all_day: bool,
    /// All-day event starting and ending on the same date; written to the
    /// database without an explicit end.
    pub one_day: bool,
    pub response_status: ResponseStatus,
}

impl CanonicalEvent {
    pub fn is_declined(&self) -> bool {
        self.response_status == ResponseStatus::Declined
    }

    /// Instant-level equality against a database record. Epoch comparison,
    /// so equivalent timestamps in different textual offsets are unchanged.
    pub fn matches(&self, record: &DatabaseRecord) -> bool {
        self.title == record.title
            && self.start.timestamp() == record.start.timestamp()
            && self.end.timestamp() == record.end.timestamp()
    }
}

/// A row on the database side: a projection of a calendar event that must
/// converge to match it or be archived. Never hard-deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseRecord {
    /// Opaque handle owned by the database provider
    pub record_id: String,
    /// Join key back to the calendar side
    pub external_id: String,
    pub title: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub archived: bool,
}

/// Parse a provider timestamp that is either a full RFC 3339 instant or a
/// bare `YYYY-MM-DD` date; date-only values become midnight in the
/// reference offset.
pub fn parse_timestamp(value: &str, offset: FixedOffset) -> SyncResult<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt);
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| normalize_error(&format!("Unparseable timestamp '{}': {}", value, e)))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| normalize_error(&format!("Invalid date '{}'", value)))?;

    match offset.from_local_datetime(&midnight) {
        chrono::LocalResult::Single(dt) => Ok(dt),
        _ => Err(normalize_error(&format!(
            "Ambiguous midnight for '{}'",
            value
        ))),
    }
}
