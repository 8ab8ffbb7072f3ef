use crate::error::{normalize_error, SyncResult};
use crate::event::{parse_timestamp, CanonicalEvent, ResponseStatus};
use crate::google::models::{EventDateTime, RawEvent};
use chrono::{DateTime, Duration, FixedOffset};
use tracing::warn;

/// Convert one raw calendar event into its canonical form.
///
/// All-day is detected by a date-only field on both boundaries. The provider
/// reports the all-day end as exclusive (one day past the last day), so a
/// date-only end is pulled back one second to the inclusive instant.
pub fn normalize_event(raw: &RawEvent, offset: FixedOffset) -> SyncResult<CanonicalEvent> {
    if raw.id.is_empty() {
        return Err(normalize_error("event has no id"));
    }

    let title = raw
        .summary
        .clone()
        .ok_or_else(|| normalize_error(&format!("event {} has no summary", raw.id)))?;

    let start_field = raw
        .start
        .as_ref()
        .ok_or_else(|| normalize_error(&format!("event {} has no start", raw.id)))?;
    let end_field = raw
        .end
        .as_ref()
        .ok_or_else(|| normalize_error(&format!("event {} has no end", raw.id)))?;

    let (start, start_is_date) = parse_boundary(&raw.id, start_field, offset)?;
    let (mut end, end_is_date) = parse_boundary(&raw.id, end_field, offset)?;
    if end_is_date {
        end = end - Duration::seconds(1);
    }

    let all_day = start_is_date && end_is_date;
    let one_day = all_day && start.date_naive() == end.date_naive();

    Ok(CanonicalEvent {
        external_id: raw.id.clone(),
        title,
        start,
        end,
        all_day,
        one_day,
        response_status: self_response(raw),
    })
}

/// Normalize a whole listing, dropping events that fail normalization so a
/// single malformed entry cannot abort the run.
pub fn normalize_events(items: &[RawEvent], offset: FixedOffset) -> Vec<CanonicalEvent> {
    let mut events = Vec::with_capacity(items.len());
    for raw in items {
        match normalize_event(raw, offset) {
            Ok(event) => events.push(event),
            Err(e) => warn!("Skipping malformed calendar event: {}", e),
        }
    }
    events
}

fn parse_boundary(
    event_id: &str,
    field: &EventDateTime,
    offset: FixedOffset,
) -> SyncResult<(DateTime<FixedOffset>, bool)> {
    if let Some(dt) = &field.date_time {
        Ok((parse_timestamp(dt, offset)?, false))
    } else if let Some(date) = &field.date {
        Ok((parse_timestamp(date, offset)?, true))
    } else {
        Err(normalize_error(&format!(
            "event {} has an empty date field",
            event_id
        )))
    }
}

/// Response status of the attendee marked as self; absence means the owner
/// created the event and it counts as accepted.
fn self_response(raw: &RawEvent) -> ResponseStatus {
    for attendee in &raw.attendees {
        if attendee.is_self {
            return attendee
                .response_status
                .as_deref()
                .map(ResponseStatus::from_provider)
                .unwrap_or(ResponseStatus::Accepted);
        }
    }
    ResponseStatus::Accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::models::Attendee;
    use crate::window::reference_offset;

    fn timed(start: &str, end: &str) -> RawEvent {
        RawEvent {
            id: "E1".to_string(),
            summary: Some("Standup".to_string()),
            start: Some(EventDateTime {
                date_time: Some(start.to_string()),
                date: None,
            }),
            end: Some(EventDateTime {
                date_time: Some(end.to_string()),
                date: None,
            }),
            attendees: Vec::new(),
        }
    }

    fn all_day(start: &str, end: &str) -> RawEvent {
        RawEvent {
            id: "E2".to_string(),
            summary: Some("Offsite".to_string()),
            start: Some(EventDateTime {
                date_time: None,
                date: Some(start.to_string()),
            }),
            end: Some(EventDateTime {
                date_time: None,
                date: Some(end.to_string()),
            }),
            attendees: Vec::new(),
        }
    }

    #[test]
    fn timed_event_keeps_exact_boundaries() {
        let event = normalize_event(
            &timed("2024-01-10T09:00:00+09:00", "2024-01-10T09:30:00+09:00"),
            reference_offset(),
        )
        .unwrap();

        assert!(!event.all_day);
        assert!(!event.one_day);
        assert_eq!(event.start.to_rfc3339(), "2024-01-10T09:00:00+09:00");
        assert_eq!(event.end.to_rfc3339(), "2024-01-10T09:30:00+09:00");
    }

    #[test]
    fn one_day_all_day_event_detected_from_exclusive_end() {
        // Google reports a single-day all-day event as [Jan 10, Jan 11)
        let event =
            normalize_event(&all_day("2024-01-10", "2024-01-11"), reference_offset()).unwrap();

        assert!(event.all_day);
        assert!(event.one_day);
        assert_eq!(event.end.to_rfc3339(), "2024-01-10T23:59:59+09:00");
    }

    #[test]
    fn multi_day_all_day_event_gets_inclusive_end() {
        let event =
            normalize_event(&all_day("2024-01-10", "2024-01-13"), reference_offset()).unwrap();

        assert!(event.all_day);
        assert!(!event.one_day);
        assert_eq!(event.end.date_naive().to_string(), "2024-01-12");
    }

    #[test]
    fn self_attendee_status_wins() {
        let mut raw = timed("2024-01-10T09:00:00+09:00", "2024-01-10T09:30:00+09:00");
        raw.attendees = vec![
            Attendee {
                is_self: false,
                response_status: Some("accepted".to_string()),
            },
            Attendee {
                is_self: true,
                response_status: Some("declined".to_string()),
            },
        ];

        let event = normalize_event(&raw, reference_offset()).unwrap();
        assert!(event.is_declined());
    }

    #[test]
    fn missing_self_attendee_defaults_to_accepted() {
        let event = normalize_event(
            &timed("2024-01-10T09:00:00+09:00", "2024-01-10T09:30:00+09:00"),
            reference_offset(),
        )
        .unwrap();
        assert_eq!(event.response_status, ResponseStatus::Accepted);
    }

    #[test]
    fn malformed_event_is_skipped_not_fatal() {
        let mut bad = timed("2024-01-10T09:00:00+09:00", "2024-01-10T09:30:00+09:00");
        bad.summary = None;
        let good = timed("2024-01-11T09:00:00+09:00", "2024-01-11T09:30:00+09:00");

        let events = normalize_events(&[bad, good], reference_offset());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start.to_rfc3339(), "2024-01-11T09:00:00+09:00");
    }
}
