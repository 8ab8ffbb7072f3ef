use crate::error::{normalize_error, SyncResult};
use crate::event::{parse_timestamp, DatabaseRecord};
use crate::notion::models::Page;
use chrono::{DateTime, Duration, FixedOffset};
use tracing::debug;

/// Convert a database page into a record, or `None` for an orphan (a page
/// with no external id never participates in matching).
///
/// End boundaries are stored in two shapes and both must line up with the
/// calendar side's inclusive instant: a date-only end is an inclusive date
/// and reads back as end-of-day, and a missing end means the range was open
/// and synthesizes `start + 1 day - 1 s`.
pub fn normalize_page(page: &Page, offset: FixedOffset) -> SyncResult<Option<DatabaseRecord>> {
    let external_id = page
        .properties
        .external_id
        .rich_text
        .first()
        .map(|f| f.plain_text.clone())
        .unwrap_or_default();
    if external_id.is_empty() {
        return Ok(None);
    }

    let title = page
        .properties
        .name
        .title
        .first()
        .map(|f| f.plain_text.clone())
        .unwrap_or_default();

    let date = page
        .properties
        .date
        .date
        .as_ref()
        .ok_or_else(|| normalize_error(&format!("page {} has no date", page.id)))?;

    let start = parse_timestamp(&date.start, offset)?;
    let end = match &date.end {
        Some(end) => match DateTime::parse_from_rfc3339(end) {
            Ok(dt) => dt,
            // Date-only end: inclusive date, so midnight would read back
            // 86399 s short of the canonical end
            Err(_) => parse_timestamp(end, offset)? + Duration::days(1) - Duration::seconds(1),
        },
        None => start + Duration::days(1) - Duration::seconds(1),
    };

    Ok(Some(DatabaseRecord {
        record_id: page.id.clone(),
        external_id,
        title,
        start,
        end,
        archived: page.archived,
    }))
}

/// Convert a full query listing into records. Orphans are dropped, but a
/// malformed page is fatal for the run: matching against an index missing a
/// live record would issue a duplicate create on the next sweep.
pub fn collect_records(pages: &[Page], offset: FixedOffset) -> SyncResult<Vec<DatabaseRecord>> {
    let mut records = Vec::with_capacity(pages.len());
    for page in pages {
        match normalize_page(page, offset)? {
            Some(record) => records.push(record),
            None => debug!("Skipping orphan page {}", page.id),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{CanonicalEvent, ResponseStatus};
    use crate::notion::models::{
        DateProperty, DateValue, PageProperties, RichTextProperty, TextFragment, TitleProperty,
        WriteProperties,
    };
    use crate::window::reference_offset;

    fn page(external_id: &str, start: &str, end: Option<&str>) -> Page {
        Page {
            id: "page-1".to_string(),
            archived: false,
            properties: PageProperties {
                name: TitleProperty {
                    title: vec![TextFragment {
                        plain_text: "Standup".to_string(),
                    }],
                },
                date: DateProperty {
                    date: Some(DateValue {
                        start: start.to_string(),
                        end: end.map(str::to_string),
                    }),
                },
                external_id: RichTextProperty {
                    rich_text: if external_id.is_empty() {
                        Vec::new()
                    } else {
                        vec![TextFragment {
                            plain_text: external_id.to_string(),
                        }]
                    },
                },
            },
        }
    }

    #[test]
    fn page_without_external_id_is_an_orphan() {
        let record = normalize_page(
            &page("", "2024-01-10T09:00:00+09:00", None),
            reference_offset(),
        )
        .unwrap();
        assert!(record.is_none());
    }

    #[test]
    fn missing_end_synthesizes_one_day_minus_a_second() {
        let record = normalize_page(&page("E1", "2024-01-10", None), reference_offset())
            .unwrap()
            .unwrap();

        assert_eq!(record.start.to_rfc3339(), "2024-01-10T00:00:00+09:00");
        assert_eq!(record.end.to_rfc3339(), "2024-01-10T23:59:59+09:00");
    }

    #[test]
    fn explicit_range_is_preserved() {
        let record = normalize_page(
            &page(
                "E1",
                "2024-01-10T09:00:00+09:00",
                Some("2024-01-10T09:30:00+09:00"),
            ),
            reference_offset(),
        )
        .unwrap()
        .unwrap();

        assert_eq!(record.external_id, "E1");
        assert_eq!(record.title, "Standup");
        assert_eq!(record.end.to_rfc3339(), "2024-01-10T09:30:00+09:00");
    }

    #[test]
    fn unparseable_date_is_a_normalization_error() {
        assert!(normalize_page(&page("E1", "whenever", None), reference_offset()).is_err());
    }

    #[test]
    fn date_only_end_reads_back_as_end_of_day() {
        let record = normalize_page(
            &page("E1", "2024-01-10", Some("2024-01-12")),
            reference_offset(),
        )
        .unwrap()
        .unwrap();

        assert_eq!(record.end.to_rfc3339(), "2024-01-12T23:59:59+09:00");
    }

    #[test]
    fn multi_day_all_day_write_round_trips_unchanged() {
        // A Jan 10-12 all-day event is written with inclusive dates; read
        // back, it must compare equal or every run would re-update it.
        let event = CanonicalEvent {
            external_id: "E1".to_string(),
            title: "Standup".to_string(),
            start: DateTime::parse_from_rfc3339("2024-01-10T00:00:00+09:00").unwrap(),
            end: DateTime::parse_from_rfc3339("2024-01-12T23:59:59+09:00").unwrap(),
            all_day: true,
            one_day: false,
            response_status: ResponseStatus::Accepted,
        };
        let props = serde_json::to_value(WriteProperties::from_event(&event)).unwrap();
        let stored = page(
            "E1",
            props["Date"]["date"]["start"].as_str().unwrap(),
            props["Date"]["date"]["end"].as_str(),
        );

        let record = normalize_page(&stored, reference_offset()).unwrap().unwrap();
        assert!(event.matches(&record));
    }

    #[test]
    fn malformed_page_aborts_collection() {
        let pages = vec![
            page("E1", "2024-01-10", None),
            page("E2", "whenever", None),
        ];

        assert!(collect_records(&pages, reference_offset()).is_err());
    }

    #[test]
    fn orphans_are_dropped_from_collection() {
        let pages = vec![
            page("", "2024-01-10", None),
            page("E1", "2024-01-11", None),
        ];

        let records = collect_records(&pages, reference_offset()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].external_id, "E1");
    }
}
