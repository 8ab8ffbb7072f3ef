use crate::event::CanonicalEvent;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

// --- query request -----------------------------------------------------

/// Body of a database query: an `and` filter over the `Date` property plus
/// an optional continuation cursor.
#[derive(Debug, Clone, Serialize)]
pub struct QueryBody {
    pub filter: AndFilter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AndFilter {
    pub and: Vec<DateCondition>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DateCondition {
    pub property: String,
    pub date: DateBound,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DateBound {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_or_after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
}

impl QueryBody {
    /// Filter to records whose date falls in `[from, to)`.
    pub fn window(from: DateTime<FixedOffset>, to: DateTime<FixedOffset>) -> Self {
        Self {
            filter: AndFilter {
                and: vec![
                    DateCondition {
                        property: "Date".to_string(),
                        date: DateBound {
                            on_or_after: Some(from.to_rfc3339()),
                            ..Default::default()
                        },
                    },
                    DateCondition {
                        property: "Date".to_string(),
                        date: DateBound {
                            before: Some(to.to_rfc3339()),
                            ..Default::default()
                        },
                    },
                ],
            },
            start_cursor: None,
        }
    }
}

// --- query response ----------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<Page>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub properties: PageProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageProperties {
    #[serde(rename = "Name", default)]
    pub name: TitleProperty,
    #[serde(rename = "Date", default)]
    pub date: DateProperty,
    #[serde(rename = "ID", default)]
    pub external_id: RichTextProperty,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TitleProperty {
    #[serde(default)]
    pub title: Vec<TextFragment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RichTextProperty {
    #[serde(default)]
    pub rich_text: Vec<TextFragment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextFragment {
    #[serde(default)]
    pub plain_text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateProperty {
    pub date: Option<DateValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateValue {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
}

// --- mutations ---------------------------------------------------------

/// Body for page create (with parent) and page update (without).
#[derive(Debug, Clone, Serialize)]
pub struct PageWrite {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentRef>,
    pub properties: WriteProperties,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParentRef {
    pub database_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WriteProperties {
    #[serde(rename = "Name")]
    pub name: TitleWrite,
    #[serde(rename = "Date")]
    pub date: DateWrite,
    /// Present on create only; the external id is immutable once set and
    /// updates never re-write it
    #[serde(rename = "ID", skip_serializing_if = "Option::is_none")]
    pub external_id: Option<RichTextWrite>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TitleWrite {
    pub title: Vec<TextWrite>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RichTextWrite {
    pub rich_text: Vec<TextWrite>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextWrite {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: TextContent,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextContent {
    pub content: String,
}

impl TextWrite {
    pub fn plain(content: &str) -> Self {
        Self {
            kind: "text".to_string(),
            text: TextContent {
                content: content.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DateWrite {
    pub date: DateValueWrite,
}

/// `end` serializes as an explicit `null` for one-day all-day events; the
/// provider clears a previously stored end that way.
#[derive(Debug, Clone, Serialize)]
pub struct DateValueWrite {
    pub start: String,
    pub end: Option<String>,
}

/// Archive flag patch; never a delete.
#[derive(Debug, Clone, Serialize)]
pub struct ArchivePatch {
    pub archived: bool,
}

impl WriteProperties {
    /// Encode a canonical event into the database's property payload.
    /// All-day events write date-only strings; the one-day case omits the
    /// end entirely; timed events write full RFC 3339 instants.
    pub fn from_event(event: &CanonicalEvent) -> Self {
        let (start, end) = if event.all_day {
            let end = if event.one_day {
                None
            } else {
                Some(event.end.format("%Y-%m-%d").to_string())
            };
            (event.start.format("%Y-%m-%d").to_string(), end)
        } else {
            (event.start.to_rfc3339(), Some(event.end.to_rfc3339()))
        };

        Self {
            name: TitleWrite {
                title: vec![TextWrite::plain(&event.title)],
            },
            date: DateWrite {
                date: DateValueWrite { start, end },
            },
            external_id: Some(RichTextWrite {
                rich_text: vec![TextWrite::plain(&event.external_id)],
            }),
        }
    }

    /// Payload for patching an existing record: title and date only.
    pub fn for_update(event: &CanonicalEvent) -> Self {
        Self {
            external_id: None,
            ..Self::from_event(event)
        }
    }
}
