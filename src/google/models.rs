use serde::Deserialize;

/// Response shape of the events list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListResponse {
    #[serde(default)]
    pub items: Vec<RawEvent>,
}

/// A single event as Google returns it, before normalization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub summary: Option<String>,
    pub start: Option<EventDateTime>,
    pub end: Option<EventDateTime>,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
}

/// Google's date-or-datetime union: exactly one of the two fields is set.
/// `date` (all-day) carries `YYYY-MM-DD`; `date_time` carries RFC 3339.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    pub date_time: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    #[serde(rename = "self", default)]
    pub is_self: bool,
    #[serde(default)]
    pub response_status: Option<String>,
}
