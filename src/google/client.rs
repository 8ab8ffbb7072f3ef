use crate::error::{google_calendar_error, SyncResult};
use crate::event::CanonicalEvent;
use crate::google::models::{EventListResponse, RawEvent};
use crate::google::normalize::normalize_events;
use crate::reconcile::CalendarSource;
use crate::window::reference_offset;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest::Client;
use tracing::{info, warn};
use url::Url;

/// Listing cap per calendar. A single page is requested; listings larger
/// than this are truncated, a known limitation of the job.
pub const MAX_RESULTS: usize = 2500;

const EVENTS_URL: &str = "https://www.googleapis.com/calendar/v3/calendars";

/// Read-only client for the Google Calendar events API.
pub struct CalendarClient {
    client: Client,
    access_token: String,
}

impl CalendarClient {
    pub fn new(client: Client, access_token: String) -> Self {
        Self {
            client,
            access_token,
        }
    }

    /// List events in `[from, to)`, recurring instances pre-expanded and
    /// sorted by start time. Any failure here aborts the whole run; a
    /// partially listed calendar must not feed the reconciler.
    pub async fn list_events(
        &self,
        calendar_id: &str,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> SyncResult<Vec<RawEvent>> {
        if from >= to {
            return Err(google_calendar_error(&format!(
                "Invalid listing range: {} >= {}",
                from, to
            )));
        }

        let mut url = Url::parse(&format!("{}/{}/events", EVENTS_URL, calendar_id))
            .map_err(|e| google_calendar_error(&format!("Failed to parse URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("timeMin", &from.to_rfc3339())
            .append_pair("timeMax", &to.to_rfc3339())
            .append_pair("singleEvents", "true")
            .append_pair("orderBy", "startTime")
            .append_pair("maxResults", &MAX_RESULTS.to_string());

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to fetch events: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(google_calendar_error(&format!(
                "Failed to fetch events: HTTP {} - {}",
                status, error_body
            )));
        }

        let body: EventListResponse = response
            .json()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to parse events response: {}", e)))?;

        if body.items.len() >= MAX_RESULTS {
            warn!(
                "Calendar {} returned {} events, listing may be truncated",
                calendar_id,
                body.items.len()
            );
        }

        Ok(body.items)
    }
}

#[async_trait]
impl CalendarSource for CalendarClient {
    async fn events_in(
        &self,
        calendar_id: &str,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> SyncResult<Vec<CanonicalEvent>> {
        let items = self.list_events(calendar_id, from, to).await?;
        info!("Fetched {} events from calendar {}", items.len(), calendar_id);
        Ok(normalize_events(&items, reference_offset()))
    }
}
