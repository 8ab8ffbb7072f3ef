use crate::error::{notion_error, Error, SyncResult};
use crate::event::{CanonicalEvent, DatabaseRecord};
use crate::notion::models::{ArchivePatch, Page, PageWrite, ParentRef, QueryBody, QueryResponse, WriteProperties};
use crate::notion::normalize::collect_records;
use crate::reconcile::RecordStore;
use crate::retry::{with_retry, RetryPolicy};
use crate::window::reference_offset;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest::Client;
use std::future::Future;
use tracing::{debug, info};

/// Version header required by the Notion API
pub const NOTION_VERSION: &str = "2022-02-22";

const BASE_URL: &str = "https://api.notion.com/v1";

/// Client for the Notion database holding the mirrored records.
pub struct NotionClient {
    client: Client,
    token: String,
    database_id: String,
    retry: RetryPolicy,
}

impl NotionClient {
    pub fn new(client: Client, token: String, database_id: String) -> Self {
        Self {
            client,
            token,
            database_id,
            retry: RetryPolicy::default(),
        }
    }

    /// Query all pages whose date falls in `[from, to)`, following
    /// continuation cursors to exhaustion. Matching must never run against
    /// a partial index, so a large window can not silently lose records.
    pub async fn query_window(
        &self,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> SyncResult<Vec<Page>> {
        let body = QueryBody::window(from, to);

        drain_query_pages(|cursor| {
            let mut body = body.clone();
            body.start_cursor = cursor;
            async move {
                let response = self
                    .client
                    .post(format!("{}/databases/{}/query", BASE_URL, self.database_id))
                    .bearer_auth(&self.token)
                    .header("Notion-Version", NOTION_VERSION)
                    .json(&body)
                    .send()
                    .await?;

                if !response.status().is_success() {
                    return Err(status_error(response).await);
                }

                response.json::<QueryResponse>().await.map_err(Error::from)
            }
        })
        .await
    }

    /// Insert a new record for the event, parented to the database.
    pub async fn create(&self, event: &CanonicalEvent) -> SyncResult<String> {
        let body = PageWrite {
            parent: Some(ParentRef {
                database_id: self.database_id.clone(),
            }),
            properties: WriteProperties::from_event(event),
        };

        let page: Page = with_retry(&self.retry, "create page", || {
            let body = &body;
            async move {
                let response = self
                    .client
                    .post(format!("{}/pages", BASE_URL))
                    .bearer_auth(&self.token)
                    .header("Notion-Version", NOTION_VERSION)
                    .json(body)
                    .send()
                    .await?;

                if !response.status().is_success() {
                    return Err(status_error(response).await);
                }

                response.json::<Page>().await.map_err(Error::from)
            }
        })
        .await?;

        debug!("Created page {} for event {}", page.id, event.external_id);
        Ok(page.id)
    }

    /// Overwrite title and date range on an existing record. The external
    /// id is immutable once set and is not part of the patch.
    pub async fn update(&self, record_id: &str, event: &CanonicalEvent) -> SyncResult<()> {
        let body = PageWrite {
            parent: None,
            properties: WriteProperties::for_update(event),
        };

        self.patch(record_id, "update page", &body).await
    }

    /// Soft-delete a record by setting its archived flag.
    pub async fn archive(&self, record_id: &str) -> SyncResult<()> {
        self.patch(record_id, "archive page", &ArchivePatch { archived: true })
            .await
    }

    async fn patch<B: serde::Serialize + Sync>(
        &self,
        record_id: &str,
        name: &str,
        body: &B,
    ) -> SyncResult<()> {
        with_retry(&self.retry, name, || async move {
            let response = self
                .client
                .patch(format!("{}/pages/{}", BASE_URL, record_id))
                .bearer_auth(&self.token)
                .header("Notion-Version", NOTION_VERSION)
                .json(body)
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(status_error(response).await);
            }

            Ok(())
        })
        .await
    }
}

async fn status_error(response: reqwest::Response) -> Error {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Could not read error response".to_string());
    Error::NotionStatus { status, body }
}

/// Follow `has_more`/`next_cursor` until the provider signals no more pages.
/// Factored over the page fetcher so the cursor loop is testable without a
/// live endpoint.
pub async fn drain_query_pages<F, Fut>(mut fetch_page: F) -> SyncResult<Vec<Page>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = SyncResult<QueryResponse>>,
{
    let mut pages = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let response = fetch_page(cursor.take()).await?;
        pages.extend(response.results);

        if !response.has_more {
            break;
        }
        match response.next_cursor {
            Some(next) => cursor = Some(next),
            // has_more without a cursor would loop forever on page one
            None => {
                return Err(notion_error(
                    "Query response sets has_more without a next_cursor",
                ))
            }
        }
    }

    Ok(pages)
}

#[async_trait]
impl RecordStore for NotionClient {
    async fn records_in(
        &self,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> SyncResult<Vec<DatabaseRecord>> {
        let pages = self.query_window(from, to).await?;
        info!("Fetched {} database pages", pages.len());

        // A malformed page is fatal here: an index missing a live record
        // would make the sweep create a duplicate
        collect_records(&pages, reference_offset())
    }

    async fn create(&self, event: &CanonicalEvent) -> SyncResult<String> {
        NotionClient::create(self, event).await
    }

    async fn update(&self, record_id: &str, event: &CanonicalEvent) -> SyncResult<()> {
        NotionClient::update(self, record_id, event).await
    }

    async fn archive(&self, record_id: &str) -> SyncResult<()> {
        NotionClient::archive(self, record_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(id: &str) -> Page {
        Page {
            id: id.to_string(),
            ..Default::default()
        }
    }

    fn page_batch(prefix: &str, count: usize) -> Vec<Page> {
        (0..count).map(|i| page(&format!("{}-{}", prefix, i))).collect()
    }

    #[tokio::test]
    async fn drains_every_page_before_returning() {
        let responses = vec![
            QueryResponse {
                results: page_batch("a", 100),
                has_more: true,
                next_cursor: Some("cursor-1".to_string()),
            },
            QueryResponse {
                results: page_batch("b", 100),
                has_more: true,
                next_cursor: Some("cursor-2".to_string()),
            },
            QueryResponse {
                results: page_batch("c", 100),
                has_more: false,
                next_cursor: None,
            },
        ];

        let mut seen_cursors = Vec::new();
        let mut remaining = responses.into_iter();
        let pages = drain_query_pages(|cursor| {
            seen_cursors.push(cursor);
            let next = remaining.next().expect("fetched past the last page");
            async move { Ok(next) }
        })
        .await
        .unwrap();

        assert_eq!(pages.len(), 300);
        assert_eq!(
            seen_cursors,
            vec![
                None,
                Some("cursor-1".to_string()),
                Some("cursor-2".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn single_page_listing_needs_one_request() {
        let mut calls = 0;
        let pages = drain_query_pages(|_| {
            calls += 1;
            async {
                Ok(QueryResponse {
                    results: page_batch("a", 3),
                    has_more: false,
                    next_cursor: None,
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(pages.len(), 3);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn has_more_without_cursor_is_an_error() {
        let result = drain_query_pages(|_| async {
            Ok(QueryResponse {
                results: Vec::new(),
                has_more: true,
                next_cursor: None,
            })
        })
        .await;

        assert!(result.is_err());
    }
}
