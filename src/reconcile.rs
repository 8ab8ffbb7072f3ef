use crate::error::SyncResult;
use crate::event::{CanonicalEvent, DatabaseRecord};
use crate::window::TimeWindow;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Calendar side of the reconciliation, already normalized.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Events in `[from, to)` for one calendar, chronological order.
    async fn events_in(
        &self,
        calendar_id: &str,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> SyncResult<Vec<CanonicalEvent>>;
}

/// Database side of the reconciliation.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records whose range falls in `[from, to)`, exhaustively paginated.
    async fn records_in(
        &self,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> SyncResult<Vec<DatabaseRecord>>;

    async fn create(&self, event: &CanonicalEvent) -> SyncResult<String>;
    async fn update(&self, record_id: &str, event: &CanonicalEvent) -> SyncResult<()>;
    async fn archive(&self, record_id: &str) -> SyncResult<()>;
}

/// Counts from a single run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub created: usize,
    pub updated: usize,
    pub archived: usize,
    pub unchanged: usize,
    pub skipped_declined: usize,
}

impl SyncStats {
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.updated == 0 && self.archived == 0
    }
}

/// One reconciliation run: build the match index, sweep every calendar,
/// archive the leftovers. Stateless between runs; each invocation re-derives
/// everything from the live queries.
pub struct Reconciler<'a, C, S> {
    calendar: &'a C,
    store: &'a S,
    calendar_ids: &'a [String],
    window: TimeWindow,
}

impl<'a, C, S> Reconciler<'a, C, S>
where
    C: CalendarSource,
    S: RecordStore,
{
    pub fn new(calendar: &'a C, store: &'a S, calendar_ids: &'a [String], window: TimeWindow) -> Self {
        Self {
            calendar,
            store,
            calendar_ids,
            window,
        }
    }

    pub async fn run(&self) -> SyncResult<SyncStats> {
        // 1. Match index over the full window; the store paginates to
        //    exhaustion before this returns.
        let records = self
            .store
            .records_in(self.window.query_from, self.window.query_to)
            .await?;

        let mut pending: HashMap<String, DatabaseRecord> = HashMap::with_capacity(records.len());
        for record in records {
            match pending.entry(record.external_id.clone()) {
                std::collections::hash_map::Entry::Vacant(slot) => {
                    slot.insert(record);
                }
                std::collections::hash_map::Entry::Occupied(kept) => {
                    // Undefined in the source data; keep the first fetched
                    // record and surface the conflict.
                    warn!(
                        "Duplicate external id {} in database: keeping {}, ignoring {}",
                        kept.key(),
                        kept.get().record_id,
                        record.record_id
                    );
                }
            }
        }
        info!("Built match index with {} records", pending.len());

        let mut stats = SyncStats::default();
        // External ids seen as declined this run. They stay in `pending` so
        // another calendar can still match them, but the archival pass must
        // leave their records alone: declined means ignore, not retract.
        let mut declined: HashSet<String> = HashSet::new();

        // 2. Per-calendar sweep. `pending` is shared across calendars; a
        //    record is only unmatched once every calendar has been swept.
        for calendar_id in self.calendar_ids {
            let events = self
                .calendar
                .events_in(calendar_id, self.window.calendar_from, self.window.calendar_to)
                .await?;
            debug!("Sweeping {} events from {}", events.len(), calendar_id);

            for event in events {
                if event.is_declined() {
                    declined.insert(event.external_id.clone());
                    stats.skipped_declined += 1;
                    continue;
                }

                match pending.remove(&event.external_id) {
                    Some(record) => {
                        if event.matches(&record) {
                            stats.unchanged += 1;
                        } else {
                            self.store.update(&record.record_id, &event).await?;
                            debug!("Updated {} for event {}", record.record_id, event.external_id);
                            stats.updated += 1;
                        }
                    }
                    None => {
                        let record_id = self.store.create(&event).await?;
                        debug!("Created {} for event {}", record_id, event.external_id);
                        stats.created += 1;
                    }
                }
            }
        }

        // 3. Archival pass over whatever no calendar confirmed. Records
        //    whose end already passed were only pulled in by the lookback
        //    for matching; archiving them would be pure churn.
        for record in pending.values() {
            if declined.contains(&record.external_id) {
                continue;
            }
            if record.end.timestamp() < self.window.now.timestamp() {
                continue;
            }
            self.store.archive(&record.record_id).await?;
            debug!("Archived {} ({})", record.record_id, record.external_id);
            stats.archived += 1;
        }

        info!(
            "Run complete: {} created, {} updated, {} archived, {} unchanged, {} declined",
            stats.created, stats.updated, stats.archived, stats.unchanged, stats.skipped_declined
        );
        Ok(stats)
    }
}
