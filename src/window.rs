use chrono::{DateTime, Duration, FixedOffset, Utc};

/// Fixed reference offset for the whole job (UTC+9)
pub const REFERENCE_OFFSET_HOURS: i32 = 9;

/// The time range a single run reconciles over.
///
/// The database query uses `[query_from, query_to)` so records whose range
/// started before `now` still land in the match index. The calendar query
/// always starts at `now`; only future-facing calendar changes need to
/// propagate, the lookback exists purely to widen the matching net.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub now: DateTime<FixedOffset>,
    pub query_from: DateTime<FixedOffset>,
    pub query_to: DateTime<FixedOffset>,
    pub calendar_from: DateTime<FixedOffset>,
    pub calendar_to: DateTime<FixedOffset>,
}

impl TimeWindow {
    /// Compute the window around `now`. Pure, no failure modes.
    pub fn compute(now: DateTime<FixedOffset>, lookback: Duration, horizon: Duration) -> Self {
        let query_to = now + horizon;
        Self {
            now,
            query_from: now - lookback,
            query_to,
            calendar_from: now,
            calendar_to: query_to,
        }
    }
}

/// Current instant carried in the fixed reference offset.
pub fn reference_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&reference_offset())
}

/// The UTC+9 reference offset.
pub fn reference_offset() -> FixedOffset {
    FixedOffset::east_opt(REFERENCE_OFFSET_HOURS * 3600).expect("valid UTC+9 offset")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-01-10T12:00:00+09:00").unwrap()
    }

    #[test]
    fn window_applies_lookback_and_horizon() {
        let window = TimeWindow::compute(fixed_now(), Duration::days(30), Duration::days(90));

        assert_eq!(
            window.query_from,
            DateTime::parse_from_rfc3339("2023-12-11T12:00:00+09:00").unwrap()
        );
        assert_eq!(
            window.query_to,
            DateTime::parse_from_rfc3339("2024-04-09T12:00:00+09:00").unwrap()
        );
    }

    #[test]
    fn calendar_range_starts_at_now_regardless_of_lookback() {
        let window = TimeWindow::compute(fixed_now(), Duration::days(30), Duration::days(90));

        assert_eq!(window.calendar_from, window.now);
        assert_eq!(window.calendar_to, window.query_to);
    }

    #[test]
    fn zero_lookback_mode_queries_from_now() {
        let window = TimeWindow::compute(fixed_now(), Duration::days(0), Duration::days(90));

        assert_eq!(window.query_from, window.now);
    }
}
