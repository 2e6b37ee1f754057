//! Historical query windows.

use chrono::{Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::error::{DomainError, DomainResult};
use crate::metric::MetricKind;
use crate::service::ServiceName;

/// Half-open `[start, end)` range of historical data for one service and metric.
///
/// A query parameter object; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoricalWindow {
    service: ServiceName,
    metric: MetricKind,
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl HistoricalWindow {
    pub fn new(
        service: ServiceName,
        metric: MetricKind,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> DomainResult<Self> {
        if start >= end {
            return Err(DomainError::validation(format!(
                "historical window start ({start}) must be before its end ({end})"
            )));
        }
        Ok(Self { service, metric, start, end })
    }

    /// The `months`-long window ending at midnight of `anchor`.
    ///
    /// Saturates at the earliest representable date.
    pub fn preceding(service: ServiceName, metric: MetricKind, anchor: NaiveDate, months: u32) -> Self {
        let end = anchor.and_time(NaiveTime::MIN);
        let start = end
            .checked_sub_months(Months::new(months.max(1)))
            .unwrap_or(NaiveDateTime::MIN);
        Self { service, metric, start, end }
    }

    pub fn service(&self) -> &ServiceName {
        &self.service
    }

    pub fn metric(&self) -> MetricKind {
        self.metric
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Whole days covered by the window (at least 1).
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days().max(1)
    }

    /// The first `months` of the window, clipped to the window end.
    pub fn leading(&self, months: u32) -> Self {
        let end = self
            .start
            .checked_add_months(Months::new(months))
            .map_or(self.end, |e| e.min(self.end));
        Self { end, ..self.clone() }
    }

    /// The last `months` of the window, clipped to the window start.
    pub fn trailing(&self, months: u32) -> Self {
        let start = self
            .end
            .checked_sub_months(Months::new(months))
            .map_or(self.start, |s| s.max(self.start));
        Self { start, ..self.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emergency() -> ServiceName {
        ServiceName::new("Emergency").unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn preceding_three_months_spans_roughly_ninety_days() {
        let w = HistoricalWindow::preceding(emergency(), MetricKind::Cost, date(2025, 1, 15), 3);
        assert_eq!(w.start().date(), date(2024, 10, 15));
        assert_eq!(w.end().date(), date(2025, 1, 15));
        assert_eq!(w.days(), 92);
    }

    #[test]
    fn sub_windows_are_clipped_to_the_parent() {
        let w = HistoricalWindow::preceding(emergency(), MetricKind::Cost, date(2025, 1, 15), 3);

        let older = w.leading(1);
        assert_eq!(older.start(), w.start());
        assert_eq!(older.end().date(), date(2024, 11, 15));

        let recent = w.trailing(1);
        assert_eq!(recent.start().date(), date(2024, 12, 15));
        assert_eq!(recent.end(), w.end());

        let everything = w.leading(12);
        assert_eq!(everything.end(), w.end());
    }

    #[test]
    fn empty_window_is_rejected() {
        let t = date(2025, 1, 1).and_time(NaiveTime::MIN);
        assert!(HistoricalWindow::new(emergency(), MetricKind::Cost, t, t).is_err());
    }
}
