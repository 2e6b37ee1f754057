//! Forecast requests.

use chrono::{Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::metric::MetricKind;
use crate::service::ServiceName;

/// Longest accepted horizon (five years of daily points).
pub const MAX_HORIZON_DAYS: u32 = 1825;

/// Oldest history a request may need to reach back to, relative to its start date.
const MAX_LOOKBACK_MONTHS: u32 = 12;

/// A validated request for one (service, metric) forecast.
///
/// Immutable once built; all validation happens in the constructors so the
/// engine never sees an invalid request. Deserialization goes through
/// [`ForecastRequest::new`] as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedForecastRequest")]
pub struct ForecastRequest {
    service: ServiceName,
    metric: MetricKind,
    start_date: NaiveDate,
    horizon_days: u32,
}

#[derive(Deserialize)]
struct UncheckedForecastRequest {
    service: ServiceName,
    metric: MetricKind,
    start_date: NaiveDate,
    horizon_days: i64,
}

impl TryFrom<UncheckedForecastRequest> for ForecastRequest {
    type Error = DomainError;

    fn try_from(raw: UncheckedForecastRequest) -> Result<Self, Self::Error> {
        Self::new(raw.service, raw.metric, raw.start_date, raw.horizon_days)
    }
}

impl ForecastRequest {
    pub fn new(
        service: ServiceName,
        metric: MetricKind,
        start_date: NaiveDate,
        horizon_days: i64,
    ) -> DomainResult<Self> {
        if horizon_days <= 0 {
            return Err(DomainError::validation(format!(
                "horizon must be a positive number of days (got {horizon_days})"
            )));
        }
        if horizon_days > i64::from(MAX_HORIZON_DAYS) {
            return Err(DomainError::validation(format!(
                "horizon must not exceed {MAX_HORIZON_DAYS} days (got {horizon_days})"
            )));
        }

        let reachable_history = start_date.checked_sub_months(Months::new(MAX_LOOKBACK_MONTHS));
        let reachable_end = start_date.checked_add_signed(Duration::days(horizon_days));
        if reachable_history.is_none() || reachable_end.is_none() {
            return Err(DomainError::validation(format!("start date {start_date} is out of range")));
        }

        Ok(Self {
            service,
            metric,
            start_date,
            horizon_days: horizon_days as u32,
        })
    }

    /// Build a request from raw caller input (service name, metric name, ISO-8601 date).
    pub fn parse(service: &str, metric: &str, start_date: &str, horizon_days: i64) -> DomainResult<Self> {
        let service = ServiceName::new(service)?;
        let metric: MetricKind = metric.parse()?;
        let start_date = NaiveDate::parse_from_str(start_date.trim(), "%Y-%m-%d").map_err(|e| {
            DomainError::validation(format!("malformed start date '{start_date}' (expected YYYY-MM-DD): {e}"))
        })?;
        Self::new(service, metric, start_date, horizon_days)
    }

    pub fn service(&self) -> &ServiceName {
        &self.service
    }

    pub fn metric(&self) -> MetricKind {
        self.metric
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn horizon_days(&self) -> u32 {
        self.horizon_days
    }

    /// The same request for another service (used by batch generation).
    pub fn for_service(&self, service: ServiceName) -> Self {
        Self { service, ..self.clone() }
    }

    /// Forecast dates in chronological order, starting at `start_date`.
    pub fn dates(&self) -> impl Iterator<Item = (u32, NaiveDate)> + '_ {
        (0..self.horizon_days).map(move |i| (i, self.start_date + Duration::days(i64::from(i))))
    }
}
