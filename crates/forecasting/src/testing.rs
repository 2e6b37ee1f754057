//! In-process provider stubs for unit tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use careforecast_core::{HistoricalWindow, ServiceName};

use crate::provider::{
    AlertProvider, CapacitySnapshotProvider, ForecastProviders, HistoricalAggregator, InvestmentProvider,
    ProviderError, ProviderResult, StaffingProvider,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn service(name: &str) -> ServiceName {
    ServiceName::new(name).unwrap()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Failures {
    pub historical: bool,
    pub snapshot: bool,
    pub staffing: bool,
    pub investments: bool,
    pub alerts: bool,
}

impl Failures {
    pub fn all() -> Self {
        Self {
            historical: true,
            snapshot: true,
            staffing: true,
            investments: true,
            alerts: true,
        }
    }
}

/// Configurable store implementing every provider trait.
#[derive(Debug, Clone, Default)]
pub struct StubStore {
    fixed_total: Option<f64>,
    daily: Vec<(NaiveDate, f64)>,
    active_stays: u64,
    distinct_patients: u64,
    average_cost: Option<f64>,
    staff: u64,
    investments: Vec<f64>,
    alerts: u64,
    failures: Failures,
    delay: Option<Duration>,
    investment_since: Arc<Mutex<Option<NaiveDateTime>>>,
}

impl StubStore {
    pub fn failing() -> Self {
        Self { failures: Failures::all(), ..Self::default() }
    }

    /// Same total for every window.
    pub fn with_total(mut self, total: f64) -> Self {
        self.fixed_total = Some(total);
        self
    }

    /// Per-day values in `[from, to)`; totals sum the days inside each window.
    pub fn with_daily(mut self, from: NaiveDate, to: NaiveDate, value: impl Fn(NaiveDate) -> f64) -> Self {
        self.daily.extend(from.iter_days().take_while(|d| *d < to).map(|d| (d, value(d))));
        self
    }

    pub fn with_active_stays(mut self, n: u64) -> Self {
        self.active_stays = n;
        self
    }

    pub fn with_distinct_patients(mut self, n: u64) -> Self {
        self.distinct_patients = n;
        self
    }

    pub fn with_average_cost(mut self, cost: f64) -> Self {
        self.average_cost = Some(cost);
        self
    }

    pub fn with_staff(mut self, n: u64) -> Self {
        self.staff = n;
        self
    }

    pub fn with_investments(mut self, amounts: Vec<f64>) -> Self {
        self.investments = amounts;
        self
    }

    pub fn with_alerts(mut self, n: u64) -> Self {
        self.alerts = n;
        self
    }

    pub fn with_failures(mut self, failures: Failures) -> Self {
        self.failures = failures;
        self
    }

    /// Every read sleeps for an hour before answering.
    pub fn slow(mut self) -> Self {
        self.delay = Some(Duration::from_secs(3_600));
        self
    }

    pub fn last_investment_since(&self) -> Option<NaiveDateTime> {
        *self.investment_since.lock().unwrap()
    }

    pub fn into_providers(self) -> ForecastProviders {
        ForecastProviders::from_store(Arc::new(self))
    }

    async fn read<T>(&self, fail: bool, value: impl FnOnce() -> T) -> ProviderResult<T> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(ProviderError::Unavailable("stub store offline".to_string()));
        }
        Ok(value())
    }
}

#[async_trait]
impl HistoricalAggregator for StubStore {
    async fn total(&self, window: &HistoricalWindow) -> ProviderResult<Option<f64>> {
        self.read(self.failures.historical, || {
            if self.fixed_total.is_some() {
                return self.fixed_total;
            }
            let (start, end) = (window.start().date(), window.end().date());
            let days: Vec<f64> = self
                .daily
                .iter()
                .filter(|(d, _)| *d >= start && *d < end)
                .map(|(_, v)| *v)
                .collect();
            (!days.is_empty()).then(|| days.iter().sum())
        })
        .await
    }
}

#[async_trait]
impl CapacitySnapshotProvider for StubStore {
    async fn active_stays(&self, _service: &ServiceName) -> ProviderResult<u64> {
        self.read(self.failures.snapshot, || self.active_stays).await
    }

    async fn distinct_patients(&self, _service: &ServiceName) -> ProviderResult<u64> {
        self.read(self.failures.snapshot, || self.distinct_patients).await
    }

    async fn average_stay_cost(&self, _service: &ServiceName) -> ProviderResult<Option<f64>> {
        self.read(self.failures.snapshot, || self.average_cost).await
    }
}

#[async_trait]
impl StaffingProvider for StubStore {
    async fn active_count(&self, _service: &ServiceName) -> ProviderResult<u64> {
        self.read(self.failures.staffing, || self.staff).await
    }
}

#[async_trait]
impl InvestmentProvider for StubStore {
    async fn recent_investments(&self, _service: &ServiceName, since: NaiveDateTime) -> ProviderResult<Vec<f64>> {
        *self.investment_since.lock().unwrap() = Some(since);
        self.read(self.failures.investments, || self.investments.clone()).await
    }
}

#[async_trait]
impl AlertProvider for StubStore {
    async fn open_alert_count(&self, _service: &ServiceName) -> ProviderResult<u64> {
        self.read(self.failures.alerts, || self.alerts).await
    }
}
