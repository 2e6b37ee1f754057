//! Average daily value of a metric, with a three-tier fallback chain:
//! historical aggregate, live snapshot, static default.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use careforecast_core::{HistoricalWindow, MetricKind, ServiceName};

use crate::capacity::CapacityTable;
use crate::defaults::DefaultTable;
use crate::provider::{bounded, ForecastProviders};

/// Snapshot patient counts are normalized over this many days.
const SNAPSHOT_PATIENT_DAYS: f64 = 30.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineSource {
    Historical,
    Snapshot,
    Default,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Baseline {
    pub value: f64,
    pub source: BaselineSource,
}

#[derive(Debug, Copy, Clone)]
pub struct BaselineEstimator<'a> {
    providers: &'a ForecastProviders,
    capacity: &'a CapacityTable,
    defaults: &'a DefaultTable,
    timeout: Duration,
}

impl<'a> BaselineEstimator<'a> {
    pub fn new(
        providers: &'a ForecastProviders,
        capacity: &'a CapacityTable,
        defaults: &'a DefaultTable,
        timeout: Duration,
    ) -> Self {
        Self {
            providers,
            capacity,
            defaults,
            timeout,
        }
    }

    pub async fn estimate(&self, window: &HistoricalWindow) -> f64 {
        self.estimate_with_source(window).await.value
    }

    /// Never fails: the static default table is unconditional.
    pub async fn estimate_with_source(&self, window: &HistoricalWindow) -> Baseline {
        let service = window.service();
        let metric = window.metric();

        let baseline = if let Some(value) = self.historical(window).await {
            Baseline { value, source: BaselineSource::Historical }
        } else if let Some(value) = self.snapshot(service, metric).await {
            Baseline { value, source: BaselineSource::Snapshot }
        } else {
            Baseline {
                value: self.defaults.lookup(service, metric),
                source: BaselineSource::Default,
            }
        };

        debug!(
            service = %service,
            metric = %metric,
            value = baseline.value,
            source = ?baseline.source,
            "baseline estimated"
        );
        baseline
    }

    async fn historical(&self, window: &HistoricalWindow) -> Option<f64> {
        let service = window.service();
        let total = bounded(
            "historical_total",
            service,
            self.timeout,
            self.providers.historical.total(window),
        )
        .await
        .flatten()
        .filter(|t| usable(*t))?;

        let daily = total / window.days() as f64;
        let value = match window.metric() {
            MetricKind::Occupancy => self.capacity.occupancy_rate(service, daily),
            MetricKind::Cost | MetricKind::Patients => daily,
        };
        Some(value).filter(|v| usable(*v))
    }

    async fn snapshot(&self, service: &ServiceName, metric: MetricKind) -> Option<f64> {
        let snapshot = &self.providers.snapshot;
        let value = match metric {
            MetricKind::Occupancy => {
                let active = bounded("active_stays", service, self.timeout, snapshot.active_stays(service)).await?;
                self.capacity.occupancy_rate(service, active as f64)
            }
            MetricKind::Cost => {
                bounded("average_stay_cost", service, self.timeout, snapshot.average_stay_cost(service))
                    .await
                    .flatten()?
            }
            MetricKind::Patients => {
                let patients =
                    bounded("distinct_patients", service, self.timeout, snapshot.distinct_patients(service)).await?;
                patients as f64 / SNAPSHOT_PATIENT_DAYS
            }
        };
        Some(value).filter(|v| usable(*v))
    }
}

fn usable(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{date, service, StubStore};
    use crate::ForecastConfig;

    fn window(name: &str, metric: MetricKind) -> HistoricalWindow {
        HistoricalWindow::preceding(service(name), metric, date(2025, 1, 15), 3)
    }

    async fn run(store: StubStore, w: &HistoricalWindow) -> Baseline {
        let cfg = ForecastConfig::default();
        let providers = store.into_providers();
        BaselineEstimator::new(&providers, &cfg.capacity, &cfg.defaults, cfg.read_timeout())
            .estimate_with_source(w)
            .await
    }

    #[tokio::test]
    async fn historical_total_is_divided_by_window_days() {
        // 2024-10-15..2025-01-15 spans 92 days.
        let store = StubStore::default().with_total(92.0 * 8_000.0);
        let b = run(store, &window("Emergency", MetricKind::Cost)).await;
        assert_eq!(b.source, BaselineSource::Historical);
        assert!((b.value - 8_000.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn occupancy_history_is_converted_to_a_rate() {
        // 20 occupied beds per day out of 40.
        let store = StubStore::default().with_total(92.0 * 20.0);
        let b = run(store, &window("Emergency", MetricKind::Occupancy)).await;
        assert_eq!(b.source, BaselineSource::Historical);
        assert!((b.value - 50.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn snapshot_is_used_when_history_is_empty() {
        let store = StubStore::default().with_active_stays(10).with_distinct_patients(60).with_average_cost(4_500.0);

        let occ = run(store.clone(), &window("Emergency", MetricKind::Occupancy)).await;
        assert_eq!(occ.source, BaselineSource::Snapshot);
        assert_eq!(occ.value, 25.0);

        let patients = run(store.clone(), &window("Emergency", MetricKind::Patients)).await;
        assert_eq!(patients.value, 2.0);

        let cost = run(store, &window("Emergency", MetricKind::Cost)).await;
        assert_eq!(cost.value, 4_500.0);
    }

    #[tokio::test]
    async fn defaults_are_used_when_every_provider_fails() {
        let b = run(StubStore::failing(), &window("Oncology", MetricKind::Cost)).await;
        assert_eq!(b, Baseline { value: 45_000.0, source: BaselineSource::Default });

        let b = run(StubStore::failing(), &window("Dermatology", MetricKind::Occupancy)).await;
        assert_eq!(b, Baseline { value: 75.0, source: BaselineSource::Default });
    }

    #[tokio::test]
    async fn non_positive_totals_are_unusable() {
        let store = StubStore::default().with_total(-5.0);
        let b = run(store, &window("Radiology", MetricKind::Patients)).await;
        assert_eq!(b.source, BaselineSource::Default);
        assert_eq!(b.value, 25.0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_history_times_out_into_the_fallback_chain() {
        let store = StubStore::default().with_total(1_000.0).with_active_stays(4).slow();
        let b = run(store, &window("Neurology", MetricKind::Occupancy)).await;
        assert_eq!(b.source, BaselineSource::Default);
        assert_eq!(b.value, 72.0);
    }
}
