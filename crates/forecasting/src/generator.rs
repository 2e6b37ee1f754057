//! Forecast generation pipeline.
//!
//! `generate` gathers the three data-dependent inputs (baseline, trend, dynamic
//! factors) concurrently, then `project` turns them into dated points. The
//! projection is pure and deterministic for fixed inputs.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

use careforecast_core::{ForecastRequest, HistoricalWindow};

use crate::baseline::{BaselineEstimator, BaselineSource};
use crate::config::ForecastConfig;
use crate::factors::{DynamicFactorEngine, DynamicFactors, MAX_CONFIDENCE};
use crate::jitter::{JitterSource, RandomJitter};
use crate::narrative;
use crate::provider::ForecastProviders;
use crate::result::{round2, ForecastPoint, ForecastResult, TrendDirection};
use crate::seasonal::SeasonalAdjuster;
use crate::trend::TrendCalculator;

/// Data-dependent inputs to a projection.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ForecastInputs {
    pub baseline: f64,
    pub baseline_source: BaselineSource,
    pub trend: f64,
    pub factors: DynamicFactors,
}

/// Symmetric band half-width, as a fraction of the value.
pub fn confidence_interval(confidence: f64) -> f64 {
    0.10 * (100.0 - confidence) / 10.0
}

#[derive(Clone)]
pub struct ForecastEngine {
    providers: ForecastProviders,
    config: Arc<ForecastConfig>,
    jitter: Arc<dyn JitterSource>,
    /// Date live state (staffing, investments, alerts) is read at.
    today: fn() -> NaiveDate,
}

fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

impl ForecastEngine {
    pub fn new(providers: ForecastProviders, config: ForecastConfig) -> Self {
        Self {
            providers,
            config: Arc::new(config),
            jitter: Arc::new(RandomJitter::from_entropy()),
            today: utc_today,
        }
    }

    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn with_jitter(mut self, jitter: Arc<dyn JitterSource>) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn providers(&self) -> &ForecastProviders {
        &self.providers
    }

    /// Always produces a complete result for a valid request; data-layer
    /// failures only lower forecast quality.
    pub async fn generate(&self, request: &ForecastRequest) -> ForecastResult {
        let inputs = self.gather(request).await;
        let result = self.project(request, &inputs);

        info!(
            service = %request.service(),
            metric = %request.metric(),
            horizon_days = request.horizon_days(),
            baseline_source = ?inputs.baseline_source,
            confidence = result.confidence,
            trend = %result.trend,
            "forecast generated"
        );
        result
    }

    pub async fn gather(&self, request: &ForecastRequest) -> ForecastInputs {
        let cfg = &*self.config;
        let timeout = cfg.read_timeout();
        let service = request.service();

        let window = HistoricalWindow::preceding(
            service.clone(),
            request.metric(),
            request.start_date(),
            cfg.history_months,
        );
        let estimator = BaselineEstimator::new(&self.providers, &cfg.capacity, &cfg.defaults, timeout);
        let trend_calc = TrendCalculator::new(estimator, cfg.trend_months);
        let factor_engine = DynamicFactorEngine::new(
            &self.providers,
            self.jitter.as_ref(),
            timeout,
            cfg.investment_lookback_months,
        );

        let (baseline, trend, factors) = futures::join!(
            estimator.estimate_with_source(&window),
            trend_calc.trend(&window),
            factor_engine.factors(service, (self.today)()),
        );

        debug!(service = %service, trend, multiplier = factors.multiplier, "forecast inputs gathered");

        ForecastInputs {
            baseline: baseline.value,
            baseline_source: baseline.source,
            trend,
            factors,
        }
    }

    /// Negative projections are clamped to zero before the band is applied.
    pub fn project(&self, request: &ForecastRequest, inputs: &ForecastInputs) -> ForecastResult {
        let service = request.service();
        let adjuster = SeasonalAdjuster::new(&self.config.seasonal);
        let confidence = inputs.factors.confidence_bonus.clamp(0.0, MAX_CONFIDENCE);
        let band = confidence_interval(confidence);

        let points: Vec<ForecastPoint> = request
            .dates()
            .map(|(i, date)| {
                let drift = 1.0 + inputs.trend * f64::from(i) / 365.0;
                let raw = inputs.baseline
                    * drift
                    * adjuster.seasonal_factor(date, service)
                    * adjuster.weekday_factor(date)
                    * inputs.factors.multiplier;
                let value = if raw.is_finite() { raw.max(0.0) } else { 0.0 };

                ForecastPoint {
                    date,
                    value: round2(value),
                    lower_bound: round2(value * (1.0 - band)),
                    upper_bound: round2(value * (1.0 + band)),
                }
            })
            .collect();

        let (min_value, max_value, sum) = points.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(lo, hi, sum), p| (lo.min(p.value), hi.max(p.value), sum + p.value),
        );
        let mean_value = if points.is_empty() { 0.0 } else { sum / points.len() as f64 };
        let trend = TrendDirection::classify(inputs.trend);

        ForecastResult {
            service: service.clone(),
            metric: request.metric(),
            confidence: round2(confidence),
            trend,
            mean_value,
            min_value: if points.is_empty() { 0.0 } else { min_value },
            max_value: if points.is_empty() { 0.0 } else { max_value },
            key_factors: narrative::key_factors(request.metric()),
            recommendations: narrative::recommendations(request.metric(), trend),
            points,
        }
    }
}

impl core::fmt::Debug for ForecastEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ForecastEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jitter::FixedJitter;
    use crate::testing::{date, service, Failures, StubStore};
    use careforecast_core::MetricKind;
    use proptest::prelude::*;

    fn engine(store: StubStore, jitter: f64) -> ForecastEngine {
        ForecastEngine::new(store.into_providers(), ForecastConfig::default())
            .with_jitter(Arc::new(FixedJitter::new(jitter)))
    }

    fn flat_inputs(baseline: f64, confidence: f64) -> ForecastInputs {
        ForecastInputs {
            baseline,
            baseline_source: BaselineSource::Historical,
            trend: 0.0,
            factors: DynamicFactors {
                confidence_bonus: confidence,
                ..DynamicFactors::neutral()
            },
        }
    }

    #[test]
    fn winter_emergency_cost_on_a_wednesday() {
        let engine = engine(StubStore::default(), 0.0);
        let request = ForecastRequest::parse("Emergency", "COST", "2025-01-15", 1).unwrap();

        let result = engine.project(&request, &flat_inputs(8_000.0, 90.0));
        let p = &result.points[0];
        assert_eq!(p.date, date(2025, 1, 15));
        assert_eq!(p.value, 9_200.00);
        assert_eq!(p.lower_bound, 8_280.00);
        assert_eq!(p.upper_bound, 10_120.00);
        assert_eq!(result.confidence, 90.0);
        assert_eq!(result.trend, TrendDirection::Stable);
    }

    #[test]
    fn weekend_points_are_damped() {
        let engine = engine(StubStore::default(), 0.0);
        let request = ForecastRequest::parse("Cardiology", "PATIENTS", "2025-01-17", 3).unwrap();
        let values: Vec<f64> = engine
            .project(&request, &flat_inputs(100.0, 85.0))
            .points
            .iter()
            .map(|p| p.value)
            .collect();
        assert_eq!(values, vec![100.0, 85.0, 75.0]);
    }

    #[test]
    fn steep_negative_trend_is_clamped_at_zero() {
        let engine = engine(StubStore::default(), 0.0);
        let request = ForecastRequest::parse("Oncology", "COST", "2025-03-03", 1_000).unwrap();
        let inputs = ForecastInputs { trend: -2.0, ..flat_inputs(45_000.0, 85.0) };

        let result = engine.project(&request, &inputs);
        let last = result.points.last().unwrap();
        assert_eq!(last.value, 0.0);
        assert_eq!(last.lower_bound, 0.0);
        assert_eq!(last.upper_bound, 0.0);
        assert_eq!(result.min_value, 0.0);
        assert_eq!(result.trend, TrendDirection::Falling);
    }

    #[tokio::test]
    async fn worked_example_end_to_end() {
        // Flat 8000/day history; staffing (+6%) and alerts (-6%) cancel out,
        // staffing lifts confidence to 85 + 3 + 2 = 90.
        let store = StubStore::default()
            .with_daily(date(2024, 1, 1), date(2025, 1, 15), |_| 8_000.0)
            .with_staff(5)
            .with_alerts(2);
        let engine = engine(store, 3.0);
        let request = ForecastRequest::parse("Emergency", "COST", "2025-01-15", 30).unwrap();

        let result = engine.generate(&request).await;
        assert_eq!(result.points.len(), 30);
        assert_eq!(result.confidence, 90.0);
        assert_eq!(result.trend, TrendDirection::Stable);
        let first = &result.points[0];
        assert_eq!((first.value, first.lower_bound, first.upper_bound), (9_200.0, 8_280.0, 10_120.0));
        assert_eq!(result.max_value, 9_200.0);
        assert_eq!(result.key_factors, narrative::key_factors(MetricKind::Cost));
    }

    #[tokio::test]
    async fn investment_lookback_trails_today_not_the_start_date() {
        fn fixed_today() -> NaiveDate {
            date(2025, 6, 2)
        }
        let store = StubStore::default().with_investments(vec![100_000.0]);
        let recorder = store.clone();
        let engine = engine(store, 0.0).with_clock(fixed_today);

        for start in ["2020-01-01", "2025-06-02", "2029-12-31"] {
            let request = ForecastRequest::parse("Surgery", "COST", start, 3).unwrap();
            let inputs = engine.gather(&request).await;
            assert_eq!(recorder.last_investment_since(), Some(date(2025, 3, 2).and_time(chrono::NaiveTime::MIN)));
            assert!((inputs.factors.investment_impact - 0.02).abs() < 1e-12);
        }
    }

    #[tokio::test]
    async fn total_provider_outage_still_yields_a_forecast() {
        let engine = engine(StubStore::failing(), 0.0);
        let request = ForecastRequest::parse("Maternity", "PATIENTS", "2025-04-07", 7).unwrap();

        let inputs = engine.gather(&request).await;
        assert_eq!(inputs.baseline_source, BaselineSource::Default);
        assert_eq!(inputs.trend, 0.0);
        assert_eq!(inputs.factors, DynamicFactors::neutral());

        let result = engine.generate(&request).await;
        assert_eq!(result.points.len(), 7);
        // Monday in April: 8 * 1.12 spring factor.
        assert_eq!(result.points[0].value, 8.96);
        assert_eq!(result.confidence, 85.0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_providers_degrade_like_failing_ones() {
        let slow = engine(StubStore::default().with_total(1e6).with_staff(9).slow(), 0.0);
        let down = engine(
            StubStore::default().with_failures(Failures::all()),
            0.0,
        );
        let request = ForecastRequest::parse("Radiology", "OCCUPANCY", "2025-09-10", 5).unwrap();

        assert_eq!(slow.generate(&request).await, down.generate(&request).await);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn points_honor_length_order_and_bounds(
            horizon in 1i64..400,
            baseline in 0.0f64..100_000.0,
            trend in -3.0f64..3.0,
            confidence in 0.0f64..=95.0,
            offset in 0i64..3_000,
        ) {
            let engine = engine(StubStore::default(), 0.0);
            let start = date(2020, 1, 1) + chrono::Duration::days(offset);
            let request = ForecastRequest::new(service("Emergency"), MetricKind::Cost, start, horizon).unwrap();
            let inputs = ForecastInputs { trend, ..flat_inputs(baseline, confidence) };

            let result = engine.project(&request, &inputs);
            prop_assert_eq!(result.points.len() as i64, horizon);
            prop_assert_eq!(result.points[0].date, start);
            prop_assert!(result.points.windows(2).all(|w| w[0].date < w[1].date));
            for p in &result.points {
                prop_assert!(p.lower_bound <= p.value && p.value <= p.upper_bound);
                prop_assert!(p.lower_bound >= 0.0);
            }
            prop_assert!((0.0..=95.0).contains(&result.confidence));
            prop_assert!(result.min_value <= result.mean_value + 1e-6);
            prop_assert!(result.mean_value <= result.max_value + 1e-6);
        }
    }
}
