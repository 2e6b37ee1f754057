use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use careforecast_core::{ForecastRequest, HistoricalWindow, ServiceName};
use careforecast_forecasting::{
    AlertProvider, BaselineSource, CapacitySnapshotProvider, DynamicFactors, FixedJitter, ForecastConfig,
    ForecastEngine, ForecastInputs, ForecastProviders, HistoricalAggregator, InvestmentProvider, ProviderResult,
    StaffingProvider,
};

/// Answers every read instantly with the same numbers.
struct ConstantStore;

#[async_trait]
impl HistoricalAggregator for ConstantStore {
    async fn total(&self, window: &HistoricalWindow) -> ProviderResult<Option<f64>> {
        Ok(Some(window.days() as f64 * 8_000.0))
    }
}

#[async_trait]
impl CapacitySnapshotProvider for ConstantStore {
    async fn active_stays(&self, _service: &ServiceName) -> ProviderResult<u64> {
        Ok(12)
    }

    async fn distinct_patients(&self, _service: &ServiceName) -> ProviderResult<u64> {
        Ok(300)
    }

    async fn average_stay_cost(&self, _service: &ServiceName) -> ProviderResult<Option<f64>> {
        Ok(Some(4_200.0))
    }
}

#[async_trait]
impl StaffingProvider for ConstantStore {
    async fn active_count(&self, _service: &ServiceName) -> ProviderResult<u64> {
        Ok(6)
    }
}

#[async_trait]
impl InvestmentProvider for ConstantStore {
    async fn recent_investments(&self, _service: &ServiceName, _since: NaiveDateTime) -> ProviderResult<Vec<f64>> {
        Ok(vec![120_000.0, 35_000.0])
    }
}

#[async_trait]
impl AlertProvider for ConstantStore {
    async fn open_alert_count(&self, _service: &ServiceName) -> ProviderResult<u64> {
        Ok(1)
    }
}

fn engine() -> ForecastEngine {
    ForecastEngine::new(ForecastProviders::from_store(Arc::new(ConstantStore)), ForecastConfig::default())
        .with_jitter(Arc::new(FixedJitter::new(2.5)))
}

fn bench_projection(c: &mut Criterion) {
    let engine = engine();
    let inputs = ForecastInputs {
        baseline: 8_000.0,
        baseline_source: BaselineSource::Historical,
        trend: 0.04,
        factors: DynamicFactors::from_impacts(0.08, 0.03, 0.03, 2.5),
    };

    let mut group = c.benchmark_group("projection");
    for horizon in [30i64, 365, 1825] {
        let request = ForecastRequest::parse("Emergency", "COST", "2025-01-15", horizon).unwrap();
        group.throughput(Throughput::Elements(horizon as u64));
        group.bench_with_input(BenchmarkId::from_parameter(horizon), &request, |b, request| {
            b.iter(|| black_box(engine.project(request, &inputs)))
        });
    }
    group.finish();
}

fn bench_generation(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let engine = engine();
    let request = ForecastRequest::parse("Emergency", "OCCUPANCY", "2025-01-15", 30).unwrap();

    c.bench_function("generate_single_30d", |b| {
        b.iter(|| rt.block_on(engine.generate(black_box(&request))))
    });
    c.bench_function("generate_all_services_30d", |b| {
        b.iter(|| rt.block_on(engine.generate_all(black_box(&request))))
    });
}

criterion_group!(benches, bench_projection, bench_generation);
criterion_main!(benches);
