//! `careforecast-forecasting`
//!
//! **Responsibility:** the operational forecasting engine.
//!
//! Given a service, a metric and a horizon, produces one forecast point per day by
//! combining a historical baseline, a recent trend, calendar adjustments and
//! live structural factors (staffing, investment, alerts).
//!
//! The engine only *reads* through the provider traits in [`provider`]; it never
//! mutates state and never fails a valid request because a data source is down.

pub mod baseline;
pub mod batch;
pub mod capacity;
pub mod config;
pub mod defaults;
pub mod factors;
pub mod generator;
pub mod jitter;
pub mod narrative;
pub mod provider;
pub mod result;
pub mod seasonal;
pub mod statistics;
pub mod trend;

#[cfg(test)]
pub(crate) mod testing;

pub use baseline::{Baseline, BaselineEstimator, BaselineSource};
pub use capacity::CapacityTable;
pub use config::{ForecastConfig, DEFAULT_SERVICES};
pub use defaults::{DefaultTable, MetricDefaults};
pub use factors::{DynamicFactorEngine, DynamicFactors};
pub use generator::{ForecastEngine, ForecastInputs};
pub use jitter::{FixedJitter, JitterSource, RandomJitter};
pub use provider::{
    AlertProvider, CapacitySnapshotProvider, ForecastProviders, HistoricalAggregator, InvestmentProvider,
    ProviderError, ProviderResult, StaffingProvider,
};
pub use result::{ForecastPoint, ForecastResult, TrendDirection};
pub use seasonal::{SeasonalAdjuster, SeasonalRule, SeasonalTable};
pub use statistics::{ServiceStatistics, StatisticsSnapshot};
pub use trend::TrendCalculator;
