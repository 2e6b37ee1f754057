//! Read-only data provider interfaces consumed by the engine.
//!
//! Providers are thin data-access collaborators (in-memory, Postgres, ...).
//! The engine treats every provider failure as "data unavailable" and degrades
//! through its fallback chain; nothing here is allowed to abort a forecast.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::warn;

use careforecast_core::{HistoricalWindow, ServiceName};

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    #[error("data source unavailable: {0}")]
    Unavailable(String),

    #[error("read timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed data: {0}")]
    Malformed(String),
}

/// Aggregates over historical records for one service.
#[async_trait]
pub trait HistoricalAggregator: Send + Sync {
    /// Total of the window's metric over `[start, end)`:
    /// - `COST`: sum of medical act tariffs
    /// - `PATIENTS`: distinct patients admitted
    /// - `OCCUPANCY`: occupied bed-days
    ///
    /// `None` means the store had nothing to aggregate.
    async fn total(&self, window: &HistoricalWindow) -> ProviderResult<Option<f64>>;
}

/// Live counts used when history is missing.
#[async_trait]
pub trait CapacitySnapshotProvider: Send + Sync {
    /// Stays currently in progress.
    async fn active_stays(&self, service: &ServiceName) -> ProviderResult<u64>;

    /// Distinct patients with any stay in the service.
    async fn distinct_patients(&self, service: &ServiceName) -> ProviderResult<u64>;

    /// Average total cost of stays associated with the service.
    async fn average_stay_cost(&self, service: &ServiceName) -> ProviderResult<Option<f64>>;
}

#[async_trait]
pub trait StaffingProvider: Send + Sync {
    /// Staff members currently active in the service.
    async fn active_count(&self, service: &ServiceName) -> ProviderResult<u64>;
}

#[async_trait]
pub trait InvestmentProvider: Send + Sync {
    /// Amounts of capital investments recorded for the service at or after `since`.
    async fn recent_investments(&self, service: &ServiceName, since: NaiveDateTime) -> ProviderResult<Vec<f64>>;
}

#[async_trait]
pub trait AlertProvider: Send + Sync {
    /// Alerts currently open/active for the service.
    async fn open_alert_count(&self, service: &ServiceName) -> ProviderResult<u64>;
}

/// The full set of providers an engine reads from.
#[derive(Clone)]
pub struct ForecastProviders {
    pub historical: Arc<dyn HistoricalAggregator>,
    pub snapshot: Arc<dyn CapacitySnapshotProvider>,
    pub staffing: Arc<dyn StaffingProvider>,
    pub investments: Arc<dyn InvestmentProvider>,
    pub alerts: Arc<dyn AlertProvider>,
}

impl ForecastProviders {
    /// Use a single store that implements every provider interface.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: HistoricalAggregator
            + CapacitySnapshotProvider
            + StaffingProvider
            + InvestmentProvider
            + AlertProvider
            + 'static,
    {
        Self {
            historical: store.clone(),
            snapshot: store.clone(),
            staffing: store.clone(),
            investments: store.clone(),
            alerts: store,
        }
    }
}

impl core::fmt::Debug for ForecastProviders {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ForecastProviders").finish_non_exhaustive()
    }
}

/// Run one provider read under `timeout`, surfacing an elapsed timer as [`ProviderError::Timeout`].
pub(crate) async fn with_timeout<T, F>(timeout: Duration, fut: F) -> ProviderResult<T>
where
    F: Future<Output = ProviderResult<T>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .unwrap_or(Err(ProviderError::Timeout(timeout)))
}

/// Like [`with_timeout`], but failures are logged and become `None`.
pub(crate) async fn bounded<T, F>(read: &'static str, service: &ServiceName, timeout: Duration, fut: F) -> Option<T>
where
    F: Future<Output = ProviderResult<T>>,
{
    match with_timeout(timeout, fut).await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(service = %service, read, error = %e, "provider read failed; degrading");
            None
        }
    }
}
