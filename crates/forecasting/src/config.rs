//! Engine configuration: lookup tables plus window and timeout tuning.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use careforecast_core::{DomainError, DomainResult, ServiceName};

use crate::capacity::CapacityTable;
use crate::defaults::DefaultTable;
use crate::seasonal::SeasonalTable;

/// Services covered by batch generation, in response order.
pub const DEFAULT_SERVICES: [&str; 8] = [
    "Emergency",
    "Surgery",
    "Cardiology",
    "Pediatrics",
    "Maternity",
    "Radiology",
    "Oncology",
    "Neurology",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub known_services: Vec<ServiceName>,
    pub capacity: CapacityTable,
    pub defaults: DefaultTable,
    pub seasonal: SeasonalTable,

    /// Length of the historical window preceding the start date.
    pub history_months: u32,

    /// Length of the recent/older sub-windows compared by the trend calculation.
    pub trend_months: u32,

    pub investment_lookback_months: u32,

    /// Upper bound on any single provider read.
    pub read_timeout_ms: u64,
}

impl ForecastConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(self) -> DomainResult<Self> {
        if self.known_services.is_empty() {
            return Err(DomainError::validation("known_services must not be empty"));
        }
        if !(1..=12).contains(&self.history_months) {
            return Err(DomainError::validation(format!(
                "history_months must be within 1..=12 (got {})",
                self.history_months
            )));
        }
        if self.trend_months == 0 || self.trend_months > self.history_months {
            return Err(DomainError::validation(format!(
                "trend_months must be within 1..={} (got {})",
                self.history_months, self.trend_months
            )));
        }
        if !(1..=12).contains(&self.investment_lookback_months) {
            return Err(DomainError::validation(format!(
                "investment_lookback_months must be within 1..=12 (got {})",
                self.investment_lookback_months
            )));
        }
        if self.read_timeout_ms == 0 {
            return Err(DomainError::validation("read_timeout_ms must be positive"));
        }
        Ok(self)
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            known_services: DEFAULT_SERVICES
                .iter()
                .filter_map(|name| ServiceName::new(name).ok())
                .collect(),
            capacity: CapacityTable::default(),
            defaults: DefaultTable::default(),
            seasonal: SeasonalTable::default(),
            history_months: 3,
            trend_months: 1,
            investment_lookback_months: 3,
            read_timeout_ms: 2_000,
        }
    }
}
