use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use careforecast_core::{MetricKind, ServiceName};

/// Relative trend beyond which a forecast is classified as rising or falling.
pub const TREND_THRESHOLD: f64 = 0.05;

/// One forecast day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
}

impl TrendDirection {
    pub fn classify(trend: f64) -> Self {
        if trend > TREND_THRESHOLD {
            TrendDirection::Rising
        } else if trend < -TREND_THRESHOLD {
            TrendDirection::Falling
        } else {
            TrendDirection::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Rising => "RISING",
            TrendDirection::Falling => "FALLING",
            TrendDirection::Stable => "STABLE",
        }
    }
}

impl core::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete forecast for one (service, metric) pair.
///
/// Never partially filled: `points.len()` always equals the requested horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub service: ServiceName,
    pub metric: MetricKind,
    pub points: Vec<ForecastPoint>,

    /// Confidence score in \[0, 95\].
    pub confidence: f64,

    pub trend: TrendDirection,
    pub mean_value: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub key_factors: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Round half away from zero to two decimals.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
