//! Forecastable metric kinds.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The operational metric a forecast is produced for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricKind {
    /// Daily cost (sum of medical act tariffs).
    Cost,
    /// Daily distinct-patient volume.
    Patients,
    /// Bed occupancy rate, in percent of capacity.
    Occupancy,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [MetricKind::Cost, MetricKind::Patients, MetricKind::Occupancy];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Cost => "COST",
            MetricKind::Patients => "PATIENTS",
            MetricKind::Occupancy => "OCCUPANCY",
        }
    }
}

impl core::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = DomainError;

    /// Case-insensitive; also accepts the legacy dashboard spellings `COUT` and `OCCUPATION`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "COST" | "COUT" => Ok(MetricKind::Cost),
            "PATIENTS" => Ok(MetricKind::Patients),
            "OCCUPANCY" | "OCCUPATION" => Ok(MetricKind::Occupancy),
            other => Err(DomainError::validation(format!(
                "unknown metric kind '{other}' (expected one of: COST, PATIENTS, OCCUPANCY)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_and_legacy_names() {
        assert_eq!("COST".parse::<MetricKind>().unwrap(), MetricKind::Cost);
        assert_eq!("cout".parse::<MetricKind>().unwrap(), MetricKind::Cost);
        assert_eq!(" patients ".parse::<MetricKind>().unwrap(), MetricKind::Patients);
        assert_eq!("Occupation".parse::<MetricKind>().unwrap(), MetricKind::Occupancy);
    }

    #[test]
    fn unknown_metric_is_a_validation_error() {
        let err = "REVENUE".parse::<MetricKind>().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn serializes_as_screaming_snake_case() {
        let json = serde_json::to_string(&MetricKind::Occupancy).unwrap();
        assert_eq!(json, "\"OCCUPANCY\"");
    }
}
