use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use careforecast_core::{DomainError, DomainResult, ForecastRequest, MetricKind, ServiceName};
use careforecast_infra::ForecastSnapshot;

pub const DEFAULT_DAYS_AHEAD: i64 = 30;
pub const DEFAULT_METRIC: MetricKind = MetricKind::Cost;
pub const DEFAULT_STATISTICS_METRIC: MetricKind = MetricKind::Patients;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct GenerateForecastRequest {
    pub service: String,
    pub prediction_type: Option<String>,
    /// ISO-8601 date; defaults to today.
    pub start_date: Option<String>,
    pub days_ahead: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ForecastQuery {
    pub days_ahead: Option<i64>,
    pub prediction_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatisticsQuery {
    #[serde(rename = "type")]
    pub metric: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LatestQuery {
    pub prediction_type: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct LatestSnapshotResponse {
    #[serde(flatten)]
    pub snapshot: ForecastSnapshot,
    pub age_seconds: i64,
}

// -------------------------
// Mapping helpers
// -------------------------

pub fn parse_metric(value: Option<&str>) -> DomainResult<MetricKind> {
    parse_metric_or(value, DEFAULT_METRIC)
}

pub fn parse_metric_or(value: Option<&str>, default: MetricKind) -> DomainResult<MetricKind> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v.parse(),
        None => Ok(default),
    }
}

/// Apply defaults, then validate everything through [`ForecastRequest::new`].
pub fn forecast_request(
    service: &str,
    prediction_type: Option<&str>,
    start_date: Option<&str>,
    days_ahead: Option<i64>,
    today: NaiveDate,
) -> DomainResult<ForecastRequest> {
    let service = ServiceName::new(service)?;
    let metric = parse_metric(prediction_type)?;
    let start_date = match start_date.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
            DomainError::validation(format!("malformed start date '{raw}' (expected YYYY-MM-DD): {e}"))
        })?,
        None => today,
    };
    ForecastRequest::new(service, metric, start_date, days_ahead.unwrap_or(DEFAULT_DAYS_AHEAD))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 5).unwrap()
    }

    #[test]
    fn omitted_fields_take_defaults() {
        let req = forecast_request("Emergency", None, None, None, today()).unwrap();
        assert_eq!(req.metric(), MetricKind::Cost);
        assert_eq!(req.start_date(), today());
        assert_eq!(req.horizon_days(), 30);
    }

    #[test]
    fn legacy_metric_spellings_are_accepted() {
        assert_eq!(parse_metric(Some("cout")).unwrap(), MetricKind::Cost);
        assert_eq!(parse_metric(Some("OCCUPATION")).unwrap(), MetricKind::Occupancy);
        assert_eq!(parse_metric(Some("  ")).unwrap(), MetricKind::Cost);
        assert!(parse_metric(Some("REVENUE")).is_err());
        assert_eq!(parse_metric_or(None, DEFAULT_STATISTICS_METRIC).unwrap(), MetricKind::Patients);
        assert_eq!(parse_metric_or(Some("cost"), DEFAULT_STATISTICS_METRIC).unwrap(), MetricKind::Cost);
    }

    #[test]
    fn invalid_input_is_a_validation_error() {
        for result in [
            forecast_request("", None, None, None, today()),
            forecast_request("Surgery", None, Some("05/05/2025"), None, today()),
            forecast_request("Surgery", None, None, Some(0), today()),
            forecast_request("Surgery", None, None, Some(1826), today()),
        ] {
            assert!(matches!(result, Err(DomainError::Validation(_))));
        }
    }
}
