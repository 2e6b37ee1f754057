//! Fixed explanatory text attached to every forecast.

use careforecast_core::MetricKind;

use crate::result::TrendDirection;

pub fn key_factors(metric: MetricKind) -> Vec<String> {
    let labels: &[&str] = match metric {
        MetricKind::Cost => &[
            "Medical act volume",
            "Average tariffs",
            "Bed occupancy rate",
            "Staffing costs",
        ],
        MetricKind::Patients => &[
            "Epidemiological seasonality",
            "Service admission capacity",
            "External referrals",
            "Weather conditions",
        ],
        MetricKind::Occupancy => &[
            "Average length of stay",
            "Daily admissions",
            "Discharge rate",
            "Inter-service transfers",
        ],
    };
    owned(labels)
}

/// Rising trends get metric-specific advice; falling and stable trends share generic text.
pub fn recommendations(metric: MetricKind, trend: TrendDirection) -> Vec<String> {
    let lines: &[&str] = match (trend, metric) {
        (TrendDirection::Rising, MetricKind::Cost) => &[
            "Analyze the spending items driving the increase",
            "Optimize resource utilization",
            "Renegotiate supplier contracts",
        ],
        (TrendDirection::Rising, MetricKind::Patients) => &[
            "Plan staff reinforcement",
            "Check equipment availability",
            "Optimize admission schedules",
        ],
        (TrendDirection::Rising, MetricKind::Occupancy) => &[
            "Monitor maximum capacity closely",
            "Plan early discharges where appropriate",
            "Prepare overflow solutions",
        ],
        (TrendDirection::Falling, _) => &[
            "Analyze the causes of the decrease",
            "Evaluate the impact on quality of care",
            "Adjust resources accordingly",
        ],
        (TrendDirection::Stable, _) => &[
            "Keep monitoring the indicators",
            "Continue current good practices",
            "Anticipate seasonal variations",
        ],
    };
    owned(lines)
}

fn owned(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| s.to_string()).collect()
}
