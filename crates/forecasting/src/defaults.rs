//! Static per-service defaults, the last tier of the baseline fallback chain.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use careforecast_core::{MetricKind, ServiceName};

/// One default daily value per metric kind.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDefaults {
    pub cost: f64,
    pub patients: f64,
    pub occupancy: f64,
}

impl MetricDefaults {
    pub const fn new(cost: f64, patients: f64, occupancy: f64) -> Self {
        Self { cost, patients, occupancy }
    }

    pub fn get(&self, metric: MetricKind) -> f64 {
        match metric {
            MetricKind::Cost => self.cost,
            MetricKind::Patients => self.patients,
            MetricKind::Occupancy => self.occupancy,
        }
    }
}

const NEUTRAL: MetricDefaults = MetricDefaults::new(12_000.0, 12.0, 75.0);

/// Service name → default values. Unknown services get a neutral record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultTable {
    #[serde(default)]
    services: BTreeMap<String, MetricDefaults>,
    #[serde(default = "neutral")]
    fallback: MetricDefaults,
}

fn neutral() -> MetricDefaults {
    NEUTRAL
}

impl DefaultTable {
    pub fn new(services: BTreeMap<String, MetricDefaults>, fallback: MetricDefaults) -> Self {
        Self { services, fallback }
    }

    pub fn lookup(&self, service: &ServiceName, metric: MetricKind) -> f64 {
        self.services
            .get(service.as_str())
            .unwrap_or(&self.fallback)
            .get(metric)
    }
}

impl Default for DefaultTable {
    fn default() -> Self {
        let services = [
            ("Emergency", MetricDefaults::new(8_000.0, 15.0, 75.0)),
            ("Surgery", MetricDefaults::new(25_000.0, 10.0, 80.0)),
            ("Cardiology", MetricDefaults::new(12_000.0, 12.0, 78.0)),
            ("Pediatrics", MetricDefaults::new(8_500.0, 18.0, 70.0)),
            ("Maternity", MetricDefaults::new(18_000.0, 8.0, 65.0)),
            ("Radiology", MetricDefaults::new(30_000.0, 25.0, 60.0)),
            ("Oncology", MetricDefaults::new(45_000.0, 10.0, 85.0)),
            ("Neurology", MetricDefaults::new(11_000.0, 12.0, 72.0)),
        ]
        .into_iter()
        .map(|(name, d)| (name.to_string(), d))
        .collect();

        Self::new(services, NEUTRAL)
    }
}
