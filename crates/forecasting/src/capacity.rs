//! Bed capacity per service.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use careforecast_core::ServiceName;

const FALLBACK_CAPACITY: u32 = 30;

/// Static mapping of service name → bed capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityTable {
    #[serde(default)]
    beds: BTreeMap<String, u32>,
    #[serde(default = "fallback_capacity")]
    fallback: u32,
}

fn fallback_capacity() -> u32 {
    FALLBACK_CAPACITY
}

impl CapacityTable {
    pub fn new(beds: BTreeMap<String, u32>, fallback: u32) -> Self {
        Self { beds, fallback }
    }

    /// Beds available to `service`; unknown services get the fallback capacity.
    ///
    /// Never zero.
    pub fn capacity(&self, service: &ServiceName) -> u32 {
        self.beds
            .get(service.as_str())
            .copied()
            .unwrap_or(self.fallback)
            .max(1)
    }

    /// Occupied beds as a percentage of capacity, capped at 100.
    pub fn occupancy_rate(&self, service: &ServiceName, occupied_beds: f64) -> f64 {
        (occupied_beds / f64::from(self.capacity(service)) * 100.0).min(100.0)
    }
}

impl Default for CapacityTable {
    fn default() -> Self {
        let beds = [
            ("Emergency", 40),
            ("Surgery", 60),
            ("Cardiology", 35),
            ("Pediatrics", 30),
            ("Maternity", 25),
            ("Radiology", 15),
            ("Oncology", 20),
            ("Neurology", 18),
        ]
        .into_iter()
        .map(|(name, beds)| (name.to_string(), beds))
        .collect();

        Self::new(beds, FALLBACK_CAPACITY)
    }
}
