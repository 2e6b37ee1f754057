//! Current live values per service: the inputs the snapshot fallback reads.

use futures::future::join_all;
use serde::Serialize;

use careforecast_core::{MetricKind, ServiceName};

use crate::generator::ForecastEngine;
use crate::provider::{with_timeout, ProviderResult};

/// Patient totals are averaged over this many days.
const DAILY_AVERAGE_DAYS: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatisticsSnapshot {
    Patients {
        total_patients: u64,
        active_stays: u64,
        daily_average: f64,
    },
    Cost {
        average_cost: f64,
    },
    Occupancy {
        occupancy_rate: f64,
        capacity: u32,
        occupied_beds: u64,
    },
}

/// Either a snapshot or the error that prevented reading it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStatistics {
    pub service: ServiceName,
    pub metric: MetricKind,
    #[serde(flatten)]
    pub snapshot: Option<StatisticsSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ForecastEngine {
    /// Unlike forecasting, read failures are reported per service.
    pub async fn current_statistics(&self, metric: MetricKind) -> Vec<ServiceStatistics> {
        let services = &self.config().known_services;
        join_all(services.iter().map(|service| async move {
            match self.snapshot_for(service, metric).await {
                Ok(snapshot) => ServiceStatistics {
                    service: service.clone(),
                    metric,
                    snapshot: Some(snapshot),
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(service = %service, metric = %metric, error = %e, "statistics read failed");
                    ServiceStatistics {
                        service: service.clone(),
                        metric,
                        snapshot: None,
                        error: Some(e.to_string()),
                    }
                }
            }
        }))
        .await
    }

    async fn snapshot_for(&self, service: &ServiceName, metric: MetricKind) -> ProviderResult<StatisticsSnapshot> {
        let snapshot = &self.providers().snapshot;
        let timeout = self.config().read_timeout();

        Ok(match metric {
            MetricKind::Patients => {
                let (total, active) = futures::try_join!(
                    with_timeout(timeout, snapshot.distinct_patients(service)),
                    with_timeout(timeout, snapshot.active_stays(service)),
                )?;
                StatisticsSnapshot::Patients {
                    total_patients: total,
                    active_stays: active,
                    daily_average: total as f64 / DAILY_AVERAGE_DAYS,
                }
            }
            MetricKind::Cost => {
                let average = with_timeout(timeout, snapshot.average_stay_cost(service)).await?;
                StatisticsSnapshot::Cost {
                    average_cost: average.unwrap_or(0.0),
                }
            }
            MetricKind::Occupancy => {
                let occupied = with_timeout(timeout, snapshot.active_stays(service)).await?;
                let capacity = &self.config().capacity;
                StatisticsSnapshot::Occupancy {
                    occupancy_rate: capacity.occupancy_rate(service, occupied as f64),
                    capacity: capacity.capacity(service),
                    occupied_beds: occupied,
                }
            }
        })
    }
}
