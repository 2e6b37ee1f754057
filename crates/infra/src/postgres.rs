//! Postgres-backed hospital store.
//!
//! Implements every forecasting provider trait with plain `sqlx` queries over
//! the schema in `migrations/0001_hospital_schema.sql`. Services are matched by
//! name; windows are half-open `[start, end)`.
//!
//! ## Error Mapping
//!
//! | SQLx Error | ProviderError |
//! |------------|---------------|
//! | `ColumnDecode`, `Decode`, `ColumnNotFound`, `RowNotFound` | `Malformed` |
//! | `PoolTimedOut` | `Timeout` |
//! | anything else (network, pool closed, database) | `Unavailable` |

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::{info, instrument};

use careforecast_core::{HistoricalWindow, MetricKind, ServiceName};
use careforecast_forecasting::{
    AlertProvider, CapacitySnapshotProvider, HistoricalAggregator, InvestmentProvider, ProviderError,
    ProviderResult, StaffingProvider,
};

const SCHEMA: &str = include_str!("../migrations/0001_hospital_schema.sql");
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

const COST_TOTAL: &str = r#"
    SELECT SUM(a.tariff) AS total
    FROM medical_acts a
    JOIN stays s ON s.id = a.stay_id
    JOIN services sv ON sv.id = s.service_id
    WHERE sv.name = $1 AND a.performed_at >= $2 AND a.performed_at < $3
"#;

const PATIENT_TOTAL: &str = r#"
    SELECT COUNT(DISTINCT s.patient_id) AS total
    FROM stays s
    JOIN services sv ON sv.id = s.service_id
    WHERE sv.name = $1 AND s.admitted_at >= $2 AND s.admitted_at < $3
"#;

const BED_DAYS_TOTAL: &str = r#"
    SELECT SUM(
        EXTRACT(EPOCH FROM (LEAST(COALESCE(s.discharged_at, $3), $3) - GREATEST(s.admitted_at, $2))) / 86400.0
    )::DOUBLE PRECISION AS total
    FROM stays s
    JOIN services sv ON sv.id = s.service_id
    WHERE sv.name = $1 AND s.admitted_at < $3 AND COALESCE(s.discharged_at, $3) > $2
"#;

/// Postgres-backed provider for every forecasting read.
///
/// Uses a SQLx connection pool; cheap to clone and share across tasks.
#[derive(Debug, Clone)]
pub struct PostgresHospitalStore {
    pool: Arc<PgPool>,
}

impl PostgresHospitalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Connect, then make sure the schema exists.
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(database_url)
            .await
            .context("failed to connect to Postgres")?;
        info!("connected to Postgres");

        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .context("failed to apply hospital schema")?;
        info!("hospital schema applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn count(&self, operation: &'static str, sql: &str, service: &ServiceName) -> ProviderResult<u64> {
        let row = sqlx::query(sql)
            .bind(service.as_str())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        let count: i64 = row.try_get("total").map_err(|e| map_sqlx_error(operation, e))?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl HistoricalAggregator for PostgresHospitalStore {
    #[instrument(skip(self, window), fields(service = %window.service(), metric = %window.metric()))]
    async fn total(&self, window: &HistoricalWindow) -> ProviderResult<Option<f64>> {
        let sql = match window.metric() {
            MetricKind::Cost => COST_TOTAL,
            MetricKind::Patients => PATIENT_TOTAL,
            MetricKind::Occupancy => BED_DAYS_TOTAL,
        };

        let row = sqlx::query(sql)
            .bind(window.service().as_str())
            .bind(window.start())
            .bind(window.end())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("historical_total", e))?;

        let total = match window.metric() {
            MetricKind::Patients => {
                let count: i64 = row.try_get("total").map_err(|e| map_sqlx_error("historical_total", e))?;
                (count > 0).then_some(count as f64)
            }
            MetricKind::Cost | MetricKind::Occupancy => row
                .try_get::<Option<f64>, _>("total")
                .map_err(|e| map_sqlx_error("historical_total", e))?,
        };
        Ok(total)
    }
}

#[async_trait]
impl CapacitySnapshotProvider for PostgresHospitalStore {
    async fn active_stays(&self, service: &ServiceName) -> ProviderResult<u64> {
        self.count(
            "active_stays",
            r#"
            SELECT COUNT(*) AS total
            FROM stays s
            JOIN services sv ON sv.id = s.service_id
            WHERE sv.name = $1 AND s.discharged_at IS NULL
            "#,
            service,
        )
        .await
    }

    async fn distinct_patients(&self, service: &ServiceName) -> ProviderResult<u64> {
        self.count(
            "distinct_patients",
            r#"
            SELECT COUNT(DISTINCT s.patient_id) AS total
            FROM stays s
            JOIN services sv ON sv.id = s.service_id
            WHERE sv.name = $1
            "#,
            service,
        )
        .await
    }

    async fn average_stay_cost(&self, service: &ServiceName) -> ProviderResult<Option<f64>> {
        let row = sqlx::query(
            r#"
            SELECT AVG(COALESCE(s.total_cost, 0))::DOUBLE PRECISION AS average
            FROM stays s
            JOIN services sv ON sv.id = s.service_id
            WHERE sv.name = $1
            "#,
        )
        .bind(service.as_str())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("average_stay_cost", e))?;

        row.try_get::<Option<f64>, _>("average")
            .map_err(|e| map_sqlx_error("average_stay_cost", e))
    }
}

#[async_trait]
impl StaffingProvider for PostgresHospitalStore {
    async fn active_count(&self, service: &ServiceName) -> ProviderResult<u64> {
        self.count(
            "active_staff",
            r#"
            SELECT COUNT(*) AS total
            FROM staff st
            JOIN services sv ON sv.id = st.service_id
            WHERE sv.name = $1 AND st.active
            "#,
            service,
        )
        .await
    }
}

#[async_trait]
impl InvestmentProvider for PostgresHospitalStore {
    async fn recent_investments(&self, service: &ServiceName, since: NaiveDateTime) -> ProviderResult<Vec<f64>> {
        let rows = sqlx::query(
            r#"
            SELECT i.amount
            FROM investments i
            JOIN services sv ON sv.id = i.service_id
            WHERE sv.name = $1 AND i.invested_at >= $2
            ORDER BY i.invested_at ASC
            "#,
        )
        .bind(service.as_str())
        .bind(since)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("recent_investments", e))?;

        rows.iter()
            .map(|row| row.try_get::<f64, _>("amount"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("recent_investments", e))
    }
}

#[async_trait]
impl AlertProvider for PostgresHospitalStore {
    async fn open_alert_count(&self, service: &ServiceName) -> ProviderResult<u64> {
        self.count(
            "open_alerts",
            r#"
            SELECT COUNT(*) AS total
            FROM alerts a
            JOIN services sv ON sv.id = a.service_id
            WHERE sv.name = $1 AND NOT a.resolved
            "#,
            service,
        )
        .await
    }
}

fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> ProviderError {
    match err {
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::RowNotFound => ProviderError::Malformed(format!("{operation}: {err}")),
        sqlx::Error::PoolTimedOut => ProviderError::Timeout(ACQUIRE_TIMEOUT),
        other => ProviderError::Unavailable(format!("{operation}: {other}")),
    }
}
