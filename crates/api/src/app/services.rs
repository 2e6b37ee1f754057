use std::sync::{Arc, Mutex, PoisonError};

use chrono::{NaiveDate, Utc};
use tracing::info;

use careforecast_forecasting::{ForecastEngine, ForecastProviders, RandomJitter};
use careforecast_infra::{
    AppConfig, ForecastRefreshHandle, ForecastRefreshRunner, InMemoryForecastSink, InMemoryHospitalStore,
    PostgresHospitalStore,
};

/// History generated for the in-memory demo store.
const DEMO_HISTORY_DAYS: u32 = 180;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    InMemory,
    Postgres,
}

/// Everything the handlers share.
pub struct AppServices {
    pub engine: ForecastEngine,
    pub snapshots: Arc<InMemoryForecastSink>,
    pub backend: StoreBackend,
    refresh: Mutex<Option<ForecastRefreshHandle>>,
}

impl AppServices {
    /// Start date used when a request does not name one.
    pub fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }

    /// Request an immediate snapshot refresh. `false` when refresh is disabled.
    pub fn trigger_refresh(&self) -> bool {
        match self.refresh.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            Some(handle) => {
                handle.trigger();
                true
            }
            None => false,
        }
    }

    /// Stop the background refresh, if any. Idempotent.
    pub async fn shutdown(&self) {
        let handle = self.refresh.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            handle.shutdown().await;
        }
    }
}

/// Wire providers, engine and refresh runner from configuration.
///
/// `DATABASE_URL` selects the Postgres store; without it an in-memory store
/// seeded with demo activity is used.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let (providers, backend) = match &config.database_url {
        Some(url) => {
            let store = PostgresHospitalStore::connect(url, config.database_max_connections).await?;
            (ForecastProviders::from_store(Arc::new(store)), StoreBackend::Postgres)
        }
        None => {
            info!("DATABASE_URL not set; using in-memory demo store");
            let store = InMemoryHospitalStore::with_demo_data(Utc::now().date_naive(), DEMO_HISTORY_DAYS);
            (ForecastProviders::from_store(Arc::new(store)), StoreBackend::InMemory)
        }
    };

    let mut engine = ForecastEngine::new(providers, config.forecast.clone());
    if let Some(seed) = config.jitter_seed {
        engine = engine.with_jitter(Arc::new(RandomJitter::seeded(seed)));
    }

    let snapshots = Arc::new(InMemoryForecastSink::new());
    let refresh = config.refresh_interval.map(|interval| {
        ForecastRefreshRunner {
            interval,
            horizon_days: config.refresh_horizon_days,
            ..ForecastRefreshRunner::default()
        }
        .spawn(engine.clone(), snapshots.clone())
    });

    info!(backend = ?backend, refresh = refresh.is_some(), "services ready");

    Ok(AppServices {
        engine,
        snapshots,
        backend,
        refresh: Mutex::new(refresh),
    })
}
