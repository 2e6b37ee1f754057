use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use careforecast_core::{DomainError, ForecastRequest, MetricKind};
use careforecast_forecasting::{ForecastEngine, ForecastResult};

/// One all-services batch for one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSnapshot {
    pub metric: MetricKind,
    pub start_date: NaiveDate,
    pub horizon_days: u32,
    pub generated_at: DateTime<Utc>,
    pub results: Vec<ForecastResult>,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("snapshot rejected: {0}")]
    Rejected(String),
}

/// Destination for refreshed forecasts.
///
/// Snapshots are derived data: publishing one never mutates hospital records.
pub trait ForecastSink: Send + Sync + 'static {
    fn publish(&self, snapshot: ForecastSnapshot) -> Result<(), SinkError>;
}

/// Keeps the latest snapshot per metric.
#[derive(Debug, Default)]
pub struct InMemoryForecastSink {
    inner: RwLock<HashMap<MetricKind, ForecastSnapshot>>,
}

impl InMemoryForecastSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self, metric: MetricKind) -> Option<ForecastSnapshot> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&metric)
            .cloned()
    }
}

impl ForecastSink for InMemoryForecastSink {
    fn publish(&self, snapshot: ForecastSnapshot) -> Result<(), SinkError> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(snapshot.metric, snapshot);
        Ok(())
    }
}

#[derive(Debug, Error)]
enum RefreshError {
    #[error("invalid refresh request: {0}")]
    Request(#[from] DomainError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Config for the scheduled forecast refresh.
#[derive(Debug, Clone)]
pub struct ForecastRefreshRunner {
    pub interval: Duration,
    pub horizon_days: u32,
    pub max_retries: u32,
    pub base_backoff: Duration,
    /// Start date of every refreshed forecast.
    pub today: fn() -> NaiveDate,
}

fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

impl Default for ForecastRefreshRunner {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(900),
            horizon_days: 30,
            max_retries: 5,
            base_backoff: Duration::from_millis(250),
            today: utc_today,
        }
    }
}

/// Handle for the running refresh task (shutdown + trigger hook).
///
/// Dropping the handle stops the runner at its next wake-up.
#[derive(Debug)]
pub struct ForecastRefreshHandle {
    shutdown: Option<oneshot::Sender<()>>,
    trigger: mpsc::Sender<()>,
    join: Option<JoinHandle<()>>,
}

impl ForecastRefreshHandle {
    /// Request an immediate refresh.
    ///
    /// Triggers are coalesced: if one is already pending this is a no-op.
    pub fn trigger(&self) {
        let _ = self.trigger.try_send(());
    }

    /// Gracefully stop the runner and wait for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }
}

impl ForecastRefreshRunner {
    /// Spawn the runner on the current tokio runtime.
    ///
    /// - Schedule: runs on startup, then every `interval`
    /// - Trigger: `handle.trigger()` forces a run
    /// - Failures: logged and retried with bounded exponential backoff; never propagate
    pub fn spawn<S>(&self, engine: ForecastEngine, sink: Arc<S>) -> ForecastRefreshHandle
    where
        S: ForecastSink,
    {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (trigger_tx, trigger_rx) = mpsc::channel(1);

        let join = tokio::spawn(runner_loop(self.clone(), engine, sink, shutdown_rx, trigger_rx));

        ForecastRefreshHandle {
            shutdown: Some(shutdown_tx),
            trigger: trigger_tx,
            join: Some(join),
        }
    }
}

async fn runner_loop<S>(
    cfg: ForecastRefreshRunner,
    engine: ForecastEngine,
    sink: Arc<S>,
    mut shutdown_rx: oneshot::Receiver<()>,
    mut trigger_rx: mpsc::Receiver<()>,
) where
    S: ForecastSink,
{
    info!(interval_secs = cfg.interval.as_secs(), horizon_days = cfg.horizon_days, "forecast refresh runner started");

    let mut ticker = tokio::time::interval(cfg.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut pending = false;
    let mut failures: u32 = 0;

    loop {
        if !pending {
            // The first tick completes immediately: run once on startup.
            tokio::select! {
                biased;
                _ = &mut shutdown_rx => break,
                _ = ticker.tick() => {}
                Some(()) = trigger_rx.recv() => {}
            }
        }
        pending = false;

        match refresh_all(&cfg, &engine, sink.as_ref()).await {
            Ok(published) => {
                failures = 0;
                debug!(published, "forecast snapshots refreshed");
            }
            Err(e) => {
                warn!(error = %e, attempt = failures + 1, "forecast refresh failed");
                failures += 1;
                if failures <= cfg.max_retries {
                    pending = true;
                    tokio::select! {
                        biased;
                        _ = &mut shutdown_rx => break,
                        _ = tokio::time::sleep(backoff(cfg.base_backoff, failures)) => {}
                    }
                } else {
                    failures = 0;
                }
            }
        }
    }

    info!("forecast refresh runner stopped");
}

async fn refresh_all<S>(cfg: &ForecastRefreshRunner, engine: &ForecastEngine, sink: &S) -> Result<usize, RefreshError>
where
    S: ForecastSink,
{
    let template_service = engine
        .config()
        .known_services
        .first()
        .cloned()
        .ok_or_else(|| DomainError::validation("no services configured"))?;
    let start_date = (cfg.today)();

    let mut published = 0;
    for metric in MetricKind::ALL {
        let request = ForecastRequest::new(template_service.clone(), metric, start_date, i64::from(cfg.horizon_days))?;
        let results = engine.generate_all(&request).await;
        sink.publish(ForecastSnapshot {
            metric,
            start_date,
            horizon_days: cfg.horizon_days,
            generated_at: Utc::now(),
            results,
        })?;
        published += 1;
    }
    Ok(published)
}

fn backoff(base: Duration, attempt: u32) -> Duration {
    // base * 2^(attempt-1), capped at 10s.
    let pow = 1u32 << attempt.saturating_sub(1).min(10);
    let ms = base.as_millis().saturating_mul(pow as u128);
    Duration::from_millis(ms.min(10_000) as u64)
}
