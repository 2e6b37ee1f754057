//! Process configuration loaded from the environment.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context};

use careforecast_forecasting::ForecastConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 900;
const DEFAULT_REFRESH_HORIZON_DAYS: u32 = 30;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,

    /// When set, providers read from Postgres; otherwise from the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,

    pub forecast: ForecastConfig,

    /// `None` disables the scheduled refresh.
    pub refresh_interval: Option<Duration>,
    pub refresh_horizon_days: u32,

    /// Pins confidence jitter for reproducible output.
    pub jitter_seed: Option<u64>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address such as 0.0.0.0:8080")?;

        let forecast = match var("FORECAST_CONFIG") {
            Some(path) => load_forecast_config(Path::new(&path))?,
            None => ForecastConfig::default(),
        };

        let refresh_secs = parse_or(var("REFRESH_INTERVAL_SECS"), "REFRESH_INTERVAL_SECS", DEFAULT_REFRESH_INTERVAL_SECS)?;
        let refresh_horizon_days =
            parse_or(var("REFRESH_HORIZON_DAYS"), "REFRESH_HORIZON_DAYS", DEFAULT_REFRESH_HORIZON_DAYS)?;
        if refresh_horizon_days == 0 {
            return Err(anyhow!("REFRESH_HORIZON_DAYS must be positive"));
        }

        Ok(Self {
            bind_addr,
            database_url: var("DATABASE_URL"),
            database_max_connections: parse_or(
                var("DATABASE_MAX_CONNECTIONS"),
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_MAX_CONNECTIONS,
            )?,
            forecast,
            refresh_interval: (refresh_secs > 0).then(|| Duration::from_secs(refresh_secs)),
            refresh_horizon_days,
            jitter_seed: var("JITTER_SEED")
                .map(|v| v.parse().context("JITTER_SEED must be an unsigned integer"))
                .transpose()?,
        })
    }
}

/// Read a JSON [`ForecastConfig`]; omitted fields keep their defaults.
pub fn load_forecast_config(path: &Path) -> anyhow::Result<ForecastConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read forecast config {}", path.display()))?;
    parse_forecast_config(&raw).with_context(|| format!("invalid forecast config {}", path.display()))
}

pub fn parse_forecast_config(raw: &str) -> anyhow::Result<ForecastConfig> {
    let config: ForecastConfig = serde_json::from_str(raw)?;
    Ok(config.validate()?)
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => v.parse().with_context(|| format!("{key} has an invalid value '{v}'")),
        None => Ok(default),
    }
}
