//! Infrastructure layer: provider adapters, configuration loading, background refresh.

pub mod config;
pub mod memory;
pub mod postgres;
pub mod runner;

pub use config::AppConfig;
pub use memory::{AlertId, InMemoryHospitalStore, StayId};
pub use postgres::PostgresHospitalStore;
pub use runner::{
    ForecastRefreshHandle, ForecastRefreshRunner, ForecastSink, ForecastSnapshot, InMemoryForecastSink, SinkError,
};
