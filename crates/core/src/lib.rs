//! `careforecast-core` — forecasting domain primitives.
//!
//! This crate contains **pure domain** types (no IO, no async, no storage).

pub mod error;
pub mod metric;
pub mod request;
pub mod service;
pub mod window;

pub use error::{DomainError, DomainResult};
pub use metric::MetricKind;
pub use request::{ForecastRequest, MAX_HORIZON_DAYS};
pub use service::ServiceName;
pub use window::HistoricalWindow;
