use axum::{
    routing::{get, post},
    Router,
};

pub mod forecasts;
pub mod statistics;
pub mod system;

/// Router for the forecasting endpoints (mounted under `/ml`).
pub fn router() -> Router {
    Router::new()
        .route("/predictions/generate", post(forecasts::generate))
        .route("/predictions/service/:service", get(forecasts::for_service))
        .route("/predictions/all-services", get(forecasts::all_services))
        .route("/predictions/latest", get(forecasts::latest))
        .route("/predictions/refresh", post(forecasts::refresh))
        .route("/statistics/current", get(statistics::current))
}
