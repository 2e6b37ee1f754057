use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    response::IntoResponse,
    Json,
};

use crate::app::{
    dto::{self, StatisticsQuery},
    errors,
    services::AppServices,
};

/// Current per-service statistics; one failing service does not fail the rest.
///
/// `type` defaults to PATIENTS.
pub async fn current(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<StatisticsQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::query_rejection(e),
    };
    let metric = match dto::parse_metric_or(query.metric.as_deref(), dto::DEFAULT_STATISTICS_METRIC) {
        Ok(m) => m,
        Err(e) => return errors::domain_error_to_response(e),
    };

    Json(services.engine.current_statistics(metric).await).into_response()
}
