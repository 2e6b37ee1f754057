use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;

use crate::app::{
    dto::{self, ForecastQuery, GenerateForecastRequest, LatestQuery, LatestSnapshotResponse},
    errors,
    services::AppServices,
};

pub async fn generate(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<GenerateForecastRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };
    let request = match dto::forecast_request(
        &body.service,
        body.prediction_type.as_deref(),
        body.start_date.as_deref(),
        body.days_ahead,
        services.today(),
    ) {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    Json(services.engine.generate(&request).await).into_response()
}

/// Quick forecast for one service, starting today.
pub async fn for_service(
    Extension(services): Extension<Arc<AppServices>>,
    Path(service): Path<String>,
    query: Result<Query<ForecastQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::query_rejection(e),
    };
    let request = match dto::forecast_request(
        &service,
        query.prediction_type.as_deref(),
        None,
        query.days_ahead,
        services.today(),
    ) {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    Json(services.engine.generate(&request).await).into_response()
}

/// Batch forecast over every known service, in configured order.
pub async fn all_services(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<ForecastQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::query_rejection(e),
    };
    let Some(first) = services.engine.config().known_services.first().cloned() else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "no services configured");
    };

    let template = match dto::forecast_request(
        first.as_str(),
        query.prediction_type.as_deref(),
        None,
        query.days_ahead,
        services.today(),
    ) {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    Json(services.engine.generate_all(&template).await).into_response()
}

/// Most recent snapshot published by the refresh runner.
pub async fn latest(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<LatestQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::query_rejection(e),
    };
    let metric = match dto::parse_metric(query.prediction_type.as_deref()) {
        Ok(m) => m,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.snapshots.latest(metric) {
        Some(snapshot) => {
            let age_seconds = (Utc::now() - snapshot.generated_at).num_seconds().max(0);
            Json(LatestSnapshotResponse { snapshot, age_seconds }).into_response()
        }
        None => errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("no {metric} forecast snapshot yet"),
        ),
    }
}

/// Ask the background runner for an immediate refresh of every snapshot.
pub async fn refresh(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    if services.trigger_refresh() {
        (StatusCode::ACCEPTED, Json(serde_json::json!({ "status": "refresh_requested" }))).into_response()
    } else {
        errors::json_error(StatusCode::CONFLICT, "refresh_disabled", "scheduled refresh is not running")
    }
}
