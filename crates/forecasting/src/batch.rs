//! One forecast per known service, generated concurrently.

use futures::future::join_all;
use tracing::info;

use careforecast_core::ForecastRequest;

use crate::generator::ForecastEngine;
use crate::result::ForecastResult;

impl ForecastEngine {
    /// Runs `template` for every configured service.
    ///
    /// The template's own service is ignored. Results follow the configured
    /// service order regardless of completion order.
    pub async fn generate_all(&self, template: &ForecastRequest) -> Vec<ForecastResult> {
        let requests: Vec<ForecastRequest> = self
            .config()
            .known_services
            .iter()
            .map(|service| template.for_service(service.clone()))
            .collect();

        let results = join_all(requests.iter().map(|request| self.generate(request))).await;

        info!(
            metric = %template.metric(),
            services = results.len(),
            horizon_days = template.horizon_days(),
            "batch forecast generated"
        );
        results
    }
}
