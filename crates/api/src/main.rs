use std::sync::Arc;

use anyhow::Context;

use careforecast_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    careforecast_observability::init();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    let bind_addr = config.bind_addr;

    let services = Arc::new(careforecast_api::app::services::build_services(&config).await?);
    let app = careforecast_api::app::build_app(services.clone());

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    services.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
