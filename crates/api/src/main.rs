use std::sync::Arc;

use anyhow::Context;

use rentstock_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    rentstock_observability::init(&config.log.filter, config.log.json);

    let services = rentstock_api::app::services::build_services(&config.store)
        .await
        .context("failed to initialise storage")?;
    let app = rentstock_api::app::build_app(Arc::new(services));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        backend = ?config.store.backend,
        "listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
