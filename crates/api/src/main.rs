use anyhow::Context;

use parcelhub_api::app::{self, AppServices, services::build_verifier};
use parcelhub_infra::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the real environment still applies.
    let _ = dotenvy::dotenv();
    parcelhub_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let verifier = build_verifier(&config.identity).context("invalid identity credentials")?;
    let services = AppServices::from_config(&config)
        .await
        .context("failed to connect to the store")?;

    let app = app::build_app(services, verifier);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
