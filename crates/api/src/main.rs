use anyhow::Context;

use medistock_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    medistock_observability::init();

    let config = ApiConfig::from_env()?;
    let app = medistock_api::app::build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
