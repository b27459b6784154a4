use anyhow::Context;

use stockpile_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockpile_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;

    let app = stockpile_api::app::build_app(&config)
        .await
        .context("failed to initialise inventory store")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
