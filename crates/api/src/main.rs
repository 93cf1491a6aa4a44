use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shelfkeeper_observability::init();

    let config = shelfkeeper_api::AppConfig::from_env()?;
    let services = shelfkeeper_api::AppServices::from_config(&config)?;
    let app = shelfkeeper_api::build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        data_dir = %config.store.data_dir.display(),
        "listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
