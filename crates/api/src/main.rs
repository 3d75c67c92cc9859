use std::sync::Arc;

use anyhow::Context;

use panelerp_infra::{AppConfig, InMemoryRoleCatalogStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;
    panelerp_observability::init(&config.logging);

    let services = Arc::new(panelerp_api::app::services::AppServices::new(
        InMemoryRoleCatalogStore::default(),
    ));
    let app = panelerp_api::app::build_app(services);

    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
