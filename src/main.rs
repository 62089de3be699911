use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub(crate) mod config;
pub(crate) mod errors;
mod import;
pub(crate) mod models;
mod router;
mod routes;
pub(crate) mod session;
pub(crate) mod srs;
pub(crate) mod store;
mod translate;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hanzicards=info,tower_http=info")),
        )
        .init();

    let config = config::AppConfig::from_env()?;
    let store = store::CardStore::open(&config.data_path)
        .await
        .with_context(|| format!("Failed to load cards from {}", config.data_path.display()))?;
    let translator = translate::Translator::new(config.translate.clone())?;
    let state = router::AppState::new(
        store,
        Arc::new(srs::SystemClock),
        translator,
        config.import_delay,
    );
    let router = router::init_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Listening on {}", config.bind_addr);
    axum::serve(listener, router).await.context("Server error")?;

    Ok(())
}
