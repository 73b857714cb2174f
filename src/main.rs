use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use kermode::{
    config::AppConfig, fetch::HttpFetcher, plugin::Catalogue, routes, state::AppState,
    strings::StringTable,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kermode=info,tower_http=info".into()),
        )
        .with(fmt::layer())
        .init();

    // ── Config ───────────────────────────────────────────────────────────────
    let config = Arc::new(AppConfig::from_env()?);
    info!("Starting kermode, binding to {}", config.bind);

    let strings = Arc::new(StringTable::load(config.strings_path.as_deref())?);

    // ── Catalogue ────────────────────────────────────────────────────────────
    let fetcher = Arc::new(HttpFetcher::new(&config)?);
    if config.fetch_retries > 0 {
        info!("Retrying failed fetches up to {} time(s)", config.fetch_retries);
    }
    let catalogue = Catalogue::new(Arc::clone(&config), fetcher, strings);

    // ── HTTP server ───────────────────────────────────────────────────────────
    let router = routes::build_router(AppState { catalogue });

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!("Listening on http://{}", config.bind);

    axum::serve(listener, router).await?;

    Ok(())
}
