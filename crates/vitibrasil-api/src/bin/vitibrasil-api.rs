use vitibrasil::WebScraper;
use vitibrasil_api::{AppState, config::Config, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .write_style(env_logger::WriteStyle::Never)
        .init();

    let config = Config::from_env().inspect_err(|e| log::error!("Invalid configuration: {e}"))?;

    let mut scraper = WebScraper::new()?;
    if let Some(base_url) = &config.base_url {
        log::info!("Using site root {}", base_url);
        scraper = scraper.with_base_url(base_url);
    }

    let state = AppState::new(scraper, config.max_concurrent_fetches);
    let router = router(state, config.credentials.as_ref());
    let tcp_listener = tokio::net::TcpListener::bind(&config.bind_address).await?;

    log::info!("Starting vitibrasil API on address: {}", config.bind_address);

    axum::serve(tcp_listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for ctrl-c: {e:?}");
    }
    log::info!("Shutting down");
}
