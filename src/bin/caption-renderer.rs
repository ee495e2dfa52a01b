use anyhow::Context as _;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use caption_renderer::config::ServerConfig;
use caption_renderer::server::router;
use caption_renderer::{Compositor, FontLibrary, LogoFetcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::parse();
    let profile = config.load_profile().with_context(|| match &config.style {
        Some(path) => format!("loading style profile {}", path.display()),
        None => "building default style profile".to_string(),
    })?;

    let fonts = FontLibrary::system(&profile.text.font_families);
    match fonts.primary() {
        Some(face) => info!(family = face.family(), "caption font selected"),
        None => warn!("no font faces found; captions will not be drawn"),
    }

    let fetcher = LogoFetcher::new(config.logo_timeout())
        .context("building HTTP client")?
        .with_max_bytes(config.max_logo_bytes);
    let app = router(Compositor::new(profile, fonts, fetcher), config.max_upload_bytes);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
