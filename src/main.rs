use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use camstream::config::Config;
use camstream::http_server::HttpServer;
use camstream::source::DefaultOpener;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = Config::parse();

    info!("Starting camstream MJPEG server");
    info!("Live source: {}", config.source);
    info!(
        "View the stream at http://{}:{}/live",
        config.bind, config.port
    );

    let opener = Arc::new(DefaultOpener::new(config.target_size()));
    let server = HttpServer::new(config, opener);
    server.start().await?;

    Ok(())
}
