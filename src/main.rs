use std::future;
use std::sync::Arc;

use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use ev_dashboard::bridge;
use ev_dashboard::config::MonitorConfig;
use ev_dashboard::presentation::PresenterOptions;
use ev_dashboard::types::MonitorError;
use ev_dashboard::vehicle_client::RestConnector;

#[tokio::main]
async fn main() -> Result<(), MonitorError> {
    // stdout carries the UI protocol, so logs go to stderr
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let startup = MonitorConfig::load().await;
    let settings = startup.clone().unwrap_or_else(MonitorConfig::from_env);
    let connector = Arc::new(RestConnector::new(&settings.api_url)?);
    info!(api_url = %settings.api_url, "Using vehicle cloud bridge");

    bridge::serve(
        connector,
        startup,
        PresenterOptions::from_config(&settings),
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        interrupted(),
    )
    .await
}

async fn interrupted() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Unable to listen for ctrl-c");
        future::pending::<()>().await;
    }
}
