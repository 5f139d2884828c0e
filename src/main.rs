mod capture;
mod config;
mod history;
mod logger;
mod models;
mod router;
mod service;
mod stream;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use config::ServiceConfig;
use history::HistoryBuffer;
use router::{run_router, RouterState};
use service::CaptureService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let config = ServiceConfig::from_env()?;
  logger::init(&config.log_level)?;
  info!(
    interval_ms = config.capture_interval_ms,
    quality = config.quality,
    max_screenshots = config.max_screenshots,
    mock = config.enable_mock,
    "screen capture service starting"
  );

  let history = Arc::new(HistoryBuffer::new(config.max_screenshots));
  let service = CaptureService::from_config(&config, history).context("failed to prepare capture service")?;
  if !service.has_display() {
    warn!("serving synthetic frames only");
  }

  let addr = config.bind_addr();
  let listener = std::net::TcpListener::bind(&addr).with_context(|| format!("failed to bind {addr}"))?;
  info!("listening on http://{}", listener.local_addr()?);

  let state = RouterState::new(config, Arc::new(service));
  run_router(listener, state, shutdown_signal()).await
}

async fn shutdown_signal() {
  if let Err(err) = tokio::signal::ctrl_c().await {
    warn!("failed to listen for shutdown signal: {err}");
    std::future::pending::<()>().await;
  }
  info!("shutting down");
}
