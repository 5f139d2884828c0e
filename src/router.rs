use std::future::Future;
use std::net::TcpListener;
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use crate::config::ServiceConfig;
use crate::models::{Capture, CaptureResponse, HealthConfig, HealthResponse};
use crate::service::CaptureService;
use crate::stream::{run_session, ActiveStreams};

pub struct RouterState {
  pub config: ServiceConfig,
  pub service: Arc<CaptureService>,
  pub streams: ActiveStreams,
}

impl RouterState {
  pub fn new(config: ServiceConfig, service: Arc<CaptureService>) -> Self {
    Self {
      config,
      service,
      streams: ActiveStreams::default(),
    }
  }
}

pub fn router(state: RouterState) -> Router {
  Router::new()
    .route("/health", get(health))
    .route("/capture", post(capture_now))
    .route("/capture/latest", get(latest))
    .route("/ws", get(ws))
    .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
    .with_state(Arc::new(state))
}

pub async fn run_router<F>(listener: TcpListener, state: RouterState, shutdown: F) -> anyhow::Result<()>
where
  F: Future<Output = ()> + Send + 'static,
{
  listener.set_nonblocking(true)?;
  let listener = tokio::net::TcpListener::from_std(listener)?;
  axum::serve(listener, router(state))
    .with_graceful_shutdown(shutdown)
    .await?;
  Ok(())
}

async fn health(State(state): State<Arc<RouterState>>) -> Json<HealthResponse> {
  Json(HealthResponse {
    status: "healthy".to_string(),
    mock_mode: state.service.mock_mode(),
    has_display: state.service.has_display(),
    config: HealthConfig {
      interval: state.config.capture_interval_ms as f64 / 1000.0,
      quality: state.config.quality,
      max_screenshots: state.service.history().capacity(),
    },
    buffered: state.service.history().len(),
    active_streams: state.streams.count(),
  })
}

async fn capture_now(State(state): State<Arc<RouterState>>) -> Response {
  match capture_blocking(&state.service).await {
    Ok(capture) => success_response(&capture),
    Err(message) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &message),
  }
}

async fn latest(State(state): State<Arc<RouterState>>) -> Response {
  if let Some(capture) = state.service.history().latest() {
    return success_response(&capture);
  }
  match capture_blocking(&state.service).await {
    Ok(capture) => success_response(&capture),
    Err(message) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &message),
  }
}

async fn ws(ws: WebSocketUpgrade, State(state): State<Arc<RouterState>>) -> Response {
  let service = state.service.clone();
  let interval = state.config.capture_interval();
  let streams = state.streams.clone();
  ws.on_upgrade(move |socket| run_session(socket, service, interval, streams))
}

async fn capture_blocking(service: &Arc<CaptureService>) -> Result<Arc<Capture>, String> {
  let service = service.clone();
  tokio::task::spawn_blocking(move || service.capture_once())
    .await
    .map_err(|err| {
      error!("capture task failed: {err}");
      "Failed to capture screen".to_string()
    })
}

fn success_response(capture: &Capture) -> Response {
  let body = CaptureResponse {
    success: true,
    data: Some(capture),
    error: None,
  };
  (StatusCode::OK, Json(body)).into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
  let body = CaptureResponse {
    success: false,
    data: None,
    error: Some(message.to_string()),
  };
  (status, Json(body)).into_response()
}
