use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::models::{StreamEvent, CAPTURE_EVENT};
use crate::service::CaptureService;

enum SessionEnd {
  Disconnected,
  Failed(String),
}

/// Counts live streaming sessions for `/health`.
#[derive(Clone, Default)]
pub struct ActiveStreams(Arc<AtomicUsize>);

impl ActiveStreams {
  pub fn count(&self) -> usize {
    self.0.load(Ordering::SeqCst)
  }

  fn enter(&self) -> StreamGuard {
    self.0.fetch_add(1, Ordering::SeqCst);
    StreamGuard(self.0.clone())
  }
}

struct StreamGuard(Arc<AtomicUsize>);

impl Drop for StreamGuard {
  fn drop(&mut self) {
    self.0.fetch_sub(1, Ordering::SeqCst);
  }
}

/// Pushes a capture to the client every `interval` until it disconnects or a
/// send fails. The socket reader owns the cancellation token: a close frame,
/// end of stream or read error cancels the pending capture, send or wait.
pub async fn run_session(
  socket: WebSocket,
  service: Arc<CaptureService>,
  interval: Duration,
  streams: ActiveStreams,
) {
  let _guard = streams.enter();
  let (mut sender, mut receiver) = socket.split();
  let cancel = CancellationToken::new();
  info!("client connected to screen stream");

  let reader = tokio::spawn({
    let cancel = cancel.clone();
    async move {
      let _cancel_on_exit = cancel.drop_guard();
      while let Some(msg) = receiver.next().await {
        match msg {
          Ok(Message::Close(_)) => break,
          Ok(_) => {}
          Err(err) => {
            debug!("stream read error: {err}");
            break;
          }
        }
      }
    }
  });

  let end = loop {
    let capture = tokio::select! {
      _ = cancel.cancelled() => break SessionEnd::Disconnected,
      joined = tokio::task::spawn_blocking({
        let service = service.clone();
        move || service.capture_once()
      }) => match joined {
        Ok(capture) => capture,
        Err(err) => break SessionEnd::Failed(format!("capture task failed: {err}")),
      },
    };

    let event = StreamEvent {
      event: CAPTURE_EVENT,
      data: &capture,
    };
    let text = match serde_json::to_string(&event) {
      Ok(text) => text,
      Err(err) => break SessionEnd::Failed(err.to_string()),
    };

    tokio::select! {
      _ = cancel.cancelled() => break SessionEnd::Disconnected,
      sent = sender.send(Message::Text(text)) => {
        if let Err(err) = sent {
          if cancel.is_cancelled() {
            break SessionEnd::Disconnected;
          }
          break SessionEnd::Failed(err.to_string());
        }
      }
    }

    tokio::select! {
      _ = cancel.cancelled() => break SessionEnd::Disconnected,
      _ = tokio::time::sleep(interval) => {}
    }
  };

  reader.abort();
  match end {
    SessionEnd::Disconnected => info!("client disconnected from screen stream"),
    SessionEnd::Failed(err) => {
      warn!("screen stream error: {err}");
      let _ = sender.close().await;
    }
  }
}
