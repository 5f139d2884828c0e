use std::sync::{Arc, Mutex};

use chrono::Utc;
use screenshots::image::{Rgb, RgbImage};
use tracing::{debug, warn};

use crate::capture::{self, CaptureError, FrameSource, PrimaryDisplay};
use crate::config::ServiceConfig;
use crate::history::HistoryBuffer;
use crate::models::Capture;

pub const SYNTHETIC_WIDTH: u32 = 1920;
pub const SYNTHETIC_HEIGHT: u32 = 1080;
const SYNTHETIC_COLOR: Rgb<u8> = Rgb([30, 30, 30]);

enum Frame {
  Live {
    image_data: String,
    width: u32,
    height: u32,
  },
  Synthetic,
}

/// When a frame was taken and its position in capture order.
#[derive(Clone, Copy)]
struct Stamp {
  timestamp: i64,
  seq: u64,
}

/// Runs capture-and-encode cycles and records each result in the history.
pub struct CaptureService {
  source: Option<Box<dyn FrameSource>>,
  history: Arc<HistoryBuffer>,
  quality: u8,
  mock_mode: bool,
  synthetic_payload: String,
  sequence: Mutex<u64>,
}

impl CaptureService {
  /// Opens the primary display unless mock mode is forced. A display that
  /// cannot be opened leaves the service in synthetic-only mode.
  pub fn from_config(config: &ServiceConfig, history: Arc<HistoryBuffer>) -> Result<Self, CaptureError> {
    let source: Option<Box<dyn FrameSource>> = if config.enable_mock {
      None
    } else {
      match PrimaryDisplay::open() {
        Ok(display) => Some(Box::new(display)),
        Err(err) => {
          warn!("could not initialize screen capture, falling back to mock mode: {err}");
          None
        }
      }
    };
    Self::new(source, history, config.quality, config.enable_mock)
  }

  /// Fails only if the synthetic frame cannot be encoded.
  pub fn new(
    source: Option<Box<dyn FrameSource>>,
    history: Arc<HistoryBuffer>,
    quality: u8,
    mock_mode: bool,
  ) -> Result<Self, CaptureError> {
    let blank = RgbImage::from_pixel(SYNTHETIC_WIDTH, SYNTHETIC_HEIGHT, SYNTHETIC_COLOR);
    let synthetic_payload = capture::encode_rgb(&blank, quality)?;
    Ok(Self {
      source,
      history,
      quality,
      mock_mode,
      synthetic_payload,
      sequence: Mutex::new(0),
    })
  }

  pub fn mock_mode(&self) -> bool {
    self.mock_mode
  }

  pub fn has_display(&self) -> bool {
    self.source.is_some()
  }

  pub fn history(&self) -> &HistoryBuffer {
    &self.history
  }

  /// Produces one capture and appends it to the history. Never fails: any
  /// live-capture error yields a synthetic frame instead.
  pub fn capture_once(&self) -> Arc<Capture> {
    let (frame, stamp) = self.grab_frame();
    let capture = Arc::new(self.to_capture(frame, stamp));
    self.history.append(capture.clone());
    capture
  }

  fn grab_frame(&self) -> (Frame, Stamp) {
    let source = match (&self.source, self.mock_mode) {
      (Some(source), false) => source,
      _ => return (Frame::Synthetic, self.stamp()),
    };

    let image = match source.grab() {
      Ok(image) => image,
      Err(err) => {
        let stamp = self.stamp();
        warn!("error capturing screen: {err}");
        return (Frame::Synthetic, stamp);
      }
    };
    let stamp = self.stamp();

    let (width, height) = image.dimensions();
    match capture::encode_rgba(image, self.quality) {
      Ok(image_data) => (
        Frame::Live {
          image_data,
          width,
          height,
        },
        stamp,
      ),
      Err(err) => {
        warn!("error encoding screen capture: {err}");
        (Frame::Synthetic, stamp)
      }
    }
  }

  /// Reads the clock and bumps the sequence under one lock, so sequence
  /// order and timestamp order agree across threads.
  fn stamp(&self) -> Stamp {
    let mut next = self.sequence.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let seq = *next;
    *next += 1;
    Stamp {
      timestamp: Utc::now().timestamp_millis(),
      seq,
    }
  }

  fn to_capture(&self, frame: Frame, stamp: Stamp) -> Capture {
    let Stamp { timestamp, seq } = stamp;
    let capture = match frame {
      Frame::Live {
        image_data,
        width,
        height,
      } => Capture {
        id: format!("capture_{timestamp}_{seq}"),
        timestamp,
        image_data,
        width,
        height,
      },
      Frame::Synthetic => Capture {
        id: format!("mock_capture_{timestamp}_{seq}"),
        timestamp,
        image_data: self.synthetic_payload.clone(),
        width: SYNTHETIC_WIDTH,
        height: SYNTHETIC_HEIGHT,
      },
    };
    debug!(id = %capture.id, width = capture.width, height = capture.height, "captured");
    capture
  }
}
