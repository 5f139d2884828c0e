use serde::{Deserialize, Serialize};

pub const CAPTURE_EVENT: &str = "screen:capture";

/// One encoded snapshot of the primary display.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Capture {
  pub id: String,
  pub timestamp: i64,
  /// Base64 JPEG payload.
  pub image_data: String,
  pub width: u32,
  pub height: u32,
}

#[derive(Serialize)]
pub struct HealthConfig {
  /// Seconds between streamed captures.
  pub interval: f64,
  pub quality: u8,
  pub max_screenshots: usize,
}

#[derive(Serialize)]
pub struct HealthResponse {
  pub status: String,
  pub mock_mode: bool,
  pub has_display: bool,
  pub config: HealthConfig,
  pub buffered: usize,
  pub active_streams: usize,
}

#[derive(Serialize)]
pub struct CaptureResponse<'a> {
  pub success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data: Option<&'a Capture>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

#[derive(Serialize)]
pub struct StreamEvent<'a> {
  pub event: &'a str,
  pub data: &'a Capture,
}
