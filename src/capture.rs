use base64::Engine;
use jpeg_encoder::{ColorType, Encoder, EncodingError};
use screenshots::image::{DynamicImage, RgbImage, RgbaImage};

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
  #[error("no screens found")]
  NoDisplay,
  #[error("screen grab failed: {0}")]
  Grab(String),
  #[error("frame of {width}x{height} exceeds jpeg limits")]
  TooLarge { width: u32, height: u32 },
  #[error("jpeg encoding failed: {0}")]
  Encode(#[from] EncodingError),
}

/// Something that can grab one raw frame of a display.
pub trait FrameSource: Send + Sync {
  fn grab(&self) -> Result<RgbaImage, CaptureError>;
}

/// The primary monitor, resolved once at startup.
pub struct PrimaryDisplay {
  screen: screenshots::Screen,
}

impl PrimaryDisplay {
  pub fn open() -> Result<Self, CaptureError> {
    let screens = screenshots::Screen::all().map_err(|err| CaptureError::Grab(err.to_string()))?;
    let screen = screens
      .iter()
      .find(|s| s.display_info.is_primary)
      .or_else(|| screens.first())
      .cloned()
      .ok_or(CaptureError::NoDisplay)?;
    Ok(Self { screen })
  }
}

impl FrameSource for PrimaryDisplay {
  fn grab(&self) -> Result<RgbaImage, CaptureError> {
    self
      .screen
      .capture()
      .map_err(|err| CaptureError::Grab(err.to_string()))
  }
}

/// Drops the alpha channel and JPEG-encodes at `quality` with optimized
/// Huffman tables, returning base64 text.
pub fn encode_rgba(image: RgbaImage, quality: u8) -> Result<String, CaptureError> {
  let rgb = DynamicImage::ImageRgba8(image).to_rgb8();
  encode_rgb(&rgb, quality)
}

pub fn encode_rgb(image: &RgbImage, quality: u8) -> Result<String, CaptureError> {
  let jpeg = jpeg_bytes(image, quality, true)?;
  Ok(base64::engine::general_purpose::STANDARD.encode(jpeg))
}

fn jpeg_bytes(image: &RgbImage, quality: u8, optimized: bool) -> Result<Vec<u8>, CaptureError> {
  let (width, height) = image.dimensions();
  let too_large = || CaptureError::TooLarge { width, height };
  let w = u16::try_from(width).map_err(|_| too_large())?;
  let h = u16::try_from(height).map_err(|_| too_large())?;

  let mut jpeg = Vec::new();
  let mut encoder = Encoder::new(&mut jpeg, quality);
  encoder.set_optimized_huffman_tables(optimized);
  encoder.encode(image.as_raw(), w, h, ColorType::Rgb)?;
  Ok(jpeg)
}
