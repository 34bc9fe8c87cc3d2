//! JPEG encoding
//!
//! The codec sits behind [`FrameEncoder`] so the producer can be exercised
//! with encoders that fail on demand.

use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
use image::ExtendedColorType;

use super::convert::Bgr8Image;
use super::encoded::EncodedFrame;
use super::error::FrameError;

/// Default JPEG quality (0-100); favors latency and bandwidth over fidelity
pub const DEFAULT_JPEG_QUALITY: u8 = 50;

/// Compresses a normalized image into an [`EncodedFrame`]
pub trait FrameEncoder: Send + Sync + 'static {
    /// Encode one image
    fn encode(&self, image: &Bgr8Image) -> Result<EncodedFrame, FrameError>;

    /// MIME type of the produced bytes
    fn content_type(&self) -> &'static str {
        "image/jpeg"
    }
}

/// Baseline JPEG encoder backed by the `image` crate
#[derive(Debug, Clone, Copy)]
pub struct JpegEncoder {
    quality: u8,
}

impl JpegEncoder {
    /// Create an encoder with the given quality, clamped to 1..=100
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    /// Configured quality
    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Default for JpegEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl FrameEncoder for JpegEncoder {
    fn encode(&self, image: &Bgr8Image) -> Result<EncodedFrame, FrameError> {
        let expected = image.width as usize * image.height as usize * 3;
        if image.width == 0 || image.height == 0 {
            return Err(FrameError::InvalidDimensions {
                width: image.width,
                height: image.height,
            });
        }
        if image.data.len() != expected {
            return Err(FrameError::BufferTooSmall {
                expected,
                actual: image.data.len(),
            });
        }

        // The codec consumes RGB, so reorder while handing the rows over.
        let rgb = image.to_rgb8();

        let mut out = Vec::with_capacity(expected / 8);
        let mut encoder = ImageJpegEncoder::new_with_quality(&mut out, self.quality);
        encoder
            .encode(&rgb, image.width, image.height, ExtendedColorType::Rgb8)
            .map_err(|e| FrameError::Encode(e.to_string()))?;

        Ok(EncodedFrame::new(out))
    }
}
