//! Raw frames as delivered by the sensor transport

use std::str::FromStr;

use bytes::Bytes;

use super::error::FrameError;

/// Pixel layout of a raw frame
///
/// Names follow the usual camera middleware encoding strings
/// (`rgb8`, `bgr8`, `mono16`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8-bit red, green, blue
    Rgb8,
    /// 8-bit blue, green, red
    Bgr8,
    /// 8-bit red, green, blue, alpha
    Rgba8,
    /// 8-bit blue, green, red, alpha
    Bgra8,
    /// 8-bit grayscale
    Mono8,
    /// 16-bit grayscale, byte order given by [`RawFrame::big_endian`]
    Mono16,
}

impl PixelFormat {
    /// All supported formats
    pub const ALL: [PixelFormat; 6] = [
        PixelFormat::Rgb8,
        PixelFormat::Bgr8,
        PixelFormat::Rgba8,
        PixelFormat::Bgra8,
        PixelFormat::Mono8,
        PixelFormat::Mono16,
    ];

    /// Bytes used by a single pixel
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 | PixelFormat::Bgr8 => 3,
            PixelFormat::Rgba8 | PixelFormat::Bgra8 => 4,
            PixelFormat::Mono8 => 1,
            PixelFormat::Mono16 => 2,
        }
    }

    /// Encoding name
    pub fn as_str(self) -> &'static str {
        match self {
            PixelFormat::Rgb8 => "rgb8",
            PixelFormat::Bgr8 => "bgr8",
            PixelFormat::Rgba8 => "rgba8",
            PixelFormat::Bgra8 => "bgra8",
            PixelFormat::Mono8 => "mono8",
            PixelFormat::Mono16 => "mono16",
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PixelFormat {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        PixelFormat::ALL
            .into_iter()
            .find(|f| f.as_str() == lower)
            .ok_or_else(|| FrameError::UnsupportedEncoding(s.to_string()))
    }
}

/// One uncompressed image sample
///
/// `data` is shared via `Bytes`, so handing a frame from the transport to the
/// encoder never copies pixels.
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Row stride in bytes (may include padding)
    pub step: usize,
    /// Pixel layout
    pub format: PixelFormat,
    /// Whether multi-byte samples are big-endian (only affects `mono16`)
    pub big_endian: bool,
    /// Pixel data, `step * height` bytes
    pub data: Bytes,
}

impl RawFrame {
    /// Create a tightly packed frame (no row padding)
    pub fn new(width: u32, height: u32, format: PixelFormat, data: impl Into<Bytes>) -> Self {
        Self {
            width,
            height,
            step: width as usize * format.bytes_per_pixel(),
            format,
            big_endian: false,
            data: data.into(),
        }
    }

    /// Set the sample byte order
    pub fn with_big_endian(mut self, big_endian: bool) -> Self {
        self.big_endian = big_endian;
        self
    }

    /// Override the row stride
    pub fn with_step(mut self, step: usize) -> Self {
        self.step = step;
        self
    }

    /// Bytes of actual pixel data in one row (excluding padding)
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    /// Check that dimensions, stride and buffer length agree
    pub fn validate(&self) -> Result<(), FrameError> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }

        if self.step < self.row_bytes() {
            return Err(FrameError::StrideTooSmall {
                format: self.format,
                width: self.width,
                step: self.step,
            });
        }

        // A stride that overflows can never be backed by a real buffer
        let expected = self
            .step
            .checked_mul(self.height as usize)
            .unwrap_or(usize::MAX);
        if self.data.len() < expected {
            return Err(FrameError::BufferTooSmall {
                expected,
                actual: self.data.len(),
            });
        }

        Ok(())
    }

    /// Iterate over rows with padding stripped
    ///
    /// Call [`validate`](Self::validate) first; rows past the end of the
    /// buffer are not yielded.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        let row_bytes = self.row_bytes();
        self.data
            .chunks(self.step.max(1))
            .take(self.height as usize)
            .filter(move |row| row.len() >= row_bytes)
            .map(move |row| &row[..row_bytes])
    }
}
