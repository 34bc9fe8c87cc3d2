//! Frame error types
//!
//! Every variant describes a problem with a single frame. The producer logs
//! and drops the frame; none of these are fatal to the relay.

use super::raw::PixelFormat;

/// Error type for frame validation, conversion and encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Width or height is zero
    InvalidDimensions { width: u32, height: u32 },
    /// Row stride is shorter than one row of pixels
    StrideTooSmall {
        format: PixelFormat,
        width: u32,
        step: usize,
    },
    /// Pixel buffer is shorter than `step * height`
    BufferTooSmall { expected: usize, actual: usize },
    /// Encoding name not recognized
    UnsupportedEncoding(String),
    /// The codec rejected the image
    Encode(String),
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameError::InvalidDimensions { width, height } => {
                write!(f, "Invalid frame dimensions: {}x{}", width, height)
            }
            FrameError::StrideTooSmall {
                format,
                width,
                step,
            } => write!(
                f,
                "Row stride {} too small for {} pixels of {}",
                step, width, format
            ),
            FrameError::BufferTooSmall { expected, actual } => write!(
                f,
                "Pixel buffer too small: expected {} bytes, got {}",
                expected, actual
            ),
            FrameError::UnsupportedEncoding(name) => {
                write!(f, "Unsupported pixel encoding: {}", name)
            }
            FrameError::Encode(msg) => write!(f, "Encode failed: {}", msg),
        }
    }
}

impl std::error::Error for FrameError {}
