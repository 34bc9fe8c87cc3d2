//! Pixel layout conversion
//!
//! Every raw frame is normalized to packed 3-channel BGR8 before encoding,
//! whatever layout the camera delivered. Alpha is discarded, grayscale is
//! replicated into all three channels, and 16-bit samples keep their high byte
//! in the frame's declared byte order.

use super::error::FrameError;
use super::raw::{PixelFormat, RawFrame};

/// Packed 8-bit blue-green-red image with no row padding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bgr8Image {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// `width * height * 3` bytes, B,G,R per pixel
    pub data: Vec<u8>,
}

impl Bgr8Image {
    /// Pixel at (x, y) as `[b, g, r]`
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }

    /// Reorder into packed RGB8
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len());
        for px in self.data.chunks_exact(3) {
            out.extend_from_slice(&[px[2], px[1], px[0]]);
        }
        out
    }
}

/// Convert a raw frame to packed BGR8
pub fn to_bgr8(frame: &RawFrame) -> Result<Bgr8Image, FrameError> {
    frame.validate()?;

    let pixels = frame.width as usize * frame.height as usize;
    let mut data = Vec::with_capacity(pixels * 3);

    for row in frame.rows() {
        match frame.format {
            PixelFormat::Bgr8 => data.extend_from_slice(row),
            PixelFormat::Rgb8 => {
                for px in row.chunks_exact(3) {
                    data.extend_from_slice(&[px[2], px[1], px[0]]);
                }
            }
            PixelFormat::Bgra8 => {
                for px in row.chunks_exact(4) {
                    data.extend_from_slice(&px[..3]);
                }
            }
            PixelFormat::Rgba8 => {
                for px in row.chunks_exact(4) {
                    data.extend_from_slice(&[px[2], px[1], px[0]]);
                }
            }
            PixelFormat::Mono8 => {
                for &v in row {
                    data.extend_from_slice(&[v, v, v]);
                }
            }
            PixelFormat::Mono16 => {
                for px in row.chunks_exact(2) {
                    let sample = if frame.big_endian {
                        u16::from_be_bytes([px[0], px[1]])
                    } else {
                        u16::from_le_bytes([px[0], px[1]])
                    };
                    let v = (sample >> 8) as u8;
                    data.extend_from_slice(&[v, v, v]);
                }
            }
        }
    }

    Ok(Bgr8Image {
        width: frame.width,
        height: frame.height,
        data,
    })
}
