//! Frame types and the conversion/encoding pipeline
//!
//! A [`RawFrame`] arrives from the sensor transport in whatever pixel layout the
//! camera produces. The producer normalizes it to packed BGR8 with
//! [`convert::to_bgr8`], compresses it with a [`FrameEncoder`], and publishes
//! the resulting [`EncodedFrame`].
//!
//! ```text
//!   RawFrame ──► to_bgr8() ──► Bgr8Image ──► FrameEncoder ──► EncodedFrame
//!  (any layout)               (3ch, B,G,R)     (JPEG q50)       (Bytes)
//! ```

pub mod convert;
pub mod encoded;
pub mod error;
pub mod jpeg;
pub mod raw;

pub use convert::{to_bgr8, Bgr8Image};
pub use encoded::EncodedFrame;
pub use error::FrameError;
pub use jpeg::{FrameEncoder, JpegEncoder, DEFAULT_JPEG_QUALITY};
pub use raw::{PixelFormat, RawFrame};
