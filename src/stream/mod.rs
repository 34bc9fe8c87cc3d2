//! Viewer-side streaming
//!
//! A [`StreamSession`] turns the frame store into an endless
//! `multipart/x-mixed-replace` body, framed by a [`MultipartEncoder`].

pub mod multipart;
pub mod session;

pub use multipart::{MultipartEncoder, MultipartPart, DEFAULT_BOUNDARY};
pub use session::{SessionConfig, StreamSession, DEFAULT_TICK_INTERVAL};
