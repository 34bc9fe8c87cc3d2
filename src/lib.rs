//! # camera-relay
//!
//! Relays a live camera feed to browsers as a motion-JPEG stream over HTTP.
//!
//! A single producer converts and encodes each raw frame from the sensor
//! transport and publishes it into a one-slot [`FrameStore`]. Every viewer
//! connected to `/video` gets its own [`StreamSession`], which re-reads the
//! store every 10 ms and writes the current frame as a
//! `multipart/x-mixed-replace` part. Viewers never block the producer or each
//! other; a viewer that falls behind simply skips frames.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use camera_relay::relay::{ChannelSource, DEFAULT_TOPIC};
//! use camera_relay::{FrameStore, Producer, RelayServer, ServerConfig, Shutdown};
//!
//! # async fn example() -> camera_relay::Result<()> {
//! let store = Arc::new(FrameStore::new());
//! let shutdown = Shutdown::new();
//!
//! // The transport callback pushes raw frames through `sender`.
//! let (sender, source) = ChannelSource::new(DEFAULT_TOPIC, 2);
//! Producer::jpeg(Arc::clone(&store), 50).spawn(source, shutdown.listener());
//!
//! let server = RelayServer::new(ServerConfig::default(), store, shutdown);
//! server.run().await?;
//! # drop(sender);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod frame;
pub mod relay;
pub mod server;
pub mod stats;
pub mod stream;

pub use error::{Error, Result};
pub use frame::{EncodedFrame, PixelFormat, RawFrame};
pub use relay::{FrameStore, Producer, Shutdown};
pub use server::{RelayServer, ServerConfig};
pub use stream::StreamSession;
