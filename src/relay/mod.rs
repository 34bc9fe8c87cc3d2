//! Frame relay core
//!
//! One producer publishes into a [`FrameStore`]; any number of stream
//! sessions read from it on their own schedule.
//!
//! # Architecture
//!
//! ```text
//!   [FrameSource] ──recv()──► [Producer] ──publish()──► Arc<FrameStore>
//!   (transport)              to_bgr8 + JPEG             ┌────────────────┐
//!                            (blocking pool)            │ RwLock<Option< │
//!                                                       │  EncodedFrame>>│
//!                                                       └───────┬────────┘
//!                                       ┌──────────────┬────────┴─────┐
//!                                       ▼              ▼              ▼
//!                                  [Session 1]    [Session 2]    [Session N]
//!                                  read() / 10ms  read() / 10ms  read() / 10ms
//! ```
//!
//! The producer never waits on sessions and sessions never wait on each other.
//! A [`Shutdown`] signal stops the producer and ends every session.

pub mod producer;
pub mod shutdown;
pub mod source;
pub mod store;

pub use producer::{encode_raw, Producer};
pub use shutdown::{Shutdown, ShutdownListener};
pub use source::{
    ChannelSource, FrameSender, FrameSource, ReaderSource, SourceSpec, TestPatternSource,
    DEFAULT_TOPIC,
};
pub use store::FrameStore;
