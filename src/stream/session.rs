//! Per-viewer stream session
//!
//! Each streaming request gets its own session. A session reads the frame
//! store once per tick and emits the current frame as a multipart part. It
//! keeps no record of what it sent, so an unchanged frame is sent again on the
//! next tick.
//!
//! A session ends when:
//! - the client goes away (hyper drops the body, which drops the session)
//! - shutdown is signalled

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use tokio::sync::OwnedSemaphorePermit;

use crate::relay::{FrameStore, ShutdownListener};
use crate::stats::SessionStats;

use super::multipart::{MultipartEncoder, MultipartPart};

/// Default pause between ticks
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Pause after every tick, whether or not a part was emitted
    pub tick_interval: Duration,

    /// Multipart framing
    pub multipart: MultipartEncoder,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            multipart: MultipartEncoder::default(),
        }
    }
}

impl SessionConfig {
    /// Set the tick interval
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set the multipart framing
    pub fn multipart(mut self, multipart: MultipartEncoder) -> Self {
        self.multipart = multipart;
        self
    }
}

/// One viewer's streaming loop
pub struct StreamSession {
    id: u64,
    store: Arc<FrameStore>,
    config: SessionConfig,
    shutdown: ShutdownListener,
    stats: SessionStats,
    /// Whether the first tick has happened (the first read is not delayed)
    ticked: bool,
    /// Session-limit slot, released on drop
    _permit: Option<OwnedSemaphorePermit>,
}

impl StreamSession {
    /// Create a session reading from `store`
    pub fn new(
        id: u64,
        store: Arc<FrameStore>,
        config: SessionConfig,
        shutdown: ShutdownListener,
    ) -> Self {
        tracing::debug!(session_id = id, "Stream session opened");

        Self {
            id,
            store,
            config,
            shutdown,
            stats: SessionStats::new(),
            ticked: false,
            _permit: None,
        }
    }

    /// Hold a session-limit permit for the session's lifetime
    pub fn with_permit(mut self, permit: OwnedSemaphorePermit) -> Self {
        self._permit = Some(permit);
        self
    }

    /// Session ID
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Statistics so far
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Wait for the next part
    ///
    /// Sleeps one tick interval after the previous tick, then reads the store.
    /// An empty store emits nothing and waits for another tick. Returns `None`
    /// once shutdown is signalled.
    pub async fn next_part(&mut self) -> Option<MultipartPart> {
        loop {
            if self.ticked {
                tokio::select! {
                    biased;
                    _ = self.shutdown.wait() => return None,
                    _ = tokio::time::sleep(self.config.tick_interval) => {}
                }
            }
            self.ticked = true;

            if self.shutdown.is_triggered() {
                return None;
            }

            match self.store.read() {
                Some(frame) => {
                    let part = self.config.multipart.part(frame.data().clone());
                    self.stats.on_part(part.len());
                    return Some(part);
                }
                None => {
                    self.stats.empty_ticks += 1;
                }
            }
        }
    }

    /// Turn the session into a response body stream
    ///
    /// Each part is yielded as three chunks (header, frame, trailer).
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
        stream::unfold(self, |mut session| async move {
            session.next_part().await.map(|part| (part, session))
        })
        .flat_map(|part| stream::iter(part.into_chunks().map(Ok::<Bytes, Infallible>)))
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        tracing::debug!(
            session_id = self.id,
            parts_sent = self.stats.parts_sent,
            bytes_sent = self.stats.bytes_sent,
            empty_ticks = self.stats.empty_ticks,
            duration_ms = self.stats.duration().as_millis() as u64,
            bitrate = self.stats.bitrate(),
            "Stream session closed"
        );
    }
}
