//! Producer loop
//!
//! Bridges a [`FrameSource`] to the [`FrameStore`]: every raw frame is
//! converted to BGR8, encoded and published. A frame that fails either step is
//! logged and dropped; the loop always moves on to the next one.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::frame::{to_bgr8, EncodedFrame, FrameEncoder, FrameError, JpegEncoder, RawFrame};
use crate::stats::ProducerStats;

use super::shutdown::ShutdownListener;
use super::source::FrameSource;
use super::store::FrameStore;

/// Convert and encode one raw frame
pub fn encode_raw<E>(encoder: &E, raw: &RawFrame) -> Result<EncodedFrame, FrameError>
where
    E: FrameEncoder + ?Sized,
{
    let image = to_bgr8(raw)?;
    encoder.encode(&image)
}

/// Publishes encoded frames from a source into a store
pub struct Producer<E: FrameEncoder> {
    store: Arc<FrameStore>,
    encoder: Arc<E>,
}

impl Producer<JpegEncoder> {
    /// Create a producer using the JPEG encoder at the given quality
    pub fn jpeg(store: Arc<FrameStore>, quality: u8) -> Self {
        Self::new(store, JpegEncoder::new(quality))
    }
}

impl<E: FrameEncoder> Producer<E> {
    /// Create a producer with a custom encoder
    pub fn new(store: Arc<FrameStore>, encoder: E) -> Self {
        Self {
            store,
            encoder: Arc::new(encoder),
        }
    }

    /// MIME type of the frames this producer publishes
    pub fn content_type(&self) -> &'static str {
        self.encoder.content_type()
    }

    /// Get the store this producer publishes to
    pub fn store(&self) -> &Arc<FrameStore> {
        &self.store
    }

    /// Run until the source ends or shutdown is signalled
    pub async fn run<S: FrameSource>(
        self,
        mut source: S,
        mut shutdown: ShutdownListener,
    ) -> ProducerStats {
        let topic = source.topic().to_string();
        tracing::info!(topic = %topic, "Subscribed to frame source");

        let mut stats = ProducerStats::new();

        loop {
            let raw = tokio::select! {
                _ = shutdown.wait() => {
                    tracing::info!(topic = %topic, "Shutdown signal received, stopping producer");
                    break;
                }
                frame = source.recv() => match frame {
                    Some(frame) => frame,
                    None => {
                        tracing::info!(topic = %topic, "Frame source closed");
                        break;
                    }
                },
            };

            stats.frames_received += 1;

            match self.process(raw).await {
                Ok(frame) => {
                    stats.frames_encoded += 1;
                    stats.bytes_encoded += frame.len() as u64;
                    self.store.publish(frame);
                }
                Err(e) => {
                    stats.frames_dropped += 1;
                    tracing::warn!(
                        topic = %topic,
                        error = %e,
                        dropped = stats.frames_dropped,
                        "Error converting frame, dropped"
                    );
                }
            }
        }

        tracing::info!(
            topic = %topic,
            received = stats.frames_received,
            encoded = stats.frames_encoded,
            dropped = stats.frames_dropped,
            avg_frame_bytes = stats.average_frame_size(),
            "Producer stopped"
        );

        stats
    }

    /// Spawn the producer loop on the runtime
    pub fn spawn<S: FrameSource>(
        self,
        source: S,
        shutdown: ShutdownListener,
    ) -> JoinHandle<ProducerStats> {
        tokio::spawn(self.run(source, shutdown))
    }

    /// Encode on the blocking pool so a slow codec never stalls the runtime
    async fn process(&self, raw: RawFrame) -> Result<EncodedFrame, FrameError> {
        let encoder = Arc::clone(&self.encoder);

        match tokio::task::spawn_blocking(move || encode_raw(encoder.as_ref(), &raw)).await {
            Ok(result) => result,
            Err(e) => Err(FrameError::Encode(format!("encoder task failed: {}", e))),
        }
    }
}
