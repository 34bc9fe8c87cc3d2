//! Frame sources
//!
//! A [`FrameSource`] stands in for the sensor transport. The producer awaits
//! [`FrameSource::recv`] for each frame and stops when it returns `None`.
//!
//! - [`ChannelSource`]: push-based; transport callbacks hand frames to a
//!   [`FrameSender`]
//! - [`ReaderSource`]: back-to-back raw frames read from any `AsyncRead`
//! - [`ChannelSource::spawn_reader`]: the same framing read from a blocking
//!   `std::io::Read` on its own thread, used for stdin
//! - [`TestPatternSource`]: synthetic moving gradient

use std::future::Future;
use std::io::{self, Read};
use std::str::FromStr;
use std::thread;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::error::Error;
use crate::frame::{PixelFormat, RawFrame};

/// Default topic the relay subscribes to
pub const DEFAULT_TOPIC: &str = "/sc/rgb/image";

/// Default test pattern width
pub const DEFAULT_WIDTH: u32 = 640;

/// Default test pattern height
pub const DEFAULT_HEIGHT: u32 = 480;

/// A stream of raw frames from the sensor transport
pub trait FrameSource: Send + 'static {
    /// Wait for the next frame
    ///
    /// Returns `None` once the transport is closed or interrupted.
    fn recv(&mut self) -> impl Future<Output = Option<RawFrame>> + Send;

    /// Name of the channel this source is subscribed to
    fn topic(&self) -> &str;
}

/// Handle used by a transport callback to push frames into a [`ChannelSource`]
#[derive(Debug, Clone)]
pub struct FrameSender {
    tx: mpsc::Sender<RawFrame>,
}

impl FrameSender {
    /// Push a frame without waiting
    ///
    /// If the producer is still busy with earlier frames the new one is
    /// dropped; the transport is never slowed down by the relay. Returns
    /// whether the frame was queued.
    pub fn push(&self, frame: RawFrame) -> bool {
        match self.tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::trace!("Producer busy, raw frame skipped");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Push a frame, waiting for queue space
    ///
    /// Returns false if the source has been dropped.
    pub async fn send(&self, frame: RawFrame) -> bool {
        self.tx.send(frame).await.is_ok()
    }

    /// Push a frame from a non-async thread, waiting for queue space
    ///
    /// Returns false if the source has been dropped. Must not be called from
    /// within the runtime.
    pub fn blocking_send(&self, frame: RawFrame) -> bool {
        self.tx.blocking_send(frame).is_ok()
    }

    /// Whether the receiving source is gone
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Source fed by one or more [`FrameSender`] handles
///
/// Ends once every sender has been dropped.
#[derive(Debug)]
pub struct ChannelSource {
    topic: String,
    rx: mpsc::Receiver<RawFrame>,
}

impl ChannelSource {
    /// Create a source and its sender
    ///
    /// `capacity` bounds how many raw frames may wait for the encoder.
    pub fn new(topic: impl Into<String>, capacity: usize) -> (FrameSender, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let source = Self {
            topic: topic.into(),
            rx,
        };
        (FrameSender { tx }, source)
    }

    /// Read fixed-geometry raw frames from a blocking reader on its own thread
    ///
    /// Frames use the same layout as [`ReaderSource`]. The read happens
    /// outside the runtime, so a reader stuck without input (a stalled pipe
    /// or an idle terminal) never holds up runtime shutdown. The thread ends
    /// at end of input or once the source is dropped and the next frame
    /// cannot be delivered.
    pub fn spawn_reader<R>(
        topic: impl Into<String>,
        reader: R,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let (sender, source) = Self::new(topic, 1);
        let topic = source.topic.clone();
        let frame_size = frame_len(width, height, format);

        thread::Builder::new()
            .name("frame-reader".to_string())
            .spawn(move || {
                let mut reader = reader;
                loop {
                    let mut buf = vec![0u8; frame_size];
                    match reader.read_exact(&mut buf) {
                        Ok(()) => {
                            let frame = RawFrame::new(width, height, format, buf);
                            if !sender.blocking_send(frame) {
                                tracing::debug!(
                                    topic = %topic,
                                    "Frame source dropped, reader exiting"
                                );
                                break;
                            }
                        }
                        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                            tracing::info!(topic = %topic, "Frame reader reached end of stream");
                            break;
                        }
                        Err(e) => {
                            tracing::error!(topic = %topic, error = %e, "Frame reader failed");
                            break;
                        }
                    }
                }
            })?;

        Ok(source)
    }
}

impl FrameSource for ChannelSource {
    async fn recv(&mut self) -> Option<RawFrame> {
        self.rx.recv().await
    }

    fn topic(&self) -> &str {
        &self.topic
    }
}

/// Source reading fixed-geometry raw frames from a byte stream
///
/// Each frame is exactly `width * height * bytes_per_pixel` bytes with no
/// header, the layout produced by `ffmpeg -f rawvideo`.
///
/// Only for readers whose pending reads can be dropped. `tokio::io::stdin`
/// parks a read on the blocking pool that outlives cancellation, so stdin goes
/// through [`ChannelSource::spawn_reader`] instead.
pub struct ReaderSource<R> {
    topic: String,
    reader: R,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl<R> ReaderSource<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    /// Create a source over `reader`
    pub fn new(
        topic: impl Into<String>,
        reader: R,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Self {
        Self {
            topic: topic.into(),
            reader,
            width,
            height,
            format,
        }
    }

    /// Size of one frame in bytes
    pub fn frame_size(&self) -> usize {
        frame_len(self.width, self.height, self.format)
    }
}

fn frame_len(width: u32, height: u32, format: PixelFormat) -> usize {
    width as usize * height as usize * format.bytes_per_pixel()
}

impl<R> FrameSource for ReaderSource<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    async fn recv(&mut self) -> Option<RawFrame> {
        let mut buf = BytesMut::zeroed(self.frame_size());

        match self.reader.read_exact(&mut buf).await {
            Ok(_) => Some(RawFrame::new(
                self.width,
                self.height,
                self.format,
                buf.freeze(),
            )),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                tracing::info!(topic = %self.topic, "Frame reader reached end of stream");
                None
            }
            Err(e) => {
                tracing::error!(topic = %self.topic, error = %e, "Frame reader failed");
                None
            }
        }
    }

    fn topic(&self) -> &str {
        &self.topic
    }
}

/// Synthetic source producing a moving BGR8 gradient at a fixed rate
pub struct TestPatternSource {
    topic: String,
    width: u32,
    height: u32,
    ticker: Interval,
    frame_index: u32,
    remaining: Option<u64>,
}

impl TestPatternSource {
    /// Create a 640x480 pattern at `fps` frames per second
    pub fn new(fps: u32) -> Self {
        Self::with_size(DEFAULT_WIDTH, DEFAULT_HEIGHT, fps)
    }

    /// Create a pattern with custom dimensions
    pub fn with_size(width: u32, height: u32, fps: u32) -> Self {
        let period = Duration::from_secs(1) / fps.max(1);
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        Self {
            topic: "test_pattern".to_string(),
            width,
            height,
            ticker,
            frame_index: 0,
            remaining: None,
        }
    }

    /// Stop after `count` frames
    pub fn limit(mut self, count: u64) -> Self {
        self.remaining = Some(count);
        self
    }

    /// Render frame number `index`
    pub fn render(&self, index: u32) -> RawFrame {
        let (w, h) = (self.width as usize, self.height as usize);
        let shift = index as usize;
        let mut data = BytesMut::with_capacity(w * h * 3);

        for y in 0..h {
            for x in 0..w {
                let b = ((x + shift) * 255 / w.max(1)) as u8;
                let g = (y * 255 / h.max(1)) as u8;
                let r = (shift * 4) as u8;
                data.extend_from_slice(&[b, g, r]);
            }
        }

        RawFrame::new(self.width, self.height, PixelFormat::Bgr8, data.freeze())
    }
}

impl FrameSource for TestPatternSource {
    async fn recv(&mut self) -> Option<RawFrame> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }

        self.ticker.tick().await;
        let frame = self.render(self.frame_index);
        self.frame_index = self.frame_index.wrapping_add(1);
        Some(frame)
    }

    fn topic(&self) -> &str {
        &self.topic
    }
}

/// Source selection for the relay binary
///
/// Parsed from `test` or `stdin:WIDTHxHEIGHT:FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceSpec {
    /// [`TestPatternSource`]
    #[default]
    TestPattern,
    /// Raw frames read from standard input
    Stdin {
        width: u32,
        height: u32,
        format: PixelFormat,
    },
}

impl FromStr for SourceSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "test" {
            return Ok(SourceSpec::TestPattern);
        }

        let invalid = || {
            Error::Config(format!(
                "expected `test` or `stdin:WxH:FORMAT`, got `{}`",
                s
            ))
        };

        let rest = s.strip_prefix("stdin:").ok_or_else(invalid)?;
        let (size, format) = rest.split_once(':').ok_or_else(invalid)?;
        let (width, height) = size.split_once('x').ok_or_else(invalid)?;

        let width: u32 = width.parse().map_err(|_| invalid())?;
        let height: u32 = height.parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        let format: PixelFormat = format.parse()?;

        Ok(SourceSpec::Stdin {
            width,
            height,
            format,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::relay::{FrameStore, Producer, Shutdown};

    /// Reader that never returns, like stdin with nothing upstream
    struct StalledReader;

    impl Read for StalledReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            loop {
                thread::park();
            }
        }
    }

    #[tokio::test]
    async fn test_channel_source_delivers_in_order() {
        let (sender, mut source) = ChannelSource::new(DEFAULT_TOPIC, 4);
        assert_eq!(source.topic(), "/sc/rgb/image");

        assert!(sender.push(RawFrame::new(1, 1, PixelFormat::Mono8, vec![1])));
        assert!(sender.send(RawFrame::new(1, 1, PixelFormat::Mono8, vec![2])).await);

        assert_eq!(source.recv().await.unwrap().data.as_ref(), &[1]);
        assert_eq!(source.recv().await.unwrap().data.as_ref(), &[2]);
    }

    #[tokio::test]
    async fn test_channel_source_ends_when_senders_dropped() {
        let (sender, mut source) = ChannelSource::new(DEFAULT_TOPIC, 1);
        drop(sender);
        assert!(source.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_push_skips_when_full() {
        let (sender, _source) = ChannelSource::new(DEFAULT_TOPIC, 1);

        assert!(sender.push(RawFrame::new(1, 1, PixelFormat::Mono8, vec![1])));
        assert!(!sender.push(RawFrame::new(1, 1, PixelFormat::Mono8, vec![2])));
    }

    #[tokio::test]
    async fn test_push_after_source_dropped() {
        let (sender, source) = ChannelSource::new(DEFAULT_TOPIC, 1);
        drop(source);

        assert!(sender.is_closed());
        assert!(!sender.push(RawFrame::new(1, 1, PixelFormat::Mono8, vec![1])));
    }

    #[tokio::test]
    async fn test_reader_source_splits_frames() {
        // Two 2x1 rgb8 frames followed by a truncated one
        let bytes: Vec<u8> = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13];
        let reader = io::Cursor::new(bytes);
        let mut source = ReaderSource::new("stdin", reader, 2, 1, PixelFormat::Rgb8);
        assert_eq!(source.frame_size(), 6);

        let first = source.recv().await.unwrap();
        assert_eq!(first.data.as_ref(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(first.format, PixelFormat::Rgb8);

        let second = source.recv().await.unwrap();
        assert_eq!(second.data.as_ref(), &[7, 8, 9, 10, 11, 12]);

        assert!(source.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_spawn_reader_splits_frames() {
        // Two 2x1 rgb8 frames followed by a truncated one
        let bytes: Vec<u8> = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13];
        let mut source = ChannelSource::spawn_reader(
            "stdin",
            io::Cursor::new(bytes),
            2,
            1,
            PixelFormat::Rgb8,
        )
        .unwrap();
        assert_eq!(source.topic(), "stdin");

        assert_eq!(source.recv().await.unwrap().data.as_ref(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(source.recv().await.unwrap().data.as_ref(), &[7, 8, 9, 10, 11, 12]);
        assert!(source.recv().await.is_none());
    }

    #[test]
    fn test_stalled_reader_does_not_block_runtime_drop() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();

        let shutdown = Shutdown::new();
        let store = Arc::new(FrameStore::new());

        let stats = runtime.block_on(async {
            let source =
                ChannelSource::spawn_reader("stdin", StalledReader, 4, 4, PixelFormat::Bgr8)
                    .unwrap();
            let producer =
                Producer::jpeg(Arc::clone(&store), 50).spawn(source, shutdown.listener());

            shutdown.trigger();
            producer.await.unwrap()
        });
        assert_eq!(stats.frames_received, 0);

        // Dropping the runtime must not wait on the stuck read
        let (done_tx, done_rx) = std::sync::mpsc::channel();
        thread::spawn(move || {
            drop(runtime);
            let _ = done_tx.send(());
        });
        assert!(done_rx.recv_timeout(Duration::from_secs(3)).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pattern_source_limit() {
        let mut source = TestPatternSource::with_size(8, 4, 30).limit(2);

        let frame = source.recv().await.unwrap();
        assert_eq!((frame.width, frame.height), (8, 4));
        assert!(frame.validate().is_ok());

        assert!(source.recv().await.is_some());
        assert!(source.recv().await.is_none());
    }

    #[test]
    fn test_source_spec_parse() {
        assert_eq!("test".parse::<SourceSpec>().unwrap(), SourceSpec::TestPattern);
        assert_eq!(
            "stdin:640x480:bgr8".parse::<SourceSpec>().unwrap(),
            SourceSpec::Stdin {
                width: 640,
                height: 480,
                format: PixelFormat::Bgr8
            }
        );
        assert_eq!(SourceSpec::default(), SourceSpec::TestPattern);
    }

    #[test]
    fn test_source_spec_rejects_garbage() {
        for bad in ["", "camera", "stdin:640:bgr8", "stdin:0x480:bgr8", "stdin:axb:rgb8"] {
            assert!(matches!(bad.parse::<SourceSpec>(), Err(Error::Config(_))), "{}", bad);
        }

        assert!(matches!(
            "stdin:2x2:yuv".parse::<SourceSpec>(),
            Err(Error::Frame(_))
        ));
    }

    #[tokio::test]
    async fn test_pattern_frames_move() {
        let source = TestPatternSource::with_size(16, 2, 10);
        assert_ne!(source.render(0).data, source.render(1).data);
    }
}
