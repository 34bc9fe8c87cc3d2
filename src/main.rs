//! camera-relay binary
//!
//! Run with: camera-relay [BIND_ADDR] [SOURCE]
//!
//! Examples:
//!   camera-relay                                   # test pattern on 0.0.0.0:8283
//!   camera-relay localhost                         # test pattern on 127.0.0.1:8283
//!   ffmpeg -i rtsp://cam/stream -f rawvideo -pix_fmt bgr24 -s 640x480 - \
//!     | camera-relay 0.0.0.0:8283 stdin:640x480:bgr8
//!
//! Then open http://HOST:8283/ in a browser.

use std::net::SocketAddr;
use std::sync::Arc;

use camera_relay::frame::DEFAULT_JPEG_QUALITY;
use camera_relay::relay::{
    ChannelSource, FrameSource, FrameStore, Producer, Shutdown, SourceSpec, TestPatternSource,
    DEFAULT_TOPIC,
};
use camera_relay::server::{parse_bind_addr, RelayServer, ServerConfig, DEFAULT_PORT};
use camera_relay::stats::ProducerStats;
use camera_relay::Result;

const TEST_PATTERN_FPS: u32 = 30;

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(args.get(1..).unwrap_or_default()).await {
        tracing::error!(error = %e, "Relay failed");
        eprintln!();
        print_usage();
        std::process::exit(1);
    }
}

async fn run(args: &[String]) -> Result<()> {
    let bind_addr = match args.first() {
        Some(addr) => parse_bind_addr(addr)?,
        None => SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
    };
    let source: SourceSpec = match args.get(1) {
        Some(spec) => spec.parse()?,
        None => SourceSpec::default(),
    };

    let store = Arc::new(FrameStore::new());
    let shutdown = Shutdown::new();
    let producer = Producer::jpeg(Arc::clone(&store), DEFAULT_JPEG_QUALITY);
    let config = ServerConfig::with_addr(bind_addr).part_content_type(producer.content_type());

    let producer_task = match source {
        SourceSpec::TestPattern => tokio::spawn(run_producer(
            producer,
            TestPatternSource::new(TEST_PATTERN_FPS),
            shutdown.clone(),
        )),
        SourceSpec::Stdin {
            width,
            height,
            format,
        } => tokio::spawn(run_producer(
            producer,
            ChannelSource::spawn_reader(DEFAULT_TOPIC, std::io::stdin(), width, height, format)?,
            shutdown.clone(),
        )),
    };

    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Interrupt received");
                signal.trigger();
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for interrupt"),
        }
    });

    let server = RelayServer::new(config, Arc::clone(&store), shutdown.clone());
    let result = server.run().await;

    // The server may have failed on its own; make sure the producer stops too.
    shutdown.trigger();
    if let Err(e) = producer_task.await {
        tracing::error!(error = %e, "Producer task failed");
    }

    tracing::info!("Shutting down camera stream");
    result
}

/// Run the producer; the relay shuts down once the source ends
async fn run_producer<S: FrameSource>(
    producer: Producer<camera_relay::frame::JpegEncoder>,
    source: S,
    shutdown: Shutdown,
) -> ProducerStats {
    let stats = producer.run(source, shutdown.listener()).await;
    shutdown.trigger();
    stats
}

fn print_usage() {
    eprintln!("Usage: camera-relay [BIND_ADDR] [SOURCE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:8283)");
    eprintln!("  SOURCE       `test` (default) or `stdin:WIDTHxHEIGHT:FORMAT`");
    eprintln!();
    eprintln!("Formats: rgb8, bgr8, rgba8, bgra8, mono8, mono16");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  camera-relay                              # test pattern on 0.0.0.0:8283");
    eprintln!("  camera-relay localhost:9000               # test pattern on 127.0.0.1:9000");
    eprintln!("  camera-relay 0.0.0.0 stdin:640x480:bgr8   # raw frames from stdin");
}
