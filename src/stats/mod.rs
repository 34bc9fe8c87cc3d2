//! Statistics for the producer and stream sessions

pub mod metrics;

pub use metrics::{ProducerStats, SessionStats};
