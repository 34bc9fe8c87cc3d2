//! Statistics and metrics for the relay

use std::time::{Duration, Instant};

/// Per-viewer session statistics
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// When the session started
    pub started_at: Instant,
    /// Multipart parts written
    pub parts_sent: u64,
    /// Total bytes written, including part headers
    pub bytes_sent: u64,
    /// Ticks that found the store empty
    pub empty_ticks: u64,
}

impl SessionStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            parts_sent: 0,
            bytes_sent: 0,
            empty_ticks: 0,
        }
    }

    /// Record one emitted part of `size` bytes
    pub fn on_part(&mut self, size: usize) {
        self.parts_sent += 1;
        self.bytes_sent += size as u64;
    }

    /// Time since the session started
    pub fn duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Average bits per second over the session
    pub fn bitrate(&self) -> u64 {
        bitrate(self.bytes_sent, self.duration())
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer loop statistics
#[derive(Debug, Clone)]
pub struct ProducerStats {
    /// When the producer started
    pub started_at: Instant,
    /// Raw frames received from the source
    pub frames_received: u64,
    /// Frames converted, encoded and published
    pub frames_encoded: u64,
    /// Frames dropped after a conversion or encode failure
    pub frames_dropped: u64,
    /// Total encoded bytes published
    pub bytes_encoded: u64,
}

impl ProducerStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            frames_received: 0,
            frames_encoded: 0,
            frames_dropped: 0,
            bytes_encoded: 0,
        }
    }

    /// Time since the producer started
    pub fn duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Published frames per second
    pub fn frame_rate(&self) -> f64 {
        let secs = self.duration().as_secs_f64();
        if secs > 0.0 {
            self.frames_encoded as f64 / secs
        } else {
            0.0
        }
    }

    /// Average encoded frame size in bytes
    pub fn average_frame_size(&self) -> u64 {
        if self.frames_encoded > 0 {
            self.bytes_encoded / self.frames_encoded
        } else {
            0
        }
    }
}

impl Default for ProducerStats {
    fn default() -> Self {
        Self::new()
    }
}

fn bitrate(bytes: u64, duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if secs > 0 {
        (bytes * 8) / secs
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_stats_new() {
        let stats = SessionStats::new();
        assert_eq!(stats.parts_sent, 0);
        assert_eq!(stats.bytes_sent, 0);
        assert_eq!(stats.empty_ticks, 0);
    }

    #[test]
    fn test_session_stats_on_part() {
        let mut stats = SessionStats::new();
        stats.on_part(100);
        stats.on_part(50);

        assert_eq!(stats.parts_sent, 2);
        assert_eq!(stats.bytes_sent, 150);
    }

    #[test]
    fn test_bitrate() {
        // 1,000,000 bytes * 8 bits / 10 seconds = 800,000 bps
        assert_eq!(bitrate(1_000_000, Duration::from_secs(10)), 800_000);
        assert_eq!(bitrate(1_000_000, Duration::ZERO), 0);
    }

    #[test]
    fn test_producer_average_frame_size() {
        let mut stats = ProducerStats::new();
        assert_eq!(stats.average_frame_size(), 0);

        stats.frames_encoded = 4;
        stats.bytes_encoded = 4000;
        assert_eq!(stats.average_frame_size(), 1000);
    }

    #[test]
    fn test_producer_frame_rate_non_negative() {
        let stats = ProducerStats::new();
        assert!(stats.frame_rate() >= 0.0);
    }
}
