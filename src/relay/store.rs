//! Latest-frame store
//!
//! The one piece of state shared between the producer and every viewer.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::frame::EncodedFrame;

/// Holds the most recently published frame
///
/// Last write wins: frames published between two reads are never seen by that
/// reader. The lock only guards a `Bytes` handle, so it is held for a
/// reference-count bump and never across encoding or socket writes.
pub struct FrameStore {
    /// Current frame (None until the first publish)
    current: RwLock<Option<EncodedFrame>>,

    /// Number of publishes since creation
    frames_published: AtomicU64,
}

impl FrameStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
            frames_published: AtomicU64::new(0),
        }
    }

    /// Replace the current frame
    pub fn publish(&self, frame: EncodedFrame) {
        // Drop the previous frame outside the lock.
        let previous = self.current.write().replace(frame);
        drop(previous);

        self.frames_published.fetch_add(1, Ordering::Relaxed);
    }

    /// Current frame, or None if nothing has been published yet
    pub fn read(&self) -> Option<EncodedFrame> {
        self.current.read().clone()
    }

    /// Whether a frame has been published
    pub fn has_frame(&self) -> bool {
        self.current.read().is_some()
    }

    /// Number of publishes since creation
    pub fn frames_published(&self) -> u64 {
        self.frames_published.load(Ordering::Relaxed)
    }
}

impl Default for FrameStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FrameStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameStore")
            .field("has_frame", &self.has_frame())
            .field("frames_published", &self.frames_published())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_empty_store() {
        let store = FrameStore::new();

        assert!(store.read().is_none());
        assert!(!store.has_frame());
        assert_eq!(store.frames_published(), 0);
    }

    #[test]
    fn test_read_returns_latest_publish() {
        let store = FrameStore::new();

        for k in 0..10u8 {
            let frame = EncodedFrame::new(vec![0xFF, 0xD8, k, k, 0xFF, 0xD9]);
            store.publish(frame);

            let read = store.read().unwrap();
            assert_eq!(read.data().as_ref(), &[0xFF, 0xD8, k, k, 0xFF, 0xD9]);
        }

        assert_eq!(store.frames_published(), 10);
    }

    #[test]
    fn test_intermediate_frames_lost() {
        let store = FrameStore::new();

        store.publish(EncodedFrame::new(vec![1]));
        store.publish(EncodedFrame::new(vec![2]));
        store.publish(EncodedFrame::new(vec![3]));

        assert_eq!(store.read().unwrap().data().as_ref(), &[3]);
    }

    #[test]
    fn test_reads_share_published_allocation() {
        let store = FrameStore::new();
        let frame = EncodedFrame::new(vec![9; 1024]);
        store.publish(frame.clone());

        let a = store.read().unwrap();
        let b = store.read().unwrap();
        assert!(a.ptr_eq(&frame));
        assert!(b.ptr_eq(&frame));
    }

    #[test]
    fn test_concurrent_reads_never_torn() {
        // Each frame is filled with a single byte value, so a torn read would
        // show up as a frame with mixed values or the wrong length.
        const FRAME_LEN: usize = 4096;
        const PUBLISHES: usize = 2000;
        const READERS: usize = 8;

        let store = Arc::new(FrameStore::new());
        let done = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..READERS)
            .map(|_| {
                let store = Arc::clone(&store);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    let mut observed = 0usize;
                    while !done.load(Ordering::Acquire) {
                        if let Some(frame) = store.read() {
                            let data = frame.data();
                            assert_eq!(data.len(), FRAME_LEN);
                            let first = data[0];
                            assert!(data.iter().all(|&b| b == first));
                            observed += 1;
                        }
                    }
                    observed
                })
            })
            .collect();

        for i in 0..PUBLISHES {
            store.publish(EncodedFrame::new(vec![(i % 251) as u8; FRAME_LEN]));
        }
        done.store(true, Ordering::Release);

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(store.frames_published(), PUBLISHES as u64);
    }
}
