//! Encoded frame type

use bytes::Bytes;

/// A compressed image, ready to be written to viewers
///
/// Cheap to clone: all clones share one reference-counted allocation, so the
/// frame store can hand the same frame to any number of sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    data: Bytes,
}

impl EncodedFrame {
    /// Wrap already-encoded bytes
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// Encoded bytes
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the frame holds no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether two handles point at the same allocation
    pub fn ptr_eq(&self, other: &EncodedFrame) -> bool {
        self.data.as_ptr() == other.data.as_ptr() && self.data.len() == other.data.len()
    }
}

impl From<Vec<u8>> for EncodedFrame {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<Bytes> for EncodedFrame {
    fn from(data: Bytes) -> Self {
        Self { data }
    }
}
