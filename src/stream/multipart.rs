//! multipart/x-mixed-replace framing
//!
//! Each part of the stream looks like:
//!
//! ```text
//! --frame\r\n
//! Content-Type: image/jpeg\r\n
//! \r\n
//! <jpeg bytes>\r\n
//! ```
//!
//! The same [`MultipartEncoder`] produces the response `Content-Type` and the
//! part headers, so the advertised boundary always matches the one written.

use bytes::{BufMut, Bytes, BytesMut};

/// Default boundary token
pub const DEFAULT_BOUNDARY: &str = "frame";

/// Default content type of each part
pub const DEFAULT_PART_CONTENT_TYPE: &str = "image/jpeg";

const PART_TRAILER: &[u8] = b"\r\n";

/// Builds multipart parts for one boundary token
#[derive(Debug, Clone)]
pub struct MultipartEncoder {
    boundary: String,
    part_content_type: String,
    /// Pre-rendered part header, shared by every part
    header: Bytes,
}

impl MultipartEncoder {
    /// Create an encoder for the given boundary and part content type
    pub fn new(boundary: impl Into<String>, part_content_type: &str) -> Self {
        let boundary = boundary.into();

        let mut header = BytesMut::with_capacity(boundary.len() + part_content_type.len() + 24);
        header.put_slice(b"--");
        header.put_slice(boundary.as_bytes());
        header.put_slice(b"\r\nContent-Type: ");
        header.put_slice(part_content_type.as_bytes());
        header.put_slice(b"\r\n\r\n");

        Self {
            boundary,
            part_content_type: part_content_type.to_string(),
            header: header.freeze(),
        }
    }

    /// Boundary token
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Content type written in every part header
    pub fn part_content_type(&self) -> &str {
        &self.part_content_type
    }

    /// Response `Content-Type` header value
    pub fn content_type(&self) -> String {
        format!("multipart/x-mixed-replace; boundary={}", self.boundary)
    }

    /// Wrap a payload in a part (zero-copy)
    pub fn part(&self, payload: Bytes) -> MultipartPart {
        MultipartPart {
            header: self.header.clone(),
            payload,
        }
    }
}

impl Default for MultipartEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_BOUNDARY, DEFAULT_PART_CONTENT_TYPE)
    }
}

/// One part of the stream
///
/// Kept as separate chunks so the frame bytes shared with the store are
/// written without copying.
#[derive(Debug, Clone)]
pub struct MultipartPart {
    header: Bytes,
    payload: Bytes,
}

impl MultipartPart {
    /// Part payload
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Total size on the wire
    pub fn len(&self) -> usize {
        self.header.len() + self.payload.len() + PART_TRAILER.len()
    }

    /// Whether the part is empty (never true: the header is always present)
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Chunks in write order: header, payload, trailer
    pub fn into_chunks(self) -> [Bytes; 3] {
        [self.header, self.payload, Bytes::from_static(PART_TRAILER)]
    }

    /// Concatenate into a single buffer
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.len());
        buf.put_slice(&self.header);
        buf.put_slice(&self.payload);
        buf.put_slice(PART_TRAILER);
        buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_content_type() {
        let encoder = MultipartEncoder::default();
        assert_eq!(encoder.boundary(), "frame");
        assert_eq!(encoder.part_content_type(), "image/jpeg");
        assert_eq!(
            encoder.content_type(),
            "multipart/x-mixed-replace; boundary=frame"
        );
    }

    #[test]
    fn test_part_layout() {
        let encoder = MultipartEncoder::default();
        let part = encoder.part(Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xD9]));

        let mut expected = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n".to_vec();
        expected.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xD9]);
        expected.extend_from_slice(b"\r\n");

        assert_eq!(part.to_bytes().as_ref(), expected.as_slice());
        assert_eq!(part.len(), expected.len());
        assert!(!part.is_empty());
    }

    #[test]
    fn test_chunks_concatenate_to_part() {
        let encoder = MultipartEncoder::new("xyz", "image/png");
        let part = encoder.part(Bytes::from_static(b"abc"));
        let whole = part.to_bytes();

        let joined: Vec<u8> = part.into_chunks().iter().flat_map(|c| c.to_vec()).collect();
        assert_eq!(joined, whole.to_vec());
        assert!(whole.starts_with(b"--xyz\r\nContent-Type: image/png\r\n\r\n"));
    }

    #[test]
    fn test_payload_not_copied() {
        let payload = Bytes::from(vec![7u8; 64]);
        let part = MultipartEncoder::default().part(payload.clone());

        assert_eq!(part.payload().as_ptr(), payload.as_ptr());
    }
}
