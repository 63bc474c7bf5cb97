//! # Audio Segmenter
//!
//! Splits a fully-downloaded audio payload into fixed-size byte segments that
//! are small enough to send to the inference API one at a time.
//!
//! ## Key Points:
//! - **Fixed byte cut**: Segments are cut at raw byte offsets (1 MiB by default).
//!   Boundaries are NOT aligned to audio frames or silence, so a boundary may
//!   fall mid-sample or mid-codec-frame. The inference API is expected to cope.
//! - **Borrowed views**: Each `Segment` borrows from the payload, nothing is copied
//! - **Ordered**: Segments come out in increasing offset order, and that order
//!   is carried all the way to the final transcript
//!
//! ## Rust Concepts:
//! - **Lifetimes**: `Segment<'a>` cannot outlive the payload it points into
//! - **slice::chunks**: The standard library already yields exactly the
//!   `ceil(len / size)` non-empty slices we need

use thiserror::Error;

/// Default segment size: 1 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SegmenterError {
    #[error("Chunk size must be greater than 0")]
    ZeroChunkSize,
}

/// A contiguous byte range of the source audio.
///
/// ## Fields:
/// - `index`: Position of this segment in the sequence (0-based)
/// - `offset`: Byte offset of the first byte within the payload
/// - `bytes`: The segment data itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub index: usize,
    pub offset: usize,
    pub bytes: &'a [u8],
}

impl Segment<'_> {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Cuts payloads into segments of at most `chunk_size` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segmenter {
    chunk_size: usize,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Segmenter {
    /// Create a segmenter with a custom chunk size.
    ///
    /// ## Errors:
    /// A chunk size of 0 can never make progress through the payload, so it
    /// is rejected up front instead of panicking later in `split`.
    pub fn new(chunk_size: usize) -> Result<Self, SegmenterError> {
        if chunk_size == 0 {
            return Err(SegmenterError::ZeroChunkSize);
        }
        Ok(Self { chunk_size })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Split a payload into ordered, non-overlapping segments.
    ///
    /// ## Guarantees:
    /// - Segment `i` starts at `i * chunk_size`
    /// - Every segment except possibly the last is exactly `chunk_size` bytes
    /// - An empty payload produces no segments at all (never an empty tail)
    /// - Concatenating all segments in order gives back the payload
    pub fn split<'a>(&self, payload: &'a [u8]) -> Vec<Segment<'a>> {
        let mut segments = Vec::with_capacity(self.segment_count(payload.len()));
        segments.extend(
            payload
                .chunks(self.chunk_size)
                .enumerate()
                .map(|(index, bytes)| Segment {
                    index,
                    offset: index * self.chunk_size,
                    bytes,
                }),
        );
        segments
    }

    /// Number of segments `split` would produce for a payload of `len` bytes.
    pub fn segment_count(&self, len: usize) -> usize {
        len.div_ceil(self.chunk_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_empty_payload_has_no_segments() {
        let segmenter = Segmenter::default();
        assert!(segmenter.split(&[]).is_empty());
        assert_eq!(segmenter.segment_count(0), 0);
    }

    #[test]
    fn test_exact_chunk_size_is_one_segment() {
        let data = payload(DEFAULT_CHUNK_SIZE);
        let segments = Segmenter::default().split(&data);

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].len(), DEFAULT_CHUNK_SIZE);
        assert_eq!(segments[0].offset, 0);
    }

    #[test]
    fn test_one_byte_over_adds_short_tail() {
        let data = payload(DEFAULT_CHUNK_SIZE + 1);
        let segments = Segmenter::default().split(&data);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].len(), DEFAULT_CHUNK_SIZE);
        assert_eq!(segments[1].len(), 1);
        assert_eq!(segments[1].offset, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_two_and_a_half_megabytes() {
        let data = payload(2_500_000);
        let segments = Segmenter::default().split(&data);

        let lengths: Vec<usize> = segments.iter().map(Segment::len).collect();
        assert_eq!(lengths, vec![1_048_576, 1_048_576, 402_848]);
        let offsets: Vec<usize> = segments.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0, 1_048_576, 2_097_152]);
    }

    #[test]
    fn test_segments_reconstruct_payload() {
        let segmenter = Segmenter::new(7).unwrap();

        for len in [0usize, 1, 6, 7, 8, 13, 14, 15, 100] {
            let data = payload(len);
            let segments = segmenter.split(&data);

            assert_eq!(segments.len(), segmenter.segment_count(len));
            assert!(segments.iter().all(|s| !s.is_empty()));
            assert!(segments[..segments.len().saturating_sub(1)]
                .iter()
                .all(|s| s.len() == 7));
            for (i, segment) in segments.iter().enumerate() {
                assert_eq!(segment.index, i);
                assert_eq!(segment.offset, i * 7);
            }

            let rebuilt: Vec<u8> = segments.iter().flat_map(|s| s.bytes.iter().copied()).collect();
            assert_eq!(rebuilt, data);
        }
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert_eq!(Segmenter::new(0), Err(SegmenterError::ZeroChunkSize));
    }
}
