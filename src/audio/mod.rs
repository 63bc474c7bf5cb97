//! # Audio Module
//!
//! Everything that happens to the audio before it reaches the inference API.
//!
//! ## Key Components:
//! - **Fetch**: Downloads the complete audio resource from a URL
//! - **Segmenter**: Cuts the downloaded bytes into fixed-size segments
//!
//! ## Audio Format:
//! The payload is treated as opaque bytes. No decoding, resampling or
//! format detection happens here; whatever container the URL points at is
//! passed through to the inference API segment by segment.

pub mod fetch;       // HTTP download of the source audio
pub mod segmenter;   // Fixed-size byte segmentation

pub use fetch::{AudioSource, FetchError, HttpAudioSource};
pub use segmenter::{Segment, Segmenter, DEFAULT_CHUNK_SIZE};
