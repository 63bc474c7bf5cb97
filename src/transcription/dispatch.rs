//! # Segment Dispatch
//!
//! Decides how per-segment inference calls are scheduled.
//!
//! ## Strategies:
//! - **Sequential** (default): Segment `i + 1` is sent only after segment `i`
//!   has finished, successfully or not. This is the reference behavior.
//! - **Concurrent**: Up to `max_in_flight` calls run at once. Outcomes are
//!   still returned in segment order, so the transcript is identical.
//!
//! ## Rust Concepts:
//! - **Generic closures**: `run` takes any `Fn(Segment) -> Future`, so the
//!   pipeline keeps ownership of the recognizer and settings
//! - **StreamExt::buffered**: Polls several futures at once but yields their
//!   outputs in the order the futures were created

use crate::audio::Segment;
use crate::transcription::pipeline::SegmentOutcome;
use futures_util::stream::{self, StreamExt};
use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dispatch {
    #[default]
    Sequential,
    Concurrent {
        max_in_flight: usize,
    },
}

impl Dispatch {
    /// Pick a strategy from a concurrency limit (`0` and `1` mean sequential).
    pub fn from_limit(max_in_flight: usize) -> Self {
        if max_in_flight <= 1 {
            Dispatch::Sequential
        } else {
            Dispatch::Concurrent { max_in_flight }
        }
    }

    pub fn max_in_flight(&self) -> usize {
        match *self {
            Dispatch::Sequential => 1,
            Dispatch::Concurrent { max_in_flight } => max_in_flight,
        }
    }

    /// Run `transcribe` for every segment and return outcomes in segment order.
    pub async fn run<'a, F, Fut>(&self, segments: &[Segment<'a>], transcribe: F) -> Vec<SegmentOutcome>
    where
        F: Fn(Segment<'a>) -> Fut,
        Fut: Future<Output = SegmentOutcome>,
    {
        match *self {
            Dispatch::Sequential => {
                let mut outcomes = Vec::with_capacity(segments.len());
                for segment in segments {
                    outcomes.push(transcribe(*segment).await);
                }
                outcomes
            }
            Dispatch::Concurrent { max_in_flight } => {
                stream::iter(segments.iter().copied())
                    .map(&transcribe)
                    .buffered(max_in_flight.max(1))
                    .collect()
                    .await
            }
        }
    }
}
