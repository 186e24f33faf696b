//! Vision/OCR Layer
//!
//! Enhances the plate window of a frame and hands it to an OCR collaborator.
//! The recognition engine itself is external; it is reached through the
//! [`OcrEngine`] trait.

pub mod enhance;
pub mod transcript;

pub use enhance::EnhancementPipeline;
pub use transcript::TranscriptOcr;

use async_trait::async_trait;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Normalized, Rect};

/// Recoverable vision failures. Neither reaches the user; both degrade to
/// "no update this frame".
#[derive(Debug, Error)]
pub enum VisionError {
    /// An enhancement filter could not produce an output image
    #[error("filter '{filter}' unavailable: {reason}")]
    FilterUnavailable { filter: &'static str, reason: String },
    /// The OCR collaborator failed to return observations
    #[error("recognition unavailable: {0}")]
    RecognitionUnavailable(String),
}

/// One detected block of text with its readings, best first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextObservation {
    pub candidates: Vec<String>,
}

impl TextObservation {
    pub fn new<S: Into<String>>(candidates: impl IntoIterator<Item = S>) -> Self {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }

    /// Highest-ranked reading, if any
    pub fn top_candidate(&self) -> Option<&str> {
        self.candidates.first().map(String::as_str)
    }
}

/// Top-ranked reading of each observation, in OCR order
pub fn top_candidates(observations: &[TextObservation]) -> impl Iterator<Item = &str> {
    observations.iter().filter_map(TextObservation::top_candidate)
}

/// A recognition request for one enhanced frame
#[derive(Debug, Clone)]
pub struct OcrRequest {
    /// Capture sequence number of the source frame
    pub sequence: u64,
    /// Enhanced plate window
    pub image: RgbaImage,
    /// Part of `image` to read, in normalized units
    pub region: Rect<Normalized>,
}

/// External optical character recognition collaborator.
///
/// Completion may happen on any thread; callers must move results back to
/// their own update context before touching shared state.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognize text in the request's region, returning observations in
    /// the engine's detection order
    async fn recognize(&self, request: OcrRequest) -> Result<Vec<TextObservation>, VisionError>;
}
