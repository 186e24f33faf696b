//! OCR collaborator that replays recorded observations
//!
//! Used for offline runs over captured frame sequences: each frame's
//! observations were recorded once from a real engine and are served back
//! by capture sequence number.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use super::{OcrEngine, OcrRequest, TextObservation, VisionError};

/// Recorded OCR output for one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Capture sequence number
    pub sequence: u64,
    /// Observations in detection order
    #[serde(default)]
    pub observations: Vec<TextObservation>,
    /// Set when the engine failed on this frame
    #[serde(default)]
    pub error: Option<String>,
}

/// Serves recorded observations keyed by frame sequence
#[derive(Debug, Default)]
pub struct TranscriptOcr {
    entries: HashMap<u64, TranscriptEntry>,
}

impl TranscriptOcr {
    pub fn new(entries: impl IntoIterator<Item = TranscriptEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.sequence, e)).collect(),
        }
    }

    /// Load a JSON array of [`TranscriptEntry`]
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read transcript {:?}", path))?;
        let entries: Vec<TranscriptEntry> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse transcript {:?}", path))?;
        info!("Loaded OCR transcript with {} frames from {:?}", entries.len(), path);
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl OcrEngine for TranscriptOcr {
    async fn recognize(&self, request: OcrRequest) -> Result<Vec<TextObservation>, VisionError> {
        let Some(entry) = self.entries.get(&request.sequence) else {
            debug!("Transcript has no text for frame {}", request.sequence);
            return Ok(vec![]);
        };
        if let Some(error) = &entry.error {
            return Err(VisionError::RecognitionUnavailable(error.clone()));
        }
        Ok(entry.observations.clone())
    }
}
